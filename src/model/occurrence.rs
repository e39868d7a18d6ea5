use chrono::NaiveDateTime;

/// A single dated instance of a class entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub course_code: String,
    pub lecturer: Option<String>,
    pub room: Option<String>,
    pub day: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// `None` for occurrences produced by the default weekly recurrence.
    pub week: Option<u32>,
}
