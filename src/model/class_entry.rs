use serde::{Deserialize, Serialize};

/// Named slots of a timetable cell, in the order the portal prints its lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryField {
    Time,
    CourseCode,
    Lecturer,
    Room,
    Weeks,
}

/// Line `i` of a cell fills `ENTRY_FIELDS[i]`; lines past the end are ignored.
pub const ENTRY_FIELDS: [EntryField; 5] = [
    EntryField::Time,
    EntryField::CourseCode,
    EntryField::Lecturer,
    EntryField::Room,
    EntryField::Weeks,
];

/// Stands in for a missing room in the calendar and the image legend.
pub const UNKNOWN_ROOM: &str = "Unknown";

/// One class block from a single cell of the timetable grid.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassEntry {
    pub time: String,
    pub course_code: Option<String>,
    pub lecturer: Option<String>,
    pub room: Option<String>,
    pub weeks: Option<String>,
}

impl ClassEntry {
    /// Builds an entry from a cell's text lines. Returns `None` for an empty cell.
    pub fn from_fragments<S: AsRef<str>>(fragments: &[S]) -> Option<Self> {
        if fragments.is_empty() {
            return None;
        }
        let mut entry = ClassEntry::default();
        for (field, text) in ENTRY_FIELDS.iter().zip(fragments) {
            entry.set(*field, text.as_ref().to_string());
        }
        Some(entry)
    }

    pub fn set(&mut self, field: EntryField, value: String) {
        match field {
            EntryField::Time => self.time = value,
            EntryField::CourseCode => self.course_code = Some(value),
            EntryField::Lecturer => self.lecturer = Some(value),
            EntryField::Room => self.room = Some(value),
            EntryField::Weeks => self.weeks = Some(value),
        }
    }

    pub fn get(&self, field: EntryField) -> Option<&str> {
        match field {
            EntryField::Time => Some(self.time.as_str()),
            EntryField::CourseCode => self.course_code.as_deref(),
            EntryField::Lecturer => self.lecturer.as_deref(),
            EntryField::Room => self.room.as_deref(),
            EntryField::Weeks => self.weeks.as_deref(),
        }
    }

    /// The course code, if present and non-empty.
    pub fn course(&self) -> Option<&str> {
        self.course_code.as_deref().filter(|code| !code.is_empty())
    }

    pub fn room_or_unknown(&self) -> &str {
        self.room.as_deref().unwrap_or(UNKNOWN_ROOM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_cell_fills_every_field() {
        let entry = ClassEntry::from_fragments(&[
            "9:00 - 10:00",
            "CS101",
            "Dr. Smith",
            "Room A1",
            "Weeks 1-12",
        ])
        .unwrap();
        assert_eq!(entry.time, "9:00 - 10:00");
        assert_eq!(entry.course_code.as_deref(), Some("CS101"));
        assert_eq!(entry.lecturer.as_deref(), Some("Dr. Smith"));
        assert_eq!(entry.room.as_deref(), Some("Room A1"));
        assert_eq!(entry.weeks.as_deref(), Some("Weeks 1-12"));
    }

    #[test]
    fn short_cell_leaves_trailing_fields_empty() {
        let entry = ClassEntry::from_fragments(&["9:00 - 10:00", "CS101"]).unwrap();
        assert_eq!(entry.course_code.as_deref(), Some("CS101"));
        assert_eq!(entry.lecturer, None);
        assert_eq!(entry.room, None);
        assert_eq!(entry.weeks, None);
    }

    #[test]
    fn extra_lines_are_ignored() {
        let entry =
            ClassEntry::from_fragments(&["9:00 - 10:00", "CS101", "L", "R", "Weeks 1-2", "extra"])
                .unwrap();
        assert_eq!(entry.weeks.as_deref(), Some("Weeks 1-2"));
    }

    #[test]
    fn empty_cell_has_no_entry() {
        let empty: [&str; 0] = [];
        assert!(ClassEntry::from_fragments(&empty).is_none());
    }

    #[test]
    fn blank_course_code_counts_as_missing() {
        let entry = ClassEntry::from_fragments(&["9:00 - 10:00", ""]).unwrap();
        assert_eq!(entry.course(), None);
        assert_eq!(entry.room_or_unknown(), "Unknown");
    }

    #[test]
    fn serializes_missing_fields_as_null() {
        let entry = ClassEntry::from_fragments(&["9:00 - 10:00"]).unwrap();
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "time": "9:00 - 10:00",
                "course_code": null,
                "lecturer": null,
                "room": null,
                "weeks": null
            })
        );
    }
}
