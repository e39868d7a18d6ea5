use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::model::class_entry::ClassEntry;

/// One column of the grid: the header text and the entries found under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySchedule {
    pub day: String,
    pub entries: Vec<ClassEntry>,
}

/// Day name to class entries, in the order the headers appear.
///
/// A header text that repeats maps to a single day, kept at the position of
/// its first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timetable {
    days: Vec<DaySchedule>,
}

impl Timetable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a timetable with an empty entry list for every header.
    pub fn with_days<I, S>(days: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut timetable = Self::new();
        for day in days {
            timetable.add_day(day.as_ref());
        }
        timetable
    }

    pub fn add_day(&mut self, day: &str) {
        if self.position(day).is_none() {
            self.days.push(DaySchedule {
                day: day.to_string(),
                entries: Vec::new(),
            });
        }
    }

    /// Appends an entry under `day`, adding the day if it is new.
    pub fn push(&mut self, day: &str, entry: ClassEntry) {
        let index = match self.position(day) {
            Some(index) => index,
            None => {
                self.add_day(day);
                self.days.len() - 1
            }
        };
        self.days[index].entries.push(entry);
    }

    pub fn get(&self, day: &str) -> Option<&[ClassEntry]> {
        self.position(day).map(|index| self.days[index].entries.as_slice())
    }

    pub fn days(&self) -> &[DaySchedule] {
        &self.days
    }

    pub fn day_names(&self) -> impl Iterator<Item = &str> {
        self.days.iter().map(|d| d.day.as_str())
    }

    pub fn entry_count(&self) -> usize {
        self.days.iter().map(|d| d.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entry_count() == 0
    }

    fn position(&self, day: &str) -> Option<usize> {
        self.days.iter().position(|d| d.day == day)
    }
}

impl Serialize for Timetable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.days.len()))?;
        for day in &self.days {
            map.serialize_entry(&day.day, &day.entries)?;
        }
        map.end()
    }
}
