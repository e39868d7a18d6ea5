pub mod class_entry;
pub mod credentials;
pub mod occurrence;
pub mod theme;
pub mod timetable;
