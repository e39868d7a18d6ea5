use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use icalendar::{Calendar, CalendarDateTime, Component, Event, EventLike};
use log::{error, info};
use uuid::Uuid;

use crate::core::schedule::{Recurrence, ScheduledEntry, schedule_entries};
use crate::error::ScrapeResult;
use crate::model::class_entry::UNKNOWN_ROOM;
use crate::model::occurrence::Occurrence;
use crate::model::timetable::Timetable;

pub const CALENDAR_NAME: &str = "UL Timetable";

/// Builds the calendar: one event per week for entries with a week range,
/// one weekly-repeating event for the rest.
pub fn build_calendar(timetable: &Timetable, semester_start: NaiveDate) -> Calendar {
    let mut calendar = Calendar::new();
    calendar.name(CALENDAR_NAME);

    for scheduled in schedule_entries(timetable, semester_start) {
        match scheduled.recurrence {
            Recurrence::Weeks(_) => {
                for occurrence in scheduled.occurrences() {
                    calendar.push(week_event(&occurrence));
                }
            }
            Recurrence::Weekly { count } => {
                calendar.push(recurring_event(&scheduled, count));
            }
        }
    }

    calendar.done()
}

fn week_event(occurrence: &Occurrence) -> Event {
    let week = occurrence.week.unwrap_or_default();
    let description = match &occurrence.lecturer {
        Some(lecturer) => format!("Lecturer: {}\nWeek: {}", lecturer, week),
        None => format!("Week: {}", week),
    };

    Event::new()
        .summary(&occurrence.course_code)
        .description(&description)
        .location(occurrence.room.as_deref().unwrap_or(UNKNOWN_ROOM))
        .starts(CalendarDateTime::Floating(occurrence.start))
        .ends(CalendarDateTime::Floating(occurrence.end))
        .uid(&Uuid::new_v4().to_string())
        .done()
}

fn recurring_event(scheduled: &ScheduledEntry<'_>, count: u32) -> Event {
    let mut event = Event::new();
    event
        .summary(scheduled.course_code)
        .location(scheduled.entry.room_or_unknown())
        .starts(CalendarDateTime::Floating(scheduled.start))
        .ends(CalendarDateTime::Floating(scheduled.end))
        .add_property("RRULE", format!("FREQ=WEEKLY;COUNT={}", count))
        .uid(&Uuid::new_v4().to_string());
    if let Some(lecturer) = &scheduled.entry.lecturer {
        event.description(&format!("Lecturer: {}", lecturer));
    }
    event.done()
}

/// Writes the `.ics` file. Failures are logged and reported as `None`.
pub fn export_calendar(
    timetable: &Timetable,
    output: &Path,
    semester_start: NaiveDate,
) -> Option<PathBuf> {
    match write_calendar(timetable, output, semester_start) {
        Ok(path) => {
            info!("Calendar exported to {}", path.display());
            Some(path)
        }
        Err(err) => {
            error!("Failed to export calendar: {}", err);
            None
        }
    }
}

fn write_calendar(timetable: &Timetable, output: &Path, semester_start: NaiveDate) -> ScrapeResult<PathBuf> {
    let calendar = build_calendar(timetable, semester_start);
    fs::write(output, calendar.to_string())?;
    Ok(output.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::class_entry::ClassEntry;

    fn sample() -> Timetable {
        let mut timetable = Timetable::with_days(["Monday", "Tuesday", "Saturday"]);
        timetable.push(
            "Monday",
            ClassEntry {
                time: "9:00 - 10:00".into(),
                course_code: Some("CS101".into()),
                lecturer: Some("Dr. Smith".into()),
                room: Some("A1".into()),
                weeks: Some("Weeks 1-3".into()),
            },
        );
        timetable.push(
            "Tuesday",
            ClassEntry {
                time: "11:00 - 12:00".into(),
                course_code: Some("CS102".into()),
                ..Default::default()
            },
        );
        timetable
    }

    fn semester_start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 8).unwrap()
    }

    #[test]
    fn ranged_and_recurring_events() {
        let ics = build_calendar(&sample(), semester_start()).to_string();

        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 4);
        assert_eq!(ics.matches("FREQ=WEEKLY").count(), 1);
        assert!(ics.contains("COUNT=12"));
        assert!(ics.contains("DTSTART:20250908T090000"));
        assert!(ics.contains("DTSTART:20250922T090000"));
        assert!(ics.contains("DTSTART:20250909T110000"));
        assert!(ics.contains("SUMMARY:CS101"));
        assert!(ics.contains("LOCATION:Unknown"));
        assert!(ics.contains("Week: 3"));
    }

    #[test]
    fn every_event_gets_its_own_uid() {
        let calendar = build_calendar(&sample(), semester_start());
        let ics = calendar.to_string();
        let uids: std::collections::HashSet<_> =
            ics.lines().filter(|line| line.starts_with("UID:")).collect();
        assert_eq!(uids.len(), 4);
    }

    #[test]
    fn writes_ics_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timetable.ics");
        let written = export_calendar(&sample(), &path, semester_start()).unwrap();
        assert_eq!(written, path);
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("BEGIN:VCALENDAR"));
    }

    #[test]
    fn unwritable_path_reports_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("timetable.ics");
        assert!(export_calendar(&sample(), &path, semester_start()).is_none());
    }
}
