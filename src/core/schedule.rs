//! Turns class entries into dated occurrences.
//!
//! The calendar export and the image renderer both read entries through the
//! parsers here, so a time or week string means the same thing to each.

use std::num::ParseIntError;
use std::ops::RangeInclusive;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use log::warn;
use regex::Regex;

use crate::model::class_entry::ClassEntry;
use crate::model::occurrence::Occurrence;
use crate::model::timetable::Timetable;

/// Occurrences generated for an entry without a usable week range.
pub const DEFAULT_WEEKLY_COUNT: u32 = 12;

/// Day names accepted as grid headers, Monday first.
pub const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Visible window of the image grid, in minutes after midnight.
pub const GRID_START_MINUTE: u32 = 9 * 60;
pub const GRID_END_MINUTE: u32 = 18 * 60;

static TIME_SPAN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2}):(\d{2})\s*-\s*(\d{1,2}):(\d{2})").expect("Invalid time span regex")
});
static WEEK_RANGE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)-(\d+)").expect("Invalid week range regex"));

/// Outcome of reading one free-text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldParse<T> {
    Parsed(T),
    Unparsed,
}

impl<T> FieldParse<T> {
    pub fn parsed(self) -> Option<T> {
        match self {
            FieldParse::Parsed(value) => Some(value),
            FieldParse::Unparsed => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSpan {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeSpan {
    pub fn start_minute(&self) -> u32 {
        self.start.hour() * 60 + self.start.minute()
    }

    pub fn end_minute(&self) -> u32 {
        self.end.hour() * 60 + self.end.minute()
    }
}

/// Inclusive teaching-week range, week 1 being the semester's first week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekRange {
    pub start: u32,
    pub end: u32,
}

impl WeekRange {
    pub fn weeks(&self) -> RangeInclusive<u32> {
        self.start..=self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    /// Days between week 1 and `week`.
    pub fn offset_days(week: u32) -> i64 {
        (i64::from(week) - 1) * 7
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recurrence {
    /// One occurrence per week of an explicit range.
    Weeks(WeekRange),
    /// Weekly from the first date, `count` times.
    Weekly { count: u32 },
}

/// An entry placed on the calendar: its first sitting plus how it repeats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledEntry<'a> {
    pub day: &'a str,
    pub course_code: &'a str,
    pub entry: &'a ClassEntry,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub recurrence: Recurrence,
}

impl ScheduledEntry<'_> {
    pub fn occurrences(&self) -> Vec<Occurrence> {
        match self.recurrence {
            Recurrence::Weeks(range) => range
                .weeks()
                .filter_map(|week| self.occurrence(WeekRange::offset_days(week), Some(week)))
                .collect(),
            Recurrence::Weekly { count } => (0..count)
                .filter_map(|index| self.occurrence(i64::from(index) * 7, None))
                .collect(),
        }
    }

    fn occurrence(&self, shift_days: i64, week: Option<u32>) -> Option<Occurrence> {
        let shift = TimeDelta::try_days(shift_days)?;
        Some(Occurrence {
            course_code: self.course_code.to_string(),
            lecturer: self.entry.lecturer.clone(),
            room: self.entry.room.clone(),
            day: self.day.to_string(),
            start: self.start.checked_add_signed(shift)?,
            end: self.end.checked_add_signed(shift)?,
            week,
        })
    }
}

/// Monday = 0 .. Sunday = 6; `None` for anything else.
pub fn weekday_offset(day: &str) -> Option<u32> {
    WEEKDAYS.iter().position(|name| *name == day).map(|i| i as u32)
}

/// Reads `"H:MM - H:MM"` (spaces around the hyphen optional) from the start of `text`.
pub fn parse_time_span(text: &str) -> FieldParse<TimeSpan> {
    let Some(caps) = TIME_SPAN_REGEX.captures(text) else {
        return FieldParse::Unparsed;
    };
    let number = |i: usize| caps[i].parse::<u32>().ok();
    let time = |h: Option<u32>, m: Option<u32>| NaiveTime::from_hms_opt(h?, m?, 0);

    match (time(number(1), number(2)), time(number(3), number(4))) {
        (Some(start), Some(end)) => FieldParse::Parsed(TimeSpan { start, end }),
        _ => FieldParse::Unparsed,
    }
}

/// Finds the first `N-M` in a weeks field such as `"Weeks 1-12"`.
///
/// A range whose numbers do not fit a week count is an error rather than
/// `Unparsed`, so the entry is not silently given the weekly default.
pub fn parse_week_range(text: Option<&str>) -> Result<FieldParse<WeekRange>, ParseIntError> {
    let Some(caps) = text.and_then(|t| WEEK_RANGE_REGEX.captures(t)) else {
        return Ok(FieldParse::Unparsed);
    };
    let start = caps[1].parse::<u32>()?;
    let end = caps[2].parse::<u32>()?;
    Ok(FieldParse::Parsed(WeekRange { start, end }))
}

/// Places every usable entry relative to `semester_start`, the Monday of week 1.
///
/// Entries without a course code, with an unreadable time, or under a header
/// that is not a weekday are skipped; the last two are logged.
pub fn schedule_entries(timetable: &Timetable, semester_start: NaiveDate) -> Vec<ScheduledEntry<'_>> {
    let mut scheduled = Vec::new();

    for day in timetable.days() {
        if day.entries.is_empty() {
            continue;
        }
        let Some(offset) = weekday_offset(&day.day) else {
            warn!("Unknown day: {}, skipping", day.day);
            continue;
        };
        let Some(date) = semester_start.checked_add_days(chrono::Days::new(u64::from(offset))) else {
            warn!("Date out of range for {}, skipping", day.day);
            continue;
        };

        for entry in &day.entries {
            let Some(course_code) = entry.course() else {
                continue;
            };
            let FieldParse::Parsed(span) = parse_time_span(&entry.time) else {
                warn!("Could not parse time format: {}", entry.time);
                continue;
            };

            let weeks = match parse_week_range(entry.weeks.as_deref()) {
                Ok(weeks) => weeks,
                Err(err) => {
                    warn!(
                        "Week range {:?} of {} on {} is out of range ({}), skipping",
                        entry.weeks.as_deref().unwrap_or_default(),
                        course_code,
                        day.day,
                        err
                    );
                    continue;
                }
            };
            let recurrence = match weeks {
                FieldParse::Parsed(range) => {
                    if range.is_empty() {
                        warn!(
                            "Week range {}-{} of {} on {} is empty",
                            range.start, range.end, course_code, day.day
                        );
                    }
                    Recurrence::Weeks(range)
                }
                FieldParse::Unparsed => Recurrence::Weekly {
                    count: DEFAULT_WEEKLY_COUNT,
                },
            };

            scheduled.push(ScheduledEntry {
                day: &day.day,
                course_code,
                entry,
                start: date.and_time(span.start),
                end: date.and_time(span.end),
                recurrence,
            });
        }
    }

    scheduled
}

/// Every dated occurrence of every usable entry.
pub fn expand(timetable: &Timetable, semester_start: NaiveDate) -> Vec<Occurrence> {
    schedule_entries(timetable, semester_start)
        .iter()
        .flat_map(|scheduled| scheduled.occurrences())
        .collect()
}

/// A class block as drawn on the weekly grid, clipped to the visible window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklySlot<'a> {
    pub column: usize,
    pub course_code: &'a str,
    pub entry: &'a ClassEntry,
    pub room: &'a str,
    /// Index into `WeeklyGrid::rooms`, also the palette slot.
    pub room_index: usize,
    /// The class times as printed, before clipping.
    pub span: TimeSpan,
    pub start_minute: u32,
    pub end_minute: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeeklyGrid<'a> {
    pub days: Vec<&'a str>,
    pub slots: Vec<WeeklySlot<'a>>,
    /// Rooms in the order they were first seen.
    pub rooms: Vec<&'a str>,
}

/// Lays the timetable out as one column per weekday that has classes.
pub fn weekly_grid(timetable: &Timetable) -> WeeklyGrid<'_> {
    let mut grid = WeeklyGrid::default();

    for day in timetable.days() {
        if day.entries.is_empty() {
            continue;
        }
        if weekday_offset(&day.day).is_none() {
            warn!("Unknown day: {}, skipping", day.day);
            continue;
        }
        let column = grid.days.len();
        grid.days.push(&day.day);

        for entry in &day.entries {
            let Some(course_code) = entry.course() else {
                continue;
            };
            let FieldParse::Parsed(span) = parse_time_span(&entry.time) else {
                warn!("Could not parse time format: {}", entry.time);
                continue;
            };
            let (start, end) = (span.start_minute(), span.end_minute());
            if end < GRID_START_MINUTE || start > GRID_END_MINUTE {
                continue;
            }

            let room = entry.room_or_unknown();
            let room_index = match grid.rooms.iter().position(|r| *r == room) {
                Some(index) => index,
                None => {
                    grid.rooms.push(room);
                    grid.rooms.len() - 1
                }
            };

            grid.slots.push(WeeklySlot {
                column,
                course_code,
                entry,
                room,
                room_index,
                span,
                start_minute: start.max(GRID_START_MINUTE),
                end_minute: end.min(GRID_END_MINUTE),
            });
        }
    }

    grid
}
