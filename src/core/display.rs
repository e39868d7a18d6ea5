use std::io::Write;
use std::str::FromStr;

use log::error;
use serde::Serialize;

use crate::error::{ScrapeError, ScrapeResult};
use crate::model::class_entry::{ENTRY_FIELDS, EntryField};
use crate::model::timetable::Timetable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayFormat {
    Json,
    Table,
}

impl FromStr for DisplayFormat {
    type Err = ScrapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(DisplayFormat::Json),
            "table" => Ok(DisplayFormat::Table),
            other => Err(ScrapeError::new(format!("Unknown format type: {}", other))),
        }
    }
}

/// Writes the timetable to `out` as JSON or as one grid table per day.
///
/// An unknown format is logged and returned; nothing is written.
pub fn display_timetable<W: Write>(timetable: &Timetable, format: &str, out: &mut W) -> ScrapeResult<()> {
    let format = format.parse::<DisplayFormat>().inspect_err(|err| error!("{}", err))?;
    match format {
        DisplayFormat::Json => writeln!(out, "{}", to_pretty_json(timetable)?)?,
        DisplayFormat::Table => write!(out, "{}", render_day_tables(timetable))?,
    }
    Ok(())
}

/// JSON with four-space indentation.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> ScrapeResult<String> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;
    Ok(String::from_utf8(buffer)?)
}

const COLUMN_TITLES: [&str; 5] = ["Time", "Course", "Lecturer", "Room", "Weeks"];

/// A `=== Day ===` banner and a grid table for every day that has classes.
pub fn render_day_tables(timetable: &Timetable) -> String {
    let mut rendered = String::new();
    for day in timetable.days() {
        if day.entries.is_empty() {
            continue;
        }
        let rows: Vec<Vec<String>> = day
            .entries
            .iter()
            .map(|entry| {
                ENTRY_FIELDS
                    .iter()
                    .map(|field: &EntryField| entry.get(*field).unwrap_or_default().to_string())
                    .collect()
            })
            .collect();
        rendered.push_str(&format!("\n=== {} ===\n", day.day));
        rendered.push_str(&grid_table(&COLUMN_TITLES, &rows));
    }
    rendered
}

/// Plain-text table with `+---+` borders and a `+===+` rule under the header.
pub fn grid_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let rule = |fill: char| {
        let mut line = String::from("+");
        for width in &widths {
            line.extend(std::iter::repeat_n(fill, width + 2));
            line.push('+');
        }
        line.push('\n');
        line
    };
    let mut table = rule('-');
    table.push_str(&table_line(&widths, headers.iter().copied()));
    table.push_str(&rule('='));
    for row in rows {
        table.push_str(&table_line(&widths, row.iter().map(String::as_str)));
        table.push_str(&rule('-'));
    }
    table
}

fn table_line<'a>(widths: &[usize], cells: impl Iterator<Item = &'a str>) -> String {
    let mut line = String::from("|");
    for (width, cell) in widths.iter().zip(cells) {
        let padding = width - cell.chars().count();
        line.push_str(&format!(" {}{} |", cell, " ".repeat(padding)));
    }
    line.push('\n');
    line
}
