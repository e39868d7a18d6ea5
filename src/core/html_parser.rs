use std::sync::LazyLock;

use log::{error, info};
use scraper::{ElementRef, Html, Selector};

use crate::error::{ScrapeError, ScrapeResult};
use crate::model::class_entry::ClassEntry;
use crate::model::timetable::Timetable;

/// `id` of the grid the portal renders the student timetable into.
pub const TIMETABLE_TABLE_ID: &str = "MainContent_StudentTimetableGridView";

pub const TABLE_NOT_FOUND: &str = "Timetable table not found in the HTML content";

static TABLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(&format!("table[id=\"{}\"]", TIMETABLE_TABLE_ID))
        .expect("Invalid timetable table selector")
});
static HEADER_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th").expect("Invalid header selector"));
static ROW_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("Invalid row selector"));
static CELL_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td").expect("Invalid cell selector"));

/// Parses the rendered timetable page into day name -> class entries.
///
/// A missing table is an ordinary outcome (the page may not have finished
/// loading, or the login was rejected) and comes back as an error value,
/// as does any structural problem inside the table.
pub fn extract_timetable(html: &str) -> ScrapeResult<Timetable> {
    let document = Html::parse_document(html);
    let Some(table) = document.select(&TABLE_SELECTOR).next() else {
        error!("{}! Check the snapshots folder for error details.", TABLE_NOT_FOUND);
        return Err(ScrapeError::new(TABLE_NOT_FOUND));
    };

    match parse_table(table) {
        Ok(timetable) => {
            info!(
                "Timetable successfully parsed: {} days, {} classes",
                timetable.days().len(),
                timetable.entry_count()
            );
            Ok(timetable)
        }
        Err(err) => {
            let err = err.context("Failed to parse timetable HTML");
            error!("{}", err);
            Err(err)
        }
    }
}

fn parse_table(table: ElementRef<'_>) -> ScrapeResult<Timetable> {
    let headers: Vec<String> = table.select(&HEADER_SELECTOR).map(header_text).collect();
    let mut timetable = Timetable::with_days(&headers);

    // The first row holds the day headers.
    for (row_index, row) in table.select(&ROW_SELECTOR).enumerate().skip(1) {
        for (column, cell) in row.select(&CELL_SELECTOR).enumerate() {
            let fragments = cell_fragments(cell);
            let Some(entry) = ClassEntry::from_fragments(&fragments) else {
                continue;
            };
            let day = headers.get(column).ok_or_else(|| {
                ScrapeError::new(format!(
                    "row {} has a class in column {} but the table only has {} day headers",
                    row_index + 1,
                    column + 1,
                    headers.len()
                ))
            })?;
            timetable.push(day, entry);
        }
    }

    Ok(timetable)
}

/// Header text with every text node trimmed and joined without separators.
fn header_text(header: ElementRef<'_>) -> String {
    header
        .text()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect()
}

/// The non-blank text nodes of a cell, trimmed, in document order.
///
/// `<br>` and inline tags both end a text node, so each printed line of the
/// cell arrives as its own fragment.
pub fn cell_fragments(cell: ElementRef<'_>) -> Vec<String> {
    cell.text()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(String::from)
        .collect()
}
