//! Command-line interface definition.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use chrono::{Datelike, NaiveDate, Weekday};
use clap::{Parser, ValueEnum};
use log::warn;
use url::Url;

use crate::core::portal::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, PortalConfig};
use crate::model::theme::Theme;
use crate::utils::logging::DEFAULT_LOG_FILE;
use crate::utils::snapshot::{DEFAULT_SNAPSHOT_DIR, Snapshots};

/// UL Timetable Scraper - Fetch your University of Limerick timetable.
#[derive(Debug, Parser)]
#[command(name = "ul-timetable")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Your UL student email
    #[arg(short, long)]
    pub username: Option<String>,

    /// Your UL password
    #[arg(short, long)]
    pub password: Option<String>,

    /// Path to a JSON file containing credentials (username and password)
    #[arg(long, value_name = "PATH")]
    pub creds_file: Option<PathBuf>,

    /// Parse a saved timetable page instead of logging in
    #[arg(long, value_name = "PATH")]
    pub html_file: Option<PathBuf>,

    // --- Output ---
    /// Save timetable to a JSON file
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "json", value_parser = ["json", "table"])]
    pub format: String,

    /// Generate and save a timetable visualization as PNG images
    #[arg(long, value_name = "IMAGE_PATH")]
    pub image: Option<PathBuf>,

    /// Theme for timetable visualization
    #[arg(long, value_enum, default_value_t = ThemeArg::Light)]
    pub theme: ThemeArg,

    /// Export timetable to iCalendar (.ics) format
    #[arg(long, value_name = "CALENDAR_PATH")]
    pub export_calendar: Option<PathBuf>,

    /// Semester start date in YYYY-MM-DD format (Monday of week 1, required for calendar export)
    #[arg(long, value_name = "DATE")]
    pub semester_start: Option<String>,

    // --- Portal session ---
    /// Base address of the timetable portal
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub portal_url: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub timeout: u64,

    /// Save every page fetched during login, not only failing ones
    #[arg(long)]
    pub snapshots: bool,

    /// Directory for saved pages
    #[arg(long, value_name = "DIR", default_value = DEFAULT_SNAPSHOT_DIR)]
    pub snapshot_dir: PathBuf,

    // --- Logging ---
    /// Log file, rolled over past 1 MiB
    #[arg(long, value_name = "PATH", default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Increase logging verbosity
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeArg {
    Light,
    Dark,
    Blue,
    Sepia,
    Contrast,
    /// Light, then every other theme
    All,
}

impl ThemeArg {
    /// The theme to render and whether to follow it with all the others.
    pub fn selection(self) -> (Theme, bool) {
        match self {
            ThemeArg::Light => (Theme::Light, false),
            ThemeArg::Dark => (Theme::Dark, false),
            ThemeArg::Blue => (Theme::Blue, false),
            ThemeArg::Sepia => (Theme::Sepia, false),
            ThemeArg::Contrast => (Theme::Contrast, false),
            ThemeArg::All => (Theme::Light, true),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarRequest {
    pub path: PathBuf,
    pub semester_start: NaiveDate,
}

impl Cli {
    /// Checks the calendar flags before any other work is done.
    pub fn calendar_request(&self) -> anyhow::Result<Option<CalendarRequest>> {
        let Some(path) = &self.export_calendar else {
            return Ok(None);
        };
        let Some(date) = &self.semester_start else {
            bail!("--semester-start is required for calendar export. Format: YYYY-MM-DD");
        };
        let semester_start = parse_semester_start(date)?;
        Ok(Some(CalendarRequest {
            path: path.clone(),
            semester_start,
        }))
    }

    pub fn portal_config(&self) -> anyhow::Result<PortalConfig> {
        let base_url = Url::parse(&self.portal_url)
            .with_context(|| format!("invalid portal address {}", self.portal_url))?;
        Ok(PortalConfig {
            base_url,
            timeout: Duration::from_secs(self.timeout),
            snapshots: Snapshots::new(&self.snapshot_dir, self.snapshots),
        })
    }
}

/// Parses `YYYY-MM-DD`; a date that is not a Monday is accepted with a warning.
pub fn parse_semester_start(date: &str) -> anyhow::Result<NaiveDate> {
    let parsed = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date format {:?}. Use YYYY-MM-DD format.", date))?;
    if parsed.weekday() != Weekday::Mon {
        warn!("Semester start date should be a Monday (first day of week 1)");
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("ul-timetable").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let cli = parse(&[]);
        assert_eq!(cli.format, "json");
        assert_eq!(cli.theme, ThemeArg::Light);
        assert_eq!(cli.timeout, 30);
        assert_eq!(cli.portal_config().unwrap().timeout, DEFAULT_TIMEOUT);
        assert_eq!(cli.log_file, PathBuf::from("scraper.log"));
        assert!(cli.calendar_request().unwrap().is_none());
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(Cli::try_parse_from(["ul-timetable", "--format", "yaml"]).is_err());
    }

    #[test]
    fn calendar_needs_a_start_date() {
        let cli = parse(&["--export-calendar", "tt.ics"]);
        assert!(cli.calendar_request().is_err());

        let cli = parse(&["--export-calendar", "tt.ics", "--semester-start", "2025-13-01"]);
        assert!(cli.calendar_request().is_err());

        let cli = parse(&["--export-calendar", "tt.ics", "--semester-start", "2025-09-08"]);
        let request = cli.calendar_request().unwrap().unwrap();
        assert_eq!(request.path, PathBuf::from("tt.ics"));
        assert_eq!(request.semester_start, NaiveDate::from_ymd_opt(2025, 9, 8).unwrap());
    }

    #[test]
    fn non_monday_start_is_only_a_warning() {
        let date = parse_semester_start("2025-09-10").unwrap();
        assert_eq!(date.weekday(), Weekday::Wed);
    }

    #[test]
    fn all_theme_starts_with_light() {
        let cli = parse(&["--image", "week.png", "--theme", "all"]);
        assert_eq!(cli.theme.selection(), (Theme::Light, true));
        assert_eq!(ThemeArg::Dark.selection(), (Theme::Dark, false));
    }

    #[test]
    fn portal_config_from_flags() {
        let cli = parse(&["--timeout", "5", "--portal-url", "https://example.test/"]);
        let config = cli.portal_config().unwrap();
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.base_url.as_str(), "https://example.test/");

        let cli = parse(&["--portal-url", "not a url"]);
        assert!(cli.portal_config().is_err());
    }
}
