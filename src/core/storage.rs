use std::fs;
use std::path::{Path, PathBuf};

use log::{error, info};

use crate::core::display::to_pretty_json;
use crate::error::ScrapeResult;
use crate::model::timetable::Timetable;

/// Saves the timetable as pretty JSON. Failures are logged and reported as `None`.
pub fn save_timetable(timetable: &Timetable, output: &Path) -> Option<PathBuf> {
    match write_json(timetable, output) {
        Ok(()) => {
            info!("Timetable saved to {}", output.display());
            Some(output.to_path_buf())
        }
        Err(err) => {
            error!("Failed to save timetable: {}", err);
            None
        }
    }
}

fn write_json(timetable: &Timetable, output: &Path) -> ScrapeResult<()> {
    let json = to_pretty_json(timetable)?;
    fs::write(output, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::class_entry::ClassEntry;

    #[test]
    fn saved_file_is_the_timetable_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timetable.json");
        let mut timetable = Timetable::with_days(["Monday", "Friday"]);
        timetable.push(
            "Friday",
            ClassEntry {
                time: "16:00 - 18:00".into(),
                course_code: Some("ET4011".into()),
                ..Default::default()
            },
        );

        assert_eq!(save_timetable(&timetable, &path), Some(path.clone()));
        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["Monday"], serde_json::json!([]));
        assert_eq!(saved["Friday"][0]["course_code"], "ET4011");
        assert_eq!(saved["Friday"][0]["lecturer"], serde_json::Value::Null);
    }

    #[test]
    fn io_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("timetable.json");
        assert_eq!(save_timetable(&Timetable::new(), &path), None);
    }
}
