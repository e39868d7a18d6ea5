use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use log::{debug, error, info};

pub const DEFAULT_SNAPSHOT_DIR: &str = "snapshots";

/// Where portal pages are dumped when a step fails (and, optionally, after every step).
#[derive(Debug, Clone)]
pub struct Snapshots {
    dir: Option<PathBuf>,
    every_step: bool,
}

impl Snapshots {
    pub fn new(dir: impl Into<PathBuf>, every_step: bool) -> Self {
        Snapshots {
            dir: Some(dir.into()),
            every_step,
        }
    }

    pub fn disabled() -> Self {
        Snapshots {
            dir: None,
            every_step: false,
        }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn save_error(&self, step: &str, html: &str) -> Option<PathBuf> {
        let path = self.write("error", step, html)?;
        info!("Error page saved to {}", path.display());
        Some(path)
    }

    /// Only writes when every step is being recorded.
    pub fn save_action(&self, step: &str, html: &str) -> Option<PathBuf> {
        if !self.every_step {
            return None;
        }
        let path = self.write("action", step, html)?;
        debug!("Page saved to {}", path.display());
        Some(path)
    }

    fn write(&self, kind: &str, step: &str, html: &str) -> Option<PathBuf> {
        let dir = self.dir.as_ref()?;
        let timestamp = Local::now().format("%Y%m%d-%H%M%S");
        let path = dir.join(format!("{}_{}_{}.html", kind, step, timestamp));
        let result = fs::create_dir_all(dir).and_then(|_| fs::write(&path, html));
        match result {
            Ok(()) => Some(path),
            Err(err) => {
                error!("Failed to save page snapshot: {}", err);
                None
            }
        }
    }
}
