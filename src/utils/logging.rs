//! Log output for the command-line tool.
//!
//! Library code only emits records through the `log` macros; the binary calls
//! [`init_logging`] once and keeps the returned handle for the whole run.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use tracing::Level;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

pub const DEFAULT_LOG_FILE: &str = "scraper.log";

/// A log file larger than this is moved aside at start-up.
pub const MAX_LOG_FILE_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Lowers the default level from INFO to DEBUG.
    pub verbose: bool,
    pub log_file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_file: Some(PathBuf::from(DEFAULT_LOG_FILE)),
        }
    }
}

/// Proof that logging is set up, and where the file output goes.
#[derive(Debug)]
pub struct LoggingHandle {
    pub level: Level,
    pub log_file: Option<PathBuf>,
}

/// Installs a stderr layer and an optional file layer; `log` records are
/// forwarded to both. `RUST_LOG` overrides the level.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<LoggingHandle> {
    let level = if config.verbose { Level::DEBUG } else { Level::INFO };
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()))
    };

    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_timer(ChronoLocal::new("%H:%M:%S".to_string()))
        .compact()
        .with_filter(filter());

    let file_layer = match &config.log_file {
        Some(path) => {
            let file = open_log_file(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false)
                    .with_filter(filter()),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("failed to install the log subscriber")?;

    Ok(LoggingHandle {
        level,
        log_file: config.log_file.clone(),
    })
}

/// Opens `path` for appending, first moving it to `<path>.1` if it has grown
/// past [`MAX_LOG_FILE_BYTES`].
pub fn open_log_file(path: &Path) -> io::Result<File> {
    if let Ok(metadata) = fs::metadata(path) {
        if metadata.len() > MAX_LOG_FILE_BYTES {
            fs::rename(path, rolled_path(path))?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path)
}

fn rolled_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".1");
    PathBuf::from(name)
}
