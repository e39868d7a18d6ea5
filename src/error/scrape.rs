use std::error::Error as StdError;
use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

pub type ScrapeResult<T> = Result<T, ScrapeError>;

/// The one failure shape handed to timetable consumers.
///
/// Serializes as `{"error": "<message>"}` so a failed scrape can be written
/// wherever a timetable would have been.
#[derive(Debug)]
pub struct ScrapeError {
    pub message: String,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl ScrapeError {
    pub fn new(message: impl Into<String>) -> Self {
        ScrapeError {
            message: message.into(),
            source: None,
        }
    }

    /// Prefixes the message, keeping the original source.
    pub fn context(self, prefix: &str) -> Self {
        ScrapeError {
            message: format!("{}: {}", prefix, self.message),
            source: self.source,
        }
    }

    /// The underlying error, if this one was converted from another.
    pub fn source_error(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.source.as_deref()
    }
}

impl fmt::Display for ScrapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

// Any std error converts, so `?` works on reqwest, io and serde results alike.
impl<E: StdError + Send + Sync + 'static> From<E> for ScrapeError {
    fn from(err: E) -> Self {
        ScrapeError {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl Serialize for ScrapeError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("error", &self.message)?;
        map.end()
    }
}
