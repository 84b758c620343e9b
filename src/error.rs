// src/error.rs
use std::time::Duration;
use thiserror::Error;

/// Everything that can go wrong while walking the catalog.
///
/// Only [`SpiderError::ContextRestore`] is fatal; every other variant is caught at the level
/// where it happens and turns that subtree into "no rows".
#[derive(Debug, Error)]
pub enum SpiderError {
    #[error("timed out after {timeout:?} waiting for {what}")]
    TimeoutExceeded { what: String, timeout: Duration },

    #[error("could not resolve {0}")]
    ElementNotResolvable(String),

    #[error("payload did not match: {0}")]
    ExtractionMismatch(String),

    #[error("could not restore browser context: {0}")]
    ContextRestore(String),

    #[error("webdriver: {0}")]
    WebDriver(#[from] thirtyfour::error::WebDriverError),

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

impl SpiderError {
    /// A broken context stack poisons every later navigation, so the run has to stop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SpiderError::ContextRestore(_))
    }
}

pub type Result<T> = std::result::Result<T, SpiderError>;
