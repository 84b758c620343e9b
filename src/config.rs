// src/config.rs
use std::time::Duration;

use crate::wait::Waiter;

pub const ORD_URL: &str = "https://open-reaction-database.org";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Browser {
    #[default]
    Chrome,
    Firefox,
}

/// Connection settings for the WebDriver session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub webdriver_url: String,
    pub browser: Browser,
    pub headless: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:4444".to_string(),
            browser: Browser::default(),
            headless: false,
        }
    }
}

/// Knobs for the walk itself.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub base_url: String,
    /// How long any single readiness wait may take.
    pub timeout: Duration,
    pub poll_interval: Duration,
    /// Pause after clicks and scrolls so the page can re-render.
    pub settle: Duration,
    /// Largest page size the dataset listing offers.
    pub page_size: String,
    /// Only walk the first `limit` datasets.
    pub limit: Option<usize>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_url: ORD_URL.to_string(),
            timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(250),
            settle: Duration::from_millis(500),
            page_size: "100".to_string(),
            limit: None,
        }
    }
}

impl CrawlConfig {
    pub fn waiter(&self) -> Waiter {
        Waiter::new(self.timeout, self.poll_interval)
    }
}
