// src/report.rs
use std::fmt;

/// Counters for one crawl. Every skipped subtree shows up here as well as in the log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    pub datasets: usize,
    pub datasets_failed: usize,
    pub records_visited: usize,
    pub records_skipped: usize,
    pub sections_skipped: usize,
    pub tabs_skipped: usize,
    pub modals_visited: usize,
    pub modals_failed: usize,
    /// Modals whose close control could not be found or clicked.
    pub modals_left_open: usize,
    /// Windows opened for a dataset or record that the crawl could not switch into.
    pub windows_leaked: usize,
    pub rows_written: usize,
    pub rows_lost: usize,
}

impl fmt::Display for CrawlReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Datasets: {} ({} failed to load)",
            self.datasets, self.datasets_failed
        )?;
        writeln!(
            f,
            "Records: {} visited, {} skipped",
            self.records_visited, self.records_skipped
        )?;
        writeln!(
            f,
            "Skipped: {} sections, {} tabs",
            self.sections_skipped, self.tabs_skipped
        )?;
        writeln!(
            f,
            "Modals: {} visited, {} failed, {} left open",
            self.modals_visited, self.modals_failed, self.modals_left_open
        )?;
        writeln!(f, "Windows left open: {}", self.windows_leaked)?;
        write!(
            f,
            "Rows: {} written, {} lost",
            self.rows_written, self.rows_lost
        )
    }
}
