// src/crawl.rs
//! Depth-first walk over catalog → dataset → record → section → tab → modal.
//!
//! The walk is an explicit state machine. Each state handler does the work for one level,
//! moves the cursor and returns the next state. Failures stay local to the subtree where
//! they happen: they are logged, counted in the [`CrawlReport`] and the walk moves on to
//! the next sibling. Only a failed window restore stops the crawl.

use log::{debug, error, info, warn};
use thirtyfour::support::sleep;

use crate::config::CrawlConfig;
use crate::error::{Result, SpiderError};
use crate::extract::extract_fields;
use crate::links::{resolve_href, url_from_click_handler};
use crate::model::{CatalogEntry, ExtractedRow, Section};
use crate::report::CrawlReport;
use crate::selectors::Selectors;
use crate::sink::{RowBuffer, RowSink};
use crate::surface::Surface;
use crate::wait::Waiter;
use crate::window::ContextStack;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AtCatalog,
    AtCollection,
    /// On a record page, about to open the given section (`None` once both are done).
    AtDetail(Option<Section>),
    AtFieldGroup(Section),
    AtTab(Section),
    AtModal(Section),
    Finished,
}

/// Where the walk currently is. Counts are taken when a level is entered; ordinals are
/// the next sibling to visit.
#[derive(Debug, Default)]
struct Cursor {
    entry: usize,
    dataset: String,
    triggers: usize,
    trigger: usize,
    tabs: usize,
    tab: usize,
    tab_label: String,
    expanders: usize,
    expander: usize,
}

impl Cursor {
    /// Moves to the next tab and forgets everything about the previous one. Returns the
    /// ordinal of the tab being entered.
    fn next_tab(&mut self) -> usize {
        let ordinal = self.tab;
        self.tab += 1;
        self.tab_label.clear();
        self.expanders = 0;
        self.expander = 0;
        ordinal
    }

    fn position(&self) -> String {
        let tab = if self.tab_label.is_empty() {
            format!("tab #{}", self.tab)
        } else {
            format!("tab '{}'", self.tab_label)
        };
        format!(
            "dataset {}, record #{}, {tab}, field #{}",
            self.dataset, self.trigger, self.expander
        )
    }
}

pub struct Crawler<'a, S: Surface, K: RowSink> {
    surface: &'a S,
    sink: &'a mut K,
    selectors: &'a Selectors,
    config: &'a CrawlConfig,
    waiter: Waiter,
    contexts: ContextStack,
    buffer: RowBuffer,
    report: CrawlReport,
    entries: Vec<CatalogEntry>,
    cursor: Cursor,
}

impl<'a, S: Surface, K: RowSink> Crawler<'a, S, K> {
    /// The window active right now becomes the catalog window every dataset returns to.
    pub async fn new(
        surface: &'a S,
        sink: &'a mut K,
        selectors: &'a Selectors,
        config: &'a CrawlConfig,
    ) -> Result<Self> {
        let contexts = ContextStack::rooted(surface).await?;
        Ok(Self {
            surface,
            sink,
            selectors,
            config,
            waiter: config.waiter(),
            contexts,
            buffer: RowBuffer::default(),
            report: CrawlReport::default(),
            entries: Vec::new(),
            cursor: Cursor::default(),
        })
    }

    /// Opens the browse page from the landing page and captures every dataset link on it.
    pub async fn snapshot_catalog(&self) -> Result<Vec<CatalogEntry>> {
        let start = self.surface.current_url().await?;
        let browse = self
            .waiter
            .clickable(self.surface, &self.selectors.browse_link)
            .await?;
        self.surface.click(&browse).await?;
        let catalog_url = self.waiter.url_changed(self.surface, &start).await?;
        info!("Catalog page loaded: {catalog_url}");
        sleep(self.config.settle).await;

        self.waiter
            .present(self.surface, &self.selectors.dataset_links)
            .await?;
        let links = self.surface.find_all(&self.selectors.dataset_links).await?;

        let mut entries = Vec::with_capacity(links.len());
        for link in &links {
            match self.surface.attr(link, "href").await? {
                Some(href) if !href.trim().is_empty() => {
                    entries.push(CatalogEntry::from_url(resolve_href(&catalog_url, &href)));
                }
                _ => debug!("Skipping dataset link without href"),
            }
        }
        info!("Found {} datasets", entries.len());
        Ok(entries)
    }

    /// Walks every entry (up to the configured limit) and returns the run's counters.
    pub async fn crawl(mut self, entries: Vec<CatalogEntry>) -> Result<CrawlReport> {
        self.entries = match self.config.limit {
            Some(limit) => entries.into_iter().take(limit).collect(),
            None => entries,
        };
        info!("Crawling {} datasets", self.entries.len());

        let mut state = State::AtCatalog;
        while state != State::Finished {
            state = match self.step(state).await {
                Ok(next) => next,
                Err(e) => {
                    error!("Aborting crawl in {state:?} at {}: {e}", self.position());
                    self.flush_rows();
                    return Err(e);
                }
            };
        }
        self.report.windows_leaked = self.contexts.leaked().len();
        Ok(self.report)
    }

    async fn step(&mut self, state: State) -> Result<State> {
        match state {
            State::AtCatalog => self.at_catalog().await,
            State::AtCollection => self.at_collection().await,
            State::AtDetail(None) => {
                self.contexts.pop(self.surface).await?;
                Ok(State::AtCollection)
            }
            State::AtDetail(Some(section)) => self.at_detail(section).await,
            State::AtFieldGroup(section) => self.at_field_group(section).await,
            State::AtTab(section) => Ok(if self.cursor.expander < self.cursor.expanders {
                State::AtModal(section)
            } else {
                State::AtFieldGroup(section)
            }),
            State::AtModal(section) => self.at_modal(section).await,
            State::Finished => Ok(State::Finished),
        }
    }

    async fn at_catalog(&mut self) -> Result<State> {
        let Some(entry) = self.entries.get(self.cursor.entry).cloned() else {
            return Ok(State::Finished);
        };
        self.cursor.entry += 1;
        self.cursor.dataset = entry.id.clone();
        self.report.datasets += 1;
        info!(
            "Processing dataset {} of {}: {}",
            self.cursor.entry,
            self.entries.len(),
            entry.id
        );

        match self.open_collection(&entry).await {
            Ok(triggers) => {
                info!("Dataset {} lists {triggers} records", entry.id);
                self.cursor.triggers = triggers;
                self.cursor.trigger = 0;
                Ok(State::AtCollection)
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!("Skipping dataset {}: {e}", entry.id);
                self.report.datasets_failed += 1;
                if self.contexts.depth() > 0 {
                    self.contexts.pop(self.surface).await?;
                }
                Ok(State::AtCatalog)
            }
        }
    }

    async fn open_collection(&mut self, entry: &CatalogEntry) -> Result<usize> {
        let (surface, selectors, settle) = (self.surface, self.selectors, self.config.settle);

        self.contexts.push(surface, &entry.url).await?;
        self.waiter.url_contains(surface, &entry.id).await?;
        self.waiter.present(surface, &selectors.page_body).await?;
        self.waiter.document_ready(surface).await?;
        self.waiter.present(surface, &selectors.dataset_marker).await?;

        if let Err(e) = self.waiter.scroll_stabilize(surface, settle).await {
            warn!("Dataset {} kept growing while scrolling: {e}", entry.id);
        }
        if let Err(e) = self.set_page_size().await {
            warn!(
                "Could not set page size to {} on {}: {e}",
                self.config.page_size, entry.id
            );
        }
        surface.scroll_to_top().await?;
        sleep(settle).await;

        if let Err(e) = self.waiter.present(surface, &selectors.detail_buttons).await {
            warn!("No records listed on {}: {e}", entry.id);
        }
        Ok(surface.find_all(&selectors.detail_buttons).await?.len())
    }

    async fn set_page_size(&self) -> Result<()> {
        let select = self.surface.find_nth(&self.selectors.pagination, 0).await?;
        self.surface
            .select_value(&select, &self.config.page_size)
            .await?;
        sleep(self.config.settle).await;
        Ok(())
    }

    async fn at_collection(&mut self) -> Result<State> {
        if self.cursor.trigger >= self.cursor.triggers {
            self.flush_rows();
            self.contexts.pop(self.surface).await?;
            return Ok(State::AtCatalog);
        }
        let ordinal = self.cursor.trigger;
        self.cursor.trigger += 1;

        match self.open_detail(ordinal).await {
            Ok(()) => {
                self.report.records_visited += 1;
                Ok(State::AtDetail(Some(Section::Inputs)))
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!("Skipping record at {}: {e}", self.position());
                self.report.records_skipped += 1;
                Ok(State::AtCollection)
            }
        }
    }

    async fn open_detail(&mut self, ordinal: usize) -> Result<()> {
        let surface = self.surface;
        let button = surface
            .find_nth(&self.selectors.detail_buttons, ordinal)
            .await?;
        surface.scroll_into_view(&button).await?;
        sleep(self.config.settle).await;

        let url = self.detail_url(&button, ordinal).await?;
        debug!("Record {} of {} is {url}", ordinal + 1, self.cursor.dataset);
        self.contexts.push(surface, &url).await?;
        if let Err(e) = self.waiter.document_ready(surface).await {
            warn!("Record page {url} did not report ready: {e}");
        }
        Ok(())
    }

    /// Nearest enclosing link first, then a URL inside the button's click handler.
    async fn detail_url(&self, button: &S::Element, ordinal: usize) -> Result<String> {
        let base = self.surface.current_url().await?;
        let links = self
            .surface
            .find_all_within(button, &self.selectors.detail_link)
            .await?;
        if let Some(link) = links.last() {
            if let Some(href) = self.surface.attr(link, "href").await? {
                if !href.trim().is_empty() {
                    return Ok(resolve_href(&base, &href));
                }
            }
        }
        if let Some(handler) = self.surface.attr(button, "onclick").await? {
            if let Some(url) = url_from_click_handler(&handler) {
                return Ok(resolve_href(&base, &url));
            }
        }
        Err(SpiderError::ElementNotResolvable(format!(
            "URL behind detail button #{}",
            ordinal + 1
        )))
    }

    async fn at_detail(&mut self, section: Section) -> Result<State> {
        match self.enter_section(section).await {
            Ok(tabs) => {
                self.cursor.tabs = tabs;
                self.cursor.tab = 0;
                Ok(State::AtFieldGroup(section))
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!("Skipping {section} at {}: {e}", self.position());
                self.report.sections_skipped += 1;
                Ok(State::AtDetail(section.next()))
            }
        }
    }

    async fn enter_section(&self, section: Section) -> Result<usize> {
        let selectors = self.selectors.section(section);
        let nav = self.waiter.clickable(self.surface, &selectors.nav).await?;
        self.surface.click(&nav).await?;
        sleep(self.config.settle).await;
        let tabs = self.surface.find_all(&selectors.tabs).await?.len();
        debug!("{section} has {tabs} tabs");
        Ok(tabs)
    }

    async fn at_field_group(&mut self, section: Section) -> Result<State> {
        if self.cursor.tab >= self.cursor.tabs {
            return Ok(State::AtDetail(section.next()));
        }
        let ordinal = self.cursor.next_tab();

        match self.select_tab(section, ordinal).await {
            Ok((label, expanders)) => {
                self.cursor.tab_label = label;
                self.cursor.expanders = expanders;
                self.cursor.expander = 0;
                Ok(State::AtTab(section))
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!(
                    "Skipping tab #{} of {section} at {}: {e}",
                    ordinal + 1,
                    self.position()
                );
                self.report.tabs_skipped += 1;
                Ok(State::AtFieldGroup(section))
            }
        }
    }

    /// The first tab is already showing when a section opens, so it is only read.
    async fn select_tab(&self, section: Section, ordinal: usize) -> Result<(String, usize)> {
        let selectors = self.selectors.section(section);
        let tab = self.surface.find_nth(&selectors.tabs, ordinal).await?;
        let label = self.surface.text(&tab).await?.trim().to_string();
        if ordinal > 0 {
            self.surface.scroll_into_view(&tab).await?;
            self.surface.click(&tab).await?;
            sleep(self.config.settle).await;
        }
        let expanders = self.surface.find_all(&selectors.expanders).await?.len();
        debug!("{section} tab '{label}' has {expanders} fields");
        Ok((label, expanders))
    }

    async fn at_modal(&mut self, section: Section) -> Result<State> {
        let ordinal = self.cursor.expander;
        self.cursor.expander += 1;

        match self.visit_modal(section, ordinal).await {
            Ok(rows) => {
                self.report.modals_visited += 1;
                self.buffer.extend(rows);
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(
                    "Skipping field #{} at {}: {e}",
                    ordinal + 1,
                    self.position()
                );
                self.report.modals_failed += 1;
            }
        }
        Ok(State::AtTab(section))
    }

    async fn visit_modal(&mut self, section: Section, ordinal: usize) -> Result<Vec<ExtractedRow>> {
        let surface = self.surface;
        let expanders = &self.selectors.section(section).expanders;
        let trigger = surface.find_nth(expanders, ordinal).await?;
        surface.scroll_into_view(&trigger).await?;
        surface.click(&trigger).await?;
        sleep(self.config.settle).await;

        let payload = self.read_payload().await;
        if let Err(e) = self.close_modal().await {
            warn!(
                "Could not close field #{} at {}: {e}",
                ordinal + 1,
                self.position()
            );
            self.report.modals_left_open += 1;
        }
        let payload = payload?;

        let rows: Vec<ExtractedRow> = extract_fields(&payload)
            .into_iter()
            .map(|draft| draft.into_row(&self.cursor.dataset, section, &self.cursor.tab_label))
            .collect();
        for row in &rows {
            debug!(
                "{} / {section} / {}: {} #{} = {}",
                row.dataset_id, row.tab, row.data_type, row.index, row.value
            );
        }
        Ok(rows)
    }

    async fn read_payload(&self) -> Result<String> {
        let pre = self
            .waiter
            .present(self.surface, &self.selectors.payload)
            .await?;
        self.surface.text(&pre).await
    }

    async fn close_modal(&self) -> Result<()> {
        let close = self
            .waiter
            .clickable(self.surface, &self.selectors.modal_close)
            .await?;
        self.surface.click(&close).await?;
        sleep(self.config.settle).await;
        Ok(())
    }

    /// Appends this dataset's rows to the sink. A failed write loses the batch but not
    /// the crawl.
    fn flush_rows(&mut self) {
        let pending = self.buffer.len();
        match self.buffer.flush_into(&mut *self.sink) {
            Ok(0) => {}
            Ok(written) => {
                info!("Wrote {written} rows for {}", self.cursor.dataset);
                self.report.rows_written += written;
            }
            Err(e) => {
                error!(
                    "Lost {pending} rows for {}: {e}",
                    self.cursor.dataset
                );
                self.report.rows_lost += pending;
            }
        }
    }

    fn position(&self) -> String {
        self.cursor.position()
    }
}
