// tests/common/mod.rs
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use ord_spider_rs::config::CrawlConfig;
use ord_spider_rs::error::{Result, SpiderError};
use ord_spider_rs::model::{CatalogEntry, ContextHandle, Section};
use ord_spider_rs::selectors::Selectors;
use ord_spider_rs::surface::{Locator, Surface};

pub const BASE: &str = "https://ord.test/";

/// Listing pages show this many records until the page size is raised.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// How a detail button exposes the URL of its record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    Anchor,
    OnClick,
    Missing,
}

#[derive(Debug, Clone)]
pub struct FakeTab {
    pub label: String,
    pub payloads: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FakeRecord {
    pub link: Link,
    /// `None` means the section's nav item never renders.
    pub inputs: Option<Vec<FakeTab>>,
    pub outcomes: Option<Vec<FakeTab>>,
}

impl FakeRecord {
    fn section(&self, section: Section) -> Option<&Vec<FakeTab>> {
        match section {
            Section::Inputs => self.inputs.as_ref(),
            Section::Outcomes => self.outcomes.as_ref(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FakeDataset {
    pub id: String,
    pub records: Vec<FakeRecord>,
    /// When false the dataset page never shows its content.
    pub loads: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FakeSite {
    pub datasets: Vec<FakeDataset>,
    pub modal_close_missing: bool,
    /// Queries for the close control that come back empty after each modal opens.
    pub modal_close_delay: u32,
    /// Reading this tab's label fails.
    pub unreadable_tab: Option<(Section, usize)>,
    pub window_close_fails: bool,
    /// Record windows open but cannot be switched to.
    pub record_switch_fails: bool,
    pub endless_scroll: bool,
}

impl FakeSite {
    /// `datasets` × `records` × both sections × `tabs` × `fields`, one type/value payload
    /// per field.
    pub fn uniform(datasets: usize, records: usize, tabs: usize, fields: usize) -> Self {
        let datasets = (0..datasets)
            .map(|d| FakeDataset {
                id: format!("ord_dataset-{d}"),
                loads: true,
                records: (0..records)
                    .map(|r| {
                        let section = |s: usize| -> Vec<FakeTab> {
                            (0..tabs)
                                .map(|t| FakeTab {
                                    label: format!("Tab {t}"),
                                    payloads: (0..fields)
                                        .map(|f| payload(d, r, s, t, f))
                                        .collect(),
                                })
                                .collect()
                        };
                        FakeRecord {
                            link: Link::Anchor,
                            inputs: Some(section(0)),
                            outcomes: Some(section(1)),
                        }
                    })
                    .collect(),
            })
            .collect();
        Self {
            datasets,
            ..Self::default()
        }
    }

    pub fn entries(&self) -> Vec<CatalogEntry> {
        (0..self.datasets.len())
            .map(|d| CatalogEntry::from_url(self.dataset_url(d)))
            .collect()
    }

    pub fn dataset_url(&self, d: usize) -> String {
        format!("{BASE}dataset/{}", self.datasets[d].id)
    }

    pub fn record_url(&self, d: usize, r: usize) -> String {
        format!("{BASE}id/ord-{d}-{r}")
    }

    fn page_for(&self, url: &str) -> Page {
        if url == BASE {
            return Page::Landing;
        }
        if url == format!("{BASE}browse") {
            return Page::Browse;
        }
        for (d, dataset) in self.datasets.iter().enumerate() {
            if url == self.dataset_url(d) {
                return Page::Dataset(d);
            }
            for r in 0..dataset.records.len() {
                if url == self.record_url(d, r) {
                    return Page::Record(d, r);
                }
            }
        }
        Page::Blank
    }
}

/// Type is unique per field so rows can be traced back to their position.
pub fn payload(d: usize, r: usize, s: usize, t: usize, f: usize) -> String {
    format!(r#"{{"type":"T{d}.{r}.{s}.{t}.{f}","value":{f},"units":"GRAM"}}"#)
}

pub fn test_config() -> CrawlConfig {
    CrawlConfig {
        base_url: BASE.to_string(),
        timeout: Duration::from_secs(2),
        poll_interval: Duration::from_millis(100),
        settle: Duration::from_millis(10),
        ..CrawlConfig::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Page {
    Landing,
    Browse,
    Dataset(usize),
    Record(usize, usize),
    Blank,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Browse,
    DatasetLink(usize),
    Body,
    Marker,
    Pagination,
    DetailButton(usize),
    DetailLink(usize),
    Nav(Section),
    Tab(usize),
    Expander(usize),
    Payload,
    Close,
}

/// Handle into the fake DOM. It is only valid in the window it came from and until the
/// next click, selection or window switch.
#[derive(Debug, Clone)]
pub struct FakeElement {
    window: String,
    generation: u64,
    kind: Kind,
}

#[derive(Debug)]
struct Window {
    url: String,
    page: Page,
    page_size_set: bool,
    section: Option<Section>,
    tab: usize,
    modal: Option<usize>,
    close_hidden: u32,
    height: i64,
    growth_left: u32,
}

impl Window {
    fn new(url: &str, page: Page) -> Self {
        Self {
            url: url.to_string(),
            page,
            page_size_set: false,
            section: None,
            tab: 0,
            modal: None,
            close_hidden: 0,
            height: 1000,
            growth_left: 2,
        }
    }
}

#[derive(Debug)]
struct Session {
    windows: BTreeMap<String, Window>,
    active: Option<String>,
    next_handle: usize,
    generation: u64,
    events: Vec<String>,
    max_open: usize,
}

impl Session {
    fn active_window(&self) -> Result<(&String, &Window)> {
        let handle = self
            .active
            .as_ref()
            .ok_or_else(|| SpiderError::ElementNotResolvable("no active window".into()))?;
        let window = self
            .windows
            .get(handle)
            .ok_or_else(|| SpiderError::ElementNotResolvable(format!("window {handle} is gone")))?;
        Ok((handle, window))
    }

    fn active_window_mut(&mut self) -> Result<&mut Window> {
        let handle = self
            .active
            .clone()
            .ok_or_else(|| SpiderError::ElementNotResolvable("no active window".into()))?;
        self.windows
            .get_mut(&handle)
            .ok_or_else(|| SpiderError::ElementNotResolvable(format!("window {handle} is gone")))
    }

    fn check(&self, element: &FakeElement) -> Result<()> {
        if self.active.as_ref() != Some(&element.window) || self.generation != element.generation
        {
            return Err(SpiderError::ElementNotResolvable(format!(
                "stale element {:?}",
                element.kind
            )));
        }
        Ok(())
    }
}

/// Scripted stand-in for a browser session over [`FakeSite`].
pub struct FakeBrowser {
    site: FakeSite,
    selectors: Selectors,
    session: Mutex<Session>,
}

impl FakeBrowser {
    /// One window (`h1`) showing the landing page.
    pub fn new(site: FakeSite) -> Self {
        let mut windows = BTreeMap::new();
        windows.insert("h1".to_string(), Window::new(BASE, Page::Landing));
        Self {
            site,
            selectors: Selectors::default(),
            session: Mutex::new(Session {
                windows,
                active: Some("h1".to_string()),
                next_handle: 2,
                generation: 0,
                events: Vec::new(),
                max_open: 1,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap()
    }

    pub fn events(&self) -> Vec<String> {
        self.lock().events.clone()
    }

    pub fn open_windows(&self) -> Vec<String> {
        self.lock().windows.keys().cloned().collect()
    }

    pub fn active(&self) -> Option<String> {
        self.lock().active.clone()
    }

    pub fn max_open(&self) -> usize {
        self.lock().max_open
    }

    fn record(&self, d: usize, r: usize) -> &FakeRecord {
        &self.site.datasets[d].records[r]
    }

    fn tabs(&self, window: &Window, section: Section) -> &[FakeTab] {
        match window.page {
            Page::Record(d, r) => self
                .record(d, r)
                .section(section)
                .map(Vec::as_slice)
                .unwrap_or_default(),
            _ => &[],
        }
    }

    fn query(&self, window: &Window, locator: &Locator) -> Vec<Kind> {
        let s = &self.selectors;
        if window.page != Page::Blank && *locator == s.page_body {
            return vec![Kind::Body];
        }
        match window.page {
            Page::Landing if *locator == s.browse_link => vec![Kind::Browse],
            Page::Browse if *locator == s.dataset_links => {
                (0..self.site.datasets.len()).map(Kind::DatasetLink).collect()
            }
            Page::Dataset(d) if self.site.datasets[d].loads => {
                let total = self.site.datasets[d].records.len();
                if *locator == s.dataset_marker {
                    vec![Kind::Marker]
                } else if *locator == s.pagination {
                    vec![Kind::Pagination]
                } else if *locator == s.detail_buttons {
                    let shown = if window.page_size_set {
                        total
                    } else {
                        total.min(DEFAULT_PAGE_SIZE)
                    };
                    (0..shown).map(Kind::DetailButton).collect()
                } else {
                    Vec::new()
                }
            }
            Page::Record(d, r) => {
                for section in Section::ALL {
                    let selectors = s.section(section);
                    if *locator == selectors.nav {
                        return match self.record(d, r).section(section) {
                            Some(_) => vec![Kind::Nav(section)],
                            None => Vec::new(),
                        };
                    }
                    if window.section != Some(section) {
                        continue;
                    }
                    let tabs = self.tabs(window, section);
                    if *locator == selectors.tabs {
                        return (0..tabs.len()).map(Kind::Tab).collect();
                    }
                    if *locator == selectors.expanders {
                        let fields = tabs.get(window.tab).map_or(0, |t| t.payloads.len());
                        return (0..fields).map(Kind::Expander).collect();
                    }
                }
                match window.modal {
                    Some(_) if *locator == s.payload => vec![Kind::Payload],
                    Some(_) if *locator == s.modal_close && !self.site.modal_close_missing => {
                        vec![Kind::Close]
                    }
                    _ => Vec::new(),
                }
            }
            _ => Vec::new(),
        }
    }

    fn elements(&self, session: &Session, kinds: Vec<Kind>) -> Result<Vec<FakeElement>> {
        let (handle, _) = session.active_window()?;
        Ok(kinds
            .into_iter()
            .map(|kind| FakeElement {
                window: handle.clone(),
                generation: session.generation,
                kind,
            })
            .collect())
    }
}

impl Surface for FakeBrowser {
    type Element = FakeElement;

    async fn find_all(&self, locator: &Locator) -> Result<Vec<FakeElement>> {
        let mut session = self.lock();
        if *locator == self.selectors.modal_close {
            let window = session.active_window_mut()?;
            if window.close_hidden > 0 {
                window.close_hidden -= 1;
                return Ok(Vec::new());
            }
        }
        let (_, window) = session.active_window()?;
        let kinds = self.query(window, locator);
        self.elements(&session, kinds)
    }

    async fn find_all_within(
        &self,
        parent: &FakeElement,
        locator: &Locator,
    ) -> Result<Vec<FakeElement>> {
        let session = self.lock();
        session.check(parent)?;
        let (_, window) = session.active_window()?;
        let kinds = match (parent.kind, window.page) {
            (Kind::DetailButton(r), Page::Dataset(d))
                if *locator == self.selectors.detail_link
                    && self.record(d, r).link == Link::Anchor =>
            {
                vec![Kind::DetailLink(r)]
            }
            _ => Vec::new(),
        };
        self.elements(&session, kinds)
    }

    async fn text(&self, element: &FakeElement) -> Result<String> {
        let session = self.lock();
        session.check(element)?;
        let (_, window) = session.active_window()?;
        let text = match (element.kind, window.section, window.modal) {
            (Kind::Tab(t), Some(section), _) if self.site.unreadable_tab == Some((section, t)) => {
                return Err(SpiderError::ElementNotResolvable(format!("label of tab {t}")));
            }
            (Kind::Tab(t), Some(section), _) => {
                format!("  {}\n", self.tabs(window, section)[t].label)
            }
            (Kind::Payload, Some(section), Some(field)) => {
                self.tabs(window, section)[window.tab].payloads[field].clone()
            }
            _ => String::new(),
        };
        Ok(text)
    }

    async fn attr(&self, element: &FakeElement, name: &str) -> Result<Option<String>> {
        let session = self.lock();
        session.check(element)?;
        let (_, window) = session.active_window()?;
        let value = match (element.kind, window.page, name) {
            (Kind::DatasetLink(d), _, "href") => {
                Some(format!("/dataset/{}", self.site.datasets[d].id))
            }
            (Kind::DetailLink(r), Page::Dataset(d), "href") => Some(format!("/id/ord-{d}-{r}")),
            (Kind::DetailButton(r), Page::Dataset(d), "onclick")
                if self.record(d, r).link == Link::OnClick =>
            {
                Some(format!("window.open('{}')", self.site.record_url(d, r)))
            }
            _ => None,
        };
        Ok(value)
    }

    async fn is_clickable(&self, element: &FakeElement) -> Result<bool> {
        self.lock().check(element)?;
        Ok(true)
    }

    async fn click(&self, element: &FakeElement) -> Result<()> {
        let close_delay = self.site.modal_close_delay;
        let mut session = self.lock();
        session.check(element)?;
        let window = session.active_window_mut()?;
        let mut event = None;
        match element.kind {
            Kind::Browse => {
                window.url = format!("{BASE}browse");
                window.page = Page::Browse;
            }
            Kind::Nav(section) => {
                window.section = Some(section);
                window.tab = 0;
                window.modal = None;
            }
            Kind::Tab(t) => {
                window.tab = t;
                window.modal = None;
                event = Some(format!("click tab {t}"));
            }
            Kind::Expander(f) => {
                window.modal = Some(f);
                window.close_hidden = close_delay;
            }
            Kind::Close => window.modal = None,
            _ => {}
        }
        session.events.extend(event);
        session.generation += 1;
        Ok(())
    }

    async fn scroll_into_view(&self, element: &FakeElement) -> Result<()> {
        self.lock().check(element)
    }

    async fn select_value(&self, select: &FakeElement, value: &str) -> Result<()> {
        let mut session = self.lock();
        session.check(select)?;
        if select.kind != Kind::Pagination || value != "100" {
            return Err(SpiderError::ElementNotResolvable(format!(
                "option {value} of {:?}",
                select.kind
            )));
        }
        session.active_window_mut()?.page_size_set = true;
        session.generation += 1;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        let session = self.lock();
        let (_, window) = session.active_window()?;
        Ok(window.url.clone())
    }

    async fn ready_state(&self) -> Result<String> {
        self.lock().active_window()?;
        Ok("complete".to_string())
    }

    async fn scroll_height(&self) -> Result<i64> {
        let session = self.lock();
        let (_, window) = session.active_window()?;
        Ok(window.height)
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        let endless = self.site.endless_scroll;
        let mut session = self.lock();
        let window = session.active_window_mut()?;
        if let Page::Dataset(_) = window.page {
            if endless {
                window.height += 100;
            } else if window.growth_left > 0 {
                window.growth_left -= 1;
                window.height += 500;
            }
        }
        Ok(())
    }

    async fn scroll_to_top(&self) -> Result<()> {
        self.lock().active_window()?;
        Ok(())
    }

    async fn open_context(&self, url: &str) -> Result<ContextHandle> {
        let page = self.site.page_for(url);
        let mut session = self.lock();
        let handle = format!("h{}", session.next_handle);
        session.next_handle += 1;
        session
            .windows
            .insert(handle.clone(), Window::new(url, page));
        session.events.push(format!("open {handle}"));
        session.max_open = session.max_open.max(session.windows.len());
        Ok(ContextHandle(handle))
    }

    async fn switch_to(&self, handle: &ContextHandle) -> Result<()> {
        let mut session = self.lock();
        let Some(window) = session.windows.get(&handle.0) else {
            return Err(SpiderError::ElementNotResolvable(format!("window {handle}")));
        };
        if self.site.record_switch_fails && matches!(window.page, Page::Record(..)) {
            return Err(SpiderError::ElementNotResolvable(format!(
                "window {handle} did not accept focus"
            )));
        }
        session.active = Some(handle.0.clone());
        session.generation += 1;
        session.events.push(format!("switch {handle}"));
        Ok(())
    }

    async fn close_current(&self) -> Result<()> {
        if self.site.window_close_fails {
            return Err(SpiderError::Io(std::io::Error::other("close refused")));
        }
        let mut session = self.lock();
        let handle = session
            .active
            .take()
            .ok_or_else(|| SpiderError::ElementNotResolvable("no active window".into()))?;
        session.windows.remove(&handle);
        session.events.push(format!("close {handle}"));
        Ok(())
    }

    async fn current_context(&self) -> Result<ContextHandle> {
        self.lock()
            .active
            .clone()
            .map(ContextHandle)
            .ok_or_else(|| SpiderError::ElementNotResolvable("no active window".into()))
    }
}
