// src/wait.rs
use log::debug;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};

use crate::error::{Result, SpiderError};
use crate::surface::{Locator, Surface};

/// Polls a condition until it holds or the timeout runs out.
#[derive(Debug, Clone, Copy)]
pub struct Waiter {
    timeout: Duration,
    poll: Duration,
}

impl Waiter {
    pub fn new(timeout: Duration, poll: Duration) -> Self {
        Self { timeout, poll }
    }

    /// Runs `probe` until it yields `Some`. The probe always runs at least once; probe errors
    /// (stale handles, elements mid-render) count as "not yet", except fatal ones.
    pub async fn until<T, F, Fut>(&self, what: &str, mut probe: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>>>,
    {
        let deadline = Instant::now() + self.timeout;
        loop {
            match probe().await {
                Ok(Some(value)) => return Ok(value),
                Ok(None) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => debug!("Still waiting for {what}: {e}"),
            }
            if Instant::now() >= deadline {
                return Err(SpiderError::TimeoutExceeded {
                    what: what.to_string(),
                    timeout: self.timeout,
                });
            }
            sleep(self.poll).await;
        }
    }

    /// First element matching `locator`.
    pub async fn present<S: Surface>(&self, surface: &S, locator: &Locator) -> Result<S::Element> {
        self.until(&format!("presence of {locator}"), move || async move {
            let first = surface.find_all(locator).await?.into_iter().next();
            Ok::<_, SpiderError>(first)
        })
        .await
    }

    /// First element matching `locator` that is displayed and enabled.
    pub async fn clickable<S: Surface>(&self, surface: &S, locator: &Locator) -> Result<S::Element> {
        self.until(&format!("clickable {locator}"), move || async move {
            let ready = match surface.find_all(locator).await?.into_iter().next() {
                Some(element) => surface.is_clickable(&element).await?.then_some(element),
                None => None,
            };
            Ok::<_, SpiderError>(ready)
        })
        .await
    }

    /// Current URL once it contains `needle`.
    pub async fn url_contains<S: Surface>(&self, surface: &S, needle: &str) -> Result<String> {
        self.until(&format!("URL containing `{needle}`"), move || async move {
            let url = surface.current_url().await?;
            Ok::<_, SpiderError>(url.contains(needle).then_some(url))
        })
        .await
    }

    /// Current URL once it differs from `from`.
    pub async fn url_changed<S: Surface>(&self, surface: &S, from: &str) -> Result<String> {
        self.until(&format!("URL to change from `{from}`"), move || async move {
            let url = surface.current_url().await?;
            Ok::<_, SpiderError>((url != from).then_some(url))
        })
        .await
    }

    pub async fn document_ready<S: Surface>(&self, surface: &S) -> Result<()> {
        self.until("document ready state", move || async move {
            let state = surface.ready_state().await?;
            Ok::<_, SpiderError>((state == "complete").then_some(()))
        })
        .await
    }

    /// Scrolls to the bottom until the page height stops growing across one settle delay.
    /// Returns the final height.
    pub async fn scroll_stabilize<S: Surface>(&self, surface: &S, settle: Duration) -> Result<i64> {
        let deadline = Instant::now() + self.timeout;
        let mut last = surface.scroll_height().await?;
        loop {
            surface.scroll_to_bottom().await?;
            sleep(settle).await;
            let height = surface.scroll_height().await?;
            if height == last {
                return Ok(height);
            }
            if Instant::now() >= deadline {
                return Err(SpiderError::TimeoutExceeded {
                    what: "page height to settle".to_string(),
                    timeout: self.timeout,
                });
            }
            debug!("Page grew from {last} to {height}; scrolling again");
            last = height;
        }
    }
}
