// src/surface.rs
use serde::Deserialize;
use std::fmt;

use crate::error::{Result, SpiderError};
use crate::model::ContextHandle;

/// Structural query against the rendered document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locator {
    XPath(String),
    Css(String),
    Tag(String),
}

impl Locator {
    pub fn xpath(expr: impl Into<String>) -> Self {
        Locator::XPath(expr.into())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::XPath(x) => write!(f, "xpath `{x}`"),
            Locator::Css(c) => write!(f, "css `{c}`"),
            Locator::Tag(t) => write!(f, "<{t}>"),
        }
    }
}

/// Everything the crawler needs from a live browser session.
///
/// Element handles go stale after any navigation (tab click, page size change, window
/// switch). Callers re-resolve with [`Surface::find_nth`] right before each use instead of
/// holding on to handles.
///
/// Opening a context does not switch to it and closing one does not switch anywhere;
/// `ContextStack` owns the pairing.
#[allow(async_fn_in_trait)]
pub trait Surface {
    type Element: Clone;

    async fn find_all(&self, locator: &Locator) -> Result<Vec<Self::Element>>;
    async fn find_all_within(
        &self,
        parent: &Self::Element,
        locator: &Locator,
    ) -> Result<Vec<Self::Element>>;

    async fn text(&self, element: &Self::Element) -> Result<String>;
    async fn attr(&self, element: &Self::Element, name: &str) -> Result<Option<String>>;
    async fn is_clickable(&self, element: &Self::Element) -> Result<bool>;
    async fn click(&self, element: &Self::Element) -> Result<()>;
    async fn scroll_into_view(&self, element: &Self::Element) -> Result<()>;
    /// Picks the `<option>` with the given value in a `<select>`.
    async fn select_value(&self, select: &Self::Element, value: &str) -> Result<()>;

    async fn current_url(&self) -> Result<String>;
    async fn ready_state(&self) -> Result<String>;
    async fn scroll_height(&self) -> Result<i64>;
    async fn scroll_to_bottom(&self) -> Result<()>;
    async fn scroll_to_top(&self) -> Result<()>;

    async fn open_context(&self, url: &str) -> Result<ContextHandle>;
    async fn switch_to(&self, handle: &ContextHandle) -> Result<()>;
    async fn close_current(&self) -> Result<()>;
    async fn current_context(&self) -> Result<ContextHandle>;

    /// Re-queries `locator` and returns the element at `ordinal` in the fresh snapshot.
    async fn find_nth(&self, locator: &Locator, ordinal: usize) -> Result<Self::Element> {
        self.find_all(locator)
            .await?
            .into_iter()
            .nth(ordinal)
            .ok_or_else(|| SpiderError::ElementNotResolvable(format!("{locator} #{}", ordinal + 1)))
    }
}
