// src/window.rs
use log::{debug, warn};

use crate::error::{Result, SpiderError};
use crate::model::ContextHandle;
use crate::surface::Surface;

/// The stack of browser windows opened by the crawl. The bottom frame is the catalog
/// window that was active when the crawl started.
///
/// Every [`ContextStack::push`] must be matched by one [`ContextStack::pop`] before the
/// enclosing loop moves to its next sibling.
#[derive(Debug)]
pub struct ContextStack {
    frames: Vec<ContextHandle>,
    /// Windows that were opened but could never be entered, so nothing closes them.
    leaked: Vec<ContextHandle>,
}

impl ContextStack {
    /// Roots the stack at whatever window is active right now.
    pub async fn rooted<S: Surface>(surface: &S) -> Result<Self> {
        let root = surface.current_context().await?;
        Ok(Self {
            frames: vec![root],
            leaked: Vec::new(),
        })
    }

    pub fn top(&self) -> &ContextHandle {
        &self.frames[self.frames.len() - 1]
    }

    pub fn leaked(&self) -> &[ContextHandle] {
        &self.leaked
    }

    /// Number of secondary windows currently open.
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    /// Opens `url` in a new window and makes it the active one.
    pub async fn push<S: Surface>(&mut self, surface: &S, url: &str) -> Result<ContextHandle> {
        let handle = surface.open_context(url).await?;
        if let Err(e) = surface.switch_to(&handle).await {
            warn!("Opened {url} as {handle} but could not switch to it, leaving it open: {e}");
            self.leaked.push(handle);
            return Err(e);
        }
        debug!("Context {} -> {handle} ({url})", self.top());
        self.frames.push(handle.clone());
        Ok(handle)
    }

    /// Closes the active window and returns to its parent. Any failure here is fatal.
    pub async fn pop<S: Surface>(&mut self, surface: &S) -> Result<()> {
        if self.frames.len() < 2 {
            return Err(SpiderError::ContextRestore(
                "no secondary window is open".to_string(),
            ));
        }
        let closing = self.frames.remove(self.frames.len() - 1);
        let parent = self.top().clone();

        surface
            .close_current()
            .await
            .map_err(|e| SpiderError::ContextRestore(format!("closing {closing}: {e}")))?;
        surface
            .switch_to(&parent)
            .await
            .map_err(|e| SpiderError::ContextRestore(format!("switching back to {parent}: {e}")))?;

        let active = surface
            .current_context()
            .await
            .map_err(|e| SpiderError::ContextRestore(format!("reading active window: {e}")))?;
        if active != parent {
            return Err(SpiderError::ContextRestore(format!(
                "active window is {active}, expected {parent}"
            )));
        }
        debug!("Context {closing} closed, back on {parent}");
        Ok(())
    }
}
