// src/spider.rs
use log::{debug, info};
use std::collections::HashSet;
use thirtyfour::components::SelectElement;
use thirtyfour::prelude::*;
use thirtyfour::{Capabilities, ChromiumLikeCapabilities, WindowHandle};

use crate::config::{Browser, SessionConfig};
use crate::error::{Result, SpiderError};
use crate::model::ContextHandle;
use crate::surface::{Locator, Surface};

/// A live WebDriver session pointed at the catalog site.
pub struct Spider {
    pub driver: WebDriver,
}

impl Spider {
    /// Connects to the WebDriver server, maximizes the window and loads `url`.
    pub async fn new(config: &SessionConfig, url: &str) -> Result<Self> {
        let caps: Capabilities = match config.browser {
            Browser::Firefox => {
                let mut caps = DesiredCapabilities::firefox();
                if config.headless {
                    caps.set_headless()?;
                }
                caps.into()
            }
            Browser::Chrome => {
                let mut caps = DesiredCapabilities::chrome();
                if config.headless {
                    caps.set_headless()?;
                    caps.set_no_sandbox()?;
                    caps.set_disable_gpu()?;
                    caps.set_disable_dev_shm_usage()?;
                }
                caps.into()
            }
        };

        info!(
            "Starting {:?} session via {} (headless: {})",
            config.browser, config.webdriver_url, config.headless
        );
        let driver = WebDriver::new(config.webdriver_url.as_str(), caps).await?;
        driver.maximize_window().await?;
        driver.goto(url).await?;

        Ok(Self { driver })
    }

    pub async fn quit(self) -> Result<()> {
        self.driver.quit().await?;
        Ok(())
    }

    async fn script(&self, script: &str, args: Vec<serde_json::Value>) -> Result<serde_json::Value> {
        let ret = self.driver.execute(script, args).await?;
        Ok(ret.json().clone())
    }

    async fn window_handles(&self) -> Result<HashSet<String>> {
        Ok(self
            .driver
            .windows()
            .await?
            .into_iter()
            .map(|handle| handle.to_string())
            .collect())
    }
}

fn by(locator: &Locator) -> By {
    match locator {
        Locator::XPath(x) => By::XPath(x.as_str()),
        Locator::Css(c) => By::Css(c.as_str()),
        Locator::Tag(t) => By::Tag(t.as_str()),
    }
}

impl Surface for Spider {
    type Element = WebElement;

    async fn find_all(&self, locator: &Locator) -> Result<Vec<WebElement>> {
        Ok(self.driver.find_all(by(locator)).await?)
    }

    async fn find_all_within(&self, parent: &WebElement, locator: &Locator) -> Result<Vec<WebElement>> {
        Ok(parent.find_all(by(locator)).await?)
    }

    async fn text(&self, element: &WebElement) -> Result<String> {
        Ok(element.text().await?)
    }

    async fn attr(&self, element: &WebElement, name: &str) -> Result<Option<String>> {
        Ok(element.attr(name).await?)
    }

    async fn is_clickable(&self, element: &WebElement) -> Result<bool> {
        Ok(element.is_clickable().await?)
    }

    // Sticky headers swallow native clicks on ORD pages.
    async fn click(&self, element: &WebElement) -> Result<()> {
        self.script("arguments[0].click();", vec![element.to_json()?])
            .await?;
        Ok(())
    }

    async fn scroll_into_view(&self, element: &WebElement) -> Result<()> {
        Ok(element.scroll_into_view().await?)
    }

    async fn select_value(&self, select: &WebElement, value: &str) -> Result<()> {
        let select = SelectElement::new(select).await?;
        select.select_by_value(value).await?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.driver.current_url().await?.to_string())
    }

    async fn ready_state(&self) -> Result<String> {
        let state = self.script("return document.readyState;", Vec::new()).await?;
        Ok(state.as_str().unwrap_or_default().to_string())
    }

    async fn scroll_height(&self) -> Result<i64> {
        let height = self
            .script("return document.body.scrollHeight;", Vec::new())
            .await?;
        Ok(height.as_i64().unwrap_or_default())
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        self.script("window.scrollTo(0, document.body.scrollHeight);", Vec::new())
            .await?;
        Ok(())
    }

    async fn scroll_to_top(&self) -> Result<()> {
        self.script("window.scrollTo(0, 0);", Vec::new()).await?;
        Ok(())
    }

    async fn open_context(&self, url: &str) -> Result<ContextHandle> {
        let before = self.window_handles().await?;
        self.script(
            "window.open(arguments[0], '_blank');",
            vec![serde_json::Value::String(url.to_string())],
        )
        .await?;
        let mut opened: Vec<String> = self
            .window_handles()
            .await?
            .into_iter()
            .filter(|handle| !before.contains(handle))
            .collect();
        match opened.pop() {
            Some(handle) if opened.is_empty() => {
                debug!("Opened window {handle} for {url}");
                Ok(ContextHandle(handle))
            }
            Some(_) => Err(SpiderError::ElementNotResolvable(format!(
                "new window for {url} (more than one appeared)"
            ))),
            None => Err(SpiderError::ElementNotResolvable(format!(
                "new window for {url}"
            ))),
        }
    }

    async fn switch_to(&self, handle: &ContextHandle) -> Result<()> {
        self.driver
            .switch_to_window(WindowHandle::from(handle.0.clone()))
            .await?;
        Ok(())
    }

    async fn close_current(&self) -> Result<()> {
        self.driver.close_window().await?;
        Ok(())
    }

    async fn current_context(&self) -> Result<ContextHandle> {
        Ok(ContextHandle(self.driver.window().await?.to_string()))
    }
}
