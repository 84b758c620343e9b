// src/selectors.rs
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::model::Section;
use crate::surface::Locator;

/// Sub-section that holds the product tabs on the outcomes view.
const PRODUCTS: &str = "//div[@class='title' and contains(text(), 'Products')]\
                        /following-sibling::div[@class='sub-section']";

static ORD_SELECTORS: Lazy<Selectors> = Lazy::new(|| Selectors {
    browse_link: Locator::xpath("//a[normalize-space()='Browse']"),
    dataset_links: Locator::xpath("//a[contains(@href, 'ord_dataset-')]"),
    page_body: Locator::Tag("body".to_string()),
    dataset_marker: Locator::xpath(
        "//*[contains(text(), 'ord_dataset-') or contains(@class, 'dataset')]",
    ),
    pagination: Locator::xpath("//select[@name='pagination']"),
    detail_buttons: Locator::xpath(
        "//button[contains(@data-v, '') and text()='View Full Details']",
    ),
    detail_link: Locator::xpath("./ancestor::a"),
    payload: Locator::xpath("//pre"),
    modal_close: Locator::xpath("//div[@class='close']"),
    inputs: SectionSelectors {
        nav: Locator::xpath("//div[@class='nav-item' and contains(text(), 'inputs')]"),
        tabs: Locator::xpath(
            "//div[@id='inputs']//div[@class='tabs']//div[contains(@class, 'tab')]",
        ),
        expanders: Locator::xpath(
            "//div[@class='input']//div[@class='button' and contains(text(), '<>')]",
        ),
    },
    outcomes: SectionSelectors {
        nav: Locator::xpath("//div[@class='nav-item' and contains(text(), 'outcomes')]"),
        tabs: Locator::xpath(format!(
            "{PRODUCTS}//div[@class='tabs']//div[contains(@class, 'tab')]"
        )),
        expanders: Locator::xpath(format!(
            "{PRODUCTS}//div[@class='button' and contains(text(), '<>')]"
        )),
    },
});

/// Structural queries for every level of the walk. Defaults target
/// open-reaction-database.org; a JSON file can override any top-level key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Selectors {
    /// "Browse" entry in the top navigation of the landing page.
    pub browse_link: Locator,
    /// One link per dataset on the browse page; `href` is the dataset URL.
    pub dataset_links: Locator,
    pub page_body: Locator,
    /// Something that only renders once the dataset page has data.
    pub dataset_marker: Locator,
    pub pagination: Locator,
    pub detail_buttons: Locator,
    /// Relative to a detail button.
    pub detail_link: Locator,
    pub payload: Locator,
    pub modal_close: Locator,
    pub inputs: SectionSelectors,
    pub outcomes: SectionSelectors,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SectionSelectors {
    pub nav: Locator,
    pub tabs: Locator,
    pub expanders: Locator,
}

impl Default for Selectors {
    fn default() -> Self {
        ORD_SELECTORS.clone()
    }
}

impl Selectors {
    pub fn section(&self, section: Section) -> &SectionSelectors {
        match section {
            Section::Inputs => &self.inputs,
            Section::Outcomes => &self.outcomes,
        }
    }

    /// Loads overrides, e.g. `{"pagination": {"css": "select.page-size"}}`.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
