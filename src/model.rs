// src/model.rs
use serde::Serialize;
use std::fmt;

use crate::links::dataset_id_from_url;

/// One dataset listed on the browse page. Captured once, before any navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: String,
    pub url: String,
}

impl CatalogEntry {
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        let id = dataset_id_from_url(&url);
        Self { id, url }
    }
}

/// The two field groups of a reaction record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Section {
    Inputs,
    Outcomes,
}

impl Section {
    pub const ALL: [Section; 2] = [Section::Inputs, Section::Outcomes];

    /// The section visited after this one, if any.
    pub fn next(self) -> Option<Section> {
        match self {
            Section::Inputs => Some(Section::Outcomes),
            Section::Outcomes => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Section::Inputs => "Inputs",
            Section::Outcomes => "Outcomes",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Identifier,
    Type,
    Value,
    ReactionRole,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Identifier => "identifier",
            DataType::Type => "type",
            DataType::Value => "value",
            DataType::ReactionRole => "reaction_role",
        };
        f.write_str(name)
    }
}

/// One CSV line. Field order is the column order of the output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedRow {
    pub dataset_id: String,
    pub section: Section,
    pub tab: String,
    pub data_type: DataType,
    pub value: String,
    pub index: u32,
}

/// Opaque id of a browser window/tab.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContextHandle(pub String);

impl fmt::Display for ContextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
