// src/extract.rs
//! Field extraction from a modal's `<pre>` payload.
//!
//! The payload is serialized protobuf/JSON text that is often pretty-printed, truncated or
//! mixed with text-format lines, so this is a small tolerant scanner rather than a parser:
//!
//! 1. payload mentions `identifiers`: every quoted `"value":` becomes an `identifier` row,
//!    numbered 1..k in order of appearance;
//! 2. otherwise the first `"type":` (quoted only) and the first `"value":` (quoted, or a bare
//!    token cut at the first `,`, `}` or whitespace) become one row each;
//! 3. in both cases an unquoted `reaction_role: X` adds one `reaction_role` row.
//!
//! A field that does not match is logged and skipped; it never stops the other fields.

use log::{debug, warn};

use crate::error::{Result, SpiderError};
use crate::model::{DataType, ExtractedRow, Section};

const IDENTIFIERS_MARKER: &str = "identifiers";
const VALUE_KEY: &str = "\"value\":";
const TYPE_KEY: &str = "\"type\":";
const ROLE_KEY: &str = "reaction_role:";

/// A row before the caller has stamped it with dataset, section and tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDraft {
    pub data_type: DataType,
    pub value: String,
    pub index: u32,
}

impl FieldDraft {
    fn single(data_type: DataType, value: impl Into<String>) -> Self {
        Self {
            data_type,
            value: value.into(),
            index: 1,
        }
    }

    pub fn into_row(self, dataset_id: &str, section: Section, tab: &str) -> ExtractedRow {
        ExtractedRow {
            dataset_id: dataset_id.to_string(),
            section,
            tab: tab.to_string(),
            data_type: self.data_type,
            value: self.value,
            index: self.index,
        }
    }
}

enum Scalar<'a> {
    Quoted(&'a str),
    Bare(&'a str),
}

/// Extracts every recognizable field from one payload.
pub fn extract_fields(payload: &str) -> Vec<FieldDraft> {
    let mut fields = if payload.contains(IDENTIFIERS_MARKER) {
        identifier_fields(payload)
    } else {
        type_value_fields(payload)
    };

    match reaction_role(payload) {
        Some(Ok(role)) => fields.push(FieldDraft::single(DataType::ReactionRole, role)),
        Some(Err(e)) => warn!("Could not extract reaction_role: {e}"),
        None => {}
    }

    if let Some(e) = mismatch(&fields) {
        warn!("{e}");
    }

    for field in &fields {
        debug!("    {} {}: {}", field.data_type, field.index, field.value);
    }
    fields
}

/// A payload is a mismatch only when nothing at all came out of it.
fn mismatch(fields: &[FieldDraft]) -> Option<SpiderError> {
    fields.is_empty().then(|| {
        SpiderError::ExtractionMismatch("no identifier, type, value or reaction_role field".into())
    })
}

fn identifier_fields(payload: &str) -> Vec<FieldDraft> {
    let mut values = Vec::new();
    let mut from = 0;
    while let Some(found) = payload[from..].find(VALUE_KEY) {
        let start = from + found + VALUE_KEY.len();
        match scalar_after(&payload[start..]) {
            Ok(Scalar::Quoted(value)) => values.push(value),
            Ok(Scalar::Bare(_)) => debug!("Skipping unquoted identifier value"),
            Err(e) => warn!("Could not extract identifier value: {e}"),
        }
        from = start;
    }

    values
        .into_iter()
        .zip(1..)
        .map(|(value, index)| FieldDraft {
            data_type: DataType::Identifier,
            value: value.to_string(),
            index,
        })
        .collect()
}

fn type_value_fields(payload: &str) -> Vec<FieldDraft> {
    let mut fields = Vec::new();

    if let Some(after) = after_key(payload, TYPE_KEY) {
        match scalar_after(after) {
            Ok(Scalar::Quoted(kind)) => fields.push(FieldDraft::single(DataType::Type, kind)),
            Ok(Scalar::Bare(_)) => debug!("Skipping unquoted type"),
            Err(e) => warn!("Could not extract type: {e}"),
        }
    }

    if let Some(after) = after_key(payload, VALUE_KEY) {
        let value = scalar_after(after).and_then(|scalar| match scalar {
            Scalar::Quoted(value) => Ok(value),
            Scalar::Bare(text) => bare_token(text),
        });
        match value {
            Ok(value) => fields.push(FieldDraft::single(DataType::Value, value)),
            Err(e) => warn!("Could not extract value: {e}"),
        }
    }

    fields
}

fn reaction_role(payload: &str) -> Option<Result<String>> {
    let after = after_key(payload, ROLE_KEY)?;
    Some(
        after
            .split_whitespace()
            .next()
            .map(str::to_string)
            .ok_or_else(|| SpiderError::ExtractionMismatch("empty reaction_role".into())),
    )
}

/// Text following the first occurrence of `key`.
fn after_key<'a>(payload: &'a str, key: &str) -> Option<&'a str> {
    payload.find(key).map(|at| &payload[at + key.len()..])
}

fn scalar_after(text: &str) -> Result<Scalar<'_>> {
    let text = text.trim_start();
    match text.strip_prefix('"') {
        Some(rest) => rest
            .find('"')
            .map(|end| Scalar::Quoted(&rest[..end]))
            .ok_or_else(|| SpiderError::ExtractionMismatch("unterminated quoted string".into())),
        None => Ok(Scalar::Bare(text)),
    }
}

/// Bare numbers and enum names: up to the first `,`, `}` or whitespace.
fn bare_token(text: &str) -> Result<&str> {
    let end = text
        .find(|c: char| c == ',' || c == '}' || c.is_whitespace())
        .unwrap_or(text.len());
    match &text[..end] {
        "" => Err(SpiderError::ExtractionMismatch("empty bare value".into())),
        token => Ok(token),
    }
}
