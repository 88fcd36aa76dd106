//! Header discovery and matching shared by the migration, merge and report pipelines.

mod normalizer;
mod synonyms;

pub use normalizer::normalize_header;
pub use synonyms::{AliasSet, SynonymTable};

use crate::workbook::Sheet;
use serde::Serialize;
use std::collections::HashMap;

/// One populated header cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    /// Zero-based column in the sheet.
    pub column: usize,
    pub text: String,
    pub key: String,
}

impl Header {
    pub fn new(column: usize, text: impl Into<String>) -> Self {
        let text = text.into();
        let key = normalize_header(&text);
        Self { column, text, key }
    }
}

/// Header cells of a sheet together with the row they were found on.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct HeaderRow {
    /// Zero-based row index of the header.
    pub row: usize,
    pub headers: Vec<Header>,
}

impl HeaderRow {
    /// Locates the header row within the first `max_search_rows` rows and keeps its
    /// non-blank cells, trimmed.
    pub fn detect(sheet: &Sheet, max_search_rows: usize) -> Self {
        let row = find_header_row(sheet, max_search_rows);
        let headers = sheet
            .rows
            .get(row)
            .map(|cells| {
                cells
                    .iter()
                    .enumerate()
                    .filter(|(_, cell)| !cell.value.is_blank())
                    .map(|(column, cell)| Header::new(column, cell.text().trim()))
                    .collect()
            })
            .unwrap_or_default();

        Self { row, headers }
    }

    pub fn texts(&self) -> Vec<String> {
        self.headers.iter().map(|header| header.text.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Normalized key -> column of its first occurrence; later duplicates and empty
    /// keys are ignored.
    pub fn key_lookup(&self) -> HashMap<&str, usize> {
        let mut lookup = HashMap::with_capacity(self.headers.len());
        for header in &self.headers {
            if header.key.is_empty() {
                continue;
            }
            lookup.entry(header.key.as_str()).or_insert(header.column);
        }
        lookup
    }

    /// First column (in scan order) whose key belongs to `aliases`.
    pub fn find(&self, aliases: &AliasSet) -> Option<usize> {
        self.headers
            .iter()
            .find(|header| aliases.matches(&header.key))
            .map(|header| header.column)
    }

    pub fn require(&self, aliases: &AliasSet) -> Result<usize, MissingColumnError> {
        self.find(aliases).ok_or_else(|| MissingColumnError {
            column: aliases.label.to_string(),
            headers: self.texts(),
        })
    }
}

/// First row holding any non-blank cell, searched within a bounded window. Falls back
/// to the first row.
pub fn find_header_row(sheet: &Sheet, max_search_rows: usize) -> usize {
    sheet
        .rows
        .iter()
        .take(max_search_rows)
        .position(|cells| !crate::workbook::is_blank_row(cells))
        .unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing expected column for {column}. Headers: {headers:?}")]
pub struct MissingColumnError {
    pub column: String,
    pub headers: Vec<String>,
}
