use super::key::join_key;
use crate::workbook::{is_blank_row, Cell, CellValue, Row};
use serde::Serialize;
use std::collections::HashMap;

/// Registration key -> profile link, built once from the links workbook.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinMap {
    entries: HashMap<String, String>,
}

impl JoinMap {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for JoinMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

/// Collects `key_col -> value_col` over data rows. Rows without a key or with a blank
/// value are ignored; a later row with the same key replaces an earlier one.
pub fn build_join_map(rows: &[Row], key_col: usize, value_col: usize) -> JoinMap {
    let mut entries = HashMap::new();
    for row in rows {
        let Some(key) = row.get(key_col).and_then(|cell| join_key(&cell.value)) else {
            continue;
        };
        let value = row
            .get(value_col)
            .map(|cell| cell.text().trim().to_string())
            .unwrap_or_default();
        if value.is_empty() {
            continue;
        }
        entries.insert(key, value);
    }
    JoinMap { entries }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingKey,
    NoMatch,
}

/// A data row the merge could not join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRow {
    /// Position of the row within the slice handed to [`apply_merge`].
    pub index: usize,
    pub key: Option<String>,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeTally {
    pub updated: usize,
    pub skipped: usize,
    /// Rows whose value already matched; neither updated nor skipped.
    pub unchanged: usize,
    pub skipped_rows: Vec<SkippedRow>,
}

/// Writes `join_map` values into `value_col`. A row counts as updated only when the
/// trimmed existing value differs; keyless and unmatched rows are skipped untouched.
/// Blank rows are passed over without being counted.
pub fn apply_merge(
    rows: &mut [Row],
    key_col: usize,
    value_col: usize,
    join_map: &JoinMap,
) -> MergeTally {
    let mut tally = MergeTally::default();

    for (index, row) in rows.iter_mut().enumerate() {
        if is_blank_row(row) {
            continue;
        }
        let key = row.get(key_col).and_then(|cell| join_key(&cell.value));
        let Some(key) = key else {
            tally.skip(index, None, SkipReason::MissingKey);
            continue;
        };
        let Some(link) = join_map.get(&key) else {
            tally.skip(index, Some(key), SkipReason::NoMatch);
            continue;
        };

        let existing = row.get(value_col).map(Cell::text).unwrap_or_default();
        if existing.trim() == link {
            tally.unchanged += 1;
            continue;
        }

        if row.len() <= value_col {
            row.resize_with(value_col + 1, Cell::default);
        }
        let cell = &mut row[value_col];
        cell.value = CellValue::Text(link.to_string());
        cell.formula = None;
        tally.updated += 1;
    }

    tally
}

impl MergeTally {
    fn skip(&mut self, index: usize, key: Option<String>, reason: SkipReason) {
        self.skipped += 1;
        self.skipped_rows.push(SkippedRow { index, key, reason });
    }
}
