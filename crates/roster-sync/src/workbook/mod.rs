//! In-memory workbook snapshot shared by every pipeline.
//!
//! Workbooks are loaded whole with calamine, mutated as plain rows and cells,
//! then serialized again with rust_xlsxwriter once a pass has succeeded.

mod reader;
mod styles;
mod writer;

pub use reader::read_workbook;
pub use writer::write_workbook;

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Number format applied when a cell carries no explicit one.
pub const GENERAL_FORMAT: &str = "General";

/// Longest sheet name Excel accepts.
pub const MAX_SHEET_NAME_LEN: usize = 31;

const INVALID_SHEET_NAME_CHARS: [char; 7] = ['*', '?', ':', '[', ']', '\\', '/'];

#[derive(Debug, thiserror::Error)]
pub enum WorkbookError {
    #[error("workbook not found: {}", path.display())]
    Missing { path: PathBuf },
    #[error("failed to open workbook {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },
    #[error("failed to read sheet '{sheet}' in {}: {source}", path.display())]
    Sheet {
        path: PathBuf,
        sheet: String,
        #[source]
        source: calamine::Error,
    },
    #[error("failed to write workbook {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },
    #[error("workbook {} has no sheets", path.display())]
    Empty { path: PathBuf },
}

/// Owned cell value detached from the reader's representation.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Excel serial date/time.
    DateTime(f64),
}

impl CellValue {
    /// Empty after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    /// Empty without trimming; whitespace-only text still counts as content.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(text) => text.is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(text) => f.write_str(text),
            CellValue::Number(value) | CellValue::DateTime(value) => {
                if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
                    write!(f, "{}", *value as i64)
                } else {
                    write!(f, "{value}")
                }
            }
            CellValue::Bool(true) => f.write_str("TRUE"),
            CellValue::Bool(false) => f.write_str("FALSE"),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value.to_string())
        }
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value)
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    pub value: CellValue,
    /// Explicit number format; `None` means the cell is unstyled.
    pub number_format: Option<String>,
    /// Formula text without the leading `=`; `value` then holds the cached result.
    pub formula: Option<String>,
}

impl Cell {
    pub fn new(value: impl Into<CellValue>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.number_format = Some(format.into());
        self
    }

    pub fn text(&self) -> String {
        self.value.to_string()
    }
}

pub type Row = Vec<Cell>;

/// A row is blank when every cell is empty after trimming.
pub fn is_blank_row(row: &[Cell]) -> bool {
    row.iter().all(|cell| cell.value.is_blank())
}

/// Presentation settings captured from a template column and replayed on the target.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleSnapshot {
    pub number_format: Option<String>,
    pub width: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoFilter {
    pub first_row: u32,
    pub first_col: u16,
    pub last_row: u32,
    pub last_col: u16,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Row>,
    pub column_widths: BTreeMap<usize, f64>,
    pub frozen_rows: u32,
    pub autofilter: Option<AutoFilter>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|cells| cells.get(col))
    }

    /// Writes a cell, growing the grid as needed.
    pub fn set_cell(&mut self, row: usize, col: usize, cell: Cell) {
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.rows[row];
        if cells.len() <= col {
            cells.resize_with(col + 1, Cell::default);
        }
        cells[col] = cell;
    }

    pub fn cell_mut(&mut self, row: usize, col: usize) -> Option<&mut Cell> {
        self.rows.get_mut(row).and_then(|cells| cells.get_mut(col))
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|sheet| sheet.name.as_str()).collect()
    }

    /// Index of the sheet called `preferred`, falling back to the first sheet.
    pub fn preferred_sheet_index(&self, preferred: &str) -> Option<usize> {
        if self.sheets.is_empty() {
            return None;
        }
        Some(
            self.sheets
                .iter()
                .position(|sheet| sheet.name == preferred)
                .unwrap_or(0),
        )
    }

    /// True when a sheet already uses `name`. Excel compares sheet names without case.
    pub fn has_sheet_named(&self, name: &str) -> bool {
        let wanted = name.to_lowercase();
        self.sheets
            .iter()
            .any(|sheet| sheet.name.to_lowercase() == wanted)
    }

    /// First free name of the form `base`, `base_2`, `base_3`, ... The base is cleaned
    /// up with [`sheet_name_from`] and shortened so the suffix still fits.
    pub fn unique_sheet_name(&self, base: &str) -> String {
        let base = sheet_name_from(base);
        let mut candidate = base.clone();
        let mut suffix = 1;
        while self.has_sheet_named(&candidate) {
            suffix += 1;
            let tail = format!("_{suffix}");
            let head: String = base
                .chars()
                .take(MAX_SHEET_NAME_LEN - tail.chars().count())
                .collect();
            candidate = format!("{head}{tail}");
        }
        candidate
    }
}

/// Turns arbitrary text into a name Excel accepts: forbidden characters become `_`,
/// surrounding apostrophes are dropped and the result is cut to 31 characters.
pub fn sheet_name_from(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .trim_matches('\'')
        .chars()
        .map(|ch| {
            if INVALID_SHEET_NAME_CHARS.contains(&ch) {
                '_'
            } else {
                ch
            }
        })
        .take(MAX_SHEET_NAME_LEN)
        .collect();
    let cleaned = cleaned.trim_end_matches('\'').to_string();
    if cleaned.is_empty() {
        "Sheet".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_display_without_trailing_fraction() {
        assert_eq!(CellValue::Number(1024.0).to_string(), "1024");
        assert_eq!(CellValue::Number(2.5).to_string(), "2.5");
        assert_eq!(CellValue::Bool(true).to_string(), "TRUE");
        assert_eq!(CellValue::Empty.to_string(), "");
    }

    #[test]
    fn blank_row_ignores_whitespace_only_text() {
        let row = vec![Cell::new("  "), Cell::default(), Cell::new("\t")];
        assert!(is_blank_row(&row));
        assert!(!is_blank_row(&[Cell::new(0.0)]));
        assert!(is_blank_row(&[]));
    }

    #[test]
    fn unique_sheet_name_appends_numeric_suffix() {
        let workbook = Workbook {
            sheets: vec![Sheet::new("Students"), Sheet::new("Upload_Format")],
        };
        assert_eq!(workbook.unique_sheet_name("Upload_Format"), "Upload_Format_2");
        assert_eq!(workbook.unique_sheet_name("Fresh"), "Fresh");

        let crowded = Workbook {
            sheets: vec![Sheet::new("Upload_Format"), Sheet::new("Upload_Format_2")],
        };
        assert_eq!(crowded.unique_sheet_name("Upload_Format"), "Upload_Format_3");
    }

    #[test]
    fn unique_sheet_name_ignores_case() {
        let workbook = Workbook {
            sheets: vec![Sheet::new("Marquee"), Sheet::new("upload_format")],
        };
        assert!(workbook.has_sheet_named("UPLOAD_FORMAT"));
        assert_eq!(workbook.unique_sheet_name("Upload_Format"), "Upload_Format_2");
    }

    #[test]
    fn long_sheet_names_are_cut_to_fit_excel() {
        let long = "Placement Upload Format For Batch 2025";
        let first = Workbook::default().unique_sheet_name(long);
        assert_eq!(first, "Placement Upload Format For Bat");
        assert_eq!(first.chars().count(), MAX_SHEET_NAME_LEN);

        let workbook = Workbook {
            sheets: vec![Sheet::new(first.clone())],
        };
        let second = workbook.unique_sheet_name(long);
        assert_eq!(second, "Placement Upload Format For B_2");
        assert_eq!(second.chars().count(), MAX_SHEET_NAME_LEN);
    }

    #[test]
    fn sheet_names_lose_forbidden_characters() {
        assert_eq!(sheet_name_from("Upload/2025:[A]"), "Upload_2025__A_");
        assert_eq!(sheet_name_from("'quoted'"), "quoted");
        assert_eq!(sheet_name_from("  "), "Sheet");
    }

    #[test]
    fn preferred_sheet_falls_back_to_first() {
        let workbook = Workbook {
            sheets: vec![Sheet::new("Links"), Sheet::new("Students")],
        };
        assert_eq!(workbook.preferred_sheet_index("Students"), Some(1));
        assert_eq!(workbook.preferred_sheet_index("Roster"), Some(0));
        assert_eq!(Workbook::default().preferred_sheet_index("Students"), None);
    }

    #[test]
    fn set_cell_grows_ragged_rows() {
        let mut sheet = Sheet::new("Data");
        sheet.set_cell(2, 3, Cell::new("x"));
        assert_eq!(sheet.rows.len(), 3);
        assert_eq!(sheet.rows[2].len(), 4);
        assert_eq!(sheet.cell(2, 3).map(Cell::text).as_deref(), Some("x"));
        assert!(sheet.cell(1, 0).is_none());
    }
}
