use super::ReportError;
use crate::workbook::{is_blank_row, read_workbook, write_workbook, Cell, Row, Sheet, Workbook};
use std::path::{Path, PathBuf};
use tracing::info;

pub const SAMPLE_SHEET: &str = "Test Profiles";

/// A small fixture workbook cut from a real roster.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterSample {
    pub source_sheet: String,
    pub headers: Vec<String>,
    /// Data rows in source order, blanks excluded.
    pub rows: Vec<Row>,
}

impl RosterSample {
    pub fn into_workbook(self) -> Workbook {
        let mut sheet = Sheet::new(SAMPLE_SHEET);
        sheet.rows.push(
            self.headers
                .into_iter()
                .map(Cell::new)
                .collect(),
        );
        sheet.rows.extend(self.rows);
        Workbook {
            sheets: vec![sheet],
        }
    }
}

/// First non-blank row of `sheet` plus the next `limit` non-blank rows.
pub fn extract_sample(sheet: &Sheet, limit: usize) -> RosterSample {
    let mut populated = sheet.rows.iter().filter(|row| !is_blank_row(row));
    let headers = populated
        .next()
        .map(|row| row.iter().map(|cell| cell.text()).collect())
        .unwrap_or_default();
    let rows = populated.take(limit).cloned().collect();

    RosterSample {
        source_sheet: sheet.name.clone(),
        headers,
        rows,
    }
}

#[derive(Debug, Clone)]
pub struct SampleSummary {
    pub sample: RosterSample,
    pub output: PathBuf,
}

/// Writes a sample of the first sheet of `source` to a new workbook at `output`.
pub fn write_sample(source: &Path, output: &Path, limit: usize) -> Result<SampleSummary, ReportError> {
    let workbook = read_workbook(source)?;
    let sheet = workbook.sheets.first().ok_or_else(|| ReportError::NoSheets {
        path: source.to_path_buf(),
    })?;

    let sample = extract_sample(sheet, limit);
    write_workbook(&sample.clone().into_workbook(), output)?;
    info!(rows = sample.rows.len(), output = %output.display(), "sample workbook written");

    Ok(SampleSummary {
        sample,
        output: output.to_path_buf(),
    })
}
