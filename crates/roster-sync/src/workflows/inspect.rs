use crate::workbook::{read_workbook, Sheet, WorkbookError};
use crate::workflows::headers::find_header_row;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Header and leading data rows of one sheet, for eyeballing a workbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetPreview {
    pub sheet: String,
    /// 1-based row number of the header.
    pub header_row: usize,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkbookPreview {
    pub path: PathBuf,
    pub sheets: Vec<SheetPreview>,
}

pub fn preview_sheet(sheet: &Sheet, header_search_rows: usize, preview_rows: usize) -> SheetPreview {
    let header_idx = find_header_row(sheet, header_search_rows);
    let mut headers: Vec<String> = sheet
        .rows
        .get(header_idx)
        .map(|cells| cells.iter().map(|cell| cell.text().trim().to_string()).collect())
        .unwrap_or_default();
    while headers.last().is_some_and(String::is_empty) {
        headers.pop();
    }

    let rows = sheet
        .rows
        .iter()
        .skip(header_idx + 1)
        .take(preview_rows)
        .map(|cells| {
            let width = if headers.is_empty() {
                cells.len()
            } else {
                headers.len()
            };
            (0..width)
                .map(|col| cells.get(col).map(|cell| cell.text()).unwrap_or_default())
                .collect()
        })
        .collect();

    SheetPreview {
        sheet: sheet.name.clone(),
        header_row: header_idx + 1,
        headers,
        rows,
    }
}

/// Previews every sheet of the workbook at `path`. Read-only.
pub fn inspect_workbook(
    path: &Path,
    header_search_rows: usize,
    preview_rows: usize,
) -> Result<WorkbookPreview, WorkbookError> {
    let workbook = read_workbook(path)?;
    Ok(WorkbookPreview {
        path: path.to_path_buf(),
        sheets: workbook
            .sheets
            .iter()
            .map(|sheet| preview_sheet(sheet, header_search_rows, preview_rows))
            .collect(),
    })
}
