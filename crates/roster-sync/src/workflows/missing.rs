use super::ReportError;
use crate::workbook::{is_blank_row, read_workbook, Cell, Sheet};
use crate::workflows::headers::{AliasSet, HeaderRow, MissingColumnError};
use crate::workflows::platform::ProfilePlatform;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// A roster row with no profile link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingLink {
    pub row_number: usize,
    pub name: String,
    pub registration: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingLinkReport {
    pub sheet: String,
    pub platform: ProfilePlatform,
    /// Non-blank data rows examined.
    pub checked: usize,
    pub missing: Vec<MissingLink>,
}

impl MissingLinkReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for entry in &self.missing {
            csv_writer.serialize(entry)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

/// Lists rows whose link column is empty. Only the link column is required; name and
/// registration are reported when their columns exist.
pub fn find_missing_links(
    sheet: &Sheet,
    platform: ProfilePlatform,
    header_search_rows: usize,
) -> Result<MissingLinkReport, MissingColumnError> {
    let header = HeaderRow::detect(sheet, header_search_rows);
    let link_col = header.require(&platform.link_aliases())?;
    let name_col = header.find(&AliasSet::name());
    let reg_col = header.find(&AliasSet::registration_number());

    let mut checked = 0;
    let mut missing = Vec::new();
    for (offset, cells) in sheet.rows.iter().enumerate().skip(header.row + 1) {
        if is_blank_row(cells) {
            continue;
        }
        checked += 1;
        let has_link = cells
            .get(link_col)
            .is_some_and(|cell| !cell.value.is_empty());
        if !has_link {
            missing.push(MissingLink {
                row_number: offset + 1,
                name: text_at(cells, name_col),
                registration: text_at(cells, reg_col),
            });
        }
    }

    Ok(MissingLinkReport {
        sheet: sheet.name.clone(),
        platform,
        checked,
        missing,
    })
}

/// Loads the roster at `path` and reports on its preferred sheet (or the first one).
pub fn missing_links_in(
    path: &Path,
    platform: ProfilePlatform,
    preferred_sheet: &str,
    header_search_rows: usize,
) -> Result<MissingLinkReport, ReportError> {
    let workbook = read_workbook(path)?;
    let index = workbook
        .preferred_sheet_index(preferred_sheet)
        .ok_or_else(|| ReportError::NoSheets {
            path: path.to_path_buf(),
        })?;
    Ok(find_missing_links(
        &workbook.sheets[index],
        platform,
        header_search_rows,
    )?)
}

fn text_at(cells: &[Cell], col: Option<usize>) -> String {
    col.and_then(|col| cells.get(col))
        .map(Cell::text)
        .unwrap_or_default()
}
