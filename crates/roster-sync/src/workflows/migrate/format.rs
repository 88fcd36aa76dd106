use crate::workbook::{Sheet, StyleSnapshot, GENERAL_FORMAT};
use crate::workflows::headers::HeaderRow;

/// Display format per template header: taken from the first non-empty cell within
/// `scan_rows` rows below the header, `General` when that cell is unstyled or none exists.
pub fn infer_column_formats(template: &Sheet, header_row: &HeaderRow, scan_rows: usize) -> Vec<String> {
    let first = header_row.row + 1;
    let last = (header_row.row + scan_rows).min(template.rows.len().saturating_sub(1));

    header_row
        .headers
        .iter()
        .map(|header| {
            (first..=last)
                .filter_map(|row| template.cell(row, header.column))
                .find(|cell| !cell.value.is_empty())
                .and_then(|cell| cell.number_format.clone())
                .unwrap_or_else(|| GENERAL_FORMAT.to_string())
        })
        .collect()
}

/// Header presentation replayed on the generated sheet.
pub fn snapshot_header_styles(
    template: &Sheet,
    header_row: &HeaderRow,
    default_width: f64,
) -> Vec<StyleSnapshot> {
    header_row
        .headers
        .iter()
        .map(|header| StyleSnapshot {
            number_format: template
                .cell(header_row.row, header.column)
                .and_then(|cell| cell.number_format.clone()),
            width: template
                .column_widths
                .get(&header.column)
                .copied()
                .unwrap_or(default_width),
        })
        .collect()
}
