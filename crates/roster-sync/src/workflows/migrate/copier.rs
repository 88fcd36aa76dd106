use super::mapping::ColumnMapping;
use crate::workbook::{is_blank_row, Cell, Row, Sheet, GENERAL_FORMAT};

/// Copies non-blank `source_rows` into `target` starting at its second row, placing
/// values by `mapping` and stamping each column's display format. Returns the number
/// of rows written.
pub fn copy_rows(
    source_rows: &[Row],
    mapping: &ColumnMapping,
    formats: &[String],
    target: &mut Sheet,
) -> usize {
    let mut written = 0;

    for row in source_rows.iter().filter(|row| !is_blank_row(row)) {
        let target_row = 1 + written;
        for binding in mapping.bindings() {
            let value = binding
                .source_column
                .and_then(|column| row.get(column))
                .map(|cell| cell.value.clone())
                .unwrap_or_default();
            let format = formats
                .get(binding.position)
                .map(String::as_str)
                .unwrap_or(GENERAL_FORMAT);

            target.set_cell(
                target_row,
                binding.position,
                Cell {
                    value,
                    number_format: Some(format.to_string()),
                    formula: None,
                },
            );
        }
        written += 1;
    }

    written
}
