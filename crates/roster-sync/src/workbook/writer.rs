use super::{Cell, CellValue, Sheet, Workbook, WorkbookError, GENERAL_FORMAT};
use rust_xlsxwriter::{Format, Formula, Workbook as XlsxWorkbook, Worksheet, XlsxError};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

const FALLBACK_DATE_FORMAT: &str = "yyyy-mm-dd";

/// Serializes the whole snapshot to `path`, replacing any existing file.
pub fn write_workbook<P: AsRef<Path>>(workbook: &Workbook, path: P) -> Result<(), WorkbookError> {
    let path = path.as_ref();
    let to_error = |source| WorkbookError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut output = XlsxWorkbook::new();
    for sheet in &workbook.sheets {
        let worksheet = output.add_worksheet();
        write_sheet(worksheet, sheet).map_err(to_error)?;
    }
    output.save(path).map_err(to_error)?;

    info!(path = %path.display(), sheets = workbook.sheets.len(), "workbook saved");
    Ok(())
}

fn write_sheet(worksheet: &mut Worksheet, sheet: &Sheet) -> Result<(), XlsxError> {
    worksheet.set_name(&sheet.name)?;

    let mut formats: HashMap<String, Format> = HashMap::new();
    for (row_idx, row) in sheet.rows.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            let format = cell_format(cell, &mut formats);
            write_cell(worksheet, row_idx as u32, col_idx as u16, cell, format)?;
        }
    }

    for (col, width) in &sheet.column_widths {
        worksheet.set_column_width(*col as u16, *width)?;
    }
    if sheet.frozen_rows > 0 {
        worksheet.set_freeze_panes(sheet.frozen_rows, 0)?;
    }
    if let Some(filter) = sheet.autofilter {
        worksheet.autofilter(
            filter.first_row,
            filter.first_col,
            filter.last_row,
            filter.last_col,
        )?;
    }

    Ok(())
}

fn cell_format<'a>(cell: &Cell, cache: &'a mut HashMap<String, Format>) -> Option<&'a Format> {
    let pattern = match (&cell.number_format, &cell.value) {
        (Some(pattern), _) if pattern != GENERAL_FORMAT => pattern.as_str(),
        (None, CellValue::DateTime(_)) => FALLBACK_DATE_FORMAT,
        _ => return None,
    };

    Some(
        cache
            .entry(pattern.to_string())
            .or_insert_with(|| Format::new().set_num_format(pattern)),
    )
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &Cell,
    format: Option<&Format>,
) -> Result<(), XlsxError> {
    if let Some(formula) = &cell.formula {
        let formula = Formula::new(formula).set_result(cell.value.to_string());
        match format {
            Some(format) => worksheet.write_formula_with_format(row, col, formula, format)?,
            None => worksheet.write_formula(row, col, formula)?,
        };
        return Ok(());
    }

    match (&cell.value, format) {
        (CellValue::Empty, None) => {}
        (CellValue::Empty, Some(format)) => {
            worksheet.write_blank(row, col, format)?;
        }
        (CellValue::Text(text), None) => {
            worksheet.write_string(row, col, text)?;
        }
        (CellValue::Text(text), Some(format)) => {
            worksheet.write_string_with_format(row, col, text, format)?;
        }
        (CellValue::Number(value) | CellValue::DateTime(value), None) => {
            worksheet.write_number(row, col, *value)?;
        }
        (CellValue::Number(value) | CellValue::DateTime(value), Some(format)) => {
            worksheet.write_number_with_format(row, col, *value, format)?;
        }
        (CellValue::Bool(value), None) => {
            worksheet.write_boolean(row, col, *value)?;
        }
        (CellValue::Bool(value), Some(format)) => {
            worksheet.write_boolean_with_format(row, col, *value, format)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn general_format_is_not_materialized() {
        let mut cache = HashMap::new();
        let plain = Cell::new("x").with_format(GENERAL_FORMAT);
        assert!(cell_format(&plain, &mut cache).is_none());

        let dated = Cell {
            value: CellValue::DateTime(45000.0),
            ..Cell::default()
        };
        assert!(cell_format(&dated, &mut cache).is_some());

        let percent = Cell::new(0.5).with_format("0.00%");
        assert!(cell_format(&percent, &mut cache).is_some());
        assert_eq!(cache.len(), 2);
    }
}
