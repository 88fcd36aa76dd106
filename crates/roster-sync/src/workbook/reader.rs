use super::styles::{load_styles, SheetStyles};
use super::{Cell, CellValue, Sheet, Workbook, WorkbookError};
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

const DATE_FORMAT: &str = "yyyy-mm-dd";
const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Loads every sheet of an xlsx/xls/ods workbook into memory, with formulas. For
/// xlsx packages number formats and custom column widths come along too.
pub fn read_workbook<P: AsRef<Path>>(path: P) -> Result<Workbook, WorkbookError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(WorkbookError::Missing {
            path: path.to_path_buf(),
        });
    }

    let mut source = open_workbook_auto(path).map_err(|source| WorkbookError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut styles = sheet_styles(path);
    let names = source.sheet_names();
    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let range = source
            .worksheet_range(&name)
            .map_err(|source| WorkbookError::Sheet {
                path: path.to_path_buf(),
                sheet: name.clone(),
                source,
            })?;
        let formulas = source
            .worksheet_formula(&name)
            .map_err(|source| WorkbookError::Sheet {
                path: path.to_path_buf(),
                sheet: name.clone(),
                source,
            })?;

        let mut sheet = sheet_from_range(name, &range);
        apply_formulas(&mut sheet, &formulas);
        if let Some(sheet_styles) = styles.remove(&sheet.name) {
            apply_styles(&mut sheet, sheet_styles);
        }
        debug!(
            sheet = %sheet.name,
            rows = sheet.rows.len(),
            widths = sheet.column_widths.len(),
            "sheet loaded"
        );
        sheets.push(sheet);
    }

    if sheets.is_empty() {
        return Err(WorkbookError::Empty {
            path: path.to_path_buf(),
        });
    }

    info!(path = %path.display(), sheets = sheets.len(), "workbook loaded");
    Ok(Workbook { sheets })
}

// calamine ranges start at the first used cell; positions are rebased to A1.
fn sheet_from_range(name: String, range: &Range<Data>) -> Sheet {
    let mut sheet = Sheet::new(name);
    let Some((row_offset, col_offset)) = range.start() else {
        return sheet;
    };

    for (row_idx, cells) in range.rows().enumerate() {
        for (col_idx, data) in cells.iter().enumerate() {
            let cell = convert_cell(data);
            if cell.value.is_empty() && cell.number_format.is_none() {
                continue;
            }
            sheet.set_cell(
                row_offset as usize + row_idx,
                col_offset as usize + col_idx,
                cell,
            );
        }
    }

    sheet
}

fn sheet_styles(path: &Path) -> HashMap<String, SheetStyles> {
    let is_xlsx = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext.to_ascii_lowercase().as_str(), "xlsx" | "xlsm"));
    if !is_xlsx {
        return HashMap::new();
    }
    load_styles(path).unwrap_or_else(|err| {
        warn!(path = %path.display(), error = %err, "number formats and widths unavailable");
        HashMap::new()
    })
}

fn apply_formulas(sheet: &mut Sheet, formulas: &Range<String>) {
    let Some((row_offset, col_offset)) = formulas.start() else {
        return;
    };
    for (row, col, text) in formulas.used_cells() {
        let row = row_offset as usize + row;
        let col = col_offset as usize + col;
        match sheet.cell_mut(row, col) {
            Some(cell) => cell.formula = Some(text.clone()),
            None => sheet.set_cell(
                row,
                col,
                Cell {
                    formula: Some(text.clone()),
                    ..Cell::default()
                },
            ),
        }
    }
}

// Formats land on cells already in the grid; styled cells past the data are ignored.
fn apply_styles(sheet: &mut Sheet, styles: SheetStyles) {
    for ((row, col), format) in styles.number_formats {
        if let Some(cell) = sheet.cell_mut(row, col) {
            cell.number_format = Some(format);
        }
    }
    sheet.column_widths = styles.column_widths;
}

fn convert_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::default(),
        Data::String(text) => Cell::new(text.as_str()),
        Data::Int(value) => Cell::new(*value as f64),
        Data::Float(value) => Cell::new(*value),
        Data::Bool(value) => Cell {
            value: CellValue::Bool(*value),
            ..Cell::default()
        },
        Data::DateTime(value) => {
            let serial = value.as_f64();
            let format = if serial.fract() == 0.0 {
                DATE_FORMAT
            } else {
                DATETIME_FORMAT
            };
            Cell {
                value: CellValue::DateTime(serial),
                number_format: Some(format.to_string()),
                formula: None,
            }
        }
        Data::DateTimeIso(text) | Data::DurationIso(text) => Cell::new(text.as_str()),
        Data::Error(err) => Cell::new(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_scalar_cells() {
        assert_eq!(convert_cell(&Data::Int(7)).value, CellValue::Number(7.0));
        assert_eq!(
            convert_cell(&Data::String("Reg No".to_string())).value,
            CellValue::Text("Reg No".to_string())
        );
        assert_eq!(
            convert_cell(&Data::String(String::new())).value,
            CellValue::Empty
        );
        assert!(convert_cell(&Data::Float(1.5)).number_format.is_none());
    }

    #[test]
    fn rebases_range_to_origin() {
        let mut range = Range::new((2, 1), (2, 2));
        range.set_value((2, 1), Data::String("Name".to_string()));
        range.set_value((2, 2), Data::Float(42.0));

        let sheet = sheet_from_range("Data".to_string(), &range);
        assert_eq!(sheet.rows.len(), 3);
        assert_eq!(sheet.cell(2, 1).map(Cell::text).as_deref(), Some("Name"));
        assert_eq!(sheet.cell(2, 2).map(Cell::text).as_deref(), Some("42"));
        assert!(sheet.rows[0].is_empty());
    }

    #[test]
    fn formulas_attach_to_cached_values() {
        let mut range = Range::new((1, 0), (1, 1));
        range.set_value((1, 0), Data::String("A".to_string()));
        range.set_value((1, 1), Data::Float(2.0));
        let mut sheet = sheet_from_range("Data".to_string(), &range);

        let mut formulas = Range::new((1, 1), (1, 2));
        formulas.set_value((1, 1), "1+1".to_string());
        formulas.set_value((1, 2), "B2*2".to_string());
        apply_formulas(&mut sheet, &formulas);

        let cached = sheet.cell(1, 1).expect("formula cell");
        assert_eq!(cached.formula.as_deref(), Some("1+1"));
        assert_eq!(cached.value, CellValue::Number(2.0));
        let uncached = sheet.cell(1, 2).expect("formula-only cell");
        assert_eq!(uncached.formula.as_deref(), Some("B2*2"));
        assert_eq!(uncached.value, CellValue::Empty);
        assert!(sheet.cell(1, 0).and_then(|cell| cell.formula.as_ref()).is_none());
    }

    #[test]
    fn styles_override_formats_and_set_widths() {
        let mut sheet = Sheet::new("Template");
        sheet.set_cell(1, 0, Cell::new(0.5));
        sheet.set_cell(1, 1, Cell::new(45000.0).with_format("yyyy-mm-dd"));
        let mut styles = SheetStyles::default();
        styles.number_formats.insert((1, 0), "0.00%".to_string());
        styles.number_formats.insert((1, 1), "dd/mm/yyyy".to_string());
        styles.number_formats.insert((9, 9), "@".to_string());
        styles.column_widths.insert(0, 30.0);

        apply_styles(&mut sheet, styles);

        assert_eq!(sheet.cell(1, 0).and_then(|c| c.number_format.as_deref()), Some("0.00%"));
        assert_eq!(sheet.cell(1, 1).and_then(|c| c.number_format.as_deref()), Some("dd/mm/yyyy"));
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.column_widths.get(&0), Some(&30.0));
    }

    #[test]
    fn missing_path_fails_before_open() {
        let error = read_workbook("./does-not-exist.xlsx").expect_err("expected missing file");
        assert!(matches!(error, WorkbookError::Missing { .. }));
    }
}
