#![allow(dead_code)]

use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::Workbook;
use std::path::Path;

/// Writes an `.xlsx` with the given sheets. Cells that parse as numbers are stored as
/// numbers, the way Excel stores typed-in digits; empty strings are left unwritten.
pub fn write_fixture(path: &Path, sheets: &[(&str, &[&[&str]])]) {
    let mut workbook = Workbook::new();
    for (name, rows) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name).expect("valid sheet name");
        for (row, cells) in rows.iter().enumerate() {
            for (col, value) in cells.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                match value.parse::<f64>() {
                    Ok(number) => worksheet
                        .write_number(row as u32, col as u16, number)
                        .expect("number written"),
                    Err(_) => worksheet
                        .write_string(row as u32, col as u16, *value)
                        .expect("string written"),
                };
            }
        }
    }
    workbook.save(path).expect("fixture saved");
}

pub fn sheet_names(path: &Path) -> Vec<String> {
    open_workbook_auto(path)
        .expect("workbook opens")
        .sheet_names()
        .to_vec()
}

/// Raw calamine values of a sheet, addressed from A1.
pub fn read_values(path: &Path, sheet: &str) -> Vec<Vec<Data>> {
    let mut workbook = open_workbook_auto(path).expect("workbook opens");
    let range = workbook.worksheet_range(sheet).expect("sheet exists");
    let Some((last_row, last_col)) = range.end() else {
        return Vec::new();
    };
    (0..=last_row)
        .map(|row| {
            (0..=last_col)
                .map(|col| range.get_value((row, col)).cloned().unwrap_or(Data::Empty))
                .collect()
        })
        .collect()
}

/// Sheet contents as display strings with trailing empty cells dropped.
pub fn read_text(path: &Path, sheet: &str) -> Vec<Vec<String>> {
    read_values(path, sheet)
        .into_iter()
        .map(|row| {
            let mut cells: Vec<String> = row.iter().map(ToString::to_string).collect();
            while cells.last().is_some_and(String::is_empty) {
                cells.pop();
            }
            cells
        })
        .collect()
}

/// Formula text (without `=`) at an A1-based `(row, col)`, if any.
pub fn read_formula(path: &Path, sheet: &str, row: u32, col: u32) -> Option<String> {
    let mut workbook = open_workbook_auto(path).expect("workbook opens");
    let formulas = workbook.worksheet_formula(sheet).expect("sheet exists");
    formulas
        .get_value((row, col))
        .filter(|formula| !formula.is_empty())
        .cloned()
}
