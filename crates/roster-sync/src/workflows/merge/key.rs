use crate::workbook::CellValue;

/// Join key for a registration cell. Numbers drop their fractional part so `1024.0`
/// and `"1024"` meet; text is trimmed. Blank cells have no key.
pub fn join_key(value: &CellValue) -> Option<String> {
    match value {
        CellValue::Empty => None,
        CellValue::Number(number) | CellValue::DateTime(number) => {
            Some((number.trunc() as i64).to_string())
        }
        CellValue::Bool(flag) => Some(u8::from(*flag).to_string()),
        CellValue::Text(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
    }
}
