//! Number formats and column widths read straight from the `.xlsx` package.
//!
//! calamine only hands back cell values, so the presentation a template carries
//! (`xl/styles.xml` number formats and `<col>` widths in each worksheet part) is
//! recovered here with a light pass over the OOXML parts.

use super::GENERAL_FORMAT;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader as XmlReader;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::result::ZipError;
use zip::ZipArchive;

// Excel stores column widths with font-metric padding included.
const CALIBRI_WIDTH_PADDING: f64 = 0.83203125;
const ALT_WIDTH_PADDING: f64 = 0.7109375;
const WIDTH_TOLERANCE: f64 = 0.0005;

#[derive(Debug, thiserror::Error)]
pub enum StyleError {
    #[error("not a readable xlsx package: {0}")]
    Zip(#[from] ZipError),
    #[error("failed to read {part}: {source}")]
    Io {
        part: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed XML in {part}: {source}")]
    Xml {
        part: String,
        #[source]
        source: quick_xml::Error,
    },
}

/// Presentation of one worksheet, keyed by zero-based positions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetStyles {
    /// Non-General number formats of styled cells.
    pub number_formats: HashMap<(usize, usize), String>,
    /// Custom column widths, in Excel character units without padding.
    pub column_widths: BTreeMap<usize, f64>,
}

/// Loads the styles of every worksheet in the package, keyed by sheet name.
pub fn load_styles(path: &Path) -> Result<HashMap<String, SheetStyles>, StyleError> {
    let mut archive = ZipArchive::new(File::open(path).map_err(|source| StyleError::Io {
        part: path.display().to_string(),
        source,
    })?)?;

    let Some(workbook_xml) = read_part(&mut archive, "xl/workbook.xml")? else {
        return Ok(HashMap::new());
    };
    let sheets = parse_sheet_ids(&workbook_xml)?;
    let targets = match read_part(&mut archive, "xl/_rels/workbook.xml.rels")? {
        Some(xml) => parse_relationships(&xml)?,
        None => HashMap::new(),
    };
    let cell_formats = match read_part(&mut archive, "xl/styles.xml")? {
        Some(xml) => parse_cell_formats(&xml)?,
        None => Vec::new(),
    };

    let mut styles = HashMap::with_capacity(sheets.len());
    for (name, rel_id) in sheets {
        let Some(target) = targets.get(&rel_id) else {
            continue;
        };
        let part = part_path(target);
        if let Some(xml) = read_part(&mut archive, &part)? {
            styles.insert(name, parse_worksheet(&xml, &part, &cell_formats)?);
        }
    }
    Ok(styles)
}

fn read_part(archive: &mut ZipArchive<File>, part: &str) -> Result<Option<String>, StyleError> {
    let mut file = match archive.by_name(part) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let mut xml = String::new();
    file.read_to_string(&mut xml)
        .map_err(|source| StyleError::Io {
            part: part.to_string(),
            source,
        })?;
    Ok(Some(xml))
}

/// `(sheet name, relationship id)` in workbook order.
fn parse_sheet_ids(xml: &str) -> Result<Vec<(String, String)>, StyleError> {
    let mut sheets = Vec::new();
    walk(xml, "xl/workbook.xml", |element, _| {
        if element.name().as_ref() == b"sheet" {
            if let (Some(name), Some(id)) = (attr(element, b"name"), attr(element, b"r:id")) {
                sheets.push((name, id));
            }
        }
    })?;
    Ok(sheets)
}

fn parse_relationships(xml: &str) -> Result<HashMap<String, String>, StyleError> {
    let mut targets = HashMap::new();
    walk(xml, "xl/_rels/workbook.xml.rels", |element, _| {
        if element.name().as_ref() == b"Relationship" {
            if let (Some(id), Some(target)) = (attr(element, b"Id"), attr(element, b"Target")) {
                targets.insert(id, target);
            }
        }
    })?;
    Ok(targets)
}

fn part_path(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{target}"),
    }
}

/// Number format code per `cellXfs` index; `None` for General or unknown ids.
fn parse_cell_formats(xml: &str) -> Result<Vec<Option<String>>, StyleError> {
    let mut custom: HashMap<u32, String> = HashMap::new();
    let mut xf_format_ids: Vec<u32> = Vec::new();

    walk(xml, "xl/styles.xml", |element, in_cell_xfs| match element.name().as_ref() {
        b"numFmt" => {
            let id = attr(element, b"numFmtId").and_then(|id| id.parse().ok());
            if let (Some(id), Some(code)) = (id, attr(element, b"formatCode")) {
                custom.insert(id, code);
            }
        }
        b"xf" if in_cell_xfs => {
            let id = attr(element, b"numFmtId")
                .and_then(|id| id.parse().ok())
                .unwrap_or(0);
            xf_format_ids.push(id);
        }
        _ => {}
    })?;

    Ok(xf_format_ids
        .into_iter()
        .map(|id| {
            custom
                .get(&id)
                .cloned()
                .or_else(|| builtin_format(id).map(str::to_string))
                .filter(|code| code != GENERAL_FORMAT)
        })
        .collect())
}

fn parse_worksheet(
    xml: &str,
    part: &str,
    cell_formats: &[Option<String>],
) -> Result<SheetStyles, StyleError> {
    let mut styles = SheetStyles::default();
    walk(xml, part, |element, _| match element.name().as_ref() {
        b"col" => {
            let custom = matches!(attr(element, b"customWidth").as_deref(), Some("1" | "true"));
            let min = attr(element, b"min").and_then(|v| v.parse::<usize>().ok());
            let max = attr(element, b"max").and_then(|v| v.parse::<usize>().ok());
            let width = attr(element, b"width").and_then(|v| v.parse::<f64>().ok());
            if let (true, Some(min), Some(max), Some(width)) = (custom, min, max, width) {
                for col in min.max(1)..=max {
                    styles.column_widths.insert(col - 1, strip_width_padding(width));
                }
            }
        }
        b"c" => {
            let position = attr(element, b"r").and_then(|r| cell_position(&r));
            let style = attr(element, b"s").and_then(|s| s.parse::<usize>().ok());
            if let (Some(position), Some(style)) = (position, style) {
                if let Some(Some(code)) = cell_formats.get(style) {
                    styles.number_formats.insert(position, code.clone());
                }
            }
        }
        _ => {}
    })?;
    Ok(styles)
}

/// Calls `visit` for every start or empty element, with whether it sits inside
/// `<cellXfs>`.
fn walk<F>(xml: &str, part: &str, mut visit: F) -> Result<(), StyleError>
where
    F: FnMut(&BytesStart<'_>, bool),
{
    let mut reader = XmlReader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut in_cell_xfs = false;

    loop {
        let event = reader.read_event().map_err(|source| StyleError::Xml {
            part: part.to_string(),
            source,
        })?;
        match event {
            Event::Start(element) => {
                if element.name().as_ref() == b"cellXfs" {
                    in_cell_xfs = true;
                }
                visit(&element, in_cell_xfs);
            }
            Event::Empty(element) => visit(&element, in_cell_xfs),
            Event::End(element) if element.name().as_ref() == b"cellXfs" => in_cell_xfs = false,
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(())
}

// Package parts are UTF-8, so attribute values only need unescaping.
fn attr(element: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    let attribute = element.try_get_attribute(key).ok().flatten()?;
    let raw = std::str::from_utf8(&attribute.value).ok()?;
    unescape(raw).ok().map(|value| value.into_owned())
}

/// Zero-based `(row, col)` of an A1 reference.
fn cell_position(reference: &str) -> Option<(usize, usize)> {
    let split = reference.find(|ch: char| ch.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    if letters.is_empty() {
        return None;
    }
    let mut col = 0usize;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        col = col * 26 + (ch.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }
    let row: usize = digits.parse().ok()?;
    (row > 0).then(|| (row - 1, col - 1))
}

fn strip_width_padding(raw: f64) -> f64 {
    let frac = raw % 1.0;
    for padding in [CALIBRI_WIDTH_PADDING, ALT_WIDTH_PADDING] {
        if (frac - padding).abs() < WIDTH_TOLERANCE && raw - padding >= 0.0 {
            return ((raw - padding) * 10000.0).round() / 10000.0;
        }
    }
    (raw * 10000.0).round() / 10000.0
}

fn builtin_format(id: u32) -> Option<&'static str> {
    let code = match id {
        0 => GENERAL_FORMAT,
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        9 => "0%",
        10 => "0.00%",
        11 => "0.00E+00",
        12 => "# ?/?",
        13 => "# ??/??",
        14 => "mm-dd-yy",
        15 => "d-mmm-yy",
        16 => "d-mmm",
        17 => "mmm-yy",
        18 => "h:mm AM/PM",
        19 => "h:mm:ss AM/PM",
        20 => "h:mm",
        21 => "h:mm:ss",
        22 => "m/d/yy h:mm",
        37 => "#,##0 ;(#,##0)",
        38 => "#,##0 ;[Red](#,##0)",
        39 => "#,##0.00;(#,##0.00)",
        40 => "#,##0.00;[Red](#,##0.00)",
        45 => "mm:ss",
        46 => "[h]:mm:ss",
        47 => "mmss.0",
        48 => "##0.0E+0",
        49 => "@",
        _ => return None,
    };
    Some(code)
}
