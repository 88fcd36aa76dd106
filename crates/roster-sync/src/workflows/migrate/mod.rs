//! Rebuilds a roster into the column layout of an upload template.
//!
//! The template's header row decides the columns of a new sheet appended to the
//! source workbook; source columns are matched by normalized header name, falling
//! back to the roster synonym table.

mod copier;
mod format;
mod mapping;

pub use copier::copy_rows;
pub use format::{infer_column_formats, snapshot_header_styles};
pub use mapping::{map_columns, ColumnBinding, ColumnMapping, MatchKind};

use crate::config::WorkbookConfig;
use crate::workbook::{
    read_workbook, write_workbook, AutoFilter, Cell, CellValue, Sheet, Workbook, WorkbookError,
};
use crate::workflows::headers::{HeaderRow, SynonymTable};
use std::path::PathBuf;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error(transparent)]
    Workbook(#[from] WorkbookError),
    #[error("template sheet '{sheet}' has no header row")]
    EmptyTemplate { sheet: String },
    #[error("{role} workbook has no sheets")]
    NoSheets { role: &'static str },
}

/// Inputs of one migration run.
#[derive(Debug, Clone)]
pub struct MigrationRequest {
    /// Workbook whose first sheet holds the data; the new sheet is appended here.
    pub source: PathBuf,
    /// Workbook whose first sheet defines the target layout.
    pub template: PathBuf,
    /// Where the rewritten source workbook goes; defaults to `source`.
    pub output: Option<PathBuf>,
    /// Base name for the generated sheet; defaults to the configured upload sheet.
    pub sheet_name: Option<String>,
}

/// What a migration produced, for reporting.
#[derive(Debug, Clone)]
pub struct MigrationOutcome {
    pub sheet_name: String,
    pub source_sheet: String,
    pub template_sheet: String,
    pub source_headers: Vec<String>,
    pub template_headers: Vec<String>,
    pub mapping: ColumnMapping,
    pub rows_written: usize,
}

#[derive(Debug, Clone)]
pub struct MigrationSummary {
    pub outcome: MigrationOutcome,
    pub output: PathBuf,
}

pub struct UploadFormatMigrator {
    config: WorkbookConfig,
    synonyms: SynonymTable,
}

impl UploadFormatMigrator {
    pub fn new(config: WorkbookConfig) -> Self {
        Self {
            config,
            synonyms: SynonymTable::roster(),
        }
    }

    /// Loads both workbooks, appends the migrated sheet and persists the source
    /// workbook only once the whole sheet has been built.
    pub fn run(&self, request: &MigrationRequest) -> Result<MigrationSummary, MigrationError> {
        for path in [&request.template, &request.source] {
            if !path.exists() {
                return Err(WorkbookError::Missing { path: path.clone() }.into());
            }
        }

        let template = read_workbook(&request.template)?;
        let mut source = read_workbook(&request.source)?;

        let base_name = request
            .sheet_name
            .as_deref()
            .unwrap_or(&self.config.upload_sheet);
        let outcome = self.migrate(&mut source, &template, base_name)?;

        let output = request
            .output
            .clone()
            .unwrap_or_else(|| request.source.clone());
        write_workbook(&source, &output)?;

        info!(
            sheet = %outcome.sheet_name,
            rows = outcome.rows_written,
            output = %output.display(),
            "migration complete"
        );
        Ok(MigrationSummary { outcome, output })
    }

    /// In-memory migration: the first sheet of `source` is reshaped after the first
    /// sheet of `template` into a new sheet appended to `source`.
    pub fn migrate(
        &self,
        source: &mut Workbook,
        template: &Workbook,
        base_name: &str,
    ) -> Result<MigrationOutcome, MigrationError> {
        let template_sheet = template
            .sheets
            .first()
            .ok_or(MigrationError::NoSheets { role: "template" })?;
        let template_headers = HeaderRow::detect(template_sheet, self.config.header_search_rows);
        if template_headers.is_empty() {
            return Err(MigrationError::EmptyTemplate {
                sheet: template_sheet.name.clone(),
            });
        }

        let source_sheet = source
            .sheets
            .first()
            .ok_or(MigrationError::NoSheets { role: "source" })?;
        let source_headers = HeaderRow::detect(source_sheet, self.config.header_search_rows);

        let mapping = map_columns(&template_headers, &source_headers, &self.synonyms);
        for binding in mapping.bindings() {
            match binding.source_column {
                Some(column) => debug!(
                    header = %binding.header,
                    source_column = column,
                    matched_by = ?binding.matched_by,
                    "column bound"
                ),
                None => warn!(header = %binding.header, "no source column matched"),
            }
        }

        let formats =
            infer_column_formats(template_sheet, &template_headers, self.config.format_scan_rows);
        let styles = snapshot_header_styles(
            template_sheet,
            &template_headers,
            self.config.default_column_width,
        );

        let sheet_name = source.unique_sheet_name(base_name);
        let mut sheet = Sheet::new(sheet_name.clone());
        for (binding, style) in mapping.bindings().iter().zip(&styles) {
            sheet.set_cell(
                0,
                binding.position,
                Cell {
                    value: CellValue::Text(binding.header.clone()),
                    number_format: style.number_format.clone(),
                    formula: None,
                },
            );
            sheet.column_widths.insert(binding.position, style.width);
        }

        let data_rows = source_sheet
            .rows
            .get(source_headers.row + 1..)
            .unwrap_or_default();
        let rows_written = copy_rows(data_rows, &mapping, &formats, &mut sheet);

        sheet.frozen_rows = 1;
        sheet.autofilter = Some(AutoFilter {
            first_row: 0,
            first_col: 0,
            last_row: 0,
            last_col: (mapping.len() - 1) as u16,
        });

        let outcome = MigrationOutcome {
            sheet_name,
            source_sheet: source_sheet.name.clone(),
            template_sheet: template_sheet.name.clone(),
            source_headers: source_headers.texts(),
            template_headers: template_headers.texts(),
            mapping,
            rows_written,
        };
        source.sheets.push(sheet);

        Ok(outcome)
    }
}
