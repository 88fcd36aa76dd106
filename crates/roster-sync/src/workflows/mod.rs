pub mod headers;
pub mod inspect;
pub mod merge;
pub mod migrate;
pub mod missing;
pub mod platform;
pub mod sample;

use crate::workbook::WorkbookError;
use headers::MissingColumnError;
use std::path::PathBuf;

/// Failures of the read-mostly utilities (missing-link report, sample extraction).
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error(transparent)]
    Workbook(#[from] WorkbookError),
    #[error(transparent)]
    MissingColumn(#[from] MissingColumnError),
    #[error("failed to write CSV report: {0}")]
    Csv(#[from] csv::Error),
    #[error("workbook {} has no sheets", path.display())]
    NoSheets { path: PathBuf },
}
