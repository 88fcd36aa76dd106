use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workbook::WorkbookError;
use crate::workflows::merge::MergeError;
use crate::workflows::migrate::MigrationError;
use crate::workflows::ReportError;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Workbook(WorkbookError),
    Migration(MigrationError),
    Merge(MergeError),
    Report(ReportError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Workbook(err) => write!(f, "workbook error: {}", err),
            AppError::Migration(err) => write!(f, "migration failed: {}", err),
            AppError::Merge(err) => write!(f, "merge failed: {}", err),
            AppError::Report(err) => write!(f, "report failed: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Workbook(err) => Some(err),
            AppError::Migration(err) => Some(err),
            AppError::Merge(err) => Some(err),
            AppError::Report(err) => Some(err),
        }
    }
}

impl AppError {
    /// True when the run was rejected because an input workbook does not exist.
    pub fn is_missing_input(&self) -> bool {
        matches!(
            self,
            AppError::Workbook(WorkbookError::Missing { .. })
                | AppError::Migration(MigrationError::Workbook(WorkbookError::Missing { .. }))
                | AppError::Merge(MergeError::Workbook(WorkbookError::Missing { .. }))
                | AppError::Report(ReportError::Workbook(WorkbookError::Missing { .. }))
        )
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<WorkbookError> for AppError {
    fn from(value: WorkbookError) -> Self {
        Self::Workbook(value)
    }
}

impl From<MigrationError> for AppError {
    fn from(value: MigrationError) -> Self {
        Self::Migration(value)
    }
}

impl From<MergeError> for AppError {
    fn from(value: MergeError) -> Self {
        Self::Merge(value)
    }
}

impl From<ReportError> for AppError {
    fn from(value: ReportError) -> Self {
        Self::Report(value)
    }
}
