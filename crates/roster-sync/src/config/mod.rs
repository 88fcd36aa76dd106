use std::env;
use std::fmt;
use std::str::FromStr;

/// Distinguishes runtime behavior for different stages of the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for a run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub workbook: WorkbookConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let defaults = WorkbookConfig::default();
        let header_search_rows =
            parse_var("ROSTER_HEADER_SEARCH_ROWS", defaults.header_search_rows)?;
        let format_scan_rows = parse_var("ROSTER_FORMAT_SCAN_ROWS", defaults.format_scan_rows)?;
        let default_column_width =
            parse_var("ROSTER_DEFAULT_COLUMN_WIDTH", defaults.default_column_width)?;
        let student_sheet =
            env::var("ROSTER_STUDENT_SHEET").unwrap_or(defaults.student_sheet);
        let upload_sheet = env::var("ROSTER_UPLOAD_SHEET").unwrap_or(defaults.upload_sheet);

        if header_search_rows == 0 {
            return Err(ConfigError::InvalidNumber {
                key: "ROSTER_HEADER_SEARCH_ROWS",
                value: "0".to_string(),
            });
        }

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            workbook: WorkbookConfig {
                header_search_rows,
                format_scan_rows,
                default_column_width,
                student_sheet,
                upload_sheet,
            },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

fn parse_var<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { key, value: raw }),
        Err(_) => Ok(default),
    }
}

/// Knobs shared by every workbook pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkbookConfig {
    /// How many leading rows are searched for the header row.
    pub header_search_rows: usize,
    /// How many rows below the template header are scanned for a column's display format.
    pub format_scan_rows: usize,
    pub default_column_width: f64,
    /// Preferred roster sheet; the first sheet is used when it is absent.
    pub student_sheet: String,
    /// Base name for sheets created by the migration.
    pub upload_sheet: String,
}

impl Default for WorkbookConfig {
    fn default() -> Self {
        Self {
            header_search_rows: 20,
            format_scan_rows: 50,
            default_column_width: 15.0,
            student_sheet: "Students".to_string(),
            upload_sheet: "Upload_Format".to_string(),
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidNumber { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be a positive number (got '{value}')")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("ROSTER_HEADER_SEARCH_ROWS");
        env::remove_var("ROSTER_FORMAT_SCAN_ROWS");
        env::remove_var("ROSTER_DEFAULT_COLUMN_WIDTH");
        env::remove_var("ROSTER_STUDENT_SHEET");
        env::remove_var("ROSTER_UPLOAD_SHEET");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.workbook, WorkbookConfig::default());
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn overrides_sheet_names_and_windows() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "ci");
        env::set_var("ROSTER_HEADER_SEARCH_ROWS", "5");
        env::set_var("ROSTER_STUDENT_SHEET", "Roster");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.environment, AppEnvironment::Test);
        assert_eq!(config.workbook.header_search_rows, 5);
        assert_eq!(config.workbook.student_sheet, "Roster");
        reset_env();
    }

    #[test]
    fn rejects_non_numeric_scan_window() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ROSTER_FORMAT_SCAN_ROWS", "fifty");
        let error = AppConfig::load().expect_err("invalid number rejected");
        assert!(error.to_string().contains("ROSTER_FORMAT_SCAN_ROWS"));
        reset_env();
    }
}
