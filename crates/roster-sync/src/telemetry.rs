//! Log output for the command line runs.
//!
//! `RUST_LOG` wins when set. Otherwise the configured level applies to this
//! workspace's crates only, and the spreadsheet and archive libraries stay at `warn`.

use crate::config::TelemetryConfig;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

const OWN_TARGETS: [&str; 2] = ["roster_sync", "roster_sync_cli"];
const LIBRARY_LEVEL: &str = "warn";

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("log level '{level}' does not parse as a filter directive")]
    Level {
        level: String,
        #[source]
        source: ParseError,
    },
    #[error("a log subscriber is already installed: {0}")]
    Install(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Directive scoping `level` to the workspace crates.
pub fn filter_directive(level: &str) -> String {
    let level = level.trim();
    OWN_TARGETS
        .iter()
        .fold(LIBRARY_LEVEL.to_string(), |directive, target| {
            format!("{directive},{target}={level}")
        })
}

fn log_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(filter_directive(&config.log_level)).map_err(|source| {
        TelemetryError::Level {
            level: config.log_level.clone(),
            source,
        }
    })
}

/// Installs the global subscriber on stderr, keeping stdout free for reports.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(config)?)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(false)
        .compact()
        .try_init()
        .map_err(TelemetryError::Install)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_applies_to_workspace_crates_only() {
        assert_eq!(
            filter_directive(" debug "),
            "warn,roster_sync=debug,roster_sync_cli=debug"
        );
    }

    #[test]
    fn unknown_level_is_rejected() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = TelemetryConfig {
            log_level: "loud".to_string(),
        };
        match log_filter(&config) {
            Err(TelemetryError::Level { level, .. }) => assert_eq!(level, "loud"),
            other => panic!("expected level error, got {other:?}"),
        }
    }
}
