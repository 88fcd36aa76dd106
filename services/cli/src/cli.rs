use crate::commands::{
    run_inspect, run_merge, run_migrate, run_missing, run_sample, InspectArgs, MergeArgs,
    MigrateArgs, MissingArgs, SampleArgs,
};
use clap::{Parser, Subcommand};
use roster_sync::config::AppConfig;
use roster_sync::error::AppError;
use roster_sync::telemetry;
use tracing::debug;

#[derive(Parser, Debug)]
#[command(
    name = "roster-sync",
    about = "Reshape student rosters into upload templates and merge coding-profile links",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Copy roster rows into a new sheet laid out like an upload template
    Migrate(MigrateArgs),
    /// Fill a roster's profile-link column from a links workbook, keyed by registration number
    Merge(MergeArgs),
    /// Print each sheet's header row and first data rows
    Inspect(InspectArgs),
    /// List roster rows that have no profile link
    Missing(MissingArgs),
    /// Cut a small fixture workbook from the first rows of a roster
    Sample(SampleArgs),
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    debug!(?config.environment, "configuration loaded");

    match cli.command {
        Command::Migrate(args) => run_migrate(&config, args),
        Command::Merge(args) => run_merge(&config, args),
        Command::Inspect(args) => run_inspect(&config, args),
        Command::Missing(args) => run_missing(&config, args),
        Command::Sample(args) => run_sample(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use roster_sync::workflows::platform::ProfilePlatform;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn merge_defaults_to_leetcode_with_backup() {
        let cli = Cli::try_parse_from([
            "roster-sync",
            "merge",
            "--links",
            "LeetCode.xlsx",
            "--roster",
            "Students.xlsx",
        ])
        .expect("arguments parse");

        match cli.command {
            Command::Merge(args) => {
                assert_eq!(args.platform, ProfilePlatform::LeetCode);
                assert!(!args.no_backup);
                assert!(!args.list_skipped);
                assert!(args.sheet.is_none());
            }
            other => panic!("expected merge, got {other:?}"),
        }
    }

    #[test]
    fn unknown_platform_is_rejected() {
        let result = Cli::try_parse_from([
            "roster-sync",
            "missing",
            "--roster",
            "Students.xlsx",
            "--platform",
            "hackerrank",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn inspect_accepts_several_workbooks() {
        let cli = Cli::try_parse_from(["roster-sync", "inspect", "a.xlsx", "b.xlsx"])
            .expect("arguments parse");
        match cli.command {
            Command::Inspect(args) => {
                assert_eq!(args.paths.len(), 2);
                assert_eq!(args.preview_rows, 2);
            }
            other => panic!("expected inspect, got {other:?}"),
        }
    }
}
