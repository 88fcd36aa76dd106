use clap::Args;
use roster_sync::config::AppConfig;
use roster_sync::error::AppError;
use roster_sync::workbook::WorkbookError;
use roster_sync::workflows::inspect::{inspect_workbook, WorkbookPreview};
use roster_sync::workflows::merge::{MergeRequest, MergeSummary, ProfileLinkMerger, SkipReason};
use roster_sync::workflows::migrate::{MatchKind, MigrationRequest, MigrationSummary, UploadFormatMigrator};
use roster_sync::workflows::missing::{missing_links_in, MissingLinkReport};
use roster_sync::workflows::platform::ProfilePlatform;
use roster_sync::workflows::sample::{write_sample, SampleSummary};
use roster_sync::workflows::ReportError;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::warn;

#[derive(Args, Debug)]
pub(crate) struct MigrateArgs {
    /// Roster workbook whose first sheet holds the data
    #[arg(long)]
    pub(crate) source: PathBuf,
    /// Upload template whose first sheet defines the target columns
    #[arg(long)]
    pub(crate) template: PathBuf,
    /// Write the result here instead of rewriting the source workbook
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    /// Base name of the generated sheet (defaults to ROSTER_UPLOAD_SHEET)
    #[arg(long)]
    pub(crate) sheet_name: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct MergeArgs {
    /// Workbook with registration numbers and profile links
    #[arg(long)]
    pub(crate) links: PathBuf,
    /// Roster workbook updated in place
    #[arg(long)]
    pub(crate) roster: PathBuf,
    /// Profile site whose link column is merged (leetcode, gfg, codechef)
    #[arg(long, default_value_t = ProfilePlatform::LeetCode)]
    pub(crate) platform: ProfilePlatform,
    /// Roster sheet to update (defaults to ROSTER_STUDENT_SHEET)
    #[arg(long)]
    pub(crate) sheet: Option<String>,
    /// Skip the one-time backup copy of the roster
    #[arg(long)]
    pub(crate) no_backup: bool,
    /// List every roster row that could not be joined
    #[arg(long)]
    pub(crate) list_skipped: bool,
}

#[derive(Args, Debug)]
pub(crate) struct InspectArgs {
    /// Workbooks to preview
    #[arg(required = true)]
    pub(crate) paths: Vec<PathBuf>,
    /// Data rows shown under each header
    #[arg(long, default_value_t = 2)]
    pub(crate) preview_rows: usize,
    /// Emit JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct MissingArgs {
    /// Roster workbook to scan
    #[arg(long)]
    pub(crate) roster: PathBuf,
    #[arg(long, default_value_t = ProfilePlatform::LeetCode)]
    pub(crate) platform: ProfilePlatform,
    /// Roster sheet to scan (defaults to ROSTER_STUDENT_SHEET)
    #[arg(long)]
    pub(crate) sheet: Option<String>,
    /// Also export the rows to this CSV file
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
    /// Emit JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct SampleArgs {
    #[arg(long)]
    pub(crate) source: PathBuf,
    #[arg(long)]
    pub(crate) output: PathBuf,
    /// Data rows copied below the header
    #[arg(long, default_value_t = 5)]
    pub(crate) rows: usize,
}

pub(crate) fn run_migrate(config: &AppConfig, args: MigrateArgs) -> Result<(), AppError> {
    let MigrateArgs {
        source,
        template,
        output,
        sheet_name,
    } = args;

    let migrator = UploadFormatMigrator::new(config.workbook.clone());
    let summary = migrator.run(&MigrationRequest {
        source,
        template,
        output,
        sheet_name,
    })?;

    render_migration(&mut io::stdout().lock(), &summary)?;
    Ok(())
}

pub(crate) fn run_merge(config: &AppConfig, args: MergeArgs) -> Result<(), AppError> {
    let MergeArgs {
        links,
        roster,
        platform,
        sheet,
        no_backup,
        list_skipped,
    } = args;

    let merger = ProfileLinkMerger::new(config.workbook.clone());
    let summary = merger.run(&MergeRequest {
        links,
        roster,
        platform,
        sheet,
        backup: !no_backup,
    })?;

    render_merge(&mut io::stdout().lock(), &summary, list_skipped)?;
    Ok(())
}

pub(crate) fn run_inspect(config: &AppConfig, args: InspectArgs) -> Result<(), AppError> {
    let InspectArgs {
        paths,
        preview_rows,
        json,
    } = args;

    let mut previews = Vec::with_capacity(paths.len());
    for path in &paths {
        match inspect_workbook(path, config.workbook.header_search_rows, preview_rows) {
            Ok(preview) => previews.push(preview),
            Err(WorkbookError::Missing { path }) => {
                warn!(path = %path.display(), "workbook not found, skipping");
                eprintln!("Not found: {}", path.display());
            }
            Err(err) => return Err(err.into()),
        }
    }

    let mut out = io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut out, &previews).map_err(io::Error::from)?;
        writeln!(out)?;
    } else {
        for preview in &previews {
            render_preview(&mut out, preview)?;
        }
    }
    Ok(())
}

pub(crate) fn run_missing(config: &AppConfig, args: MissingArgs) -> Result<(), AppError> {
    let MissingArgs {
        roster,
        platform,
        sheet,
        csv,
        json,
    } = args;

    let sheet = sheet.unwrap_or_else(|| config.workbook.student_sheet.clone());
    let report = missing_links_in(
        &roster,
        platform,
        &sheet,
        config.workbook.header_search_rows,
    )?;

    if let Some(csv_path) = &csv {
        let file = File::create(csv_path)?;
        report
            .write_csv(BufWriter::new(file))
            .map_err(ReportError::from)?;
    }

    let mut out = io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut out, &report).map_err(io::Error::from)?;
        writeln!(out)?;
    } else {
        render_missing(&mut out, &report)?;
        if let Some(csv_path) = &csv {
            writeln!(out, "CSV written to {}", csv_path.display())?;
        }
    }
    Ok(())
}

pub(crate) fn run_sample(args: SampleArgs) -> Result<(), AppError> {
    let summary = write_sample(&args.source, &args.output, args.rows)?;
    render_sample(&mut io::stdout().lock(), &summary)?;
    Ok(())
}

pub(crate) fn render_migration<W: Write>(out: &mut W, summary: &MigrationSummary) -> io::Result<()> {
    let outcome = &summary.outcome;
    writeln!(out, "Source sheet: {}", outcome.source_sheet)?;
    writeln!(out, "Source headers: {}", outcome.source_headers.join(", "))?;
    writeln!(out, "Template sheet: {}", outcome.template_sheet)?;
    writeln!(out, "Template headers: {}", outcome.template_headers.join(", "))?;

    writeln!(out, "\nColumn mapping")?;
    for binding in outcome.mapping.bindings() {
        match (binding.source_column, binding.matched_by) {
            (Some(column), MatchKind::Synonym) => writeln!(
                out,
                "- [{}] {} <= col {} (synonym)",
                binding.position + 1,
                binding.header,
                column + 1
            )?,
            (Some(column), _) => writeln!(
                out,
                "- [{}] {} <= col {}",
                binding.position + 1,
                binding.header,
                column + 1
            )?,
            (None, _) => writeln!(
                out,
                "- [{}] {} <= (no match)",
                binding.position + 1,
                binding.header
            )?,
        }
    }

    writeln!(
        out,
        "\nWrote {} rows to sheet '{}' in {}",
        outcome.rows_written,
        outcome.sheet_name,
        summary.output.display()
    )
}

pub(crate) fn render_merge<W: Write>(
    out: &mut W,
    summary: &MergeSummary,
    list_skipped: bool,
) -> io::Result<()> {
    let outcome = &summary.outcome;
    writeln!(out, "Roster sheet: {}", outcome.roster_sheet)?;
    writeln!(out, "Links loaded: {}", outcome.join_entries)?;
    writeln!(out, "Updated rows: {}", outcome.updated)?;
    writeln!(out, "Already current: {}", outcome.unchanged)?;
    writeln!(out, "No-match/Skipped rows: {}", outcome.skipped)?;

    if list_skipped && !outcome.unjoined.is_empty() {
        writeln!(out, "\nSkipped rows")?;
        for row in &outcome.unjoined {
            let reason = match row.reason {
                SkipReason::MissingKey => "no registration number",
                SkipReason::NoMatch => "no link for registration number",
            };
            match &row.key {
                Some(key) => writeln!(out, "- row {}: {} {}", row.row_number, reason, key)?,
                None => writeln!(out, "- row {}: {}", row.row_number, reason)?,
            }
        }
    }

    if let Some(backup) = &summary.backup {
        writeln!(out, "Backup written to {}", backup.display())?;
    }
    writeln!(out, "Saved {}", summary.roster.display())
}

pub(crate) fn render_preview<W: Write>(out: &mut W, preview: &WorkbookPreview) -> io::Result<()> {
    writeln!(out, "== {}", preview.path.display())?;
    for sheet in &preview.sheets {
        writeln!(out, "Sheet: {}", sheet.sheet)?;
        if sheet.headers.is_empty() {
            writeln!(out, "  (empty)")?;
            continue;
        }
        writeln!(out, "  Header (row {}): {:?}", sheet.header_row, sheet.headers)?;
        for (offset, row) in sheet.rows.iter().enumerate() {
            writeln!(out, "  Row {}: {:?}", sheet.header_row + offset + 1, row)?;
        }
    }
    Ok(())
}

pub(crate) fn render_missing<W: Write>(out: &mut W, report: &MissingLinkReport) -> io::Result<()> {
    writeln!(
        out,
        "Sheet: {} ({} link, {} rows checked)",
        report.sheet, report.platform, report.checked
    )?;
    if report.is_complete() {
        return writeln!(out, "Missing links: none");
    }

    writeln!(out, "Missing links: {}", report.missing.len())?;
    for entry in &report.missing {
        writeln!(
            out,
            "- row {}: {} ({})",
            entry.row_number, entry.name, entry.registration
        )?;
    }
    Ok(())
}

pub(crate) fn render_sample<W: Write>(out: &mut W, summary: &SampleSummary) -> io::Result<()> {
    writeln!(
        out,
        "Copied header and {} rows from '{}' to {}",
        summary.sample.rows.len(),
        summary.sample.source_sheet,
        summary.output.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_sync::workflows::merge::{MergeOutcome, UnjoinedRow};
    use roster_sync::workflows::missing::MissingLink;

    fn rendered(render: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buffer = Vec::new();
        render(&mut buffer).expect("render succeeds");
        String::from_utf8(buffer).expect("utf8 output")
    }

    fn merge_summary() -> MergeSummary {
        MergeSummary {
            outcome: MergeOutcome {
                roster_sheet: "Students".to_string(),
                join_entries: 40,
                updated: 12,
                skipped: 2,
                unchanged: 26,
                unjoined: vec![
                    UnjoinedRow {
                        row_number: 7,
                        key: Some("21BCE404".to_string()),
                        reason: SkipReason::NoMatch,
                    },
                    UnjoinedRow {
                        row_number: 9,
                        key: None,
                        reason: SkipReason::MissingKey,
                    },
                ],
            },
            roster: PathBuf::from("Marquee_Students.xlsx"),
            backup: None,
        }
    }

    #[test]
    fn merge_report_shows_counts_without_row_listing() {
        let text = rendered(|out| render_merge(out, &merge_summary(), false));
        assert!(text.contains("Updated rows: 12"));
        assert!(text.contains("No-match/Skipped rows: 2"));
        assert!(!text.contains("row 7"));
    }

    #[test]
    fn merge_report_lists_skipped_rows_on_request() {
        let text = rendered(|out| render_merge(out, &merge_summary(), true));
        assert!(text.contains("- row 7: no link for registration number 21BCE404"));
        assert!(text.contains("- row 9: no registration number"));
    }

    #[test]
    fn missing_report_lists_name_and_registration() {
        let report = MissingLinkReport {
            sheet: "Students".to_string(),
            platform: ProfilePlatform::GeeksforGeeks,
            checked: 3,
            missing: vec![MissingLink {
                row_number: 4,
                name: "B".to_string(),
                registration: "21BCE002".to_string(),
            }],
        };
        let text = rendered(|out| render_missing(out, &report));
        assert!(text.starts_with("Sheet: Students (GeeksforGeeks link, 3 rows checked)"));
        assert!(text.contains("- row 4: B (21BCE002)"));
    }
}
