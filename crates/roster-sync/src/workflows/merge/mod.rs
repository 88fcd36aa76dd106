//! Copies profile links from a links workbook into the student roster, joined on
//! registration number.

mod join;
mod key;

pub use join::{apply_merge, build_join_map, JoinMap, MergeTally, SkipReason, SkippedRow};
pub use key::join_key;

use crate::config::WorkbookConfig;
use crate::workbook::{read_workbook, write_workbook, Sheet, Workbook, WorkbookError};
use crate::workflows::headers::{AliasSet, HeaderRow, MissingColumnError};
use crate::workflows::platform::ProfilePlatform;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error(transparent)]
    Workbook(#[from] WorkbookError),
    #[error("{workbook} workbook: {source}")]
    MissingColumn {
        workbook: &'static str,
        #[source]
        source: MissingColumnError,
    },
    #[error("{workbook} workbook has no sheets")]
    NoSheets { workbook: &'static str },
    #[error("failed to back up {} to {}: {source}", original.display(), backup.display())]
    Backup {
        original: PathBuf,
        backup: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Inputs of one merge run.
#[derive(Debug, Clone)]
pub struct MergeRequest {
    /// Workbook providing registration number -> link pairs (first sheet).
    pub links: PathBuf,
    /// Roster workbook rewritten in place.
    pub roster: PathBuf,
    pub platform: ProfilePlatform,
    /// Roster sheet to update; defaults to the configured student sheet.
    pub sheet: Option<String>,
    pub backup: bool,
}

/// Roster row that could not be joined, addressed by its 1-based sheet row.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct UnjoinedRow {
    pub row_number: usize,
    pub key: Option<String>,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub roster_sheet: String,
    pub join_entries: usize,
    pub updated: usize,
    pub skipped: usize,
    pub unchanged: usize,
    pub unjoined: Vec<UnjoinedRow>,
}

#[derive(Debug, Clone)]
pub struct MergeSummary {
    pub outcome: MergeOutcome,
    pub roster: PathBuf,
    pub backup: Option<PathBuf>,
}

pub struct ProfileLinkMerger {
    config: WorkbookConfig,
}

impl ProfileLinkMerger {
    pub fn new(config: WorkbookConfig) -> Self {
        Self { config }
    }

    /// Runs the merge against files. Both inputs must exist before anything is read;
    /// the roster is rewritten only after the in-memory pass has completed.
    pub fn run(&self, request: &MergeRequest) -> Result<MergeSummary, MergeError> {
        for path in [&request.links, &request.roster] {
            if !path.exists() {
                return Err(WorkbookError::Missing { path: path.clone() }.into());
            }
        }

        let links = read_workbook(&request.links)?;
        let mut roster = read_workbook(&request.roster)?;
        let sheet = request
            .sheet
            .as_deref()
            .unwrap_or(&self.config.student_sheet);

        let outcome = self.merge(&links, &mut roster, request.platform, sheet)?;

        let backup = if request.backup {
            ensure_backup(&request.roster)?
        } else {
            None
        };
        write_workbook(&roster, &request.roster)?;

        info!(
            updated = outcome.updated,
            skipped = outcome.skipped,
            roster = %request.roster.display(),
            "profile links merged"
        );
        Ok(MergeSummary {
            outcome,
            roster: request.roster.clone(),
            backup,
        })
    }

    /// In-memory merge of `links` (first sheet) into the preferred sheet of `roster`.
    pub fn merge(
        &self,
        links: &Workbook,
        roster: &mut Workbook,
        platform: ProfilePlatform,
        preferred_sheet: &str,
    ) -> Result<MergeOutcome, MergeError> {
        let link_aliases = platform.link_aliases();
        let registration = AliasSet::registration_number();

        let links_sheet = links
            .sheets
            .first()
            .ok_or(MergeError::NoSheets { workbook: "links" })?;
        let (links_header, key_col, value_col) = self.required_columns(
            links_sheet,
            "links",
            &registration,
            &link_aliases,
        )?;
        let data = links_sheet
            .rows
            .get(links_header.row + 1..)
            .unwrap_or_default();
        let join_map = build_join_map(data, key_col, value_col);
        info!(entries = join_map.len(), platform = %platform, "join map built");

        let index = roster
            .preferred_sheet_index(preferred_sheet)
            .ok_or(MergeError::NoSheets { workbook: "roster" })?;
        let sheet = &mut roster.sheets[index];
        if sheet.name != preferred_sheet {
            warn!(
                preferred = preferred_sheet,
                using = %sheet.name,
                "preferred roster sheet not found"
            );
        }
        let (roster_header, key_col, value_col) =
            self.required_columns(sheet, "roster", &registration, &link_aliases)?;

        let first_data_row = roster_header.row + 1;
        let rows = sheet
            .rows
            .get_mut(first_data_row..)
            .unwrap_or_default();
        let tally = apply_merge(rows, key_col, value_col, &join_map);

        let unjoined = tally
            .skipped_rows
            .iter()
            .map(|skipped| UnjoinedRow {
                row_number: first_data_row + skipped.index + 1,
                key: skipped.key.clone(),
                reason: skipped.reason,
            })
            .collect();

        Ok(MergeOutcome {
            roster_sheet: sheet.name.clone(),
            join_entries: join_map.len(),
            updated: tally.updated,
            skipped: tally.skipped,
            unchanged: tally.unchanged,
            unjoined,
        })
    }

    fn required_columns(
        &self,
        sheet: &Sheet,
        workbook: &'static str,
        key_aliases: &AliasSet,
        value_aliases: &AliasSet,
    ) -> Result<(HeaderRow, usize, usize), MergeError> {
        let header = HeaderRow::detect(sheet, self.config.header_search_rows);
        let to_error = |source| MergeError::MissingColumn { workbook, source };
        let key_col = header.require(key_aliases).map_err(to_error)?;
        let value_col = header.require(value_aliases).map_err(to_error)?;
        Ok((header, key_col, value_col))
    }
}

/// `<stem>.backup.<ext>` next to `path`.
pub fn backup_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match path.extension() {
        Some(ext) => format!("{stem}.backup.{}", ext.to_string_lossy()),
        None => format!("{stem}.backup"),
    };
    path.with_file_name(file_name)
}

/// Copies `path` to its backup location unless a backup already exists. Returns the
/// backup path when one was written.
pub fn ensure_backup(path: &Path) -> Result<Option<PathBuf>, MergeError> {
    let backup = backup_path(path);
    if backup.exists() {
        return Ok(None);
    }
    std::fs::copy(path, &backup).map_err(|source| MergeError::Backup {
        original: path.to_path_buf(),
        backup: backup.clone(),
        source,
    })?;
    info!(backup = %backup.display(), "roster backed up");
    Ok(Some(backup))
}
