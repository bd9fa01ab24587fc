/// Undo functionality for reverting the most recent organize run.
///
/// The newest batch is taken off the history and its moves are replayed
/// backwards, last move first. Moves whose file has since disappeared are
/// skipped with a warning; the rest of the batch is still restored.
use crate::cleanup::remove_empty_dirs;
use crate::history::{HistoryStore, MoveRecord};
use crate::organizer::{OrganizeError, OrganizeResult};
use crate::report::Reporter;
use crate::resolver::{move_file, next_free_path};
use std::fs;
use std::path::{Path, PathBuf};

/// Represents the result of an undo operation.
#[derive(Debug, Default)]
pub struct UndoReport {
    /// Number of files moved back (or, in dry-run, that would be).
    pub restored: usize,
    /// Files restored under a new name because their original path was
    /// taken: `(original path, path actually used)`.
    pub renamed: Vec<(PathBuf, PathBuf)>,
    /// Moves that were skipped because the file was no longer there.
    pub skipped: Vec<(PathBuf, String)>,
    /// Moves that failed.
    pub failed: Vec<(PathBuf, String)>,
    /// Empty folders removed after restoring.
    pub removed_dirs: Vec<PathBuf>,
}

impl UndoReport {
    /// Returns the total number of moves processed.
    pub fn total_processed(&self) -> usize {
        self.restored + self.failed.len() + self.skipped.len()
    }

    /// Returns true if every recorded move was restored.
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }
}

/// Reverts the newest batch recorded for `base_path`.
///
/// Outside dry-run the batch is removed from the history once its moves
/// have been replayed, and empty folders are cleaned up. In dry-run nothing
/// is changed and the history keeps the batch.
///
/// # Errors
///
/// Returns `OrganizeError::NoHistory` when there is no batch to undo and
/// `OrganizeError::HistoryWriteFailed` when the shortened history cannot be
/// saved.
pub fn undo_latest<R: Reporter>(
    base_path: &Path,
    history: &HistoryStore,
    dry_run: bool,
    reporter: &R,
) -> OrganizeResult<UndoReport> {
    let mut batches = history.load(reporter);
    let batch = batches.pop().ok_or_else(|| OrganizeError::NoHistory {
        path: base_path.to_path_buf(),
    })?;

    reporter.info(&format!(
        "Undoing {} move(s) recorded at {}",
        batch.moves.len(),
        batch.timestamp.to_rfc3339()
    ));

    let mut report = UndoReport::default();
    for record in batch.moves.iter().rev() {
        restore_file(record, dry_run, reporter, &mut report);
    }

    if dry_run {
        return Ok(report);
    }

    history.save(&batches)?;
    report.removed_dirs = remove_empty_dirs(base_path, reporter);
    Ok(report)
}

/// Moves one file back to where it came from, recording the outcome.
///
/// An occupied original path is never overwritten: the file is restored
/// next to it under the first free `stem_N.ext` name.
fn restore_file<R: Reporter>(
    record: &MoveRecord,
    dry_run: bool,
    reporter: &R,
    report: &mut UndoReport,
) {
    if !record.dest.exists() {
        let reason = "File not found at expected location".to_string();
        reporter.warn(&format!("Skipping {}: {}", record.dest.display(), reason));
        report.skipped.push((record.dest.clone(), reason));
        return;
    }

    let parent = record.src.parent().unwrap_or_else(|| Path::new(""));
    let target = if record.src.exists() {
        let name = record
            .src
            .file_name()
            .map(Path::new)
            .unwrap_or(record.src.as_path());
        let free = next_free_path(parent, name);
        reporter.warn(&format!(
            "{} is occupied; restoring to {}",
            record.src.display(),
            free.display()
        ));
        report.renamed.push((record.src.clone(), free.clone()));
        free
    } else {
        record.src.clone()
    };

    if dry_run {
        reporter.info(&format!(
            "[DRY-RUN] Restore: '{}' -> '{}'",
            record.dest.display(),
            target.display()
        ));
        report.restored += 1;
        return;
    }

    if !parent.as_os_str().is_empty()
        && let Err(e) = fs::create_dir_all(parent)
    {
        let reason = format!("Could not recreate {}: {}", parent.display(), e);
        reporter.error(&reason);
        report.failed.push((record.dest.clone(), reason));
        return;
    }

    match move_file(&record.dest, &target) {
        Ok(()) => {
            reporter.info(&format!(
                "Restored: '{}' -> '{}'",
                record.dest.display(),
                target.display()
            ));
            report.restored += 1;
        }
        Err(e) => {
            reporter.error(&e.to_string());
            report.failed.push((record.dest.clone(), e.to_string()));
        }
    }
}
