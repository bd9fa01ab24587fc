//! Placement of a single file into its destination folder.
//!
//! Decides between three outcomes when a file is moved into a folder:
//! - no collision: the file keeps its name
//! - collision with identical content: the source is deleted as a duplicate
//! - collision with different content (or unreadable content): the file gets
//!   the first free `stem_N.ext` name, counting up from 1

use crate::hasher::hash_file;
use crate::organizer::{OrganizeError, OrganizeResult};
use crate::report::Reporter;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Outcome of resolving one file against its destination folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The file was moved (or, in dry-run, would be moved) to this path.
    Placed(PathBuf),
    /// The source matched an existing file byte-for-byte and was deleted
    /// (or, in dry-run, would be deleted).
    Duplicate { existing: PathBuf },
    /// The file already sits at its destination; nothing to do.
    AlreadyPlaced,
}

/// Places `source` inside `dest_folder`, creating the folder if needed.
///
/// In dry-run mode every decision is computed and reported but the
/// filesystem is left untouched.
///
/// # Errors
///
/// Returns `OrganizeError::DestinationNotADirectory` when a file holds the
/// folder's name, and the underlying I/O failure when the folder cannot be
/// created or the move/delete fails. Hash failures are not errors here: they are
/// reported and the file is renamed instead of being treated as a duplicate.
pub fn resolve<R: Reporter>(
    source: &Path,
    dest_folder: &Path,
    dry_run: bool,
    reporter: &R,
) -> OrganizeResult<Resolution> {
    if dest_folder.exists() && !dest_folder.is_dir() {
        return Err(OrganizeError::DestinationNotADirectory {
            path: dest_folder.to_path_buf(),
        });
    }

    if !dest_folder.exists() {
        if dry_run {
            reporter.info(&format!(
                "[DRY-RUN] Create directory: {}",
                dest_folder.display()
            ));
        } else {
            fs::create_dir_all(dest_folder).map_err(|e| {
                OrganizeError::DirectoryCreationFailed {
                    path: dest_folder.to_path_buf(),
                    source: e,
                }
            })?;
        }
    }

    let file_name = source
        .file_name()
        .ok_or_else(|| OrganizeError::FileMoveFailure {
            from: source.to_path_buf(),
            to: dest_folder.to_path_buf(),
            error: io::Error::new(io::ErrorKind::InvalidInput, "file has no name component"),
        })?;

    let candidate = dest_folder.join(file_name);
    if candidate == source {
        return Ok(Resolution::AlreadyPlaced);
    }

    let target = if candidate.exists() {
        if same_content(source, &candidate, reporter) {
            return remove_duplicate(source, candidate, dry_run, reporter);
        }
        next_free_path(dest_folder, Path::new(file_name))
    } else {
        candidate
    };

    if dry_run {
        reporter.info(&format!(
            "[DRY-RUN] Move: '{}' -> '{}'",
            source.display(),
            target.display()
        ));
        return Ok(Resolution::Placed(target));
    }

    move_file(source, &target)?;
    reporter.info(&format!(
        "Moved: '{}' -> '{}'",
        source.display(),
        target.display()
    ));
    Ok(Resolution::Placed(target))
}

/// Returns the first `stem_N.ext` inside `dir` that does not exist yet.
///
/// `name` supplies the stem and extension; the counter starts at 1 and has
/// no upper bound. Every candidate is checked against the filesystem.
pub fn next_free_path(dir: &Path, name: &Path) -> PathBuf {
    let stem = name
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| name.as_os_str().to_os_string());
    let ext = name.extension();

    let mut counter: u64 = 1;
    loop {
        let mut candidate_name = OsString::from(&stem);
        candidate_name.push(format!("_{}", counter));
        if let Some(ext) = ext {
            candidate_name.push(".");
            candidate_name.push(ext);
        }
        let candidate = dir.join(candidate_name);
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

/// Moves a file, falling back to copy + delete when a rename crosses devices.
pub fn move_file(from: &Path, to: &Path) -> OrganizeResult<()> {
    let move_err = |error| OrganizeError::FileMoveFailure {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        error,
    };

    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            fs::copy(from, to).map_err(move_err)?;
            if let Err(e) = fs::remove_file(from) {
                // Leave exactly one copy behind.
                let _ = fs::remove_file(to);
                return Err(move_err(e));
            }
            Ok(())
        }
        Err(e) => Err(move_err(e)),
    }
}

fn same_content<R: Reporter>(source: &Path, existing: &Path, reporter: &R) -> bool {
    match (hash_file(source), hash_file(existing)) {
        (Ok(a), Ok(b)) => a == b,
        (Err(e), _) | (_, Err(e)) => {
            reporter.warn(&format!("{}; keeping both files", e));
            false
        }
    }
}

fn remove_duplicate<R: Reporter>(
    source: &Path,
    existing: PathBuf,
    dry_run: bool,
    reporter: &R,
) -> OrganizeResult<Resolution> {
    if dry_run {
        reporter.info(&format!(
            "[DRY-RUN] Delete duplicate: '{}' (same content as '{}')",
            source.display(),
            existing.display()
        ));
        return Ok(Resolution::Duplicate { existing });
    }

    fs::remove_file(source).map_err(|e| OrganizeError::DeleteFailed {
        path: source.to_path_buf(),
        source: e,
    })?;
    reporter.info(&format!(
        "Deleted duplicate: '{}' (same content as '{}')",
        source.display(),
        existing.display()
    ));
    Ok(Resolution::Duplicate { existing })
}
