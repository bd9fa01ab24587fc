//! Removal of empty folders left behind after organizing or undoing.

use crate::report::Reporter;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// True for directories below the walk root whose name starts with a dot.
pub(crate) fn is_hidden_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry.file_name().to_string_lossy().starts_with('.')
}

/// Removes every empty, non-hidden directory below `root`, deepest first.
///
/// Hidden directories are neither removed nor descended into, and `root`
/// itself is always kept. Failures are reported and skipped. Returns the
/// directories that were removed.
pub fn remove_empty_dirs<R: Reporter>(root: &Path, reporter: &R) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| !is_hidden_dir(entry));

    for entry in walker {
        match entry {
            Ok(entry) if entry.file_type().is_dir() => dirs.push(entry.into_path()),
            Ok(_) => {}
            Err(e) => reporter.warn(&format!("Cleanup could not read an entry: {}", e)),
        }
    }

    // Pre-order walk: every child comes after its parent.
    let mut removed = Vec::new();
    for path in dirs.into_iter().rev() {
        let is_empty = match fs::read_dir(&path) {
            Ok(mut entries) => entries.next().is_none(),
            Err(e) => {
                reporter.warn(&format!("Cleanup could not list {}: {}", path.display(), e));
                continue;
            }
        };
        if !is_empty {
            continue;
        }

        match fs::remove_dir(&path) {
            Ok(()) => {
                reporter.info(&format!("Removed empty folder: {}", path.display()));
                removed.push(path);
            }
            Err(e) => {
                reporter.warn(&format!(
                    "Could not remove empty folder {}: {}",
                    path.display(),
                    e
                ));
            }
        }
    }

    removed
}
