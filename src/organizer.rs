/// Directory organization: scan, classify, place, record, clean up.
///
/// An [`Organizer`] is bound to one source directory and one set of options
/// for its lifetime. Each call to [`Organizer::organize`] runs to completion
/// and never aborts because a single file failed.
use crate::classifier::{Strategy, classify};
use crate::cleanup::{is_hidden_dir, remove_empty_dirs};
use crate::config::Config;
use crate::history::{Batch, HistoryStore};
use crate::report::Reporter;
use crate::resolver::{Resolution, resolve};
use crate::undo::{UndoReport, undo_latest};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Extensions of files that are still being downloaded or written.
pub const PARTIAL_DOWNLOAD_EXTENSIONS: &[&str] =
    &["crdownload", "part", "partial", "tmp", "download"];

/// Errors that can occur while organizing or undoing.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// The directory to organize does not exist or is not a directory.
    #[error("Source directory not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    /// The directory listing could not be read.
    #[error("Failed to read directory {}: {source}", path.display())]
    ReadDirFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A file's content could not be hashed.
    #[error("Failed to hash {}: {source}", path.display())]
    Hash {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to create a destination folder.
    #[error("Failed to create directory {}: {source}", path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A non-directory already occupies the destination folder's name.
    #[error("Cannot use {} as a folder: a file with that name exists", path.display())]
    DestinationNotADirectory { path: PathBuf },

    /// Failed to move a file.
    #[error("Failed to move {} to {}: {error}", from.display(), to.display())]
    FileMoveFailure {
        from: PathBuf,
        to: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Failed to delete a duplicate file.
    #[error("Failed to delete {}: {source}", path.display())]
    DeleteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to write the history file.
    #[error("Failed to write history file {}: {source}", path.display())]
    HistoryWriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Undo was requested but no batch is recorded.
    #[error("No previous organization found to undo in {}", path.display())]
    NoHistory { path: PathBuf },
}

/// Result type for organize and undo operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Options fixed for the lifetime of an [`Organizer`].
#[derive(Debug, Clone, Default)]
pub struct OrganizerOptions {
    /// Compute and report decisions without touching the filesystem.
    pub dry_run: bool,
    /// Overrides the configured default strategy.
    pub strategy: Option<Strategy>,
    /// Overrides the configured `recursive` flag.
    pub recursive: Option<bool>,
    /// Files that must never be moved, such as the loaded config file.
    pub exclusions: Vec<PathBuf>,
}

/// Outcome of one organize run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizeReport {
    /// Files moved (or, in dry-run, that would be moved).
    pub moved: usize,
    /// Source files deleted because an identical file already existed.
    pub duplicates_removed: usize,
    /// Files that could not be placed.
    pub failed: usize,
    /// Moved files per destination folder.
    pub per_folder: BTreeMap<String, usize>,
    /// Empty folders removed by the cleanup pass.
    pub removed_dirs: Vec<PathBuf>,
}

/// Sorts the files of one directory into subfolders.
pub struct Organizer<R: Reporter> {
    source_dir: PathBuf,
    config: Config,
    strategy: Strategy,
    dry_run: bool,
    recursive: bool,
    exclusions: HashSet<PathBuf>,
    history: HistoryStore,
    reporter: R,
}

impl<R: Reporter> Organizer<R> {
    /// Creates an organizer for `source_dir`.
    ///
    /// The directory is resolved to an absolute path. The history file and
    /// every path in `options.exclusions` are excluded from scanning.
    ///
    /// # Errors
    ///
    /// Returns `OrganizeError::SourceNotFound` if `source_dir` is missing or
    /// not a directory.
    pub fn new(
        source_dir: &Path,
        config: Config,
        options: OrganizerOptions,
        reporter: R,
    ) -> OrganizeResult<Self> {
        let source_dir = match fs::canonicalize(source_dir) {
            Ok(path) if path.is_dir() => path,
            _ => {
                return Err(OrganizeError::SourceNotFound {
                    path: source_dir.to_path_buf(),
                });
            }
        };

        let history = HistoryStore::for_directory(&source_dir);
        let mut exclusions: HashSet<PathBuf> = options
            .exclusions
            .iter()
            .map(|path| fs::canonicalize(path).unwrap_or_else(|_| path.clone()))
            .collect();
        exclusions.insert(history.path().to_path_buf());

        Ok(Self {
            strategy: options.strategy.unwrap_or(config.default_strategy),
            recursive: options.recursive.unwrap_or(config.recursive),
            dry_run: options.dry_run,
            source_dir,
            config,
            exclusions,
            history,
            reporter,
        })
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Organizes the source directory once.
    ///
    /// Per-file failures are reported and counted, never propagated. A batch
    /// is recorded only when at least one file moved outside dry-run.
    ///
    /// # Errors
    ///
    /// Fails only when the source directory itself cannot be listed.
    pub fn organize(&self) -> OrganizeResult<OrganizeReport> {
        self.reporter.info(&format!(
            "Starting organization in '{}' (Strategy: {}, Dry-Run: {})",
            self.source_dir.display(),
            self.strategy,
            self.dry_run
        ));

        let candidates = self.scan()?;
        let mut report = OrganizeReport::default();
        let mut batch = Batch::new();

        for file_path in candidates {
            let folder = classify(&file_path, self.strategy, &self.config);
            let dest_folder = self.source_dir.join(&folder);

            match resolve(&file_path, &dest_folder, self.dry_run, &self.reporter) {
                Ok(Resolution::Placed(final_path)) => {
                    report.moved += 1;
                    *report.per_folder.entry(folder).or_insert(0) += 1;
                    batch.record(file_path, final_path);
                }
                Ok(Resolution::Duplicate { .. }) => report.duplicates_removed += 1,
                Ok(Resolution::AlreadyPlaced) => {}
                Err(e) => {
                    self.reporter.error(&e.to_string());
                    report.failed += 1;
                }
            }
        }

        if self.dry_run {
            return Ok(report);
        }

        if !batch.is_empty()
            && let Err(e) = self.history.append(batch, &self.reporter)
        {
            self.reporter
                .error(&format!("{}; this run cannot be undone", e));
        }

        report.removed_dirs = remove_empty_dirs(&self.source_dir, &self.reporter);
        Ok(report)
    }

    /// Reverts the most recent recorded batch.
    ///
    /// # Errors
    ///
    /// Returns `OrganizeError::NoHistory` when nothing has been recorded.
    pub fn undo(&self) -> OrganizeResult<UndoReport> {
        undo_latest(&self.source_dir, &self.history, self.dry_run, &self.reporter)
    }

    /// Lists the files eligible for organizing, in a stable order.
    fn scan(&self) -> OrganizeResult<Vec<PathBuf>> {
        let read_err = |source| OrganizeError::ReadDirFailed {
            path: self.source_dir.clone(),
            source,
        };

        let mut files = Vec::new();
        if self.recursive {
            let walker = WalkDir::new(&self.source_dir)
                .min_depth(1)
                .into_iter()
                .filter_entry(|entry| !is_hidden_dir(entry));
            for entry in walker {
                match entry {
                    Ok(entry) if entry.file_type().is_file() => {
                        files.push(entry.into_path());
                    }
                    Ok(_) => {}
                    Err(e) => self.reporter.warn(&format!("Skipping entry: {}", e)),
                }
            }
        } else {
            let entries = fs::read_dir(&self.source_dir).map_err(read_err)?;
            for entry in entries {
                match entry {
                    Ok(entry) => {
                        if entry.file_type().is_ok_and(|t| t.is_file()) {
                            files.push(entry.path());
                        }
                    }
                    Err(e) => self.reporter.warn(&format!("Skipping entry: {}", e)),
                }
            }
        }

        files.retain(|path| self.should_organize(path));
        files.sort();
        Ok(files)
    }

    /// Applies the ignore list, self-exclusions and the partial-download filter.
    fn should_organize(&self, path: &Path) -> bool {
        if self.exclusions.contains(path) {
            return false;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        if self.config.is_ignored(&file_name) {
            self.reporter
                .info(&format!("Skipping '{}' (ignored)", file_name));
            return false;
        }

        if is_partial_download(path) {
            self.reporter
                .info(&format!("Skipping '{}' (download in progress)", file_name));
            return false;
        }

        true
    }
}

/// True if the file's extension marks an unfinished download.
pub fn is_partial_download(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| PARTIAL_DOWNLOAD_EXTENSIONS.contains(&ext.as_str()))
}
