/// Persistent record of organize runs, used to undo them.
///
/// The history lives in a JSON file inside the organized directory and holds
/// at most [`MAX_BATCHES`] batches, oldest first. A missing or unreadable file
/// is treated as an empty history.
use crate::organizer::{OrganizeError, OrganizeResult};
use crate::report::Reporter;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the history file kept in each organized directory.
pub const HISTORY_FILE_NAME: &str = ".dexsort_history.json";

/// Number of batches retained; older ones are dropped on append.
pub const MAX_BATCHES: usize = 10;

/// A single file move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// Absolute path of the file before the move.
    pub src: PathBuf,
    /// Absolute path the file was moved to.
    pub dest: PathBuf,
}

/// All moves made by one organize run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub timestamp: DateTime<Utc>,
    pub moves: Vec<MoveRecord>,
}

impl Batch {
    /// Starts an empty batch stamped with the current time.
    pub fn new() -> Self {
        Self {
            timestamp: Utc::now(),
            moves: Vec::new(),
        }
    }

    pub fn record(&mut self, src: PathBuf, dest: PathBuf) {
        self.moves.push(MoveRecord { src, dest });
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

impl Default for Batch {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads and writes the history file of one directory.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    /// Store for the history file inside `dir`.
    pub fn for_directory(dir: &Path) -> Self {
        Self {
            path: dir.join(HISTORY_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads all batches, oldest first.
    ///
    /// A missing file yields an empty history. An unreadable or corrupt file
    /// is reported as a warning and also yields an empty history.
    pub fn load<R: Reporter>(&self, reporter: &R) -> Vec<Batch> {
        if !self.path.exists() {
            return Vec::new();
        }

        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                reporter.warn(&format!(
                    "Could not read history file {}: {}. Starting with empty history.",
                    self.path.display(),
                    e
                ));
                return Vec::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(batches) => batches,
            Err(e) => {
                reporter.warn(&format!(
                    "History file {} is corrupt ({}). Starting with empty history.",
                    self.path.display(),
                    e
                ));
                Vec::new()
            }
        }
    }

    /// Rewrites the history file with `batches`, keeping only the newest
    /// [`MAX_BATCHES`].
    pub fn save(&self, batches: &[Batch]) -> OrganizeResult<()> {
        let start = batches.len().saturating_sub(MAX_BATCHES);
        let json = serde_json::to_string_pretty(&batches[start..]).map_err(|e| {
            OrganizeError::HistoryWriteFailed {
                path: self.path.clone(),
                source: std::io::Error::other(e),
            }
        })?;

        fs::write(&self.path, json).map_err(|e| OrganizeError::HistoryWriteFailed {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Appends a batch and persists the capped history.
    pub fn append<R: Reporter>(&self, batch: Batch, reporter: &R) -> OrganizeResult<()> {
        let mut batches = self.load(reporter);
        batches.push(batch);
        self.save(&batches)
    }
}
