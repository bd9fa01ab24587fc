//! File classification into target folder names.
//!
//! A file is mapped to a folder either by looking its extension up in the
//! configured mappings or by bucketing its modification time.
//!
//! # Examples
//!
//! ```
//! use dexsort::classifier::{FolderMapping, Strategy, classify};
//! use dexsort::config::Config;
//! use std::path::Path;
//!
//! let config = Config {
//!     mappings: vec![FolderMapping::new("Images", ["jpg", "png"])],
//!     ..Config::default()
//! };
//! assert_eq!(classify(Path::new("photo.JPG"), Strategy::Extension, &config), "Images");
//! assert_eq!(classify(Path::new("notes.txt"), Strategy::Extension, &config), "Others");
//! ```

use crate::config::Config;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};
use std::fs;
use std::path::{Component, Path};

/// Folder used for files no rule claims.
pub const FALLBACK_FOLDER: &str = "Others";

/// How files are assigned to folders. Chosen once per organizer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Look the lowercase extension up in the folder mappings.
    #[default]
    Extension,
    /// Bucket by last-modified time using the configured date pattern.
    Date,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Extension => write!(f, "extension"),
            Strategy::Date => write!(f, "date"),
        }
    }
}

/// One folder and the extensions that belong in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderMapping {
    folder: String,
    extensions: Vec<String>,
}

impl FolderMapping {
    /// Creates a mapping, normalizing extensions to lowercase without a leading dot.
    pub fn new<S: AsRef<str>>(
        folder: impl Into<String>,
        extensions: impl IntoIterator<Item = S>,
    ) -> Self {
        let mut normalized: Vec<String> = Vec::new();
        for ext in extensions {
            let ext = ext.as_ref().trim().trim_start_matches('.').to_lowercase();
            if !ext.is_empty() && !normalized.contains(&ext) {
                normalized.push(ext);
            }
        }
        Self {
            folder: folder.into(),
            extensions: normalized,
        }
    }

    pub fn folder(&self) -> &str {
        &self.folder
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// True if `ext` (already lowercase, no dot) belongs to this folder.
    pub fn contains(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e == ext)
    }
}

/// Returns the folder name `file_path` belongs in. Never fails.
///
/// The result is always a relative path below the organized directory; any
/// other name falls back to [`FALLBACK_FOLDER`].
pub fn classify(file_path: &Path, strategy: Strategy, config: &Config) -> String {
    let folder = match strategy {
        Strategy::Extension => extension_folder(file_path, config),
        Strategy::Date => date_folder(file_path, &config.date_format),
    };
    if is_subfolder_path(&folder) {
        folder
    } else {
        FALLBACK_FOLDER.to_string()
    }
}

/// True if `folder` names a path strictly inside the directory it is joined to.
pub(crate) fn is_subfolder_path(folder: &str) -> bool {
    !folder.trim().is_empty()
        && Path::new(folder)
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
}

fn extension_folder(file_path: &Path, config: &Config) -> String {
    let ext = file_path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if ext.is_empty() {
        return FALLBACK_FOLDER.to_string();
    }

    config
        .mappings
        .iter()
        .find(|mapping| mapping.contains(&ext))
        .map(|mapping| mapping.folder().to_string())
        .unwrap_or_else(|| FALLBACK_FOLDER.to_string())
}

fn date_folder(file_path: &Path, date_format: &str) -> String {
    let Ok(modified) = fs::metadata(file_path).and_then(|m| m.modified()) else {
        return FALLBACK_FOLDER.to_string();
    };

    let mut folder = String::new();
    let local: DateTime<Local> = modified.into();
    // An unrenderable pattern yields fmt::Error instead of a panic here.
    if write!(folder, "{}", local.format(date_format)).is_err() {
        return FALLBACK_FOLDER.to_string();
    }
    folder
}
