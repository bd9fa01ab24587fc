//! Organizer configuration.
//!
//! This module loads the TOML document that drives classification and
//! filtering, and validates it once into a strongly typed [`Config`].
//!
//! # Configuration File Format
//!
//! ```toml
//! default_strategy = "extension"   # or "date"
//! date_format = "%Y-%m"
//! recursive = false
//! ignore = ["desktop.ini", "Thumbs.db"]
//! ignore_patterns = ["*.lock"]
//!
//! [mappings]
//! Documents = ["pdf", "txt"]
//! Images = ["jpg", "png"]
//! ```
//!
//! Mapping order is the order of the document; the first folder whose
//! extension list contains a file's extension wins.

use crate::classifier::{FolderMapping, Strategy, is_subfolder_path};
use crate::report::Reporter;
use chrono::Local;
use chrono::format::{Item, StrftimeItems};
use glob::Pattern;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file looked up in the current directory when none is given.
pub const LOCAL_CONFIG_FILE: &str = "dexsort.toml";

/// Date pattern used when the document does not set one.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m";

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("Invalid mapping for folder '{folder}': {reason}")]
    InvalidMapping { folder: String, reason: String },

    #[error("Invalid date format '{0}'")]
    InvalidDateFormat(String),

    #[error("Invalid glob pattern '{0}'")]
    InvalidGlobPattern(String),

    #[error("IO error reading configuration {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The document as written on disk, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawConfig {
    #[serde(default)]
    default_strategy: Strategy,

    #[serde(default)]
    date_format: Option<String>,

    #[serde(default)]
    recursive: bool,

    #[serde(default)]
    ignore: Vec<String>,

    #[serde(default)]
    ignore_patterns: Vec<String>,

    #[serde(default)]
    mappings: toml::Table,
}

/// Validated, read-only configuration handed to the organizer.
#[derive(Debug, Clone)]
pub struct Config {
    pub default_strategy: Strategy,
    pub date_format: String,
    pub recursive: bool,
    pub ignore: HashSet<String>,
    pub ignore_patterns: Vec<Pattern>,
    pub mappings: Vec<FolderMapping>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_strategy: Strategy::Extension,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            recursive: false,
            ignore: HashSet::new(),
            ignore_patterns: Vec::new(),
            mappings: Vec::new(),
        }
    }
}

impl Config {
    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if the file does not exist,
    /// `ConfigError::Io` if it cannot be read, and a validation error if the
    /// document is malformed (unknown strategy, bad mapping, bad pattern).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&content)
    }

    /// Loads a configuration file, substituting defaults on any failure.
    ///
    /// The failure is reported as a warning so the operator can see why the
    /// defaults were used.
    pub fn load_or_default<R: Reporter>(path: &Path, reporter: &R) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(ConfigError::ConfigNotFound(path)) => {
                reporter.warn(&format!(
                    "Config file {} not found. Using empty defaults.",
                    path.display()
                ));
                Self::default()
            }
            Err(e) => {
                reporter.warn(&format!("{}. Using empty defaults.", e));
                Self::default()
            }
        }
    }

    /// Finds the configuration file to use when none was given explicitly.
    ///
    /// Looks for `dexsort.toml` in the current directory, then
    /// `~/.config/dexsort/config.toml`.
    pub fn discover() -> Option<PathBuf> {
        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Some(local_config);
        }

        let home = std::env::var_os("HOME")?;
        let home_config = PathBuf::from(home)
            .join(".config")
            .join("dexsort")
            .join("config.toml");
        home_config.exists().then_some(home_config)
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig =
            toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let date_format = raw
            .date_format
            .unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string());
        validate_date_format(&date_format)?;

        let ignore_patterns = raw
            .ignore_patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut mappings = Vec::with_capacity(raw.mappings.len());
        for (folder, value) in raw.mappings {
            let invalid = |reason: &str| ConfigError::InvalidMapping {
                folder: folder.clone(),
                reason: reason.to_string(),
            };
            if !is_subfolder_path(&folder) {
                return Err(invalid("folder must be a relative path inside the directory"));
            }
            let list = value
                .as_array()
                .ok_or_else(|| invalid("expected a list of extensions"))?;
            let extensions = list
                .iter()
                .map(|ext| {
                    ext.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| invalid("extensions must be strings"))
                })
                .collect::<Result<Vec<_>, _>>()?;
            mappings.push(FolderMapping::new(folder.clone(), extensions));
        }

        Ok(Self {
            default_strategy: raw.default_strategy,
            date_format,
            recursive: raw.recursive,
            ignore: raw.ignore.into_iter().collect(),
            ignore_patterns,
            mappings,
        })
    }

    /// A starter configuration with the common folder layout.
    pub fn standard() -> Self {
        let table: &[(&str, &[&str])] = &[
            ("Images", &["png", "jpg", "jpeg", "gif", "webp", "svg", "bmp", "tiff", "ico", "heic"]),
            ("Audio", &["mp3", "wav", "ogg", "flac", "aac", "m4a", "wma"]),
            ("Videos", &["mp4", "mkv", "avi", "mov", "flv", "wmv", "webm", "3gp"]),
            ("Documents", &["pdf", "txt", "doc", "docx", "html", "htm", "md", "rtf", "odt"]),
            ("Archives", &["zip", "rar", "7z", "tar", "gz", "bz2", "xz"]),
            ("Code", &["py", "java", "c", "cpp", "h", "hpp", "js", "ts", "rs", "go", "sh", "json", "xml", "yaml", "yml", "toml"]),
            ("Spreadsheets", &["csv", "xls", "xlsx", "ods"]),
            ("Presentations", &["ppt", "pptx", "odp"]),
            ("Fonts", &["ttf", "otf", "woff", "woff2"]),
        ];

        Self {
            ignore: ["desktop.ini", "Thumbs.db", ".DS_Store"]
                .into_iter()
                .map(String::from)
                .collect(),
            mappings: table
                .iter()
                .map(|(folder, exts)| FolderMapping::new(*folder, exts.iter().copied()))
                .collect(),
            ..Self::default()
        }
    }

    /// Renders this configuration as a TOML document that [`Config::load`] accepts.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        let mut ignore: Vec<String> = self.ignore.iter().cloned().collect();
        ignore.sort();

        let mut mappings = toml::Table::new();
        for mapping in &self.mappings {
            let exts = mapping
                .extensions()
                .iter()
                .map(|ext| toml::Value::String(ext.clone()))
                .collect();
            mappings.insert(mapping.folder().to_string(), toml::Value::Array(exts));
        }

        let raw = RawConfig {
            default_strategy: self.default_strategy,
            date_format: Some(self.date_format.clone()),
            recursive: self.recursive,
            ignore,
            ignore_patterns: self
                .ignore_patterns
                .iter()
                .map(|p| p.as_str().to_string())
                .collect(),
            mappings,
        };

        toml::to_string_pretty(&raw).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Checks whether a file name is excluded by the ignore list or patterns.
    pub fn is_ignored(&self, file_name: &str) -> bool {
        self.ignore.contains(file_name)
            || self
                .ignore_patterns
                .iter()
                .any(|pattern| pattern.matches(file_name))
    }
}

/// Rejects strftime patterns chrono cannot render, so classification never
/// has to deal with a formatting failure.
fn validate_date_format(format: &str) -> Result<(), ConfigError> {
    if format.trim().is_empty()
        || StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
    {
        return Err(ConfigError::InvalidDateFormat(format.to_string()));
    }

    // Literal parts decide whether the bucket stays inside the directory.
    let sample = Local::now().format(format).to_string();
    if !is_subfolder_path(&sample) {
        return Err(ConfigError::InvalidDateFormat(format.to_string()));
    }
    Ok(())
}
