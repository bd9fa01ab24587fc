//! dexsort - sort the files of a directory into subfolders
//!
//! This library classifies the files of a single directory by extension or
//! modification date, moves them into matching subfolders while removing
//! exact duplicates, records every run so it can be undone, and removes the
//! empty folders left behind.

pub mod classifier;
pub mod cleanup;
pub mod cli;
pub mod config;
pub mod hasher;
pub mod history;
pub mod organizer;
pub mod output;
pub mod report;
pub mod resolver;
pub mod undo;

pub use classifier::{FolderMapping, Strategy, classify};
pub use config::{Config, ConfigError};
pub use history::{Batch, HistoryStore, MoveRecord};
pub use organizer::{OrganizeError, OrganizeReport, OrganizeResult, Organizer, OrganizerOptions};
pub use report::{ConsoleReporter, Level, MemoryReporter, Reporter};
pub use resolver::Resolution;
pub use undo::UndoReport;

pub use cli::{Cli, run_cli};
