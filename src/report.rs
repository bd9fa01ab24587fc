//! Operator-facing reporting channel.
//!
//! Every recovered failure (unreadable file, failed move, corrupt history,
//! cleanup errors) is surfaced through a [`Reporter`] owned by the caller of
//! the organizer, so nothing in the library writes to a global logger.

use crate::output::OutputFormatter;
use std::cell::RefCell;
use std::fmt;

/// Severity of a reported message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Info => write!(f, "INFO"),
            Level::Warning => write!(f, "WARN"),
            Level::Error => write!(f, "ERROR"),
        }
    }
}

/// Sink for messages produced while organizing or undoing.
pub trait Reporter {
    /// Records a message at the given severity.
    fn report(&self, level: Level, message: &str);

    fn info(&self, message: &str) {
        self.report(Level::Info, message);
    }

    fn warn(&self, message: &str) {
        self.report(Level::Warning, message);
    }

    fn error(&self, message: &str) {
        self.report(Level::Error, message);
    }
}

impl<R: Reporter + ?Sized> Reporter for &R {
    fn report(&self, level: Level, message: &str) {
        (**self).report(level, message);
    }
}

/// Writes messages to the terminal through [`OutputFormatter`].
///
/// Info lines are only printed when `verbose` is set; warnings and errors
/// always are.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter {
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, level: Level, message: &str) {
        match level {
            Level::Info if self.verbose => OutputFormatter::info(message),
            Level::Info => {}
            Level::Warning => OutputFormatter::warning(message),
            Level::Error => OutputFormatter::error(message),
        }
    }
}

/// Keeps every message in memory so callers can inspect them afterwards.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    entries: RefCell<Vec<(Level, String)>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all captured entries, oldest first.
    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries.borrow().clone()
    }

    /// Returns the messages captured at exactly `level`.
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    /// True if any captured message at `level` contains `needle`.
    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.entries
            .borrow()
            .iter()
            .any(|(l, m)| *l == level && m.contains(needle))
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, level: Level, message: &str) {
        self.entries.borrow_mut().push((level, message.to_string()));
    }
}
