//! Output formatting and styling module.
//!
//! Provides a centralized interface for terminal output: colored status lines,
//! the per-folder summary table printed after a run, and the spinner shown while
//! watch mode waits for its next scan.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::time::Duration;

/// Manages all CLI output with consistent styling and formatting.
///
/// This struct provides methods for:
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - Summary tables with per-folder statistics
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dexsort::output::OutputFormatter;
    /// OutputFormatter::success("Directory organized");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a spinner that ticks on its own while the caller sleeps.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dexsort::output::OutputFormatter;
    /// let spinner = OutputFormatter::create_spinner("Waiting for new files");
    /// spinner.finish_and_clear();
    /// ```
    pub fn create_spinner(message: &str) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(120));
        spinner
    }

    /// Prints a summary table with file counts by destination folder.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dexsort::output::OutputFormatter;
    /// use std::collections::BTreeMap;
    ///
    /// let mut counts = BTreeMap::new();
    /// counts.insert("Documents".to_string(), 15);
    /// counts.insert("Images".to_string(), 8);
    /// OutputFormatter::summary_table(&counts, 23);
    /// ```
    pub fn summary_table(folder_counts: &BTreeMap<String, usize>, total_files: usize) {
        Self::header("SUMMARY");

        let max_folder_len = folder_counts
            .keys()
            .map(|name| name.len())
            .max()
            .unwrap_or(0)
            .max(6); // At least "Folder" width

        println!(
            "{:<width$} | {}",
            "Folder".bold(),
            "Files".bold(),
            width = max_folder_len
        );
        println!("{}", "-".repeat(max_folder_len + 10));

        for (folder, count) in folder_counts {
            println!(
                "{:<width$} | {} {}",
                folder,
                count.to_string().green(),
                plural_files(*count),
                width = max_folder_len
            );
        }

        println!("{}", "-".repeat(max_folder_len + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            plural_files(total_files),
            width = max_folder_len
        );
    }
}

fn plural_files(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}
