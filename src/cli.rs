//! Command-line interface module for dexsort.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Configuration discovery
//! - One-shot and watch-mode organization
//! - Undo and config initialization

use crate::classifier::Strategy;
use crate::config::{Config, LOCAL_CONFIG_FILE};
use crate::organizer::{OrganizeError, OrganizeReport, Organizer, OrganizerOptions};
use crate::output::OutputFormatter;
use crate::report::{ConsoleReporter, Reporter};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Sort the files of a directory into folders by extension or date.
#[derive(Debug, Parser)]
#[command(name = "dexsort", version, about)]
pub struct Cli {
    /// Directory to organize
    #[arg(long, default_value = ".")]
    pub source: PathBuf,

    /// Organization strategy (overrides the config file)
    #[arg(long, value_enum)]
    pub strategy: Option<Strategy>,

    /// Report what would happen without touching any file
    #[arg(long)]
    pub dry_run: bool,

    /// Keep running and organize again every `--interval` seconds
    #[arg(long)]
    pub watch: bool,

    /// Seconds between runs in watch mode
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: u64,

    /// Also organize files inside subdirectories
    #[arg(long)]
    pub recursive: bool,

    /// Configuration file (defaults to ./dexsort.toml, then ~/.config/dexsort/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print every decision, not only warnings and errors
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Represents a CLI command to execute.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Revert the most recent organization of the source directory
    Undo,
    /// Write a starter configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Runs the CLI application with parsed arguments.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use dexsort::cli::{Cli, run_cli};
///
/// let cli = Cli::parse_from(["dexsort", "--source", "/path/to/directory", "--dry-run"]);
/// match run_cli(cli) {
///     Ok(()) => println!("Operation completed successfully"),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(cli: Cli) -> Result<(), String> {
    let reporter = ConsoleReporter::new(cli.verbose || cli.dry_run);

    if let Some(Command::Init { force }) = cli.command {
        let path = cli
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE));
        return write_starter_config(&path, force);
    }

    let config_path = cli.config.clone().or_else(Config::discover);
    let config = match &config_path {
        Some(path) => Config::load_or_default(path, &reporter),
        None => {
            reporter.warn("No config file found. Using empty defaults.");
            Config::default()
        }
    };

    let options = OrganizerOptions {
        dry_run: cli.dry_run,
        strategy: cli.strategy,
        recursive: cli.recursive.then_some(true),
        exclusions: config_path.into_iter().collect(),
    };
    let organizer =
        Organizer::new(&cli.source, config, options, reporter).map_err(|e| e.to_string())?;

    match cli.command {
        Some(Command::Undo) => undo_organization(&organizer),
        _ if cli.watch => watch_directory(&organizer, Duration::from_secs(cli.interval)),
        _ => organize_once(&organizer),
    }
}

/// Runs one organization pass and prints its summary.
fn organize_once<R: Reporter>(organizer: &Organizer<R>) -> Result<(), String> {
    OutputFormatter::info(&format!(
        "Organizing contents of: {}",
        organizer.source_dir().display()
    ));

    let report = organizer.organize().map_err(|e| e.to_string())?;
    print_organize_summary(organizer, &report);
    Ok(())
}

fn print_organize_summary<R: Reporter>(organizer: &Organizer<R>, report: &OrganizeReport) {
    if report.moved > 0 {
        OutputFormatter::summary_table(&report.per_folder, report.moved);
    }

    let summary = format!(
        "{} file(s) moved, {} duplicate(s) removed, {} failed",
        report.moved, report.duplicates_removed, report.failed
    );
    if organizer.is_dry_run() {
        OutputFormatter::dry_run_notice(&format!("{}. No files were modified.", summary));
    } else if report.failed > 0 {
        OutputFormatter::warning(&summary);
    } else {
        OutputFormatter::success(&summary);
    }
}

/// Organizes the directory repeatedly until Ctrl+C.
///
/// The interrupt is only honored between runs; a run that has started
/// always finishes.
fn watch_directory<R: Reporter>(organizer: &Organizer<R>, interval: Duration) -> Result<(), String> {
    let stop = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&stop);
    ctrlc::set_handler(move || handler_flag.store(true, Ordering::SeqCst))
        .map_err(|e| format!("Could not install Ctrl+C handler: {}", e))?;

    OutputFormatter::info(&format!(
        "Watching '{}' for changes... (Press Ctrl+C to stop)",
        organizer.source_dir().display()
    ));

    while !stop.load(Ordering::SeqCst) {
        match organizer.organize() {
            Ok(report) if report.moved > 0 || report.duplicates_removed > 0 => {
                print_organize_summary(organizer, &report);
            }
            Ok(_) => {}
            Err(e) => organizer.reporter().error(&e.to_string()),
        }

        let spinner = OutputFormatter::create_spinner("Waiting for new files");
        let deadline = Instant::now() + interval;
        while Instant::now() < deadline && !stop.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(200));
        }
        spinner.finish_and_clear();
    }

    OutputFormatter::info("Stopping watch mode.");
    Ok(())
}

/// Undoes the previous organization and reports what happened.
fn undo_organization<R: Reporter>(organizer: &Organizer<R>) -> Result<(), String> {
    OutputFormatter::info("Undoing previous organization...");

    match organizer.undo() {
        Ok(report) => {
            OutputFormatter::success(&format!("Undo complete! Restored: {}", report.restored));

            for (original, used) in &report.renamed {
                OutputFormatter::warning(&format!(
                    "{} was occupied; restored as {}",
                    original.display(),
                    used.display()
                ));
            }
            if !report.skipped.is_empty() {
                OutputFormatter::warning(&format!("Skipped: {}", report.skipped.len()));
            }
            if !report.failed.is_empty() {
                OutputFormatter::error(&format!("Failed: {}", report.failed.len()));
                for (path, reason) in &report.failed {
                    OutputFormatter::error(&format!("  {}: {}", path.display(), reason));
                }
            }
            Ok(())
        }
        Err(e @ OrganizeError::NoHistory { .. }) => {
            OutputFormatter::warning(&e.to_string());
            Ok(())
        }
        Err(e) => Err(e.to_string()),
    }
}

fn write_starter_config(path: &Path, force: bool) -> Result<(), String> {
    if path.exists() && !force {
        return Err(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        ));
    }

    let content = Config::standard()
        .to_toml_string()
        .map_err(|e| e.to_string())?;
    fs::write(path, content).map_err(|e| format!("Could not write {}: {}", path.display(), e))?;

    OutputFormatter::success(&format!("Wrote starter configuration to {}", path.display()));
    Ok(())
}
