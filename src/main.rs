use clap::Parser;
use dexsort::cli::{Cli, run_cli};
use dexsort::output::OutputFormatter;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run_cli(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&format!("An error occurred: {}", e));
            ExitCode::FAILURE
        }
    }
}
