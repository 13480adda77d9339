//! `tcg-companion`: identifies trading card scans in `Errors` folders and
//! files them in their set folder under the card's name.

mod cli;
mod logging;
mod report;

use crate::cli::{Cli, Paths};
use crate::report::ConsoleReporter;
use clap::Parser;
use std::io::{self, IsTerminal};
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;
use tcg_config::{Config, LogLevel};
use tcg_library::{Options, process_directory};
use tcg_recognize::{OpenAiClient, OpenAiSettings};

const BANNER: &str = "TCG Companion is running!";
const MISSING_API_KEY: &str = "No API key found. Please ensure you have your OpenAI API key listed in tcg.cfg";

fn main() -> ExitCode {
    let paths = Cli::parse().resolve(&cli::executable_dir());

    let config = match Config::load(&paths.config) {
        Ok(config) => config,
        Err(e) => {
            logging::init(&paths.log_file, LogLevel::default());
            tracing::error!(path = %paths.config.display(), error = ?e, "Unable to load configuration");
            println!("Unable to load {}: {}", paths.config.display(), &*e);
            return fatal(&paths);
        },
    };
    logging::init(&paths.log_file, config.log_level);
    tracing::info!(base = %paths.base_dir.display(), level = %config.log_level, "Starting");
    if !paths.config.is_file() {
        tracing::warn!(path = %paths.config.display(), "Configuration file not found");
        println!("Configuration file '{}' not found.", paths.config.display());
    }
    println!("{BANNER}");

    let api_key = match config.require_api_key() {
        Ok(key) => key.to_string(),
        Err(_) => {
            tracing::error!("{MISSING_API_KEY}");
            println!("{MISSING_API_KEY}");
            return fatal(&paths);
        },
    };

    let client = match OpenAiClient::new(OpenAiSettings {
        api_key,
        endpoint: config.endpoint.clone(),
        model: config.model.clone(),
        max_tokens: config.max_tokens,
        timeout: Duration::from_secs(config.timeout_secs),
    }) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = ?e, "Unable to create recognition client");
            println!("Unable to start: {}", &*e);
            return fatal(&paths);
        },
    };

    let log_name = log_name(&paths.log_file);
    let mut reporter = ConsoleReporter::stdout(log_name);
    let options = Options { cleanup: config.cleanup };
    if let Err(e) = process_directory(&paths.base_dir, &client, &options, &mut reporter) {
        tracing::error!(error = ?e, "Processing failed");
        println!("Unable to process {}: {}", paths.base_dir.display(), &*e);
        return fatal(&paths);
    }

    println!("Processing complete. Press Enter to exit.");
    pause(&paths);
    ExitCode::SUCCESS
}

fn fatal(paths: &Paths) -> ExitCode {
    println!("Press Enter to exit.");
    pause(paths);
    ExitCode::FAILURE
}

/// Waits for Enter, unless disabled or there is nobody to press it.
fn pause(paths: &Paths) {
    let stdin = io::stdin();
    if paths.pause && stdin.is_terminal() {
        _ = stdin.read_line(&mut String::new());
    }
}

fn log_name(log_file: &Path) -> String {
    log_file.file_name().map_or_else(|| log_file.display().to_string(), |name| name.to_string_lossy().into_owned())
}
