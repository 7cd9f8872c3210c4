//! Saver Bot - Main Entry Point
//!
//! Loads and validates the bot configuration before anything else starts.
//! Invalid credentials stop the process with exit status 1.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use saver_bot::config::{self, ConfigError, ENV_FILE, Settings};

/// Exit status for a missing or invalid setting.
const CONFIG_ERROR_STATUS: u8 = 1;

/// Logged when the API ID or hash is one of the built-in defaults.
const DEFAULT_CREDENTIALS_WARNING: &str =
    "API_ID or API_HASH matches the built-in default; set your own from https://my.telegram.org";

/// Telegram bot for saving restricted content.
#[derive(Parser, Debug)]
#[command(name = "saver_bot")]
#[command(about = "Load and validate the saver bot configuration")]
#[command(version)]
struct Args {
    /// Path to the env file for local development.
    #[arg(long, default_value = ENV_FILE)]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Print the loaded settings (credentials redacted) as JSON and exit.
    #[arg(long)]
    print: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level);

    let settings = match config::load(&args.env_file) {
        Ok(settings) => settings,
        Err(e) => return config_failure(&mut io::stdout().lock(), &e),
    };

    match run(&args, &settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args, settings: &Settings) -> Result<()> {
    if args.print {
        let json = serde_json::to_string_pretty(&settings.summary())
            .context("Failed to serialize settings summary")?;
        println!("{json}");
        return Ok(());
    }

    if settings.uses_default_api_credentials() {
        warn!("{DEFAULT_CREDENTIALS_WARNING}");
    }

    let summary = settings.summary();
    info!(
        "Configuration loaded (api_id: {}, bot_id: {:?})",
        summary.api_id, summary.bot_id
    );
    info!(
        "Downloads: {} concurrent, batch size {}, flood wait delay {:?}",
        settings.max_concurrent_downloads,
        settings.batch_size,
        settings.flood_wait_delay()
    );

    Ok(())
}

/// Initializes the logging subsystem.
fn init_logging(level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Reports a configuration error to `out` and picks the exit status.
fn config_failure(out: &mut impl Write, err: &ConfigError) -> ExitCode {
    // Nothing better to do if stdout itself is gone.
    let _ = report_config_error(out, err);
    ExitCode::from(exit_status(err))
}

fn exit_status(err: &ConfigError) -> u8 {
    match err {
        ConfigError::MissingOrMalformedBotToken
        | ConfigError::MissingOrPlaceholderSessionString
        | ConfigError::InvalidNumber { .. } => CONFIG_ERROR_STATUS,
    }
}

/// Writes the failed variable and how to set it for each deployment method.
fn report_config_error(out: &mut impl Write, err: &ConfigError) -> io::Result<()> {
    writeln!(out, "Error: {err}")?;
    for line in err.guidance() {
        writeln!(out, "{line}")?;
    }
    out.flush()
}
