//! Configuration module for the saver bot.
//!
//! Handles merging the optional local env file and loading the validated
//! [`Settings`] record from the process environment.

mod env_file;
mod error;
mod settings;

use std::path::Path;

use tracing::{info, warn};

pub use env_file::{EnvFileOutcome, merge_into_env, read_entries};
pub use error::ConfigError;
pub use settings::{
    DEFAULT_API_HASH, DEFAULT_API_ID, DEFAULT_BATCH_SIZE, DEFAULT_FLOOD_WAIT_DELAY,
    DEFAULT_MAX_CONCURRENT_DOWNLOADS, Settings, SettingsSummary,
};

/// Local env file read at startup when present.
pub const ENV_FILE: &str = "config.env";

/// Dummy value shipped in example config files.
pub const PLACEHOLDER: &str = "xxxxxxxxxxxxxxxxxxxxxxx";

/// Merges `env_file` into the environment, then validates and builds [`Settings`].
///
/// # Errors
///
/// Returns an error if a required credential is missing or malformed, or an
/// optional numeric setting does not parse.
pub fn load(env_file: impl AsRef<Path>) -> Result<Settings, ConfigError> {
    match merge_into_env(env_file) {
        EnvFileOutcome::Loaded(path) => info!("Using variables from {}", path.display()),
        EnvFileOutcome::Partial {
            path,
            skipped_lines,
        } => warn!(
            "Using variables from {}; skipped {} malformed line(s)",
            path.display(),
            skipped_lines
        ),
        EnvFileOutcome::Skipped => {}
    }

    Settings::from_env()
}
