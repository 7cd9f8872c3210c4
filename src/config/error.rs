//! Configuration errors.

use super::ENV_FILE;

/// Startup configuration errors.
///
/// Every variant is fatal for the bot: the entry point reports it and exits.
/// Messages never contain credential values.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(
        "BOT_TOKEN environment variable must be set in format '123456:abcdefghijklmnopqrstuvwxyz'"
    )]
    MissingOrMalformedBotToken,

    #[error("SESSION_STRING environment variable must be set with a valid string")]
    MissingOrPlaceholderSessionString,

    #[error("{var} must be an integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
}

impl ConfigError {
    /// Name of the environment variable that failed validation.
    #[must_use]
    pub fn var(&self) -> &'static str {
        match self {
            Self::MissingOrMalformedBotToken => "BOT_TOKEN",
            Self::MissingOrPlaceholderSessionString => "SESSION_STRING",
            Self::InvalidNumber { var, .. } => *var,
        }
    }

    /// How to fix the failing variable, one line per deployment method.
    #[must_use]
    pub fn guidance(&self) -> [String; 2] {
        let var = self.var();
        [
            format!("For local dev: Set {var} in {ENV_FILE} file"),
            format!("For hosted deployments: Set {var} in your platform's environment variables"),
        ]
    }
}
