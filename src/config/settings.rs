//! Validated bot settings and their environment option table.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use super::{ConfigError, PLACEHOLDER};

/// Default Telegram API ID.
pub const DEFAULT_API_ID: i32 = 6;

/// Default Telegram API hash. Deployments are expected to supply their own.
pub const DEFAULT_API_HASH: &str = PLACEHOLDER;

/// Default number of downloads allowed to run at once.
pub const DEFAULT_MAX_CONCURRENT_DOWNLOADS: usize = 3;

/// Default number of messages processed per batch.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Default delay in seconds after a Telegram flood wait.
pub const DEFAULT_FLOOD_WAIT_DELAY: u64 = 3;

/// Settings for the whole process, built once at startup.
///
/// Consumers receive this by reference; nothing mutates it after construction.
#[derive(Debug)]
pub struct Settings {
    /// Telegram API ID (obtain from <https://my.telegram.org>).
    pub api_id: i32,

    /// Telegram API hash (obtain from <https://my.telegram.org>).
    pub api_hash: String,

    /// Bot API token in `id:secret` form.
    pub bot_token: SecretString,

    /// Exported user session.
    pub session_string: SecretString,

    /// When the settings were constructed.
    pub start_time: DateTime<Utc>,

    /// Downloads allowed to run at once.
    pub max_concurrent_downloads: usize,

    /// Messages handled per batch.
    pub batch_size: usize,

    /// Seconds to back off after a flood wait.
    pub flood_wait_delay: u64,
}

impl Settings {
    /// Builds settings from the process environment.
    ///
    /// # Errors
    ///
    /// See [`Settings::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary variable source.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns an error if `BOT_TOKEN` is missing or does not contain exactly
    /// one `:`, if `SESSION_STRING` is missing or still the placeholder, or if
    /// an optional numeric variable is not an integer.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let bot_token = get("BOT_TOKEN")
            .filter(|token| is_valid_bot_token(token))
            .ok_or(ConfigError::MissingOrMalformedBotToken)?;

        let session_string = get("SESSION_STRING")
            .filter(|session| session != PLACEHOLDER)
            .ok_or(ConfigError::MissingOrPlaceholderSessionString)?;

        let api_id = parse_or(get("API_ID"), "API_ID", DEFAULT_API_ID)?;
        let api_hash = get("API_HASH").unwrap_or_else(|| DEFAULT_API_HASH.to_owned());
        let max_concurrent_downloads = parse_or(
            get("MAX_CONCURRENT_DOWNLOADS"),
            "MAX_CONCURRENT_DOWNLOADS",
            DEFAULT_MAX_CONCURRENT_DOWNLOADS,
        )?;
        let batch_size = parse_or(get("BATCH_SIZE"), "BATCH_SIZE", DEFAULT_BATCH_SIZE)?;
        let flood_wait_delay = parse_or(
            get("FLOOD_WAIT_DELAY"),
            "FLOOD_WAIT_DELAY",
            DEFAULT_FLOOD_WAIT_DELAY,
        )?;

        Ok(Self {
            api_id,
            api_hash,
            bot_token: SecretString::from(bot_token),
            session_string: SecretString::from(session_string),
            start_time: Utc::now(),
            max_concurrent_downloads,
            batch_size,
            flood_wait_delay,
        })
    }

    /// Flood wait back-off as a [`Duration`].
    #[must_use]
    pub fn flood_wait_delay(&self) -> Duration {
        Duration::from_secs(self.flood_wait_delay)
    }

    /// Time elapsed since the settings were built.
    #[must_use]
    pub fn uptime(&self) -> Duration {
        (Utc::now() - self.start_time).to_std().unwrap_or_default()
    }

    /// Numeric bot ID from the token prefix, if it is a number.
    #[must_use]
    pub fn bot_id(&self) -> Option<i64> {
        self.bot_token
            .expose_secret()
            .split_once(':')
            .and_then(|(id, _)| id.parse().ok())
    }

    /// Whether the API ID or hash matches a built-in default, whether it was
    /// set explicitly or not.
    #[must_use]
    pub fn uses_default_api_credentials(&self) -> bool {
        self.api_id == DEFAULT_API_ID || self.api_hash == DEFAULT_API_HASH
    }

    /// Log-safe view of the settings.
    #[must_use]
    pub fn summary(&self) -> SettingsSummary {
        SettingsSummary {
            api_id: self.api_id,
            api_hash: redact(&self.api_hash),
            bot_id: self.bot_id(),
            session_string: redact(self.session_string.expose_secret()),
            start_time: self.start_time,
            max_concurrent_downloads: self.max_concurrent_downloads,
            batch_size: self.batch_size,
            flood_wait_delay_secs: self.flood_wait_delay,
        }
    }
}

/// Settings with every credential redacted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettingsSummary {
    pub api_id: i32,
    pub api_hash: String,
    pub bot_id: Option<i64>,
    pub session_string: String,
    pub start_time: DateTime<Utc>,
    pub max_concurrent_downloads: usize,
    pub batch_size: usize,
    pub flood_wait_delay_secs: u64,
}

/// A bot token must look like `id:secret`, with exactly one separator.
fn is_valid_bot_token(token: &str) -> bool {
    token.matches(':').count() == 1
}

fn parse_or<T: FromStr>(
    value: Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { var, value: raw }),
    }
}

fn redact(secret: &str) -> String {
    format!("*** ({} chars)", secret.chars().count())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serial_test::serial;

    use super::*;

    const TOKEN: &str = "123456:abcXYZ";
    const SESSION: &str = "realSessionValue123";

    fn load(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    fn minimal() -> Settings {
        load(&[("BOT_TOKEN", TOKEN), ("SESSION_STRING", SESSION)]).unwrap()
    }

    #[test]
    fn test_defaults() {
        let settings = minimal();

        assert_eq!(settings.api_id, 6);
        assert_eq!(settings.api_hash, DEFAULT_API_HASH);
        assert_eq!(settings.max_concurrent_downloads, 3);
        assert_eq!(settings.batch_size, 10);
        assert_eq!(settings.flood_wait_delay, 3);
        assert_eq!(settings.flood_wait_delay(), Duration::from_secs(3));
        assert_eq!(settings.bot_token.expose_secret(), TOKEN);
        assert_eq!(settings.session_string.expose_secret(), SESSION);
        assert!(settings.uses_default_api_credentials());
    }

    #[test]
    fn test_overrides() {
        let settings = load(&[
            ("BOT_TOKEN", TOKEN),
            ("SESSION_STRING", SESSION),
            ("API_ID", "987654"),
            ("API_HASH", "0123456789abcdef"),
            ("MAX_CONCURRENT_DOWNLOADS", "8"),
            ("BATCH_SIZE", " 50 "),
            ("FLOOD_WAIT_DELAY", "15"),
        ])
        .unwrap();

        assert_eq!(settings.api_id, 987_654);
        assert_eq!(settings.api_hash, "0123456789abcdef");
        assert_eq!(settings.max_concurrent_downloads, 8);
        assert_eq!(settings.batch_size, 50);
        assert_eq!(settings.flood_wait_delay, 15);
        assert!(!settings.uses_default_api_credentials());
    }

    #[test]
    fn test_explicit_default_api_id_still_flagged() {
        let settings = load(&[
            ("BOT_TOKEN", TOKEN),
            ("SESSION_STRING", SESSION),
            ("API_ID", "6"),
            ("API_HASH", "0123456789abcdef"),
        ])
        .unwrap();
        assert!(settings.uses_default_api_credentials());
    }

    #[test]
    fn test_missing_bot_token() {
        let result = load(&[("SESSION_STRING", SESSION)]);
        assert!(matches!(result, Err(ConfigError::MissingOrMalformedBotToken)));

        let result = load(&[("BOT_TOKEN", ""), ("SESSION_STRING", SESSION)]);
        assert!(matches!(result, Err(ConfigError::MissingOrMalformedBotToken)));
    }

    #[test]
    fn test_bot_token_separator_count() {
        for token in ["12345", "12:34:56", "abc", "::"] {
            let result = load(&[("BOT_TOKEN", token), ("SESSION_STRING", SESSION)]);
            assert!(
                matches!(result, Err(ConfigError::MissingOrMalformedBotToken)),
                "{token} should be rejected"
            );
        }

        for token in ["12345:abc", ":", "id:"] {
            assert!(
                load(&[("BOT_TOKEN", token), ("SESSION_STRING", SESSION)]).is_ok(),
                "{token} should be accepted"
            );
        }
    }

    #[test]
    fn test_bot_token_checked_before_session() {
        let result = load(&[("BOT_TOKEN", "bad")]);
        assert!(matches!(result, Err(ConfigError::MissingOrMalformedBotToken)));
    }

    #[test]
    fn test_session_string_rejected() {
        let result = load(&[("BOT_TOKEN", TOKEN)]);
        assert!(matches!(
            result,
            Err(ConfigError::MissingOrPlaceholderSessionString)
        ));

        let result = load(&[("BOT_TOKEN", TOKEN), ("SESSION_STRING", PLACEHOLDER)]);
        assert!(matches!(
            result,
            Err(ConfigError::MissingOrPlaceholderSessionString)
        ));
    }

    #[test]
    fn test_session_placeholder_match_is_exact() {
        let padded = format!(" {PLACEHOLDER}");
        let settings = load(&[
            ("BOT_TOKEN", TOKEN),
            ("SESSION_STRING", padded.as_str()),
        ])
        .unwrap();
        assert_eq!(settings.session_string.expose_secret(), padded);
    }

    #[test]
    fn test_invalid_number() {
        let result = load(&[
            ("BOT_TOKEN", TOKEN),
            ("SESSION_STRING", SESSION),
            ("BATCH_SIZE", "lots"),
        ]);
        match result {
            Err(ConfigError::InvalidNumber { var, value }) => {
                assert_eq!(var, "BATCH_SIZE");
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let result = load(&[
            ("BOT_TOKEN", TOKEN),
            ("SESSION_STRING", SESSION),
            ("MAX_CONCURRENT_DOWNLOADS", "-1"),
        ]);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidNumber {
                var: "MAX_CONCURRENT_DOWNLOADS",
                ..
            })
        ));
    }

    #[test]
    fn test_empty_optional_uses_default() {
        let settings = load(&[
            ("BOT_TOKEN", TOKEN),
            ("SESSION_STRING", SESSION),
            ("API_HASH", ""),
            ("FLOOD_WAIT_DELAY", ""),
        ])
        .unwrap();
        assert_eq!(settings.api_hash, DEFAULT_API_HASH);
        assert_eq!(settings.flood_wait_delay, DEFAULT_FLOOD_WAIT_DELAY);
    }

    #[test]
    fn test_bot_id() {
        let settings = minimal();
        assert_eq!(settings.bot_id(), Some(123_456));

        let settings = load(&[("BOT_TOKEN", "name:abc"), ("SESSION_STRING", SESSION)])
            .unwrap();
        assert_eq!(settings.bot_id(), None);
    }

    #[test]
    fn test_summary_hides_secrets() {
        let settings = minimal();
        let summary = settings.summary();

        assert_eq!(summary.bot_id, Some(123_456));
        assert_eq!(summary.session_string, "*** (19 chars)");

        let json = serde_json::to_string(&summary).unwrap();
        assert!(!json.contains("abcXYZ"));
        assert!(!json.contains(SESSION));

        let debug = format!("{settings:?}");
        assert!(!debug.contains("abcXYZ"));
        assert!(!debug.contains(SESSION));
    }

    #[test]
    fn test_uptime_starts_near_zero() {
        let settings = minimal();
        assert!(settings.uptime() < Duration::from_secs(5));
    }

    #[test]
    #[serial]
    fn test_from_env_is_idempotent() {
        temp_env::with_vars(
            [
                ("BOT_TOKEN", Some(TOKEN)),
                ("SESSION_STRING", Some(SESSION)),
                ("API_ID", None),
                ("API_HASH", None),
                ("MAX_CONCURRENT_DOWNLOADS", Some("5")),
                ("BATCH_SIZE", None),
                ("FLOOD_WAIT_DELAY", None),
            ],
            || {
                let first = Settings::from_env().unwrap();
                let second = Settings::from_env().unwrap();

                let mut first_summary = first.summary();
                let second_summary = second.summary();
                first_summary.start_time = second_summary.start_time;
                assert_eq!(first_summary, second_summary);
                assert_eq!(
                    first.bot_token.expose_secret(),
                    second.bot_token.expose_secret()
                );
                assert_eq!(
                    first.session_string.expose_secret(),
                    second.session_string.expose_secret()
                );
                assert_eq!(first.max_concurrent_downloads, 5);
            },
        );
    }
}
