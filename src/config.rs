//! Configuration and settings management
//!
//! Loads settings from environment variables (optionally pre-populated from a
//! `.env` file) and defines relay constants.

use config::{Config, ConfigError, Environment, File};
use reqwest::Url;
use serde::Deserialize;
use std::num::ParseIntError;
use thiserror::Error;

/// Default Telegram Bot API endpoint
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Long-poll wait for `getUpdates`, in seconds
pub const POLL_TIMEOUT_SECS: u32 = 60;
/// Extra time on top of the poll wait before the HTTP client gives up
pub const POLL_REQUEST_SLACK_SECS: u64 = 15;
/// How long shutdown waits for an in-flight message to finish
pub const SHUTDOWN_GRACE_SECS: u64 = 5;
/// Prefix of staged temporary files
pub const STAGED_FILE_PREFIX: &str = "telegram_media_";

/// Errors raised while loading or validating settings.
///
/// All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Configuration sources could not be read or deserialized
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),
    /// `TELEGRAM_BOT_TOKEN` is missing or empty
    #[error("TELEGRAM_BOT_TOKEN environment variable is required")]
    MissingToken,
    /// `TELEGRAM_CHANNEL` is missing or empty
    #[error("TELEGRAM_CHANNEL environment variable is required")]
    MissingChannel,
    /// `TELEGRAM_CHANNEL` is not a valid 64-bit integer
    #[error("invalid channel ID {value:?}: {source}")]
    InvalidChannel {
        /// Raw value as found in the environment
        value: String,
        /// Parse failure (format or overflow)
        #[source]
        source: ParseIntError,
    },
    /// `TELEGRAM_API_URL` is not an absolute URL
    #[error("invalid Telegram API URL {value:?}: {reason}")]
    InvalidApiUrl {
        /// Raw value as found in the environment
        value: String,
        /// Parser message
        reason: String,
    },
}

/// Relay settings loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    #[serde(default)]
    pub telegram_bot_token: String,

    /// Destination channel identifier, kept raw until validated
    #[serde(default)]
    pub telegram_channel: String,

    /// Bot API base URL, used for both API calls and file downloads
    #[serde(default = "default_telegram_api_url")]
    pub telegram_api_url: String,
}

fn default_telegram_api_url() -> String {
    DEFAULT_TELEGRAM_API_URL.to_string()
}

impl Settings {
    /// Load settings from config files and the environment, then validate them.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use find_keeper::config::Settings;
    ///
    /// let settings = Settings::new().expect("Failed to load configuration");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a `SettingsError` if loading fails or a required value is
    /// missing or malformed.
    pub fn new() -> Result<Self, SettingsError> {
        let settings: Self = build_config()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check every value the relay depends on.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.telegram_bot_token.is_empty() {
            return Err(SettingsError::MissingToken);
        }
        self.channel_id()?;
        self.api_url()?;
        Ok(())
    }

    /// Destination channel as a numeric chat ID.
    ///
    /// # Errors
    ///
    /// Returns `MissingChannel` for an empty value and `InvalidChannel` when
    /// the value is not a base-10 `i64`.
    pub fn channel_id(&self) -> Result<i64, SettingsError> {
        if self.telegram_channel.is_empty() {
            return Err(SettingsError::MissingChannel);
        }
        self.telegram_channel
            .parse::<i64>()
            .map_err(|source| SettingsError::InvalidChannel {
                value: self.telegram_channel.clone(),
                source,
            })
    }

    /// Parsed Bot API base URL.
    ///
    /// # Errors
    ///
    /// Returns `InvalidApiUrl` when the value does not parse.
    pub fn api_url(&self) -> Result<Url, SettingsError> {
        Url::parse(&self.telegram_api_url).map_err(|e| SettingsError::InvalidApiUrl {
            value: self.telegram_api_url.clone(),
            reason: e.to_string(),
        })
    }
}

fn build_config() -> Result<Config, ConfigError> {
    Config::builder()
        .add_source(File::with_name("config/default").required(false))
        // Local overrides, not checked into git
        .add_source(File::with_name("config/local").required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        // Environment::default() maps TELEGRAM_BOT_TOKEN to telegram_bot_token;
        // empty values count as unset
        .add_source(Environment::default().ignore_empty(true))
        .build()
}
