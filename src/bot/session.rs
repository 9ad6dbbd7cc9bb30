//! Telegram Bot API access used by the relay.
//!
//! [`TelegramApi`] is the seam between the relay loop and the platform; the
//! production implementation wraps a `teloxide` [`Bot`].

use super::media::InboundUpdate;
use crate::config::{Settings, SettingsError, POLL_REQUEST_SLACK_SECS};
use crate::error::RelayError;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::{AllowedUpdate, ChatId, FileId, InputFile};

/// Operations the relay needs from the Bot API
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TelegramApi: Send + Sync {
    /// Check the token with `getMe` and return the bot's username
    async fn verify_session(&self) -> Result<String, RelayError>;

    /// Long-poll `getUpdates`, waiting up to `timeout_secs` for new messages
    async fn poll_updates(
        &self,
        offset: Option<i32>,
        timeout_secs: u32,
    ) -> Result<Vec<InboundUpdate>, RelayError>;

    /// Resolve a file ID to its download path via `getFile`
    async fn resolve_file(&self, file_id: &str) -> Result<String, RelayError>;

    /// Upload a local file as a photo
    async fn send_photo(&self, chat_id: ChatId, file: &Path) -> Result<(), RelayError>;

    /// Upload a local file as a video
    async fn send_video(&self, chat_id: ChatId, file: &Path) -> Result<(), RelayError>;

    /// Upload a local file as an animation
    async fn send_animation(&self, chat_id: ChatId, file: &Path) -> Result<(), RelayError>;
}

/// [`TelegramApi`] backed by `teloxide`
#[derive(Clone)]
pub struct TeloxideApi {
    bot: Bot,
}

impl TeloxideApi {
    /// Build a bot client for the configured token and API endpoint.
    ///
    /// The HTTP timeout is raised above the long-poll wait so idle polls are
    /// not cut short locally.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Session` if the HTTP client cannot be built or the
    /// API URL is invalid.
    pub fn new(settings: &Settings, poll_timeout_secs: u32) -> Result<Self, RelayError> {
        let api_url = settings
            .api_url()
            .map_err(|e: SettingsError| RelayError::Session(e.to_string()))?;

        let client = teloxide::net::default_reqwest_settings()
            .timeout(Duration::from_secs(
                u64::from(poll_timeout_secs) + POLL_REQUEST_SLACK_SECS,
            ))
            .build()
            .map_err(|e| RelayError::Session(format!("HTTP client: {e}")))?;

        let bot = Bot::with_client(settings.telegram_bot_token.clone(), client).set_api_url(api_url);
        Ok(Self { bot })
    }
}

#[async_trait]
impl TelegramApi for TeloxideApi {
    async fn verify_session(&self) -> Result<String, RelayError> {
        let me = self
            .bot
            .get_me()
            .await
            .map_err(|e| RelayError::Session(e.to_string()))?;
        Ok(me.user.username.clone().unwrap_or_default())
    }

    async fn poll_updates(
        &self,
        offset: Option<i32>,
        timeout_secs: u32,
    ) -> Result<Vec<InboundUpdate>, RelayError> {
        let mut request = self
            .bot
            .get_updates()
            .timeout(timeout_secs)
            .allowed_updates([AllowedUpdate::Message]);
        if let Some(offset) = offset {
            request = request.offset(offset);
        }

        let updates = request
            .await
            .map_err(|e| RelayError::Subscription(e.to_string()))?;
        Ok(updates.into_iter().map(InboundUpdate::from).collect())
    }

    async fn resolve_file(&self, file_id: &str) -> Result<String, RelayError> {
        let file = self
            .bot
            .get_file(FileId(file_id.to_string()))
            .await
            .map_err(|e| RelayError::MetadataLookup(e.to_string()))?;
        Ok(file.path)
    }

    async fn send_photo(&self, chat_id: ChatId, file: &Path) -> Result<(), RelayError> {
        self.bot
            .send_photo(chat_id, InputFile::file(file))
            .await
            .map(|_| ())
            .map_err(|e| RelayError::Send(e.to_string()))
    }

    async fn send_video(&self, chat_id: ChatId, file: &Path) -> Result<(), RelayError> {
        self.bot
            .send_video(chat_id, InputFile::file(file))
            .await
            .map(|_| ())
            .map_err(|e| RelayError::Send(e.to_string()))
    }

    async fn send_animation(&self, chat_id: ChatId, file: &Path) -> Result<(), RelayError> {
        self.bot
            .send_animation(chat_id, InputFile::file(file))
            .await
            .map(|_| ())
            .map_err(|e| RelayError::Send(e.to_string()))
    }
}

/// Absolute download URL for a resolved file path:
/// `<api>/file/bot<token>/<path>`.
#[must_use]
pub fn file_download_url(api_url: &str, token: &str, file_path: &str) -> String {
    format!(
        "{}/file/bot{}/{}",
        api_url.trim_end_matches('/'),
        token,
        file_path.trim_start_matches('/')
    )
}
