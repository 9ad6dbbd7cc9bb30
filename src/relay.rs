//! Forwarded-media relay loop.
//!
//! Long-polls the Bot API, picks out forwarded messages carrying media and
//! re-uploads each attachment to the destination channel. Messages are
//! handled one at a time; a failure on one message is logged and the loop
//! moves on.

use crate::bot::session::file_download_url;
use crate::bot::{classify, uploader, InboundUpdate, Media, TelegramApi};
use crate::config::{Settings, SettingsError, POLL_TIMEOUT_SECS};
use crate::error::RelayError;
use crate::stager;
use std::sync::Arc;
use teloxide::types::ChatId;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Relay engine: owns the update subscription and the stop signal
pub struct Relay {
    api: Arc<dyn TelegramApi>,
    http: reqwest::Client,
    channel: ChatId,
    token: String,
    api_url: String,
    cancel: CancellationToken,
}

impl Relay {
    /// Create a stopped relay for the configured channel.
    ///
    /// # Errors
    ///
    /// Returns a `SettingsError` if the channel ID is invalid.
    pub fn new(api: Arc<dyn TelegramApi>, settings: &Settings) -> Result<Self, SettingsError> {
        Ok(Self {
            api,
            http: reqwest::Client::new(),
            channel: ChatId(settings.channel_id()?),
            token: settings.telegram_bot_token.clone(),
            api_url: settings.telegram_api_url.clone(),
            cancel: CancellationToken::new(),
        })
    }

    /// Destination channel
    #[must_use]
    pub const fn channel(&self) -> ChatId {
        self.channel
    }

    /// Run the receive loop until [`Relay::stop`] is called.
    ///
    /// A pending poll is abandoned as soon as the relay is stopped; an update
    /// that is already being relayed is allowed to finish.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::Subscription` when polling fails. The loop does not
    /// retry: the process is expected to exit and be restarted.
    pub async fn start(&self) -> Result<(), RelayError> {
        info!(channel = self.channel.0, "Relay started");

        let mut offset: Option<i32> = None;
        loop {
            let polled = tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                polled = self.api.poll_updates(offset, POLL_TIMEOUT_SECS) => polled,
            };

            let updates = match polled {
                Ok(updates) => updates,
                Err(e) => {
                    error!(error = %e, "Update subscription failed");
                    return Err(e);
                }
            };

            for update in updates {
                if self.cancel.is_cancelled() {
                    break;
                }
                offset = Some(next_offset(update.id));
                self.handle_update(update).await;
            }
        }

        info!("Relay stopped");
        Ok(())
    }

    /// Signal the receive loop to stop. Safe to call more than once.
    pub fn stop(&self) {
        if !self.cancel.is_cancelled() {
            info!("Stopping relay...");
        }
        self.cancel.cancel();
    }

    /// Process one update. Errors are logged here and never propagate.
    pub async fn handle_update(&self, update: InboundUpdate) {
        let Some(message) = update.message else {
            return;
        };
        if !message.forwarded {
            return;
        }
        let Some(media) = classify(&message) else {
            return;
        };

        if let Err(e) = self.relay_media(&media).await {
            error!(
                update_id = update.id,
                kind = %media.kind,
                error = %e,
                "Failed to relay forwarded media"
            );
        }
    }

    async fn relay_media(&self, media: &Media) -> Result<(), RelayError> {
        let file_path = self.api.resolve_file(&media.file_id).await?;
        let url = file_download_url(&self.api_url, &self.token, &file_path);

        let staged = stager::stage(&self.http, &url).await?;
        let size = staged.size();

        let sent = uploader::upload(self.api.as_ref(), self.channel, media.kind, &staged).await;
        staged.release();
        sent?;

        info!(
            kind = %media.kind,
            size,
            channel = self.channel.0,
            "Relayed forwarded media"
        );
        Ok(())
    }
}

/// Offset acknowledging `update_id` and everything before it
const fn next_offset(update_id: u32) -> i32 {
    if update_id >= i32::MAX as u32 {
        i32::MAX
    } else {
        update_id as i32 + 1
    }
}
