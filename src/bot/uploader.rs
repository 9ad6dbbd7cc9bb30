use super::media::MediaKind;
use super::session::TelegramApi;
use crate::error::RelayError;
use crate::stager::StagedFile;
use teloxide::types::ChatId;
use tracing::debug;

/// Send a staged file to `channel` using the upload method for `kind`.
///
/// Video documents go out as a plain video.
///
/// # Errors
///
/// Returns `RelayError::Send` if Telegram rejects the upload.
pub async fn upload(
    api: &dyn TelegramApi,
    channel: ChatId,
    kind: MediaKind,
    staged: &StagedFile,
) -> Result<(), RelayError> {
    let file = staged.path();
    debug!(kind = %kind, size = staged.size(), channel = channel.0, "Uploading media");

    match kind {
        MediaKind::Photo => api.send_photo(channel, file).await,
        MediaKind::Video | MediaKind::VideoDocument => api.send_video(channel, file).await,
        MediaKind::Animation => api.send_animation(channel, file).await,
    }
}
