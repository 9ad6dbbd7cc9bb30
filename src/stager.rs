//! Downloads remote files into uniquely named temporary files.
//!
//! A [`StagedFile`] owns its file on disk: dropping it deletes the file, so a
//! staged download is released on every exit path of the caller.

use crate::config::STAGED_FILE_PREFIX;
use crate::error::RelayError;
use futures_util::StreamExt;
use std::io;
use std::path::Path;
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// A downloaded file in the system temp directory, removed on drop
#[derive(Debug)]
pub struct StagedFile {
    path: TempPath,
    size: u64,
}

impl StagedFile {
    /// Location of the staged file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of bytes written
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Delete the file now, logging instead of failing if that is not possible.
    pub fn release(self) {
        let shown = self.path.display().to_string();
        if let Err(e) = self.path.close() {
            warn!(path = %shown, error = %e, "Failed to remove staged file");
        } else {
            debug!(path = %shown, "Staged file removed");
        }
    }
}

/// Download `url` into a new file in the system temp directory.
///
/// # Errors
///
/// See [`stage_in`].
pub async fn stage(client: &reqwest::Client, url: &str) -> Result<StagedFile, RelayError> {
    stage_in(client, url, &std::env::temp_dir()).await
}

/// Download `url` into a new temporary file under `dir`.
///
/// The body is streamed to disk chunk by chunk.
///
/// # Errors
///
/// Returns `RelayError::Retrieval` on transport failures and non-2xx
/// responses, and `RelayError::Staging` if the local file cannot be created
/// or written. No file is left behind in either case.
pub async fn stage_in(
    client: &reqwest::Client,
    url: &str,
    dir: &Path,
) -> Result<StagedFile, RelayError> {
    // without_url(): download URLs embed the bot token
    let response = client
        .get(url)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| RelayError::Retrieval(e.without_url().to_string()))?;

    let dir = dir.to_path_buf();
    let (file, path) = tokio::task::spawn_blocking(move || {
        tempfile::Builder::new()
            .prefix(STAGED_FILE_PREFIX)
            .tempfile_in(dir)
    })
    .await
    .map_err(io::Error::other)??
    .into_parts();
    let mut file = tokio::fs::File::from_std(file);

    let mut size = 0_u64;
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| RelayError::Retrieval(e.without_url().to_string()))?;
        file.write_all(&chunk).await?;
        size += chunk.len() as u64;
    }
    file.flush().await?;

    debug!(path = %path.display(), size, "Staged download");
    Ok(StagedFile { path, size })
}
