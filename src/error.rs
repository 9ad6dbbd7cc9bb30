use thiserror::Error;

/// Errors produced while relaying forwarded media.
///
/// `Session` and `Subscription` end the relay; every other variant is scoped
/// to a single message and only gets logged.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The bot session could not be created or authenticated
    #[error("Session error: {0}")]
    Session(String),
    /// The update stream failed
    #[error("Subscription error: {0}")]
    Subscription(String),
    /// `getFile` could not resolve the file identifier
    #[error("Metadata lookup error: {0}")]
    MetadataLookup(String),
    /// The HTTP download failed or returned a non-success status
    #[error("Retrieval error: {0}")]
    Retrieval(String),
    /// The temporary file could not be created or written
    #[error("Staging error: {0}")]
    Staging(#[from] std::io::Error),
    /// The outbound media message was rejected
    #[error("Send error: {0}")]
    Send(String),
}
