/// Inbound message model and media classification
pub mod media;
/// Bot API access
pub mod session;
/// Outbound media uploads
pub mod uploader;

pub use media::{classify, InboundMessage, InboundUpdate, Media, MediaKind};
pub use session::{TelegramApi, TeloxideApi};
