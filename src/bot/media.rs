//! Media classification for forwarded Telegram messages
//!
//! Converts Telegram updates into a small inbound model and decides which
//! attachment, if any, should be relayed.

use std::fmt;
use teloxide::types::{Message, MessageOrigin, Update, UpdateKind};

/// MIME prefixes accepted for documents that carry video.
///
/// Compared case-insensitively: the `mime` crate lowercases what Telegram sends.
const VIDEO_DOCUMENT_MIME_PREFIXES: &[&str] = &[
    "video/",
    "application/x-mpegurl",
    "application/vnd.apple.mpegurl",
];

/// Category of attachment, driving which upload method is used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// Photo (largest resolution)
    Photo,
    /// Native video
    Video,
    /// GIF or silent MP4 animation
    Animation,
    /// Document whose MIME type marks it as video
    VideoDocument,
}

impl MediaKind {
    /// Short label used in log fields
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Video => "video",
            Self::Animation => "animation",
            Self::VideoDocument => "video_document",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Attachment selected for relaying
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Media {
    /// Classified kind
    pub kind: MediaKind,
    /// Telegram file identifier, resolved later via `getFile`
    pub file_id: String,
}

/// Document attachment with its declared MIME type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentRef {
    /// Telegram file identifier
    pub file_id: String,
    /// MIME type as declared by the sender
    pub mime_type: Option<String>,
}

/// The parts of a Telegram message the relay looks at
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundMessage {
    /// Whether the message is a forwarded channel post.
    ///
    /// Only channel origins carry the source message ID; forwards from users,
    /// hidden users and groups do not count.
    pub forwarded: bool,
    /// Photo file IDs ordered by resolution, largest last
    pub photo: Vec<String>,
    /// Video file ID
    pub video: Option<String>,
    /// Animation file ID
    pub animation: Option<String>,
    /// Document attachment
    pub document: Option<DocumentRef>,
}

/// One event from the update stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundUpdate {
    /// Telegram `update_id`, used to advance the poll offset
    pub id: u32,
    /// Message payload; `None` for any other update type
    pub message: Option<InboundMessage>,
}

impl From<&Message> for InboundMessage {
    fn from(msg: &Message) -> Self {
        Self {
            forwarded: matches!(msg.forward_origin(), Some(MessageOrigin::Channel { .. })),
            photo: msg
                .photo()
                .map(|sizes| sizes.iter().map(|size| size.file.id.0.clone()).collect())
                .unwrap_or_default(),
            video: msg.video().map(|video| video.file.id.0.clone()),
            animation: msg.animation().map(|animation| animation.file.id.0.clone()),
            document: msg.document().map(|doc| DocumentRef {
                file_id: doc.file.id.0.clone(),
                mime_type: doc.mime_type.as_ref().map(ToString::to_string),
            }),
        }
    }
}

impl From<Update> for InboundUpdate {
    fn from(update: Update) -> Self {
        let message = match &update.kind {
            UpdateKind::Message(msg) => Some(InboundMessage::from(msg)),
            _ => None,
        };
        Self {
            id: update.id.0,
            message,
        }
    }
}

/// Pick the attachment to relay.
///
/// First match wins: photo, video, animation, then a document with a video
/// MIME type. Returns `None` when nothing qualifies.
#[must_use]
pub fn classify(msg: &InboundMessage) -> Option<Media> {
    if let Some(largest) = msg.photo.last() {
        return Some(Media {
            kind: MediaKind::Photo,
            file_id: largest.clone(),
        });
    }

    if let Some(video) = &msg.video {
        return Some(Media {
            kind: MediaKind::Video,
            file_id: video.clone(),
        });
    }

    if let Some(animation) = &msg.animation {
        return Some(Media {
            kind: MediaKind::Animation,
            file_id: animation.clone(),
        });
    }

    msg.document
        .as_ref()
        .filter(|doc| doc.mime_type.as_deref().is_some_and(is_video_mime))
        .map(|doc| Media {
            kind: MediaKind::VideoDocument,
            file_id: doc.file_id.clone(),
        })
}

/// Whether a document MIME type is video or an HLS playlist
#[must_use]
pub fn is_video_mime(mime_type: &str) -> bool {
    let mime_type = mime_type.to_ascii_lowercase();
    VIDEO_DOCUMENT_MIME_PREFIXES
        .iter()
        .any(|prefix| mime_type.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn forwarded() -> InboundMessage {
        InboundMessage {
            forwarded: true,
            ..InboundMessage::default()
        }
    }

    fn document(mime_type: Option<&str>) -> InboundMessage {
        InboundMessage {
            document: Some(DocumentRef {
                file_id: "D1".to_string(),
                mime_type: mime_type.map(ToString::to_string),
            }),
            ..forwarded()
        }
    }

    #[test]
    fn test_photo_picks_last_size() {
        for n in 1..=5 {
            let msg = InboundMessage {
                photo: (1..=n).map(|i| format!("P{i}")).collect(),
                ..forwarded()
            };
            let media = classify(&msg);
            assert_eq!(
                media,
                Some(Media {
                    kind: MediaKind::Photo,
                    file_id: format!("P{n}"),
                }),
                "photo array of length {n}"
            );
        }
    }

    #[test]
    fn test_priority_order() {
        let everything = InboundMessage {
            photo: vec!["P1".to_string()],
            video: Some("V1".to_string()),
            animation: Some("A1".to_string()),
            ..document(Some("video/mp4"))
        };
        assert_eq!(
            classify(&everything).map(|m| m.kind),
            Some(MediaKind::Photo)
        );

        let video_and_animation = InboundMessage {
            photo: Vec::new(),
            ..everything.clone()
        };
        let media = classify(&video_and_animation);
        assert_eq!(media.as_ref().map(|m| m.kind), Some(MediaKind::Video));
        assert_eq!(media.map(|m| m.file_id).as_deref(), Some("V1"));

        let animation_and_document = InboundMessage {
            video: None,
            ..video_and_animation
        };
        assert_eq!(
            classify(&animation_and_document).map(|m| m.kind),
            Some(MediaKind::Animation)
        );
    }

    #[test]
    fn test_video_documents() {
        for mime in [
            "video/mp4",
            "video/quicktime",
            "application/x-mpegURL",
            "application/vnd.apple.mpegurl",
            "APPLICATION/VND.APPLE.MPEGURL",
        ] {
            assert_eq!(
                classify(&document(Some(mime))),
                Some(Media {
                    kind: MediaKind::VideoDocument,
                    file_id: "D1".to_string(),
                }),
                "mime {mime}"
            );
        }
    }

    #[test]
    fn test_other_documents_are_ignored() {
        for mime in ["application/pdf", "image/png", "text/plain", "audio/mpeg"] {
            assert_eq!(classify(&document(Some(mime))), None, "mime {mime}");
        }
        assert_eq!(classify(&document(None)), None);
    }

    #[test]
    fn test_no_attachment() {
        assert_eq!(classify(&forwarded()), None);
        assert_eq!(classify(&InboundMessage::default()), None);
    }

    #[test]
    fn test_media_kind_labels() {
        assert_eq!(MediaKind::Photo.to_string(), "photo");
        assert_eq!(MediaKind::VideoDocument.to_string(), "video_document");
    }

    fn telegram_message(extra: serde_json::Value) -> Message {
        let mut value = json!({
            "message_id": 7,
            "date": 1_700_000_000,
            "chat": { "id": 42, "type": "private", "first_name": "Ann" },
            "from": { "id": 42, "is_bot": false, "first_name": "Ann" }
        });
        if let (Some(base), Some(extra)) = (value.as_object_mut(), extra.as_object()) {
            base.extend(extra.clone());
        }
        serde_json::from_value(value).expect("valid Telegram message JSON")
    }

    fn photo_sizes() -> serde_json::Value {
        json!([
            { "file_id": "small", "file_unique_id": "s", "file_size": 1_024, "width": 90, "height": 90 },
            { "file_id": "P1", "file_unique_id": "l", "file_size": 98_304, "width": 1280, "height": 1280 }
        ])
    }

    #[test]
    fn test_forwarded_channel_post_is_relayed() {
        let msg = telegram_message(json!({
            "forward_origin": {
                "type": "channel",
                "date": 1_699_999_000,
                "chat": { "id": -1_001_234_567_890_i64, "type": "channel", "title": "Finds" },
                "message_id": 77
            },
            "photo": photo_sizes()
        }));

        let inbound = InboundMessage::from(&msg);
        assert!(inbound.forwarded);
        assert_eq!(inbound.photo, vec!["small".to_string(), "P1".to_string()]);
        assert_eq!(
            classify(&inbound),
            Some(Media {
                kind: MediaKind::Photo,
                file_id: "P1".to_string(),
            })
        );
    }

    #[test]
    fn test_forwards_without_channel_origin_are_not_marked() {
        let origins = [
            json!({
                "type": "user",
                "date": 1_699_999_000,
                "sender_user": { "id": 99, "is_bot": false, "first_name": "Bob" }
            }),
            json!({
                "type": "hidden_user",
                "date": 1_699_999_000,
                "sender_user_name": "Someone"
            }),
        ];
        for origin in origins {
            let msg = telegram_message(json!({
                "forward_origin": origin.clone(),
                "photo": photo_sizes()
            }));
            let inbound = InboundMessage::from(&msg);
            assert!(!inbound.forwarded, "origin {origin}");
        }
    }

    #[test]
    fn test_plain_text_message_is_not_forwarded() {
        let msg = telegram_message(json!({ "text": "hello" }));

        let inbound = InboundMessage::from(&msg);
        assert!(!inbound.forwarded);
        assert_eq!(classify(&inbound), None);
    }
}
