#![deny(missing_docs)]
//! Find Keeper
//!
//! A Telegram bot that picks up media forwarded to it (photos, videos,
//! animations and video documents) and re-uploads it to a fixed channel.

/// Telegram session, media classification and uploads
pub mod bot;
/// Configuration management
pub mod config;
/// Error types shared by the relay pipeline
pub mod error;
/// Log output redaction
pub mod logging;
/// Forwarded-media relay loop
pub mod relay;
/// Temporary staging of downloaded files
pub mod stager;
