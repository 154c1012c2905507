//! # Core Module
//!
//! Configuration and Discord reply primitives shared by commands and features.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.0.0: Config, reply embeds and Discord length limits

pub mod config;
pub mod embeds;
pub mod response;

pub use config::{Config, StorageBackend};
pub use embeds::{build_embed, ReplyEmbed};
pub use response::{truncate_for_embed, truncate_for_message, EMBED_LIMIT, MESSAGE_LIMIT};
