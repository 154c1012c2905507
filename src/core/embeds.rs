//! Embed builders for Discord responses
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.0: Titled list embeds for reminder replies

use crate::core::truncate_for_embed;
use serenity::builder::CreateEmbed;
use serenity::model::Timestamp;

/// Accent color for reminder list embeds
pub const LIST_COLOR: u32 = 0x0099ff;

/// Transport-independent description of an embed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyEmbed {
    pub title: String,
    pub description: String,
    pub color: u32,
    /// Seconds since the Unix epoch
    pub timestamp: i64,
}

impl ReplyEmbed {
    /// A list embed stamped with the current time
    pub fn list(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            color: LIST_COLOR,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// Build a serenity embed: title, accent color, truncated description, timestamp.
pub fn build_embed(reply: &ReplyEmbed) -> CreateEmbed {
    let mut embed = CreateEmbed::default();
    embed.title(&reply.title);
    embed.color(reply.color);
    embed.description(truncate_for_embed(&reply.description));
    if let Ok(timestamp) = Timestamp::from_unix_timestamp(reply.timestamp) {
        embed.timestamp(timestamp);
    }
    embed
}
