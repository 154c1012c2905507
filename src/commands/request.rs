//! Transport-independent command input and reply
//!
//! Handlers see an [`InboundCommand`] and answer with a [`CommandReply`]; the
//! serenity interaction types stay at the edge in `command_handler.rs`.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use std::collections::HashMap;

use crate::core::ReplyEmbed;

/// A slash command invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundCommand {
    pub name: String,
    pub options: HashMap<String, String>,
    pub user_id: Option<String>,
    pub channel_id: Option<String>,
    pub guild_id: Option<String>,
}

impl InboundCommand {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set a named option
    pub fn with_option(mut self, name: &str, value: impl Into<String>) -> Self {
        self.options.insert(name.to_string(), value.into());
        self
    }

    /// Set the caller identity
    pub fn from_caller(mut self, user_id: &str, channel_id: &str, guild_id: Option<&str>) -> Self {
        self.user_id = Some(user_id.to_string());
        self.channel_id = Some(channel_id.to_string());
        self.guild_id = guild_id.map(str::to_string);
        self
    }

    /// A non-empty option value
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn from_interaction(command: &ApplicationCommandInteraction) -> Self {
        let options = command
            .data
            .options
            .iter()
            .filter_map(|opt| {
                let value = opt.value.as_ref()?;
                let value = match value.as_str() {
                    Some(s) => s.to_string(),
                    None => value.to_string(),
                };
                Some((opt.name.clone(), value))
            })
            .collect();

        Self {
            name: command.data.name.clone(),
            options,
            user_id: Some(command.user.id.to_string()),
            channel_id: Some(command.channel_id.to_string()),
            guild_id: command.guild_id.map(|id| id.to_string()),
        }
    }
}

/// What to send back for a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReply {
    pub content: Option<String>,
    pub embed: Option<ReplyEmbed>,
    /// Only the caller can see the reply
    pub ephemeral: bool,
}

impl CommandReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            embed: None,
            ephemeral: false,
        }
    }

    /// A reply only the caller sees, used for validation and failure messages
    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self {
            ephemeral: true,
            ..Self::text(content)
        }
    }

    pub fn embed(embed: ReplyEmbed) -> Self {
        Self {
            content: None,
            embed: Some(embed),
            ephemeral: false,
        }
    }
}
