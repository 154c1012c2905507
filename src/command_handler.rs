//! Slash command dispatch
//!
//! Turns a serenity interaction into an [`InboundCommand`], routes it through
//! the [`CommandRegistry`] and renders the [`CommandReply`] back to Discord.

use anyhow::Result;
use log::{debug, error, info};
use serenity::model::application::interaction::application_command::ApplicationCommandInteraction;
use serenity::model::application::interaction::InteractionResponseType;
use serenity::prelude::Context;
use std::sync::Arc;
use uuid::Uuid;

use crate::commands::context::CommandContext;
use crate::commands::handlers::create_all_handlers;
use crate::commands::registry::CommandRegistry;
use crate::commands::request::{CommandReply, InboundCommand};
use crate::core::build_embed;

const UNKNOWN_COMMAND: &str = "Unknown command";
const INTERNAL_ERROR: &str =
    "❌ Sorry, I encountered an error processing your command. Please try again.";

#[derive(Clone)]
pub struct CommandHandler {
    registry: CommandRegistry,
    ctx: Arc<CommandContext>,
}

impl CommandHandler {
    /// A handler with every built-in command registered
    pub fn new(ctx: CommandContext) -> Self {
        Self::with_registry(ctx, CommandRegistry::with_handlers(create_all_handlers()))
    }

    pub fn with_registry(ctx: CommandContext, registry: CommandRegistry) -> Self {
        Self {
            registry,
            ctx: Arc::new(ctx),
        }
    }

    /// Route a command to its handler
    ///
    /// Never fails: unknown commands and handler errors become ephemeral replies.
    pub async fn dispatch(&self, command: &InboundCommand, request_id: Uuid) -> CommandReply {
        let Some(handler) = self.registry.get(&command.name) else {
            debug!("[{request_id}] No handler for /{}", command.name);
            return CommandReply::ephemeral(UNKNOWN_COMMAND);
        };

        match handler.handle(Arc::clone(&self.ctx), command).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("[{request_id}] Handler for /{} failed: {e:#}", command.name);
                CommandReply::ephemeral(INTERNAL_ERROR)
            }
        }
    }

    pub async fn handle_slash_command(
        &self,
        ctx: &Context,
        command: &ApplicationCommandInteraction,
    ) -> Result<()> {
        let request_id = Uuid::new_v4();
        let inbound = InboundCommand::from_interaction(command);

        info!(
            "[{}] 📥 Slash command received | Command: {} | User: {} | Channel: {} | Guild: {}",
            request_id,
            inbound.name,
            inbound.user_id.as_deref().unwrap_or("unknown"),
            inbound.channel_id.as_deref().unwrap_or("unknown"),
            inbound.guild_id.as_deref().unwrap_or("DM")
        );

        let reply = self.dispatch(&inbound, request_id).await;

        debug!("[{request_id}] 📤 Sending response to Discord (ephemeral: {})", reply.ephemeral);
        command
            .create_interaction_response(&ctx.http, |response| {
                response
                    .kind(InteractionResponseType::ChannelMessageWithSource)
                    .interaction_response_data(|msg| {
                        if let Some(content) = &reply.content {
                            msg.content(content);
                        }
                        if let Some(embed) = &reply.embed {
                            msg.add_embed(build_embed(embed));
                        }
                        msg.ephemeral(reply.ephemeral)
                    })
            })
            .await?;

        info!("[{request_id}] ✅ /{} completed", inbound.name);
        Ok(())
    }
}
