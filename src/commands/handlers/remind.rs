//! Reminder command handlers
//!
//! Handles: remind, reminders, delete
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.0: Relative and deadline reminders, list embed, /delete with ownership check

use anyhow::Result;
use async_trait::async_trait;
use log::{error, info, warn};
use std::sync::Arc;
use uuid::Uuid;

use crate::commands::context::CommandContext;
use crate::commands::handler::SlashCommandHandler;
use crate::commands::request::{CommandReply, InboundCommand};
use crate::core::response::truncate_to;
use crate::core::{ReplyEmbed, EMBED_LIMIT, MESSAGE_LIMIT};
use crate::features::reminders::{
    format_relative, parse_deadline, parse_relative, DeadlineSchedule, NewReminder, Reminder,
    ReminderType,
};

const MISSING_INPUT: &str = "⚠️ Please provide both a message and a time.";
const MISSING_IDENTITY: &str = "⚠️ Required information is missing.";
const MISSING_USER: &str = "⚠️ Could not determine who you are.";
const INVALID_TIME: &str =
    "⚠️ Invalid time format. Examples: `5m`, `1h`, `2d` or `2024-12-25`, `2024-12-25 14:30`";
const CREATE_FAILED: &str = "❌ Failed to create the reminder.";
const FETCH_FAILED: &str = "❌ Failed to fetch your reminders.";
const DELETE_FAILED: &str = "❌ Failed to delete the reminder.";
const NO_REMINDERS: &str = "📝 You have no active reminders.";
const LIST_TITLE: &str = "📝 Your reminders";
const DELETE_TITLE: &str = "🗑️ Which reminder should be deleted?";
const DELETE_HINT: &str = "Run `/delete id:<id>` with one of the ids above to delete it.";

/// Room left for the user's message inside a confirmation reply
const ECHO_LIMIT: usize = MESSAGE_LIMIT - 256;

/// Who issued the command and where reminders are delivered
struct Caller<'a> {
    user_id: &'a str,
    channel_id: &'a str,
    guild_id: &'a str,
}

/// Handler for reminder-related commands
pub struct RemindHandler;

#[async_trait]
impl SlashCommandHandler for RemindHandler {
    fn command_names(&self) -> &'static [&'static str] {
        &["remind", "reminders", "delete"]
    }

    async fn handle(
        &self,
        ctx: Arc<CommandContext>,
        command: &InboundCommand,
    ) -> Result<CommandReply> {
        let reply = match command.name.as_str() {
            "remind" => self.handle_remind(&ctx, command).await,
            "reminders" => self.handle_reminders(&ctx, command).await,
            "delete" => self.handle_delete(&ctx, command).await,
            other => CommandReply::ephemeral(format!("Unknown command: {other}")),
        };
        Ok(reply)
    }
}

impl RemindHandler {
    /// Handle /remind - create a relative or deadline reminder
    async fn handle_remind(&self, ctx: &CommandContext, command: &InboundCommand) -> CommandReply {
        let (Some(message), Some(time_str)) = (command.option("message"), command.option("time"))
        else {
            return CommandReply::ephemeral(MISSING_INPUT);
        };

        let (Some(user_id), Some(channel_id), Some(guild_id)) = (
            command.user_id.as_deref(),
            command.channel_id.as_deref(),
            command.guild_id.as_deref(),
        ) else {
            return CommandReply::ephemeral(MISSING_IDENTITY);
        };
        let caller = Caller {
            user_id,
            channel_id,
            guild_id,
        };

        // Dates take precedence over relative offsets
        if let Some(schedule) = parse_deadline(time_str) {
            return self.create_deadline(ctx, &caller, message, &schedule).await;
        }

        let now = chrono::Utc::now().timestamp();
        let Some(reminder_time) = parse_relative(time_str).and_then(|secs| now.checked_add(secs))
        else {
            return CommandReply::ephemeral(INVALID_TIME);
        };

        let new_reminder = NewReminder {
            user_id: caller.user_id.to_string(),
            channel_id: caller.channel_id.to_string(),
            guild_id: caller.guild_id.to_string(),
            message: message.to_string(),
            reminder_time,
            reminder_type: ReminderType::Main,
            original_date: None,
            original_time: None,
            parent_id: None,
        };

        match ctx.store.create(new_reminder).await {
            Ok(reminder) => {
                info!(
                    "Created reminder {} for user {} in {}",
                    reminder.id, caller.user_id, time_str
                );
                CommandReply::text(format!(
                    "✅ Reminder set!\n📝 **Message**: {}\n⏰ **Time**: in {}",
                    truncate_to(message, ECHO_LIMIT),
                    format_relative(time_str)
                ))
            }
            Err(e) => {
                error!("Failed to create reminder for user {}: {e}", caller.user_id);
                CommandReply::ephemeral(CREATE_FAILED)
            }
        }
    }

    /// Store both notifications of a deadline under one parent id
    async fn create_deadline(
        &self,
        ctx: &CommandContext,
        caller: &Caller<'_>,
        message: &str,
        schedule: &DeadlineSchedule,
    ) -> CommandReply {
        let parent_id = Uuid::new_v4().to_string();
        let mut created: Vec<String> = Vec::with_capacity(schedule.notifications.len());

        for notification in &schedule.notifications {
            let new_reminder = NewReminder {
                user_id: caller.user_id.to_string(),
                channel_id: caller.channel_id.to_string(),
                guild_id: caller.guild_id.to_string(),
                message: message.to_string(),
                reminder_time: notification.time,
                reminder_type: notification.kind,
                original_date: Some(schedule.original_date.clone()),
                original_time: Some(schedule.original_time.clone()),
                parent_id: Some(parent_id.clone()),
            };

            match ctx.store.create(new_reminder).await {
                Ok(reminder) => created.push(reminder.id),
                Err(e) => {
                    error!(
                        "Failed to create {} notification for deadline {}: {e}",
                        notification.kind, parent_id
                    );
                    Self::discard(ctx, &created).await;
                    return CommandReply::ephemeral(CREATE_FAILED);
                }
            }
        }

        info!(
            "Created deadline {} ({}) for user {}",
            parent_id, schedule.display_deadline, caller.user_id
        );

        CommandReply::text(format!(
            "✅ Reminder set!\n📝 **Message**: {}\n📅 **Deadline**: {}\n🔔 **Notifications**: 00:00 three days before and 00:00 on the day",
            truncate_to(message, ECHO_LIMIT),
            schedule.display_deadline
        ))
    }

    /// Best-effort removal of notifications from a half-created deadline
    async fn discard(ctx: &CommandContext, ids: &[String]) {
        for id in ids {
            if let Err(e) = ctx.store.delete(id).await {
                warn!("Failed to discard partial notification {id}: {e}");
            }
        }
    }

    /// Handle /reminders - list the caller's active reminders
    async fn handle_reminders(&self, ctx: &CommandContext, command: &InboundCommand) -> CommandReply {
        let Some(user_id) = command.user_id.as_deref() else {
            return CommandReply::ephemeral(MISSING_USER);
        };

        let reminders = match ctx
            .store
            .list_active_for_user(user_id, command.guild_id.as_deref())
            .await
        {
            Ok(reminders) => reminders,
            Err(e) => {
                error!("Failed to list reminders for user {user_id}: {e}");
                return CommandReply::ephemeral(FETCH_FAILED);
            }
        };

        if reminders.is_empty() {
            return CommandReply::text(NO_REMINDERS);
        }

        CommandReply::embed(ReplyEmbed::list(LIST_TITLE, Self::render_list(&reminders)))
    }

    /// Handle /delete - show deletable reminders, or delete one owned by the caller
    async fn handle_delete(&self, ctx: &CommandContext, command: &InboundCommand) -> CommandReply {
        let Some(user_id) = command.user_id.as_deref() else {
            return CommandReply::ephemeral(MISSING_USER);
        };

        // Ownership is checked against the caller's own active reminders only
        let reminders = match ctx
            .store
            .list_active_for_user(user_id, command.guild_id.as_deref())
            .await
        {
            Ok(reminders) => reminders,
            Err(e) => {
                error!("Failed to list reminders for user {user_id}: {e}");
                return CommandReply::ephemeral(FETCH_FAILED);
            }
        };

        let Some(target) = command.option("id").map(str::trim) else {
            if reminders.is_empty() {
                return CommandReply::text(NO_REMINDERS);
            }
            // the hint must survive embed truncation
            let mut description =
                truncate_to(&Self::render_list(&reminders), EMBED_LIMIT - DELETE_HINT.len() - 2);
            if !description.ends_with("\n\n") {
                description.push_str("\n\n");
            }
            description.push_str(DELETE_HINT);
            return CommandReply::embed(ReplyEmbed::list(DELETE_TITLE, description));
        };

        let Some(reminder) = reminders.iter().find(|r| r.id == target) else {
            info!("User {user_id} tried to delete unknown or foreign reminder {target}");
            return CommandReply::ephemeral(format!(
                "❌ Reminder `{target}` not found or doesn't belong to you."
            ));
        };

        if let Err(e) = ctx.store.delete(&reminder.id).await {
            error!("Failed to delete reminder {}: {e}", reminder.id);
            return CommandReply::ephemeral(DELETE_FAILED);
        }

        let sibling_pending = reminder.parent_id.is_some()
            && reminders
                .iter()
                .any(|r| r.id != reminder.id && r.parent_id == reminder.parent_id);

        let mut content = format!(
            "🗑️ Deleted reminder: {}",
            truncate_to(&reminder.message, ECHO_LIMIT)
        );
        if sibling_pending {
            content.push_str("\nThe other notification for this deadline is still scheduled.");
        }
        CommandReply::text(content)
    }

    /// Numbered list with relative-time tokens and ids
    fn render_list(reminders: &[Reminder]) -> String {
        reminders
            .iter()
            .enumerate()
            .map(|(index, reminder)| {
                format!(
                    "**{}.** {}{}\n⏰ <t:{}:R>\n🆔 `{}`\n\n",
                    index + 1,
                    reminder.message,
                    Self::kind_label(reminder.reminder_type),
                    reminder.reminder_time,
                    reminder.id
                )
            })
            .collect()
    }

    fn kind_label(kind: ReminderType) -> &'static str {
        match kind {
            ReminderType::Main => "",
            ReminderType::ThreeDaysBefore => " (3 days before)",
            ReminderType::Deadline => " (due day)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::reminders::{KeyValueStore, ReminderStore};
    use anyhow::anyhow;
    use std::collections::BTreeMap;

    fn context() -> Arc<CommandContext> {
        Arc::new(CommandContext::new(ReminderStore::in_memory()))
    }

    fn remind(message: &str, time: &str) -> InboundCommand {
        InboundCommand::new("remind")
            .with_option("message", message)
            .with_option("time", time)
            .from_caller("user-1", "channel-1", Some("guild-1"))
    }

    fn as_user(name: &str, user_id: &str) -> InboundCommand {
        InboundCommand::new(name).from_caller(user_id, "channel-1", Some("guild-1"))
    }

    async fn run(ctx: &Arc<CommandContext>, command: InboundCommand) -> CommandReply {
        RemindHandler.handle(Arc::clone(ctx), &command).await.unwrap()
    }

    async fn all_for(ctx: &CommandContext, user_id: &str) -> Vec<Reminder> {
        ctx.store.list_active_for_user(user_id, None).await.unwrap()
    }

    /// Backend whose writes start failing after `allowed` successful puts
    struct FlakyStorage {
        inner: crate::features::reminders::MemoryStorage,
        allowed: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl KeyValueStore for FlakyStorage {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key).await
        }

        async fn put(&self, key: &str, value: String) -> Result<()> {
            use std::sync::atomic::Ordering;
            // rollback writes to existing keys are always allowed
            if self.inner.get(key).await?.is_none() {
                if self.allowed.load(Ordering::SeqCst) == 0 {
                    return Err(anyhow!("disk full"));
                }
                self.allowed.fetch_sub(1, Ordering::SeqCst);
            }
            self.inner.put(key, value).await
        }

        async fn scan(&self, prefix: &str) -> Result<BTreeMap<String, String>> {
            self.inner.scan(prefix).await
        }
    }

    fn flaky_context(allowed: usize) -> Arc<CommandContext> {
        let backend = FlakyStorage {
            inner: crate::features::reminders::MemoryStorage::new(),
            allowed: std::sync::atomic::AtomicUsize::new(allowed),
        };
        Arc::new(CommandContext::new(ReminderStore::new(Arc::new(backend))))
    }

    #[test]
    fn test_remind_handler_commands() {
        let handler = RemindHandler;
        let names = handler.command_names();

        assert!(names.contains(&"remind"));
        assert!(names.contains(&"reminders"));
        assert!(names.contains(&"delete"));
        assert_eq!(names.len(), 3);
    }

    #[tokio::test]
    async fn test_relative_reminder_creates_single_main_record() {
        let ctx = context();
        let before = chrono::Utc::now().timestamp();
        let reply = run(&ctx, remind("stretch", "5m")).await;
        let after = chrono::Utc::now().timestamp();

        assert!(!reply.ephemeral);
        let content = reply.content.unwrap();
        assert!(content.contains("stretch"));
        assert!(content.contains("in 5 minutes"));

        let stored = all_for(&ctx, "user-1").await;
        assert_eq!(stored.len(), 1);
        let reminder = &stored[0];
        assert_eq!(reminder.reminder_type, ReminderType::Main);
        assert!(reminder.reminder_time >= before + 300 && reminder.reminder_time <= after + 300);
        assert_eq!(reminder.channel_id, "channel-1");
        assert_eq!(reminder.guild_id, "guild-1");
        assert_eq!(reminder.parent_id, None);
        assert_eq!(reminder.original_date, None);
    }

    #[tokio::test]
    async fn test_deadline_reminder_creates_two_linked_records() {
        let ctx = context();
        let reply = run(&ctx, remind("report", "2024-12-25 14:30")).await;

        let content = reply.content.unwrap();
        assert!(content.contains("2024-12-25 14:30"));
        assert!(content.contains("three days before"));

        let stored = all_for(&ctx, "user-1").await;
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].reminder_type, ReminderType::ThreeDaysBefore);
        assert_eq!(stored[1].reminder_type, ReminderType::Deadline);
        assert!(stored[0].parent_id.is_some());
        assert_eq!(stored[0].parent_id, stored[1].parent_id);
        assert_eq!(stored[1].reminder_time - stored[0].reminder_time, 3 * 86400);
        for reminder in &stored {
            assert_eq!(reminder.original_date.as_deref(), Some("2024-12-25"));
            assert_eq!(reminder.original_time.as_deref(), Some("14:30"));
        }
    }

    #[tokio::test]
    async fn test_bare_date_reports_shifted_deadline() {
        let ctx = context();
        let reply = run(&ctx, remind("taxes", "2024-12-25")).await;
        assert!(reply.content.unwrap().contains("2024-12-24 23:59"));
    }

    #[tokio::test]
    async fn test_invalid_time_is_ephemeral_format_hint() {
        let ctx = context();
        for time in ["soon", "1h30m", "2024-02-30"] {
            let reply = run(&ctx, remind("x", time)).await;
            assert!(reply.ephemeral, "time: {time}");
            assert_eq!(reply.content.as_deref(), Some(INVALID_TIME));
        }
        assert!(all_for(&ctx, "user-1").await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_inputs_are_rejected() {
        let ctx = context();

        let no_time = InboundCommand::new("remind")
            .with_option("message", "hi")
            .from_caller("user-1", "channel-1", Some("guild-1"));
        let reply = run(&ctx, no_time).await;
        assert_eq!(reply, CommandReply::ephemeral(MISSING_INPUT));

        let no_guild = InboundCommand::new("remind")
            .with_option("message", "hi")
            .with_option("time", "5m")
            .from_caller("user-1", "channel-1", None);
        let reply = run(&ctx, no_guild).await;
        assert_eq!(reply, CommandReply::ephemeral(MISSING_IDENTITY));

        assert!(all_for(&ctx, "user-1").await.is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_gives_generic_reply() {
        let ctx = flaky_context(0);
        let reply = run(&ctx, remind("x", "5m")).await;
        assert_eq!(reply, CommandReply::ephemeral(CREATE_FAILED));
    }

    #[tokio::test]
    async fn test_half_created_deadline_is_discarded() {
        let ctx = flaky_context(1);
        let reply = run(&ctx, remind("x", "2030-01-10")).await;
        assert_eq!(reply, CommandReply::ephemeral(CREATE_FAILED));
        assert!(all_for(&ctx, "user-1").await.is_empty());
    }

    #[tokio::test]
    async fn test_list_empty() {
        let ctx = context();
        let reply = run(&ctx, as_user("reminders", "user-1")).await;
        assert_eq!(reply, CommandReply::text(NO_REMINDERS));
    }

    #[tokio::test]
    async fn test_list_shows_numbered_entries_with_ids() {
        let ctx = context();
        run(&ctx, remind("later", "2d")).await;
        run(&ctx, remind("sooner", "1h")).await;
        run(&ctx, InboundCommand { user_id: Some("user-2".into()), ..remind("not mine", "1m") }).await;

        let reply = run(&ctx, as_user("reminders", "user-1")).await;
        let embed = reply.embed.unwrap();
        assert_eq!(embed.title, LIST_TITLE);
        assert_eq!(embed.color, crate::core::embeds::LIST_COLOR);

        let stored = all_for(&ctx, "user-1").await;
        let first = embed.description.find("**1.** sooner").unwrap();
        let second = embed.description.find("**2.** later").unwrap();
        assert!(first < second);
        for reminder in &stored {
            assert!(embed.description.contains(&reminder.id));
            assert!(embed.description.contains(&format!("<t:{}:R>", reminder.reminder_time)));
        }
        assert!(!embed.description.contains("not mine"));
    }

    #[tokio::test]
    async fn test_list_requires_user() {
        let ctx = context();
        let reply = run(&ctx, InboundCommand::new("reminders")).await;
        assert_eq!(reply, CommandReply::ephemeral(MISSING_USER));
    }

    #[tokio::test]
    async fn test_delete_without_id_lists_with_hint() {
        let ctx = context();
        run(&ctx, remind("water plants", "1d")).await;

        let reply = run(&ctx, as_user("delete", "user-1")).await;
        let embed = reply.embed.unwrap();
        assert_eq!(embed.title, DELETE_TITLE);
        assert!(embed.description.contains("water plants"));
        assert!(embed.description.ends_with(DELETE_HINT));

        let empty = run(&ctx, as_user("delete", "user-2")).await;
        assert_eq!(empty, CommandReply::text(NO_REMINDERS));
    }

    #[tokio::test]
    async fn test_delete_hint_survives_long_lists() {
        let ctx = context();
        for i in 0..3 {
            run(&ctx, remind(&format!("{i}{}", "y".repeat(1900)), "1d")).await;
        }

        let reply = run(&ctx, as_user("delete", "user-1")).await;
        let embed = reply.embed.unwrap();
        assert!(embed.description.len() <= EMBED_LIMIT);
        assert!(embed.description.ends_with(DELETE_HINT));
        let built = crate::core::build_embed(&embed);
        let rendered = built.0.get("description").and_then(|v| v.as_str()).unwrap();
        assert!(rendered.ends_with(DELETE_HINT));
    }

    #[tokio::test]
    async fn test_long_message_echo_fits_discord_limit() {
        let ctx = context();
        let long = "z".repeat(6000);

        let relative = run(&ctx, remind(&long, "5m")).await.content.unwrap();
        assert!(relative.len() <= MESSAGE_LIMIT);
        assert!(relative.contains("in 5 minutes"));

        let deadline = run(&ctx, remind(&long, "2099-01-10 12:00")).await.content.unwrap();
        assert!(deadline.len() <= MESSAGE_LIMIT);
        assert!(deadline.contains("Notifications"));

        // stored records keep the full text
        let stored = all_for(&ctx, "user-1").await;
        assert_eq!(stored.len(), 3);
        assert!(stored.iter().all(|r| r.message.len() == 6000));

        let id = stored[0].id.clone();
        let deleted = run(&ctx, as_user("delete", "user-1").with_option("id", id.as_str())).await;
        assert!(deleted.content.unwrap().len() <= MESSAGE_LIMIT);
    }

    #[tokio::test]
    async fn test_delete_own_reminder() {
        let ctx = context();
        run(&ctx, remind("call mom", "1h")).await;
        let id = all_for(&ctx, "user-1").await[0].id.clone();

        let reply = run(&ctx, as_user("delete", "user-1").with_option("id", id.as_str())).await;
        assert!(!reply.ephemeral);
        assert!(reply.content.unwrap().contains("call mom"));
        assert!(all_for(&ctx, "user-1").await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_foreign_reminder_is_not_found() {
        let ctx = context();
        run(&ctx, remind("private", "1h")).await;
        let id = all_for(&ctx, "user-1").await[0].id.clone();

        let reply = run(&ctx, as_user("delete", "intruder").with_option("id", id.as_str())).await;
        assert!(reply.ephemeral);
        assert!(reply.content.unwrap().contains("not found"));

        let untouched = ctx.store.get(&id).await.unwrap().unwrap();
        assert!(untouched.is_active);
    }

    #[tokio::test]
    async fn test_delete_unknown_id_is_not_found() {
        let ctx = context();
        run(&ctx, remind("x", "1h")).await;
        let reply = run(&ctx, as_user("delete", "user-1").with_option("id", "nope")).await;
        assert!(reply.ephemeral);
        assert_eq!(all_for(&ctx, "user-1").await.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_one_deadline_notification_keeps_sibling() {
        let ctx = context();
        run(&ctx, remind("thesis", "2030-06-01 12:00")).await;
        let stored = all_for(&ctx, "user-1").await;
        let early = stored[0].id.clone();

        let reply = run(&ctx, as_user("delete", "user-1").with_option("id", early.as_str())).await;
        assert!(reply.content.unwrap().contains("still scheduled"));

        let remaining = all_for(&ctx, "user-1").await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].reminder_type, ReminderType::Deadline);
    }
}
