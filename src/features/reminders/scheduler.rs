//! Due-reminder sweeper
//!
//! Every tick: load the reminders that are due, post each one to its channel,
//! and deactivate the ones that were delivered. A failed send leaves the record
//! active so the next sweep retries it. Delivery is at-least-once.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::{debug, error, info, warn};
use serenity::http::Http;
use serenity::model::id::ChannelId;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, timeout, MissedTickBehavior};

use super::model::{Reminder, ReminderType, ReminderUpdate};
use super::store::ReminderStore;
use crate::core::truncate_for_message;

/// Upper bound for a single delivery
pub const SEND_TIMEOUT: Duration = Duration::from_secs(15);

/// Outbound "post message to channel" API
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, channel_id: &str, content: &str) -> Result<()>;
}

/// Posts through the Discord REST client
pub struct HttpMessageSender {
    http: Arc<Http>,
}

impl HttpMessageSender {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl MessageSender for HttpMessageSender {
    async fn send(&self, channel_id: &str, content: &str) -> Result<()> {
        let channel: u64 = channel_id
            .parse()
            .map_err(|_| anyhow!("Invalid channel id: {channel_id}"))?;
        ChannelId(channel).say(&self.http, content).await?;
        Ok(())
    }
}

/// Outcome of one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub due: usize,
    pub delivered: usize,
    pub failed: usize,
}

/// Build the channel message for a due reminder
pub fn format_delivery(reminder: &Reminder) -> String {
    let mention = format!("<@{}>", reminder.user_id);
    let content = match reminder.reminder_type {
        ReminderType::ThreeDaysBefore => {
            format!("🔔 **3 days left** {mention}: {}", reminder.message)
        }
        ReminderType::Deadline => {
            let due_at = match reminder.original_time.as_deref() {
                Some(time) if time != "00:00" => time,
                _ => "23:59",
            };
            format!(
                "⚠️ **Due today** {mention}: {}\n📅 The deadline is today at {due_at}",
                reminder.message
            )
        }
        ReminderType::Main if reminder.original_date.is_some() => {
            format!("⏰ **Deadline reached** {mention}: {}", reminder.message)
        }
        ReminderType::Main => format!("⏰ **Reminder** {mention}: {}", reminder.message),
    };

    truncate_for_message(&content)
}

/// Periodically delivers due reminders
pub struct ReminderScheduler {
    store: ReminderStore,
    period: Duration,
}

impl ReminderScheduler {
    pub fn new(store: ReminderStore, period: Duration) -> Self {
        Self { store, period }
    }

    /// Sweep forever, once per period
    ///
    /// Sweeps run back to back on one task, so they never overlap.
    pub async fn run(self, sender: Arc<dyn MessageSender>) {
        info!("⏰ Reminder scheduler started (every {:?})", self.period);

        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let now = chrono::Utc::now().timestamp();
            let report = self.sweep(sender.as_ref(), now).await;

            if report.due > 0 {
                info!(
                    "⏰ Sweep finished: {} due, {} delivered, {} failed",
                    report.due, report.delivered, report.failed
                );
            }
        }
    }

    /// Deliver everything due at `now`
    ///
    /// Per-record failures are logged and counted, never propagated.
    pub async fn sweep(&self, sender: &dyn MessageSender, now: i64) -> SweepReport {
        let due = match self.store.list_due(now).await {
            Ok(due) => due,
            Err(e) => {
                error!("Failed to fetch due reminders: {e}");
                return SweepReport::default();
            }
        };

        let mut report = SweepReport {
            due: due.len(),
            ..Default::default()
        };

        for reminder in &due {
            match self.deliver(sender, reminder).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!("Failed to deliver reminder {}: {e}", reminder.id);
                    report.failed += 1;
                }
            }
        }

        report
    }

    async fn deliver(&self, sender: &dyn MessageSender, reminder: &Reminder) -> Result<()> {
        let content = format_delivery(reminder);

        timeout(SEND_TIMEOUT, sender.send(&reminder.channel_id, &content))
            .await
            .map_err(|_| anyhow!("send timed out after {SEND_TIMEOUT:?}"))??;

        self.store
            .update(&reminder.id, ReminderUpdate::deactivate())
            .await?;

        debug!(
            "Delivered {} reminder {} to channel {}",
            reminder.reminder_type, reminder.id, reminder.channel_id
        );
        Ok(())
    }
}
