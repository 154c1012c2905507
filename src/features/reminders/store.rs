//! Reminder store
//!
//! Keeps every reminder record as JSON under `reminder:<id>` in a single shared
//! key space. Listing operations scan the whole prefix and filter in memory,
//! which assumes hundreds of records rather than millions.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use log::{debug, info, warn};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use super::model::{NewReminder, Reminder, ReminderUpdate};
use super::storage::{KeyValueStore, MemoryStorage};

/// Key prefix shared by all reminder records
pub const REMINDER_KEY_PREFIX: &str = "reminder:";

/// Errors raised by [`ReminderStore`]
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record with this id
    #[error("reminder not found: {0}")]
    NotFound(String),

    /// The record is inactive and can no longer change
    #[error("reminder {0} is no longer active")]
    Terminal(String),

    /// The persistence backend failed
    #[error(transparent)]
    Backend(#[from] anyhow::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn reminder_key(id: &str) -> String {
    format!("{REMINDER_KEY_PREFIX}{id}")
}

/// Reminder records over a [`KeyValueStore`]
#[derive(Clone)]
pub struct ReminderStore {
    backend: Arc<dyn KeyValueStore>,
}

impl ReminderStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// A store over a fresh [`MemoryStorage`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Persist a new record, assigning its id and creation time
    pub async fn create(&self, new_reminder: NewReminder) -> Result<Reminder, StoreError> {
        let id = Uuid::new_v4().to_string();
        let created_at = chrono::Utc::now().timestamp();
        let reminder = new_reminder.into_reminder(id, created_at);

        self.save(&reminder).await?;
        info!(
            "Created {} reminder {} for user {} at {}",
            reminder.reminder_type, reminder.id, reminder.user_id, reminder.reminder_time
        );

        Ok(reminder)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Reminder>, StoreError> {
        match self.backend.get(&reminder_key(id)).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Active reminders owned by `user_id`, earliest first
    ///
    /// When `guild_id` is given only that guild's reminders are returned.
    pub async fn list_active_for_user(
        &self,
        user_id: &str,
        guild_id: Option<&str>,
    ) -> Result<Vec<Reminder>, StoreError> {
        let mut reminders: Vec<Reminder> = self
            .scan_all()
            .await?
            .into_iter()
            .filter(|r| r.is_active && r.user_id == user_id)
            .filter(|r| guild_id.map_or(true, |gid| r.guild_id == gid))
            .collect();

        reminders.sort_by_key(|r| r.reminder_time);
        Ok(reminders)
    }

    /// Active reminders with `reminder_time <= now`, in no particular order
    pub async fn list_due(&self, now: i64) -> Result<Vec<Reminder>, StoreError> {
        let due: Vec<Reminder> = self
            .scan_all()
            .await?
            .into_iter()
            .filter(|r| r.is_due(now))
            .collect();

        debug!("{} reminders due at {now}", due.len());
        Ok(due)
    }

    /// Merge `update` into the record with `id`
    ///
    /// Deactivating an already inactive record is a no-op; any other change to
    /// an inactive record fails with [`StoreError::Terminal`].
    pub async fn update(&self, id: &str, update: ReminderUpdate) -> Result<Reminder, StoreError> {
        let existing = self
            .get(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        if !existing.is_active {
            if update.is_deactivation_only() {
                return Ok(existing);
            }
            return Err(StoreError::Terminal(id.to_string()));
        }

        let mut merged = serde_json::to_value(&existing)?;
        if let (Some(target), serde_json::Value::Object(fields)) =
            (merged.as_object_mut(), serde_json::to_value(&update)?)
        {
            target.extend(fields);
        }

        let updated: Reminder = serde_json::from_value(merged)?;
        self.save(&updated).await?;
        debug!("Updated reminder {id}");

        Ok(updated)
    }

    /// Remove a reminder from scheduling
    ///
    /// Records are deactivated rather than erased. Other notifications sharing
    /// the same `parent_id` stay scheduled.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.update(id, ReminderUpdate::deactivate()).await?;
        info!("Deleted reminder {id}");
        Ok(())
    }

    async fn save(&self, reminder: &Reminder) -> Result<(), StoreError> {
        let raw = serde_json::to_string(reminder)?;
        self.backend.put(&reminder_key(&reminder.id), raw).await?;
        Ok(())
    }

    /// Every decodable record; malformed values are logged and skipped
    async fn scan_all(&self) -> Result<Vec<Reminder>, StoreError> {
        Ok(self
            .backend
            .scan(REMINDER_KEY_PREFIX)
            .await?
            .into_iter()
            .filter_map(|(key, raw)| match serde_json::from_str(&raw) {
                Ok(reminder) => Some(reminder),
                Err(e) => {
                    warn!("Skipping malformed record {key}: {e}");
                    None
                }
            })
            .collect())
    }
}
