//! Reminder record types
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use serde::{Deserialize, Serialize};

/// Which delivery event a record represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderType {
    /// Plain relative-time reminder
    Main,
    /// Early warning at 00:00 three days before a deadline
    ThreeDaysBefore,
    /// Day-of notification for a deadline
    Deadline,
}

impl ReminderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderType::Main => "main",
            ReminderType::ThreeDaysBefore => "three_days_before",
            ReminderType::Deadline => "deadline",
        }
    }
}

impl std::fmt::Display for ReminderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted reminder record
///
/// Everything except `is_active` is fixed at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: String,
    pub user_id: String,
    pub channel_id: String,
    pub guild_id: String,
    pub message: String,
    /// Delivery instant, seconds since the Unix epoch
    pub reminder_time: i64,
    /// Creation instant, seconds since the Unix epoch
    pub created_at: i64,
    pub is_active: bool,
    pub reminder_type: ReminderType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_time: Option<String>,
    /// Groups the notifications spawned from one deadline request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl Reminder {
    /// Active and scheduled at or before `now`
    pub fn is_due(&self, now: i64) -> bool {
        self.is_active && self.reminder_time <= now
    }
}

/// A reminder before the store assigns `id` and `created_at`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReminder {
    pub user_id: String,
    pub channel_id: String,
    pub guild_id: String,
    pub message: String,
    pub reminder_time: i64,
    pub reminder_type: ReminderType,
    pub original_date: Option<String>,
    pub original_time: Option<String>,
    pub parent_id: Option<String>,
}

impl NewReminder {
    pub(crate) fn into_reminder(self, id: String, created_at: i64) -> Reminder {
        Reminder {
            id,
            user_id: self.user_id,
            channel_id: self.channel_id,
            guild_id: self.guild_id,
            message: self.message,
            reminder_time: self.reminder_time,
            created_at,
            is_active: true,
            reminder_type: self.reminder_type,
            original_date: self.original_date,
            original_time: self.original_time,
            parent_id: self.parent_id,
        }
    }
}

/// Partial update merged into an existing record
///
/// Absent fields are left untouched. `id` and `createdAt` are not updatable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminder_time: Option<i64>,
}

impl ReminderUpdate {
    /// The update the sweeper and delete path apply
    pub fn deactivate() -> Self {
        Self {
            is_active: Some(false),
            ..Default::default()
        }
    }

    /// True when the update changes nothing but `is_active = false`
    pub fn is_deactivation_only(&self) -> bool {
        self.is_active == Some(false)
            && self.message.is_none()
            && self.channel_id.is_none()
            && self.reminder_time.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Reminder {
        NewReminder {
            user_id: "u1".to_string(),
            channel_id: "c1".to_string(),
            guild_id: "g1".to_string(),
            message: "pay rent".to_string(),
            reminder_time: 1_000,
            reminder_type: ReminderType::Main,
            original_date: None,
            original_time: None,
            parent_id: None,
        }
        .into_reminder("abc".to_string(), 10)
    }

    #[test]
    fn test_serializes_camel_case_and_omits_absent_fields() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["reminderTime"], 1_000);
        assert_eq!(json["isActive"], true);
        assert_eq!(json["reminderType"], "main");
        assert!(json.get("originalDate").is_none());
        assert!(json.get("parentId").is_none());
    }

    #[test]
    fn test_reminder_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&ReminderType::ThreeDaysBefore).unwrap(),
            "\"three_days_before\""
        );
        let parsed: ReminderType = serde_json::from_str("\"deadline\"").unwrap();
        assert_eq!(parsed, ReminderType::Deadline);
    }

    #[test]
    fn test_is_due() {
        let mut reminder = sample();
        assert!(reminder.is_due(1_000));
        assert!(reminder.is_due(2_000));
        assert!(!reminder.is_due(999));

        reminder.is_active = false;
        assert!(!reminder.is_due(2_000));
    }

    #[test]
    fn test_update_serializes_only_present_fields() {
        let json = serde_json::to_value(ReminderUpdate::deactivate()).unwrap();
        assert_eq!(json, serde_json::json!({ "isActive": false }));
        assert!(ReminderUpdate::deactivate().is_deactivation_only());

        let update = ReminderUpdate {
            message: Some("x".to_string()),
            ..ReminderUpdate::deactivate()
        };
        assert!(!update.is_deactivation_only());
    }
}
