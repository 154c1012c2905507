//! # Reminders Feature
//!
//! Relative and deadline reminders: time parsing, record storage and the
//! periodic delivery sweep.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.0.0: Relative and deadline reminders with a key-value record store and delivery sweep

pub mod model;
pub mod scheduler;
pub mod storage;
pub mod store;
pub mod time_parser;

pub use model::{NewReminder, Reminder, ReminderType, ReminderUpdate};
pub use scheduler::{format_delivery, HttpMessageSender, MessageSender, ReminderScheduler, SweepReport};
pub use storage::{KeyValueStore, MemoryStorage, SqliteStorage};
pub use store::{ReminderStore, StoreError, REMINDER_KEY_PREFIX};
pub use time_parser::{format_relative, parse_deadline, parse_relative, DeadlineSchedule, Notification};
