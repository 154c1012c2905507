//! Shared context for command handlers
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.0: Shared reminder store

use crate::features::reminders::ReminderStore;

/// Shared context for all command handlers
///
/// The store is created once per deployment and shared by every command.
#[derive(Clone)]
pub struct CommandContext {
    pub store: ReminderStore,
}

impl CommandContext {
    pub fn new(store: ReminderStore) -> Self {
        Self { store }
    }
}
