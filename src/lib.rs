// Core layer - shared types and configuration
pub mod core;

// Features layer - reminder parsing, storage and delivery
pub mod features;

// Application layer
pub mod command_handler;
pub mod commands;

pub use core::Config;

pub use features::reminders::{
    HttpMessageSender, MessageSender, ReminderScheduler, ReminderStore, StoreError,
};
