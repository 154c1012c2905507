//! Runtime configuration from environment variables
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use anyhow::{anyhow, Result};
use std::time::Duration;

const DEFAULT_DATABASE_PATH: &str = "reminders.db";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Where reminder records are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Sqlite,
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Ok(StorageBackend::Sqlite),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow!(
                "Unknown REMINDER_STORAGE '{other}' (expected 'sqlite' or 'memory')"
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    /// Register commands for this guild only (instant updates while developing)
    pub discord_guild_id: Option<u64>,
    pub database_path: String,
    pub storage_backend: StorageBackend,
    pub sweep_interval: Duration,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let discord_token =
            get("DISCORD_TOKEN").ok_or_else(|| anyhow!("DISCORD_TOKEN must be set"))?;

        let storage_backend = match get("REMINDER_STORAGE") {
            Some(raw) => raw.parse()?,
            None => StorageBackend::Sqlite,
        };

        let sweep_interval_secs = match get("SWEEP_INTERVAL_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|e| anyhow!("Invalid SWEEP_INTERVAL_SECS '{raw}': {e}"))?,
            None => DEFAULT_SWEEP_INTERVAL_SECS,
        };
        let discord_guild_id = get("DISCORD_GUILD_ID")
            .map(|raw| {
                raw.trim()
                    .parse::<u64>()
                    .map_err(|e| anyhow!("Invalid DISCORD_GUILD_ID '{raw}': {e}"))
            })
            .transpose()?;

        if sweep_interval_secs == 0 {
            return Err(anyhow!("SWEEP_INTERVAL_SECS must be greater than zero"));
        }

        Ok(Config {
            discord_token,
            discord_guild_id,
            database_path: get("DATABASE_PATH").unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string()),
            storage_backend,
            sweep_interval: Duration::from_secs(sweep_interval_secs),
            log_level: get("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        })
    }
}
