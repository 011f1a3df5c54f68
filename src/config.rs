use anyhow::{Context, Result};
use std::time::Duration;

/// Process configuration, read once at startup from the environment
/// (`.env` is loaded first by the binary).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    /// Snapshot the store file before applying migrations to an existing
    /// database.
    pub backup_on_migrate: bool,
    pub ticket_sweep_interval: Duration,
    pub giveaway_sweep_interval: Duration,
    pub ban_sweep_interval: Duration,
    /// How long a "final warning" leaves a ticket in PendingClose before
    /// the sweep archives it.
    pub warning_window: chrono::Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        Ok(Self {
            database_url,
            backup_on_migrate: parse_flag(
                "BACKUP_ON_MIGRATE",
                std::env::var("BACKUP_ON_MIGRATE").ok(),
                true,
            )?,
            ticket_sweep_interval: Duration::from_secs(parse_u64(
                "TICKET_SWEEP_INTERVAL_SECS",
                std::env::var("TICKET_SWEEP_INTERVAL_SECS").ok(),
                60,
            )?),
            giveaway_sweep_interval: Duration::from_secs(parse_u64(
                "GIVEAWAY_SWEEP_INTERVAL_SECS",
                std::env::var("GIVEAWAY_SWEEP_INTERVAL_SECS").ok(),
                30,
            )?),
            ban_sweep_interval: Duration::from_secs(parse_u64(
                "BAN_SWEEP_INTERVAL_SECS",
                std::env::var("BAN_SWEEP_INTERVAL_SECS").ok(),
                300,
            )?),
            warning_window: chrono::Duration::hours(parse_u64(
                "TICKET_WARNING_WINDOW_HOURS",
                std::env::var("TICKET_WARNING_WINDOW_HOURS").ok(),
                12,
            )? as i64),
        })
    }
}

fn parse_u64(name: &str, raw: Option<String>, default: u64) -> Result<u64> {
    match raw {
        None => Ok(default),
        Some(v) => v
            .parse()
            .with_context(|| format!("{name} must be an integer, got {v:?}")),
    }
}

fn parse_flag(name: &str, raw: Option<String>, default: bool) -> Result<bool> {
    match raw.as_deref() {
        None => Ok(default),
        Some("1") | Some("true") | Some("yes") => Ok(true),
        Some("0") | Some("false") | Some("no") => Ok(false),
        Some(v) => anyhow::bail!("{name} must be a boolean, got {v:?}"),
    }
}
