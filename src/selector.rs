//! Choosing which worlds an operation runs on, and which backup a restore uses.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use tracing::warn;

use crate::backup::inventory::{Backup, Inventory};
use crate::backup::rotation::RetentionPolicy;
use crate::error::{ConfigError, Result};
use crate::types::Tier;
use crate::util::paths::is_safe_name;

/// Resolves the worlds to operate on. No explicit selection (or `all`) means
/// every configured world. Explicitly named worlds that are not configured
/// are still accepted for backup and restore; they just have no retention.
pub fn select_worlds(
    configured: &BTreeMap<String, Option<RetentionPolicy>>,
    requested: &[String],
    all: bool,
) -> Result<Vec<String>> {
    if all || requested.is_empty() {
        if configured.is_empty() {
            return Err(ConfigError::Invalid(
                "no world selected and none found in the config file".to_string(),
            )
            .into());
        }
        return Ok(configured.keys().cloned().collect());
    }
    let mut selected: Vec<String> = Vec::new();
    for name in requested {
        if !is_safe_name(name) {
            return Err(ConfigError::Invalid(format!(
                "world {} name must use only letters, digits, '.', '-', '_'",
                name
            ))
            .into());
        }
        if !configured.contains_key(name) {
            warn!("world {} is not configured", name);
        }
        if !selected.contains(name) {
            selected.push(name.clone());
        }
    }
    Ok(selected)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupSelector {
    Latest,
    /// A backup whose name is exactly this encoded timestamp.
    Exact(String),
    /// The newest backup taken at or before this time.
    Before(NaiveDateTime),
}

impl BackupSelector {
    /// Looks across all tiers of `inventory`.
    pub fn resolve<'a>(&self, inventory: &'a Inventory) -> Option<&'a Backup> {
        match self {
            BackupSelector::Latest => inventory.iter().max_by_key(|b| (b.timestamp, tier_rank(b))),
            BackupSelector::Exact(name) => inventory.iter().find(|b| &b.name == name),
            BackupSelector::Before(limit) => inventory
                .iter()
                .filter(|b| b.timestamp <= *limit)
                .max_by_key(|b| (b.timestamp, tier_rank(b))),
        }
    }
}

impl fmt::Display for BackupSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackupSelector::Latest => f.write_str("latest"),
            BackupSelector::Exact(name) => write!(f, "named {}", name),
            BackupSelector::Before(time) => write!(f, "at or before {}", time),
        }
    }
}

/// Prefers the densest tier when two tiers hold the same timestamp.
fn tier_rank(backup: &Backup) -> std::cmp::Reverse<Tier> {
    std::cmp::Reverse(backup.tier)
}
