//! Scanning a world's backup folder into per-tier, time-ordered lists.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::error::{BackuprollError, Result};
use crate::timestamp::TimestampCodec;
use crate::types::Tier;

pub const IN_PROGRESS_SUFFIX: &str = ".in-progress";
pub const LATEST_LINK: &str = "latest";

/// Where live worlds and their backups are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    pub backup_root: PathBuf,
    pub world_root: PathBuf,
}

impl StorageLayout {
    pub fn new(backup_root: impl Into<PathBuf>, world_root: impl Into<PathBuf>) -> Self {
        Self {
            backup_root: backup_root.into(),
            world_root: world_root.into(),
        }
    }

    pub fn world_dir(&self, world: &str) -> PathBuf {
        self.world_root.join(world)
    }

    pub fn backup_dir(&self, world: &str) -> PathBuf {
        self.backup_root.join(world)
    }

    pub fn tier_dir(&self, world: &str, tier: Tier) -> PathBuf {
        self.backup_dir(world).join(tier.as_str())
    }
}

/// One backup artifact. The tier is a property of where the artifact lives;
/// the name is the encoded timestamp and never changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backup {
    pub world: String,
    pub name: String,
    pub timestamp: NaiveDateTime,
    pub tier: Tier,
    base: PathBuf,
}

impl Backup {
    pub fn new(
        layout: &StorageLayout,
        world: &str,
        tier: Tier,
        name: impl Into<String>,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            world: world.to_string(),
            name: name.into(),
            timestamp,
            tier,
            base: layout.backup_dir(world),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.base.join(self.tier.as_str()).join(&self.name)
    }

    /// The same artifact relocated into `tier`.
    pub fn in_tier(&self, tier: Tier) -> Backup {
        Backup {
            tier,
            ..self.clone()
        }
    }

    pub fn promoted(&self) -> Option<Backup> {
        self.tier.successor().map(|tier| self.in_tier(tier))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Inventory {
    pub world: String,
    tiers: [Vec<Backup>; 6],
    /// Entries whose names did not decode under the date format.
    pub skipped: Vec<PathBuf>,
    /// Artifacts left behind by an interrupted create.
    pub in_progress: Vec<PathBuf>,
}

impl Inventory {
    pub fn new(world: &str) -> Self {
        Self {
            world: world.to_string(),
            ..Self::default()
        }
    }

    pub fn tier(&self, tier: Tier) -> &[Backup] {
        &self.tiers[tier.index()]
    }

    pub fn count(&self, tier: Tier) -> usize {
        self.tiers[tier.index()].len()
    }

    pub fn push(&mut self, backup: Backup) {
        self.tiers[backup.tier.index()].push(backup);
    }

    /// Restores the oldest-first order of every tier.
    pub fn sort(&mut self) {
        for backups in &mut self.tiers {
            backups.sort_by(|a, b| {
                a.timestamp
                    .cmp(&b.timestamp)
                    .then_with(|| a.name.cmp(&b.name))
            });
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Backup> {
        self.tiers.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.tiers.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn latest_in(&self, tier: Tier) -> Option<&Backup> {
        self.tier(tier).last()
    }
}

/// Scans every tier folder of `world`. A missing folder is an empty tier.
/// Names that fail to decode are logged and collected in `skipped`.
pub fn list(layout: &StorageLayout, codec: &TimestampCodec, world: &str) -> Result<Inventory> {
    let mut inventory = Inventory::new(world);
    for tier in Tier::ALL {
        let dir = layout.tier_dir(world, tier);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
            Err(err) => return Err(BackuprollError::io("read", &dir, err)),
        };
        for entry in entries {
            let entry = entry.map_err(|e| BackuprollError::io("read", &dir, e))?;
            let path = entry.path();
            let file_type = entry
                .file_type()
                .map_err(|e| BackuprollError::io("stat", &path, e))?;
            if file_type.is_symlink() {
                debug!("skip symlink {}", path.display());
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name.ends_with(IN_PROGRESS_SUFFIX) {
                inventory.in_progress.push(path);
                continue;
            }
            match codec.decode(&name) {
                Ok(timestamp) => inventory.push(Backup::new(layout, world, tier, name, timestamp)),
                Err(err) => {
                    warn!("skip {}: {}", path.display(), err);
                    inventory.skipped.push(path);
                }
            }
        }
    }
    inventory.sort();
    Ok(inventory)
}

/// Lists only the artifacts in `*.in-progress` state across all tiers.
pub fn in_progress_paths(layout: &StorageLayout, world: &str) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for tier in Tier::ALL {
        let dir = layout.tier_dir(world, tier);
        if !dir.is_dir() {
            continue;
        }
        for entry in fs::read_dir(&dir).map_err(|e| BackuprollError::io("read", &dir, e))? {
            let entry = entry.map_err(|e| BackuprollError::io("read", &dir, e))?;
            if entry.file_name().to_string_lossy().ends_with(IN_PROGRESS_SUFFIX) {
                out.push(entry.path());
            }
        }
    }
    out.sort();
    Ok(out)
}

pub fn in_progress_path(final_path: &Path) -> PathBuf {
    let mut name = final_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(IN_PROGRESS_SUFFIX);
    final_path.with_file_name(name)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use chrono::NaiveDate;

    pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    /// Creates a backup directory with one marker file and returns its value.
    pub fn make_backup(
        layout: &StorageLayout,
        codec: &TimestampCodec,
        world: &str,
        tier: Tier,
        timestamp: NaiveDateTime,
    ) -> Backup {
        let backup = Backup::new(layout, world, tier, codec.encode(&timestamp), timestamp);
        fs::create_dir_all(backup.path()).expect("mkdir backup");
        fs::write(backup.path().join("level.dat"), backup.name.as_bytes()).expect("write");
        backup
    }
}
