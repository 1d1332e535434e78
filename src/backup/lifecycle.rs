//! Creating a world's backups and restoring a world from one.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDateTime, Utc};
use tracing::{error, info, warn};

use crate::backup::archive::Archiver;
use crate::backup::inventory::{self, in_progress_path, Backup, StorageLayout, LATEST_LINK};
use crate::error::{BackuprollError, ConfigError, HookFailure, Result};
use crate::hook::{HookRunner, HookSet};
use crate::timestamp::TimestampCodec;
use crate::types::{HookKind, RunMode, Tier};
use crate::util::paths::{ensure_dir, is_safe_name, remove_path, replace_symlink};

#[derive(Debug)]
pub struct Created {
    pub backup: Backup,
    /// The post-backup hook failed; the backup itself is complete.
    pub post_hook: Option<HookFailure>,
}

#[derive(Debug)]
pub struct Restored {
    pub backup: Backup,
    /// The post-restore hook failed; the restore itself is complete.
    pub post_hook: Option<HookFailure>,
}

/// How much of a backup to restore and which restore hooks run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreOptions {
    /// Restore only this sub-directory of the backup into the same
    /// sub-directory of the live world.
    pub subdir: Option<String>,
    pub pre_hook: bool,
    pub post_hook: bool,
}

impl Default for RestoreOptions {
    fn default() -> Self {
        Self {
            subdir: None,
            pre_hook: true,
            post_hook: true,
        }
    }
}

pub struct Lifecycle<'a> {
    pub layout: &'a StorageLayout,
    pub codec: &'a TimestampCodec,
    pub hooks: &'a HookSet,
    pub runner: &'a dyn HookRunner,
    pub archiver: &'a dyn Archiver,
    pub run_mode: RunMode,
}

impl<'a> Lifecycle<'a> {
    pub fn create(&self, world: &str) -> Result<Created> {
        self.create_at(world, Utc::now().naive_utc())
    }

    /// Backs up `world` into the recent tier, named after `now`.
    pub fn create_at(&self, world: &str, now: NaiveDateTime) -> Result<Created> {
        self.create_in(world, Tier::Recent, now)
    }

    /// Backs up `world` into `group`, which is `recent` or one of the manual
    /// groups. Only backups in `recent` move the latest links.
    pub fn create_in(&self, world: &str, group: Tier, now: NaiveDateTime) -> Result<Created> {
        if group != Tier::Recent && !group.is_manual() {
            return Err(BackuprollError::message(format!(
                "backups are created in recent or a manual group, not {}",
                group
            )));
        }
        info!("backup {} into {}", world, group);
        if let Err(failure) = self.hooks.run(self.runner, HookKind::PreBackup, world) {
            error!("{}; not backing up {}", failure, world);
            self.run_fail_hook(world);
            return Err(failure.into());
        }

        let backup = match self.copy_world(world, group, now) {
            Ok(backup) => backup,
            Err(err) => {
                error!("backup of {} failed: {}", world, err);
                self.run_fail_hook(world);
                return Err(err);
            }
        };
        info!("backup complete: {}", backup.path().display());
        if group == Tier::Recent {
            self.update_latest_links(&backup);
        }

        let post_hook = self.hooks.run(self.runner, HookKind::PostBackup, world).err();
        if let Some(failure) = &post_hook {
            warn!("{}; backup {} kept", failure, backup.name);
        }
        Ok(Created { backup, post_hook })
    }

    fn copy_world(&self, world: &str, group: Tier, now: NaiveDateTime) -> Result<Backup> {
        let timestamp = self.codec.truncate(now);
        let backup = Backup::new(
            self.layout,
            world,
            group,
            self.codec.encode(&timestamp),
            timestamp,
        );
        let dest = backup.path();
        if fs::symlink_metadata(&dest).is_ok() {
            return Err(BackuprollError::message(format!(
                "backup {} already exists",
                dest.display()
            )));
        }
        ensure_dir(&self.layout.tier_dir(world, group), self.run_mode)?;

        let previous = inventory::list(self.layout, self.codec, world)
            .ok()
            .and_then(|inv| inv.latest_in(Tier::Recent).map(Backup::path));
        let staging = in_progress_path(&dest);
        let source = self.layout.world_dir(world);
        let copied = self
            .archiver
            .create(&source, &staging, previous.as_deref())
            .and_then(|()| self.finalize(&staging, &dest));
        if let Err(err) = copied {
            if !self.run_mode.dry_run && fs::symlink_metadata(&staging).is_ok() {
                if let Err(e) = remove_path(&staging) {
                    warn!("could not remove partial backup {}: {}", staging.display(), e);
                }
            }
            return Err(err);
        }
        Ok(backup)
    }

    fn finalize(&self, staging: &Path, dest: &Path) -> Result<()> {
        if self.run_mode.dry_run {
            info!("dry-run: mv {} {}", staging.display(), dest.display());
            return Ok(());
        }
        fs::rename(staging, dest).map_err(|e| BackuprollError::io("finalize", staging, e))
    }

    fn update_latest_links(&self, backup: &Backup) {
        let links = [
            self.layout.tier_dir(&backup.world, Tier::Recent).join(LATEST_LINK),
            self.layout.backup_dir(&backup.world).join(LATEST_LINK),
        ];
        for link in links {
            if let Err(err) = replace_symlink(&backup.path(), &link, self.run_mode) {
                warn!("{}", err);
            }
        }
    }

    fn run_fail_hook(&self, world: &str) {
        if let Err(failure) = self.hooks.run(self.runner, HookKind::FailBackup, world) {
            warn!("{}", failure);
        }
    }

    /// Replaces the live world directory, or one sub-directory of it, with
    /// the contents of `backup`.
    pub fn restore(&self, world: &str, backup: &Backup, options: &RestoreOptions) -> Result<Restored> {
        let mut artifact = backup.path();
        let mut target = self.layout.world_dir(world);
        if let Some(subdir) = &options.subdir {
            if !is_safe_name(subdir) {
                return Err(ConfigError::Invalid(format!(
                    "restore sub-directory {} must be a single plain name",
                    subdir
                ))
                .into());
            }
            artifact.push(subdir);
            target.push(subdir);
        }
        info!(
            "restore {} from {} backup {}",
            target.display(),
            backup.tier,
            backup.name
        );
        if options.pre_hook {
            if let Err(failure) = self.hooks.run(self.runner, HookKind::PreRestore, world) {
                error!("{}; not restoring {}", failure, world);
                return Err(failure.into());
            }
        } else {
            info!("skip {} command for {}", HookKind::PreRestore, world);
        }
        self.archiver.restore(&artifact, &target)?;
        info!("restore complete: {}", world);

        let post_hook = if options.post_hook {
            self.hooks.run(self.runner, HookKind::PostRestore, world).err()
        } else {
            info!("skip {} command for {}", HookKind::PostRestore, world);
            None
        };
        if let Some(failure) = &post_hook {
            warn!("{}", failure);
        }
        Ok(Restored {
            backup: backup.clone(),
            post_hook,
        })
    }

    /// Removes artifacts left in `*.in-progress` state by an interrupted run.
    pub fn cleanup(&self, world: &str) -> Result<Vec<PathBuf>> {
        let leftovers = inventory::in_progress_paths(self.layout, world)?;
        for path in &leftovers {
            if self.run_mode.dry_run {
                info!("dry-run: rm -rf {}", path.display());
                continue;
            }
            info!("remove unfinished backup {}", path.display());
            remove_path(path).map_err(|e| BackuprollError::io("remove", path, e))?;
        }
        Ok(leftovers)
    }
}
