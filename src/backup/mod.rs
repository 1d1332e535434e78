//! Per-world orchestration of backup, rotation, cleanup and restore.
//!
//! Every `do_*` operation walks the selected worlds in order and isolates
//! failures: one world failing is recorded in the returned [`RunSummary`]
//! and the remaining worlds still run.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::backup::archive::{Archiver, CopyArchiver};
use crate::backup::inventory::{Backup, Inventory, StorageLayout};
use crate::backup::lifecycle::{Created, Lifecycle, RestoreOptions, Restored};
use crate::backup::rotation::RetentionPolicy;
use crate::backup::rsync::RsyncArchiver;
use crate::config::RuntimeConfig;
use crate::error::{BackuprollError, Result};
use crate::hook::{HookRunner, HookSet, ShellHookRunner};
use crate::selector::BackupSelector;
use crate::timestamp::TimestampCodec;
use crate::types::{CopyMethod, RunMode, Tier};

pub mod archive;
pub mod export;
pub mod inventory;
pub mod lifecycle;
pub mod rotation;
pub mod rsync;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Cleanup,
    Backup,
    Rotation,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Step::Cleanup => "cleanup",
            Step::Backup => "backup",
            Step::Rotation => "rotation",
        })
    }
}

#[derive(Debug)]
pub struct WorldFailure {
    pub world: String,
    pub step: Step,
    pub error: BackuprollError,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub completed: Vec<(String, Step)>,
    /// Worlds a step was not attempted for, with the reason.
    pub skipped: Vec<(String, Step, String)>,
    pub failures: Vec<WorldFailure>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed(&self, world: &str) -> bool {
        self.failures.iter().any(|f| f.world == world)
    }

    fn record(&mut self, world: &str, step: Step, result: Result<()>) -> bool {
        match result {
            Ok(()) => {
                self.completed.push((world.to_string(), step));
                true
            }
            Err(err) => {
                error!("{} of {} failed: {}", step, world, err);
                self.failures.push(WorldFailure {
                    world: world.to_string(),
                    step,
                    error: err,
                });
                false
            }
        }
    }

    fn skip(&mut self, world: &str, step: Step, reason: impl Into<String>) {
        let reason = reason.into();
        info!("skip {} of {}: {}", step, world, reason);
        self.skipped.push((world.to_string(), step, reason));
    }
}

/// Which steps a scheduled `cron` run performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CronSteps {
    pub cleanup: bool,
    pub backup: bool,
    pub rotation: bool,
}

impl Default for CronSteps {
    fn default() -> Self {
        Self {
            cleanup: false,
            backup: true,
            rotation: true,
        }
    }
}

pub struct BackupRoll {
    layout: StorageLayout,
    codec: TimestampCodec,
    hooks: HookSet,
    worlds: BTreeMap<String, Option<RetentionPolicy>>,
    runner: Box<dyn HookRunner>,
    archiver: Box<dyn Archiver>,
    run_mode: RunMode,
}

impl BackupRoll {
    /// Wires the shell hook runner and the configured copy method.
    pub fn from_config(cfg: &RuntimeConfig, run_mode: RunMode) -> Self {
        let archiver: Box<dyn Archiver> = match cfg.copy_method {
            CopyMethod::Rsync => Box::new(RsyncArchiver::new(run_mode, cfg.rsync_extra.clone())),
            CopyMethod::Copy => Box::new(CopyArchiver::new(run_mode)),
        };
        Self {
            layout: cfg.layout.clone(),
            codec: cfg.codec.clone(),
            hooks: cfg.hooks.clone(),
            worlds: cfg.worlds.clone(),
            runner: Box::new(ShellHookRunner::new(run_mode)),
            archiver,
            run_mode,
        }
    }

    pub fn with_parts(
        layout: StorageLayout,
        codec: TimestampCodec,
        hooks: HookSet,
        worlds: BTreeMap<String, Option<RetentionPolicy>>,
        runner: Box<dyn HookRunner>,
        archiver: Box<dyn Archiver>,
        run_mode: RunMode,
    ) -> Self {
        Self {
            layout,
            codec,
            hooks,
            worlds,
            runner,
            archiver,
            run_mode,
        }
    }

    pub fn worlds(&self) -> &BTreeMap<String, Option<RetentionPolicy>> {
        &self.worlds
    }

    pub fn lifecycle(&self) -> Lifecycle<'_> {
        Lifecycle {
            layout: &self.layout,
            codec: &self.codec,
            hooks: &self.hooks,
            runner: self.runner.as_ref(),
            archiver: self.archiver.as_ref(),
            run_mode: self.run_mode,
        }
    }

    pub fn inventory(&self, world: &str) -> Result<Inventory> {
        inventory::list(&self.layout, &self.codec, world)
    }

    pub fn do_backup(&self, worlds: &[String]) -> RunSummary {
        self.do_backup_into(worlds, Tier::Recent)
    }

    /// Backs up into `group`: `recent` for scheduled backups, or a manual
    /// group that rotation leaves alone.
    pub fn do_backup_into(&self, worlds: &[String], group: Tier) -> RunSummary {
        let mut summary = RunSummary::default();
        for world in worlds {
            let now = Utc::now().naive_utc();
            let result = self.lifecycle().create_in(world, group, now).map(|_| ());
            summary.record(world, Step::Backup, result);
        }
        summary
    }

    pub fn do_rotation(&self, worlds: &[String]) -> RunSummary {
        let mut summary = RunSummary::default();
        for world in worlds {
            self.rotate_into(world, &mut summary);
        }
        summary
    }

    pub fn do_cleanup(&self, worlds: &[String]) -> RunSummary {
        let mut summary = RunSummary::default();
        for world in worlds {
            let result = self.lifecycle().cleanup(world).map(|removed| {
                if removed.is_empty() {
                    info!("{}: no unfinished backups", world);
                }
            });
            summary.record(world, Step::Cleanup, result);
        }
        summary
    }

    /// Finds the backup of `world` that `selector` picks, in any tier or
    /// manual group.
    pub fn find_backup(&self, world: &str, selector: &BackupSelector) -> Result<Backup> {
        let inventory = self.inventory(world)?;
        selector.resolve(&inventory).cloned().ok_or_else(|| {
            BackuprollError::message(format!("no backup of {} is {}", world, selector))
        })
    }

    /// Restores exactly one world from the backup `selector` picks.
    pub fn do_restore(
        &self,
        world: &str,
        selector: &BackupSelector,
        options: &RestoreOptions,
    ) -> Result<Restored> {
        let backup = self.find_backup(world, selector)?;
        self.lifecycle().restore(world, &backup, options)
    }

    /// Writes the selected backup, or one sub-directory of it, to `output`
    /// as a `.tar.gz`.
    pub fn do_export(
        &self,
        world: &str,
        selector: &BackupSelector,
        subdir: Option<&str>,
        output: &Path,
    ) -> Result<Backup> {
        let backup = self.find_backup(world, selector)?;
        export::export_tar_gz(&backup, subdir, output, self.run_mode)?;
        Ok(backup)
    }

    /// The scheduled entry point: optional cleanup, then backup, then
    /// rotation, world by world. A world whose backup failed in this run is
    /// not rotated.
    pub fn cron(&self, worlds: &[String], steps: CronSteps) -> RunSummary {
        let mut summary = RunSummary::default();
        for world in worlds {
            if steps.cleanup {
                let result = self.lifecycle().cleanup(world).map(|_| ());
                summary.record(world, Step::Cleanup, result);
            }
            let mut backed_up = true;
            if steps.backup {
                let result = self.backup_world(world).map(|_| ());
                backed_up = summary.record(world, Step::Backup, result);
            }
            if !steps.rotation {
                continue;
            }
            if backed_up {
                self.rotate_into(world, &mut summary);
            } else {
                summary.skip(world, Step::Rotation, "backup failed");
            }
        }
        summary
    }

    fn backup_world(&self, world: &str) -> Result<Created> {
        self.lifecycle().create(world)
    }

    fn rotate_into(&self, world: &str, summary: &mut RunSummary) {
        let policy = match self.worlds.get(world) {
            Some(Some(policy)) => *policy,
            Some(None) => return summary.skip(world, Step::Rotation, "no keep policy"),
            None => return summary.skip(world, Step::Rotation, "not configured"),
        };
        let result = self.inventory(world).and_then(|inventory| {
            let report = rotation::rotate(&inventory, &policy, self.run_mode);
            info!(
                "{}: {} promoted, {} deleted, {} kept (safe-mode)",
                world,
                report.promoted.len(),
                report.deleted.len(),
                report.kept.len()
            );
            if report.is_clean() {
                Ok(())
            } else {
                Err(BackuprollError::message(format!(
                    "{} rotation action(s) failed",
                    report.failures.len()
                )))
            }
        });
        if result.is_err() {
            warn!("rotation of {} incomplete", world);
        }
        summary.record(world, Step::Rotation, result);
    }
}
