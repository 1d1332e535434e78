//! Tiered retention: decide which backups move to a coarser tier and which
//! are deleted, then carry that out on disk.
//!
//! Tiers are processed in order recent, daily, weekly, monthly. The excess of
//! a tier (its oldest members beyond the configured count) is split into
//! promotions to the next tier and deletions:
//!
//! - recent to daily keeps the earliest excess backup of each calendar day,
//! - daily to weekly keeps the earliest of each ISO week,
//! - weekly to monthly keeps only the single oldest excess backup,
//! - monthly excess is deleted.
//!
//! A bucket (day or week) that the next tier already holds a backup for gets
//! no new promotion. Promoted backups count towards the next tier's limit in
//! the same pass. The manual groups `pre-update` and `reverted` are left alone.

use std::collections::HashSet;
use std::fs;

use chrono::{Datelike, IsoWeek, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::backup::inventory::{Backup, Inventory};
use crate::error::{BackuprollError, Result};
use crate::types::{RunMode, Tier};
use crate::util::paths::{ensure_dir, remove_path};

/// Maximum number of backups kept per tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct RetentionPolicy {
    pub recent: usize,
    pub daily: usize,
    pub weekly: usize,
    pub monthly: usize,
}

impl RetentionPolicy {
    pub fn limit(&self, tier: Tier) -> usize {
        match tier {
            Tier::Recent => self.recent,
            Tier::Daily => self.daily,
            Tier::Weekly => self.weekly,
            Tier::Monthly => self.monthly,
            // Manual groups are never rotated.
            Tier::PreUpdate | Tier::Reverted => usize::MAX,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Promote { from: Backup, to: Backup },
    Delete(Backup),
}

impl Action {
    pub fn describe(&self) -> String {
        match self {
            Action::Promote { from, to } => {
                format!("promote {} from {} to {}", from.name, from.tier, to.tier)
            }
            Action::Delete(backup) => format!("delete {} backup {}", backup.tier, backup.name),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RotationPlan {
    pub world: String,
    /// In execution order. A backup promoted by an earlier action may be
    /// promoted again or deleted by a later one.
    pub actions: Vec<Action>,
}

impl RotationPlan {
    pub fn promotions(&self) -> impl Iterator<Item = (&Backup, &Backup)> {
        self.actions.iter().filter_map(|a| match a {
            Action::Promote { from, to } => Some((from, to)),
            Action::Delete(_) => None,
        })
    }

    pub fn deletions(&self) -> impl Iterator<Item = &Backup> {
        self.actions.iter().filter_map(|a| match a {
            Action::Delete(backup) => Some(backup),
            Action::Promote { .. } => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Bucket {
    Day(NaiveDate),
    Week(IsoWeek),
}

/// Bucket a backup of `tier` competes in for promotion; `None` when the
/// tier promotes only its single oldest excess backup.
fn bucket(tier: Tier, timestamp: &NaiveDateTime) -> Option<Bucket> {
    match tier {
        Tier::Recent => Some(Bucket::Day(timestamp.date())),
        Tier::Daily => Some(Bucket::Week(timestamp.iso_week())),
        Tier::Weekly | Tier::Monthly | Tier::PreUpdate | Tier::Reverted => None,
    }
}

/// Decides, for each excess backup (oldest first), whether it is promoted.
fn select_promotions(tier: Tier, excess: &[Backup], next: &[Backup]) -> Vec<bool> {
    let mut taken: HashSet<Bucket> = next
        .iter()
        .filter_map(|b| bucket(tier, &b.timestamp))
        .collect();
    excess
        .iter()
        .enumerate()
        .map(|(i, b)| match bucket(tier, &b.timestamp) {
            Some(key) => taken.insert(key),
            None => i == 0,
        })
        .collect()
}

/// Computes the promotions and deletions that bring every tier of
/// `inventory` within `policy`. Pure: nothing on disk is touched.
pub fn plan(inventory: &Inventory, policy: &RetentionPolicy) -> RotationPlan {
    let mut tiers: Vec<Vec<Backup>> = Tier::ALL
        .iter()
        .map(|&t| inventory.tier(t).to_vec())
        .collect();
    let mut actions = Vec::new();

    for tier in Tier::ROTATED {
        let keep = policy.limit(tier);
        let current = &mut tiers[tier.index()];
        if current.len() <= keep {
            continue;
        }
        let excess: Vec<Backup> = current.drain(..current.len() - keep).collect();
        let Some(next) = tier.successor() else {
            actions.extend(excess.into_iter().map(Action::Delete));
            continue;
        };
        let promote = select_promotions(tier, &excess, &tiers[next.index()]);
        for (backup, promote) in excess.into_iter().zip(promote) {
            if promote {
                let to = backup.in_tier(next);
                tiers[next.index()].push(to.clone());
                actions.push(Action::Promote { from: backup, to });
            } else {
                actions.push(Action::Delete(backup));
            }
        }
        tiers[next.index()].sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.name.cmp(&b.name))
        });
    }

    RotationPlan {
        world: inventory.world.clone(),
        actions,
    }
}

#[derive(Debug, Default)]
pub struct RotationReport {
    pub promoted: Vec<Backup>,
    pub deleted: Vec<Backup>,
    /// Deletions not carried out because of safe mode.
    pub kept: Vec<Backup>,
    pub failures: Vec<(Action, BackuprollError)>,
}

impl RotationReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Executes `plan`. A failed action is recorded and the remaining actions
/// still run; deletions are never retried.
pub fn apply(plan: &RotationPlan, run_mode: RunMode) -> RotationReport {
    let mut report = RotationReport::default();
    for action in &plan.actions {
        let result = match action {
            Action::Promote { from, to } => promote(from, to, run_mode).map(|()| {
                report.promoted.push(to.clone());
            }),
            Action::Delete(backup) if run_mode.safe_mode => {
                info!("skip delete (safe-mode): {}", backup.path().display());
                report.kept.push(backup.clone());
                Ok(())
            }
            Action::Delete(backup) => delete(backup, run_mode).map(|()| {
                report.deleted.push(backup.clone());
            }),
        };
        if let Err(err) = result {
            error!("{} failed for {}: {}", action.describe(), plan.world, err);
            report.failures.push((action.clone(), err));
        }
    }
    report
}

/// Plans and applies rotation for one world's inventory.
pub fn rotate(inventory: &Inventory, policy: &RetentionPolicy, run_mode: RunMode) -> RotationReport {
    for path in &inventory.skipped {
        warn!("not rotating unrecognised entry {}", path.display());
    }
    let plan = plan(inventory, policy);
    if plan.is_empty() {
        info!("{}: all tiers within limits", inventory.world);
    }
    apply(&plan, run_mode)
}

fn promote(from: &Backup, to: &Backup, run_mode: RunMode) -> Result<()> {
    let src = from.path();
    let dest = to.path();
    if run_mode.dry_run {
        info!("dry-run: mv {} {}", src.display(), dest.display());
        return Ok(());
    }
    if let Some(parent) = dest.parent() {
        ensure_dir(parent, run_mode)?;
    }
    if fs::symlink_metadata(&dest).is_ok() {
        return Err(BackuprollError::message(format!(
            "{} already exists",
            dest.display()
        )));
    }
    info!("promote: {} -> {}", src.display(), dest.display());
    fs::rename(&src, &dest).map_err(|e| BackuprollError::io("move", &src, e))
}

fn delete(backup: &Backup, run_mode: RunMode) -> Result<()> {
    let path = backup.path();
    if run_mode.dry_run {
        info!("dry-run: rm -rf {}", path.display());
        return Ok(());
    }
    info!("delete: {}", path.display());
    remove_path(&path).map_err(|e| BackuprollError::io("delete", &path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::inventory::testing::{at, make_backup};
    use crate::backup::inventory::{list, StorageLayout};
    use crate::timestamp::TimestampCodec;
    use chrono::Duration;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn layout() -> StorageLayout {
        StorageLayout::new("/backup", "/worlds")
    }

    fn inventory_of(entries: &[(Tier, NaiveDateTime)]) -> Inventory {
        let layout = layout();
        let codec = TimestampCodec::default();
        let mut inv = Inventory::new("alice");
        for (tier, ts) in entries {
            inv.push(Backup::new(&layout, "alice", *tier, codec.encode(ts), *ts));
        }
        inv.sort();
        inv
    }

    fn policy(recent: usize, daily: usize, weekly: usize, monthly: usize) -> RetentionPolicy {
        RetentionPolicy {
            recent,
            daily,
            weekly,
            monthly,
        }
    }

    /// Inventory after the plan is carried out, without touching disk.
    fn simulate(inv: &Inventory, plan: &RotationPlan) -> Inventory {
        let mut all: Vec<Backup> = inv.iter().cloned().collect();
        for action in &plan.actions {
            match action {
                Action::Promote { from, to } => {
                    let idx = all.iter().position(|b| b == from).expect("promoted exists");
                    all[idx] = to.clone();
                }
                Action::Delete(backup) => {
                    let idx = all.iter().position(|b| b == backup).expect("deleted exists");
                    all.remove(idx);
                }
            }
        }
        let mut out = Inventory::new(&inv.world);
        for backup in all {
            out.push(backup);
        }
        out.sort();
        out
    }

    #[test]
    fn within_limits_is_a_noop() {
        let inv = inventory_of(&[
            (Tier::Recent, at(2024, 3, 1, 8, 0)),
            (Tier::Daily, at(2024, 2, 28, 8, 0)),
            (Tier::Monthly, at(2024, 1, 1, 8, 0)),
        ]);
        assert!(plan(&inv, &policy(1, 1, 0, 1)).is_empty());
        assert!(plan(&inv, &policy(5, 5, 5, 5)).is_empty());
    }

    #[test]
    fn excess_recent_promotes_earliest_of_day() {
        let inv = inventory_of(&[
            (Tier::Recent, at(2024, 3, 1, 8, 0)),
            (Tier::Recent, at(2024, 3, 1, 12, 0)),
            (Tier::Recent, at(2024, 3, 1, 20, 0)),
            (Tier::Recent, at(2024, 3, 2, 8, 0)),
            (Tier::Recent, at(2024, 3, 2, 20, 0)),
        ]);
        let plan = plan(&inv, &policy(3, 10, 10, 10));

        let promoted: Vec<_> = plan.promotions().map(|(from, _)| from.timestamp).collect();
        let deleted: Vec<_> = plan.deletions().map(|b| b.timestamp).collect();
        assert_eq!(promoted, vec![at(2024, 3, 1, 8, 0)]);
        assert_eq!(deleted, vec![at(2024, 3, 1, 12, 0)]);

        let after = simulate(&inv, &plan);
        assert_eq!(after.count(Tier::Recent), 3);
        assert_eq!(after.count(Tier::Daily), 1);
        assert_eq!(after.tier(Tier::Daily)[0].timestamp, at(2024, 3, 1, 8, 0));
    }

    #[test]
    fn one_promotion_per_excess_day() {
        let mut entries = Vec::new();
        for day in 1..=3 {
            for hour in [6, 12, 18] {
                entries.push((Tier::Recent, at(2024, 4, day, hour, 0)));
            }
        }
        let inv = inventory_of(&entries);
        let plan = plan(&inv, &policy(1, 10, 10, 10));

        let promoted: Vec<_> = plan.promotions().map(|(from, _)| from.timestamp).collect();
        assert_eq!(
            promoted,
            vec![at(2024, 4, 1, 6, 0), at(2024, 4, 2, 6, 0), at(2024, 4, 3, 6, 0)]
        );
        assert_eq!(plan.deletions().count(), 5);
    }

    #[test]
    fn day_already_in_daily_tier_is_not_promoted_again() {
        let inv = inventory_of(&[
            (Tier::Daily, at(2024, 3, 1, 6, 0)),
            (Tier::Recent, at(2024, 3, 1, 8, 0)),
            (Tier::Recent, at(2024, 3, 2, 8, 0)),
        ]);
        let plan = plan(&inv, &policy(1, 10, 10, 10));
        assert_eq!(plan.promotions().count(), 0);
        let deleted: Vec<_> = plan.deletions().map(|b| b.timestamp).collect();
        assert_eq!(deleted, vec![at(2024, 3, 1, 8, 0)]);
    }

    #[test]
    fn daily_excess_buckets_by_iso_week() {
        // 2024-03-04 is a Monday.
        let inv = inventory_of(&[
            (Tier::Daily, at(2024, 3, 2, 8, 0)),
            (Tier::Daily, at(2024, 3, 3, 8, 0)),
            (Tier::Daily, at(2024, 3, 4, 8, 0)),
            (Tier::Daily, at(2024, 3, 5, 8, 0)),
            (Tier::Daily, at(2024, 3, 6, 8, 0)),
        ]);
        let plan = plan(&inv, &policy(5, 1, 10, 10));

        let promoted: Vec<_> = plan
            .promotions()
            .map(|(from, to)| (from.timestamp, to.tier))
            .collect();
        assert_eq!(
            promoted,
            vec![
                (at(2024, 3, 2, 8, 0), Tier::Weekly),
                (at(2024, 3, 4, 8, 0), Tier::Weekly)
            ]
        );
        let deleted: Vec<_> = plan.deletions().map(|b| b.timestamp).collect();
        assert_eq!(deleted, vec![at(2024, 3, 3, 8, 0), at(2024, 3, 5, 8, 0)]);
    }

    #[test]
    fn iso_week_keeps_years_apart() {
        // Same ISO week number 1, different years.
        let inv = inventory_of(&[
            (Tier::Weekly, at(2023, 1, 2, 8, 0)),
            (Tier::Daily, at(2024, 1, 2, 8, 0)),
            (Tier::Daily, at(2024, 1, 20, 8, 0)),
        ]);
        let plan = plan(&inv, &policy(0, 1, 10, 10));
        let promoted: Vec<_> = plan.promotions().map(|(from, _)| from.timestamp).collect();
        assert_eq!(promoted, vec![at(2024, 1, 2, 8, 0)]);
    }

    #[test]
    fn weekly_excess_promotes_only_oldest() {
        let inv = inventory_of(&[
            (Tier::Weekly, at(2024, 1, 1, 8, 0)),
            (Tier::Weekly, at(2024, 1, 8, 8, 0)),
            (Tier::Weekly, at(2024, 2, 5, 8, 0)),
            (Tier::Weekly, at(2024, 2, 12, 8, 0)),
        ]);
        let plan = plan(&inv, &policy(0, 0, 1, 10));
        let promoted: Vec<_> = plan
            .promotions()
            .map(|(from, to)| (from.timestamp, to.tier))
            .collect();
        assert_eq!(promoted, vec![(at(2024, 1, 1, 8, 0), Tier::Monthly)]);
        assert_eq!(plan.deletions().count(), 2);
    }

    #[test]
    fn monthly_excess_deletes_oldest() {
        let inv = inventory_of(&[
            (Tier::Monthly, at(2024, 1, 1, 8, 0)),
            (Tier::Monthly, at(2024, 2, 1, 8, 0)),
            (Tier::Monthly, at(2024, 3, 1, 8, 0)),
            (Tier::Monthly, at(2024, 4, 1, 8, 0)),
        ]);
        let plan = plan(&inv, &policy(0, 0, 0, 2));
        let deleted: Vec<_> = plan.deletions().map(|b| b.timestamp).collect();
        assert_eq!(deleted, vec![at(2024, 1, 1, 8, 0), at(2024, 2, 1, 8, 0)]);
        assert_eq!(plan.promotions().count(), 0);
    }

    #[test]
    fn promotion_overflow_cascades_to_next_tier() {
        let inv = inventory_of(&[
            (Tier::Daily, at(2024, 2, 1, 8, 0)),
            (Tier::Recent, at(2024, 3, 1, 8, 0)),
            (Tier::Recent, at(2024, 3, 2, 8, 0)),
        ]);
        let plan = plan(&inv, &policy(1, 1, 5, 5));
        let moves: Vec<_> = plan
            .promotions()
            .map(|(from, to)| (from.timestamp, from.tier, to.tier))
            .collect();
        assert_eq!(
            moves,
            vec![
                (at(2024, 3, 1, 8, 0), Tier::Recent, Tier::Daily),
                (at(2024, 2, 1, 8, 0), Tier::Daily, Tier::Weekly),
            ]
        );
        let after = simulate(&inv, &plan);
        assert_eq!(after.count(Tier::Recent), 1);
        assert_eq!(after.count(Tier::Daily), 1);
        assert_eq!(after.count(Tier::Weekly), 1);
    }

    #[test]
    fn zero_limits_pass_backups_through_to_deletion() {
        let inv = inventory_of(&[(Tier::Recent, at(2024, 3, 1, 8, 0))]);
        let plan = plan(&inv, &policy(0, 0, 0, 0));
        let after = simulate(&inv, &plan);
        assert!(after.is_empty());
        assert_eq!(plan.deletions().count(), 1);
        assert_eq!(plan.deletions().next().unwrap().tier, Tier::Monthly);
    }

    #[test]
    fn rotation_bounds_tiers_and_loses_nothing_without_cause() {
        let start = at(2023, 11, 20, 0, 0);
        let policies = [
            policy(3, 7, 4, 6),
            policy(6, 10, 4, 6),
            policy(1, 1, 1, 1),
            policy(0, 3, 0, 2),
            policy(24, 0, 2, 0),
        ];
        for keep in policies {
            let mut inv = Inventory::new("alice");
            let mut seed: u64 = 7;
            // Simulate two months of irregular runs, rotating after each.
            for _ in 0..400 {
                seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let offset = Duration::minutes(((seed >> 33) % (60 * 24 * 60)) as i64);
                let ts = start + offset;
                if inv.iter().any(|b| b.timestamp == ts) {
                    continue;
                }
                let codec = TimestampCodec::default();
                inv.push(Backup::new(&layout(), "alice", Tier::Recent, codec.encode(&ts), ts));
                inv.sort();

                let before: BTreeSet<_> = inv.iter().map(|b| b.name.clone()).collect();
                let planned = plan(&inv, &keep);
                let after = simulate(&inv, &planned);
                for tier in Tier::ROTATED {
                    assert!(after.count(tier) <= keep.limit(tier), "{:?} {}", keep, tier);
                }
                let remaining: BTreeSet<_> = after.iter().map(|b| b.name.clone()).collect();
                let deleted: BTreeSet<_> = planned.deletions().map(|b| b.name.clone()).collect();
                assert!(remaining.is_disjoint(&deleted));
                let union: BTreeSet<_> = remaining.union(&deleted).cloned().collect();
                assert_eq!(union, before);
                assert!(plan(&after, &keep).is_empty());
                inv = after;
            }
        }
    }

    #[test]
    fn manual_groups_are_never_rotated() {
        let inv = inventory_of(&[
            (Tier::PreUpdate, at(2020, 1, 1, 0, 0)),
            (Tier::PreUpdate, at(2020, 1, 2, 0, 0)),
            (Tier::Reverted, at(2020, 1, 3, 0, 0)),
            (Tier::Recent, at(2024, 1, 1, 0, 0)),
            (Tier::Recent, at(2024, 1, 2, 0, 0)),
        ]);
        let planned = plan(&inv, &policy(1, 0, 0, 0));
        assert!(planned.promotions().all(|(from, _)| !from.tier.is_manual()));
        assert!(planned.deletions().all(|b| !b.tier.is_manual()));
        assert_eq!(planned.deletions().count(), 1);
        let after = simulate(&inv, &planned);
        assert_eq!(after.count(Tier::PreUpdate), 2);
        assert_eq!(after.count(Tier::Reverted), 1);
    }

    #[test]
    fn apply_moves_and_deletes_on_disk() {
        let dir = TempDir::new().expect("tempdir");
        let layout = StorageLayout::new(dir.path().join("backup"), dir.path().join("worlds"));
        let codec = TimestampCodec::default();
        for (day, hour) in [(1, 8), (1, 12), (1, 20), (2, 8), (2, 20)] {
            make_backup(&layout, &codec, "alice", Tier::Recent, at(2024, 3, day, hour, 0));
        }
        let inv = list(&layout, &codec, "alice").expect("list");

        let report = rotate(&inv, &policy(3, 5, 5, 5), RunMode::default());
        assert!(report.is_clean());
        assert_eq!(report.promoted.len(), 1);
        assert_eq!(report.deleted.len(), 1);

        let after = list(&layout, &codec, "alice").expect("list");
        assert_eq!(after.count(Tier::Recent), 3);
        let daily = &after.tier(Tier::Daily)[0];
        assert_eq!(daily.timestamp, at(2024, 3, 1, 8, 0));
        assert_eq!(
            fs::read_to_string(daily.path().join("level.dat")).unwrap(),
            daily.name
        );
    }

    #[test]
    fn safe_mode_promotes_but_keeps_deletions() {
        let dir = TempDir::new().expect("tempdir");
        let layout = StorageLayout::new(dir.path().join("backup"), dir.path().join("worlds"));
        let codec = TimestampCodec::default();
        for hour in [8, 12, 20] {
            make_backup(&layout, &codec, "alice", Tier::Recent, at(2024, 3, 1, hour, 0));
        }
        let inv = list(&layout, &codec, "alice").expect("list");
        let run_mode = RunMode {
            safe_mode: true,
            ..RunMode::default()
        };

        let report = rotate(&inv, &policy(1, 5, 5, 5), run_mode);
        assert_eq!(report.promoted.len(), 1);
        assert_eq!(report.kept.len(), 1);
        assert!(report.deleted.is_empty());
        let after = list(&layout, &codec, "alice").expect("list");
        assert_eq!(after.count(Tier::Recent), 2);
        assert_eq!(after.count(Tier::Daily), 1);
    }

    #[test]
    fn dry_run_leaves_disk_untouched() {
        let dir = TempDir::new().expect("tempdir");
        let layout = StorageLayout::new(dir.path().join("backup"), dir.path().join("worlds"));
        let codec = TimestampCodec::default();
        for month in 1..=4 {
            make_backup(&layout, &codec, "alice", Tier::Monthly, at(2024, month, 1, 8, 0));
        }
        let inv = list(&layout, &codec, "alice").expect("list");
        let run_mode = RunMode {
            dry_run: true,
            ..RunMode::default()
        };

        let report = rotate(&inv, &policy(0, 0, 0, 2), run_mode);
        assert_eq!(report.deleted.len(), 2);
        assert_eq!(list(&layout, &codec, "alice").expect("list").count(Tier::Monthly), 4);
    }

    #[test]
    fn failed_action_does_not_stop_the_rest() {
        let dir = TempDir::new().expect("tempdir");
        let layout = StorageLayout::new(dir.path().join("backup"), dir.path().join("worlds"));
        let codec = TimestampCodec::default();
        let gone = make_backup(&layout, &codec, "alice", Tier::Monthly, at(2024, 1, 1, 8, 0));
        make_backup(&layout, &codec, "alice", Tier::Monthly, at(2024, 2, 1, 8, 0));
        make_backup(&layout, &codec, "alice", Tier::Monthly, at(2024, 3, 1, 8, 0));
        let inv = list(&layout, &codec, "alice").expect("list");
        fs::remove_dir_all(gone.path()).expect("remove behind the engine's back");

        let report = rotate(&inv, &policy(0, 0, 0, 1), RunMode::default());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.deleted.len(), 1);
        let after = list(&layout, &codec, "alice").expect("list");
        assert_eq!(after.tier(Tier::Monthly)[0].timestamp, at(2024, 3, 1, 8, 0));
    }

    #[test]
    fn promotion_never_overwrites_target() {
        let dir = TempDir::new().expect("tempdir");
        let layout = StorageLayout::new(dir.path().join("backup"), dir.path().join("worlds"));
        let codec = TimestampCodec::default();
        let weekly = make_backup(&layout, &codec, "alice", Tier::Weekly, at(2024, 1, 1, 8, 0));
        let clash = make_backup(&layout, &codec, "alice", Tier::Monthly, at(2024, 1, 1, 8, 0));
        fs::write(clash.path().join("level.dat"), "monthly").expect("write");

        let plan = RotationPlan {
            world: "alice".to_string(),
            actions: vec![Action::Promote {
                from: weekly.clone(),
                to: weekly.in_tier(Tier::Monthly),
            }],
        };
        let report = apply(&plan, RunMode::default());
        assert_eq!(report.failures.len(), 1);
        assert!(weekly.path().exists());
        assert_eq!(
            fs::read_to_string(clash.path().join("level.dat")).unwrap(),
            "monthly"
        );
    }
}
