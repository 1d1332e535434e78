use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::types::Tier;

#[derive(Parser, Debug)]
#[command(
    name = "backuproll",
    version,
    about = "Scheduled world backups with recent/daily/weekly/monthly rotation"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Log what would happen without running hooks, copying, moving or deleting.
    #[arg(long, alias = "simulate", global = true)]
    pub dry_run: bool,
    /// Promote backups but never delete any.
    #[arg(long, global = true)]
    pub safe: bool,
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Scheduled run: backup then rotation.
    Cron(CronArgs),
    Backup(BackupArgs),
    Rotate(WorldArgs),
    /// Remove backups left unfinished by an interrupted run.
    Cleanup(WorldArgs),
    List(WorldArgs),
    Restore(RestoreArgs),
    /// Write a backup to a .tar.gz file.
    Export(ExportArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct WorldArgs {
    /// Select every configured world (the default when no world is named).
    #[arg(long)]
    pub all: bool,
    pub worlds: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct CronArgs {
    #[command(flatten)]
    pub select: WorldArgs,
    #[arg(long)]
    pub cleanup: bool,
    #[arg(long)]
    pub no_backup: bool,
    #[arg(long)]
    pub no_rotation: bool,
}

#[derive(Args, Debug, Clone)]
pub struct BackupArgs {
    #[command(flatten)]
    pub select: WorldArgs,
    /// Where the backup goes: recent (rotated), pre-update or reverted (kept by hand).
    #[arg(long, default_value = "recent", value_parser = parse_group)]
    pub group: Tier,
}

#[derive(Args, Debug, Clone)]
pub struct PickArgs {
    pub world: String,
    /// Exact backup name.
    #[arg(long, conflicts_with = "before")]
    pub name: Option<String>,
    /// Newest backup taken at or before this time.
    #[arg(long)]
    pub before: Option<String>,
    /// Only this sub-directory of the backup.
    #[arg(long)]
    pub subdir: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct RestoreArgs {
    #[command(flatten)]
    pub pick: PickArgs,
    #[arg(long)]
    pub no_pre_hook: bool,
    #[arg(long)]
    pub no_post_hook: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub pick: PickArgs,
    #[arg(long, short = 'o')]
    pub output: PathBuf,
}

fn parse_group(value: &str) -> Result<Tier, String> {
    let group: Tier = value.parse()?;
    if group == Tier::Recent || group.is_manual() {
        Ok(group)
    } else {
        Err(format!("backups cannot be created in {}", group))
    }
}
