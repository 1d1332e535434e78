use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::backup::{BackupRoll, CronSteps};
use crate::cli::args::{Cli, Command};
use crate::cli::commands::{list, restore, summary};
use crate::config::load_config;
use crate::selector::select_worlds;
use crate::types::RunMode;
use crate::util::lock;

pub use crate::cli::commands::{exit_for_error, EXIT_FAILED, EXIT_LOCKED, EXIT_OK, EXIT_USAGE};

const CONFIG_FILE: &str = "/etc/backuproll.yaml";

pub mod args;
pub mod commands;

/// Runs one invocation and returns the process exit code.
pub fn run() -> Result<i32> {
    let cli = parse_cli();
    init_tracing(cli.verbose);

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
    let run_mode = RunMode {
        dry_run: cli.dry_run,
        safe_mode: cli.safe,
        verbose: cli.verbose,
    };
    let cfg = load_config(&config_path)?;
    debug!("loaded {}", config_path.display());

    let _lock = if run_mode.dry_run || matches!(cli.command, Command::List(_)) {
        None
    } else {
        Some(lock::acquire(&cfg.pidfile)?)
    };
    let roll = BackupRoll::from_config(&cfg, run_mode);

    let code = match cli.command {
        Command::Cron(args) => {
            let worlds = select_worlds(roll.worlds(), &args.select.worlds, args.select.all)?;
            let steps = CronSteps {
                cleanup: args.cleanup,
                backup: !args.no_backup,
                rotation: !args.no_rotation,
            };
            summary::report(&roll.cron(&worlds, steps))
        }
        Command::Backup(args) => {
            let worlds = select_worlds(roll.worlds(), &args.select.worlds, args.select.all)?;
            summary::report(&roll.do_backup_into(&worlds, args.group))
        }
        Command::Rotate(args) => {
            let worlds = select_worlds(roll.worlds(), &args.worlds, args.all)?;
            summary::report(&roll.do_rotation(&worlds))
        }
        Command::Cleanup(args) => {
            let worlds = select_worlds(roll.worlds(), &args.worlds, args.all)?;
            summary::report(&roll.do_cleanup(&worlds))
        }
        Command::List(args) => {
            let worlds = select_worlds(roll.worlds(), &args.worlds, args.all)?;
            list::run_list(&roll, &worlds, &cfg.codec)?
        }
        Command::Restore(args) => restore::run_restore(&roll, &cfg.codec, &args)
            .with_context(|| format!("restore {}", args.pick.world))?,
        Command::Export(args) => restore::run_export(&roll, &cfg.codec, &args)
            .with_context(|| format!("export {}", args.pick.world))?,
    };
    Ok(code)
}

fn parse_cli() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                err.exit();
            }
            eprintln!("{}", err);
            std::process::exit(EXIT_USAGE);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
