use std::process::{Command, Stdio};

use tracing::{debug, info};

use crate::error::{BackuprollError, Result};
use crate::types::RunMode;

pub fn describe_command(cmd: &Command) -> String {
    let program = cmd.get_program().to_string_lossy();
    let args: Vec<String> = cmd
        .get_args()
        .map(|a| a.to_string_lossy().to_string())
        .collect();
    format!("{} {}", program, args.join(" "))
}

pub fn maybe_print_command(cmd: &Command, run_mode: RunMode) {
    if run_mode.dry_run {
        info!("dry-run: {}", describe_command(cmd));
    } else {
        debug!("run: {}", describe_command(cmd));
    }
}

/// Runs `cmd` to completion. Output is inherited when verbose and discarded
/// otherwise. A process killed by a signal reports exit code 1.
pub fn run_command(cmd: &mut Command, run_mode: RunMode) -> Result<i32> {
    maybe_print_command(cmd, run_mode);
    if !run_mode.verbose {
        cmd.stdout(Stdio::null()).stderr(Stdio::null());
    }
    let status = cmd.status().map_err(|e| {
        BackuprollError::message(format!("{}: {}", cmd.get_program().to_string_lossy(), e))
    })?;
    Ok(status.code().unwrap_or(1))
}

pub fn shell_command(command_line: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command_line);
    cmd
}

pub fn run_nice_ionice(args: &[String], run_mode: RunMode) -> Result<i32> {
    let mut cmd = Command::new("nice");
    cmd.arg("-n")
        .arg("19")
        .arg("ionice")
        .arg("-c")
        .arg("3")
        .arg("-n7");
    for arg in args {
        cmd.arg(arg);
    }
    if run_mode.dry_run {
        maybe_print_command(&cmd, run_mode);
        Ok(0)
    } else {
        run_command(&mut cmd, run_mode)
    }
}
