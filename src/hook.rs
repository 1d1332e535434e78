//! Shell commands configured to run around backups and restores.

use tracing::{debug, info};

use crate::error::{HookFailure, HookOutcome};
use crate::types::{HookKind, RunMode};
use crate::util::command::{describe_command, run_command, shell_command};

pub const WORLD_PLACEHOLDER: &str = "{world}";

pub fn render(template: &str, world: &str) -> String {
    template.replace(WORLD_PLACEHOLDER, world)
}

/// Runs one hook command for a world. Implementations report a nonzero exit
/// or a command that could not be started as a `HookFailure`.
pub trait HookRunner {
    fn run(&self, kind: HookKind, template: &str, world: &str) -> Result<(), HookFailure>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookSet {
    pub pre_backup: Option<String>,
    pub post_backup: Option<String>,
    pub fail_backup: Option<String>,
    pub pre_restore: Option<String>,
    pub post_restore: Option<String>,
}

impl HookSet {
    pub fn template(&self, kind: HookKind) -> Option<&str> {
        let template = match kind {
            HookKind::PreBackup => &self.pre_backup,
            HookKind::PostBackup => &self.post_backup,
            HookKind::FailBackup => &self.fail_backup,
            HookKind::PreRestore => &self.pre_restore,
            HookKind::PostRestore => &self.post_restore,
        };
        template.as_deref().filter(|t| !t.trim().is_empty())
    }

    /// Runs the hook for `kind` if one is configured; unset hooks succeed.
    pub fn run(
        &self,
        runner: &dyn HookRunner,
        kind: HookKind,
        world: &str,
    ) -> Result<(), HookFailure> {
        match self.template(kind) {
            Some(template) => runner.run(kind, template, world),
            None => {
                debug!("no {} command configured for {}", kind, world);
                Ok(())
            }
        }
    }
}

/// Runs hooks through `sh -c`.
#[derive(Debug, Clone, Copy)]
pub struct ShellHookRunner {
    run_mode: RunMode,
}

impl ShellHookRunner {
    pub fn new(run_mode: RunMode) -> Self {
        Self { run_mode }
    }
}

impl HookRunner for ShellHookRunner {
    fn run(&self, kind: HookKind, template: &str, world: &str) -> Result<(), HookFailure> {
        let command_line = render(template, world);
        let mut cmd = shell_command(&command_line);
        if self.run_mode.dry_run {
            info!("dry-run: {} command: {}", kind, describe_command(&cmd));
            return Ok(());
        }
        info!("running {} command for {}: {}", kind, world, command_line);
        let failure = |outcome| HookFailure {
            kind,
            command: command_line.clone(),
            outcome,
        };
        match run_command(&mut cmd, self.run_mode) {
            Ok(0) => Ok(()),
            Ok(code) => Err(failure(HookOutcome::Exit(code))),
            Err(err) => Err(failure(HookOutcome::Spawn(err.to_string()))),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{all_hooks, FakeHooks};
    use super::*;

    #[test]
    fn render_substitutes_every_placeholder() {
        assert_eq!(
            render("save-off {world} && sync {world}", "alice"),
            "save-off alice && sync alice"
        );
    }

    #[test]
    fn unset_hook_is_a_successful_noop() {
        let hooks = HookSet::default();
        let runner = FakeHooks::default();
        assert!(hooks.run(&runner, HookKind::PreBackup, "alice").is_ok());
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn configured_hook_is_rendered_for_world() {
        let runner = FakeHooks::default();
        all_hooks()
            .run(&runner, HookKind::PostRestore, "bob")
            .expect("hook");
        assert_eq!(
            runner.calls.borrow()[0],
            (HookKind::PostRestore, "post-restore bob".to_string())
        );
    }

    #[test]
    fn shell_runner_reports_exit_status() {
        let runner = ShellHookRunner::new(RunMode::default());
        assert!(runner.run(HookKind::PreBackup, "true {world}", "w").is_ok());
        let err = runner
            .run(HookKind::PreBackup, "exit 3 # {world}", "w")
            .unwrap_err();
        assert_eq!(err.outcome, HookOutcome::Exit(3));
        assert_eq!(err.command, "exit 3 # w");
    }

    #[test]
    fn shell_runner_skips_in_dry_run() {
        let runner = ShellHookRunner::new(RunMode {
            dry_run: true,
            ..RunMode::default()
        });
        assert!(runner.run(HookKind::PreBackup, "false", "w").is_ok());
    }
}
