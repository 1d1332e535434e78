use crate::backup::RunSummary;
use crate::cli::commands::{EXIT_FAILED, EXIT_OK};

/// Prints per-world failures and returns the exit code for the run.
pub fn report(summary: &RunSummary) -> i32 {
    if summary.is_success() {
        return EXIT_OK;
    }
    for failure in &summary.failures {
        eprintln!("{}: {} failed: {}", failure.world, failure.step, failure.error);
    }
    EXIT_FAILED
}
