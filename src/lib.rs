pub mod backup;
pub mod cli;
pub mod config;
pub mod error;
pub mod hook;
pub mod selector;
pub mod timestamp;
pub mod types;
pub mod util;

pub use backup::{BackupRoll, CronSteps, RunSummary};
pub use error::{BackuprollError, Result};
