//! Process-wide pidfile lock. Held for the whole CLI invocation; the library
//! operations never take it themselves.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{BackuprollError, Result};

pub struct LockGuard {
    path: PathBuf,
}

impl LockGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// What an existing pidfile says about its owner.
#[derive(Debug, PartialEq, Eq)]
enum Holder {
    Running(u32),
    /// Unreadable contents or a pid with no `/proc` entry.
    Stale,
    /// The file disappeared while we looked at it.
    Gone,
}

fn holder(path: &Path) -> io::Result<Holder> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Holder::Gone),
        Err(err) => return Err(err),
    };
    Ok(match text.trim().parse::<u32>() {
        Ok(pid) if Path::new("/proc").join(pid.to_string()).exists() => Holder::Running(pid),
        _ => Holder::Stale,
    })
}

fn write_pidfile(path: &Path) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    writeln!(file, "{}", std::process::id())
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        // Only remove a pidfile that still names this process.
        if let Ok(text) = fs::read_to_string(&self.path) {
            if text.trim() == std::process::id().to_string() {
                let _ = fs::remove_file(&self.path);
            }
        }
    }
}

const ATTEMPTS: usize = 3;

/// Takes the pidfile lock. A pidfile naming a dead process is treated as
/// stale and replaced.
pub fn acquire(path: &Path) -> Result<LockGuard> {
    let lock_err = |e: io::Error| BackuprollError::Lock(format!("failed to lock {}: {}", path.display(), e));
    for _ in 0..ATTEMPTS {
        match write_pidfile(path) {
            Ok(()) => {
                return Ok(LockGuard {
                    path: path.to_path_buf(),
                })
            }
            Err(err) if err.kind() != io::ErrorKind::AlreadyExists => return Err(lock_err(err)),
            Err(_) => {}
        }
        match holder(path).map_err(lock_err)? {
            Holder::Running(pid) => {
                return Err(BackuprollError::Lock(format!(
                    "process {} holds {}",
                    pid,
                    path.display()
                )))
            }
            Holder::Gone => continue,
            Holder::Stale => {
                warn!("removing stale pidfile {}", path.display());
                match fs::remove_file(path) {
                    Ok(()) => {}
                    Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                    Err(err) => return Err(lock_err(err)),
                }
            }
        }
    }
    Err(BackuprollError::Lock(format!(
        "could not take {} after {} attempts",
        path.display(),
        ATTEMPTS
    )))
}
