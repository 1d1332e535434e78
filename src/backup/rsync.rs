use std::io;
use std::path::Path;

use crate::backup::archive::{require_dir, Archiver};
use crate::error::{BackuprollError, Result};
use crate::types::RunMode;
use crate::util::command::run_nice_ionice;

/// rsync exit code for files that vanished during transfer. A live world
/// writes while it is copied, so this is not treated as a failure.
const RSYNC_VANISHED: i32 = 24;

/// Copies with `rsync -a --delete` at idle priority. New artifacts hard-link
/// unchanged files against the previous one via `--link-dest`.
#[derive(Debug, Clone)]
pub struct RsyncArchiver {
    run_mode: RunMode,
    extra: Vec<String>,
}

impl RsyncArchiver {
    pub fn new(run_mode: RunMode, extra: Vec<String>) -> Self {
        Self { run_mode, extra }
    }

    fn run_rsync(&self, source: &Path, dest: &Path, link_dest: Option<&Path>) -> Result<()> {
        let mut args = vec!["rsync".to_string(), "-a".to_string(), "--delete".to_string()];
        if self.run_mode.verbose {
            args.push("-v".to_string());
        }
        if let Some(previous) = link_dest {
            args.push(format!("--link-dest={}", previous.display()));
        }
        args.extend(self.extra.iter().cloned());
        args.push(dir_arg(source));
        args.push(dir_arg(dest));
        let rc = run_nice_ionice(&args, self.run_mode)?;
        check_exit(rc, source, dest)
    }
}

/// Maps an rsync exit code to the copy outcome. A failed copy is an I/O
/// error on the source.
fn check_exit(rc: i32, source: &Path, dest: &Path) -> Result<()> {
    if rc == 0 || rc == RSYNC_VANISHED {
        return Ok(());
    }
    Err(BackuprollError::io(
        "rsync",
        source,
        io::Error::new(
            io::ErrorKind::Other,
            format!("copy to {} exited with code {}", dest.display(), rc),
        ),
    ))
}

/// Trailing slash so rsync copies directory contents, not the directory.
fn dir_arg(path: &Path) -> String {
    let mut s = path.to_string_lossy().to_string();
    if !s.ends_with('/') {
        s.push('/');
    }
    s
}

impl Archiver for RsyncArchiver {
    fn create(&self, source: &Path, dest: &Path, previous: Option<&Path>) -> Result<()> {
        require_dir(source)?;
        self.run_rsync(source, dest, previous)
    }

    fn restore(&self, artifact: &Path, target: &Path) -> Result<()> {
        require_dir(artifact)?;
        self.run_rsync(artifact, target, None)
    }
}
