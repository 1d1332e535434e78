//! Copying a live world into a backup artifact and back.

use std::fs;
use std::path::Path;

use tracing::{debug, error, info};
use walkdir::WalkDir;

use crate::error::{BackuprollError, Result};
use crate::types::RunMode;

/// Produces and restores backup artifacts. An artifact is a directory tree.
pub trait Archiver {
    /// Copies `source` into the new artifact `dest`. `previous` is the newest
    /// existing artifact of the world, which implementations may share
    /// unchanged files with.
    fn create(&self, source: &Path, dest: &Path, previous: Option<&Path>) -> Result<()>;

    /// Replaces the contents of `target` with the artifact at `artifact`.
    fn restore(&self, artifact: &Path, target: &Path) -> Result<()>;
}

pub fn require_dir(path: &Path) -> Result<()> {
    let meta = fs::metadata(path).map_err(|e| BackuprollError::io("stat", path, e))?;
    if !meta.is_dir() {
        return Err(BackuprollError::message(format!(
            "{} is not a directory",
            path.display()
        )));
    }
    Ok(())
}

/// Plain recursive copy. Symlinks inside the tree are not followed or copied.
#[derive(Debug, Clone, Copy)]
pub struct CopyArchiver {
    run_mode: RunMode,
}

impl CopyArchiver {
    pub fn new(run_mode: RunMode) -> Self {
        Self { run_mode }
    }
}

impl Archiver for CopyArchiver {
    fn create(&self, source: &Path, dest: &Path, _previous: Option<&Path>) -> Result<()> {
        require_dir(source)?;
        if self.run_mode.dry_run {
            info!("dry-run: cp -r {} {}", source.display(), dest.display());
            return Ok(());
        }
        copy_tree(source, dest)
    }

    fn restore(&self, artifact: &Path, target: &Path) -> Result<()> {
        require_dir(artifact)?;
        if self.run_mode.dry_run {
            info!("dry-run: replace {} with {}", target.display(), artifact.display());
            return Ok(());
        }
        let parent = target.parent().ok_or_else(|| {
            BackuprollError::message(format!("{} has no parent directory", target.display()))
        })?;
        fs::create_dir_all(parent).map_err(|e| BackuprollError::io("create", parent, e))?;

        // Stage next to the target so the final swap is two renames on one
        // filesystem; the staging dir (holding the old contents) is removed on drop.
        let staging = tempfile::Builder::new()
            .prefix(".backuproll-restore-")
            .tempdir_in(parent)
            .map_err(|e| BackuprollError::io("create staging in", parent, e))?;
        let incoming = staging.path().join("incoming");
        copy_tree(artifact, &incoming)?;
        swap_into(&incoming, &staging.path().join("outgoing"), target)
    }
}

/// Moves `target` aside to `outgoing` and `incoming` into its place. If the
/// second move fails, the old contents are moved back.
fn swap_into(incoming: &Path, outgoing: &Path, target: &Path) -> Result<()> {
    let had_target = fs::symlink_metadata(target).is_ok();
    if had_target {
        fs::rename(target, outgoing).map_err(|e| BackuprollError::io("move", target, e))?;
    }
    if let Err(err) = fs::rename(incoming, target) {
        if had_target {
            if let Err(back) = fs::rename(outgoing, target) {
                error!(
                    "could not put {} back from {}: {}",
                    target.display(),
                    outgoing.display(),
                    back
                );
            }
        }
        return Err(BackuprollError::io("move into", target, err));
    }
    Ok(())
}

fn copy_tree(source: &Path, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest).map_err(|e| BackuprollError::io("create", dest, e))?;
    for entry in WalkDir::new(source).follow_links(false) {
        let entry = entry.map_err(|e| BackuprollError::io("walk", source, e.into()))?;
        let src_path = entry.path();
        let rel = src_path.strip_prefix(source).unwrap_or(src_path);
        if rel.as_os_str().is_empty() {
            continue;
        }
        let target = dest.join(rel);
        let ft = entry.file_type();
        if ft.is_symlink() {
            debug!("skip symlink {}", src_path.display());
            continue;
        }
        if ft.is_dir() {
            fs::create_dir_all(&target).map_err(|e| BackuprollError::io("create", &target, e))?;
        } else if ft.is_file() {
            fs::copy(src_path, &target).map_err(|e| BackuprollError::io("copy", src_path, e))?;
        }
    }
    Ok(())
}
