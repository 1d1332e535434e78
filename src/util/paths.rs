use std::fs;
use std::io;
use std::os::unix::fs::symlink;
use std::path::Path;

use tracing::info;

use crate::error::{BackuprollError, Result};
use crate::types::RunMode;

pub fn is_safe_name(name: &str) -> bool {
    if name.is_empty() || name == "." || name == ".." {
        return false;
    }
    name.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}

pub fn ensure_dir(path: &Path, run_mode: RunMode) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    if run_mode.dry_run {
        info!("dry-run: mkdir -p {}", path.display());
        return Ok(());
    }
    fs::create_dir_all(path).map_err(|e| BackuprollError::io("create", path, e))
}

/// Removes a file, symlink or directory tree. A missing path is an error.
pub fn remove_path(path: &Path) -> io::Result<()> {
    let meta = fs::symlink_metadata(path)?;
    if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// Points `link` at `target`, replacing an existing symlink. A real file or
/// directory in the way is left alone.
pub fn replace_symlink(target: &Path, link: &Path, run_mode: RunMode) -> Result<()> {
    if run_mode.dry_run {
        info!("dry-run: ln -sfn {} {}", target.display(), link.display());
        return Ok(());
    }
    if let Ok(meta) = fs::symlink_metadata(link) {
        if !meta.file_type().is_symlink() {
            info!("skip updating {} (not a symlink)", link.display());
            return Ok(());
        }
        fs::remove_file(link).map_err(|e| BackuprollError::io("remove", link, e))?;
    }
    symlink(target, link).map_err(|e| BackuprollError::io("symlink", link, e))
}
