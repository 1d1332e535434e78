//! Packing a backup, or one sub-directory of it, into a `.tar.gz`.

use std::fs::File;
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::info;

use crate::backup::archive::require_dir;
use crate::backup::inventory::Backup;
use crate::error::{BackuprollError, ConfigError, Result};
use crate::types::RunMode;
use crate::util::paths::is_safe_name;

/// Writes the contents of `backup` (or of its `subdir`) to `output`. Entries
/// are stored relative to that directory. The file appears only once it is
/// complete.
pub fn export_tar_gz(
    backup: &Backup,
    subdir: Option<&str>,
    output: &Path,
    run_mode: RunMode,
) -> Result<()> {
    let mut source = backup.path();
    if let Some(subdir) = subdir {
        if !is_safe_name(subdir) {
            return Err(ConfigError::Invalid(format!(
                "export sub-directory {} must be a single plain name",
                subdir
            ))
            .into());
        }
        source.push(subdir);
    }
    require_dir(&source)?;
    if run_mode.dry_run {
        info!("dry-run: tar -czf {} -C {} .", output.display(), source.display());
        return Ok(());
    }

    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let staging = tempfile::Builder::new()
        .prefix(".backuproll-export-")
        .tempfile_in(dir)
        .map_err(|e| BackuprollError::io("create temp file in", dir, e))?;
    write_archive(&source, staging.as_file())
        .map_err(|e| BackuprollError::io("archive", &source, e))?;
    staging
        .persist(output)
        .map_err(|e| BackuprollError::io("write", output, e.error))?;
    info!("exported {} to {}", source.display(), output.display());
    Ok(())
}

fn write_archive(source: &Path, file: &File) -> std::io::Result<()> {
    let encoder = GzEncoder::new(file, Compression::default());
    let mut tar = tar::Builder::new(encoder);
    tar.append_dir_all("", source)?;
    tar.into_inner()?.finish()?;
    Ok(())
}
