use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::backup::inventory::StorageLayout;
use crate::config::model::{Config, RuntimeConfig};
use crate::error::{BackuprollError, ConfigError, Result};
use crate::hook::HookSet;
use crate::timestamp::TimestampCodec;
use crate::types::CopyMethod;
use crate::util::paths::is_safe_name;

const DEFAULT_PIDFILE: &str = "/var/run/backuproll.pid";

/// Reads a YAML config. JSON configs are valid YAML and load as well.
pub fn load_config(path: &Path) -> Result<RuntimeConfig> {
    let mut contents = String::new();
    File::open(path)
        .and_then(|mut f| f.read_to_string(&mut contents))
        .map_err(|e| BackuprollError::io("read config", path, e))?;
    let cfg: Config =
        serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
    parse_runtime(cfg)
}

pub fn parse_runtime(cfg: Config) -> Result<RuntimeConfig> {
    if cfg.backupfolder.as_os_str().is_empty() {
        return Err(ConfigError::Invalid("backupfolder is empty".to_string()).into());
    }
    if cfg.worldfolder.as_os_str().is_empty() {
        return Err(ConfigError::Invalid("worldfolder is empty".to_string()).into());
    }
    let codec = TimestampCodec::new(cfg.dateformat);
    codec.validate().map_err(ConfigError::Invalid)?;
    let copy_method = CopyMethod::parse(&cfg.copy_method).map_err(ConfigError::Invalid)?;

    let mut worlds = std::collections::BTreeMap::new();
    for (name, world) in cfg.worlds {
        if !is_safe_name(&name) {
            return Err(ConfigError::Invalid(format!(
                "world {} name must use only letters, digits, '.', '-', '_'",
                name
            ))
            .into());
        }
        worlds.insert(name, world.keep);
    }

    Ok(RuntimeConfig {
        layout: StorageLayout::new(cfg.backupfolder, cfg.worldfolder),
        codec,
        pidfile: cfg.pidfile.unwrap_or_else(|| PathBuf::from(DEFAULT_PIDFILE)),
        copy_method,
        rsync_extra: cfg.rsync,
        hooks: HookSet {
            pre_backup: cfg.pre_backup_command,
            post_backup: cfg.post_backup_command,
            fail_backup: cfg.fail_backup_command,
            pre_restore: cfg.pre_restore_command,
            post_restore: cfg.post_restore_command,
        },
        worlds,
    })
}
