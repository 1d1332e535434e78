use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::backup::inventory::StorageLayout;
use crate::backup::rotation::RetentionPolicy;
use crate::hook::HookSet;
use crate::timestamp::{TimestampCodec, DEFAULT_DATE_FORMAT};
use crate::types::CopyMethod;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub backupfolder: PathBuf,
    pub worldfolder: PathBuf,
    #[serde(default = "default_dateformat")]
    pub dateformat: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pidfile: Option<PathBuf>,
    #[serde(default = "default_copy_method")]
    pub copy_method: String,
    /// Extra arguments appended to every rsync invocation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rsync: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_backup_command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_backup_command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_backup_command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_restore_command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_restore_command: Option<String>,
    #[serde(default)]
    pub worlds: BTreeMap<String, WorldConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct WorldConfig {
    /// Worlds without `keep` are backed up but never rotated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep: Option<RetentionPolicy>,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub layout: StorageLayout,
    pub codec: TimestampCodec,
    pub pidfile: PathBuf,
    pub copy_method: CopyMethod,
    pub rsync_extra: Vec<String>,
    pub hooks: HookSet,
    pub worlds: BTreeMap<String, Option<RetentionPolicy>>,
}

fn default_dateformat() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

fn default_copy_method() -> String {
    CopyMethod::default().as_str().to_string()
}
