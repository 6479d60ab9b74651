use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShiftError};
use crate::shift::{AnchorPolicy, ColumnRef, ShiftPlan};
use crate::shift::plan::{DEFAULT_COLUMNS, DEFAULT_NULL_SENTINEL, DEFAULT_REFERENCE};

/// File name of the project-level config, looked up in the project root.
pub const PROJECT_CONFIG_FILE: &str = "timeshift.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    #[serde(default)]
    pub shift: ShiftConfig,
}

impl Config {
    /// Load configuration: explicit path (or `TIMESHIFT_CONFIG`) if given,
    /// else the global file patched by the project file; then environment
    /// overrides.
    pub fn load(explicit_path: Option<&Path>, project_root: &Path) -> Result<Self> {
        Self::load_with_env(explicit_path, project_root, |key| std::env::var(key).ok())
    }

    /// [`load`](Self::load) with an injectable environment lookup.
    pub fn load_with_env<F>(explicit_path: Option<&Path>, project_root: &Path, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| env("TIMESHIFT_CONFIG").map(PathBuf::from));

        if let Some(path) = explicit {
            let patch = Self::load_patch(&path)?.ok_or_else(|| {
                ShiftError::MissingConfig(format!("config file not found: {}", path.display()))
            })?;
            config.merge_patch(patch);
        } else {
            if let Some(global) = Self::load_global()? {
                config.merge_patch(global);
            }
            if let Some(project) = Self::load_patch(&project_root.join(PROJECT_CONFIG_FILE))? {
                config.merge_patch(project);
            }
        }

        config.apply_env_overrides(&env)?;
        config.shift.plan()?;
        Ok(config)
    }

    /// The global config path, when the platform has a config directory.
    pub fn global_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("timeshift").join("config.toml"))
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        match Self::global_path() {
            Some(path) => Self::load_patch(&path),
            None => Ok(None),
        }
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| ShiftError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| ShiftError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.snapshot {
            self.snapshot.merge(patch);
        }
        if let Some(patch) = patch.shift {
            self.shift.merge(patch);
        }
    }

    fn apply_env_overrides<F>(&mut self, env: &F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = env("TIMESHIFT_WORKING_PATH") {
            self.snapshot.working_path = PathBuf::from(value);
        }
        if let Some(value) = env("TIMESHIFT_BACKUP_PATH") {
            self.snapshot.backup_path = PathBuf::from(value);
        }

        if let Some(value) = env("TIMESHIFT_REFERENCE") {
            self.shift.reference = value.trim().to_string();
        }
        if let Some(values) = env("TIMESHIFT_COLUMNS").map(|v| split_list(&v)) {
            self.shift.columns = values;
        }
        if let Some(values) = env("TIMESHIFT_NULL_SENTINELS").map(|v| split_list(&v)) {
            self.shift.null_sentinels = values;
        }
        if let Some(value) = env("TIMESHIFT_ANCHOR") {
            self.shift.anchor = value.parse()?;
        }
        if let Some(value) = env("TIMESHIFT_LOAD_ALL_TABLES") {
            self.shift.load_all_tables = parse_bool("TIMESHIFT_LOAD_ALL_TABLES", &value)?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotConfig {
    #[serde(default = "default_working_path")]
    pub working_path: PathBuf,
    #[serde(default = "default_backup_path")]
    pub backup_path: PathBuf,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            working_path: default_working_path(),
            backup_path: default_backup_path(),
        }
    }
}

impl SnapshotConfig {
    fn merge(&mut self, patch: SnapshotPatch) {
        if let Some(value) = patch.working_path {
            self.working_path = value;
        }
        if let Some(value) = patch.backup_path {
            self.backup_path = value;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShiftConfig {
    pub reference: String,
    pub columns: Vec<String>,
    pub null_sentinels: Vec<String>,
    pub anchor: AnchorPolicy,
    pub load_all_tables: bool,
}

impl Default for ShiftConfig {
    fn default() -> Self {
        Self {
            reference: DEFAULT_REFERENCE.to_string(),
            columns: DEFAULT_COLUMNS.iter().map(ToString::to_string).collect(),
            null_sentinels: vec![DEFAULT_NULL_SENTINEL.to_string()],
            anchor: AnchorPolicy::default(),
            load_all_tables: true,
        }
    }
}

impl ShiftConfig {
    fn merge(&mut self, patch: ShiftPatch) {
        if let Some(value) = patch.reference {
            self.reference = value;
        }
        if let Some(values) = patch.columns {
            self.columns = values;
        }
        if let Some(values) = patch.null_sentinels {
            self.null_sentinels = values;
        }
        if let Some(value) = patch.anchor {
            self.anchor = value;
        }
        if let Some(value) = patch.load_all_tables {
            self.load_all_tables = value;
        }
    }

    /// Build the shift plan, rejecting malformed `table.column` entries.
    pub fn plan(&self) -> Result<ShiftPlan> {
        let reference: ColumnRef = self.reference.parse()?;
        let columns = self
            .columns
            .iter()
            .map(|c| c.parse())
            .collect::<Result<Vec<ColumnRef>>>()?;
        Ok(ShiftPlan::new(reference, columns, self.null_sentinels.clone()))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigPatch {
    pub snapshot: Option<SnapshotPatch>,
    pub shift: Option<ShiftPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SnapshotPatch {
    pub working_path: Option<PathBuf>,
    pub backup_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ShiftPatch {
    pub reference: Option<String>,
    pub columns: Option<Vec<String>>,
    pub null_sentinels: Option<Vec<String>>,
    pub anchor: Option<AnchorPolicy>,
    pub load_all_tables: Option<bool>,
}

fn default_working_path() -> PathBuf {
    PathBuf::from("travel2.sqlite")
}

fn default_backup_path() -> PathBuf {
    PathBuf::from("travel2.backup.sqlite")
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ShiftError::Config(format!("invalid {key} value {value}"))),
    }
}
