//! Application context shared by CLI commands.

use std::path::PathBuf;

use crate::cli::Cli;
use crate::config::Config;
use crate::error::Result;
use crate::shift::{SystemClock, TimeShiftEngine};
use crate::storage::SnapshotStore;

/// Resolved configuration plus global CLI flags.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: Config,
    pub project_root: PathBuf,
    pub robot_mode: bool,
    pub verbosity: u8,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let project_root = std::env::current_dir()?;
        let mut config = Config::load(cli.config.as_deref(), &project_root)?;
        if let Some(path) = &cli.working {
            config.snapshot.working_path.clone_from(path);
        }
        if let Some(path) = &cli.backup {
            config.snapshot.backup_path.clone_from(path);
        }
        Ok(Self {
            config,
            project_root,
            robot_mode: cli.robot,
            verbosity: cli.verbose,
        })
    }

    /// Store over the configured working and backup paths.
    pub fn store(&self) -> SnapshotStore {
        SnapshotStore::new(
            self.resolve(&self.config.snapshot.working_path),
            self.resolve(&self.config.snapshot.backup_path),
        )
    }

    /// Engine configured from `[shift]`, on the system clock.
    pub fn engine(&self) -> Result<TimeShiftEngine<SystemClock>> {
        Ok(TimeShiftEngine::new(self.store())
            .with_plan(self.config.shift.plan()?)
            .with_policy(self.config.shift.anchor)
            .with_load_all_tables(self.config.shift.load_all_tables))
    }

    fn resolve(&self, path: &std::path::Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }
}
