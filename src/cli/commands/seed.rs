//! timeshift seed - install a downloaded dataset as the pristine backup.

use std::path::PathBuf;

use clap::Args;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct SeedArgs {
    /// Downloaded SQLite file
    pub source: PathBuf,

    /// Replace an existing backup
    #[arg(long)]
    pub overwrite: bool,
}

pub fn run(ctx: &AppContext, args: &SeedArgs) -> Result<()> {
    let report = ctx.store().seed(&args.source, args.overwrite)?;

    if ctx.robot_mode {
        return emit_json(&report);
    }

    let mut layout = HumanLayout::new();
    if report.installed {
        layout
            .title("Installed backup")
            .kv("Backup", &report.backup_path.display().to_string());
        if let Some(restore) = &report.restore {
            layout
                .kv("Working copy", &restore.working_path.display().to_string())
                .kv("SHA-256", &restore.sha256);
        }
    } else {
        layout
            .title("Backup already present")
            .kv("Backup", &report.backup_path.display().to_string())
            .bullet("pass --overwrite to replace it");
    }
    emit_human(&layout);
    Ok(())
}
