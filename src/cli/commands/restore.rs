//! timeshift restore - overwrite the working copy with the backup.

use clap::Args;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct RestoreArgs {}

pub fn run(ctx: &AppContext, _args: &RestoreArgs) -> Result<()> {
    let report = ctx.store().restore()?;

    if ctx.robot_mode {
        return emit_json(&report);
    }

    let mut layout = HumanLayout::new();
    layout
        .title("Restored working copy")
        .kv("Working copy", &report.working_path.display().to_string())
        .kv("Backup", &report.backup_path.display().to_string())
        .kv("Bytes", &report.bytes.to_string())
        .kv("SHA-256", &report.sha256);
    emit_human(&layout);
    Ok(())
}
