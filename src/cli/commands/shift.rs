//! timeshift shift - restore the working copy and move its dates to now.

use chrono::{DateTime, Utc};
use clap::Args;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit_human, emit_json};
use crate::error::Result;
use crate::shift::{FixedClock, ShiftReport};

#[derive(Args, Debug)]
pub struct ShiftArgs {
    /// Use this instant as "now" instead of the system clock
    #[arg(long, value_name = "RFC3339", value_parser = super::parse_now)]
    pub now: Option<DateTime<Utc>>,
}

pub fn run(ctx: &AppContext, args: &ShiftArgs) -> Result<()> {
    let engine = ctx.engine()?;
    let report = match args.now {
        Some(now) => engine.with_clock(FixedClock(now)).run()?,
        None => engine.run()?,
    };

    if ctx.robot_mode {
        return emit_json(&report);
    }
    emit_human(&render(&report, "Shifted snapshot", ctx.verbosity > 0));
    Ok(())
}

/// Human layout shared by `shift` and `inspect`. `detailed` adds the raw
/// offset and the restore digest.
pub(super) fn render(report: &ShiftReport, title: &str, detailed: bool) -> HumanLayout {
    let mut layout = HumanLayout::new();
    layout
        .title(title)
        .kv("Working copy", &report.working_path.display().to_string())
        .kv("Reference", &report.reference)
        .kv("Zone", &report.zone)
        .kv("Anchor", &report.anchor.to_rfc3339())
        .kv("Current time", &report.current_time.to_rfc3339())
        .kv("Offset", &report.offset_display)
        .kv("Policy", &report.policy.to_string())
        .kv("Tables", &report.tables.to_string())
        .kv("Rows", &report.rows.to_string());
    if detailed {
        layout.kv("Offset seconds", &report.offset_seconds.to_string());
        if let Some(restore) = &report.restore {
            layout
                .kv("Restored bytes", &restore.bytes.to_string())
                .kv("Restored SHA-256", &restore.sha256);
        }
    }
    layout.blank().section("Columns");
    for column in &report.columns {
        layout.bullet(&format!(
            "{}.{}: {} shifted, {} missing",
            column.table, column.column, column.shifted, column.missing
        ));
    }
    layout
}
