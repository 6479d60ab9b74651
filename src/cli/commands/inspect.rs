//! timeshift inspect - preview a shift against the backup.

use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::{emit_human, emit_json};
use crate::error::Result;
use crate::shift::{ColumnRef, FixedClock, ShiftReport};
use crate::storage::{Catalog, Database};

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Use this instant as "now" instead of the system clock
    #[arg(long, value_name = "RFC3339", value_parser = super::parse_now)]
    pub now: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct InspectOutput {
    backup_path: String,
    catalog: Catalog,
    unplanned_temporal_columns: Vec<ColumnRef>,
    preview: ShiftReport,
}

pub fn run(ctx: &AppContext, args: &InspectArgs) -> Result<()> {
    let engine = ctx.engine()?;
    let backup_path = engine.store().backup_path().to_path_buf();
    let preview = match args.now {
        Some(now) => engine.clone().with_clock(FixedClock(now)).preview()?,
        None => engine.preview()?,
    };
    let catalog = Database::open_read_only(&backup_path)?.catalog()?;
    let unplanned = engine.plan().undeclared_temporal_columns(&catalog);

    if ctx.robot_mode {
        return emit_json(&InspectOutput {
            backup_path: backup_path.display().to_string(),
            catalog,
            unplanned_temporal_columns: unplanned,
            preview,
        });
    }

    let mut layout = super::shift::render(&preview, "Shift preview", ctx.verbosity > 0);
    layout.blank().section("Tables");
    for table in &catalog.tables {
        layout.bullet(&format!("{} ({} columns)", table.name, table.columns.len()));
    }
    if !unplanned.is_empty() {
        layout.blank().section("Temporal columns left as is");
        for column in &unplanned {
            layout.bullet(&column.to_string());
        }
    }
    emit_human(&layout);
    Ok(())
}
