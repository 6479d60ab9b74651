//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - `run()` function to execute the command

use chrono::{DateTime, Utc};

use crate::app::AppContext;
use crate::cli::Commands;
use crate::error::Result;
use crate::shift::Timestamp;

pub mod inspect;
pub mod restore;
pub mod seed;
pub mod shift;

/// Dispatch a command to its handler
pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Shift(args) => shift::run(ctx, args),
        Commands::Restore(args) => restore::run(ctx, args),
        Commands::Inspect(args) => inspect::run(ctx, args),
        Commands::Seed(args) => seed::run(ctx, args),
    }
}

/// Parse a `--now` value: RFC 3339, or any snapshot timestamp shape
/// (naive values are UTC).
pub fn parse_now(value: &str) -> std::result::Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            Timestamp::parse(value)
                .map(|ts| ts.to_utc())
                .ok_or_else(|| format!("invalid timestamp {value:?} (expected RFC 3339)"))
        })
}
