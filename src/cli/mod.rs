//! CLI module - Command-line interface definitions and handlers
//!
//! Uses clap v4 with derive macros for argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod commands;
pub mod output;

/// timeshift - Move a travel snapshot's dates up to the present
#[derive(Parser, Debug)]
#[command(name = "timeshift")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable JSON output for machine consumption
    #[arg(long, global = true)]
    pub robot: bool,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file path (default: ~/.config/timeshift/config.toml)
    #[arg(long, global = true, env = "TIMESHIFT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Working copy path, overriding the config
    #[arg(long, global = true, value_name = "PATH")]
    pub working: Option<PathBuf>,

    /// Backup path, overriding the config
    #[arg(long, global = true, value_name = "PATH")]
    pub backup: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Restore the working copy and shift its dates to now
    Shift(commands::shift::ShiftArgs),

    /// Restore the working copy from the backup without shifting
    Restore(commands::restore::RestoreArgs),

    /// Show tables, anchor and the offset a shift would apply
    Inspect(commands::inspect::InspectArgs),

    /// Install a downloaded dataset as the backup
    Seed(commands::seed::SeedArgs),
}
