//! timeshift - Travel snapshot time-shift CLI
//!
//! Restores a pristine SQLite snapshot and moves its dates up to the present.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use timeshift::Result;
use timeshift::app::AppContext;
use timeshift::cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.robot {
                // Robot mode: structured error on stdout
                let error_json = serde_json::json!({
                    "error": true,
                    "message": e.to_string(),
                    "details": e.to_structured(),
                });
                println!("{}", serde_json::to_string(&error_json).unwrap_or_default());
            } else {
                let structured = e.to_structured();
                if cli.verbose > 0 {
                    eprintln!("Error: {structured}");
                } else {
                    eprintln!("Error: {e}");
                }
                eprintln!("Hint: {}", structured.suggestion);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let ctx = AppContext::from_cli(cli)?;
    timeshift::cli::commands::run(&ctx, &cli.command)
}

fn init_tracing(cli: &Cli) {
    if cli.quiet {
        return;
    }

    let filter = match cli.verbose {
        0 => "warn,timeshift=info",
        1 => "info,timeshift=debug",
        2 => "debug,timeshift=trace",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if cli.robot {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
