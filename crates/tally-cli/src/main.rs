//! Tally CLI - schema validation and missing-key repair.

mod cli;
mod commands;

use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let log_path = match init_tracing(&cli) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Error: failed to initialize logging: {e}");
            std::process::exit(1);
        }
    };
    tracing::info!("log file: {}", log_path.display());

    let result = match cli.command {
        Commands::Validate {
            ref tables_dir,
            ref schema,
            json,
        } => commands::validate::run(tables_dir, schema.as_deref(), json, &cli.user),

        Commands::Fix {
            ref tables_dir,
            ref schema,
            threshold,
            json,
        } => commands::fix::run(tables_dir, schema.as_deref(), threshold, json, &cli.user),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Set up tracing: warnings to stderr, full detail to a run-scoped log
/// file named by timestamp. `TALLY_LOG` overrides the file filter.
fn init_tracing(cli: &Cli) -> Result<PathBuf, Box<dyn std::error::Error>> {
    fs::create_dir_all(&cli.log_dir)?;
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let log_path = cli.log_dir.join(format!("tally_{timestamp}.log"));
    let file = File::create(&log_path)?;

    let stderr_level = if cli.verbose { "debug" } else { "warn" };
    let file_filter = EnvFilter::try_from_env("TALLY_LOG")
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(EnvFilter::new(stderr_level)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Arc::new(file))
                .with_filter(file_filter),
        )
        .try_init()?;

    Ok(log_path)
}
