//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tally: schema validation and missing-key repair for CSV table sets
#[derive(Parser)]
#[command(name = "tally")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory for run-scoped log files
    #[arg(long, global = true, default_value = "logs")]
    pub log_dir: PathBuf,

    /// Identity recorded in the audit trail
    #[arg(long, global = true, default_value = "system")]
    pub user: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate tables against the relationship schema
    Validate {
        /// Directory containing CSV tables, one file per table
        #[arg(value_name = "TABLES_DIR")]
        tables_dir: PathBuf,

        /// Schema descriptor path (default: <TABLES_DIR>/relationship_schema.json)
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate, auto-fix column names, and repair missing foreign keys
    Fix {
        /// Directory containing CSV tables, one file per table
        #[arg(value_name = "TABLES_DIR")]
        tables_dir: PathBuf,

        /// Schema descriptor path (default: <TABLES_DIR>/relationship_schema.json)
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Minimum confidence for automatically accepted repairs
        #[arg(short, long, default_value_t = 0.7)]
        threshold: f64,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
}
