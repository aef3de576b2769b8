//! CLI commands and argument parsing

use crate::config::DEFAULT_BASE_URL;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Web archive index harvester CLI
#[derive(Parser, Debug)]
#[command(name = "cdx-harvest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Index endpoint to query
    #[arg(long, global = true, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Verbose output (per-page progress and failure diagnostics)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan every archived snapshot of a domain
    Scan {
        /// Domain to scan (e.g. example.org)
        target: String,

        /// Write records to this file as JSON Lines (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Resume from a cursor reported by a previous failed scan
        #[arg(long)]
        resume_cursor: Option<String>,

        /// Keep partial results in --output when the scan fails
        #[arg(long)]
        keep_partial: bool,

        /// Records requested per page
        #[arg(long, default_value_t = 1000)]
        page_size: u32,

        /// Attempts per page before giving up
        #[arg(long, default_value_t = 3)]
        max_retries: u32,

        /// Per-page timeout in seconds
        #[arg(long, default_value_t = 60)]
        page_timeout_secs: u64,

        /// Disable client-side request pacing
        #[arg(long)]
        no_pacing: bool,
    },

    /// Probe the index endpoint with a single tiny page
    Check {
        /// Domain to probe
        target: String,
    },
}
