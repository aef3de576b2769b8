//! CLI module
//!
//! Command-line interface for harvesting archive index snapshots.
//!
//! # Commands
//!
//! - `scan` - Scan every archived snapshot of a domain
//! - `check` - Probe the index endpoint

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
