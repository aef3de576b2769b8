//! CLI runner - executes commands

use crate::cancel::{CancelFlag, NeverCancelled};
use crate::cli::commands::{Cli, Commands};
use crate::config::FetchConfig;
use crate::diag::DiagnosticsLog;
use crate::engine::{Progress, ScanEngine};
use crate::error::{Error, Result};
use crate::http::{PageFetcher, PageSource};
use crate::types::SnapshotRecord;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Scan {
                target,
                output,
                resume_cursor,
                keep_partial,
                page_size,
                max_retries,
                page_timeout_secs,
                no_pacing,
            } => {
                let config = self.build_config(*page_size, *max_retries, *page_timeout_secs, *no_pacing);
                self.scan(
                    target,
                    config,
                    output.as_deref(),
                    resume_cursor.as_deref().unwrap_or(""),
                    *keep_partial,
                )
                .await
            }
            Commands::Check { target } => self.check(target).await,
        }
    }

    /// Build a fetch config from the global and scan flags
    fn build_config(
        &self,
        page_size: u32,
        max_retries: u32,
        page_timeout_secs: u64,
        no_pacing: bool,
    ) -> FetchConfig {
        let mut builder = FetchConfig::builder()
            .base_url(&self.cli.base_url)
            .page_size(page_size)
            .max_retries(max_retries)
            .page_timeout(Duration::from_secs(page_timeout_secs));
        if no_pacing {
            builder = builder.no_pacing();
        }
        builder.build()
    }

    /// Scan a domain, streaming records as JSON Lines
    async fn scan(
        &self,
        target: &str,
        config: FetchConfig,
        output: Option<&Path>,
        resume_cursor: &str,
        keep_partial: bool,
    ) -> Result<()> {
        let mut engine = ScanEngine::from_config(config)?;

        // Ctrl-C trips the flag; the engine stops at the next poll point.
        let flag = CancelFlag::new();
        let ctrl_c = flag.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("interrupt received; stopping scan");
                ctrl_c.cancel();
            }
        });

        let mut sink = open_sink(output)?;
        let mut written = 0usize;
        let verbose = self.cli.verbose;

        let outcome = engine
            .run_from(target, resume_cursor, &flag, |p: Progress<'_>| {
                write_records(&mut sink, &p.records[written..])?;
                written = p.records.len();
                if verbose {
                    eprintln!("page {}: {} records so far", p.page_number, p.records.len());
                }
                Ok(())
            })
            .await;

        match outcome {
            Ok(records) => {
                sink.flush()?;
                let stats = engine.stats();
                eprintln!(
                    "scan complete: {} records in {} pages ({} retries, {}ms)",
                    records.len(),
                    stats.pages_fetched,
                    stats.retries,
                    stats.duration_ms
                );
                Ok(())
            }
            Err(failure) => {
                // A deliberately cancelled scan always keeps its salvage;
                // for real failures --keep-partial opts in.
                if keep_partial || failure.is_cancelled() {
                    write_records(&mut sink, &failure.records[written..])?;
                    sink.flush()?;
                    eprintln!("kept {} partial records", failure.records.len());
                } else if let Some(path) = output {
                    drop(sink);
                    let _ = fs::remove_file(path);
                    eprintln!(
                        "discarded {} partial records (use --keep-partial to keep them)",
                        failure.records.len()
                    );
                }
                if self.cli.verbose && !failure.trace.is_empty() {
                    eprintln!("--- scan diagnostics ---");
                    eprintln!("{}", failure.trace);
                }
                if !failure.resume_cursor.is_empty() {
                    eprintln!("resume with: --resume-cursor '{}'", failure.resume_cursor);
                }
                // Cancellation is a terminal state the user asked for, not an
                // error to report.
                if failure.is_cancelled() {
                    eprintln!(
                        "scan cancelled after {} pages",
                        engine.stats().pages_fetched
                    );
                    return Ok(());
                }
                Err(failure.error)
            }
        }
    }

    /// Probe the index with a one-record page
    async fn check(&self, target: &str) -> Result<()> {
        let config = FetchConfig::builder()
            .base_url(&self.cli.base_url)
            .page_size(1)
            .max_retries(1)
            .page_timeout(Duration::from_secs(10))
            .build();
        let fetcher = PageFetcher::new(config)?;
        let mut log = DiagnosticsLog::new();

        match fetcher.fetch_page(target, "", &NeverCancelled, &mut log).await {
            Ok(page) => {
                println!(
                    "index reachable: probe returned {} record(s)",
                    page.records.len()
                );
                Ok(())
            }
            Err(e) => {
                eprintln!("index check failed: {e}");
                if self.cli.verbose {
                    eprintln!("{}", log.to_trace());
                }
                Err(e)
            }
        }
    }
}

/// Open the record sink: a file when `--output` was given, stdout otherwise
fn open_sink(output: Option<&Path>) -> Result<Box<dyn Write>> {
    match output {
        Some(path) => {
            let file = fs::File::create(path)
                .map_err(|e| Error::config(format!("failed to create {}: {e}", path.display())))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stdout())),
    }
}

/// Write records as JSON Lines
fn write_records(sink: &mut Box<dyn Write>, records: &[SnapshotRecord]) -> Result<()> {
    for record in records {
        let line = serde_json::to_string(record).unwrap_or_default();
        writeln!(sink, "{line}")?;
    }
    Ok(())
}
