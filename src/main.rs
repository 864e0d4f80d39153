//! dirscout - incremental recursive directory scanner.
//!
//! Usage:
//!   dirscout [PATH]            Scan PATH, printing files as they are found
//!   dirscout                   Prompt for a directory, then scan it
//!   dirscout --json [PATH]     Print the final sorted report as JSON
//!   dirscout --help            Show help

use std::future::Future;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Context, Result, eyre};
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use dirscout_scan::{
    DirectorySelection, ScanConfig, ScanEvent, ScanFailure, ScanReport, ScanSession, ScanStatus,
};

#[derive(Parser)]
#[command(
    name = "dirscout",
    version,
    about = "Incremental recursive directory scanner",
    long_about = "dirscout walks a directory tree and lists every regular file as soon as \
                  it is found. Unreadable entries are skipped and reported at the end; \
                  press Ctrl-C to stop early and keep what was found so far."
)]
struct Cli {
    /// Directory to scan (prompted for when omitted)
    path: Option<PathBuf>,

    /// Skip hidden files and directories
    #[arg(long)]
    skip_hidden: bool,

    /// Maximum depth to descend
    #[arg(short = 'd', long)]
    max_depth: Option<u32>,

    /// Delay after each discovered file, in milliseconds (0 disables)
    #[arg(long, default_value = "10")]
    pacing_ms: u64,

    /// Directory to scan instead when PATH cannot be listed
    #[arg(long)]
    fallback: Option<PathBuf>,

    /// Print the final report as JSON instead of a live listing
    #[arg(long)]
    json: bool,

    /// Only print the final summary
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = Cli::parse();

    let root = match select_directory(cli.path.clone())? {
        DirectorySelection::Selected(path) => path,
        DirectorySelection::Cancelled => {
            eprintln!("No directory selected.");
            return Ok(());
        }
    };

    let config = build_config(&cli, &root)?;
    let report = run_scan(config, root, cli.quiet || cli.json).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }

    match report.failure() {
        Some(failure) => Err(failure).context("Scan failed"),
        None => Ok(()),
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

/// Use the path from the command line, or ask for one on stdin.
fn select_directory(path: Option<PathBuf>) -> Result<DirectorySelection> {
    if let Some(path) = path {
        return Ok(DirectorySelection::Selected(path));
    }

    eprint!("Directory to scan (empty to cancel): ");
    std::io::stderr().flush()?;

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read directory")?;

    Ok(DirectorySelection::from_input(&line))
}

fn build_config(cli: &Cli, root: &PathBuf) -> Result<ScanConfig> {
    ScanConfig::builder()
        .root(root.clone())
        .include_hidden(!cli.skip_hidden)
        .max_depth(cli.max_depth)
        .pacing(Duration::from_millis(cli.pacing_ms))
        .fallback_root(cli.fallback.clone())
        .build()
        .map_err(|e| ScanFailure::InvalidConfig {
            message: e.to_string(),
        })
        .context("Invalid options")
}

/// Run one scan, streaming discovered files to stdout unless `quiet`.
async fn run_scan(config: ScanConfig, root: PathBuf, quiet: bool) -> Result<ScanReport> {
    let mut session = ScanSession::new(config);
    let mut events = session
        .start(&root)
        .await
        .with_context(|| format!("Cannot scan {}", root.display()))?;

    if !quiet {
        eprintln!("Scanning {}...", root.display());
    }

    let cancel = session.cancel_token();
    let interrupts = tokio::spawn(async move {
        if handle_interrupts(tokio::signal::ctrl_c, cancel).await {
            std::process::exit(EXIT_INTERRUPTED);
        }
    });

    let mut report = None;
    while let Some(event) = events.next().await {
        match event {
            ScanEvent::FileDiscovered(file) => {
                if !quiet {
                    println!("{}", file.path.display());
                }
            }
            ScanEvent::Error(_) => {}
            ScanEvent::Finished(finished) => {
                report = Some(finished);
                break;
            }
        }
    }
    interrupts.abort();

    if let Some(report) = report {
        return Ok(report);
    }

    session
        .wait()
        .await
        .ok_or_else(|| eyre!("Scan ended without a report"))
}

/// Exit status after a second Ctrl-C.
const EXIT_INTERRUPTED: i32 = 130;

/// Cancel the scan on the first interrupt.
///
/// Returns `true` when a second interrupt arrives, meaning the user wants
/// out without waiting for the partial report.
async fn handle_interrupts<F, Fut>(mut interrupt: F, cancel: CancellationToken) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    if interrupt().await.is_err() {
        return false;
    }
    eprintln!("Cancelling scan, press Ctrl-C again to quit");
    cancel.cancel();

    interrupt().await.is_ok()
}

fn print_summary(report: &ScanReport) {
    println!();
    println!("{}", "─".repeat(60));
    println!(" {}", report.root.display());
    if let Some(fallback) = &report.fallback {
        println!(" (root not listable, scanned {} instead)", fallback.display());
    }
    println!(" {}", report.status_line());
    if report.status != ScanStatus::Failed {
        println!(" {} total", format_size(report.total_size()));
    }
    println!(" Scanned in {:.2}s", report.elapsed.as_secs_f64());
    println!("{}", "─".repeat(60));

    if !report.errors.is_empty() {
        println!();
        println!("{} entr{} skipped:", report.errors.len(), plural_y(report.errors.len()));
        for error in &report.errors {
            println!("  {error}");
        }
    }
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

fn plural_y(count: usize) -> &'static str {
    if count == 1 { "y" } else { "ies" }
}
