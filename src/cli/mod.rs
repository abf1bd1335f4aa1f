//! # CLI Module
//!
//! Command-line interface for the photo intake engine.
//!
//! ## Usage
//! ```bash
//! # Classify everything in ./Incoming
//! photo-intake run
//!
//! # Another storage root, logging to a file
//! photo-intake run --storage ~/Photos --log-file ~/Photos/intake.log
//!
//! # See what would happen without moving anything
//! photo-intake run --dry-run
//!
//! # Check that cataloged files are still where the catalog says
//! photo-intake verify --output json
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use photo_intake::core::catalog::{verify_catalog, Catalog, CatalogIssue, IssueKind};
use photo_intake::core::classifier::SortedDuplicatePolicy;
use photo_intake::core::layout::Layout;
use photo_intake::core::pipeline::{CancellationToken, Intake, IntakeReport};
use photo_intake::error::Result;
use photo_intake::events::{
    ClassifyEvent, Event, EventChannel, IntakePhase, PipelineEvent, ReconcileEvent, ScanEvent,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::thread;
use tracing::warn;

/// Photo Intake - File new photos without losing a single one
#[derive(Parser, Debug)]
#[command(name = "photo-intake")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reconcile Sorted/ and classify everything in Incoming/
    Run {
        /// Storage root
        #[arg(short, long, default_value = ".")]
        storage: PathBuf,

        /// Plan and report without moving files or saving the catalog
        #[arg(long)]
        dry_run: bool,

        /// Report sorted duplicates instead of merging them into the catalog
        #[arg(long)]
        flag_sorted_duplicates: bool,

        /// Follow symbolic links while scanning
        #[arg(long)]
        follow_symlinks: bool,

        /// Write logs to this file instead of stderr
        #[arg(long)]
        log_file: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },
    /// Check every cataloged file against the disk
    Verify {
        /// Storage root
        #[arg(short, long, default_value = ".")]
        storage: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            storage,
            dry_run,
            flag_sorted_duplicates,
            follow_symlinks,
            log_file,
            output,
        } => {
            init_logging(log_file.as_deref());
            let policy = if flag_sorted_duplicates {
                SortedDuplicatePolicy::Flag
            } else {
                SortedDuplicatePolicy::Merge
            };
            run_intake(storage, dry_run, policy, follow_symlinks, output)
        }
        Commands::Verify { storage, output } => {
            init_logging(None);
            run_verify(&storage, output)
        }
    }
}

fn init_logging(log_file: Option<&Path>) {
    if let Err(e) = photo_intake::init_tracing(log_file) {
        eprintln!("Logging disabled: {}", e);
    }
}

fn run_intake(
    storage: PathBuf,
    dry_run: bool,
    policy: SortedDuplicatePolicy,
    follow_symlinks: bool,
    output: OutputFormat,
) -> Result<()> {
    let term = Term::stderr();

    if matches!(output, OutputFormat::Pretty) {
        term.write_line(&format!(
            "{} {}",
            style("Photo Intake").bold().cyan(),
            style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim()
        ))
        .ok();
        if dry_run {
            term.write_line(&format!(
                "{}",
                style("Dry run: nothing will be moved").yellow()
            ))
            .ok();
        }
        term.write_line("").ok();
    }

    let intake = Intake::builder()
        .root(storage)
        .sorted_duplicates(policy)
        .follow_symlinks(follow_symlinks)
        .dry_run(dry_run)
        .build();

    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
        warn!("Could not install interrupt handler: {}", e);
    }

    let (sender, receiver) = EventChannel::new();

    let progress = if matches!(output, OutputFormat::Pretty) {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        let Some(pb) = progress_clone else {
            for _ in receiver.iter() {}
            return;
        };
        for event in receiver.iter() {
            match event {
                Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => {
                    if matches!(
                        phase,
                        IntakePhase::ReconcilingSorted | IntakePhase::ClassifyingIncoming
                    ) {
                        pb.set_position(0);
                    }
                    pb.set_message(phase.to_string());
                }
                Event::Scan(ScanEvent::Started { total_files, .. }) => {
                    pb.set_length(total_files as u64);
                    pb.set_position(0);
                }
                Event::Scan(ScanEvent::Progress(p)) => {
                    pb.set_position(p.scanned as u64);
                }
                Event::Scan(ScanEvent::Completed { total_scanned, .. }) => {
                    pb.set_length(total_scanned as u64);
                }
                Event::Reconcile(ReconcileEvent::Progress(counters)) => {
                    pb.set_position(counters.scanned as u64);
                }
                Event::Classify(ClassifyEvent::Progress(counters)) => {
                    pb.set_position(counters.scanned as u64);
                }
                Event::Pipeline(PipelineEvent::Cancelled) => {
                    pb.set_message("Cancelled, saving catalog");
                }
                Event::Pipeline(PipelineEvent::Completed { .. }) => {
                    pb.finish_and_clear();
                }
                _ => {}
            }
        }
    });

    let result = intake.run_with_events(&sender, &cancel);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let report = result?;
    match output {
        OutputFormat::Pretty => print_pretty_report(&term, &report),
        OutputFormat::Json => print_json(&report),
    }

    Ok(())
}

fn print_pretty_report(term: &Term, report: &IntakeReport) {
    let headline = if report.cancelled {
        format!("{} Run cancelled", style("!").yellow().bold())
    } else {
        format!("{} Intake complete", style("✓").green().bold())
    };
    term.write_line(&headline).ok();
    term.write_line(&format!(
        "  {} in {:.1}s, {} records in catalog",
        style(&report.run_id).dim(),
        report.duration_ms as f64 / 1000.0,
        style(report.catalog_records).cyan()
    ))
    .ok();
    term.write_line("").ok();

    let sorted = &report.sorted;
    term.write_line(&format!("{}", style("Sorted:").bold().underlined())).ok();
    for (label, count) in [
        ("new files registered", sorted.registered),
        ("copies merged", sorted.merged),
        ("duplicates flagged", sorted.flagged),
        ("hash conflicts", sorted.conflicts),
        ("records relocated", sorted.relocated),
        ("not media", sorted.not_media),
        ("failed", sorted.failed),
    ] {
        write_count(term, label, count);
    }
    term.write_line("").ok();

    let incoming = &report.incoming;
    term.write_line(&format!("{}", style("Incoming:").bold().underlined()))
        .ok();
    write_count(term, "files scanned", incoming.scanned);
    for (label, count) in [
        ("stored", incoming.registered),
        ("trashed as duplicates", incoming.trashed),
        ("set aside (directory already sorted)", incoming.dir_collisions),
        ("hash conflicts", incoming.conflicts),
        ("not media", incoming.unclassifiable),
        ("failed", incoming.failed),
    ] {
        write_count(term, label, count);
    }

    if !report.errors.is_empty() {
        term.write_line("").ok();
        term.write_line(&format!(
            "{} {} files were left in place:",
            style("!").red().bold(),
            report.errors.len()
        ))
        .ok();
        for error in &report.errors {
            term.write_line(&format!(
                "    {} {}",
                style("○").dim(),
                style(&error.message).dim()
            ))
            .ok();
        }
    }

    if report.dry_run {
        term.write_line("").ok();
        term.write_line(&format!(
            "{}",
            style("Dry run: no files were moved and the catalog was not saved.").dim()
        ))
        .ok();
    }
}

fn write_count(term: &Term, label: &str, count: usize) {
    if count == 0 {
        return;
    }
    term.write_line(&format!("  {} {}", style(count).cyan(), label))
        .ok();
}

fn run_verify(storage: &Path, output: OutputFormat) -> Result<()> {
    let layout = Layout::new(storage)?;
    let catalog = Catalog::load(&layout.catalog_file())?;
    let issues = verify_catalog(&catalog);

    match output {
        OutputFormat::Pretty => print_pretty_issues(&Term::stdout(), &catalog, &issues),
        OutputFormat::Json => print_json(&issues),
    }

    if !issues.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_pretty_issues(term: &Term, catalog: &Catalog, issues: &[CatalogIssue]) {
    if issues.is_empty() {
        term.write_line(&format!(
            "{} {} records verified",
            style("✓").green().bold(),
            style(catalog.len()).cyan()
        ))
        .ok();
        return;
    }

    term.write_line(&format!(
        "{} {} issues in {} records",
        style("!").red().bold(),
        issues.len(),
        catalog.len()
    ))
    .ok();
    for issue in issues {
        let line = match &issue.kind {
            IssueKind::Missing { path } => format!("missing    {}", path.display()),
            IssueKind::Diverged { canonical, path } => format!(
                "diverged   {} (differs from {})",
                path.display(),
                canonical.display()
            ),
            IssueKind::Unreadable { path, reason } => {
                format!("unreadable {} ({})", path.display(), reason)
            }
        };
        term.write_line(&format!("  {} {}", style(issue.hash.short()).dim(), line))
            .ok();
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize output: {}", e),
    }
}
