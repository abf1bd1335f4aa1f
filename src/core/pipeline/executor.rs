//! Intake run implementation.

use super::CancellationToken;
use crate::core::catalog::Catalog;
use crate::core::classifier::{IncomingClassifier, SortedDuplicatePolicy, SortedReconciler};
use crate::core::layout::Layout;
use crate::core::metadata::{ExifDecoder, MetadataDecoder};
use crate::core::scanner::{DirectoryScanner, ScanConfig, ScanResult};
use crate::error::IntakeError;
use crate::events::{
    null_sender, Event, EventSender, IncomingCounters, IntakePhase, PipelineEvent, RunSummary,
    SortedCounters,
};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

/// A per-file problem encountered during a run
#[derive(Debug, Clone, Serialize)]
pub struct ReportedError {
    pub path: PathBuf,
    pub message: String,
}

/// Result of one intake run
#[derive(Debug, Clone, Serialize)]
pub struct IntakeReport {
    pub run_id: String,
    pub root: PathBuf,
    pub dry_run: bool,
    pub sorted: SortedCounters,
    pub incoming: IncomingCounters,
    /// Non-fatal errors; the files involved were left in place
    pub errors: Vec<ReportedError>,
    pub cancelled: bool,
    /// Records in the catalog at the end of the run
    pub catalog_records: usize,
    pub duration_ms: u64,
}

impl IntakeReport {
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            sorted: self.sorted,
            incoming: self.incoming,
            cancelled: self.cancelled,
            duration_ms: self.duration_ms,
        }
    }

    fn push_errors(&mut self, errors: impl IntoIterator<Item = (PathBuf, String)>) {
        self.errors.extend(
            errors
                .into_iter()
                .map(|(path, message)| ReportedError { path, message }),
        );
    }
}

/// Configuration for an intake run
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    /// Storage root holding `Incoming/`, `Sorted/` and the catalog
    pub root: PathBuf,
    pub scan_config: ScanConfig,
    pub sorted_duplicates: SortedDuplicatePolicy,
    /// Plan and report without moving files or saving the catalog
    pub dry_run: bool,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            scan_config: ScanConfig::default(),
            sorted_duplicates: SortedDuplicatePolicy::default(),
            dry_run: false,
        }
    }
}

/// Builder for intake configuration
pub struct IntakeBuilder {
    config: IntakeConfig,
    decoder: Option<Box<dyn MetadataDecoder>>,
}

impl IntakeBuilder {
    pub fn new() -> Self {
        Self {
            config: IntakeConfig::default(),
            decoder: None,
        }
    }

    /// Set the storage root
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.root = root.into();
        self
    }

    /// Set scanner configuration
    pub fn scan_config(mut self, config: ScanConfig) -> Self {
        self.config.scan_config = config;
        self
    }

    /// Follow symbolic links while scanning
    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.config.scan_config.follow_symlinks = follow;
        self
    }

    /// What to do with sorted files duplicating known content
    pub fn sorted_duplicates(mut self, policy: SortedDuplicatePolicy) -> Self {
        self.config.sorted_duplicates = policy;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.config.dry_run = dry_run;
        self
    }

    /// Replace the EXIF decoder
    pub fn decoder(mut self, decoder: Box<dyn MetadataDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    pub fn build(self) -> Intake {
        let decoder = self.decoder.unwrap_or_else(|| Box::new(ExifDecoder));
        Intake {
            scanner: DirectoryScanner::new(self.config.scan_config.clone(), decoder),
            config: self.config,
        }
    }
}

impl Default for IntakeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The intake engine: reconcile `Sorted/`, then classify `Incoming/`
pub struct Intake {
    config: IntakeConfig,
    scanner: DirectoryScanner,
}

impl Intake {
    pub fn builder() -> IntakeBuilder {
        IntakeBuilder::new()
    }

    pub fn config(&self) -> &IntakeConfig {
        &self.config
    }

    /// Run without events or cancellation
    pub fn run(&self) -> Result<IntakeReport, IntakeError> {
        self.run_with_events(&null_sender(), &CancellationToken::new())
    }

    /// Run with event reporting and cooperative cancellation
    ///
    /// Fails only when the root is unusable, the catalog cannot be loaded,
    /// or the final save fails. Once loaded, the catalog is saved even when
    /// the run is cancelled.
    pub fn run_with_events(
        &self,
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<IntakeReport, IntakeError> {
        let start_time = Instant::now();
        let run_id = Uuid::new_v4().to_string();
        events.send(Event::Pipeline(PipelineEvent::Started {
            run_id: run_id.clone(),
        }));

        let layout = Layout::new(&self.config.root)?;
        info!(
            "Run {} on {}{}",
            run_id,
            layout.root().display(),
            if self.config.dry_run { " (dry run)" } else { "" }
        );

        phase(events, IntakePhase::LoadingCatalog);
        let catalog_file = layout.catalog_file();
        let mut catalog = Catalog::load(&catalog_file)?;

        let mut report = IntakeReport {
            run_id,
            root: layout.root().to_path_buf(),
            dry_run: self.config.dry_run,
            sorted: SortedCounters::default(),
            incoming: IncomingCounters::default(),
            errors: Vec::new(),
            cancelled: false,
            catalog_records: 0,
            duration_ms: 0,
        };

        self.process(&layout, &mut catalog, &mut report, cancel, events);

        if report.cancelled {
            warn!("Run cancelled, saving progress");
            events.send(Event::Pipeline(PipelineEvent::Cancelled));
        }

        if !self.config.dry_run {
            phase(events, IntakePhase::SavingCatalog);
            catalog.save(&catalog_file)?;
        }

        report.catalog_records = catalog.len();
        report.duration_ms = start_time.elapsed().as_millis() as u64;
        events.send(Event::Pipeline(PipelineEvent::Completed {
            summary: report.summary(),
        }));

        Ok(report)
    }

    /// Both phases; stops at the first boundary after cancellation
    fn process(
        &self,
        layout: &Layout,
        catalog: &mut Catalog,
        report: &mut IntakeReport,
        cancel: &CancellationToken,
        events: &EventSender,
    ) {
        phase(events, IntakePhase::ScanningSorted);
        let visited = catalog.sorted_paths().clone();
        let sorted = self.scan(&layout.sorted(), &visited, report, cancel, events);
        if sorted.cancelled {
            report.cancelled = true;
            return;
        }

        phase(events, IntakePhase::ReconcilingSorted);
        let reconciled = SortedReconciler::new(self.config.sorted_duplicates)
            .reconcile(catalog, &sorted, cancel, events);
        report.sorted = reconciled.counters;
        report.push_errors(reconciled.errors);
        if reconciled.cancelled {
            report.cancelled = true;
            return;
        }

        phase(events, IntakePhase::ScanningIncoming);
        let incoming = self.scan(&layout.incoming(), &HashSet::new(), report, cancel, events);
        if incoming.cancelled {
            report.cancelled = true;
            return;
        }

        phase(events, IntakePhase::ClassifyingIncoming);
        let classified = IncomingClassifier::new(layout.clone(), self.config.dry_run)
            .classify(catalog, &incoming, cancel, events);
        report.incoming = classified.counters;
        report.push_errors(classified.errors);
        report.cancelled = classified.cancelled;
    }

    /// Scan one tree; a missing tree is simply empty
    fn scan(
        &self,
        root: &Path,
        visited: &HashSet<PathBuf>,
        report: &mut IntakeReport,
        cancel: &CancellationToken,
        events: &EventSender,
    ) -> ScanResult {
        if !root.is_dir() {
            info!("{} does not exist, nothing to scan", root.display());
            return ScanResult::default();
        }

        let result = self.scanner.scan(root, visited, cancel, events);
        for (path, e) in &result.errors {
            error!("Skipped {}: {}", path.display(), e);
        }
        report.push_errors(
            result
                .errors
                .iter()
                .map(|(path, e)| (path.clone(), e.to_string())),
        );
        result
    }
}

fn phase(events: &EventSender, phase: IntakePhase) {
    info!("{}", phase);
    events.send(Event::Pipeline(PipelineEvent::PhaseChanged { phase }));
}
