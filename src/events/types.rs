//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by an intake run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Directory scanning events
    Scan(ScanEvent),
    /// Sorted-tree reconciliation events
    Reconcile(ReconcileEvent),
    /// Incoming classification events
    Classify(ClassifyEvent),
    /// Run-level events
    Pipeline(PipelineEvent),
}

/// Events while scanning a tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Listing finished, identification is starting
    Started { root: PathBuf, total_files: usize },
    /// A file was identified
    Progress(ScanProgress),
    /// A file could not be identified; it stays where it is
    Error { path: PathBuf, message: String },
    /// Scanning finished (or stopped early)
    Completed {
        root: PathBuf,
        total_scanned: usize,
        cancelled: bool,
    },
}

/// Progress information during scanning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanProgress {
    /// Files identified so far
    pub scanned: usize,
    /// Files listed for identification
    pub total: usize,
    /// File just identified
    pub current_path: PathBuf,
}

/// Counters for the sorted-tree phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortedCounters {
    /// Files found in the sorted tree (not yet known)
    pub scanned: usize,
    /// New records registered
    pub registered: usize,
    /// Copies merged into existing records
    pub merged: usize,
    /// Copies reported but not merged (flag policy)
    pub flagged: usize,
    /// Hash conflicts needing manual resolution
    pub conflicts: usize,
    /// Records whose listed copies were all gone, now pointing here
    pub relocated: usize,
    /// Non-media files, ignored
    pub not_media: usize,
    /// Files that failed and will be retried next run
    pub failed: usize,
}

/// Counters for the incoming phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingCounters {
    /// Files found in the incoming tree
    pub scanned: usize,
    /// New content moved into storage
    pub registered: usize,
    /// Redundant copies moved to the trash bin
    pub trashed: usize,
    /// New content whose target directory is already organized
    pub dir_collisions: usize,
    /// Files set aside because of hash conflicts
    pub conflicts: usize,
    /// Non-media files moved aside
    pub unclassifiable: usize,
    /// Files left in place after a failure
    pub failed: usize,
}

/// How an incoming group was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispositionKind {
    Registered,
    KnownDuplicate,
    CatalogConflict,
    DirectoryCollision,
    BatchConflict,
    Unclassifiable,
}

/// Events during sorted-tree reconciliation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReconcileEvent {
    Progress(SortedCounters),
    /// Same hash, different bytes; the sorted file is left untouched
    HashConflict { existing: PathBuf, path: PathBuf },
    Completed(SortedCounters),
}

/// Events during incoming classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClassifyEvent {
    Progress(IncomingCounters),
    /// A group reached its terminal state
    Disposition {
        representative: PathBuf,
        kind: DispositionKind,
    },
    /// A file could not be handled and stays where it is
    Error { path: PathBuf, message: String },
    Completed(IncomingCounters),
}

/// Run-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// Run has started
    Started { run_id: String },
    /// Moving to a new phase
    PhaseChanged { phase: IntakePhase },
    /// Cancellation was observed; the catalog is still saved
    Cancelled,
    /// Run finished
    Completed { summary: RunSummary },
}

/// Phases of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntakePhase {
    LoadingCatalog,
    ScanningSorted,
    ReconcilingSorted,
    ScanningIncoming,
    ClassifyingIncoming,
    SavingCatalog,
}

/// Summary of a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub sorted: SortedCounters,
    pub incoming: IncomingCounters,
    pub cancelled: bool,
    pub duration_ms: u64,
}

impl std::fmt::Display for IntakePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntakePhase::LoadingCatalog => write!(f, "Loading catalog"),
            IntakePhase::ScanningSorted => write!(f, "Scanning sorted"),
            IntakePhase::ReconcilingSorted => write!(f, "Reconciling sorted"),
            IntakePhase::ScanningIncoming => write!(f, "Scanning incoming"),
            IntakePhase::ClassifyingIncoming => write!(f, "Classifying incoming"),
            IntakePhase::SavingCatalog => write!(f, "Saving catalog"),
        }
    }
}
