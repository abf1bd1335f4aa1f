//! # Classifier Module
//!
//! Turns scanned batches into filesystem moves and catalog mutations.
//!
//! ## Phases
//! 1. **Sorted reconciliation** - files in the curated tree are registered or
//!    merged into the catalog in place; they are never moved. Their target
//!    directories seed the directory index.
//! 2. **Incoming classification** - every incoming group is planned, then the
//!    plan is applied:
//!
//! ```text
//! Scanned ─┬─ not media ──────────────────────────────► Unclassifiable
//!          ├─ bytes differ within group ───────────────► BatchConflict
//!          └─ extras ► Trashbin, representative ─┬─ same bytes in catalog ► KnownDuplicate
//!                                                ├─ hash taken, bytes differ ► CatalogConflict
//!                                                ├─ target dir indexed ► DirectoryCollision
//!                                                └─ otherwise ► Registered
//! ```
//!
//! Every terminal state maps to exactly one move per file and at most one
//! catalog mutation per group.

mod executor;
mod incoming;
mod mover;
mod planner;
mod reconcile;

pub use executor::{AppliedPlan, PlanExecutor};
pub use incoming::{IncomingClassifier, IncomingReport};
pub use mover::{move_file, unique_destination};
pub use planner::GroupPlanner;
pub use reconcile::{ReconcileReport, SortedReconciler};

use crate::core::identity::ContentHash;
use crate::events::DispositionKind;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What to do with a sorted file that duplicates known content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortedDuplicatePolicy {
    /// Add it as another path of the existing record
    #[default]
    Merge,
    /// Report it on every run and leave the catalog alone
    Flag,
}

/// Terminal state of one incoming group
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Not a media file
    Unclassifiable,
    /// Same hash, different bytes inside the batch
    BatchConflict,
    /// Same bytes are already cataloged
    KnownDuplicate { canonical: PathBuf },
    /// Same hash as a cataloged file with different bytes
    CatalogConflict { canonical: PathBuf },
    /// New content for a directory that is already organized
    DirectoryCollision {
        target_dir: String,
        /// Canonical paths of the records that made the directory known
        existing: Vec<PathBuf>,
    },
    /// Genuinely new content
    Registered { destination: PathBuf },
}

impl Disposition {
    pub fn kind(&self) -> DispositionKind {
        match self {
            Disposition::Unclassifiable => DispositionKind::Unclassifiable,
            Disposition::BatchConflict => DispositionKind::BatchConflict,
            Disposition::KnownDuplicate { .. } => DispositionKind::KnownDuplicate,
            Disposition::CatalogConflict { .. } => DispositionKind::CatalogConflict,
            Disposition::DirectoryCollision { .. } => DispositionKind::DirectoryCollision,
            Disposition::Registered { .. } => DispositionKind::Registered,
        }
    }
}

/// Where a planned move deposits its file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveKind {
    /// Computed camera/date path in Storage
    Store,
    /// Redundant copy, to the trash bin
    Trash,
    /// Hash conflict, to Conflicts
    Conflict,
    /// Directory collision, to Duplicates
    Duplicate,
    /// Not media, to NoImages
    Unclassifiable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub from: PathBuf,
    pub to: PathBuf,
    pub kind: MoveKind,
}

/// A catalog entry to create once the representative is in Storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub hash: ContentHash,
    pub camera: String,
    pub timestamp: NaiveDateTime,
    /// The hash is cataloged but none of its copies exist any more
    pub replaces_stale: bool,
}

/// Everything decided for one group, before anything is touched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupPlan {
    pub disposition: Disposition,
    /// File the disposition is about (first of the group)
    pub representative: PathBuf,
    pub moves: Vec<PlannedMove>,
    pub registration: Option<Registration>,
}
