//! Incoming classification: plan each group, then apply it.

use super::{Disposition, GroupPlan, GroupPlanner, MoveKind, PlanExecutor};
use crate::core::catalog::Catalog;
use crate::core::layout::Layout;
use crate::core::pipeline::CancellationToken;
use crate::core::scanner::ScanResult;
use crate::events::{ClassifyEvent, Event, EventSender, IncomingCounters};
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Result of classifying one incoming batch
#[derive(Debug, Default)]
pub struct IncomingReport {
    pub counters: IncomingCounters,
    /// Per-file failures as `(path, message)`
    pub errors: Vec<(PathBuf, String)>,
    pub cancelled: bool,
}

pub struct IncomingClassifier {
    planner: GroupPlanner,
    executor: PlanExecutor,
}

impl IncomingClassifier {
    pub fn new(layout: Layout, dry_run: bool) -> Self {
        Self {
            planner: GroupPlanner::new(layout),
            executor: PlanExecutor::new(dry_run),
        }
    }

    /// Classify every file of an incoming scan
    ///
    /// Non-media files go first, then groups in hash order. Cancellation is
    /// checked before each of them; a group is always finished once started.
    pub fn classify(
        &mut self,
        catalog: &mut Catalog,
        scan: &ScanResult,
        cancel: &CancellationToken,
        events: &EventSender,
    ) -> IncomingReport {
        let mut report = IncomingReport::default();

        for file in &scan.unclassifiable {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            report.counters.scanned += 1;
            info!("Not a media file {}", file.path.display());
            let plan = self.planner.plan_unclassifiable(file);
            self.apply(plan, catalog, &mut report, events);
        }

        if !report.cancelled {
            for (hash, files) in &scan.groups {
                if cancel.is_cancelled() {
                    report.cancelled = true;
                    break;
                }
                report.counters.scanned += files.len();

                match self.planner.plan_group(catalog, hash, files) {
                    Ok(plan) => {
                        log_disposition(&plan);
                        self.apply(plan, catalog, &mut report, events);
                    }
                    Err(e) => {
                        error!("Skipping group {}: {}", hash.short(), e);
                        report.counters.failed += files.len();
                        let path = files[0].path().to_path_buf();
                        events.send(Event::Classify(ClassifyEvent::Error {
                            path: path.clone(),
                            message: e.to_string(),
                        }));
                        report.errors.push((path, e.to_string()));
                    }
                }
            }
        }

        events.send(Event::Classify(ClassifyEvent::Completed(report.counters)));
        report
    }

    fn apply(
        &self,
        plan: GroupPlan,
        catalog: &mut Catalog,
        report: &mut IncomingReport,
        events: &EventSender,
    ) {
        let representative = plan.representative.clone();
        let kind = plan.disposition.kind();
        let applied = self.executor.apply(plan, catalog);

        for (move_kind, _) in &applied.completed {
            let counter = match move_kind {
                MoveKind::Store => &mut report.counters.registered,
                MoveKind::Trash => &mut report.counters.trashed,
                MoveKind::Conflict => &mut report.counters.conflicts,
                MoveKind::Duplicate => &mut report.counters.dir_collisions,
                MoveKind::Unclassifiable => &mut report.counters.unclassifiable,
            };
            *counter += 1;
        }

        for failure in applied.failures {
            report.counters.failed += 1;
            events.send(Event::Classify(ClassifyEvent::Error {
                path: representative.clone(),
                message: failure.to_string(),
            }));
            report.errors.push((representative.clone(), failure.to_string()));
        }

        events.send(Event::Classify(ClassifyEvent::Disposition {
            representative,
            kind,
        }));
        events.send(Event::Classify(ClassifyEvent::Progress(report.counters)));
    }
}

fn log_disposition(plan: &GroupPlan) {
    let path = plan.representative.display();
    match &plan.disposition {
        Disposition::Registered { destination } => {
            info!("Storing {} as {}", path, destination.display())
        }
        Disposition::KnownDuplicate { canonical } => {
            info!("Already cataloged {} (same as {})", path, canonical.display())
        }
        Disposition::CatalogConflict { canonical } => {
            warn!(
                "Hash conflict: {} differs from cataloged {}",
                path,
                canonical.display()
            )
        }
        Disposition::BatchConflict => {
            warn!("Hash conflict within incoming group of {}", path)
        }
        Disposition::DirectoryCollision {
            target_dir,
            existing,
        } => {
            warn!(
                "Directory {} is already organized ({} known files), moving {} to duplicates",
                target_dir,
                existing.len(),
                path
            );
            for known in existing {
                info!("  known: {}", known.display());
            }
        }
        Disposition::Unclassifiable => {}
    }
}
