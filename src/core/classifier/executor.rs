//! Applies group plans to the filesystem and the catalog.

use super::mover::move_file;
use super::{GroupPlan, MoveKind};
use crate::core::catalog::{Catalog, Record};
use crate::core::identity::ContentHash;
use crate::error::ClassifyError;
use std::path::PathBuf;
use tracing::{error, info};

/// Outcome of applying one plan
#[derive(Debug, Default)]
pub struct AppliedPlan {
    /// Moves that happened (or would have, on a dry run), with where the file landed
    pub completed: Vec<(MoveKind, PathBuf)>,
    /// Moves that failed; their source files are still in place
    pub failures: Vec<ClassifyError>,
    /// Hash registered by this plan
    pub registered: Option<ContentHash>,
}

/// Executes plans, one move at a time
pub struct PlanExecutor {
    dry_run: bool,
}

impl PlanExecutor {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Perform the plan's moves, then its registration
    ///
    /// The catalog only learns about new content once it is in Storage. A
    /// failed move never stops the remaining moves of the plan.
    pub fn apply(&self, plan: GroupPlan, catalog: &mut Catalog) -> AppliedPlan {
        let mut applied = AppliedPlan::default();
        let mut stored_at = None;

        for planned in plan.moves {
            if self.dry_run {
                info!(
                    "[dry run] {:?}: {} -> {}",
                    planned.kind,
                    planned.from.display(),
                    planned.to.display()
                );
                applied.completed.push((planned.kind, planned.to));
                continue;
            }

            match move_file(&planned.from, &planned.to) {
                Ok(landed) => {
                    if planned.kind == MoveKind::Store {
                        stored_at = Some(landed.clone());
                    }
                    applied.completed.push((planned.kind, landed));
                }
                Err(e) => {
                    error!("{}", e);
                    applied.failures.push(e);
                }
            }
        }

        if let (Some(registration), Some(path)) = (plan.registration, stored_at) {
            let record = Record::new(path, registration.camera, registration.timestamp, false);
            if registration.replaces_stale {
                info!(
                    "Stored {} again, every earlier copy is gone",
                    record.canonical_path().display()
                );
                if catalog.replace(&registration.hash, record).is_some() {
                    applied.registered = Some(registration.hash);
                } else {
                    error!(
                        "Hash {} left the catalog while its group was being applied",
                        registration.hash
                    );
                }
            } else if catalog.contains(&registration.hash) {
                error!(
                    "Hash {} was registered while its group was being applied",
                    registration.hash
                );
            } else {
                info!("New file {}", record.canonical_path().display());
                catalog.register(registration.hash.clone(), record);
                applied.registered = Some(registration.hash);
            }
        }

        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::classifier::{Disposition, PlannedMove, Registration};
    use chrono::{NaiveDate, NaiveDateTime};
    use std::fs;
    use tempfile::TempDir;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn store_plan(dir: &TempDir, from: PathBuf) -> (GroupPlan, PathBuf, ContentHash) {
        let to = dir.path().join("Storage/Cam/2024-01-02/10-00-00.jpg");
        let hash = ContentHash::from_digest(b"new");
        let plan = GroupPlan {
            disposition: Disposition::Registered {
                destination: to.clone(),
            },
            representative: from.clone(),
            moves: vec![PlannedMove {
                from,
                to: to.clone(),
                kind: MoveKind::Store,
            }],
            registration: Some(Registration {
                hash: hash.clone(),
                camera: "Cam".to_string(),
                timestamp: ts(),
                replaces_stale: false,
            }),
        };
        (plan, to, hash)
    }

    #[test]
    fn registers_after_successful_store() {
        let dir = TempDir::new().unwrap();
        let from = dir.path().join("Incoming/a.jpg");
        fs::create_dir_all(from.parent().unwrap()).unwrap();
        fs::write(&from, b"new").unwrap();
        let (plan, to, hash) = store_plan(&dir, from.clone());
        let mut catalog = Catalog::new();

        let applied = PlanExecutor::new(false).apply(plan, &mut catalog);

        assert!(applied.failures.is_empty());
        assert_eq!(applied.registered, Some(hash.clone()));
        assert_eq!(catalog.lookup(&hash).unwrap().canonical_path(), to);
        assert!(!catalog.lookup(&hash).unwrap().sorted);
        assert!(to.exists());
        assert!(!from.exists());
    }

    #[test]
    fn stale_record_is_replaced_by_the_new_copy() {
        let dir = TempDir::new().unwrap();
        let from = dir.path().join("Incoming/a.jpg");
        fs::create_dir_all(from.parent().unwrap()).unwrap();
        fs::write(&from, b"new").unwrap();
        let (mut plan, to, hash) = store_plan(&dir, from);
        if let Some(registration) = plan.registration.as_mut() {
            registration.replaces_stale = true;
        }
        let stale = dir.path().join("Sorted/moved-away.jpg");
        let mut catalog = Catalog::new();
        catalog.register(
            hash.clone(),
            Record::new(stale.clone(), "Cam".to_string(), ts(), true),
        );

        let applied = PlanExecutor::new(false).apply(plan, &mut catalog);

        assert_eq!(applied.registered, Some(hash.clone()));
        let record = catalog.lookup(&hash).unwrap();
        assert_eq!(record.paths(), &[to]);
        assert!(!record.sorted);
        assert!(!catalog.sorted_paths().contains(&stale));
    }

    #[test]
    fn failed_store_is_not_registered() {
        let dir = TempDir::new().unwrap();
        let (plan, to, hash) = store_plan(&dir, dir.path().join("Incoming/gone.jpg"));
        let mut catalog = Catalog::new();

        let applied = PlanExecutor::new(false).apply(plan, &mut catalog);

        assert_eq!(applied.failures.len(), 1);
        assert!(applied.registered.is_none());
        assert!(!catalog.contains(&hash));
        assert!(!to.exists());
    }

    #[test]
    fn dry_run_touches_nothing() {
        let dir = TempDir::new().unwrap();
        let from = dir.path().join("a.jpg");
        fs::write(&from, b"new").unwrap();
        let (plan, to, hash) = store_plan(&dir, from.clone());
        let mut catalog = Catalog::new();

        let applied = PlanExecutor::new(true).apply(plan, &mut catalog);

        assert_eq!(applied.completed, vec![(MoveKind::Store, to.clone())]);
        assert!(from.exists());
        assert!(!to.exists());
        assert!(!catalog.contains(&hash));
    }
}
