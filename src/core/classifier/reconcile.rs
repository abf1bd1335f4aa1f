//! Sorted reconciliation: bring the catalog in line with the curated tree.

use super::SortedDuplicatePolicy;
use crate::core::catalog::{Catalog, Record};
use crate::core::identity::files_equal;
use crate::core::pipeline::CancellationToken;
use crate::core::scanner::ScanResult;
use crate::events::{Event, EventSender, ReconcileEvent, SortedCounters};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub counters: SortedCounters,
    /// Per-file failures as `(path, message)`
    pub errors: Vec<(PathBuf, String)>,
    pub cancelled: bool,
}

/// Registers or merges sorted files in place; never moves anything
///
/// Every file whose outcome is decided has its target directory marked in
/// the directory index, so incoming content cannot slip into a day a human
/// has already organized.
pub struct SortedReconciler {
    policy: SortedDuplicatePolicy,
}

impl SortedReconciler {
    pub fn new(policy: SortedDuplicatePolicy) -> Self {
        Self { policy }
    }

    pub fn reconcile(
        &self,
        catalog: &mut Catalog,
        scan: &ScanResult,
        cancel: &CancellationToken,
        events: &EventSender,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        for file in &scan.unclassifiable {
            error!("Not a media file in sorted tree: {}", file.path.display());
        }
        report.counters.not_media = scan.unclassifiable.len();

        for (hash, files) in &scan.groups {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            for file in files {
                report.counters.scanned += 1;
                let path = file.path().to_path_buf();

                match catalog.lookup(hash) {
                    None => {
                        info!("New sorted file {}", path.display());
                        catalog.register(
                            hash.clone(),
                            Record::new(path, file.camera.clone(), file.timestamp, true),
                        );
                        report.counters.registered += 1;
                    }
                    Some(record) => {
                        let existing = match record.existing_path() {
                            Ok(existing) => existing.map(Path::to_path_buf),
                            Err(e) => {
                                error!("Checking copies of {}: {}", path.display(), e);
                                report.counters.failed += 1;
                                report.errors.push((path, e.to_string()));
                                continue;
                            }
                        };
                        let Some(canonical) = existing else {
                            info!(
                                "Every copy of {} is gone, relocating record to {}",
                                record.canonical_path().display(),
                                path.display()
                            );
                            catalog.replace(
                                hash,
                                Record::new(path, file.camera.clone(), file.timestamp, true),
                            );
                            // The new record is sorted, so replace indexes its day.
                            report.counters.relocated += 1;
                            continue;
                        };
                        match files_equal(&canonical, &path) {
                            Ok(true) => match self.policy {
                                SortedDuplicatePolicy::Merge => {
                                    info!(
                                        "Merging sorted copy {} into {}",
                                        path.display(),
                                        canonical.display()
                                    );
                                    catalog.merge_duplicate(hash, path, true);
                                    report.counters.merged += 1;
                                }
                                SortedDuplicatePolicy::Flag => {
                                    warn!(
                                        "Duplicate in sorted tree: {} is the same as {}",
                                        path.display(),
                                        canonical.display()
                                    );
                                    report.counters.flagged += 1;
                                }
                            },
                            Ok(false) => {
                                warn!(
                                    "Hash conflict in sorted tree: {} differs from {}",
                                    path.display(),
                                    canonical.display()
                                );
                                events.send(Event::Reconcile(ReconcileEvent::HashConflict {
                                    existing: canonical,
                                    path,
                                }));
                                report.counters.conflicts += 1;
                            }
                            Err(e) => {
                                error!("Comparing {}: {}", path.display(), e);
                                report.counters.failed += 1;
                                report.errors.push((path, e.to_string()));
                                continue;
                            }
                        }
                    }
                }

                catalog.mark_target_dir(file.target_dir(), hash.clone());
            }

            events.send(Event::Reconcile(ReconcileEvent::Progress(report.counters)));
        }

        events.send(Event::Reconcile(ReconcileEvent::Completed(report.counters)));
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::hash_file;
    use crate::core::scanner::{ScannedFile, SourceFile};
    use crate::events::null_sender;
    use chrono::{NaiveDate, NaiveDateTime};
    use std::fs;
    use tempfile::TempDir;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn sorted_file(root: &Path, relative: &str, content: &[u8]) -> ScannedFile {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        ScannedFile {
            source: SourceFile {
                path,
                relative: PathBuf::from(relative),
            },
            camera: "Cam Model".to_string(),
            timestamp: ts(),
        }
    }

    fn scan_of(files: Vec<ScannedFile>) -> ScanResult {
        let mut scan = ScanResult::default();
        for file in files {
            let hash = hash_file(file.path()).unwrap();
            scan.groups.entry(hash).or_default().push(file);
        }
        scan
    }

    fn run(policy: SortedDuplicatePolicy, catalog: &mut Catalog, scan: &ScanResult) -> ReconcileReport {
        SortedReconciler::new(policy).reconcile(
            catalog,
            scan,
            &CancellationToken::new(),
            &null_sender(),
        )
    }

    #[test]
    fn new_sorted_files_are_registered_and_indexed() {
        let dir = TempDir::new().unwrap();
        let file = sorted_file(dir.path(), "jan/a.jpg", b"a");
        let path = file.path().to_path_buf();
        let scan = scan_of(vec![file]);
        let mut catalog = Catalog::new();

        let report = run(SortedDuplicatePolicy::Merge, &mut catalog, &scan);

        assert_eq!(report.counters.registered, 1);
        let (_, record) = catalog.records().next().unwrap();
        assert!(record.sorted);
        assert_eq!(record.canonical_path(), path);
        assert!(catalog.index_target_dir("Cam Model/2024-01-02").is_some());
        assert!(catalog.sorted_paths().contains(&path));
    }

    #[test]
    fn identical_sorted_copies_are_merged() {
        let dir = TempDir::new().unwrap();
        let scan = scan_of(vec![
            sorted_file(dir.path(), "a.jpg", b"same"),
            sorted_file(dir.path(), "b/a.jpg", b"same"),
        ]);
        let mut catalog = Catalog::new();

        let report = run(SortedDuplicatePolicy::Merge, &mut catalog, &scan);

        assert_eq!(report.counters.registered, 1);
        assert_eq!(report.counters.merged, 1);
        let (_, record) = catalog.records().next().unwrap();
        assert_eq!(record.paths().len(), 2);
    }

    #[test]
    fn flag_policy_leaves_catalog_alone() {
        let dir = TempDir::new().unwrap();
        let scan = scan_of(vec![
            sorted_file(dir.path(), "a.jpg", b"same"),
            sorted_file(dir.path(), "b.jpg", b"same"),
        ]);
        let mut catalog = Catalog::new();

        let report = run(SortedDuplicatePolicy::Flag, &mut catalog, &scan);

        assert_eq!(report.counters.flagged, 1);
        assert_eq!(report.counters.merged, 0);
        let (_, record) = catalog.records().next().unwrap();
        assert_eq!(record.paths().len(), 1);
    }

    #[test]
    fn sorted_copy_of_stored_content_makes_record_sorted() {
        let dir = TempDir::new().unwrap();
        let stored = dir.path().join("Storage/a.jpg");
        fs::create_dir_all(stored.parent().unwrap()).unwrap();
        fs::write(&stored, b"content").unwrap();
        let hash = hash_file(&stored).unwrap();
        let mut catalog = Catalog::new();
        catalog.register(
            hash.clone(),
            Record::new(stored.clone(), "Cam Model".to_string(), ts(), false),
        );

        let scan = scan_of(vec![sorted_file(dir.path(), "Sorted/a.jpg", b"content")]);
        run(SortedDuplicatePolicy::Merge, &mut catalog, &scan);

        let record = catalog.lookup(&hash).unwrap();
        assert!(record.sorted);
        assert_eq!(record.canonical_path(), stored);
        assert_eq!(record.paths().len(), 2);
    }

    #[test]
    fn sorted_hash_conflict_keeps_record_and_still_indexes() {
        let dir = TempDir::new().unwrap();
        let other = dir.path().join("Storage/x.jpg");
        fs::create_dir_all(other.parent().unwrap()).unwrap();
        fs::write(&other, b"different bytes").unwrap();

        let file = sorted_file(dir.path(), "Sorted/a.jpg", b"sorted bytes");
        let hash = hash_file(file.path()).unwrap();
        let mut catalog = Catalog::new();
        catalog.register(
            hash.clone(),
            Record::new(other.clone(), "Other".to_string(), ts(), false),
        );

        let report = run(SortedDuplicatePolicy::Merge, &mut catalog, &scan_of(vec![file]));

        assert_eq!(report.counters.conflicts, 1);
        assert_eq!(catalog.lookup(&hash).unwrap().paths(), &[other]);
        assert!(catalog.index_target_dir("Cam Model/2024-01-02").is_some());
    }

    #[test]
    fn record_with_no_surviving_copy_is_relocated() {
        let dir = TempDir::new().unwrap();
        let file = sorted_file(dir.path(), "Sorted/trip/a.jpg", b"bytes");
        let path = file.path().to_path_buf();
        let hash = hash_file(&path).unwrap();
        let mut catalog = Catalog::new();
        catalog.register(
            hash.clone(),
            Record::new(dir.path().join("Storage/gone.jpg"), "Cam Model".to_string(), ts(), false),
        );

        let report = run(SortedDuplicatePolicy::Merge, &mut catalog, &scan_of(vec![file]));

        assert_eq!(report.counters.relocated, 1);
        assert_eq!(report.counters.failed, 0);
        assert!(report.errors.is_empty());
        let record = catalog.lookup(&hash).unwrap();
        assert!(record.sorted);
        assert_eq!(record.paths(), &[path.clone()]);
        assert!(catalog.sorted_paths().contains(&path));
        assert!(catalog.index_target_dir("Cam Model/2024-01-02").is_some());
    }

    #[test]
    fn stale_canonical_falls_back_to_surviving_copy() {
        let dir = TempDir::new().unwrap();
        let survivor = dir.path().join("Storage/b.jpg");
        fs::create_dir_all(survivor.parent().unwrap()).unwrap();
        fs::write(&survivor, b"bytes").unwrap();

        let file = sorted_file(dir.path(), "Sorted/a.jpg", b"bytes");
        let hash = hash_file(file.path()).unwrap();
        let mut catalog = Catalog::new();
        catalog.register(
            hash.clone(),
            Record::new(dir.path().join("Storage/gone.jpg"), "Cam Model".to_string(), ts(), false),
        );
        catalog.merge_duplicate(&hash, survivor, false);

        let report = run(SortedDuplicatePolicy::Merge, &mut catalog, &scan_of(vec![file]));

        assert_eq!(report.counters.merged, 1);
        assert_eq!(report.counters.failed, 0);
        assert_eq!(catalog.lookup(&hash).unwrap().paths().len(), 3);
    }

    #[test]
    fn cancellation_stops_before_next_group() {
        let dir = TempDir::new().unwrap();
        let scan = scan_of(vec![sorted_file(dir.path(), "a.jpg", b"a")]);
        let token = CancellationToken::new();
        token.cancel();
        let mut catalog = Catalog::new();

        let report = SortedReconciler::new(SortedDuplicatePolicy::Merge).reconcile(
            &mut catalog,
            &scan,
            &token,
            &null_sender(),
        );

        assert!(report.cancelled);
        assert!(catalog.is_empty());
    }
}
