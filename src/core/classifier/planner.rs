//! Plan generator for incoming groups.

use super::{Disposition, GroupPlan, MoveKind, PlannedMove, Registration};
use crate::core::catalog::Catalog;
use crate::core::identity::{files_equal, group_equal, ContentHash};
use crate::core::layout::{target_file_name, Layout};
use crate::core::scanner::{ScannedFile, SourceFile};
use crate::error::ClassifyError;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Decides the disposition of each group without touching the filesystem
///
/// Storage destinations handed out during a run are remembered, so two
/// groups never get the same name even when nothing has been moved yet
/// (dry runs).
pub struct GroupPlanner {
    layout: Layout,
    reserved: HashSet<PathBuf>,
}

impl GroupPlanner {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            reserved: HashSet::new(),
        }
    }

    /// Plan the non-media files: each goes to `NoImages/` as-is
    pub fn plan_unclassifiable(&self, file: &SourceFile) -> GroupPlan {
        GroupPlan {
            disposition: Disposition::Unclassifiable,
            representative: file.path.clone(),
            moves: vec![PlannedMove {
                from: file.path.clone(),
                to: self.layout.no_images().join(&file.relative),
                kind: MoveKind::Unclassifiable,
            }],
            registration: None,
        }
    }

    /// Plan one group of same-hash incoming files
    ///
    /// `files` must be non-empty. Errors leave the whole group untouched so
    /// the next run sees it again.
    pub fn plan_group(
        &mut self,
        catalog: &Catalog,
        hash: &ContentHash,
        files: &[ScannedFile],
    ) -> Result<GroupPlan, ClassifyError> {
        let representative = &files[0];
        let paths: Vec<&Path> = files.iter().map(ScannedFile::path).collect();

        if !group_equal(&paths)? {
            return Ok(GroupPlan {
                disposition: Disposition::BatchConflict,
                representative: representative.path().to_path_buf(),
                moves: files
                    .iter()
                    .map(|f| self.deposit(f, MoveKind::Conflict))
                    .collect(),
                registration: None,
            });
        }

        let mut moves: Vec<PlannedMove> = files[1..]
            .iter()
            .map(|f| self.deposit(f, MoveKind::Trash))
            .collect();

        let mut registration = None;
        let known = match catalog.lookup(hash) {
            Some(record) => Some(record.existing_path()?.map(Path::to_path_buf)),
            None => None,
        };
        let disposition = match known {
            Some(Some(canonical)) => {
                if files_equal(representative.path(), &canonical)? {
                    moves.push(self.deposit(representative, MoveKind::Trash));
                    Disposition::KnownDuplicate { canonical }
                } else {
                    moves.push(self.deposit(representative, MoveKind::Conflict));
                    Disposition::CatalogConflict { canonical }
                }
            }
            // Every cataloged copy is gone: this file takes the record over.
            Some(None) => {
                let destination =
                    self.store(representative, hash, true, &mut moves, &mut registration)?;
                Disposition::Registered { destination }
            }
            None => {
                let target_dir = representative.target_dir();
                if catalog.index_target_dir(&target_dir).is_some() {
                    moves.push(self.deposit(representative, MoveKind::Duplicate));
                    Disposition::DirectoryCollision {
                        existing: catalog.paths_in_target_dir(&target_dir),
                        target_dir,
                    }
                } else {
                    let destination =
                        self.store(representative, hash, false, &mut moves, &mut registration)?;
                    Disposition::Registered { destination }
                }
            }
        };

        Ok(GroupPlan {
            disposition,
            representative: representative.path().to_path_buf(),
            moves,
            registration,
        })
    }

    fn store(
        &mut self,
        file: &ScannedFile,
        hash: &ContentHash,
        replaces_stale: bool,
        moves: &mut Vec<PlannedMove>,
        registration: &mut Option<Registration>,
    ) -> Result<PathBuf, ClassifyError> {
        let destination = self.free_destination(file, &file.target_dir())?;
        moves.push(PlannedMove {
            from: file.path().to_path_buf(),
            to: destination.clone(),
            kind: MoveKind::Store,
        });
        *registration = Some(Registration {
            hash: hash.clone(),
            camera: file.camera.clone(),
            timestamp: file.timestamp,
            replaces_stale,
        });
        Ok(destination)
    }

    /// Non-storage deposit, keeping the path relative to `Incoming/`
    fn deposit(&self, file: &ScannedFile, kind: MoveKind) -> PlannedMove {
        let folder = match kind {
            MoveKind::Trash => self.layout.trashbin(),
            MoveKind::Conflict => self.layout.conflicts(),
            MoveKind::Duplicate => self.layout.duplicates(),
            MoveKind::Unclassifiable => self.layout.no_images(),
            MoveKind::Store => self.layout.storage(),
        };
        PlannedMove {
            from: file.path().to_path_buf(),
            to: folder.join(file.relative()),
            kind,
        }
    }

    /// First `HH-MM-SS[-n].ext` name in the target directory that is free
    fn free_destination(
        &mut self,
        file: &ScannedFile,
        target_dir: &str,
    ) -> Result<PathBuf, ClassifyError> {
        let dir = self.layout.storage().join(target_dir);
        let mut dup = 0;
        loop {
            let candidate = dir.join(target_file_name(&file.timestamp, file.extension(), dup));
            if !self.reserved.contains(&candidate) {
                let taken = candidate
                    .try_exists()
                    .map_err(|source| ClassifyError::Probe {
                        path: candidate.clone(),
                        source,
                    })?;
                if !taken {
                    self.reserved.insert(candidate.clone());
                    return Ok(candidate);
                }
            }
            dup += 1;
        }
    }
}
