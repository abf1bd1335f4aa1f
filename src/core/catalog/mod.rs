//! # Catalog Module
//!
//! The persistent registry of known content.
//!
//! ## Indices
//! - `by_hash` - content hash to its [`Record`] (the only persisted part)
//! - `by_target_dir` - computed `camera/date` directory to the hashes already
//!   resolved there, used to catch unrelated content landing in a directory
//!   a human has organized. Only curated (sorted) content seeds it; days that
//!   exist only in `Storage/` stay open for new registrations.
//! - `sorted_paths` - files known to live in the curated tree, skipped when
//!   rescanning it
//!
//! The secondary indices are rebuilt from `by_hash` on load and never saved.
//! The catalog is single-owner: one run mutates it sequentially.

mod store;
mod verify;

pub use verify::{verify_catalog, CatalogIssue, IssueKind};

use crate::core::identity::ContentHash;
use crate::core::layout;
use crate::error::IdentityError;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

/// One content identity known to the catalog
///
/// Every path holds a byte-identical copy; the first one is canonical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    paths: Vec<PathBuf>,
    /// Device label, "Unknown Unknown" when undetermined
    pub camera: String,
    /// Capture time (or file modification time as fallback)
    pub timestamp: NaiveDateTime,
    /// Whether the record's files live in the curated tree
    pub sorted: bool,
}

impl Record {
    pub fn new(path: PathBuf, camera: String, timestamp: NaiveDateTime, sorted: bool) -> Self {
        Self {
            paths: vec![path],
            camera,
            timestamp,
            sorted,
        }
    }

    /// Build from stored paths; `None` when no path is left
    pub(crate) fn from_paths(
        paths: Vec<PathBuf>,
        camera: String,
        timestamp: NaiveDateTime,
        sorted: bool,
    ) -> Option<Self> {
        if paths.is_empty() {
            return None;
        }
        Some(Self {
            paths,
            camera,
            timestamp,
            sorted,
        })
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// The first known location of this content
    pub fn canonical_path(&self) -> &Path {
        &self.paths[0]
    }

    /// The `camera/date` directory this content belongs in
    pub fn target_dir(&self) -> String {
        layout::target_dir(&self.camera, &self.timestamp)
    }

    /// First listed copy that is still on disk, `None` when all are gone
    pub fn existing_path(&self) -> Result<Option<&Path>, IdentityError> {
        for path in &self.paths {
            let exists = path.try_exists().map_err(|source| IdentityError::Io {
                path: path.clone(),
                source,
            })?;
            if exists {
                return Ok(Some(path));
            }
        }
        Ok(None)
    }
}

#[derive(Debug, Default)]
pub struct Catalog {
    by_hash: BTreeMap<ContentHash, Record>,
    by_target_dir: HashMap<String, BTreeSet<ContentHash>>,
    sorted_paths: HashSet<PathBuf>,
}

impl Catalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from records, deriving the secondary indices
    ///
    /// Only sorted records seed the directory index.
    pub fn from_records(records: BTreeMap<ContentHash, Record>) -> Self {
        let mut catalog = Self {
            by_hash: records,
            ..Self::default()
        };

        for (hash, record) in &catalog.by_hash {
            if record.sorted {
                catalog
                    .by_target_dir
                    .entry(record.target_dir())
                    .or_default()
                    .insert(hash.clone());
                catalog.sorted_paths.extend(record.paths.iter().cloned());
            }
        }

        catalog
    }

    pub fn len(&self) -> usize {
        self.by_hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }

    pub fn lookup(&self, hash: &ContentHash) -> Option<&Record> {
        self.by_hash.get(hash)
    }

    pub fn contains(&self, hash: &ContentHash) -> bool {
        self.by_hash.contains_key(hash)
    }

    /// All records in hash order
    pub fn records(&self) -> impl Iterator<Item = (&ContentHash, &Record)> {
        self.by_hash.iter()
    }

    /// Insert a record for a hash that is not yet known
    ///
    /// # Panics
    /// If the hash is already registered. Callers must [`lookup`](Self::lookup) first.
    pub fn register(&mut self, hash: ContentHash, record: Record) {
        assert!(
            !self.by_hash.contains_key(&hash),
            "hash {} is already registered",
            hash
        );
        if record.sorted {
            self.sorted_paths.extend(record.paths.iter().cloned());
        }
        self.by_hash.insert(hash, record);
    }

    /// Append a byte-identical copy to an existing record
    ///
    /// A copy found in the curated tree makes the whole record curated and
    /// indexes its target directory. Returns false when the hash is unknown.
    /// Paths already listed are not added twice.
    pub fn merge_duplicate(&mut self, hash: &ContentHash, path: PathBuf, sorted: bool) -> bool {
        let Some(record) = self.by_hash.get_mut(hash) else {
            return false;
        };

        if sorted {
            record.sorted = true;
            self.sorted_paths.extend(record.paths.iter().cloned());
            self.sorted_paths.insert(path.clone());
            self.by_target_dir
                .entry(record.target_dir())
                .or_default()
                .insert(hash.clone());
        }
        if !record.paths.contains(&path) {
            record.paths.push(path);
        }
        true
    }

    /// Swap out a record whose copies have all disappeared from disk
    ///
    /// Returns the old record, or `None` (and changes nothing) when the hash
    /// is unknown.
    pub fn replace(&mut self, hash: &ContentHash, record: Record) -> Option<Record> {
        let old = self.by_hash.remove(hash)?;
        for path in &old.paths {
            self.sorted_paths.remove(path);
        }
        if record.sorted {
            self.sorted_paths.extend(record.paths.iter().cloned());
            self.by_target_dir
                .entry(record.target_dir())
                .or_default()
                .insert(hash.clone());
        }
        self.by_hash.insert(hash.clone(), record);
        Some(old)
    }

    /// Hashes already resolved to a target directory
    pub fn index_target_dir(&self, dir: &str) -> Option<&BTreeSet<ContentHash>> {
        self.by_target_dir.get(dir)
    }

    /// Record that `hash` has been resolved to `dir`
    pub fn mark_target_dir(&mut self, dir: String, hash: ContentHash) {
        debug_assert!(
            self.by_hash.contains_key(&hash),
            "indexed hash {} must be registered",
            hash
        );
        self.by_target_dir.entry(dir).or_default().insert(hash);
    }

    /// Files known to live in the curated tree
    pub fn sorted_paths(&self) -> &HashSet<PathBuf> {
        &self.sorted_paths
    }

    /// Canonical paths of the records indexed under a directory
    pub fn paths_in_target_dir(&self, dir: &str) -> Vec<PathBuf> {
        self.index_target_dir(dir)
            .into_iter()
            .flatten()
            .filter_map(|hash| self.lookup(hash))
            .map(|record| record.canonical_path().to_path_buf())
            .collect()
    }

    pub(crate) fn records_map(&self) -> &BTreeMap<ContentHash, Record> {
        &self.by_hash
    }
}
