//! # Scanner Module
//!
//! Walks a tree and identifies every file in it.
//!
//! Media files get a camera label, a capture time and a content hash, and
//! are grouped by hash. Non-media files are listed separately and never
//! hashed. Files that fail are reported per path and left where they are,
//! so the next run picks them up again.
//!
//! ## Example
//! ```rust,ignore
//! let scanner = DirectoryScanner::new(ScanConfig::default(), Box::new(ExifDecoder));
//! let result = scanner.scan(&layout.incoming(), &HashSet::new(), &token, &events);
//! ```

mod walker;

pub use walker::{DirectoryScanner, ScanConfig};

use crate::core::identity::ContentHash;
use crate::error::ScanError;
use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A file found under a scanned root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute location
    pub path: PathBuf,
    /// Location relative to the scanned root
    pub relative: PathBuf,
}

/// A media file with its identity and metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    pub source: SourceFile,
    pub camera: String,
    pub timestamp: NaiveDateTime,
}

impl ScannedFile {
    pub fn path(&self) -> &Path {
        &self.source.path
    }

    pub fn relative(&self) -> &Path {
        &self.source.relative
    }

    /// The `camera/date` directory this file belongs in
    pub fn target_dir(&self) -> String {
        crate::core::layout::target_dir(&self.camera, &self.timestamp)
    }

    /// Original extension, case preserved
    pub fn extension(&self) -> Option<&str> {
        self.source.path.extension().and_then(|e| e.to_str())
    }
}

/// Result of scanning one tree
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Media files grouped by content hash, in scan order within a group
    pub groups: BTreeMap<ContentHash, Vec<ScannedFile>>,
    /// Files that are not recognised media
    pub unclassifiable: Vec<SourceFile>,
    /// Files identified (media and non-media)
    pub total_scanned: usize,
    /// Files that could not be identified, by path
    pub errors: BTreeMap<PathBuf, ScanError>,
    /// Whether the scan stopped early
    pub cancelled: bool,
}

impl ScanResult {
    /// Number of media files across all groups
    pub fn media_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}
