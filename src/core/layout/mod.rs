//! # Layout Module
//!
//! The storage root's directory contract and destination naming.
//!
//! ```text
//! Incoming/*      -(new)->            Storage/camera/date/hh-mm-ss.ext
//!                 -(dir collision)->  Duplicates/*
//!                 -(hash conflict)->  Conflicts/*
//!                 -(duplicate)->      Trashbin/*
//!                 -(not media)->      NoImages/*
//! Storage/*       -(manual sort)->    Sorted/*
//! ```
//!
//! Only genuine new registrations get the computed camera/date path; every
//! other deposit keeps the file's path relative to `Incoming/`.

use crate::error::IntakeError;
use chrono::{Datelike, NaiveDateTime, Timelike};
use std::fs;
use std::path::{Path, PathBuf};

pub const INCOMING_FOLDER: &str = "Incoming";
pub const STORAGE_FOLDER: &str = "Storage";
pub const SORTED_FOLDER: &str = "Sorted";
pub const CONFLICT_FOLDER: &str = "Conflicts";
pub const DUPLICATE_FOLDER: &str = "Duplicates";
pub const TRASHBIN_FOLDER: &str = "Trashbin";
pub const NO_IMAGES_FOLDER: &str = "NoImages";

/// Catalog document, stored at the root
pub const CATALOG_FILE: &str = ".library.json";

/// Resolved locations under a storage root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    /// Resolve a storage root; it must exist
    pub fn new(root: &Path) -> Result<Self, IntakeError> {
        let root = fs::canonicalize(root).map_err(|e| {
            IntakeError::Config(format!("storage root {}: {}", root.display(), e))
        })?;
        if !root.is_dir() {
            return Err(IntakeError::Config(format!(
                "storage root {} is not a directory",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn incoming(&self) -> PathBuf {
        self.root.join(INCOMING_FOLDER)
    }

    pub fn storage(&self) -> PathBuf {
        self.root.join(STORAGE_FOLDER)
    }

    pub fn sorted(&self) -> PathBuf {
        self.root.join(SORTED_FOLDER)
    }

    pub fn conflicts(&self) -> PathBuf {
        self.root.join(CONFLICT_FOLDER)
    }

    pub fn duplicates(&self) -> PathBuf {
        self.root.join(DUPLICATE_FOLDER)
    }

    pub fn trashbin(&self) -> PathBuf {
        self.root.join(TRASHBIN_FOLDER)
    }

    pub fn no_images(&self) -> PathBuf {
        self.root.join(NO_IMAGES_FOLDER)
    }

    pub fn catalog_file(&self) -> PathBuf {
        self.root.join(CATALOG_FILE)
    }
}

/// Target directory for a camera and capture time: `camera/YYYY-MM-DD`
///
/// Path separators inside the camera label are replaced so the label
/// always stays a single directory level.
pub fn target_dir(camera: &str, timestamp: &NaiveDateTime) -> String {
    let camera: String = camera
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    format!(
        "{}/{:04}-{:02}-{:02}",
        camera,
        timestamp.year(),
        timestamp.month(),
        timestamp.day()
    )
}

/// Target file name: `HH-MM-SS[-dup].ext`, extension kept as-is
pub fn target_file_name(timestamp: &NaiveDateTime, extension: Option<&str>, dup: u32) -> String {
    let mut name = format!(
        "{:02}-{:02}-{:02}",
        timestamp.hour(),
        timestamp.minute(),
        timestamp.second()
    );
    if dup > 0 {
        name.push_str(&format!("-{}", dup));
    }
    if let Some(ext) = extension.filter(|e| !e.is_empty()) {
        name.push('.');
        name.push_str(ext);
    }
    name
}
