//! # Error Module
//!
//! Error types for the photo intake engine.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Outcomes are not errors** - hash conflicts, duplicates and directory
//!   collisions are dispositions, handled by moving files, never by failing
//! - **Isolate per-file failures** - a failing file is reported and left in place

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Content identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Classification error: {0}")]
    Classify(#[from] ClassifyError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors while hashing or byte-comparing files
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors while deriving camera and capture time
#[derive(Error, Debug)]
pub enum MetadataError {
    /// The extension is not a recognised media type. Callers route the file
    /// to the unclassifiable bucket instead of hashing it.
    #[error("Not a media file: {path}")]
    NotMedia { path: PathBuf },

    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MetadataError {
    /// Whether this is the routing signal rather than a real failure
    pub fn is_not_media(&self) -> bool {
        matches!(self, MetadataError::NotMedia { .. })
    }
}

/// Errors that occur while scanning a directory tree
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Failed to read directory entry {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("exif: {0}")]
    Metadata(#[from] MetadataError),

    #[error("hash: {0}")]
    Identity(#[from] IdentityError),
}

/// Errors with the persistent catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog at {path} is corrupt ({reason}). Fix or remove the file and try again.")]
    Corrupt { path: PathBuf, reason: String },

    #[error("Failed to access catalog at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize catalog: {0}")]
    Serialize(String),
}

/// Per-file failures while classifying incoming files
#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("Failed to move {from} to {to}: {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to probe destination {path}: {source}")]
    Probe {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to compare: {0}")]
    Compare(#[from] IdentityError),
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, IntakeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_media_is_a_routing_signal() {
        let error = MetadataError::NotMedia {
            path: PathBuf::from("/incoming/notes.txt"),
        };
        assert!(error.is_not_media());
        assert!(error.to_string().contains("/incoming/notes.txt"));
    }

    #[test]
    fn io_metadata_error_is_not_routing_signal() {
        let error = MetadataError::Io {
            path: PathBuf::from("/incoming/a.jpg"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(!error.is_not_media());
    }

    #[test]
    fn corrupt_catalog_suggests_recovery() {
        let error = CatalogError::Corrupt {
            path: PathBuf::from("/photos/.library.json"),
            reason: "expected value at line 1".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("/photos/.library.json"));
        assert!(message.contains("Fix or remove"));
    }

    #[test]
    fn move_error_names_both_paths() {
        let error = ClassifyError::Move {
            from: PathBuf::from("/photos/Incoming/a.jpg"),
            to: PathBuf::from("/photos/Trashbin/a.jpg"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let message = error.to_string();
        assert!(message.contains("Incoming/a.jpg"));
        assert!(message.contains("Trashbin/a.jpg"));
    }
}
