//! Loading and saving the catalog document.

use super::{Catalog, Record};
use crate::core::identity::ContentHash;
use crate::error::CatalogError;
use chrono::NaiveDateTime;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

/// Record as found on disk
#[derive(Debug, Deserialize)]
struct StoredRecord {
    paths: Vec<PathBuf>,
    camera: String,
    timestamp: NaiveDateTime,
    #[serde(default)]
    sorted: bool,
}

impl Catalog {
    /// Load a catalog document
    ///
    /// A missing file is an empty catalog. A malformed one is an error and
    /// nothing of it is kept.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let contents = match fs::read(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No catalog at {}, starting empty", path.display());
                return Ok(Self::new());
            }
            Err(source) => {
                return Err(CatalogError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let corrupt = |reason: String| CatalogError::Corrupt {
            path: path.to_path_buf(),
            reason,
        };

        let stored: BTreeMap<String, StoredRecord> =
            serde_json::from_slice(&contents).map_err(|e| corrupt(e.to_string()))?;

        let mut records = BTreeMap::new();
        for (key, stored) in stored {
            let hash = ContentHash::parse(&key)
                .ok_or_else(|| corrupt("record with an empty hash".to_string()))?;

            let paths: Vec<PathBuf> = stored
                .paths
                .into_iter()
                .filter(|p| !p.as_os_str().is_empty())
                .collect();

            let record = Record::from_paths(paths, stored.camera, stored.timestamp, stored.sorted)
                .ok_or_else(|| corrupt(format!("record {} has no paths", hash)))?;
            records.insert(hash, record);
        }

        let catalog = Self::from_records(records);
        info!("Loaded {} entries from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// Persist the records atomically
    ///
    /// The document is written to a temporary file beside the target and
    /// renamed over it, so a crash leaves either the old or the new catalog.
    pub fn save(&self, path: &Path) -> Result<(), CatalogError> {
        let io_error = |source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        };

        let contents = serde_json::to_vec_pretty(self.records_map())
            .map_err(|e| CatalogError::Serialize(e.to_string()))?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut file = NamedTempFile::new_in(dir).map_err(io_error)?;
        file.write_all(&contents).map_err(io_error)?;
        file.write_all(b"\n").map_err(io_error)?;
        file.as_file().sync_all().map_err(io_error)?;
        file.persist(path).map_err(|e| io_error(e.error))?;

        info!("Saved {} entries to {}", self.len(), path.display());
        Ok(())
    }
}
