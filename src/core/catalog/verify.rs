//! Consistency check between the catalog and the files it points at.

use super::Catalog;
use crate::core::identity::{files_equal, ContentHash};
use serde::Serialize;
use std::path::PathBuf;

/// Something wrong with one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogIssue {
    pub hash: ContentHash,
    pub kind: IssueKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum IssueKind {
    /// A listed path no longer exists
    Missing { path: PathBuf },
    /// A listed copy is not byte-equal to the canonical path
    Diverged { canonical: PathBuf, path: PathBuf },
    /// A listed path could not be read
    Unreadable { path: PathBuf, reason: String },
}

/// Check that every record's paths exist and hold identical bytes
///
/// Read-only: nothing in the catalog or on disk is changed.
pub fn verify_catalog(catalog: &Catalog) -> Vec<CatalogIssue> {
    let mut issues = Vec::new();

    for (hash, record) in catalog.records() {
        let mut push = |kind| {
            issues.push(CatalogIssue {
                hash: hash.clone(),
                kind,
            })
        };

        let missing: Vec<&PathBuf> = record.paths().iter().filter(|p| !p.exists()).collect();
        for path in &missing {
            push(IssueKind::Missing {
                path: path.to_path_buf(),
            });
        }

        let canonical = record.canonical_path();
        if !missing.is_empty() && missing[0] == canonical {
            continue;
        }

        for path in record.paths().iter().skip(1) {
            if missing.contains(&path) {
                continue;
            }
            match files_equal(canonical, path) {
                Ok(true) => {}
                Ok(false) => push(IssueKind::Diverged {
                    canonical: canonical.to_path_buf(),
                    path: path.clone(),
                }),
                Err(e) => push(IssueKind::Unreadable {
                    path: path.clone(),
                    reason: e.to_string(),
                }),
            }
        }
    }

    issues
}
