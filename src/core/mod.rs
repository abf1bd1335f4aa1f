//! # Core Module
//!
//! The UI-agnostic intake engine.
//!
//! ## Modules
//! - `identity` - Content hashes and byte-exact comparison
//! - `metadata` - Camera label and capture time from EXIF
//! - `scanner` - Walks a tree and groups files by content
//! - `catalog` - Persistent registry of known content
//! - `layout` - Storage root folders and destination naming
//! - `classifier` - Decides and applies what happens to each file
//! - `pipeline` - Orchestrates a full run

pub mod catalog;
pub mod classifier;
pub mod identity;
pub mod layout;
pub mod metadata;
pub mod pipeline;
pub mod scanner;

// Re-export commonly used types
pub use catalog::{Catalog, Record};
pub use classifier::{Disposition, SortedDuplicatePolicy};
pub use identity::ContentHash;
pub use layout::Layout;
pub use metadata::{DecodedTags, MediaInfo, MetadataDecoder};
pub use pipeline::{CancellationToken, Intake, IntakeReport};
pub use scanner::{ScanConfig, ScannedFile};
