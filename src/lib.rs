//! # Photo Intake
//!
//! Ingests a folder of newly-arrived photos and videos into a persistent,
//! content-addressed catalog.
//!
//! ## Core Philosophy
//! - **Never lose a file** - every incoming file ends up in exactly one place
//! - **Hashes are candidates** - identity is always confirmed byte-for-byte
//! - **Humans have the last word** - conflicts and collisions are set aside for review
//!
//! ## Architecture
//! The library is split into a core engine (UI-agnostic) and presentation layers:
//! - `core` - Catalog, identity, metadata, scanning and classification
//! - `events` - Event-driven progress reporting
//! - `error` - Error taxonomy
//! - `cli` - Command-line interface (binary only)

pub mod core;
pub mod error;
pub mod events;

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

// Re-export commonly used types at the crate root
pub use error::{IntakeError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point. With a log file the
/// console stays free for progress output, which is how the tool is normally run.
pub fn init_tracing(log_file: Option<&Path>) -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let subscriber = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .finish();
            tracing::subscriber::set_global_default(subscriber)
        }
        None => {
            let subscriber = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
        }
    };

    installed.map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
}
