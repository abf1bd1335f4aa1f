//! # Pipeline Module
//!
//! Orchestrates a full intake run.
//!
//! ## Run Stages
//! 1. **Load** - Read the catalog (a corrupt catalog stops the run here)
//! 2. **Scan sorted** - Identify curated files not yet known
//! 3. **Reconcile** - Register or merge them, seeding the directory index
//! 4. **Scan incoming** - Identify and group everything in `Incoming/`
//! 5. **Classify** - Plan and apply each group
//! 6. **Save** - Persist the catalog, also after cancellation
//!
//! Work is sequential on a single thread; the catalog is owned by the run.

mod cancel;
mod executor;

pub use cancel::CancellationToken;
pub use executor::{Intake, IntakeBuilder, IntakeConfig, IntakeReport, ReportedError};
