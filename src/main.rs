//! # photo-intake CLI
//!
//! Command-line interface for the photo intake engine.
//!
//! ## Usage
//! ```bash
//! photo-intake run --storage ~/Photos
//! photo-intake verify --storage ~/Photos --output json
//! ```

mod cli;

use photo_intake::Result;

fn main() -> Result<()> {
    cli::run()
}
