//! Moving files without ever overwriting one.

use crate::error::ClassifyError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// First free variant of `path`: itself, then `stem-1.ext`, `stem-2.ext`, ...
pub fn unique_destination(path: &Path) -> std::io::Result<PathBuf> {
    if !path.try_exists()? {
        return Ok(path.to_path_buf());
    }

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("file");
    let ext = path.extension().and_then(|e| e.to_str());
    let parent = path.parent().unwrap_or(Path::new(""));

    let mut counter = 1;
    loop {
        let name = match ext {
            Some(ext) => format!("{}-{}.{}", stem, counter, ext),
            None => format!("{}-{}", stem, counter),
        };
        let candidate = parent.join(name);
        if !candidate.try_exists()? {
            return Ok(candidate);
        }
        counter += 1;
    }
}

/// Move `from` to `to` (or its first free variant), creating directories
///
/// Returns where the file ended up. On failure the source is left in place.
pub fn move_file(from: &Path, to: &Path) -> Result<PathBuf, ClassifyError> {
    let destination = unique_destination(to).map_err(|source| ClassifyError::Probe {
        path: to.to_path_buf(),
        source,
    })?;
    let move_error = |source| ClassifyError::Move {
        from: from.to_path_buf(),
        to: destination.clone(),
        source,
    };

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(move_error)?;
    }

    fs::rename(from, &destination)
        .or_else(|_| copy_then_remove(from, &destination))
        .map_err(move_error)?;

    debug!("move {} -> {}", from.display(), destination.display());
    Ok(destination)
}

/// Fallback for renames across filesystems
///
/// The source is only deleted once the copy has the same size.
fn copy_then_remove(from: &Path, to: &Path) -> std::io::Result<()> {
    let source_size = fs::metadata(from)?.len();
    fs::copy(from, to)?;

    let dest_size = fs::metadata(to)?.len();
    if dest_size != source_size {
        let _ = fs::remove_file(to);
        return Err(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!(
                "Copy verification failed: source {} bytes, dest {} bytes",
                source_size, dest_size
            ),
        ));
    }

    fs::remove_file(from)
}
