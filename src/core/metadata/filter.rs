//! Media type recognition by file extension.

use std::collections::HashSet;
use std::path::Path;

/// Extensions recognised as media when no override is configured
pub const DEFAULT_MEDIA_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "heic", "heif", "webp", "tif", "tiff", "mp4", "mov",
];

/// Decides whether a file is a media file the catalog should track
#[derive(Debug, Clone)]
pub struct MediaFilter {
    /// Lowercase extensions, without the leading dot
    extensions: HashSet<String>,
}

impl MediaFilter {
    /// Create a filter with the default extensions
    pub fn new() -> Self {
        Self {
            extensions: DEFAULT_MEDIA_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
        }
    }

    /// Override the list of extensions to accept
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    /// Check if a path has a recognised media extension
    pub fn is_media(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.contains(&e.to_lowercase()))
            .unwrap_or(false)
    }
}

impl Default for MediaFilter {
    fn default() -> Self {
        Self::new()
    }
}
