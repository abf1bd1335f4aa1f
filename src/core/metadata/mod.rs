//! # Metadata Module
//!
//! Derives a camera label and a capture timestamp for media files.
//!
//! ## Fallbacks
//! Missing metadata is normal, not an error. When the decoder fails or the
//! tags are absent the camera becomes `"Unknown Unknown"` and the timestamp
//! falls back to the file modification time. A decoder that panics on a
//! malformed file is contained here and gets the same fallback, so one bad
//! file never aborts a batch.
//!
//! Files whose extension is not a recognised media type fail with
//! [`MetadataError::NotMedia`], which callers use for routing.

mod exif_decoder;
mod filter;

pub use exif_decoder::ExifDecoder;
pub use filter::{MediaFilter, DEFAULT_MEDIA_EXTENSIONS};

use crate::error::MetadataError;
use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use tracing::{debug, warn};

/// Camera label used when make and model can't be determined
pub const UNKNOWN_CAMERA: &str = "Unknown Unknown";

const UNKNOWN_PART: &str = "Unknown";

/// Raw tags produced by a metadata decoder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedTags {
    /// Camera make (e.g., "Canon")
    pub make: Option<String>,
    /// Camera model (e.g., "EOS R5")
    pub model: Option<String>,
    /// When the photo was taken, in camera wall-clock time
    pub capture_time: Option<NaiveDateTime>,
}

/// Capability that reads camera tags from a file
///
/// Implementations return a structured error for anything they can't read.
/// The extractor still guards against implementations that panic.
pub trait MetadataDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<DecodedTags, String>;
}

/// Metadata the catalog cares about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// "Make Model", or [`UNKNOWN_CAMERA`]
    pub camera: String,
    /// Capture time, or modification time when unavailable
    pub timestamp: NaiveDateTime,
}

/// Extracts [`MediaInfo`] with a defined fallback
pub struct MetadataExtractor {
    filter: MediaFilter,
    decoder: Box<dyn MetadataDecoder>,
}

impl MetadataExtractor {
    pub fn new(filter: MediaFilter, decoder: Box<dyn MetadataDecoder>) -> Self {
        Self { filter, decoder }
    }

    /// Extractor using EXIF and the default media extensions
    pub fn exif() -> Self {
        Self::new(MediaFilter::new(), Box::new(ExifDecoder))
    }

    /// Whether the path is a recognised media type
    pub fn is_media(&self, path: &Path) -> bool {
        self.filter.is_media(path)
    }

    /// Extract camera and timestamp for a media file
    pub fn extract(&self, path: &Path) -> Result<MediaInfo, MetadataError> {
        if !self.filter.is_media(path) {
            return Err(MetadataError::NotMedia {
                path: path.to_path_buf(),
            });
        }

        let modified = modification_time(path)?;

        let decoded = panic::catch_unwind(AssertUnwindSafe(|| self.decoder.decode(path)));
        let tags = match decoded {
            Ok(Ok(tags)) => tags,
            Ok(Err(reason)) => {
                debug!("No metadata in {}: {}", path.display(), reason);
                return Ok(MediaInfo {
                    camera: UNKNOWN_CAMERA.to_string(),
                    timestamp: modified,
                });
            }
            Err(_) => {
                warn!("Metadata decoder crashed on {}, using fallback", path.display());
                return Ok(MediaInfo {
                    camera: UNKNOWN_CAMERA.to_string(),
                    timestamp: modified,
                });
            }
        };

        Ok(MediaInfo {
            camera: camera_label(tags.make.as_deref(), tags.model.as_deref()),
            timestamp: tags.capture_time.unwrap_or(modified),
        })
    }
}

/// Build "Make Model", substituting "Unknown" for missing parts
pub fn camera_label(make: Option<&str>, model: Option<&str>) -> String {
    let part = |value: Option<&str>| {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(UNKNOWN_PART)
            .to_string()
    };
    format!("{} {}", part(make), part(model))
}

fn modification_time(path: &Path) -> Result<NaiveDateTime, MetadataError> {
    let io_error = |source| MetadataError::Io {
        path: path.to_path_buf(),
        source,
    };
    let modified = fs::metadata(path).and_then(|m| m.modified()).map_err(io_error)?;
    Ok(DateTime::<Local>::from(modified).naive_local())
}
