//! Directory walking implementation using walkdir.

use super::{ScanResult, ScannedFile, SourceFile};
use crate::core::identity::{hash_file, ContentHash};
use crate::core::metadata::{MediaFilter, MetadataDecoder, MetadataExtractor};
use crate::core::pipeline::CancellationToken;
use crate::error::ScanError;
use crate::events::{Event, EventSender, ScanEvent, ScanProgress};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, error};
use walkdir::WalkDir;

/// Configuration for the directory scanner
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Custom media extensions (None = use defaults)
    pub extensions: Option<Vec<String>>,
}

/// Scanner that lists a tree first, then identifies file by file
pub struct DirectoryScanner {
    config: ScanConfig,
    extractor: MetadataExtractor,
}

enum Identified {
    Media(ScannedFile, ContentHash),
    NotMedia(SourceFile),
}

impl DirectoryScanner {
    /// Create a new scanner using the given metadata decoder
    pub fn new(config: ScanConfig, decoder: Box<dyn MetadataDecoder>) -> Self {
        let mut filter = MediaFilter::new();
        if let Some(ref extensions) = config.extensions {
            filter = filter.with_extensions(extensions.clone());
        }

        Self {
            config,
            extractor: MetadataExtractor::new(filter, decoder),
        }
    }

    /// Scan `root`, skipping any file whose absolute path is in `visited`
    ///
    /// Cancellation is checked before every directory entry and every file;
    /// a cancelled scan returns what it has with `cancelled` set.
    pub fn scan(
        &self,
        root: &Path,
        visited: &HashSet<PathBuf>,
        cancel: &CancellationToken,
        events: &EventSender,
    ) -> ScanResult {
        let mut result = ScanResult::default();

        if !root.is_dir() {
            let error = ScanError::DirectoryNotFound {
                path: root.to_path_buf(),
            };
            events.send(Event::Scan(ScanEvent::Error {
                path: root.to_path_buf(),
                message: error.to_string(),
            }));
            result.errors.insert(root.to_path_buf(), error);
            return result;
        }

        let files = match self.list_files(root, visited, cancel, &mut result) {
            Some(files) => files,
            None => {
                result.cancelled = true;
                return result;
            }
        };

        let total = files.len();
        events.send(Event::Scan(ScanEvent::Started {
            root: root.to_path_buf(),
            total_files: total,
        }));

        for path in files {
            if cancel.is_cancelled() {
                result.cancelled = true;
                break;
            }

            let relative = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
            let source = SourceFile {
                path: path.clone(),
                relative,
            };

            match self.identify(source) {
                Ok(Identified::Media(file, hash)) => {
                    result.groups.entry(hash).or_default().push(file);
                }
                Ok(Identified::NotMedia(source)) => {
                    result.unclassifiable.push(source);
                }
                Err(e) => {
                    error!("Error reading {}: {}", path.display(), e);
                    events.send(Event::Scan(ScanEvent::Error {
                        path: path.clone(),
                        message: e.to_string(),
                    }));
                    result.errors.insert(path, e);
                    continue;
                }
            }

            result.total_scanned += 1;
            events.send(Event::Scan(ScanEvent::Progress(ScanProgress {
                scanned: result.total_scanned,
                total,
                current_path: path,
            })));
        }

        events.send(Event::Scan(ScanEvent::Completed {
            root: root.to_path_buf(),
            total_scanned: result.total_scanned,
            cancelled: result.cancelled,
        }));

        result
    }

    /// List candidate files; `None` when cancelled while listing
    fn list_files(
        &self,
        root: &Path,
        visited: &HashSet<PathBuf>,
        cancel: &CancellationToken,
        result: &mut ScanResult,
    ) -> Option<Vec<PathBuf>> {
        let mut files = Vec::new();
        let walker = WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();

        for entry_result in walker {
            if cancel.is_cancelled() {
                return None;
            }

            match entry_result {
                Ok(entry) => {
                    if entry.file_type().is_dir() {
                        continue;
                    }
                    if visited.contains(entry.path()) {
                        debug!("Already known: {}", entry.path().display());
                        continue;
                    }
                    files.push(entry.into_path());
                }
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                    error!("Error listing {}: {}", path.display(), e);
                    result.errors.insert(
                        path.clone(),
                        ScanError::ReadDirectory {
                            path,
                            source: std::io::Error::from(e),
                        },
                    );
                }
            }
        }

        Some(files)
    }

    fn identify(&self, source: SourceFile) -> Result<Identified, ScanError> {
        let info = match self.extractor.extract(&source.path) {
            Ok(info) => info,
            Err(e) if e.is_not_media() => return Ok(Identified::NotMedia(source)),
            Err(e) => return Err(e.into()),
        };

        let hash = hash_file(&source.path)?;

        Ok(Identified::Media(
            ScannedFile {
                source,
                camera: info.camera,
                timestamp: info.timestamp,
            },
            hash,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metadata::{DecodedTags, UNKNOWN_CAMERA};
    use crate::events::null_sender;
    use std::fs;
    use tempfile::TempDir;

    struct NoTags;

    impl MetadataDecoder for NoTags {
        fn decode(&self, _path: &Path) -> Result<DecodedTags, String> {
            Err("no metadata".to_string())
        }
    }

    fn scanner() -> DirectoryScanner {
        DirectoryScanner::new(ScanConfig::default(), Box::new(NoTags))
    }

    fn write(root: &Path, relative: &str, content: &[u8]) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn scan_empty_directory_returns_empty_result() {
        let dir = TempDir::new().unwrap();

        let result = scanner().scan(
            dir.path(),
            &HashSet::new(),
            &CancellationToken::new(),
            &null_sender(),
        );

        assert!(result.groups.is_empty());
        assert!(result.unclassifiable.is_empty());
        assert!(result.errors.is_empty());
        assert_eq!(result.total_scanned, 0);
    }

    #[test]
    fn identical_files_share_a_group() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.jpg", b"same bytes");
        write(dir.path(), "nested/b.jpg", b"same bytes");
        write(dir.path(), "c.jpg", b"other bytes");

        let result = scanner().scan(
            dir.path(),
            &HashSet::new(),
            &CancellationToken::new(),
            &null_sender(),
        );

        assert_eq!(result.groups.len(), 2);
        assert_eq!(result.total_scanned, 3);
        let pair = result.groups.values().find(|g| g.len() == 2).unwrap();
        assert_eq!(pair[0].relative(), Path::new("a.jpg"));
        assert_eq!(pair[1].relative(), Path::new("nested/b.jpg"));
        assert_eq!(pair[0].camera, UNKNOWN_CAMERA);
    }

    #[test]
    fn non_media_files_are_listed_separately() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "photo.jpg", b"jpeg");
        write(dir.path(), "docs/notes.txt", b"text");

        let result = scanner().scan(
            dir.path(),
            &HashSet::new(),
            &CancellationToken::new(),
            &null_sender(),
        );

        assert_eq!(result.media_count(), 1);
        assert_eq!(result.unclassifiable.len(), 1);
        assert_eq!(
            result.unclassifiable[0].relative,
            PathBuf::from("docs/notes.txt")
        );
        assert_eq!(result.total_scanned, 2);
    }

    #[test]
    fn visited_paths_are_skipped() {
        let dir = TempDir::new().unwrap();
        let known = write(dir.path(), "known.jpg", b"known");
        write(dir.path(), "fresh.jpg", b"fresh");

        let visited: HashSet<PathBuf> = [known].into_iter().collect();
        let result = scanner().scan(
            dir.path(),
            &visited,
            &CancellationToken::new(),
            &null_sender(),
        );

        assert_eq!(result.total_scanned, 1);
        let file = &result.groups.values().next().unwrap()[0];
        assert_eq!(file.relative(), Path::new("fresh.jpg"));
    }

    #[test]
    fn cancelled_scan_returns_early_without_errors() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.jpg", b"a");

        let token = CancellationToken::new();
        token.cancel();
        let result = scanner().scan(dir.path(), &HashSet::new(), &token, &null_sender());

        assert!(result.cancelled);
        assert!(result.groups.is_empty());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn missing_root_is_reported() {
        let result = scanner().scan(
            Path::new("/nonexistent/path/12345"),
            &HashSet::new(),
            &CancellationToken::new(),
            &null_sender(),
        );

        assert_eq!(result.errors.len(), 1);
        assert!(matches!(
            result.errors.values().next(),
            Some(ScanError::DirectoryNotFound { .. })
        ));
    }

    #[test]
    fn custom_extensions_change_what_is_media() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "raw.cr2", b"raw");
        write(dir.path(), "photo.jpg", b"jpeg");

        let config = ScanConfig {
            extensions: Some(vec!["cr2".to_string()]),
            ..Default::default()
        };
        let result = DirectoryScanner::new(config, Box::new(NoTags)).scan(
            dir.path(),
            &HashSet::new(),
            &CancellationToken::new(),
            &null_sender(),
        );

        assert_eq!(result.media_count(), 1);
        assert_eq!(result.unclassifiable.len(), 1);
    }
}
