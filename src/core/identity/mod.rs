//! # Identity Module
//!
//! Content identity for media files.
//!
//! A SHA-256 digest is only ever a *candidate* for equality. Two files are
//! the same content when [`files_equal`] says so, never because their
//! hashes match.

use crate::error::IdentityError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

/// Files are streamed in chunks of this size
pub const CHUNK_SIZE: usize = 100 * 1024;

/// Hex-encoded SHA-256 digest of a file's bytes
///
/// Never empty: non-media files have no `ContentHash` at all rather than a
/// sentinel value, so they can't collide with a real digest.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Build a hash from raw digest bytes
    pub fn from_digest(digest: &[u8]) -> Self {
        Self(hex::encode(digest))
    }

    /// Parse a stored hash, rejecting empty keys
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First characters of the hash, for log lines
    pub fn short(&self) -> &str {
        let end = self.0.len().min(12);
        &self.0[..end]
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stream a file through SHA-256
pub fn hash_file(path: &Path) -> Result<ContentHash, IdentityError> {
    let mut file = File::open(path).map_err(|source| io_error(path, source))?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        let count = file
            .read(&mut buffer)
            .map_err(|source| io_error(path, source))?;
        if count == 0 {
            break;
        }
        hasher.update(&buffer[..count]);
    }

    Ok(ContentHash::from_digest(&hasher.finalize()))
}

/// Byte-exact comparison of two files
///
/// Sizes are compared first, so files of different length are rejected
/// without opening either of them.
pub fn files_equal(first: &Path, second: &Path) -> Result<bool, IdentityError> {
    let first_len = fs::metadata(first)
        .map_err(|source| io_error(first, source))?
        .len();
    let second_len = fs::metadata(second)
        .map_err(|source| io_error(second, source))?
        .len();
    if first_len != second_len {
        return Ok(false);
    }

    let mut first_file = File::open(first).map_err(|source| io_error(first, source))?;
    let mut second_file = File::open(second).map_err(|source| io_error(second, source))?;

    let mut first_buf = vec![0u8; CHUNK_SIZE];
    let mut second_buf = vec![0u8; CHUNK_SIZE];

    loop {
        let first_count =
            read_chunk(&mut first_file, &mut first_buf).map_err(|source| io_error(first, source))?;
        let second_count = read_chunk(&mut second_file, &mut second_buf)
            .map_err(|source| io_error(second, source))?;

        if first_count != second_count {
            return Ok(false);
        }
        if first_count == 0 {
            return Ok(true);
        }
        if first_buf[..first_count] != second_buf[..second_count] {
            return Ok(false);
        }
    }
}

/// Check that every file is byte-equal to the first one
///
/// Empty and single-file groups are trivially equal.
pub fn group_equal<P: AsRef<Path>>(paths: &[P]) -> Result<bool, IdentityError> {
    let Some((first, rest)) = paths.split_first() else {
        return Ok(true);
    };

    for other in rest {
        if !files_equal(first.as_ref(), other.as_ref())? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Fill `buffer` as far as the reader allows; returns bytes read (0 at EOF)
fn read_chunk(reader: &mut impl Read, buffer: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn io_error(path: &Path, source: std::io::Error) -> IdentityError {
    IdentityError::Io {
        path: path.to_path_buf(),
        source,
    }
}
