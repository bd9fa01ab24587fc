//! Content digests used to detect duplicate files.

use crate::organizer::{OrganizeError, OrganizeResult};
use sha2::{Digest as _, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Size of each read while hashing.
pub const CHUNK_SIZE: usize = 8 * 1024;

/// SHA-256 digest of a file's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; 32]);

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Streams the file through SHA-256 in [`CHUNK_SIZE`] chunks.
///
/// Fails with [`OrganizeError::Hash`] if the file cannot be opened or
/// disappears mid-read. Callers must never treat a failed hash as a match.
pub fn hash_file(path: &Path) -> OrganizeResult<Digest> {
    let hash_err = |source| OrganizeError::Hash {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(hash_err)?;
    let mut reader = BufReader::with_capacity(CHUNK_SIZE, file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; CHUNK_SIZE];

    loop {
        let bytes_read = reader.read(&mut buffer).map_err(hash_err)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(Digest(hasher.finalize().into()))
}
