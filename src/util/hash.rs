//! Hashing utilities for file digests and package ids.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::core::errors::PackError;

/// Compute SHA256 hash of a byte slice.
pub fn sha256_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// SHA256 digest and size of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDigest {
    pub sha256: String,
    pub size: u64,
}

/// Compute SHA256 hash and size of a file in one pass.
pub fn digest_file(path: &Path) -> Result<FileDigest, PackError> {
    let file = File::open(path).map_err(|e| PackError::fs("open file for hashing", path, e))?;

    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    let mut size = 0u64;

    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .map_err(|e| PackError::fs("read file for hashing", path, e))?;
        if bytes_read == 0 {
            break;
        }
        size += bytes_read as u64;
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(FileDigest {
        sha256: hex::encode(hasher.finalize()),
        size,
    })
}

/// A hasher for building fingerprints from multiple components.
#[derive(Default)]
pub struct Fingerprint {
    hasher: Sha256,
}

impl Fingerprint {
    pub fn new() -> Self {
        Fingerprint {
            hasher: Sha256::new(),
        }
    }

    /// Add a string component to the fingerprint.
    pub fn update_str(&mut self, s: &str) -> &mut Self {
        self.hasher.update(s.as_bytes());
        self.hasher.update(b"\0"); // Separator
        self
    }

    /// Finalize and return the fingerprint as a hex string.
    pub fn finish(&mut self) -> String {
        hex::encode(std::mem::take(&mut self.hasher).finalize())
    }

    /// Finalize and return a short fingerprint (first 16 chars).
    pub fn finish_short(&mut self) -> String {
        self.finish()[..16].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sha256_bytes() {
        assert_eq!(
            sha256_bytes(b"hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_digest_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("qflags.h");
        std::fs::write(&path, "hello").unwrap();

        let digest = digest_file(&path).unwrap();
        assert_eq!(
            digest.sha256,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(digest.size, 5);
    }

    #[test]
    fn test_digest_missing_file_is_filesystem_error() {
        let tmp = TempDir::new().unwrap();
        let err = digest_file(&tmp.path().join("missing.h")).unwrap_err();
        assert!(err.is_filesystem());
    }

    #[test]
    fn test_fingerprint() {
        let fp1 = Fingerprint::new().update_str("hello").update_str("world").finish();
        let fp2 = Fingerprint::new().update_str("hello").update_str("world").finish();
        let fp3 = Fingerprint::new().update_str("helloworld").finish();

        assert_eq!(fp1, fp2);
        assert_ne!(fp1, fp3);
    }
}
