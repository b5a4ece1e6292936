//! Hashing utilities for package integrity stamping.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use sha2::{Digest, Sha512};

/// Compute the SHA-512 digest of a file, base64-encoded.
///
/// This is the content written to `.sha512` sidecar files beside copied
/// package archives; consumers verify the copied artifact against it.
pub fn sha512_base64_file(path: &Path) -> Result<String> {
    let file = File::open(path)
        .with_context(|| format!("failed to open file for hashing: {}", path.display()))?;

    let mut reader = BufReader::new(file);
    let mut hasher = Sha512::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(STANDARD.encode(hasher.finalize()))
}

/// Compute the SHA-512 digest of a byte slice, base64-encoded.
pub fn sha512_base64_bytes(data: &[u8]) -> String {
    let mut hasher = Sha512::new();
    hasher.update(data);
    STANDARD.encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_digest_matches_in_memory_digest() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("pkg.bin");
        std::fs::write(&path, b"package bytes").unwrap();

        assert_eq!(
            sha512_base64_file(&path).unwrap(),
            sha512_base64_bytes(b"package bytes")
        );
    }

    #[test]
    fn test_digest_decodes_to_512_bits() {
        let digest = sha512_base64_bytes(b"hello");
        let raw = STANDARD.decode(digest).unwrap();
        assert_eq!(raw.len(), 64);
    }

    #[test]
    fn test_distinct_content_distinct_digest() {
        assert_ne!(sha512_base64_bytes(b"a"), sha512_base64_bytes(b"b"));
    }
}
