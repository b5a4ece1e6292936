//! Assembly file-version probing.
//!
//! Dynamically discovered catalogs list assemblies without versions; the
//! version is read from the assembly file itself on first lookup. Library
//! files embed a fixed-file-info block whose signature word is followed by a
//! structure version and the two file-version words, so a signature scan is
//! enough to recover `major.minor.build.revision` without a full object-file
//! parser.

use std::fs;
use std::io;
use std::path::Path;

use crate::framework::moniker::FrameworkVersion;

/// Signature word opening a fixed-file-info block.
const FIXED_FILE_INFO_SIGNATURE: u32 = 0xFEEF_04BD;

/// Read the embedded file version of a library, if it carries one.
pub fn read_file_version(path: &Path) -> io::Result<Option<FrameworkVersion>> {
    let bytes = fs::read(path)?;
    Ok(scan_fixed_file_info(&bytes))
}

/// Scan a byte buffer for a fixed-file-info block and decode its version.
fn scan_fixed_file_info(bytes: &[u8]) -> Option<FrameworkVersion> {
    let signature = FIXED_FILE_INFO_SIGNATURE.to_le_bytes();

    // The signature is followed by dwStrucVersion, dwFileVersionMS and
    // dwFileVersionLS, all little-endian words.
    let mut offset = 0;
    while let Some(found) = find_bytes(&bytes[offset..], &signature) {
        let start = offset + found;
        if bytes.len() >= start + 16 {
            let ms = read_u32(&bytes[start + 8..]);
            let ls = read_u32(&bytes[start + 12..]);
            return Some(FrameworkVersion {
                major: ms >> 16,
                minor: ms & 0xFFFF,
                build: Some(ls >> 16),
                revision: Some(ls & 0xFFFF),
            });
        }
        offset = start + 1;
    }

    None
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version_block(major: u16, minor: u16, build: u16, revision: u16) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&FIXED_FILE_INFO_SIGNATURE.to_le_bytes());
        bytes.extend_from_slice(&0x0001_0000u32.to_le_bytes()); // dwStrucVersion
        bytes.extend_from_slice(&(((major as u32) << 16) | minor as u32).to_le_bytes());
        bytes.extend_from_slice(&(((build as u32) << 16) | revision as u32).to_le_bytes());
        bytes
    }

    #[test]
    fn test_scan_finds_version() {
        let mut bytes = vec![0u8; 64];
        bytes.extend(version_block(4, 0, 30319, 17020));
        bytes.extend(vec![0u8; 32]);

        let version = scan_fixed_file_info(&bytes).unwrap();
        assert_eq!(version.major, 4);
        assert_eq!(version.minor, 0);
        assert_eq!(version.build, Some(30319));
        assert_eq!(version.revision, Some(17020));
    }

    #[test]
    fn test_scan_without_block() {
        assert_eq!(scan_fixed_file_info(&[0u8; 128]), None);
    }

    #[test]
    fn test_scan_truncated_block() {
        // Signature present but the version words are cut off.
        let mut bytes = vec![0u8; 16];
        bytes.extend_from_slice(&FIXED_FILE_INFO_SIGNATURE.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 4]);
        assert_eq!(scan_fixed_file_info(&bytes), None);
    }

    #[test]
    fn test_read_file_version() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("System.dll");
        std::fs::write(&path, version_block(4, 5, 0, 0)).unwrap();

        let version = read_file_version(&path).unwrap().unwrap();
        assert_eq!(version.major, 4);
        assert_eq!(version.minor, 5);
    }
}
