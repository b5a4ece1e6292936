//! Filesystem utilities.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Remove a directory tree, tolerating a target that does not exist.
pub fn delete_dir(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)
            .with_context(|| format!("failed to remove directory: {}", path.display()))?;
    }
    Ok(())
}

/// Ensure a directory exists, creating it and its parents if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Read a file to string, with nice error messages.
pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read file: {}", path.display()))
}

/// Write a string to a file, creating parent directories if needed.
pub fn write_text(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write file: {}", path.display()))
}

/// Case-insensitive, separator-normalized key for a relative path.
///
/// Content and exclude lists are matched against copied entries by relative
/// path, ignoring case and platform separator differences.
pub fn relative_key(path: &Path) -> String {
    let mut key = String::new();
    for component in path.components() {
        if !key.is_empty() {
            key.push('/');
        }
        key.push_str(&component.as_os_str().to_string_lossy().to_lowercase());
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_delete_dir_missing_is_ok() {
        let tmp = TempDir::new().unwrap();
        delete_dir(&tmp.path().join("nope")).unwrap();
    }

    #[test]
    fn test_delete_dir_removes_tree() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("a/b");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("f.txt"), "x").unwrap();

        delete_dir(&tmp.path().join("a")).unwrap();
        assert!(!tmp.path().join("a").exists());
    }

    #[test]
    fn test_write_text_creates_parents() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("x/y/out.txt");
        write_text(&path, "hello").unwrap();
        assert_eq!(read_text(&path).unwrap(), "hello");
    }

    #[test]
    fn test_relative_key_normalizes() {
        let path: PathBuf = ["Sub", "Dir", "File.TXT"].iter().collect();
        assert_eq!(relative_key(&path), "sub/dir/file.txt");
    }
}
