//! Filesystem operations facade.
//!
//! Idempotent copy/delete/extract primitives shared by the emission and
//! post-processing steps. Every operation is destructive-idempotent rather
//! than merge-in-place: deleting tolerates absence, copying assumes the
//! caller already cleared the target when overwrite semantics demand it.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use walkdir::WalkDir;
use zip::ZipArchive;

use crate::util::fs::{delete_dir, ensure_dir};

/// Per-entry copy filter: `(is_dir, relative_path) -> include`.
///
/// Directories are always traversed and materialized regardless of the
/// filter's answer; only file entries are pruned.
pub type CopyFilter<'a> = &'a dyn Fn(bool, &Path) -> bool;

/// The facade handle carried by a pack root.
#[derive(Debug, Clone, Copy, Default)]
pub struct Operations;

impl Operations {
    /// Remove a directory tree, tolerating a target that does not exist.
    pub fn delete(&self, path: &Path) -> Result<()> {
        delete_dir(path)
    }

    /// Recursively copy `source` to `target`, consulting `filter` per entry.
    pub fn copy(&self, source: &Path, target: &Path, filter: CopyFilter<'_>) -> Result<()> {
        for entry in WalkDir::new(source) {
            let entry = entry
                .with_context(|| format!("failed to walk directory: {}", source.display()))?;
            let relative = entry
                .path()
                .strip_prefix(source)
                .expect("walked entry is under its root");

            if relative.as_os_str().is_empty() {
                ensure_dir(target)?;
                continue;
            }

            let destination = target.join(relative);
            let included = filter(entry.file_type().is_dir(), relative);

            if entry.file_type().is_dir() {
                // Directories are always traversed; the filter only prunes
                // files.
                ensure_dir(&destination)?;
            } else if included {
                if let Some(parent) = destination.parent() {
                    ensure_dir(parent)?;
                }
                fs::copy(entry.path(), &destination).with_context(|| {
                    format!(
                        "failed to copy {} to {}",
                        entry.path().display(),
                        destination.display()
                    )
                })?;
            }
        }

        Ok(())
    }

    /// Extract a package archive into `target`.
    ///
    /// Entries whose names escape the target directory are skipped.
    pub fn extract_package(&self, archive_path: &Path, target: &Path) -> Result<()> {
        let file = File::open(archive_path)
            .with_context(|| format!("failed to open package: {}", archive_path.display()))?;
        let mut archive = ZipArchive::new(file)
            .with_context(|| format!("failed to read package: {}", archive_path.display()))?;

        ensure_dir(target)?;

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            let relative = match entry.enclosed_name() {
                Some(path) => path.to_owned(),
                None => continue,
            };

            if entry.is_dir() {
                ensure_dir(&target.join(&relative))?;
                continue;
            }

            let destination = target.join(&relative);
            if let Some(parent) = destination.parent() {
                ensure_dir(parent)?;
            }

            let mut output = File::create(&destination).with_context(|| {
                format!("failed to create extracted file: {}", destination.display())
            })?;
            io::copy(&mut entry, &mut output)?;

            #[cfg(unix)]
            if let Some(mode) = entry.unix_mode() {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&destination, fs::Permissions::from_mode(mode))?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        for (name, contents) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(contents).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn test_copy_filters_files_but_traverses_directories() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("src");
        fs::create_dir_all(source.join("sub")).unwrap();
        fs::write(source.join("keep.txt"), "keep").unwrap();
        fs::write(source.join("drop.txt"), "drop").unwrap();
        fs::write(source.join("sub/keep.txt"), "nested").unwrap();

        let target = tmp.path().join("dst");
        let ops = Operations;
        ops.copy(&source, &target, &|is_dir, rel| {
            is_dir || rel.file_name().map_or(false, |n| n == "keep.txt")
        })
        .unwrap();

        assert!(target.join("keep.txt").exists());
        assert!(target.join("sub/keep.txt").exists());
        assert!(!target.join("drop.txt").exists());
    }

    #[test]
    fn test_copy_materializes_directories_even_when_filter_rejects() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("src");
        fs::create_dir_all(source.join("empty")).unwrap();

        let target = tmp.path().join("dst");
        let ops = Operations;
        ops.copy(&source, &target, &|_, _| false).unwrap();

        assert!(target.join("empty").is_dir());
    }

    #[test]
    fn test_delete_tolerates_missing_target() {
        let tmp = TempDir::new().unwrap();
        Operations.delete(&tmp.path().join("missing")).unwrap();
    }

    #[test]
    fn test_extract_package() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("pkg.nupkg");
        write_zip(
            &archive,
            &[
                ("lib/net45/app.dll", b"assembly"),
                ("tools/loader.dll", b"loader"),
            ],
        );

        let target = tmp.path().join("out");
        Operations.extract_package(&archive, &target).unwrap();

        assert_eq!(
            fs::read(target.join("lib/net45/app.dll")).unwrap(),
            b"assembly"
        );
        assert_eq!(fs::read(target.join("tools/loader.dll")).unwrap(), b"loader");
    }
}
