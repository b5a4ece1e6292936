//! Redist-list manifest parsing.
//!
//! A framework catalog directory may carry `RedistList/FrameworkList.xml`
//! enumerating its assemblies: the root element's optional `Name` attribute
//! is the catalog's display name, and each child element carries a required
//! `AssemblyName` attribute plus an optional `Version`.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use crate::framework::moniker::FrameworkVersion;
use crate::util::fs::read_text;

/// Relative location of the manifest inside a catalog directory.
pub const REDIST_LIST_RELATIVE_PATH: [&str; 2] = ["RedistList", "FrameworkList.xml"];

/// One assembly declared by a redist list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedistAssembly {
    /// Assembly simple name.
    pub name: String,

    /// Declared version, when the manifest carries one.
    pub version: Option<FrameworkVersion>,
}

/// A parsed redist list.
#[derive(Debug, Clone, Default)]
pub struct RedistList {
    /// Display name declared by the manifest root.
    pub name: Option<String>,

    /// Declared assemblies.
    pub assemblies: Vec<RedistAssembly>,
}

/// Path of the redist list inside `catalog_dir`.
pub fn redist_list_path(catalog_dir: &Path) -> PathBuf {
    let mut path = catalog_dir.to_path_buf();
    for segment in REDIST_LIST_RELATIVE_PATH {
        path.push(segment);
    }
    path
}

/// Parse a redist list document.
///
/// A child element without an `AssemblyName` attribute is a malformed
/// manifest; the caller treats any error here as an absent catalog.
pub fn parse(text: &str) -> Result<RedistList> {
    let document = roxmltree::Document::parse(text).context("failed to parse redist list")?;
    let root = document.root_element();

    let mut assemblies = Vec::new();
    for element in root.children().filter(|n| n.is_element()) {
        let name = element
            .attribute("AssemblyName")
            .ok_or_else(|| anyhow!("redist list entry missing AssemblyName attribute"))?;

        let version = element
            .attribute("Version")
            .map(|v| {
                v.parse::<FrameworkVersion>()
                    .with_context(|| format!("invalid assembly version `{}`", v))
            })
            .transpose()?;

        assemblies.push(RedistAssembly {
            name: name.to_string(),
            version,
        });
    }

    Ok(RedistList {
        name: root.attribute("Name").map(str::to_string),
        assemblies,
    })
}

/// Load and parse the redist list of a catalog directory, if present.
///
/// Returns `Ok(None)` when no manifest file exists; parse failures are
/// errors.
pub fn load(catalog_dir: &Path) -> Result<Option<(PathBuf, RedistList)>> {
    let path = redist_list_path(catalog_dir);
    if !path.is_file() {
        return Ok(None);
    }

    let text = read_text(&path)?;
    let list = parse(&text)?;
    Ok(Some((path, list)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<FileList Name=".NET Framework 4.5.1">
  <File AssemblyName="System" Version="4.0.0.0" />
  <File AssemblyName="System.Core" Version="4.0.0.0" />
  <File AssemblyName="System.Versionless" />
</FileList>"#;

    #[test]
    fn test_parse_sample() {
        let list = parse(SAMPLE).unwrap();
        assert_eq!(list.name.as_deref(), Some(".NET Framework 4.5.1"));
        assert_eq!(list.assemblies.len(), 3);
        assert_eq!(list.assemblies[0].name, "System");
        assert_eq!(
            list.assemblies[0].version,
            Some("4.0.0.0".parse().unwrap())
        );
        assert_eq!(list.assemblies[2].version, None);
    }

    #[test]
    fn test_parse_without_root_name() {
        let list = parse(r#"<FileList><File AssemblyName="System"/></FileList>"#).unwrap();
        assert_eq!(list.name, None);
        assert_eq!(list.assemblies.len(), 1);
    }

    #[test]
    fn test_parse_missing_assembly_name_is_error() {
        let result = parse(r#"<FileList><File Version="4.0.0.0"/></FileList>"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_invalid_xml_is_error() {
        assert!(parse("<FileList").is_err());
    }

    #[test]
    fn test_load_absent_manifest() {
        let tmp = tempfile::TempDir::new().unwrap();
        assert!(load(tmp.path()).unwrap().is_none());
    }

    #[test]
    fn test_load_present_manifest() {
        let tmp = tempfile::TempDir::new().unwrap();
        let redist_dir = tmp.path().join("RedistList");
        std::fs::create_dir_all(&redist_dir).unwrap();
        std::fs::write(redist_dir.join("FrameworkList.xml"), SAMPLE).unwrap();

        let (path, list) = load(tmp.path()).unwrap().unwrap();
        assert_eq!(path, redist_list_path(tmp.path()));
        assert_eq!(list.assemblies.len(), 3);
    }
}
