//! Project model and resolution.
//!
//! A project is a source directory with a `project.json` at its root
//! declaring a version plus the content and exclude file lists the packer
//! consults when exporting the tree.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use semver::Version;
use serde::Deserialize;

use crate::util::fs::read_text;

/// Name of the project file at a project directory's root.
pub const PROJECT_FILE_NAME: &str = "project.json";

/// Schema of `project.json`.
#[derive(Debug, Default, Deserialize)]
struct ProjectFile {
    /// Declared version; defaults to 1.0.0 when absent.
    #[serde(default)]
    version: Option<String>,

    /// Relative paths of content files copied into the application folder.
    #[serde(default)]
    content: Vec<String>,

    /// Relative paths excluded from source export.
    #[serde(default)]
    exclude: Vec<String>,
}

/// A resolved source project.
#[derive(Debug, Clone)]
pub struct Project {
    /// Project name (the directory name).
    pub name: String,

    /// Declared version.
    pub version: Version,

    /// Absolute path of the project directory.
    pub project_dir: PathBuf,

    /// Relative paths of declared content files.
    pub content_files: Vec<String>,

    /// Relative paths excluded from source export.
    pub exclude_files: Vec<String>,
}

impl Project {
    /// Load a project from its directory.
    ///
    /// The project name is the directory name; the rest comes from
    /// `project.json`.
    pub fn load(project_dir: &Path) -> Result<Project> {
        let name = project_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("invalid project directory: {}", project_dir.display()))?;

        let project_file = project_dir.join(PROJECT_FILE_NAME);
        let text = read_text(&project_file)?;
        let file: ProjectFile = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse {}", project_file.display()))?;

        let version = match file.version {
            Some(v) => v
                .parse()
                .with_context(|| format!("invalid version in {}", project_file.display()))?,
            None => Version::new(1, 0, 0),
        };

        Ok(Project {
            name,
            version,
            project_dir: project_dir.to_path_buf(),
            content_files: file.content,
            exclude_files: file.exclude,
        })
    }
}

/// Resolves a project by its declared name.
///
/// Implemented by the surrounding toolchain; the packer only consumes it.
pub trait ProjectResolver {
    /// Resolve the named project, or `None` if no such project is known.
    fn resolve_project(&self, name: &str) -> Option<Project>;
}

/// A [`ProjectResolver`] that probes registered search paths for
/// `{search_path}/{name}/project.json`.
#[derive(Debug, Clone, Default)]
pub struct FsProjectResolver {
    search_paths: Vec<PathBuf>,
}

impl FsProjectResolver {
    /// Create a resolver over the given search paths.
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        FsProjectResolver { search_paths }
    }

    /// Add a search path.
    pub fn add_search_path(&mut self, path: PathBuf) {
        self.search_paths.push(path);
    }
}

impl ProjectResolver for FsProjectResolver {
    fn resolve_project(&self, name: &str) -> Option<Project> {
        for search_path in &self.search_paths {
            let candidate = search_path.join(name);
            if !candidate.join(PROJECT_FILE_NAME).is_file() {
                continue;
            }

            match Project::load(&candidate) {
                Ok(project) => return Some(project),
                Err(e) => {
                    tracing::warn!(
                        "skipping unreadable project at {}: {:#}",
                        candidate.display(),
                        e
                    );
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_project(dir: &Path, name: &str, json: &str) -> PathBuf {
        let project_dir = dir.join(name);
        fs::create_dir_all(&project_dir).unwrap();
        fs::write(project_dir.join(PROJECT_FILE_NAME), json).unwrap();
        project_dir
    }

    #[test]
    fn test_load_full_project_file() {
        let tmp = TempDir::new().unwrap();
        let dir = write_project(
            tmp.path(),
            "webapp",
            r#"{
                "version": "2.1.0",
                "content": ["index.html", "js/app.js"],
                "exclude": ["notes.txt"]
            }"#,
        );

        let project = Project::load(&dir).unwrap();
        assert_eq!(project.name, "webapp");
        assert_eq!(project.version, Version::new(2, 1, 0));
        assert_eq!(project.content_files, vec!["index.html", "js/app.js"]);
        assert_eq!(project.exclude_files, vec!["notes.txt"]);
    }

    #[test]
    fn test_load_defaults_version() {
        let tmp = TempDir::new().unwrap();
        let dir = write_project(tmp.path(), "bare", "{}");

        let project = Project::load(&dir).unwrap();
        assert_eq!(project.version, Version::new(1, 0, 0));
        assert!(project.content_files.is_empty());
    }

    #[test]
    fn test_fs_resolver_finds_project() {
        let tmp = TempDir::new().unwrap();
        write_project(tmp.path(), "webapp", "{}");

        let resolver = FsProjectResolver::new(vec![tmp.path().to_path_buf()]);
        let project = resolver.resolve_project("webapp").unwrap();
        assert_eq!(project.name, "webapp");
    }

    #[test]
    fn test_fs_resolver_unknown_name() {
        let tmp = TempDir::new().unwrap();
        let resolver = FsProjectResolver::new(vec![tmp.path().to_path_buf()]);
        assert!(resolver.resolve_project("missing").is_none());
    }

    #[test]
    fn test_fs_resolver_search_order() {
        let tmp = TempDir::new().unwrap();
        let first = tmp.path().join("first");
        let second = tmp.path().join("second");
        write_project(&first, "app", r#"{"version": "1.0.0"}"#);
        write_project(&second, "app", r#"{"version": "9.9.9"}"#);

        let resolver = FsProjectResolver::new(vec![first, second]);
        let project = resolver.resolve_project("app").unwrap();
        assert_eq!(project.version, Version::new(1, 0, 0));
    }
}
