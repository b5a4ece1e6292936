//! Per-dependency packing.
//!
//! One `PackProject` exists for each project-type dependency being packed
//! and is discarded once post-processing completes. The phases run strictly
//! in order for a dependency: resolve the project, emit its sources or its
//! built package, then post-process the public application folder.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use crate::core::library::LibraryIdentity;
use crate::core::project::{Project, ProjectResolver, PROJECT_FILE_NAME};
use crate::pack::build::{built_package_path, BuildRequest, PackageBuilder, PACKAGE_EXTENSION};
use crate::pack::root::{PackRoot, APP_ROOT_NAME};
use crate::util::fs::{ensure_dir, read_text, relative_key, write_text};
use crate::util::hash::sha512_base64_file;

/// Name of the runtime-configuration file written beside packed output.
pub const RUNTIME_CONFIG_FILE_NAME: &str = "k.ini";

/// Flavor token of the core runtime; every other token is the desktop
/// runtime.
const CORECLR_TOKEN: &str = "coreclr";

/// Fatal per-dependency packing errors.
#[derive(Debug, Error)]
pub enum PackError {
    /// The dependency's declared project could not be located.
    #[error("unable to resolve project `{name}`")]
    ProjectNotFound {
        /// The missing project's name.
        name: String,
    },
}

/// Packs one project-type dependency.
pub struct PackProject<'a> {
    resolver: &'a dyn ProjectResolver,
    library: LibraryIdentity,
    target_path: Option<PathBuf>,
    app_folder: Option<String>,
}

impl<'a> PackProject<'a> {
    /// Create the packing state for one dependency.
    pub fn new(resolver: &'a dyn ProjectResolver, library: LibraryIdentity) -> Self {
        PackProject {
            resolver,
            library,
            target_path: None,
            app_folder: None,
        }
    }

    /// The dependency's declared name.
    pub fn name(&self) -> &str {
        &self.library.name
    }

    /// Where the dependency was emitted, once an emit phase ran.
    pub fn target_path(&self) -> Option<&Path> {
        self.target_path.as_deref()
    }

    /// Override the public application folder's name.
    ///
    /// Defaults to the project's own name.
    pub fn set_app_folder(&mut self, name: impl Into<String>) {
        self.app_folder = Some(name.into());
    }

    fn resolve_project(&self) -> Result<Project> {
        self.resolver
            .resolve_project(&self.library.name)
            .ok_or_else(|| {
                PackError::ProjectNotFound {
                    name: self.library.name.clone(),
                }
                .into()
            })
    }

    /// Export the project's source tree under the bundle's `src` area.
    ///
    /// Any pre-existing target is deleted first; files on the project's
    /// exclude list are filtered out of the copy.
    pub fn emit_source(&mut self, root: &PackRoot) -> Result<()> {
        tracing::info!("packing project dependency {}", self.library.name);

        let project = self.resolve_project()?;
        let target_path = root.source_root().join(&project.name);

        tracing::info!("  source {}", project.project_dir.display());
        tracing::info!("  target {}", target_path.display());

        root.operations.delete(&target_path)?;

        let exclude: HashSet<String> = project
            .exclude_files
            .iter()
            .map(|f| relative_key(Path::new(f)))
            .collect();

        root.operations
            .copy(&project.project_dir, &target_path, &|is_dir, relative| {
                is_dir || !exclude.contains(&relative_key(relative))
            })?;

        self.target_path = Some(target_path);
        Ok(())
    }

    /// Build and emit the project's distributable package under the
    /// bundle's `packages` area.
    ///
    /// Packing is idempotent by default: an existing target is left
    /// untouched unless the root requests overwrite. A failed build
    /// abandons the dependency without producing output.
    pub fn emit_nupkg(&mut self, root: &PackRoot, builder: &dyn PackageBuilder) -> Result<()> {
        tracing::info!("packing nupkg from project dependency {}", self.library.name);

        let project = self.resolve_project()?;
        let archive_name = format!("{}.{}", project.name, project.version);
        let target_path = root.package_root().join(&archive_name);

        tracing::info!("  source {}", project.project_dir.display());
        tracing::info!("  target {}", target_path.display());

        self.target_path = Some(target_path.clone());

        if target_path.exists() {
            if root.overwrite {
                root.operations.delete(&target_path)?;
            } else {
                tracing::info!("  {} already exists", target_path.display());
                return Ok(());
            }
        }

        let output_dir = project.project_dir.join("bin");
        let request = BuildRequest {
            project_dir: &project.project_dir,
            output_dir: &output_dir,
            configuration: &root.configuration,
        };
        if !builder.build(&request)? {
            tracing::debug!("build failed for {}; nothing emitted", self.library.name);
            return Ok(());
        }

        let built_package = built_package_path(&output_dir, &root.configuration, &archive_name);
        root.operations
            .extract_package(&built_package, &target_path)?;

        let package_file_name = format!("{}.{}", archive_name, PACKAGE_EXTENSION);
        let copied_package = target_path.join(&package_file_name);
        fs::copy(&built_package, &copied_package).with_context(|| {
            format!(
                "failed to copy {} to {}",
                built_package.display(),
                copied_package.display()
            )
        })?;

        let digest = sha512_base64_file(&built_package)?;
        write_text(
            &target_path.join(format!("{}.sha512", package_file_name)),
            &digest,
        )?;

        Ok(())
    }

    /// Build the public application folder: content files, runtime
    /// configuration, and tool assemblies merged from known packages.
    pub fn post_process(&self, root: &PackRoot) -> Result<()> {
        let project = self.resolve_project()?;
        let target_path = self
            .target_path
            .as_deref()
            .context("dependency must be emitted before post-processing")?;

        let app_folder_name = self.app_folder.as_deref().unwrap_or(&project.name);
        let app_folder_path = root.output_path.join(app_folder_name);

        // Rebuild the application folder from scratch; leftovers from a
        // previous run must not survive.
        root.operations.delete(&app_folder_path)?;
        ensure_dir(&app_folder_path)?;

        self.copy_content_files(root, &project, app_folder_name, &app_folder_path)?;

        // Per-dependency runtime configuration, written once.
        let ini_path = target_path.join(RUNTIME_CONFIG_FILE_NAME);
        if !ini_path.exists() {
            if let Some(runtime) = root.runtimes.first() {
                match runtime_section(&runtime.name, &root.configuration) {
                    Some(contents) => write_text(&ini_path, &contents)?,
                    None => tracing::debug!(
                        "runtime flavor name `{}` has an unexpected shape; skipping runtime configuration",
                        runtime.name
                    ),
                }
            }
        }

        // Application-folder configuration: inherited contents plus the
        // base path back to the packed source.
        let inherited = if ini_path.exists() {
            read_text(&ini_path)?
        } else {
            String::new()
        };
        let app_base = Path::new("..")
            .join(APP_ROOT_NAME)
            .join("src")
            .join(&project.name);
        write_text(
            &app_folder_path.join(RUNTIME_CONFIG_FILE_NAME),
            &format!("{}APP_BASE={}", inherited, app_base.display()),
        )?;

        // Merge tool assemblies from every known package. The bin folder
        // appears on first need; name collisions resolve to the package
        // processed last.
        let app_bin_path = app_folder_path.join("bin");
        for package in &root.packages {
            let tools_path = package.tools_path();
            if !tools_path.is_dir() {
                continue;
            }

            for entry in fs::read_dir(&tools_path)
                .with_context(|| format!("failed to read tools folder: {}", tools_path.display()))?
                .flatten()
            {
                let tool_path = entry.path();
                let is_assembly = tool_path
                    .extension()
                    .map_or(false, |e| e.eq_ignore_ascii_case("dll"));
                if !is_assembly || !tool_path.is_file() {
                    continue;
                }

                let file_name = match tool_path.file_name() {
                    Some(name) => name.to_os_string(),
                    None => continue,
                };

                ensure_dir(&app_bin_path)?;
                fs::copy(&tool_path, app_bin_path.join(&file_name)).with_context(|| {
                    format!("failed to copy tool assembly: {}", tool_path.display())
                })?;
            }
        }

        Ok(())
    }

    fn copy_content_files(
        &self,
        root: &PackRoot,
        project: &Project,
        app_folder_name: &str,
        app_folder_path: &Path,
    ) -> Result<()> {
        tracing::info!(
            "copying contents of project dependency {} to {}",
            self.library.name,
            app_folder_name
        );
        tracing::info!("  source {}", project.project_dir.display());
        tracing::info!("  target {}", app_folder_path.display());

        let content: HashSet<String> = project
            .content_files
            .iter()
            .map(|f| relative_key(Path::new(f)))
            .collect();

        root.operations
            .copy(&project.project_dir, app_folder_path, &|is_dir, relative| {
                if is_dir {
                    return true;
                }

                // The application folder never needs the project file, even
                // when it is listed as content.
                let file_name = relative
                    .file_name()
                    .map(|n| n.to_string_lossy().to_lowercase());
                if file_name.as_deref() == Some(PROJECT_FILE_NAME) {
                    return false;
                }

                content.contains(&relative_key(relative))
            })
    }
}

/// Render the `[Runtime]` section for a flavor name.
///
/// The name must split as `{family}.{version}` with the family carrying
/// exactly three hyphen-separated segments; anything else yields `None` and
/// the caller skips configuration generation for that flavor.
fn runtime_section(flavor_name: &str, configuration: &str) -> Option<String> {
    let (family, version) = flavor_name.split_once('.')?;

    let segments: Vec<&str> = family.splitn(3, '-').collect();
    if segments.len() != 3 {
        return None;
    }

    let flavor = if segments[1] == CORECLR_TOKEN {
        "CoreCLR"
    } else {
        "DesktopCLR"
    };

    Some(format!(
        "[Runtime]\nKRE_VERSION={}\nKRE_FLAVOR={}\nCONFIGURATION={}\n",
        version, flavor, configuration
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_section_core_flavor() {
        let section = runtime_section("dnx-coreclr-svrc50.1.0.0", "Release").unwrap();
        assert_eq!(
            section,
            "[Runtime]\nKRE_VERSION=1.0.0\nKRE_FLAVOR=CoreCLR\nCONFIGURATION=Release\n"
        );
    }

    #[test]
    fn test_runtime_section_desktop_flavor() {
        let section = runtime_section("dnx-clr-win-x86.1.0.0", "Debug").unwrap();
        assert!(section.contains("KRE_FLAVOR=DesktopCLR"));
        assert!(section.contains("KRE_VERSION=1.0.0"));
    }

    #[test]
    fn test_runtime_section_rejects_missing_version() {
        assert!(runtime_section("dnx-coreclr-svrc50", "Release").is_none());
    }

    #[test]
    fn test_runtime_section_rejects_short_family() {
        assert!(runtime_section("dnx-coreclr.1.0.0", "Release").is_none());
    }
}
