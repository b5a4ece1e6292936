//! The external build-step boundary.
//!
//! Building a project into a distributable package is owned by the
//! surrounding toolchain; the packer only needs its inputs, its
//! success/failure answer, and the configuration-scoped path where the
//! produced archive lands.

use std::path::{Path, PathBuf};

use anyhow::Result;

/// File extension of distributable package archives.
pub const PACKAGE_EXTENSION: &str = "nupkg";

/// Inputs of one package build.
#[derive(Debug, Clone)]
pub struct BuildRequest<'a> {
    /// Directory of the project to build.
    pub project_dir: &'a Path,

    /// Directory the build writes its outputs under.
    pub output_dir: &'a Path,

    /// Active build configuration name.
    pub configuration: &'a str,
}

/// Builds a project into a distributable package.
pub trait PackageBuilder {
    /// Run the build.
    ///
    /// `Ok(false)` means the underlying build reported failure; errors are
    /// reserved for the builder's own infrastructure problems.
    fn build(&self, request: &BuildRequest<'_>) -> Result<bool>;
}

/// Configuration-scoped path of a produced package archive.
///
/// `archive_name` is the `{name}.{version}` stem shared by the archive and
/// its extraction target.
pub fn built_package_path(output_dir: &Path, configuration: &str, archive_name: &str) -> PathBuf {
    output_dir
        .join(configuration)
        .join(format!("{}.{}", archive_name, PACKAGE_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_built_package_path() {
        let path = built_package_path(Path::new("/proj/bin"), "Release", "webapp.1.0.0");
        assert_eq!(
            path,
            Path::new("/proj/bin/Release/webapp.1.0.0.nupkg")
        );
    }
}
