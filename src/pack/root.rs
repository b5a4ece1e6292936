//! Pack root - the shared context for one packing run.

use std::path::PathBuf;

use crate::core::library::LibraryIdentity;
use crate::pack::operations::Operations;

/// Name of the bundle-internal root directory holding packed sources and
/// packages, distinct from the public application folders beside it.
pub const APP_ROOT_NAME: &str = "approot";

/// A package already placed under the output directory.
///
/// Its `tools/` subfolder, when present, feeds the tool-assembly merge
/// during post-processing.
#[derive(Debug, Clone)]
pub struct PackPackage {
    /// The package's identity.
    pub identity: LibraryIdentity,

    /// Where the package was placed under the output directory.
    pub target_path: PathBuf,
}

impl PackPackage {
    /// The package's tool-assembly folder.
    pub fn tools_path(&self) -> PathBuf {
        self.target_path.join("tools")
    }
}

/// A runtime flavor being bundled with the application.
#[derive(Debug, Clone)]
pub struct PackRuntime {
    /// Flavor name, `{family}.{version}` (e.g. `dnx-coreclr-svrc50.1.0.0`).
    pub name: String,
}

/// Shared context for one packing invocation.
#[derive(Debug)]
pub struct PackRoot {
    /// Output directory the bundle is assembled under.
    pub output_path: PathBuf,

    /// Selected build configuration name.
    pub configuration: String,

    /// Whether already-packed targets are rebuilt.
    pub overwrite: bool,

    /// Packages already placed under the output.
    pub packages: Vec<PackPackage>,

    /// Runtime flavors being bundled.
    pub runtimes: Vec<PackRuntime>,

    /// Filesystem operations facade.
    pub operations: Operations,
}

impl PackRoot {
    /// Create a pack root with default policy (no overwrite, nothing known).
    pub fn new(output_path: PathBuf, configuration: impl Into<String>) -> Self {
        PackRoot {
            output_path,
            configuration: configuration.into(),
            overwrite: false,
            packages: Vec::new(),
            runtimes: Vec::new(),
            operations: Operations,
        }
    }

    /// The directory packed project sources land under.
    pub fn source_root(&self) -> PathBuf {
        self.output_path.join(APP_ROOT_NAME).join("src")
    }

    /// The directory packed packages land under.
    pub fn package_root(&self) -> PathBuf {
        self.output_path.join(APP_ROOT_NAME).join("packages")
    }

    /// Register a package already placed under the output.
    pub fn add_package(&mut self, identity: LibraryIdentity, target_path: PathBuf) {
        self.packages.push(PackPackage {
            identity,
            target_path,
        });
    }

    /// Register a bundled runtime flavor.
    pub fn add_runtime(&mut self, name: impl Into<String>) {
        self.runtimes.push(PackRuntime { name: name.into() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_layout_paths() {
        let root = PackRoot::new(PathBuf::from("/out"), "Release");
        assert_eq!(root.source_root(), Path::new("/out/approot/src"));
        assert_eq!(root.package_root(), Path::new("/out/approot/packages"));
        assert!(!root.overwrite);
    }
}
