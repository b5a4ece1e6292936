//! Resolved library descriptions - the packer's view of the dependency graph.
//!
//! The graph resolver hands the packer an ordered sequence of these; the
//! packer never mutates them.

use std::fmt;

use semver::Version;

/// What kind of dependency a resolved library is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LibraryKind {
    /// A source project resolvable through a [`ProjectResolver`].
    ///
    /// [`ProjectResolver`]: crate::core::project::ProjectResolver
    Project,

    /// A published package already restored to disk.
    Package,
}

/// A resolved library's declared identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryIdentity {
    /// Declared library name.
    pub name: String,

    /// Declared library version.
    pub version: Version,
}

impl LibraryIdentity {
    /// Create a new identity.
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        LibraryIdentity {
            name: name.into(),
            version,
        }
    }
}

impl fmt::Display for LibraryIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v{}", self.name, self.version)
    }
}

/// One entry of the resolved dependency sequence.
#[derive(Debug, Clone)]
pub struct LibraryDescription {
    /// The library's identity.
    pub identity: LibraryIdentity,

    /// Whether this entry is a source project or a restored package.
    pub kind: LibraryKind,
}

impl LibraryDescription {
    /// Create a new library description.
    pub fn new(identity: LibraryIdentity, kind: LibraryKind) -> Self {
        LibraryDescription { identity, kind }
    }
}
