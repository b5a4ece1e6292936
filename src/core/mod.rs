//! Core domain model

pub mod library;
pub mod project;

pub use library::{LibraryDescription, LibraryIdentity, LibraryKind};
pub use project::{FsProjectResolver, Project, ProjectResolver};
