//! Stevedore - packaging engine for project-based application bundles
//!
//! Given a resolved dependency graph of source projects and published
//! packages, this crate assembles a deployable, self-contained application
//! bundle: it exports project sources, builds and extracts distributable
//! packages with integrity stamping, merges runtime tooling, and writes the
//! runtime configuration needed to launch the bundle on a target framework.
//! The framework reference resolver maps target-framework monikers to their
//! installed assembly catalogs for the build steps around the packer.

pub mod core;
pub mod framework;
pub mod pack;
pub mod util;

pub use crate::core::{LibraryDescription, LibraryIdentity, LibraryKind, Project, ProjectResolver};
pub use crate::framework::{FrameworkMoniker, FrameworkResolver, FrameworkVersion};
pub use crate::pack::{PackProject, PackRoot};
