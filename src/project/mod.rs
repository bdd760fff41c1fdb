//! Project module - resolve, create and import projects
//!
//! A [`Project`] is an absolute root directory plus the canonical
//! metadata loaded from it. Current releases work on exactly one project
//! per invocation, located by path; a directory holding several sibling
//! projects can still be addressed by name.
//!
//! # Example
//!
//! ```no_run
//! use scriptpack::project;
//! use std::path::Path;
//!
//! let cwd = Path::new(".");
//!
//! // Resolve the project in the current directory...
//! let here = project::resolve(cwd)?;
//! println!("{} v{}", here.meta.name, here.meta.version);
//!
//! // ...or a named sibling
//! let other = project::resolve_named(cwd, "miner")?;
//! println!("{}", other.entry_point().display());
//! # Ok::<(), anyhow::Error>(())
//! ```

mod internal;

use anyhow::Result;
use std::path::Path;

pub use internal::{NewProject, Project, ProjectError};

/// Check if a directory holds a project (descriptor, legacy descriptor or entry point)
pub fn is_project(path: &Path) -> bool {
    internal::is_project(path)
}

/// List project directories directly under `root`
pub fn discover(root: &Path) -> Vec<String> {
    internal::discover(root)
}

/// Resolve the project rooted at `root`
///
/// Fails with [`ProjectError::NotADirectory`] when `root` is not a
/// directory, or with a metadata error when a descriptor is malformed.
pub fn resolve(root: &Path) -> Result<Project> {
    internal::resolve(root)
}

/// Resolve a named sibling project under `root`
///
/// Fails with [`ProjectError::NotFound`] when no such project exists.
pub fn resolve_named(root: &Path, name: &str) -> Result<Project> {
    internal::resolve_named(root, name)
}

/// Resolve `root` itself when `name` is `None`, otherwise the named sibling
pub fn resolve_from(root: &Path, name: Option<&str>) -> Result<Project> {
    internal::resolve_from(root, name)
}

/// Create a new project directory under `parent`
pub fn create(parent: &Path, answers: NewProject) -> Result<Project> {
    internal::create(parent, answers)
}

/// Create a project under `parent` from an existing script file
pub fn import(parent: &Path, script: &Path) -> Result<Project> {
    internal::import(parent, script)
}
