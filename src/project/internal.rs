//! Internal implementation for project module
//!
//! Resolves project roots (single or named sibling) and creates new
//! projects from scratch or from an existing script.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::header;
use crate::metadata::{self, MetadataSources, ProjectMetadata};
use crate::paths;

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("project '{name}' not found in {}{}", .root.display(), available_hint(.available))]
    NotFound {
        name: String,
        root: PathBuf,
        available: Vec<String>,
    },

    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("entry point {} does not exist", .0.display())]
    MissingEntryPoint(PathBuf),

    #[error("{} already exists", .0.display())]
    AlreadyExists(PathBuf),
}

fn available_hint(available: &[String]) -> String {
    if available.is_empty() {
        String::new()
    } else {
        format!(" (available: {})", available.join(", "))
    }
}

// =============================================================================
// Project Handle
// =============================================================================

/// One project: its absolute root plus its canonical metadata
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    pub meta: ProjectMetadata,
}

impl Project {
    pub fn new(root: PathBuf, meta: ProjectMetadata) -> Self {
        Self { root, meta }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn descriptor_path(&self) -> PathBuf {
        paths::project::descriptor_path(&self.root)
    }

    pub fn entry_point(&self) -> PathBuf {
        paths::project::entry_point(&self.root)
    }

    /// Bundle path for the current project name
    pub fn output_path(&self) -> PathBuf {
        paths::project::output_path(&self.root, &self.meta.name)
    }

    pub fn types_path(&self) -> PathBuf {
        paths::project::types_path(&self.root)
    }

    /// Replace the in-memory metadata with a fresh read from disk
    ///
    /// Identity the files on disk do not define yet is kept from memory, so
    /// a project whose descriptor was never saved keeps one `id`.
    pub fn reload(&mut self) -> Result<()> {
        let sources = metadata::read_sources(&self.root)?;

        let mut defaults = ProjectMetadata::defaults_for(&self.root);
        defaults.id = self.meta.id.clone();
        defaults.created_at = self.meta.created_at;
        defaults.updated_at = self.meta.updated_at;

        self.meta = metadata::merge(defaults, sources);
        Ok(())
    }

    /// Persist the in-memory metadata, returning the text written
    pub fn save(&self) -> Result<String> {
        metadata::save(&self.root, &self.meta)
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Check whether a directory holds a project of any generation
pub fn is_project(path: &Path) -> bool {
    paths::project::descriptor_path(path).exists()
        || paths::project::legacy_descriptor_path(path).exists()
        || paths::project::entry_point(path).exists()
}

/// Names of the project directories directly under `root`, sorted
pub fn discover(root: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(root) else {
        return Vec::new();
    };

    let mut names: Vec<String> = entries
        .flatten()
        .filter(|entry| entry.path().is_dir() && is_project(&entry.path()))
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

/// Resolve the project rooted exactly at `root`
pub fn resolve(root: &Path) -> Result<Project> {
    if !root.is_dir() {
        return Err(ProjectError::NotADirectory(root.to_path_buf()).into());
    }
    let root = root
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", root.display()))?;

    debug!(root = %root.display(), "resolving project");
    let meta = metadata::load_or_default(&root)?;
    Ok(Project::new(root, meta))
}

/// Resolve a named project among the siblings under `root`
pub fn resolve_named(root: &Path, name: &str) -> Result<Project> {
    let candidate = root.join(name);
    if candidate.is_dir() && is_project(&candidate) {
        return resolve(&candidate);
    }

    // Fall back to matching the slug of the requested name
    let slugged = root.join(paths::slug(name));
    if slugged != candidate && slugged.is_dir() && is_project(&slugged) {
        return resolve(&slugged);
    }

    Err(ProjectError::NotFound {
        name: name.to_string(),
        root: root.to_path_buf(),
        available: discover(root),
    }
    .into())
}

/// Resolve `root` itself, or a named sibling project under it
pub fn resolve_from(root: &Path, name: Option<&str>) -> Result<Project> {
    match name {
        Some(name) => resolve_named(root, name),
        None => resolve(root),
    }
}

// =============================================================================
// Creation
// =============================================================================

/// Answers collected when creating a project
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewProject {
    pub name: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub license: Option<String>,
}

impl NewProject {
    /// Build the initial metadata record
    pub fn into_metadata(self) -> ProjectMetadata {
        let mut meta = ProjectMetadata::new(self.name);
        if let Some(author) = self.author.filter(|a| !a.trim().is_empty()) {
            meta.author = author;
        }
        let description = self.description.unwrap_or_default();
        meta.description = match self.license.filter(|l| !l.trim().is_empty()) {
            Some(license) => metadata::annotate_license(&description, &license),
            None => description,
        };
        meta
    }
}

fn entry_template(name: &str) -> String {
    format!(
        "// Entry point for {name}.\n\
         // Import other modules from src/ - they are bundled into one script.\n\
         \n\
         export async function main(): Promise<void> {{\n\
         }}\n"
    )
}

const GITIGNORE: &str = "dist/\ntypes/\n";

fn scaffold(root: &Path, entry_source: &str, meta: &ProjectMetadata) -> Result<()> {
    fs::create_dir_all(paths::project::source_dir(root))
        .with_context(|| format!("Failed to create {}", root.display()))?;
    fs::write(paths::project::entry_point(root), entry_source)?;
    fs::write(root.join(".gitignore"), GITIGNORE)?;
    metadata::save(root, meta)?;
    Ok(())
}

/// Create `<parent>/<slug>/` with a descriptor and an entry point
pub fn create(parent: &Path, answers: NewProject) -> Result<Project> {
    let meta = answers.into_metadata();
    let root = parent.join(paths::slug(&meta.name));
    if root.exists() {
        return Err(ProjectError::AlreadyExists(root).into());
    }

    scaffold(&root, &entry_template(&meta.name), &meta)?;
    info!(root = %root.display(), id = %meta.id, "created project");
    resolve(&root)
}

/// Turn an existing single-file script into a project under `parent`
///
/// A header block in the script supplies the metadata (keeping its id and
/// creation time); otherwise the record is seeded from the file stem.
pub fn import(parent: &Path, script: &Path) -> Result<Project> {
    let text = fs::read_to_string(script)
        .with_context(|| format!("Failed to read {}", script.display()))?;

    let stem = script
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "imported".to_string());

    let (meta, body) = match header::split(&text)? {
        Some((descriptor, body)) => {
            let sources = MetadataSources {
                unified: Some(descriptor),
                ..Default::default()
            };
            (metadata::merge(ProjectMetadata::new(stem), sources), body)
        }
        None => (ProjectMetadata::new(stem), text.as_str()),
    };

    let root = parent.join(paths::slug(&meta.name));
    if root.exists() {
        return Err(ProjectError::AlreadyExists(root).into());
    }

    scaffold(&root, body, &meta)?;
    info!(root = %root.display(), id = %meta.id, "imported project");
    resolve(&root)
}
