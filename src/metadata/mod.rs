//! Metadata module - canonical project descriptor
//!
//! Manages `project.yaml`, the single descriptor every build reads and
//! rewrites. Older projects may still carry a `metadata.json` descriptor
//! and a separate `config.yaml` of configuration items; both are read
//! (never written) and overlaid beneath the canonical descriptor:
//!
//! ```text
//! defaults < metadata.json < config.yaml (config only) < project.yaml
//! ```
//!
//! # Example
//!
//! ```no_run
//! use scriptpack::metadata;
//! use std::path::Path;
//!
//! let root = Path::new(".");
//!
//! let mut meta = metadata::load_or_default(root)?;
//! meta.version = "1.1.0".to_string();
//! metadata::save(root, &meta)?;
//! # Ok::<(), anyhow::Error>(())
//! ```

mod internal;

use anyhow::Result;
use std::path::Path;

pub use internal::{
    annotate_license, now, LegacyConfigItems, LegacyDescriptor, MetadataError, MetadataLayer,
    MetadataSources, ProjectMetadata, UnifiedDescriptor, COMPATIBILITY_VERSION, DEFAULT_AUTHOR,
    DEFAULT_MEMORY_LIMIT, DEFAULT_VERSION,
};

/// Load the canonical record for a project root
///
/// Never fails for missing files: with no descriptor at all the record is
/// defaulted and named after the directory. Fails with [`MetadataError`]
/// when a descriptor is present but unreadable or malformed.
pub fn load_or_default(root: &Path) -> Result<ProjectMetadata> {
    internal::load_or_default(root)
}

/// Read every descriptor generation present under `root` without merging
pub fn read_sources(root: &Path) -> Result<MetadataSources> {
    Ok(internal::read_sources(root)?)
}

/// Overlay sources onto defaults in precedence order
pub fn merge(defaults: ProjectMetadata, sources: MetadataSources) -> ProjectMetadata {
    internal::merge(defaults, sources)
}

/// Fold a legacy `license` into `description` and drop `sourceFiles`
pub fn apply_legacy_migration(legacy: LegacyDescriptor) -> LegacyDescriptor {
    internal::apply_legacy_migration(legacy)
}

/// Render a record as descriptor text
pub fn serialize(record: &ProjectMetadata) -> Result<String> {
    internal::serialize(record)
}

/// Parse descriptor text
pub fn parse(text: &str) -> Result<ProjectMetadata> {
    internal::parse(text)
}

/// Persist a record to `project.yaml`, returning the text written
pub fn save(root: &Path, record: &ProjectMetadata) -> Result<String> {
    internal::save(root, record)
}
