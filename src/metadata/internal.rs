//! Internal implementation for metadata module
//!
//! Handles project.yaml - the canonical project descriptor.
//! Reads the legacy metadata.json + config.yaml pair and overlays them
//! beneath the canonical descriptor.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::paths;

// =============================================================================
// Constants
// =============================================================================

/// Descriptor format version written by this release
pub const COMPATIBILITY_VERSION: &str = "2";

/// Storage quota given to new projects
pub const DEFAULT_MEMORY_LIMIT: f64 = 8.0;

/// Author recorded when none is known
pub const DEFAULT_AUTHOR: &str = "Unknown";

/// Version given to new projects
pub const DEFAULT_VERSION: &str = "1.0.0";

// =============================================================================
// Errors
// =============================================================================

/// A descriptor file exists but cannot be used
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("failed to read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not valid YAML", .path.display())]
    InvalidYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{} is not valid JSON", .path.display())]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl MetadataError {
    /// File that caused the error
    pub fn path(&self) -> &Path {
        match self {
            Self::Read { path, .. } | Self::InvalidYaml { path, .. } | Self::InvalidJson { path, .. } => {
                path
            }
        }
    }
}

// =============================================================================
// Canonical Record
// =============================================================================

/// Canonical descriptor for one project, persisted as project.yaml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetadata {
    pub compatibility_version: String,
    /// UUID, generated once at creation
    pub id: String,
    pub name: String,
    pub version: String,
    pub author: String,
    pub description: String,
    pub memory_limit: f64,
    /// Epoch seconds, set once at creation
    pub created_at: i64,
    /// Epoch seconds, restamped on every build
    pub updated_at: i64,
    /// User-defined records, passed through untouched
    #[serde(default)]
    pub config: Vec<Value>,
}

impl ProjectMetadata {
    /// Fresh record for a new project: new id, created/updated now
    pub fn new(name: impl Into<String>) -> Self {
        let now = now();
        Self {
            compatibility_version: COMPATIBILITY_VERSION.to_string(),
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            version: DEFAULT_VERSION.to_string(),
            author: DEFAULT_AUTHOR.to_string(),
            description: String::new(),
            memory_limit: DEFAULT_MEMORY_LIMIT,
            created_at: now,
            updated_at: now,
            config: Vec::new(),
        }
    }

    /// Defaults for a project root, named after the directory
    pub fn defaults_for(root: &Path) -> Self {
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "untitled".to_string());
        Self::new(name)
    }

    /// Bundle file name derived from the project name
    pub fn output_file_name(&self) -> String {
        paths::output_file_name(&self.name)
    }

    /// Restamp `updated_at`, never moving it backwards or before `created_at`
    pub fn touch(&mut self, now: i64) {
        self.updated_at = now.max(self.updated_at).max(self.created_at);
    }
}

/// Current time in epoch seconds
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Append the license annotation to a description
pub fn annotate_license(description: &str, license: &str) -> String {
    format!("{} License: {}", description, license)
}

// =============================================================================
// Source Tiers
// =============================================================================

/// Current unified descriptor as read from disk; wins on every field it sets
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedDescriptor {
    /// Read but never trusted
    pub compatibility_version: Option<String>,
    pub id: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub memory_limit: Option<f64>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
    pub config: Option<Vec<Value>>,
}

/// Descriptor written by older releases (metadata.json)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyDescriptor {
    pub id: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub memory_limit: Option<f64>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
    /// Folded into `description` by migration
    pub license: Option<String>,
    /// Explicit file order for the old concatenating bundler; dropped by migration
    pub source_files: Option<Vec<String>>,
}

/// Legacy configuration items (config.yaml): a sequence of opaque records
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct LegacyConfigItems(pub Vec<Value>);

/// Every source found for one project root
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataSources {
    pub legacy: Option<LegacyDescriptor>,
    pub legacy_config: Option<LegacyConfigItems>,
    pub unified: Option<UnifiedDescriptor>,
}

impl MetadataSources {
    /// True when no descriptor of any generation was found
    pub fn is_empty(&self) -> bool {
        self.legacy.is_none() && self.legacy_config.is_none() && self.unified.is_none()
    }
}

/// Fields one tier contributes to the canonical record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataLayer {
    pub id: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub memory_limit: Option<f64>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
    pub config: Option<Vec<Value>>,
}

impl MetadataLayer {
    /// Overwrite every field this layer defines
    pub fn apply_to(self, record: &mut ProjectMetadata) {
        if let Some(id) = self.id {
            record.id = id;
        }
        if let Some(name) = self.name {
            record.name = name;
        }
        if let Some(version) = self.version {
            record.version = version;
        }
        if let Some(author) = self.author {
            record.author = author;
        }
        if let Some(description) = self.description {
            record.description = description;
        }
        if let Some(memory_limit) = self.memory_limit {
            record.memory_limit = memory_limit;
        }
        if let Some(created_at) = self.created_at {
            record.created_at = created_at;
        }
        if let Some(updated_at) = self.updated_at {
            record.updated_at = updated_at;
        }
        if let Some(config) = self.config {
            record.config = config;
        }
    }
}

impl From<LegacyDescriptor> for MetadataLayer {
    fn from(legacy: LegacyDescriptor) -> Self {
        let legacy = apply_legacy_migration(legacy);
        Self {
            id: legacy.id,
            name: legacy.name,
            version: legacy.version,
            author: legacy.author,
            description: legacy.description,
            memory_limit: legacy.memory_limit,
            created_at: legacy.created_at,
            updated_at: legacy.updated_at,
            config: None,
        }
    }
}

impl From<LegacyConfigItems> for MetadataLayer {
    fn from(items: LegacyConfigItems) -> Self {
        Self {
            config: Some(items.0),
            ..Default::default()
        }
    }
}

impl From<UnifiedDescriptor> for MetadataLayer {
    fn from(unified: UnifiedDescriptor) -> Self {
        Self {
            id: unified.id,
            name: unified.name,
            version: unified.version,
            author: unified.author,
            description: unified.description,
            memory_limit: unified.memory_limit,
            created_at: unified.created_at,
            updated_at: unified.updated_at,
            config: unified.config,
        }
    }
}

// =============================================================================
// Migration + Overlay
// =============================================================================

/// Fold `license` into `description` and drop `sourceFiles`
///
/// Idempotent: a migrated record has neither key left.
pub fn apply_legacy_migration(mut legacy: LegacyDescriptor) -> LegacyDescriptor {
    if let Some(license) = legacy.license.take() {
        if !license.is_empty() {
            let description = legacy.description.take().unwrap_or_default();
            legacy.description = Some(annotate_license(&description, &license));
        }
    }
    legacy.source_files = None;
    legacy
}

/// Overlay sources onto defaults: legacy < legacy config items < unified
pub fn merge(defaults: ProjectMetadata, sources: MetadataSources) -> ProjectMetadata {
    let mut record = defaults;

    if let Some(legacy) = sources.legacy {
        MetadataLayer::from(legacy).apply_to(&mut record);
    }
    if let Some(items) = sources.legacy_config {
        MetadataLayer::from(items).apply_to(&mut record);
    }
    if let Some(unified) = sources.unified {
        MetadataLayer::from(unified).apply_to(&mut record);
    }

    record.compatibility_version = COMPATIBILITY_VERSION.to_string();
    record
}

// =============================================================================
// Load / Save
// =============================================================================

fn read_optional(path: &Path) -> Result<Option<String>, MetadataError> {
    if !path.exists() {
        return Ok(None);
    }
    fs::read_to_string(path)
        .map(Some)
        .map_err(|source| MetadataError::Read {
            path: path.to_path_buf(),
            source,
        })
}

fn parse_yaml<T>(path: &Path, contents: &str) -> Result<T, MetadataError>
where
    T: for<'de> Deserialize<'de> + Default,
{
    // An empty document defines nothing
    if contents.trim().is_empty() {
        return Ok(T::default());
    }
    serde_yaml::from_str(contents).map_err(|source| MetadataError::InvalidYaml {
        path: path.to_path_buf(),
        source,
    })
}

/// Read every descriptor generation present under `root`
pub fn read_sources(root: &Path) -> Result<MetadataSources, MetadataError> {
    let mut sources = MetadataSources::default();

    let legacy_path = paths::project::legacy_descriptor_path(root);
    if let Some(contents) = read_optional(&legacy_path)? {
        debug!(path = %legacy_path.display(), "reading legacy descriptor");
        let legacy = serde_json::from_str(&contents).map_err(|source| MetadataError::InvalidJson {
            path: legacy_path.clone(),
            source,
        })?;
        sources.legacy = Some(legacy);
    }

    let items_path = paths::project::legacy_config_path(root);
    if let Some(contents) = read_optional(&items_path)? {
        debug!(path = %items_path.display(), "reading legacy config items");
        sources.legacy_config = Some(parse_yaml(&items_path, &contents)?);
    }

    let unified_path = paths::project::descriptor_path(root);
    if let Some(contents) = read_optional(&unified_path)? {
        debug!(path = %unified_path.display(), "reading descriptor");
        sources.unified = Some(parse_yaml(&unified_path, &contents)?);
    }

    Ok(sources)
}

/// Resolve the canonical record for `root`, defaulting when nothing exists
pub fn load_or_default(root: &Path) -> Result<ProjectMetadata> {
    let sources = read_sources(root)?;
    if sources.is_empty() {
        debug!(root = %root.display(), "no descriptor found, using defaults");
    }
    Ok(merge(ProjectMetadata::defaults_for(root), sources))
}

/// Render a record as descriptor text
pub fn serialize(record: &ProjectMetadata) -> Result<String> {
    serde_yaml::to_string(record).context("Failed to serialize project metadata")
}

/// Parse descriptor text produced by [`serialize`]
pub fn parse(text: &str) -> Result<ProjectMetadata> {
    serde_yaml::from_str(text).context("Failed to parse project metadata")
}

/// Write the canonical descriptor, returning the text written
pub fn save(root: &Path, record: &ProjectMetadata) -> Result<String> {
    let path = paths::project::descriptor_path(root);
    let contents = serialize(record)?;
    fs::write(&path, &contents)
        .with_context(|| format!("Failed to write descriptor: {}", path.display()))?;
    Ok(contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn legacy_with_license() -> LegacyDescriptor {
        LegacyDescriptor {
            name: Some("foo".to_string()),
            description: Some("bar".to_string()),
            license: Some("MIT".to_string()),
            source_files: Some(vec!["a.ts".to_string(), "b.ts".to_string()]),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_record_defaults() {
        let record = ProjectMetadata::new("demo");
        assert_eq!(record.compatibility_version, COMPATIBILITY_VERSION);
        assert_eq!(record.author, DEFAULT_AUTHOR);
        assert_eq!(record.memory_limit, 8.0);
        assert_eq!(record.created_at, record.updated_at);
        assert!(uuid::Uuid::parse_str(&record.id).is_ok());
        assert!(record.config.is_empty());
    }

    #[test]
    fn test_migration_folds_license() {
        let migrated = apply_legacy_migration(legacy_with_license());
        assert_eq!(migrated.description.as_deref(), Some("bar License: MIT"));
        assert!(migrated.license.is_none());
        assert!(migrated.source_files.is_none());
    }

    #[test]
    fn test_migration_is_idempotent() {
        let once = apply_legacy_migration(legacy_with_license());
        let twice = apply_legacy_migration(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_migration_without_description() {
        let legacy = LegacyDescriptor {
            license: Some("MIT".to_string()),
            ..Default::default()
        };
        let migrated = apply_legacy_migration(legacy);
        assert_eq!(migrated.description.as_deref(), Some(" License: MIT"));
    }

    #[test]
    fn test_migration_drops_empty_license() {
        let legacy = LegacyDescriptor {
            description: Some("bar".to_string()),
            license: Some(String::new()),
            ..Default::default()
        };
        let migrated = apply_legacy_migration(legacy);
        assert_eq!(migrated.description.as_deref(), Some("bar"));
        assert!(migrated.license.is_none());
    }

    #[test]
    fn test_merge_precedence() {
        let defaults = ProjectMetadata::new("dir-name");
        let sources = MetadataSources {
            legacy: Some(LegacyDescriptor {
                name: Some("legacy".to_string()),
                version: Some("1.0.0".to_string()),
                author: Some("old author".to_string()),
                ..Default::default()
            }),
            legacy_config: Some(LegacyConfigItems(vec![Value::String("item".to_string())])),
            unified: Some(UnifiedDescriptor {
                version: Some("2.0.0".to_string()),
                compatibility_version: Some("0".to_string()),
                ..Default::default()
            }),
        };

        let record = merge(defaults, sources);
        assert_eq!(record.name, "legacy");
        assert_eq!(record.version, "2.0.0");
        assert_eq!(record.author, "old author");
        assert_eq!(record.config, vec![Value::String("item".to_string())]);
        assert_eq!(record.compatibility_version, COMPATIBILITY_VERSION);
    }

    #[test]
    fn test_unified_config_overrides_legacy_items() {
        let sources = MetadataSources {
            legacy_config: Some(LegacyConfigItems(vec![Value::Bool(true)])),
            unified: Some(UnifiedDescriptor {
                config: Some(vec![]),
                ..Default::default()
            }),
            ..Default::default()
        };
        let record = merge(ProjectMetadata::new("x"), sources);
        assert!(record.config.is_empty());
    }

    #[test]
    fn test_merge_keeps_source_identity() {
        let defaults = ProjectMetadata::new("x");
        let sources = MetadataSources {
            legacy: Some(LegacyDescriptor {
                id: Some("legacy-id".to_string()),
                created_at: Some(100),
                ..Default::default()
            }),
            unified: Some(UnifiedDescriptor {
                id: Some("unified-id".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let record = merge(defaults, sources);
        assert_eq!(record.id, "unified-id");
        assert_eq!(record.created_at, 100);
    }

    #[test]
    fn test_touch_is_monotonic() {
        let mut record = ProjectMetadata::new("x");
        record.created_at = 1_000;
        record.updated_at = 2_000;

        record.touch(1_500);
        assert_eq!(record.updated_at, 2_000);

        record.touch(3_000);
        assert_eq!(record.updated_at, 3_000);
    }

    #[test]
    fn test_serialize_round_trip_multiline() {
        let mut record = ProjectMetadata::new("round trip");
        record.description = "first line\n  indented second\n\ntrailing blank above\n".to_string();
        record.config = vec![serde_yaml::from_str("{ key: value, list: [1, 2] }").unwrap()];

        let text = serialize(&record).unwrap();
        let parsed = parse(&text).unwrap();
        assert_eq!(parsed, record);
        assert_eq!(parsed.description, record.description);
    }

    #[test]
    fn test_load_empty_dir_defaults() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("my-script");
        fs::create_dir(&root).unwrap();

        let record = load_or_default(&root).unwrap();
        assert_eq!(record.name, "my-script");
        assert_eq!(record.memory_limit, 8.0);
        assert!(record.config.is_empty());
    }

    #[test]
    fn test_load_malformed_descriptor_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(paths::project::descriptor_path(tmp.path()), "name: [unclosed").unwrap();

        let err = load_or_default(tmp.path()).unwrap_err();
        let err = err.downcast_ref::<MetadataError>().unwrap();
        assert!(matches!(err, MetadataError::InvalidYaml { .. }));
        assert_eq!(err.path(), paths::project::descriptor_path(tmp.path()));
    }

    #[test]
    fn test_load_malformed_legacy_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(paths::project::legacy_descriptor_path(tmp.path()), "{ not json").unwrap();

        let err = load_or_default(tmp.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MetadataError>(),
            Some(MetadataError::InvalidJson { .. })
        ));
    }

    #[test]
    fn test_empty_descriptor_defines_nothing() {
        let tmp = TempDir::new().unwrap();
        fs::write(paths::project::descriptor_path(tmp.path()), "\n").unwrap();

        let record = load_or_default(tmp.path()).unwrap();
        assert_eq!(record.author, DEFAULT_AUTHOR);
    }

    #[test]
    fn test_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let mut record = ProjectMetadata::new("saved");
        record.author = "someone".to_string();

        let written = save(tmp.path(), &record).unwrap();
        assert_eq!(
            fs::read_to_string(paths::project::descriptor_path(tmp.path())).unwrap(),
            written
        );

        let loaded = load_or_default(tmp.path()).unwrap();
        assert_eq!(loaded, record);
    }
}
