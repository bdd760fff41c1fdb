//! Single source of truth for ALL scriptpack filesystem layout.
//!
//! This module defines WHERE data lives. It has no I/O, no validation,
//! no business logic. One file shows the entire filesystem layout.
//!
//! # User-Level Paths (~/.scriptpack/)
//!
//! ```text
//! ~/.scriptpack/
//! └── config.toml              # Global config (bundler, type definitions)
//! ```
//!
//! The user-level root can be moved with `SCRIPTPACK_HOME`.
//!
//! # Project-Level Paths (project/)
//!
//! ```text
//! project/
//! ├── project.yaml             # Canonical descriptor (read + written)
//! ├── metadata.json            # Legacy descriptor (read-only)
//! ├── config.yaml              # Legacy config items (read-only)
//! ├── src/index.ts             # Entry point
//! ├── dist/<slug>.js           # Bundle output
//! └── types/host.d.ts          # Cached type declarations
//! ```

use std::path::{Path, PathBuf};

/// Environment variable overriding the user-level directory.
pub const HOME_ENV: &str = "SCRIPTPACK_HOME";

// =============================================================================
// User Level (~/.scriptpack/)
// =============================================================================

/// User's scriptpack home directory: `~/.scriptpack/`
pub fn scriptpack_home() -> PathBuf {
    if let Some(home) = std::env::var_os(HOME_ENV) {
        return PathBuf::from(home);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".scriptpack")
}

/// Global config file: `~/.scriptpack/config.toml`
pub fn config_path() -> PathBuf {
    scriptpack_home().join("config.toml")
}

// =============================================================================
// Project Level (project/)
// =============================================================================

/// Project-level paths, relative to a project root.
///
/// All functions take a `root: &Path` parameter - the project directory.
///
/// # Example
///
/// ```
/// use std::path::Path;
/// use scriptpack::paths::project;
///
/// let root = Path::new("/home/user/miner");
/// assert_eq!(project::descriptor_path(root), Path::new("/home/user/miner/project.yaml"));
/// ```
pub mod project {
    use super::*;

    /// Canonical descriptor: `project.yaml`
    pub fn descriptor_path(root: &Path) -> PathBuf {
        root.join("project.yaml")
    }

    /// Legacy single-file descriptor: `metadata.json`
    pub fn legacy_descriptor_path(root: &Path) -> PathBuf {
        root.join("metadata.json")
    }

    /// Legacy configuration items: `config.yaml`
    pub fn legacy_config_path(root: &Path) -> PathBuf {
        root.join("config.yaml")
    }

    /// Source directory: `src/`
    pub fn source_dir(root: &Path) -> PathBuf {
        root.join("src")
    }

    /// Entry point: `src/index.ts`
    pub fn entry_point(root: &Path) -> PathBuf {
        source_dir(root).join("index.ts")
    }

    /// Bundle output directory: `dist/`
    pub fn output_dir(root: &Path) -> PathBuf {
        root.join("dist")
    }

    /// Bundle output for a project name: `dist/<slug>.js`
    pub fn output_path(root: &Path, name: &str) -> PathBuf {
        output_dir(root).join(output_file_name(name))
    }

    /// Type declaration cache directory: `types/`
    pub fn types_dir(root: &Path) -> PathBuf {
        root.join("types")
    }

    /// Cached type declarations: `types/host.d.ts`
    pub fn types_path(root: &Path) -> PathBuf {
        types_dir(root).join("host.d.ts")
    }
}

/// Extension of every bundle.
pub const OUTPUT_EXTENSION: &str = "js";

/// Slug used when a name has nothing usable left
pub const FALLBACK_SLUG: &str = "untitled";

/// File-name-safe form of a project name
///
/// Lowercases, collapses whitespace runs and path separators into single
/// hyphens, drops control characters and `.`/`..` segments, and strips
/// leading dots. Never empty and never contains a separator.
pub fn slug(name: &str) -> String {
    let slug = name
        .split(|c: char| c.is_whitespace() || c == '/' || c == '\\')
        .map(|part| {
            part.chars()
                .filter(|c| !c.is_control())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|part| !part.is_empty() && part != "." && part != "..")
        .collect::<Vec<_>>()
        .join("-");

    let slug = slug.trim_start_matches('.');
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug.to_string()
    }
}

/// Bundle file name for a project name: `<slug>.js`
pub fn output_file_name(name: &str) -> String {
    format!("{}.{}", slug(name), OUTPUT_EXTENSION)
}
