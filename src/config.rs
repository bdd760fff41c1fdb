//! User-level configuration stored in `~/.scriptpack/config.toml`.
//!
//! Every section has serde defaults, so a missing file or a file with only
//! some sections still loads. A present but unparseable file is an error.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

/// Global configuration stored in ~/.scriptpack/config.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub bundler: BundlerConfig,
    #[serde(default)]
    pub types: TypesConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundlerConfig {
    /// Bundler executable (name on PATH or path, `~` is expanded)
    #[serde(default = "default_bundler_command")]
    pub command: String,
    /// Extra arguments appended to every bundler invocation
    #[serde(default)]
    pub args: Vec<String>,
}

fn default_bundler_command() -> String {
    "esbuild".to_string()
}

impl Default for BundlerConfig {
    fn default() -> Self {
        Self {
            command: default_bundler_command(),
            args: Vec::new(),
        }
    }
}

impl BundlerConfig {
    /// Bundler command with `~` expanded
    pub fn command_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.command).as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypesConfig {
    /// Where the host's declaration file is downloaded from (empty disables fetching)
    #[serde(default = "default_types_url")]
    pub url: String,
    /// Freshness window for the cached declaration file
    #[serde(default = "default_max_age_hours")]
    pub max_age_hours: u64,
    /// Fail builds when no declarations are cached and none can be fetched
    #[serde(default)]
    pub required: bool,
}

fn default_types_url() -> String {
    "https://raw.githubusercontent.com/scriptpack/host-types/main/host.d.ts".to_string()
}

fn default_max_age_hours() -> u64 {
    24
}

impl Default for TypesConfig {
    fn default() -> Self {
        Self {
            url: default_types_url(),
            max_age_hours: default_max_age_hours(),
            required: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Author offered by `scriptpack new`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// Load config from ~/.scriptpack/config.toml
pub fn load() -> Result<GlobalConfig> {
    load_from(&paths::config_path())
}

/// Load config from an explicit path, defaulting when the file is absent
pub fn load_from(path: &Path) -> Result<GlobalConfig> {
    if !path.exists() {
        return Ok(GlobalConfig::default());
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;

    toml::from_str(&contents).with_context(|| format!("Failed to parse config: {}", path.display()))
}
