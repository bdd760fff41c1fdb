//! Internal implementation for typedefs module
//!
//! - reqwest blocking client for the download
//! - file mtime for the freshness window

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

use crate::config::TypesConfig;

/// Outcome of [`ensure`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypesStatus {
    /// Cache is within the freshness window
    Fresh,
    /// Cache was (re)downloaded
    Fetched { bytes: u64 },
    /// Download failed; the stale cache is used
    Stale { reason: String },
    /// Download failed and no cache exists
    Unavailable { reason: String },
    /// No source URL configured
    Disabled,
}

/// Check whether the cache file is missing or older than `max_age`
pub fn is_stale(path: &Path, max_age: Duration) -> bool {
    let Ok(modified) = fs::metadata(path).and_then(|m| m.modified()) else {
        return true;
    };
    match SystemTime::now().duration_since(modified) {
        Ok(age) => age >= max_age,
        // Modified in the future: treat as fresh
        Err(_) => false,
    }
}

/// Download `url` into `dest`, replacing it only on success
pub fn download(url: &str, dest: &Path) -> Result<u64> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("scriptpack/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(30))
        .build()?;

    let response = client
        .get(url)
        .send()
        .with_context(|| format!("Failed to GET {}", url))?;

    if !response.status().is_success() {
        bail!("HTTP {}: {}", response.status(), url);
    }

    let body = response
        .bytes()
        .with_context(|| format!("Failed to read response from {}", url))?;

    let file_name = dest
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "download".to_string());
    let partial = dest.with_file_name(format!("{}.partial", file_name));
    fs::write(&partial, &body)?;
    fs::rename(&partial, dest)
        .with_context(|| format!("Failed to move download into {}", dest.display()))?;

    Ok(body.len() as u64)
}

/// Make sure `dest` holds usable declarations
///
/// Fetches when the cache is stale or `force` is set. A failed fetch
/// falls back to an existing cache; without one it is an error only when
/// `config.required` is set.
pub fn ensure(dest: &Path, config: &TypesConfig, force: bool) -> Result<TypesStatus> {
    if config.url.trim().is_empty() {
        return Ok(TypesStatus::Disabled);
    }

    let max_age = Duration::from_secs(config.max_age_hours.saturating_mul(3600));
    if !force && !is_stale(dest, max_age) {
        debug!(path = %dest.display(), "type definitions are fresh");
        return Ok(TypesStatus::Fresh);
    }

    match download(&config.url, dest) {
        Ok(bytes) => Ok(TypesStatus::Fetched { bytes }),
        Err(e) => {
            let reason = format!("{:#}", e);
            if dest.exists() {
                warn!(error = %reason, "type definition fetch failed, using cached copy");
                Ok(TypesStatus::Stale { reason })
            } else if config.required {
                Err(e.context("No cached type definitions and the download failed"))
            } else {
                warn!(error = %reason, "type definitions unavailable");
                Ok(TypesStatus::Unavailable { reason })
            }
        }
    }
}
