//! Typedefs module - cached type declarations for the scripting host
//!
//! The declaration file lives at `types/host.d.ts` in each project and is
//! refreshed once it is older than the configured freshness window (or on
//! request). Network failures never block a build that has a cached copy.

mod internal;

use anyhow::Result;
use std::path::Path;
use std::time::Duration;

use crate::config::TypesConfig;

pub use internal::TypesStatus;

/// Check whether a cached file is missing or older than `max_age`
pub fn is_stale(path: &Path, max_age: Duration) -> bool {
    internal::is_stale(path, max_age)
}

/// Download `url` to `dest`, returning the number of bytes written
pub fn download(url: &str, dest: &Path) -> Result<u64> {
    internal::download(url, dest)
}

/// Refresh `dest` if stale (or `force`), falling back to the cached copy
pub fn ensure(dest: &Path, config: &TypesConfig, force: bool) -> Result<TypesStatus> {
    internal::ensure(dest, config, force)
}
