pub mod esbuild;

use anyhow::Result;
use std::path::Path;

use crate::config::BundlerConfig;

/// One bundling job: resolve `entry`'s import graph into `output`
#[derive(Debug, Clone, Copy)]
pub struct BundleRequest<'a> {
    pub entry: &'a Path,
    pub output: &'a Path,
    /// Text placed verbatim before the bundled code
    pub header: &'a str,
}

/// Result of a successful bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BundleOutput {
    /// Size of the written artifact in bytes
    pub bytes: u64,
}

/// Trait for bundler integrations
pub trait Bundler {
    /// Get the name of this bundler
    fn name(&self) -> &'static str;

    /// Check if this bundler can be invoked
    fn is_available(&self) -> bool;

    /// Produce one output file; an error means nothing usable was written
    fn bundle(&self, request: &BundleRequest<'_>) -> Result<BundleOutput>;
}

/// Get the bundler described by the user configuration
pub fn get_bundler(config: &BundlerConfig) -> Box<dyn Bundler> {
    Box::new(esbuild::EsbuildBundler::from_config(config))
}
