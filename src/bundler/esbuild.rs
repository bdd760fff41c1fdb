use super::{BundleOutput, BundleRequest, Bundler};
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

use crate::config::BundlerConfig;

/// Bundles with an `esbuild` executable
pub struct EsbuildBundler {
    command: PathBuf,
    extra_args: Vec<String>,
}

impl EsbuildBundler {
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            extra_args: Vec::new(),
        }
    }

    pub fn from_config(config: &BundlerConfig) -> Self {
        Self {
            command: config.command_path(),
            extra_args: config.args.clone(),
        }
    }

    /// Arguments for one invocation, in order
    pub fn args(&self, request: &BundleRequest<'_>) -> Vec<String> {
        let mut args = vec![
            request.entry.to_string_lossy().to_string(),
            "--bundle".to_string(),
            "--format=esm".to_string(),
            "--platform=neutral".to_string(),
            "--log-level=warning".to_string(),
            format!("--outfile={}", request.output.display()),
        ];
        if !request.header.is_empty() {
            args.push(format!("--banner:js={}", request.header.trim_end()));
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

impl Bundler for EsbuildBundler {
    fn name(&self) -> &'static str {
        "esbuild"
    }

    fn is_available(&self) -> bool {
        which::which(&self.command).is_ok()
    }

    fn bundle(&self, request: &BundleRequest<'_>) -> Result<BundleOutput> {
        if !self.is_available() {
            bail!(
                "{} is not installed (looked for '{}')",
                self.name(),
                self.command.display()
            );
        }

        if let Some(parent) = request.output.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let args = self.args(request);
        debug!(command = %self.command.display(), ?args, "running bundler");

        let output = Command::new(&self.command)
            .args(&args)
            .output()
            .with_context(|| format!("Failed to run {}", self.command.display()))?;

        if !output.status.success() {
            bail!(
                "{} failed:\n{}",
                self.name(),
                String::from_utf8_lossy(&output.stderr).trim_end()
            );
        }

        let bytes = fs::metadata(request.output)
            .with_context(|| format!("Bundler did not write {}", request.output.display()))?
            .len();
        Ok(BundleOutput { bytes })
    }
}
