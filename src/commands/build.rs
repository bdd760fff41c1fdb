use anyhow::{bail, Result};
use colored::*;
use scriptpack::build::{self, human_size};
use scriptpack::bundler::{self, Bundler};
use scriptpack::{config, paths, project};

pub fn execute(name: Option<String>) -> Result<()> {
    let root = super::current_dir()?;
    let config = config::load()?;
    let mut project = project::resolve_from(&root, name.as_deref())?;

    let bundler = bundler::get_bundler(&config.bundler);
    ensure_available(bundler.as_ref())?;

    super::types::refresh(&project, &config.types, false)?;

    println!("🔨 Building {}...", project.meta.name);
    let report = build::build(&mut project, bundler.as_ref())?;

    println!(
        "{}",
        format!(
            "  ✓ {} ({})",
            report.output.display(),
            human_size(report.bytes)
        )
        .green()
    );
    if report.descriptor.is_none() {
        println!(
            "{}",
            "  ⚠️  Project metadata could not be saved; it will be retried next build".yellow()
        );
    }
    Ok(())
}

pub(crate) fn ensure_available(bundler: &dyn Bundler) -> Result<()> {
    if !bundler.is_available() {
        bail!(
            "Bundler '{}' not found. Install it or set bundler.command in {}",
            bundler.name(),
            paths::config_path().display()
        );
    }
    Ok(())
}
