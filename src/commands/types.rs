use anyhow::Result;
use colored::*;
use scriptpack::config;
use scriptpack::project::{self, Project};
use scriptpack::typedefs::{self, TypesStatus};

pub fn execute(name: Option<String>, force: bool) -> Result<()> {
    let root = super::current_dir()?;
    let config = config::load()?;
    let project = project::resolve_from(&root, name.as_deref())?;

    refresh(&project, &config.types, force)
}

/// Refresh a project's declaration cache and report the outcome
pub fn refresh(project: &Project, config: &config::TypesConfig, force: bool) -> Result<()> {
    let path = project.types_path();
    match typedefs::ensure(&path, config, force)? {
        TypesStatus::Fresh => {
            println!("  ✓ Type definitions up to date");
        }
        TypesStatus::Fetched { bytes } => {
            println!(
                "  ✓ Downloaded type definitions ({})",
                scriptpack::build::human_size(bytes)
            );
        }
        TypesStatus::Stale { reason } => {
            println!(
                "{}",
                format!("  ⚠️  Using cached type definitions: {reason}").yellow()
            );
        }
        TypesStatus::Unavailable { reason } => {
            println!(
                "{}",
                format!("  ⚠️  Type definitions unavailable: {reason}").yellow()
            );
        }
        TypesStatus::Disabled => {}
    }
    Ok(())
}
