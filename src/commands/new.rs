use anyhow::{bail, Result};
use colored::*;
use scriptpack::metadata::DEFAULT_AUTHOR;
use scriptpack::project::{self, NewProject};
use scriptpack::{config, paths};

use super::prompt;

/// Answers given on the command line
#[derive(Debug, Default)]
pub struct NewOptions {
    pub name: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub license: Option<String>,
    /// Take defaults instead of prompting
    pub yes: bool,
}

pub fn execute(options: NewOptions) -> Result<()> {
    let parent = super::current_dir()?;
    let config = config::load()?;
    let interactive = !options.yes && prompt::is_interactive();

    let name = match options.name {
        Some(name) => name,
        None if interactive => prompt::ask("Project name", None)?,
        None => bail!("A project name is required when not running interactively"),
    };
    if name.trim().is_empty() {
        bail!("Project name cannot be empty");
    }

    let default_author = config
        .defaults
        .author
        .clone()
        .unwrap_or_else(|| DEFAULT_AUTHOR.to_string());

    let answers = if interactive {
        NewProject {
            name,
            author: Some(ask_unless_given(options.author, "Author", &default_author)?),
            description: Some(ask_unless_given(options.description, "Description", "")?),
            license: Some(ask_unless_given(options.license, "License", "")?),
        }
    } else {
        NewProject {
            name,
            author: options.author.or(config.defaults.author.clone()),
            description: options.description,
            license: options.license,
        }
    };

    let project = project::create(&parent, answers)?;
    println!(
        "{}",
        format!(
            "✓ Created {} at {}",
            project.meta.name,
            project.root().display()
        )
        .green()
    );

    // Editor support only; a failed fetch never undoes the project
    if let Err(e) = super::types::refresh(&project, &config.types, false) {
        println!(
            "{}",
            format!("  ⚠️  Could not fetch type definitions: {e:#}").yellow()
        );
    }

    println!("\nNext steps:");
    println!("  cd {}", paths::slug(&project.meta.name));
    println!("  scriptpack build");
    Ok(())
}

fn ask_unless_given(given: Option<String>, label: &str, default: &str) -> Result<String> {
    match given {
        Some(value) => Ok(value),
        None => prompt::ask(label, Some(default)),
    }
}
