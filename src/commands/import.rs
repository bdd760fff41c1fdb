use anyhow::Result;
use colored::*;
use scriptpack::project;
use std::path::Path;

pub fn execute(script: &Path) -> Result<()> {
    let parent = super::current_dir()?;
    let project = project::import(&parent, script)?;

    println!(
        "{}",
        format!(
            "✓ Imported {} into {}",
            script.display(),
            project.root().display()
        )
        .green()
    );
    println!("  id: {}", project.meta.id);
    Ok(())
}
