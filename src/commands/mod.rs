pub mod build;
pub mod import;
pub mod new;
pub mod prompt;
pub mod types;
pub mod watch;

use anyhow::{Context, Result};
use std::path::PathBuf;

fn current_dir() -> Result<PathBuf> {
    std::env::current_dir().context("Failed to get current directory")
}
