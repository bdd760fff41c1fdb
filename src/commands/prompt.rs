//! User interaction utilities

use anyhow::Result;
use std::io::{self, Write};

/// Set to skip every prompt and take defaults
pub const NONINTERACTIVE_ENV: &str = "SCRIPTPACK_NONINTERACTIVE";

/// Prompts run only on a terminal and when not switched off
pub fn is_interactive() -> bool {
    std::env::var(NONINTERACTIVE_ENV).is_err()
        && atty::is(atty::Stream::Stdin)
        && atty::is(atty::Stream::Stdout)
}

/// Ask for a line of text; an empty answer takes `default`
pub fn ask(label: &str, default: Option<&str>) -> Result<String> {
    match default {
        Some(default) if !default.is_empty() => print!("{label} [{default}]: "),
        _ => print!("{label}: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let trimmed = input.trim();
    if trimmed.is_empty() {
        Ok(default.unwrap_or_default().to_string())
    } else {
        Ok(trimmed.to_string())
    }
}
