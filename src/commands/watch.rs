use anyhow::Result;
use colored::*;
use scriptpack::build::human_size;
use scriptpack::watch::{self, WatchCoordinator, WatchEvent, WatchSession};
use scriptpack::{bundler, config, project};
use std::time::Duration;

/// How often the loop checks for a shutdown request
const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub fn execute(name: Option<String>) -> Result<()> {
    let root = super::current_dir()?;
    let config = config::load()?;
    let project = project::resolve_from(&root, name.as_deref())?;

    let bundler = bundler::get_bundler(&config.bundler);
    super::build::ensure_available(bundler.as_ref())?;
    super::types::refresh(&project, &config.types, false)?;

    let stop = watch::install_signal_handlers();
    let mut session = WatchSession::open(project.root())?;

    println!(
        "👀 Watching {} (Ctrl+C to stop)",
        project.root().display()
    );

    let mut coordinator = WatchCoordinator::new(project, bundler.as_ref());
    coordinator.run(&session, stop, POLL_INTERVAL, &mut print_event);

    watch::shutdown(&mut [&mut session]);
    println!("\nStopped watching");
    Ok(())
}

fn print_event(event: WatchEvent) {
    let stamp = chrono::Local::now().format("%H:%M:%S");
    match event {
        WatchEvent::Start => {
            println!("{}", format!("[{stamp}] Building...").dimmed());
        }
        WatchEvent::End(report) => {
            println!(
                "{}",
                format!(
                    "[{stamp}] ✓ {} ({})",
                    report.output.display(),
                    human_size(report.bytes)
                )
                .green()
            );
        }
        WatchEvent::Error(message) => {
            println!("{}", format!("[{stamp}] ✗ {message}").red());
        }
    }
}
