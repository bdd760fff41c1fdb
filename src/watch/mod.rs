//! Watch module - rebuild a project whenever its sources change
//!
//! A [`WatchSession`] observes one project root; a [`WatchCoordinator`]
//! turns debounced changes into sequential build cycles.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use scriptpack::{bundler, config, project, watch};
//!
//! let config = config::load()?;
//! let bundler = bundler::get_bundler(&config.bundler);
//! let project = project::resolve(std::path::Path::new("."))?;
//!
//! let stop = watch::install_signal_handlers();
//! let mut session = watch::WatchSession::open(project.root())?;
//! let mut coordinator = watch::WatchCoordinator::new(project, bundler.as_ref());
//! coordinator.run(&session, stop, Duration::from_millis(250), &mut |event| {
//!     println!("{:?}", event);
//! });
//! watch::shutdown(&mut [&mut session]);
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! # Cycle
//!
//! - **Start**: the descriptor is re-read from disk, so hand edits made
//!   while watching reach the next header
//! - **End**: the build is stamped and persisted
//! - **Error**: reported, the session stays alive
//!
//! Changes arriving mid-build are folded into one follow-up cycle, and the
//! coordinator's own descriptor writes never trigger a rebuild.

mod internal;

pub use internal::{
    install_signal_handlers, should_ignore_path, shutdown, Wait, WatchCoordinator, WatchEvent,
    WatchSession, WatchState,
};
