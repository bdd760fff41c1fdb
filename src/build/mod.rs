//! Build module - one compile-and-bundle cycle
//!
//! # Process
//!
//! 1. **Stamp**: `updatedAt` is set to now (never moving backwards)
//! 2. **Bundle**: the bundler runs on `src/index.ts` with the rendered header
//! 3. **Persist**: the descriptor is rewritten; a failed write is logged only
//! 4. **Report**: output path and size are returned for display
//!
//! A bundler error aborts before step 3, so nothing is persisted for a
//! failed build.

mod internal;

use anyhow::Result;

use crate::bundler::Bundler;
use crate::project::Project;

pub use internal::{human_size, BuildReport};

/// Run one build cycle, stamping with the current time
pub fn build(project: &mut Project, bundler: &dyn Bundler) -> Result<BuildReport> {
    internal::build(project, bundler)
}

/// Run one build cycle with an explicit `now` (epoch seconds)
pub fn build_at(project: &mut Project, bundler: &dyn Bundler, now: i64) -> Result<BuildReport> {
    internal::build_at(project, bundler, now)
}
