//! Internal implementation for build module

use anyhow::Result;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::bundler::{BundleRequest, Bundler};
use crate::header;
use crate::metadata;
use crate::project::{Project, ProjectError};

/// What one successful build produced
#[derive(Debug, Clone, PartialEq)]
pub struct BuildReport {
    pub output: PathBuf,
    /// Size of the bundle in bytes
    pub bytes: u64,
    /// `updatedAt` stamped for this build
    pub updated_at: i64,
    /// Descriptor text persisted after the build, `None` if the write failed
    pub descriptor: Option<String>,
}

pub fn build(project: &mut Project, bundler: &dyn Bundler) -> Result<BuildReport> {
    build_at(project, bundler, metadata::now())
}

pub fn build_at(project: &mut Project, bundler: &dyn Bundler, now: i64) -> Result<BuildReport> {
    let entry = project.entry_point();
    if !entry.exists() {
        return Err(ProjectError::MissingEntryPoint(entry).into());
    }

    // Stamp first so the header carries this build's time
    project.meta.touch(now);

    let header = header::render(&project.meta)?;
    let output = project.output_path();
    debug!(
        bundler = bundler.name(),
        entry = %entry.display(),
        output = %output.display(),
        "bundling"
    );

    let bundled = bundler.bundle(&BundleRequest {
        entry: &entry,
        output: &output,
        header: &header,
    })?;

    // The bundle exists; a failed descriptor write is retried next build
    let descriptor = match project.save() {
        Ok(text) => Some(text),
        Err(e) => {
            warn!(
                path = %project.descriptor_path().display(),
                error = %format!("{:#}", e),
                "failed to persist project metadata"
            );
            None
        }
    };

    Ok(BuildReport {
        output,
        bytes: bundled.bytes,
        updated_at: project.meta.updated_at,
        descriptor,
    })
}

/// Human-readable byte count (`512 B`, `1.5 KiB`, `2.0 MiB`)
pub fn human_size(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;

    let b = bytes as f64;
    if b >= MIB {
        format!("{:.1} MiB", b / MIB)
    } else if b >= KIB {
        format!("{:.1} KiB", b / KIB)
    } else {
        format!("{} B", bytes)
    }
}
