//! End-to-end build cycles with an in-process bundler

use anyhow::Result;
use scriptpack::build;
use scriptpack::bundler::{BundleOutput, BundleRequest, Bundler};
use scriptpack::header;
use scriptpack::metadata;
use scriptpack::project::{self, NewProject};
use std::fs;
use tempfile::TempDir;

/// Emits header + entry source
struct ConcatBundler;

impl Bundler for ConcatBundler {
    fn name(&self) -> &'static str {
        "concat"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn bundle(&self, request: &BundleRequest<'_>) -> Result<BundleOutput> {
        let text = format!("{}{}", request.header, fs::read_to_string(request.entry)?);
        fs::create_dir_all(request.output.parent().unwrap())?;
        fs::write(request.output, &text)?;
        Ok(BundleOutput {
            bytes: text.len() as u64,
        })
    }
}

#[test]
fn test_consecutive_builds_advance_updated_at_only() {
    let tmp = TempDir::new().unwrap();
    let mut project = project::create(
        tmp.path(),
        NewProject {
            name: "Daily Report".to_string(),
            ..Default::default()
        },
    )
    .unwrap();

    let id = project.meta.id.clone();
    let created_at = project.meta.created_at;

    let first = build::build_at(&mut project, &ConcatBundler, created_at + 5).unwrap();
    project.reload().unwrap();
    let second = build::build_at(&mut project, &ConcatBundler, created_at + 65).unwrap();
    project.reload().unwrap();

    assert!(second.updated_at > first.updated_at);
    assert_eq!(project.meta.id, id);
    assert_eq!(project.meta.created_at, created_at);
    assert_eq!(project.meta.updated_at, created_at + 65);
    assert_eq!(first.output, tmp.path().join("daily-report/dist/daily-report.js").canonicalize().unwrap());
}

#[test]
fn test_bundle_header_round_trips_through_import() {
    let tmp = TempDir::new().unwrap();
    let mut project = project::create(
        tmp.path(),
        NewProject {
            name: "notifier".to_string(),
            author: Some("Ada".to_string()),
            description: Some("Sends\nnotifications".to_string()),
            license: Some("MIT".to_string()),
        },
    )
    .unwrap();

    let report = build::build(&mut project, &ConcatBundler).unwrap();
    let bundle = fs::read_to_string(&report.output).unwrap();
    assert!(bundle.starts_with(header::HEADER_OPEN));

    // Importing the built script elsewhere keeps its identity
    let elsewhere = tmp.path().join("imported");
    fs::create_dir(&elsewhere).unwrap();
    let imported = project::import(&elsewhere, &report.output).unwrap();

    assert_eq!(imported.meta.id, project.meta.id);
    assert_eq!(imported.meta.created_at, project.meta.created_at);
    assert_eq!(imported.meta.description, "Sends\nnotifications License: MIT");
    assert!(!fs::read_to_string(imported.entry_point())
        .unwrap()
        .contains(header::HEADER_OPEN));
    assert_eq!(metadata::load_or_default(imported.root()).unwrap(), imported.meta);
}
