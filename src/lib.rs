pub mod build;
pub mod bundler;
pub mod config;
pub mod header;
pub mod metadata;
pub mod paths;
pub mod project;
pub mod typedefs;
pub mod watch;

// Re-export commonly used types
pub use metadata::ProjectMetadata;
pub use project::Project;
