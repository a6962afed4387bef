//! bug-report: one-shot diagnostic collector for GPU servers
//!
//! Gathers hardware, OS, network, GPU and storage state into a categorized
//! directory tree and ships it as a single `bug-report.tar.gz`. Missing
//! tools never abort a run; each gap becomes a placeholder artifact.

pub mod commands;
pub mod config;
/// Physical or virtual host
pub mod detection;
pub mod error;
pub mod host;
pub mod probes;
pub mod prompt;
/// Report tree, manifest and archive
pub mod report;
pub mod tools;

pub use config::{CollectOptions, InstallPolicy};
pub use detection::EnvironmentClass;
pub use error::{ReportError, Result};
