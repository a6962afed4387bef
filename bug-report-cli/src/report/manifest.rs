//! `manifest.json` at the root of every report
//!
//! Records when and where the report was taken, what the tool resolver
//! decided, and one line per artifact including whether it is a
//! placeholder.

use super::tree::WrittenArtifact;
use crate::detection::EnvironmentClass;
use crate::probes::{Category, Content, ProbeResult};
use crate::tools::ResolvedTool;
use serde::Serialize;

pub const MANIFEST_NAME: &str = "manifest.json";

#[derive(Debug, Serialize)]
pub struct Manifest<'a> {
    pub generated_at: String,
    pub generator: &'static str,
    pub version: &'static str,
    pub environment: EnvironmentClass,
    pub tools: &'a [ResolvedTool],
    pub artifacts: &'a [WrittenArtifact],
}

impl<'a> Manifest<'a> {
    pub fn new(
        environment: EnvironmentClass,
        tools: &'a [ResolvedTool],
        artifacts: &'a [WrittenArtifact],
    ) -> Self {
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            generator: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            environment,
            tools,
            artifacts,
        }
    }

    /// Render as a root-category artifact
    pub fn to_result(&self) -> serde_json::Result<ProbeResult> {
        let mut json = serde_json::to_vec_pretty(self)?;
        json.push(b'\n');
        Ok(ProbeResult {
            category: Category::Root,
            artifact: MANIFEST_NAME.to_string(),
            content: Content::Captured(json),
            exit_status: None,
        })
    }
}
