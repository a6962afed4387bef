//! Read-only inventory of registry tools on this host
//!
//! Backs `bug-report check`: reports presence and version of every tool
//! without installing anything.

use crate::host::{Host, Invocation};
use crate::tools::registry::{Registry, ToolRequirement};
use std::path::PathBuf;
use std::sync::LazyLock;

static VERSION: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"v?(\d+\.\d+(?:\.\d+)?)").expect("valid regex"));

/// Presence check for a single tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCheck {
    pub executable: String,
    pub package: Option<String>,
    pub vm_useful: bool,
    pub path: Option<PathBuf>,
    pub version: Option<String>,
}

impl ToolCheck {
    pub fn found(&self) -> bool {
        self.path.is_some()
    }
}

/// Check every registry tool, in registry order
pub fn check_tools(registry: &Registry, host: &dyn Host) -> Vec<ToolCheck> {
    registry
        .tools()
        .iter()
        .map(|tool| check_tool(tool, host))
        .collect()
}

fn check_tool(tool: &ToolRequirement, host: &dyn Host) -> ToolCheck {
    let path = host.find_executable(&tool.executable);
    let version = path
        .as_ref()
        .and_then(|_| get_version(tool, host));

    ToolCheck {
        executable: tool.executable.clone(),
        package: tool.package.clone(),
        vm_useful: tool.vm_useful,
        path,
        version,
    }
}

/// Tools disagree on where they print their version, so look at both streams
fn get_version(tool: &ToolRequirement, host: &dyn Host) -> Option<String> {
    let output = host
        .run(&Invocation::new(&tool.executable).args(tool.version_args.iter().cloned()))
        .ok()?;
    extract_version(&output.stdout_lossy())
        .or_else(|| extract_version(&String::from_utf8_lossy(&output.stderr)))
}

/// Extract a dotted version from tool banner output
///   "smartctl 7.2 2020-12-30 r5155" -> "7.2"
///   "sysstat version 12.5.2" -> "12.5.2"
///   "ipmitool version 1.8.18" -> "1.8.18"
fn extract_version(output: &str) -> Option<String> {
    VERSION
        .captures(output)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
}
