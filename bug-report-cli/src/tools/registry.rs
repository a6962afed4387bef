//! Tool requirement registry
//!
//! Declarative list of optional diagnostic tools. The built-in list is an
//! embedded TOML document; an operator may substitute their own file. Either
//! way the records are validated before anything else runs, and a bad record
//! stops the process.

use crate::error::{
    EmptyRegistrySnafu, InvalidToolSnafu, ParseRegistrySnafu, ReadRegistrySnafu, Result,
};
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, ensure};
use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

const BUILTIN_REGISTRY: &str = include_str!("registry.toml");

/// Debian package naming rule (policy manual §5.6.1)
static PACKAGE_NAME: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^[a-z0-9][a-z0-9+.\-]+$").expect("valid regex"));

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RegistryFile {
    #[serde(rename = "tool", default)]
    tools: Vec<ToolRequirement>,
}

/// One optional external tool
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ToolRequirement {
    /// Name looked up on the search path; unique within the registry
    pub executable: String,
    /// Package providing the executable. `None` means probe-only.
    #[serde(default)]
    pub package: Option<String>,
    /// Worth installing on a virtual machine
    pub vm_useful: bool,
    #[serde(default = "default_version_args")]
    pub version_args: Vec<String>,
}

fn default_version_args() -> Vec<String> {
    vec!["--version".to_string()]
}

impl ToolRequirement {
    pub fn is_installable(&self) -> bool {
        self.package.is_some()
    }
}

/// Validated, immutable registry
#[derive(Debug, Clone)]
pub struct Registry {
    tools: Vec<ToolRequirement>,
}

impl Registry {
    /// The list compiled into the binary
    pub fn builtin() -> Result<Self> {
        Self::from_toml(BUILTIN_REGISTRY, "built-in")
    }

    /// Load a replacement registry from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).context(ReadRegistrySnafu { path })?;
        Self::from_toml(&content, &path.display().to_string())
    }

    pub fn from_toml(content: &str, origin: &str) -> Result<Self> {
        let file: RegistryFile = toml::from_str(content).context(ParseRegistrySnafu { origin })?;
        let registry = Self { tools: file.tools };
        registry.validate(origin)?;
        tracing::debug!(origin, tools = registry.tools.len(), "tool registry loaded");
        Ok(registry)
    }

    fn validate(&self, origin: &str) -> Result<()> {
        ensure!(!self.tools.is_empty(), EmptyRegistrySnafu { origin });

        let mut seen = HashSet::new();
        for tool in &self.tools {
            let executable = tool.executable.as_str();
            ensure!(
                !executable.is_empty(),
                InvalidToolSnafu {
                    executable,
                    reason: "executable name is empty",
                }
            );
            ensure!(
                !executable.contains(|c: char| c.is_whitespace() || c == '/'),
                InvalidToolSnafu {
                    executable,
                    reason: "executable must be a bare name without whitespace or '/'",
                }
            );
            ensure!(
                seen.insert(executable),
                InvalidToolSnafu {
                    executable,
                    reason: "listed more than once",
                }
            );
            if let Some(package) = &tool.package {
                ensure!(
                    PACKAGE_NAME.is_match(package),
                    InvalidToolSnafu {
                        executable,
                        reason: format!("'{package}' is not a valid package name"),
                    }
                );
            }
        }
        Ok(())
    }

    /// Tools in declaration order
    pub fn tools(&self) -> &[ToolRequirement] {
        &self.tools
    }

    pub fn get(&self, executable: &str) -> Option<&ToolRequirement> {
        self.tools.iter().find(|tool| tool.executable == executable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;

    #[test]
    fn test_builtin_registry_shape() {
        let registry = Registry::builtin().unwrap();
        let summary: Vec<(&str, Option<&str>, bool)> = registry
            .tools()
            .iter()
            .map(|t| (t.executable.as_str(), t.package.as_deref(), t.vm_useful))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("smartctl", Some("smartmontools"), false),
                ("ipmitool", Some("ipmitool"), false),
                ("sensors", Some("lm-sensors"), false),
                ("iostat", Some("sysstat"), true),
                ("lshw", Some("lshw"), true),
                ("ibstat", None, false),
            ]
        );
        assert!(!registry.get("ibstat").unwrap().is_installable());
    }

    #[test]
    fn test_duplicate_executable_rejected() {
        let toml = r#"
            [[tool]]
            executable = "lshw"
            package = "lshw"
            vm_useful = true

            [[tool]]
            executable = "lshw"
            package = "lshw"
            vm_useful = true
        "#;
        let err = Registry::from_toml(toml, "test").unwrap_err();
        assert!(matches!(err, ReportError::InvalidTool { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_malformed_flag_rejected() {
        let toml = r#"
            [[tool]]
            executable = "smartctl"
            package = "smartmontools"
            vm_useful = "sometimes"
        "#;
        let err = Registry::from_toml(toml, "test").unwrap_err();
        assert!(matches!(err, ReportError::ParseRegistry { .. }));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let toml = r#"
            [[tool]]
            executable = "iostat"
            package = "sysstat"
            vm_useful = true
            status = "available"
        "#;
        assert!(Registry::from_toml(toml, "test").is_err());
    }

    #[test]
    fn test_bad_package_and_executable_names() {
        let bad_package = r#"
            [[tool]]
            executable = "iostat"
            package = "Sys Stat"
            vm_useful = true
        "#;
        assert!(Registry::from_toml(bad_package, "test").is_err());

        let bad_exe = r#"
            [[tool]]
            executable = "/usr/bin/iostat"
            package = "sysstat"
            vm_useful = true
        "#;
        assert!(Registry::from_toml(bad_exe, "test").is_err());
    }

    #[test]
    fn test_empty_registry_rejected() {
        let err = Registry::from_toml("", "test").unwrap_err();
        assert!(matches!(err, ReportError::EmptyRegistry { .. }));
    }

    #[test]
    fn test_version_args_default() {
        let toml = r#"
            [[tool]]
            executable = "lshw"
            package = "lshw"
            vm_useful = true
        "#;
        let registry = Registry::from_toml(toml, "test").unwrap();
        assert_eq!(registry.tools()[0].version_args, vec!["--version"]);
    }
}
