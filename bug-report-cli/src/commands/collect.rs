//! Default command: collect a full report
//!
//! registry -> environment -> install authorization -> tool resolution
//! -> probes -> archive

use crate::config::CollectOptions;
use crate::detection::{EnvironmentClass, detect};
use crate::error::Result;
use crate::host::Host;
use crate::prompt::Confirm;
use crate::report::Assembler;
use crate::tools::{Apt, Registry, resolve};
use std::path::{Path, PathBuf};

pub fn run_collect(
    options: &CollectOptions,
    host: &dyn Host,
    confirm: &mut dyn Confirm,
) -> Result<PathBuf> {
    println!("🐛 bug-report v{}", env!("CARGO_PKG_VERSION"));

    let registry = load_registry(options.registry.as_deref())?;
    let environment = detect(host);
    println!("🖥️  Environment: {environment}");

    let wanted = installable_missing(&registry, environment, host);
    let authorized = if wanted.is_empty() {
        false
    } else {
        let question = format!("Install missing diagnostic tools ({})?", wanted.join(", "));
        options.install.authorize(confirm, &question)
    };
    tracing::info!(policy = ?options.install, authorized, "install authorization");

    let mut apt = Apt::new(host);
    let tools = resolve(&registry, environment, authorized, host, &mut apt);

    Assembler::new(host, &tools, environment).assemble(&options.work_dir, &options.output_dir)
}

pub fn load_registry(path: Option<&Path>) -> Result<Registry> {
    match path {
        Some(path) => Registry::load(path),
        None => Registry::builtin(),
    }
}

/// Packages worth asking about: absent tools that have a package and are
/// useful in this environment
fn installable_missing(
    registry: &Registry,
    environment: EnvironmentClass,
    host: &dyn Host,
) -> Vec<String> {
    registry
        .tools()
        .iter()
        .filter(|tool| host.find_executable(&tool.executable).is_none())
        .filter(|tool| environment == EnvironmentClass::Physical || tool.vm_useful)
        .filter_map(|tool| tool.package.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ScriptedHost;

    #[test]
    fn test_installable_missing_respects_environment() {
        let registry = Registry::builtin().unwrap();
        let host = ScriptedHost::new().with_executable("smartctl");

        let physical = installable_missing(&registry, EnvironmentClass::Physical, &host);
        assert_eq!(physical, vec!["ipmitool", "lm-sensors", "sysstat", "lshw"]);

        let virtual_only = installable_missing(&registry, EnvironmentClass::Virtual, &host);
        assert_eq!(virtual_only, vec!["sysstat", "lshw"]);
    }
}
