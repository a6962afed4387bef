//! Requirement resolver
//!
//! Decides, per registry tool, whether to use what is already installed,
//! install it, or go without. Two axes drive the decision: whether installing
//! is authorized at all, and whether the tool is worth having on this class
//! of machine. The registry is never mutated; decisions come back as a
//! separate [`Resolution`].

use crate::detection::EnvironmentClass;
use crate::host::Host;
use crate::tools::installer::PackageManager;
use crate::tools::registry::{Registry, ToolRequirement};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    UseExisting,
    Install,
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Unknown,
    Available,
    Unavailable,
}

/// Why a tool ended up unavailable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NotAuthorized,
    NotUsefulOnVirtual,
    NotInstallable,
    InstallFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTool {
    pub executable: String,
    pub package: Option<String>,
    pub decision: Decision,
    pub availability: Availability,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<SkipReason>,
}

/// Outcome of resolving every registry tool, in registry order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
    tools: Vec<ResolvedTool>,
}

impl Resolution {
    pub fn tools(&self) -> &[ResolvedTool] {
        &self.tools
    }

    pub fn get(&self, executable: &str) -> Option<&ResolvedTool> {
        self.tools.iter().find(|t| t.executable == executable)
    }

    /// `Unknown` for anything the resolver never saw
    pub fn availability(&self, executable: &str) -> Availability {
        self.get(executable)
            .map_or(Availability::Unknown, |t| t.availability)
    }

    pub fn is_available(&self, executable: &str) -> bool {
        self.availability(executable) == Availability::Available
    }

    pub fn decisions(&self) -> BTreeMap<String, Decision> {
        self.tools
            .iter()
            .map(|t| (t.executable.clone(), t.decision))
            .collect()
    }
}

/// Resolve every tool in the registry.
///
/// The package index is refreshed at most once per call, and only if at
/// least one tool actually needs installing.
pub fn resolve(
    registry: &Registry,
    env: EnvironmentClass,
    install_authorized: bool,
    host: &dyn Host,
    packages: &mut dyn PackageManager,
) -> Resolution {
    let mut refreshed = false;
    let mut tools = Vec::with_capacity(registry.tools().len());

    for tool in registry.tools() {
        let entry = match plan(tool, env, install_authorized, host) {
            Plan::Settled(decision, availability, reason) => {
                resolved(tool, decision, availability, reason)
            }
            Plan::Install(package) => {
                if !refreshed {
                    refreshed = true;
                    println!("🔄 Refreshing package index...");
                    if let Err(e) = packages.refresh() {
                        tracing::warn!(error = %e, "package index refresh failed; installing anyway");
                    }
                }

                println!("🔧 Installing {package} (for {})...", tool.executable);
                match packages.install(package) {
                    Ok(()) => {
                        println!("  ✅ {} installed", tool.executable);
                        resolved(tool, Decision::Install, Availability::Available, None)
                    }
                    Err(e) => {
                        eprintln!("  ❌ Failed to install {}: {e:#}", tool.executable);
                        tracing::warn!(tool = %tool.executable, error = %e, "install failed");
                        resolved(
                            tool,
                            Decision::Install,
                            Availability::Unavailable,
                            Some(SkipReason::InstallFailed),
                        )
                    }
                }
            }
        };

        tracing::info!(
            tool = %entry.executable,
            decision = ?entry.decision,
            availability = ?entry.availability,
            "tool resolved"
        );
        tools.push(entry);
    }

    Resolution { tools }
}

enum Plan<'a> {
    Settled(Decision, Availability, Option<SkipReason>),
    Install(&'a str),
}

/// Everything short of actually installing
fn plan<'a>(
    tool: &'a ToolRequirement,
    env: EnvironmentClass,
    install_authorized: bool,
    host: &dyn Host,
) -> Plan<'a> {
    if host.find_executable(&tool.executable).is_some() {
        return Plan::Settled(Decision::UseExisting, Availability::Available, None);
    }

    let skip = |reason| Plan::Settled(Decision::Skip, Availability::Unavailable, Some(reason));

    if !install_authorized {
        return skip(SkipReason::NotAuthorized);
    }
    if env == EnvironmentClass::Virtual && !tool.vm_useful {
        return skip(SkipReason::NotUsefulOnVirtual);
    }
    match tool.package.as_deref() {
        Some(package) => Plan::Install(package),
        None => skip(SkipReason::NotInstallable),
    }
}

fn resolved(
    tool: &ToolRequirement,
    decision: Decision,
    availability: Availability,
    reason: Option<SkipReason>,
) -> ResolvedTool {
    ResolvedTool {
        executable: tool.executable.clone(),
        package: tool.package.clone(),
        decision,
        availability,
        reason,
    }
}
