//! Package installation for missing diagnostic tools

use crate::host::{Host, Invocation};
use anyhow::{Context, Result};

/// Installs packages on the host
pub trait PackageManager {
    /// Refresh the package index. Callers decide how often this happens.
    fn refresh(&mut self) -> Result<()>;

    fn install(&mut self, package: &str) -> Result<()>;
}

/// apt-get driven through the host, escalated through sudo when needed
pub struct Apt<'h> {
    host: &'h dyn Host,
}

impl<'h> Apt<'h> {
    pub fn new(host: &'h dyn Host) -> Self {
        Self { host }
    }
}

impl PackageManager for Apt<'_> {
    fn refresh(&mut self) -> Result<()> {
        run_command(self.host, &apt_get(["update"]))
    }

    fn install(&mut self, package: &str) -> Result<()> {
        run_command(self.host, &apt_get(["install", "-y", package]))
    }
}

fn apt_get<'a>(args: impl IntoIterator<Item = &'a str>) -> Invocation {
    Invocation::new("apt-get")
        .args(args)
        .env("DEBIAN_FRONTEND", "noninteractive")
        .privileged()
}

/// Run a command and check for success
fn run_command(host: &dyn Host, invocation: &Invocation) -> Result<()> {
    let output = host
        .run(invocation)
        .with_context(|| format!("Failed to execute: {}", invocation.command_line()))?;

    if !output.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!(
            "Command failed ({}): {} {}",
            output
                .status
                .map_or_else(|| "signal".to_string(), |code| format!("exit {code}")),
            invocation.command_line(),
            stderr.trim()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ScriptedHost;

    #[test]
    fn test_apt_install_is_noninteractive_and_privileged() {
        let host = ScriptedHost::new().with_package("sysstat", &["iostat"]);
        let mut apt = Apt::new(&host);
        apt.install("sysstat").unwrap();

        let runs = host.invocations();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].command_line(), "apt-get install -y sysstat");
        assert!(runs[0].privileged);
        assert!(
            runs[0]
                .env
                .contains(&("DEBIAN_FRONTEND".to_string(), "noninteractive".to_string()))
        );
    }

    #[test]
    fn test_failed_install_reports_stderr() {
        let host = ScriptedHost::new().with_package("sysstat", &["iostat"]);
        let mut apt = Apt::new(&host);
        let err = apt.install("ipmitool").unwrap_err();
        assert!(err.to_string().contains("Unable to locate package ipmitool"));
    }

    #[test]
    fn test_missing_apt_is_an_error() {
        let host = ScriptedHost::new();
        let mut apt = Apt::new(&host);
        assert!(apt.refresh().is_err());
    }
}
