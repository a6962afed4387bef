//! Environment detection
//! Classifies the host as physical hardware or a virtual machine

use crate::host::{Host, Invocation};
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Firmware manufacturer reported by hypervisor-backed guests
const HYPERVISOR_SIGNATURE: &str = "QEMU";

const SYS_VENDOR: &str = "/sys/class/dmi/id/sys_vendor";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentClass {
    Physical,
    Virtual,
}

impl fmt::Display for EnvironmentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvironmentClass::Physical => write!(f, "physical"),
            EnvironmentClass::Virtual => write!(f, "virtual"),
        }
    }
}

/// Detect the environment class of this host.
/// Never fails: anything unreadable counts as physical hardware.
pub fn detect(host: &dyn Host) -> EnvironmentClass {
    let class = read_manufacturer(host)
        .map(|manufacturer| classify(&manufacturer))
        .unwrap_or(EnvironmentClass::Physical);
    tracing::info!(environment = %class, "environment detected");
    class
}

/// Exact match only; "QEMU Virtual" or "qemu" are not the signature
pub fn classify(manufacturer: &str) -> EnvironmentClass {
    if manufacturer.trim() == HYPERVISOR_SIGNATURE {
        EnvironmentClass::Virtual
    } else {
        EnvironmentClass::Physical
    }
}

fn read_manufacturer(host: &dyn Host) -> Option<String> {
    if let Ok(bytes) = host.read_file(Path::new(SYS_VENDOR)) {
        return Some(String::from_utf8_lossy(&bytes).into_owned());
    }

    // Fallback: ask the SMBIOS decoder directly
    let output = host
        .run(
            &Invocation::new("dmidecode")
                .args(["-s", "system-manufacturer"])
                .privileged(),
        )
        .ok()?;
    if output.success() {
        Some(output.stdout_lossy())
    } else {
        tracing::debug!(status = ?output.status, "dmidecode could not report manufacturer");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ScriptedHost;

    #[test]
    fn test_classify_exact_signature() {
        assert_eq!(classify("QEMU\n"), EnvironmentClass::Virtual);
        assert_eq!(classify("QEMU"), EnvironmentClass::Virtual);
        assert_eq!(classify("qemu"), EnvironmentClass::Physical);
        assert_eq!(classify("Supermicro"), EnvironmentClass::Physical);
        assert_eq!(classify(""), EnvironmentClass::Physical);
    }

    #[test]
    fn test_detect_reads_sys_vendor() {
        let host = ScriptedHost::new().with_file(SYS_VENDOR, b"QEMU\n");
        assert_eq!(detect(&host), EnvironmentClass::Virtual);
    }

    #[test]
    fn test_detect_falls_back_to_dmidecode() {
        let host = ScriptedHost::new().with_output("dmidecode -s system-manufacturer", "QEMU\n");
        assert_eq!(detect(&host), EnvironmentClass::Virtual);
    }

    #[test]
    fn test_unreadable_firmware_means_physical() {
        let host = ScriptedHost::new();
        assert_eq!(detect(&host), EnvironmentClass::Physical);
    }
}
