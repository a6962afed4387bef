//! Root-level system inventory: kernel, CPU, memory, buses, firmware,
//! sensors, InfiniBand and the GPU summary

use super::capture::{self, Artifact};
use super::{Category, Probe, ProbeContext, ProbeResult};
use crate::host::Invocation;

const fn root(name: &'static str, subject: &'static str) -> Artifact<'static> {
    Artifact::new(Category::Root, name, subject)
}

/// Commands that need nothing beyond base utilities
const BASIC: [(Artifact<'static>, &str, &[&str], bool); 8] = [
    (root("uname.txt", "kernel"), "uname", &["-a"], false),
    (root("lscpu.txt", "CPU"), "lscpu", &[], false),
    (root("free.txt", "memory"), "free", &["-h"], false),
    (root("lspci.txt", "PCI"), "lspci", &["-vvv"], true),
    (root("dmidecode.txt", "DMI"), "dmidecode", &[], true),
    (root("nvidia-smi.txt", "NVIDIA GPU"), "nvidia-smi", &["-q"], false),
    (root("uptime.txt", "uptime"), "uptime", &[], false),
    (root("top.txt", "process"), "top", &["-b", "-n", "1"], false),
];

/// Registry tools: (artifact, executable, args, privileged)
const REGISTRY_TOOLS: [(Artifact<'static>, &str, &[&str], bool); 3] = [
    (root("lshw.txt", "hardware inventory"), "lshw", &[], true),
    (root("sensors.txt", "sensor"), "sensors", &[], false),
    (root("ibstat.txt", "InfiniBand"), "ibstat", &[], false),
];

pub struct SystemProbe;

impl Probe for SystemProbe {
    fn name(&self) -> &'static str {
        "system"
    }

    fn collect(&self, ctx: &ProbeContext<'_>) -> Vec<ProbeResult> {
        let basic = BASIC.iter().map(|(artifact, program, args, privileged)| {
            capture::command(ctx, artifact, &invocation(program, args, *privileged))
        });
        let tools = REGISTRY_TOOLS
            .iter()
            .map(|(artifact, program, args, privileged)| {
                capture::tool_command(ctx, program, artifact, &invocation(program, args, *privileged))
            });
        basic.chain(tools).collect()
    }
}

fn invocation(program: &str, args: &[&str], privileged: bool) -> Invocation {
    let invocation = Invocation::new(program).args(args.iter().copied());
    if privileged {
        invocation.privileged()
    } else {
        invocation
    }
}
