//! Boot loader: running kernel command line and GRUB defaults

use super::capture::{self, Artifact};
use super::{Category, Probe, ProbeContext, ProbeResult};

const CMDLINE: Artifact<'static> = Artifact::new(Category::Grub, "cmdline.txt", "kernel command line");
const DEFAULTS: Artifact<'static> = Artifact::new(Category::Grub, "grub.txt", "GRUB");
const DROP_INS: Artifact<'static> = Artifact::new(Category::Grub, "grub.d.txt", "GRUB");

pub struct GrubProbe;

impl Probe for GrubProbe {
    fn name(&self) -> &'static str {
        "grub"
    }

    fn collect(&self, ctx: &ProbeContext<'_>) -> Vec<ProbeResult> {
        vec![
            capture::file(ctx, &CMDLINE, "/proc/cmdline"),
            capture::file(ctx, &DEFAULTS, "/etc/default/grub"),
            capture::concat(ctx, &DROP_INS, &["/etc/default/grub.d"]),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ScriptedHost;
    use crate::probes::test_support::context_for;

    #[test]
    fn test_grub_without_drop_ins() {
        let host = ScriptedHost::new()
            .with_file("/proc/cmdline", b"BOOT_IMAGE=/vmlinuz root=/dev/sda1 ro\n")
            .with_file("/etc/default/grub", b"GRUB_CMDLINE_LINUX=\"\"\n");
        let (tools, scratch) = context_for(&host);
        let ctx = ProbeContext {
            host: &host,
            tools: &tools,
            scratch: scratch.path(),
        };
        let results = GrubProbe.collect(&ctx);

        let flags: Vec<(&str, bool)> = results
            .iter()
            .map(|r| (r.artifact.as_str(), r.content.is_placeholder()))
            .collect();
        assert_eq!(
            flags,
            vec![("cmdline.txt", false), ("grub.txt", false), ("grub.d.txt", true)]
        );
    }
}
