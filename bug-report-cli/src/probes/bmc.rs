//! Baseboard management controller: event log and sensor repository

use super::capture::{self, Artifact};
use super::{Category, Probe, ProbeContext, ProbeResult};
use crate::host::Invocation;

const SEL: Artifact<'static> = Artifact::new(Category::BmcInfo, "ipmi-elist.txt", "IPMI");
const SDR: Artifact<'static> = Artifact::new(Category::BmcInfo, "ipmi-sdr.txt", "IPMI");

pub struct BmcProbe;

impl Probe for BmcProbe {
    fn name(&self) -> &'static str {
        "bmc"
    }

    fn collect(&self, ctx: &ProbeContext<'_>) -> Vec<ProbeResult> {
        [(&SEL, ["sel", "elist"]), (&SDR, ["sdr", "elist"])]
            .into_iter()
            .map(|(artifact, args)| {
                capture::tool_command(
                    ctx,
                    "ipmitool",
                    artifact,
                    &Invocation::new("ipmitool").args(args).privileged(),
                )
            })
            .collect()
    }
}
