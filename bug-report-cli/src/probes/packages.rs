//! Installed packages and enabled repositories

use super::capture::{self, Artifact};
use super::{Category, Probe, ProbeContext, ProbeResult};
use crate::host::Invocation;

const DPKG: Artifact<'static> = Artifact::new(Category::ReposAndPackages, "dpkg.txt", "package");
const SOURCES: Artifact<'static> =
    Artifact::new(Category::ReposAndPackages, "apt-sources.txt", "repository");

pub struct PackagesProbe;

impl Probe for PackagesProbe {
    fn name(&self) -> &'static str {
        "repos-and-packages"
    }

    fn collect(&self, ctx: &ProbeContext<'_>) -> Vec<ProbeResult> {
        vec![
            capture::spooled(ctx, &DPKG, &Invocation::new("dpkg").arg("-l")),
            capture::concat(
                ctx,
                &SOURCES,
                &["/etc/apt/sources.list", "/etc/apt/sources.list.d"],
            ),
        ]
    }
}
