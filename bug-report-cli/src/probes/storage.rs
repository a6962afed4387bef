//! Drives and storage: block devices, SMART, filesystems, I/O, RAID

use super::capture::{self, Artifact};
use super::{Category, Probe, ProbeContext, ProbeResult};
use crate::host::Invocation;

const CATEGORY: Category = Category::DrivesAndStorage;

const LSBLK: Artifact<'static> = Artifact::new(CATEGORY, "lsblk.txt", "block device");
const SMART: Artifact<'static> = Artifact::new(CATEGORY, "smartctl.txt", "SMART");
const FSTAB: Artifact<'static> = Artifact::new(CATEGORY, "fstab.txt", "fstab");
const MOUNT: Artifact<'static> = Artifact::new(CATEGORY, "mount.txt", "mount");
const DF: Artifact<'static> = Artifact::new(CATEGORY, "df.txt", "disk usage");
const IOSTAT: Artifact<'static> = Artifact::new(CATEGORY, "iostat.txt", "I/O statistics");
const MDSTAT: Artifact<'static> = Artifact::new(CATEGORY, "mdstat.txt", "RAID");

pub struct StorageProbe;

impl Probe for StorageProbe {
    fn name(&self) -> &'static str {
        "storage"
    }

    fn collect(&self, ctx: &ProbeContext<'_>) -> Vec<ProbeResult> {
        let mut results = vec![capture::command(
            ctx,
            &LSBLK,
            &Invocation::new("lsblk").args(["-o", "NAME,SIZE,TYPE,FSTYPE,MOUNTPOINT,MODEL,SERIAL"]),
        )];

        results.extend(smart_reports(ctx));

        results.push(capture::file(ctx, &FSTAB, "/etc/fstab"));
        results.push(capture::command(ctx, &MOUNT, &Invocation::new("mount")));
        results.push(capture::command(ctx, &DF, &Invocation::new("df").arg("-h")));
        results.push(capture::tool_command(
            ctx,
            "iostat",
            &IOSTAT,
            &Invocation::new("iostat").arg("-xt"),
        ));
        results.push(capture::file(ctx, &MDSTAT, "/proc/mdstat"));
        results
    }
}

/// One self-test dump per whole disk, or a single placeholder
fn smart_reports(ctx: &ProbeContext<'_>) -> Vec<ProbeResult> {
    if !ctx.tools.is_available("smartctl") {
        return vec![SMART.unavailable()];
    }

    let disks = match ctx
        .host
        .run(&Invocation::new("lsblk").args(["-dno", "NAME,TYPE"]))
    {
        Ok(out) if out.success() => whole_disks(&out.stdout_lossy()),
        _ => Vec::new(),
    };
    if disks.is_empty() {
        return vec![SMART.unavailable()];
    }

    disks
        .iter()
        .map(|disk| {
            let name = format!("smartctl-{disk}.txt");
            let artifact = Artifact::new(CATEGORY, &name, SMART.subject);
            capture::command(
                ctx,
                &artifact,
                &Invocation::new("smartctl")
                    .args(["-x".to_string(), format!("/dev/{disk}")])
                    .privileged(),
            )
        })
        .collect()
}

/// Device names from `lsblk -dno NAME,TYPE` whose type is `disk`
fn whole_disks(listing: &str) -> Vec<String> {
    listing
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            match (fields.next(), fields.next()) {
                (Some(name), Some("disk")) => Some(name.to_string()),
                _ => None,
            }
        })
        .collect()
}
