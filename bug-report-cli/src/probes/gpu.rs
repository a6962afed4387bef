//! NVIDIA GPU collection
//!
//! The vendor bug-report script is its own probe because it is by far the
//! slowest step and is scheduled first. The counter probe pulls remapped
//! rows, ECC totals and board identifiers through `nvidia-smi` queries.

use super::capture::{self, Artifact};
use super::{Category, Probe, ProbeContext, ProbeResult};
use crate::host::Invocation;

const GPU_SUBJECT: &str = "NVIDIA GPU";

const VENDOR_REPORT: Artifact<'static> =
    Artifact::new(Category::Root, "nvidia-bug-report.log.gz", GPU_SUBJECT);
const VENDOR_SCRIPT: &str = "nvidia-bug-report.sh";

const REMAPPED_ROWS: Artifact<'static> =
    Artifact::new(Category::GpuMemoryErrors, "remapped-rows.txt", GPU_SUBJECT);
const ECC_ERRORS: Artifact<'static> =
    Artifact::new(Category::GpuMemoryErrors, "ecc-errors.txt", GPU_SUBJECT);
const SERIALS: Artifact<'static> =
    Artifact::new(Category::GpuMemoryErrors, "gpu-serials.txt", GPU_SUBJECT);

const REMAPPED_ROW_FIELDS: &str = "gpu_bus_id,gpu_serial,remapped_rows.correctable,\
remapped_rows.uncorrectable,remapped_rows.pending,remapped_rows.failure";
const ECC_FIELDS: &str = "index,pci.bus_id,serial,\
ecc.errors.corrected.volatile.total,ecc.errors.uncorrected.volatile.total,\
ecc.errors.corrected.aggregate.total,ecc.errors.uncorrected.aggregate.total";
const SERIAL_FIELDS: &str = "index,name,serial,uuid,pci.bus_id";

/// Runs `nvidia-bug-report.sh` into scratch space and keeps the gzip
pub struct VendorBugReport;

impl Probe for VendorBugReport {
    fn name(&self) -> &'static str {
        "gpu-vendor-bug-report"
    }

    fn collect(&self, ctx: &ProbeContext<'_>) -> Vec<ProbeResult> {
        if ctx.host.find_executable(VENDOR_SCRIPT).is_none() {
            return vec![VENDOR_REPORT.unavailable()];
        }

        // The script appends .gz to whatever name it is given
        let base = ctx.scratch.join("nvidia-bug-report.log");
        let output = ctx.host.run(
            &Invocation::new(VENDOR_SCRIPT)
                .args(["--output-file".to_string(), base.display().to_string()])
                .privileged(),
        );
        let status = match &output {
            Ok(out) => out.status,
            Err(e) => {
                tracing::warn!(error = %e, "vendor bug report did not start");
                return vec![VENDOR_REPORT.unavailable()];
            }
        };

        let produced = base.with_extension("log.gz");
        match capture::read(ctx, &produced) {
            Some(bytes) => vec![VENDOR_REPORT.with_bytes(bytes, status)],
            None => {
                tracing::warn!(status = ?status, "vendor bug report produced no file");
                vec![ProbeResult {
                    exit_status: status,
                    ..VENDOR_REPORT.unavailable()
                }]
            }
        }
    }
}

pub struct MemoryErrorsProbe;

impl Probe for MemoryErrorsProbe {
    fn name(&self) -> &'static str {
        "gpu-memory-errors"
    }

    fn collect(&self, ctx: &ProbeContext<'_>) -> Vec<ProbeResult> {
        vec![
            capture::command(ctx, &REMAPPED_ROWS, &query("--query-remapped-rows", REMAPPED_ROW_FIELDS)),
            capture::command(ctx, &ECC_ERRORS, &query("--query-gpu", ECC_FIELDS)),
            capture::command(ctx, &SERIALS, &query("--query-gpu", SERIAL_FIELDS)),
        ]
    }
}

fn query(kind: &str, fields: &str) -> Invocation {
    Invocation::new("nvidia-smi").args([format!("{kind}={fields}"), "--format=csv".to_string()])
}
