//! System logs: kernel ring, syslog files, package history, journal

use super::capture::{self, Artifact};
use super::{Category, Content, Probe, ProbeContext, ProbeResult};
use crate::host::Invocation;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

const CATEGORY: Category = Category::SystemLogs;

const DMESG: Artifact<'static> = Artifact::new(CATEGORY, "dmesg.txt", "kernel log");
const DMESG_ERRORS: Artifact<'static> = Artifact::new(CATEGORY, "dmesg-errors.txt", "kernel error");
const KERN_LOG: Artifact<'static> = Artifact::new(CATEGORY, "kern.log", "kernel log");
const BOOT_LOG: Artifact<'static> = Artifact::new(CATEGORY, "boot.log", "boot log");
const SYSLOG: Artifact<'static> = Artifact::new(CATEGORY, "syslog", "syslog");
const APT_HISTORY: Artifact<'static> =
    Artifact::new(CATEGORY, "apt-history.log", "package history");
const JOURNAL: Artifact<'static> = Artifact::new(CATEGORY, "journalctl.txt", "journal");

const APT_LOG_DIR: &str = "/var/log/apt";
const APT_HISTORY_BASE: &str = "history.log";

/// Kernel messages worth a second look during triage
static KERNEL_ERROR: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(
        r"(?i)error|fail|xid|nvrm|segfault|oops|panic|call trace|machine check|hardware error|timed out",
    )
    .expect("valid regex")
});

pub struct SystemLogsProbe;

impl Probe for SystemLogsProbe {
    fn name(&self) -> &'static str {
        "system-logs"
    }

    fn collect(&self, ctx: &ProbeContext<'_>) -> Vec<ProbeResult> {
        // One dmesg run feeds both the full ring and the filtered view
        let full = capture::spooled(ctx, &DMESG, &Invocation::new("dmesg").arg("-T").privileged());
        let errors = match &full.content {
            Content::Spooled(path) => match File::open(path).and_then(|f| kernel_errors(BufReader::new(f))) {
                Ok(lines) => DMESG_ERRORS.with_bytes(lines.into_bytes(), full.exit_status),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to filter kernel ring");
                    DMESG_ERRORS.unavailable()
                }
            },
            _ => ProbeResult {
                exit_status: full.exit_status,
                ..DMESG_ERRORS.unavailable()
            },
        };

        vec![
            full,
            capture::file(ctx, &KERN_LOG, "/var/log/kern.log"),
            capture::file(ctx, &BOOT_LOG, "/var/log/boot.log"),
            capture::file(ctx, &SYSLOG, "/var/log/syslog"),
            apt_history(ctx),
            errors,
            capture::spooled(
                ctx,
                &JOURNAL,
                &Invocation::new("journalctl").arg("--no-pager").privileged(),
            ),
        ]
    }
}

/// Lines of the kernel ring that look like trouble, read line by line
fn kernel_errors(mut dmesg: impl BufRead) -> std::io::Result<String> {
    let mut matched = String::new();
    let mut raw = Vec::new();
    loop {
        raw.clear();
        if dmesg.read_until(b'\n', &mut raw)? == 0 {
            return Ok(matched);
        }
        let line = String::from_utf8_lossy(&raw);
        let line = line.trim_end_matches(['\n', '\r']);
        if KERNEL_ERROR.is_match(line) {
            matched.push_str(line);
            matched.push('\n');
        }
    }
}

/// Package-manager history across logrotate segments, oldest first
fn apt_history(ctx: &ProbeContext<'_>) -> ProbeResult {
    let Ok(entries) = ctx.host.list_dir(Path::new(APT_LOG_DIR)) else {
        return APT_HISTORY.unavailable();
    };

    let mut segments: Vec<(u32, PathBuf)> = entries
        .into_iter()
        .filter_map(|path| {
            let name = path.file_name()?.to_str()?;
            rotation_index(name, APT_HISTORY_BASE).map(|index| (index, path.clone()))
        })
        .collect();
    // history.log.N with a larger N is older; the live file (0) is newest
    segments.sort_by(|a, b| b.0.cmp(&a.0));

    let mut merged = Vec::new();
    for (_, path) in segments {
        let Some(raw) = capture::read(ctx, &path) else {
            continue;
        };
        match decode_segment(&path, raw) {
            Ok(bytes) => {
                merged.extend_from_slice(&bytes);
                if !bytes.ends_with(b"\n") && !bytes.is_empty() {
                    merged.push(b'\n');
                }
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable log segment");
            }
        }
    }
    APT_HISTORY.with_bytes(merged, None)
}

/// `history.log` -> 0, `history.log.3` -> 3, `history.log.3.gz` -> 3
fn rotation_index(file_name: &str, base: &str) -> Option<u32> {
    let rest = file_name.strip_prefix(base)?;
    if rest.is_empty() {
        return Some(0);
    }
    let rest = rest.strip_prefix('.')?;
    let number = rest.strip_suffix(".gz").unwrap_or(rest);
    number.parse().ok()
}

fn decode_segment(path: &Path, raw: Vec<u8>) -> std::io::Result<Vec<u8>> {
    if path.extension().is_some_and(|ext| ext == "gz") {
        let mut decoded = Vec::new();
        MultiGzDecoder::new(raw.as_slice()).read_to_end(&mut decoded)?;
        Ok(decoded)
    } else {
        Ok(raw)
    }
}
