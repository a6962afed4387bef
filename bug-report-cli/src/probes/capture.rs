//! Capture helpers shared by every probe
//!
//! All placeholder substitution happens here. Output counts as missing when
//! the command could not be started, the tool was resolved as unavailable,
//! or stdout is blank. A non-zero exit with real output is kept verbatim:
//! several tools (smartctl, ipmitool) report findings through exit bits.

use super::{Category, Content, ProbeContext, ProbeResult};
use crate::host::{CommandOutput, Invocation};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};

/// Where an artifact lands and what its placeholder talks about
#[derive(Debug, Clone, Copy)]
pub struct Artifact<'a> {
    pub category: Category,
    pub name: &'a str,
    pub subject: &'a str,
}

impl<'a> Artifact<'a> {
    pub const fn new(category: Category, name: &'a str, subject: &'a str) -> Self {
        Self {
            category,
            name,
            subject,
        }
    }

    pub fn unavailable(&self) -> ProbeResult {
        ProbeResult::unavailable(self.category, self.name, self.subject)
    }

    /// Captured bytes, or the placeholder when they are blank
    pub fn with_bytes(&self, bytes: Vec<u8>, exit_status: Option<i32>) -> ProbeResult {
        let content = if is_blank(&bytes) {
            Content::Unavailable {
                subject: self.subject.to_string(),
            }
        } else {
            Content::Captured(bytes)
        };
        ProbeResult {
            category: self.category,
            artifact: self.name.to_string(),
            content,
            exit_status,
        }
    }

    /// Turn a command outcome into a result, taking ownership of stdout
    pub fn from_output(&self, output: std::io::Result<CommandOutput>) -> ProbeResult {
        match output {
            Ok(out) => self.with_bytes(out.stdout, out.status),
            Err(e) => {
                tracing::debug!(artifact = self.name, error = %e, "command did not start");
                self.unavailable()
            }
        }
    }
}

pub fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}

/// Run a command and capture its stdout
pub fn command(ctx: &ProbeContext<'_>, artifact: &Artifact<'_>, invocation: &Invocation) -> ProbeResult {
    artifact.from_output(ctx.host.run(invocation))
}

/// Run a command whose output may be arbitrarily large, streaming stdout
/// into scratch space. The blank-output rule is applied to the file.
pub fn spooled(ctx: &ProbeContext<'_>, artifact: &Artifact<'_>, invocation: &Invocation) -> ProbeResult {
    let path = ctx
        .scratch
        .join(format!("{}.{}", artifact.category, artifact.name));

    let status = match ctx.host.run_to_file(invocation, &path) {
        Ok(status) => status,
        Err(e) => {
            tracing::debug!(artifact = artifact.name, error = %e, "command did not start");
            let _ = fs::remove_file(&path);
            return artifact.unavailable();
        }
    };

    match is_blank_file(&path) {
        Ok(false) => ProbeResult {
            category: artifact.category,
            artifact: artifact.name.to_string(),
            content: Content::Spooled(path),
            exit_status: status,
        },
        Ok(true) | Err(_) => {
            let _ = fs::remove_file(&path);
            ProbeResult {
                exit_status: status,
                ..artifact.unavailable()
            }
        }
    }
}

/// Stops at the first non-whitespace byte
fn is_blank_file(path: &Path) -> std::io::Result<bool> {
    let mut reader = BufReader::new(File::open(path)?);
    loop {
        let chunk = reader.fill_buf()?;
        if chunk.is_empty() {
            return Ok(true);
        }
        if !is_blank(chunk) {
            return Ok(false);
        }
        let len = chunk.len();
        reader.consume(len);
    }
}

/// Like [`command`], but only when the resolver made `tool` available
pub fn tool_command(
    ctx: &ProbeContext<'_>,
    tool: &str,
    artifact: &Artifact<'_>,
    invocation: &Invocation,
) -> ProbeResult {
    if ctx.tools.is_available(tool) {
        command(ctx, artifact, invocation)
    } else {
        tracing::debug!(tool, artifact = artifact.name, "tool unavailable, writing placeholder");
        artifact.unavailable()
    }
}

/// Read a file, retrying through a privileged `cat` when access is denied
pub fn read(ctx: &ProbeContext<'_>, path: &Path) -> Option<Vec<u8>> {
    match ctx.host.read_file(path) {
        Ok(bytes) => Some(bytes),
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            let output = ctx
                .host
                .run(&Invocation::new("cat").arg(path.display().to_string()).privileged())
                .ok()?;
            output.success().then_some(output.stdout)
        }
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "unreadable");
            None
        }
    }
}

/// Copy a single file verbatim
pub fn file(ctx: &ProbeContext<'_>, artifact: &Artifact<'_>, path: &str) -> ProbeResult {
    match read(ctx, Path::new(path)) {
        Some(bytes) => artifact.with_bytes(bytes, None),
        None => artifact.unavailable(),
    }
}

/// Concatenate files and the direct entries of directories, each preceded by
/// a `==> path <==` header. Missing sources are silently left out.
pub fn concat(ctx: &ProbeContext<'_>, artifact: &Artifact<'_>, sources: &[&str]) -> ProbeResult {
    let mut combined = Vec::new();
    for source in sources {
        for path in expand(ctx, Path::new(source)) {
            let Some(bytes) = read(ctx, &path) else {
                continue;
            };
            if is_blank(&bytes) {
                continue;
            }
            if !combined.is_empty() {
                combined.push(b'\n');
            }
            combined.extend_from_slice(format!("==> {} <==\n", path.display()).as_bytes());
            combined.extend_from_slice(&bytes);
        }
    }
    artifact.with_bytes(combined, None)
}

/// A directory expands to its entries, anything else to itself
fn expand(ctx: &ProbeContext<'_>, path: &Path) -> Vec<PathBuf> {
    match ctx.host.list_dir(path) {
        Ok(entries) => entries,
        Err(_) => vec![path.to_path_buf()],
    }
}
