//! Report assembly
//!
//! One run of the collector:
//! - creates a private, owner-only working directory inside the given
//!   parent; leftovers of earlier runs are removed only when they carry this
//!   tool's marker and their owning process is gone. The parent itself and
//!   anything else in it are never touched.
//! - runs every probe in order and writes its artifacts into the tree
//! - writes `manifest.json` and packs the tree into a gzip tarball
//! - removes the working location on every exit path

pub mod archive;
pub mod manifest;
pub mod tree;

pub use archive::write_archive;
pub use manifest::{MANIFEST_NAME, Manifest};
pub use tree::{REPORT_DIR_NAME, ReportTree, WrittenArtifact};

use crate::detection::EnvironmentClass;
use crate::error::{ArchiveSnafu, Result, WorkingDirSnafu};
use crate::host::Host;
use crate::probes::{Probe, ProbeContext, standard_probes};
use crate::tools::Resolution;
use snafu::ResultExt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// File name of the delivered archive
pub const ARCHIVE_NAME: &str = "bug-report.tar.gz";

pub struct Assembler<'a> {
    host: &'a dyn Host,
    tools: &'a Resolution,
    environment: EnvironmentClass,
    probes: Vec<Box<dyn Probe>>,
}

impl<'a> Assembler<'a> {
    pub fn new(host: &'a dyn Host, tools: &'a Resolution, environment: EnvironmentClass) -> Self {
        Self {
            host,
            tools,
            environment,
            probes: standard_probes(),
        }
    }

    /// Replace the probe battery
    pub fn with_probes(mut self, probes: Vec<Box<dyn Probe>>) -> Self {
        self.probes = probes;
        self
    }

    /// Collect everything in a private directory under `work_parent` and
    /// archive it into `output_dir`. Returns the archive path.
    pub fn assemble(&self, work_parent: &Path, output_dir: &Path) -> Result<PathBuf> {
        let working = WorkingRoot::prepare(work_parent)
            .context(WorkingDirSnafu { path: work_parent })?;

        let mut tree =
            ReportTree::create(working.path()).context(WorkingDirSnafu { path: working.path() })?;
        let scratch = working.path().join("scratch");
        fs::create_dir_all(&scratch).context(WorkingDirSnafu { path: &scratch })?;

        let ctx = ProbeContext {
            host: self.host,
            tools: self.tools,
            scratch: &scratch,
        };

        let mut written = Vec::new();
        for probe in &self.probes {
            println!("🔍 Collecting {}...", probe.name());
            for result in probe.collect(&ctx) {
                let artifact = tree
                    .write(&result)
                    .context(WorkingDirSnafu { path: tree.category_dir(result.category) })?;
                written.push(artifact);
            }
        }

        let manifest = Manifest::new(self.environment, self.tools.tools(), &written)
            .to_result()
            .map_err(io::Error::other)
            .context(WorkingDirSnafu { path: tree.root() })?;
        tree.write(&manifest)
            .context(WorkingDirSnafu { path: tree.root() })?;

        let archive = output_dir.join(ARCHIVE_NAME);
        write_archive(tree.root(), &archive).context(ArchiveSnafu { path: &archive })?;

        print_summary(&written, &archive);
        Ok(archive)
    }
}

fn print_summary(written: &[WrittenArtifact], archive: &Path) {
    let placeholders = written.iter().filter(|a| a.placeholder).count();
    println!();
    println!("📦 Report archive: {}", archive.display());
    println!(
        "   {} artifacts collected, {} placeholders",
        written.len() - placeholders,
        placeholders
    );
}

/// Prefix of every working directory this tool creates
const WORK_PREFIX: &str = "bug-report-";
/// Written into each working directory; holds the owning process id
const WORK_MARKER: &str = ".bug-report-work";

/// Private working directory; removed when dropped
struct WorkingRoot {
    dir: Option<tempfile::TempDir>,
}

impl WorkingRoot {
    fn prepare(parent: &Path) -> io::Result<Self> {
        fs::create_dir_all(parent)?;
        remove_stale(parent);

        // tempfile creates the directory with mode 0700 and a random suffix
        let dir = tempfile::Builder::new().prefix(WORK_PREFIX).tempdir_in(parent)?;
        fs::write(dir.path().join(WORK_MARKER), std::process::id().to_string())?;
        tracing::debug!(path = %dir.path().display(), "working directory created");
        Ok(Self { dir: Some(dir) })
    }

    fn path(&self) -> &Path {
        self.dir.as_ref().map_or(Path::new(""), tempfile::TempDir::path)
    }
}

impl Drop for WorkingRoot {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                tracing::warn!(path = %path.display(), error = %e, "failed to remove working directory");
            }
        }
    }
}

/// Remove working directories left behind by interrupted runs
fn remove_stale(parent: &Path) {
    let Ok(entries) = fs::read_dir(parent) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let ours = entry.file_type().is_ok_and(|t| t.is_dir())
            && entry.file_name().to_string_lossy().starts_with(WORK_PREFIX);
        if !ours {
            continue;
        }
        let Some(owner) = marker_owner(&path) else {
            continue;
        };
        if process_alive(owner) {
            continue;
        }
        tracing::warn!(path = %path.display(), owner, "removing stale working directory");
        if let Err(e) = fs::remove_dir_all(&path) {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove stale working directory");
        }
    }
}

fn marker_owner(dir: &Path) -> Option<i32> {
    let marker = dir.join(WORK_MARKER);
    if !fs::symlink_metadata(&marker).is_ok_and(|m| m.is_file()) {
        return None;
    }
    fs::read_to_string(marker).ok()?.trim().parse().ok()
}

fn process_alive(pid: i32) -> bool {
    if pid <= 0 {
        return true;
    }
    // SAFETY: signal 0 performs only the existence and permission check
    let rc = unsafe { libc::kill(pid, 0) };
    rc == 0 || io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ScriptedHost;
    use crate::probes::{Category, ProbeResult};
    use crate::probes::test_support::context_for;

    struct Fixed;

    impl Probe for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn collect(&self, _ctx: &ProbeContext<'_>) -> Vec<ProbeResult> {
            vec![ProbeResult::unavailable(Category::BmcInfo, "ipmi-sdr.txt", "IPMI")]
        }
    }

    /// Working directories this tool left under `parent`
    fn leftovers(parent: &Path) -> Vec<PathBuf> {
        fs::read_dir(parent)
            .map(|entries| {
                entries
                    .map(|e| e.unwrap().path())
                    .filter(|p| p.file_name().unwrap().to_string_lossy().starts_with(WORK_PREFIX))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn test_assemble_archives_and_cleans_up() {
        let host = ScriptedHost::new();
        let (tools, _) = context_for(&host);
        let base = tempfile::tempdir().unwrap();
        let working = base.path().join("work");
        let output = base.path().join("out");
        fs::create_dir_all(&output).unwrap();

        let archive = Assembler::new(&host, &tools, EnvironmentClass::Physical)
            .with_probes(vec![Box::new(Fixed)])
            .assemble(&working, &output)
            .unwrap();

        assert_eq!(archive, output.join(ARCHIVE_NAME));
        assert!(archive.is_file());
        assert!(working.is_dir());
        assert!(leftovers(&working).is_empty());
    }

    #[test]
    fn test_work_parent_contents_survive() {
        let host = ScriptedHost::new();
        let (tools, _) = context_for(&host);
        let base = tempfile::tempdir().unwrap();
        let project = base.path().join("my-project");
        fs::create_dir_all(project.join("src")).unwrap();
        fs::write(project.join("important.txt"), "keep me").unwrap();
        fs::write(project.join("src/main.rs"), "fn main() {}").unwrap();
        // Looks like ours but carries no marker
        fs::create_dir_all(project.join("bug-report-notes")).unwrap();

        Assembler::new(&host, &tools, EnvironmentClass::Physical)
            .with_probes(vec![Box::new(Fixed)])
            .assemble(&project, base.path())
            .unwrap();

        assert_eq!(fs::read_to_string(project.join("important.txt")).unwrap(), "keep me");
        assert!(project.join("src/main.rs").is_file());
        assert!(project.join("bug-report-notes").is_dir());
        assert_eq!(leftovers(&project), vec![project.join("bug-report-notes")]);
    }

    #[test]
    fn test_stale_working_dir_of_dead_process_is_removed() {
        let host = ScriptedHost::new();
        let (tools, _) = context_for(&host);
        let base = tempfile::tempdir().unwrap();
        let working = base.path().join("work");

        let stale = working.join("bug-report-old1");
        fs::create_dir_all(stale.join("bug-report/leftover")).unwrap();
        // Above any pid_max, so no such process
        fs::write(stale.join(WORK_MARKER), "999999999").unwrap();

        let live = working.join("bug-report-live1");
        fs::create_dir_all(&live).unwrap();
        fs::write(live.join(WORK_MARKER), std::process::id().to_string()).unwrap();

        Assembler::new(&host, &tools, EnvironmentClass::Physical)
            .with_probes(vec![Box::new(Fixed)])
            .assemble(&working, base.path())
            .unwrap();

        assert!(!stale.exists());
        assert!(live.is_dir());
        let mut tar = tar::Archive::new(flate2::read::GzDecoder::new(
            fs::File::open(base.path().join(ARCHIVE_NAME)).unwrap(),
        ));
        let stale_entry = tar
            .entries()
            .unwrap()
            .any(|e| e.unwrap().path().unwrap().ends_with("leftover"));
        assert!(!stale_entry);
    }

    #[test]
    fn test_working_dir_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let base = tempfile::tempdir().unwrap();
        let root = WorkingRoot::prepare(base.path()).unwrap();
        let mode = fs::metadata(root.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o077, 0);
        assert_eq!(marker_owner(root.path()), Some(std::process::id() as i32));

        let path = root.path().to_path_buf();
        drop(root);
        assert!(!path.exists());
        assert!(base.path().is_dir());
    }

    #[test]
    fn test_archive_failure_still_cleans_up() {
        let host = ScriptedHost::new();
        let (tools, _) = context_for(&host);
        let base = tempfile::tempdir().unwrap();
        let working = base.path().join("work");

        let err = Assembler::new(&host, &tools, EnvironmentClass::Physical)
            .with_probes(vec![Box::new(Fixed)])
            .assemble(&working, &base.path().join("does-not-exist"))
            .unwrap_err();

        assert_eq!(err.exit_code(), 3);
        assert!(leftovers(&working).is_empty());
    }
}
