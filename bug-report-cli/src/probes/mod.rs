//! Probe set
//!
//! Each probe is one self-contained collection step producing named
//! artifacts in a fixed category. Probes never fail: an absent tool, a
//! failing command or empty output turns into a placeholder artifact, so
//! the report tree has the same shape on every machine.
//!
//! Run order is fixed by [`standard_probes`]:
//! - the GPU vendor bug report goes first, it is the slowest step
//! - storage, logs, networking, GPU counters, BMC, GRUB, packages
//! - root-level system inventory last

pub mod bmc;
pub mod capture;
pub mod gpu;
pub mod grub;
pub mod logs;
pub mod network;
pub mod packages;
pub mod storage;
pub mod system;

use crate::host::Host;
use crate::tools::Resolution;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};

/// Output category; each maps to one directory of the report tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    DrivesAndStorage,
    SystemLogs,
    ReposAndPackages,
    Networking,
    GpuMemoryErrors,
    BmcInfo,
    Grub,
    /// Catch-all at the top of the report directory
    Root,
}

impl Category {
    /// Every category, in report tree order
    pub const ALL: [Category; 8] = [
        Category::DrivesAndStorage,
        Category::SystemLogs,
        Category::ReposAndPackages,
        Category::Networking,
        Category::GpuMemoryErrors,
        Category::BmcInfo,
        Category::Grub,
        Category::Root,
    ];

    /// Directory name under the report root; `None` for the root itself
    pub fn dir_name(self) -> Option<&'static str> {
        match self {
            Category::DrivesAndStorage => Some("drives-and-storage"),
            Category::SystemLogs => Some("system-logs"),
            Category::ReposAndPackages => Some("repos-and-packages"),
            Category::Networking => Some("networking"),
            Category::GpuMemoryErrors => Some("gpu-memory-errors"),
            Category::BmcInfo => Some("bmc-info"),
            Category::Grub => Some("grub"),
            Category::Root => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name().unwrap_or("root"))
    }
}

/// The well-known text written in place of missing data
pub fn placeholder(subject: &str) -> String {
    format!("No {subject} data available. This machine may not have {subject}.\n")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// Verbatim bytes from the tool or file
    Captured(Vec<u8>),
    /// Non-blank output already streamed to a file in scratch space;
    /// moved into the report tree when written
    Spooled(PathBuf),
    /// Nothing usable; rendered as [`placeholder`] for the subject
    Unavailable { subject: String },
}

impl Content {
    /// Content as bytes. Spooled output is read back from disk, so this is
    /// meant for inspection rather than the write path.
    pub fn bytes(&self) -> Cow<'_, [u8]> {
        match self {
            Content::Captured(bytes) => Cow::Borrowed(bytes),
            Content::Spooled(path) => Cow::Owned(std::fs::read(path).unwrap_or_default()),
            Content::Unavailable { subject } => Cow::Owned(placeholder(subject).into_bytes()),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Content::Unavailable { .. })
    }
}

/// One artifact produced by one probe invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub category: Category,
    pub artifact: String,
    pub content: Content,
    /// Exit status of the underlying command; `None` when nothing ran
    pub exit_status: Option<i32>,
}

impl ProbeResult {
    pub fn unavailable(category: Category, artifact: &str, subject: &str) -> Self {
        Self {
            category,
            artifact: artifact.to_string(),
            content: Content::Unavailable {
                subject: subject.to_string(),
            },
            exit_status: None,
        }
    }
}

/// What a probe may look at while collecting
pub struct ProbeContext<'a> {
    pub host: &'a dyn Host,
    pub tools: &'a Resolution,
    /// Private scratch space outside the report tree
    pub scratch: &'a Path,
}

pub trait Probe {
    fn name(&self) -> &'static str;

    fn collect(&self, ctx: &ProbeContext<'_>) -> Vec<ProbeResult>;
}

/// The full battery, in run order
pub fn standard_probes() -> Vec<Box<dyn Probe>> {
    vec![
        Box::new(gpu::VendorBugReport),
        Box::new(storage::StorageProbe),
        Box::new(logs::SystemLogsProbe),
        Box::new(network::NetworkProbe),
        Box::new(gpu::MemoryErrorsProbe),
        Box::new(bmc::BmcProbe),
        Box::new(grub::GrubProbe),
        Box::new(packages::PackagesProbe),
        Box::new(system::SystemProbe),
    ]
}
