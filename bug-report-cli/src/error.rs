//! Fatal error taxonomy for a collection run
//!
//! Probe degradation and install failures never surface here; they are
//! absorbed into placeholder artifacts and log lines. Only conditions that
//! make the report untrustworthy or undeliverable end the run.

use snafu::Snafu;
use std::path::PathBuf;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ReportError {
    /// Registry file could not be read from disk
    #[snafu(display("Failed to read tool registry {}: {source}", path.display()))]
    ReadRegistry {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Registry document is not valid TOML or has an unexpected shape
    #[snafu(display("Malformed tool registry ({origin}): {source}"))]
    ParseRegistry {
        origin: String,
        source: toml::de::Error,
    },

    /// Registry parsed but lists no tools at all
    #[snafu(display("Tool registry ({origin}) defines no tools"))]
    EmptyRegistry { origin: String },

    /// Registry parsed but a record breaks an invariant
    #[snafu(display("Invalid tool registry entry '{executable}': {reason}"))]
    InvalidTool { executable: String, reason: String },

    /// The private working location could not be prepared
    #[snafu(display("Failed to prepare working directory {}: {source}", path.display()))]
    WorkingDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The report tree could not be packaged; nothing was delivered
    #[snafu(display("Failed to write archive {}: {source}", path.display()))]
    Archive {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ReportError {
    /// Process exit status for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            ReportError::ReadRegistry { .. }
            | ReportError::ParseRegistry { .. }
            | ReportError::EmptyRegistry { .. }
            | ReportError::InvalidTool { .. } => 2,
            ReportError::Archive { .. } => 3,
            ReportError::WorkingDir { .. } => 1,
        }
    }
}

/// Exit status for command-line usage errors (sysexits `EX_USAGE`),
/// distinct from every [`ReportError::exit_code`]
pub const USAGE_EXIT_CODE: i32 = 64;

pub type Result<T, E = ReportError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct_per_fatal_class() {
        let registry = ReportError::InvalidTool {
            executable: "smartctl".to_string(),
            reason: "duplicate".to_string(),
        };
        let archive = ReportError::Archive {
            path: PathBuf::from("bug-report.tar.gz"),
            source: std::io::Error::other("disk full"),
        };
        let workdir = ReportError::WorkingDir {
            path: PathBuf::from("/tmp/bug-report-work"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };

        assert_eq!(registry.exit_code(), 2);
        assert_eq!(archive.exit_code(), 3);
        assert_eq!(workdir.exit_code(), 1);
        for err in [&registry, &archive, &workdir] {
            assert_ne!(err.exit_code(), USAGE_EXIT_CODE);
        }
    }
}
