//! Host access layer
//!
//! Every probe, the installer and the environment detector talk to the
//! machine through [`Host`]. The live implementation shells out with duct;
//! the scripted one answers from canned data so collection can be exercised
//! end to end without touching the machine.

#[cfg(any(test, feature = "test-support"))]
pub mod scripted;
pub mod system;

#[cfg(any(test, feature = "test-support"))]
pub use scripted::ScriptedHost;
pub use system::SystemHost;

use std::path::{Path, PathBuf};

/// A single external command, described before it runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Needs root; escalated through sudo when the process is unprivileged
    pub privileged: bool,
    pub env: Vec<(String, String)>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            privileged: false,
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn privileged(mut self) -> Self {
        self.privileged = true;
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Command line as a user would type it, without privilege escalation
    pub fn command_line(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal
    pub status: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

/// Everything collection needs from the machine it runs on
pub trait Host {
    /// Resolve an executable on the search path
    fn find_executable(&self, name: &str) -> Option<PathBuf>;

    /// Run a command to completion, capturing both output streams.
    /// An `Err` means the command could not be started at all.
    fn run(&self, invocation: &Invocation) -> std::io::Result<CommandOutput>;

    /// Run a command with stdout streamed into `stdout` (created or
    /// truncated) instead of memory. Returns the exit status; stderr is
    /// discarded.
    fn run_to_file(&self, invocation: &Invocation, stdout: &Path) -> std::io::Result<Option<i32>>;

    fn read_file(&self, path: &Path) -> std::io::Result<Vec<u8>>;

    /// Entries of a directory, sorted by path
    fn list_dir(&self, path: &Path) -> std::io::Result<Vec<PathBuf>>;
}
