//! Live host backed by the local machine

use super::{CommandOutput, Host, Invocation};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Admin tools live in sbin, which unprivileged PATHs often omit
const SBIN_DIRS: [&str; 3] = ["/usr/local/sbin", "/usr/sbin", "/sbin"];

#[derive(Debug, Clone)]
pub struct SystemHost {
    is_root: bool,
}

impl SystemHost {
    pub fn new() -> Self {
        // SAFETY: geteuid has no preconditions and cannot fail
        let euid = unsafe { libc::geteuid() };
        Self { is_root: euid == 0 }
    }

    pub fn is_root(&self) -> bool {
        self.is_root
    }

    /// Wrap privileged commands in a non-interactive sudo when not root
    fn escalate(&self, invocation: &Invocation) -> (String, Vec<String>) {
        if !invocation.privileged || self.is_root {
            return (invocation.program.clone(), invocation.args.clone());
        }

        let mut args = vec!["-n".to_string()];
        if !invocation.env.is_empty() {
            // sudo resets the environment, so pass variables through env(1)
            args.push("env".to_string());
            args.extend(invocation.env.iter().map(|(k, v)| format!("{k}={v}")));
        }
        args.push(invocation.program.clone());
        args.extend(invocation.args.iter().cloned());
        ("sudo".to_string(), args)
    }

    fn search_path() -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = std::env::var_os("PATH")
            .map(|path| std::env::split_paths(&path).collect())
            .unwrap_or_default();
        for sbin in SBIN_DIRS {
            let sbin = PathBuf::from(sbin);
            if !dirs.contains(&sbin) {
                dirs.push(sbin);
            }
        }
        dirs
    }
}

impl Default for SystemHost {
    fn default() -> Self {
        Self::new()
    }
}

fn is_executable(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

impl Host for SystemHost {
    fn find_executable(&self, name: &str) -> Option<PathBuf> {
        Self::search_path()
            .into_iter()
            .map(|dir| dir.join(name))
            .find(|candidate| is_executable(candidate))
    }

    fn run(&self, invocation: &Invocation) -> std::io::Result<CommandOutput> {
        let (program, args) = self.escalate(invocation);
        tracing::debug!(command = %invocation.command_line(), via = %program, "running");

        let mut expr = duct::cmd(program.as_str(), &args)
            .stdin_null()
            .stdout_capture()
            .stderr_capture()
            .unchecked();
        if !invocation.privileged || self.is_root {
            for (key, value) in &invocation.env {
                expr = expr.env(key, value);
            }
        }

        let output = expr.run()?;
        Ok(CommandOutput {
            status: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    fn run_to_file(&self, invocation: &Invocation, stdout: &Path) -> std::io::Result<Option<i32>> {
        let (program, args) = self.escalate(invocation);
        tracing::debug!(
            command = %invocation.command_line(),
            via = %program,
            to = %stdout.display(),
            "running to file"
        );

        let mut expr = duct::cmd(program.as_str(), &args)
            .stdin_null()
            .stdout_path(stdout)
            .stderr_null()
            .unchecked();
        if !invocation.privileged || self.is_root {
            for (key, value) in &invocation.env {
                expr = expr.env(key, value);
            }
        }

        Ok(expr.run()?.status.code())
    }

    fn read_file(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn list_dir(&self, path: &Path) -> std::io::Result<Vec<PathBuf>> {
        let mut entries = std::fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        entries.sort();
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escalate_passes_through_when_unprivileged_command() {
        let host = SystemHost { is_root: false };
        let (program, args) = host.escalate(&Invocation::new("lsblk"));
        assert_eq!(program, "lsblk");
        assert!(args.is_empty());
    }

    #[test]
    fn test_escalate_wraps_in_noninteractive_sudo() {
        let host = SystemHost { is_root: false };
        let inv = Invocation::new("apt-get")
            .args(["install", "-y", "sysstat"])
            .env("DEBIAN_FRONTEND", "noninteractive")
            .privileged();
        let (program, args) = host.escalate(&inv);
        assert_eq!(program, "sudo");
        assert_eq!(
            args,
            vec![
                "-n",
                "env",
                "DEBIAN_FRONTEND=noninteractive",
                "apt-get",
                "install",
                "-y",
                "sysstat"
            ]
        );
    }

    #[test]
    fn test_root_runs_privileged_commands_directly() {
        let host = SystemHost { is_root: true };
        let (program, _) = host.escalate(&Invocation::new("dmidecode").privileged());
        assert_eq!(program, "dmidecode");
    }

    #[test]
    fn test_search_path_includes_sbin() {
        let dirs = SystemHost::search_path();
        assert!(dirs.contains(&PathBuf::from("/usr/sbin")));
    }

    #[test]
    fn test_run_to_file_streams_stdout() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("echo.txt");
        let host = SystemHost { is_root: true };
        let status = host
            .run_to_file(&Invocation::new("echo").arg("kernel: ok"), &out)
            .unwrap();
        assert_eq!(status, Some(0));
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "kernel: ok\n");
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let host = SystemHost { is_root: true };
        let result = host.run(&Invocation::new("definitely-not-a-real-binary-5f3a"));
        assert!(result.is_err());
    }
}
