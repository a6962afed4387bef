//! In-memory host answering from canned data
//!
//! Lets a whole collection run execute against a pretend machine: which
//! executables exist, what each command prints, which files are readable and
//! which packages `apt-get install` can provide. Every invocation is recorded.

use super::{CommandOutput, Host, Invocation};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{Error, ErrorKind};
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct ScriptedHost {
    executables: RefCell<BTreeSet<String>>,
    /// Keyed by full command line first, then by bare program name
    responses: BTreeMap<String, CommandOutput>,
    files: BTreeMap<PathBuf, Vec<u8>>,
    /// Package name -> executables it provides once installed
    packages: BTreeMap<String, Vec<String>>,
    history: RefCell<Vec<Invocation>>,
}

impl ScriptedHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an executable as present on the search path
    pub fn with_executable(self, name: &str) -> Self {
        self.executables.borrow_mut().insert(name.to_string());
        self
    }

    /// Successful output for a program (any arguments) or an exact command line
    pub fn with_output(self, command: &str, stdout: &str) -> Self {
        self.with_response(
            command,
            CommandOutput {
                status: Some(0),
                stdout: stdout.as_bytes().to_vec(),
                stderr: Vec::new(),
            },
        )
    }

    pub fn with_response(mut self, command: &str, output: CommandOutput) -> Self {
        let program = command.split_whitespace().next().unwrap_or(command);
        self.executables.borrow_mut().insert(program.to_string());
        self.responses.insert(command.to_string(), output);
        self
    }

    pub fn with_file(mut self, path: &str, content: &[u8]) -> Self {
        self.files.insert(PathBuf::from(path), content.to_vec());
        self
    }

    /// Make `apt-get install <package>` succeed and provide `executables`
    pub fn with_package(mut self, package: &str, executables: &[&str]) -> Self {
        self.executables.borrow_mut().insert("apt-get".to_string());
        self.packages.insert(
            package.to_string(),
            executables.iter().map(ToString::to_string).collect(),
        );
        self
    }

    /// Every command run so far, in order
    pub fn invocations(&self) -> Vec<Invocation> {
        self.history.borrow().clone()
    }

    /// Number of recorded runs whose command line starts with `prefix`
    pub fn count_runs(&self, prefix: &str) -> usize {
        self.history
            .borrow()
            .iter()
            .filter(|inv| inv.command_line().starts_with(prefix))
            .count()
    }

    fn apt_get(&self, invocation: &Invocation) -> CommandOutput {
        let failed = |message: &str| CommandOutput {
            status: Some(100),
            stdout: Vec::new(),
            stderr: message.as_bytes().to_vec(),
        };

        match invocation.args.first().map(String::as_str) {
            Some("update") => CommandOutput {
                status: Some(0),
                ..Default::default()
            },
            Some("install") => {
                let requested: Vec<&String> = invocation
                    .args
                    .iter()
                    .skip(1)
                    .filter(|arg| !arg.starts_with('-'))
                    .collect();
                for package in &requested {
                    let Some(provided) = self.packages.get(package.as_str()) else {
                        return failed(&format!("E: Unable to locate package {package}"));
                    };
                    let mut executables = self.executables.borrow_mut();
                    executables.extend(provided.iter().cloned());
                }
                CommandOutput {
                    status: Some(0),
                    ..Default::default()
                }
            }
            _ => failed("E: Invalid operation"),
        }
    }
}

impl Host for ScriptedHost {
    fn find_executable(&self, name: &str) -> Option<PathBuf> {
        self.executables
            .borrow()
            .contains(name)
            .then(|| PathBuf::from("/usr/bin").join(name))
    }

    fn run(&self, invocation: &Invocation) -> std::io::Result<CommandOutput> {
        self.history.borrow_mut().push(invocation.clone());

        if invocation.program == "apt-get" && self.find_executable("apt-get").is_some() {
            return Ok(self.apt_get(invocation));
        }

        if let Some(output) = self
            .responses
            .get(&invocation.command_line())
            .or_else(|| self.responses.get(&invocation.program))
        {
            return Ok(output.clone());
        }

        if self.find_executable(&invocation.program).is_some() {
            Ok(CommandOutput {
                status: Some(0),
                ..Default::default()
            })
        } else {
            Err(Error::new(
                ErrorKind::NotFound,
                format!("{}: command not found", invocation.program),
            ))
        }
    }

    /// Scripted stdout is written to a real file so spooling can be exercised
    fn run_to_file(&self, invocation: &Invocation, stdout: &Path) -> std::io::Result<Option<i32>> {
        let output = self.run(invocation)?;
        std::fs::write(stdout, &output.stdout)?;
        Ok(output.status)
    }

    fn read_file(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| Error::new(ErrorKind::NotFound, path.display().to_string()))
    }

    fn list_dir(&self, path: &Path) -> std::io::Result<Vec<PathBuf>> {
        let entries: Vec<PathBuf> = self
            .files
            .keys()
            .filter(|file| file.parent() == Some(path))
            .cloned()
            .collect();
        if entries.is_empty() {
            Err(Error::new(ErrorKind::NotFound, path.display().to_string()))
        } else {
            Ok(entries)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_command_line_wins_over_program() {
        let host = ScriptedHost::new()
            .with_output("lsblk", "NAME SIZE\nsda 1T\n")
            .with_output("lsblk -dno NAME", "sda\n");

        let listing = host.run(&Invocation::new("lsblk").args(["-dno", "NAME"])).unwrap();
        assert_eq!(listing.stdout_lossy(), "sda\n");

        let full = host.run(&Invocation::new("lsblk")).unwrap();
        assert!(full.stdout_lossy().contains("SIZE"));
    }

    #[test]
    fn test_absent_program_cannot_spawn() {
        let host = ScriptedHost::new();
        let err = host.run(&Invocation::new("ibstat")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(host.count_runs("ibstat"), 1);
    }

    #[test]
    fn test_install_provides_executables() {
        let host = ScriptedHost::new().with_package("sysstat", &["iostat"]);
        assert!(host.find_executable("iostat").is_none());

        let out = host
            .run(&Invocation::new("apt-get").args(["install", "-y", "sysstat"]))
            .unwrap();
        assert!(out.success());
        assert!(host.find_executable("iostat").is_some());

        let missing = host
            .run(&Invocation::new("apt-get").args(["install", "-y", "ipmitool"]))
            .unwrap();
        assert!(!missing.success());
    }

    #[test]
    fn test_list_dir_returns_direct_children() {
        let host = ScriptedHost::new()
            .with_file("/etc/netplan/01-netcfg.yaml", b"network: {}\n")
            .with_file("/etc/netplan/sub/ignored.yaml", b"")
            .with_file("/etc/fstab", b"");

        let entries = host.list_dir(Path::new("/etc/netplan")).unwrap();
        assert_eq!(entries, vec![PathBuf::from("/etc/netplan/01-netcfg.yaml")]);
        assert!(host.list_dir(Path::new("/nonexistent")).is_err());
    }
}
