//! Run configuration: install policy and file locations

use crate::prompt::Confirm;
use clap::ValueEnum;
use std::path::PathBuf;

/// Whether missing tools may be installed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum InstallPolicy {
    /// Ask once on the terminal
    #[default]
    Ask,
    /// Install without asking
    #[value(aliases = ["yes", "y", "true", "1"])]
    Always,
    /// Never install
    #[value(aliases = ["no", "n", "false", "0"])]
    Never,
}

impl InstallPolicy {
    /// Turn the policy into a single yes/no. Only `Ask` consults the user.
    pub fn authorize(self, confirm: &mut dyn Confirm, question: &str) -> bool {
        match self {
            InstallPolicy::Always => true,
            InstallPolicy::Never => false,
            InstallPolicy::Ask => confirm.confirm(question),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CollectOptions {
    pub install: InstallPolicy,
    /// Registry document replacing the built-in one
    pub registry: Option<PathBuf>,
    /// Where the archive is written
    pub output_dir: PathBuf,
    /// Parent of the private working directory. Only the directory this
    /// tool creates inside it is ever removed.
    pub work_dir: PathBuf,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            install: InstallPolicy::Ask,
            registry: None,
            output_dir: PathBuf::from("."),
            work_dir: default_work_dir(),
        }
    }
}

pub fn default_work_dir() -> PathBuf {
    std::env::temp_dir()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Answer {
        value: bool,
        asked: usize,
    }

    impl Confirm for Answer {
        fn confirm(&mut self, _question: &str) -> bool {
            self.asked += 1;
            self.value
        }
    }

    #[test]
    fn test_policy_aliases() {
        for alias in ["always", "yes", "y", "true", "1"] {
            assert_eq!(InstallPolicy::from_str(alias, true).unwrap(), InstallPolicy::Always);
        }
        for alias in ["never", "no", "n", "false", "0"] {
            assert_eq!(InstallPolicy::from_str(alias, true).unwrap(), InstallPolicy::Never);
        }
        assert_eq!(InstallPolicy::from_str("YES", true).unwrap(), InstallPolicy::Always);
        assert!(InstallPolicy::from_str("maybe", true).is_err());
    }

    #[test]
    fn test_only_ask_prompts() {
        let mut answer = Answer { value: true, asked: 0 };
        assert!(InstallPolicy::Always.authorize(&mut answer, "install?"));
        assert!(!InstallPolicy::Never.authorize(&mut answer, "install?"));
        assert_eq!(answer.asked, 0);

        assert!(InstallPolicy::Ask.authorize(&mut answer, "install?"));
        assert_eq!(answer.asked, 1);
    }
}
