//! Category directory tree for one report
//!
//! Every category directory is created up front, in one pass, so the tree
//! has the same shape whatever the probes find.

use crate::probes::{Category, Content, ProbeResult};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the report directory, and of the top-level entry in the archive
pub const REPORT_DIR_NAME: &str = "bug-report";

/// What ended up on disk for one artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenArtifact {
    pub category: Category,
    pub name: String,
    pub exit_status: Option<i32>,
    pub placeholder: bool,
    pub bytes: u64,
}

#[derive(Debug)]
pub struct ReportTree {
    root: PathBuf,
    names: BTreeMap<Category, BTreeSet<String>>,
}

impl ReportTree {
    /// Create `<parent>/bug-report` and all category directories.
    /// Existing directories are reused.
    pub fn create(parent: &Path) -> io::Result<Self> {
        let root = parent.join(REPORT_DIR_NAME);
        for category in Category::ALL {
            fs::create_dir_all(Self::dir_for(&root, category))?;
        }
        Ok(Self {
            root,
            names: BTreeMap::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn category_dir(&self, category: Category) -> PathBuf {
        Self::dir_for(&self.root, category)
    }

    fn dir_for(root: &Path, category: Category) -> PathBuf {
        match category.dir_name() {
            Some(dir) => root.join(dir),
            None => root.to_path_buf(),
        }
    }

    /// Write one probe result. A name already used in the category gets a
    /// numeric suffix so nothing is overwritten.
    pub fn write(&mut self, result: &ProbeResult) -> io::Result<WrittenArtifact> {
        let name = self.claim_name(result.category, &result.artifact);
        if name != result.artifact {
            tracing::warn!(
                category = %result.category,
                artifact = %result.artifact,
                renamed = %name,
                "duplicate artifact name"
            );
        }

        let target = self.category_dir(result.category).join(&name);
        let bytes = match &result.content {
            Content::Spooled(spool) => move_file(spool, &target)?,
            content => {
                let bytes = content.bytes();
                fs::write(&target, &bytes)?;
                bytes.len() as u64
            }
        };

        Ok(WrittenArtifact {
            category: result.category,
            name,
            exit_status: result.exit_status,
            placeholder: result.content.is_placeholder(),
            bytes,
        })
    }

    fn claim_name(&mut self, category: Category, wanted: &str) -> String {
        let taken = self.names.entry(category).or_default();
        let mut name = wanted.to_string();
        let mut n = 1;
        while taken.contains(&name) {
            n += 1;
            name = format!("{wanted}.{n}");
        }
        taken.insert(name.clone());
        name
    }
}

/// Rename when possible, copy across filesystems otherwise
fn move_file(from: &Path, to: &Path) -> io::Result<u64> {
    if fs::rename(from, to).is_err() {
        fs::copy(from, to)?;
        fs::remove_file(from)?;
    }
    Ok(fs::metadata(to)?.len())
}
