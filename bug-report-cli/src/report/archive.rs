//! Gzip tarball of the report directory

use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

/// Archive `report_dir` into `archive_path`.
///
/// Entries are rooted at the directory's own name, never at its absolute
/// location. The archive is written beside its destination and renamed into
/// place, so a failure never leaves a truncated archive behind and a
/// success replaces the previous one.
pub fn write_archive(report_dir: &Path, archive_path: &Path) -> io::Result<()> {
    let entry_name = report_dir
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "report directory has no name"))?;

    let partial = partial_path(archive_path);
    let result = write_tarball(report_dir, Path::new(entry_name), &partial)
        .and_then(|()| fs::rename(&partial, archive_path));
    if result.is_err() {
        let _ = fs::remove_file(&partial);
    }
    result
}

fn write_tarball(report_dir: &Path, entry_name: &Path, destination: &Path) -> io::Result<()> {
    let file = File::create(destination)?;
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    builder.follow_symlinks(false);
    builder.append_dir_all(entry_name, report_dir)?;
    let encoder = builder.into_inner()?;
    let file = encoder.finish()?;
    file.sync_all()
}

fn partial_path(archive_path: &Path) -> PathBuf {
    let mut name = archive_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    archive_path.with_file_name(name)
}
