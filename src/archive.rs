// ABOUTME: Packages an artifact directory into a single tar.gz archive.
// ABOUTME: Member names are source-relative so extraction reproduces the tree at its target.

use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Fixed archive name, reused on the remote side by the extraction step.
/// Repeated runs overwrite the same file rather than accumulating artifacts.
pub const ARCHIVE_FILENAME: &str = "stelno-artifact.tar.gz";

/// Well-known local path the archiver writes to.
pub fn archive_path() -> PathBuf {
    std::env::temp_dir().join(ARCHIVE_FILENAME)
}

/// A packaged artifact on local disk, with its ordered member manifest.
#[derive(Debug)]
pub struct PackagedArchive {
    pub local_path: PathBuf,
    /// Source-relative paths of every archived file, in member order.
    pub entries: Vec<PathBuf>,
}

/// Package a directory tree into the well-known archive path.
pub fn package(source: &Path) -> io::Result<PackagedArchive> {
    package_into(source, archive_path())
}

/// Package a directory tree into `dest`.
///
/// Every regular file is written under its path relative to `source`, so
/// `tar -xzf` on the remote host reproduces the original tree rooted at
/// the extraction target with no parent directory prefix. The walk is
/// sorted to keep member order stable across runs.
pub fn package_into(source: &Path, dest: PathBuf) -> io::Result<PackagedArchive> {
    let file = File::create(&dest)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    let mut entries = Vec::new();

    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(io::Error::other)?
            .to_path_buf();
        builder.append_path_with_name(entry.path(), &relative)?;
        entries.push(relative);
    }

    let encoder = builder.into_inner()?;
    encoder.finish()?;

    tracing::debug!(archive = %dest.display(), files = entries.len(), "packaged artifact");

    Ok(PackagedArchive {
        local_path: dest,
        entries,
    })
}

/// List every regular file under `source` as `(absolute, source-relative)`
/// pairs, in the same sorted order the archiver uses.
pub fn file_manifest(source: &Path) -> io::Result<Vec<(PathBuf, PathBuf)>> {
    let mut manifest = Vec::new();

    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(io::Error::other)?
            .to_path_buf();
        manifest.push((entry.path().to_path_buf(), relative));
    }

    Ok(manifest)
}
