//! Read-only access to split assets embedded in the host bundle.
//!
//! Built-in splits ship inside the host application's bundle under the
//! asset name `<split>.zip`. [`BundleAssets`] abstracts that namespace so the
//! copier can be exercised against in-memory stubs. Two implementations are
//! provided: [`DirectoryBundle`] for an unpacked asset directory and
//! [`ArchiveBundle`] for a zip host bundle whose assets live under a prefix.

use camino::{Utf8Path, Utf8PathBuf};
use std::fs::File;
use std::io::{self, Cursor, Read};

/// Default prefix of embedded assets inside a zip host bundle.
pub const DEFAULT_ASSET_PREFIX: &str = "assets/";

/// Source of embedded split assets.
#[cfg_attr(test, mockall::automock)]
pub trait BundleAssets {
    /// Open the asset called `name` for reading.
    ///
    /// # Errors
    ///
    /// Returns an error with kind [`io::ErrorKind::NotFound`] if the bundle
    /// has no such asset, or any other I/O error raised while opening it.
    fn open(&self, name: &str) -> io::Result<Box<dyn Read>>;
}

/// Assets stored as plain files in a directory.
#[derive(Debug, Clone)]
pub struct DirectoryBundle {
    root: Utf8PathBuf,
}

impl DirectoryBundle {
    /// Serve assets from files directly under `root`.
    #[must_use]
    pub fn new(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    /// The asset directory.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }
}

impl BundleAssets for DirectoryBundle {
    fn open(&self, name: &str) -> io::Result<Box<dyn Read>> {
        let file = File::open(self.root.join(name))?;
        Ok(Box::new(file))
    }
}

/// A bundle with no assets, used when no built-in split will be copied.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyBundle;

impl BundleAssets for EmptyBundle {
    fn open(&self, name: &str) -> io::Result<Box<dyn Read>> {
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no bundle configured to serve {name}"),
        ))
    }
}

/// Assets stored as entries of a zip host bundle.
///
/// Each [`BundleAssets::open`] reopens the archive and buffers the requested
/// entry, so no archive handle outlives a single read.
#[derive(Debug, Clone)]
pub struct ArchiveBundle {
    archive: Utf8PathBuf,
    prefix: String,
}

impl ArchiveBundle {
    /// Serve assets from `archive`, looking entries up under `prefix`.
    #[must_use]
    pub fn new(archive: Utf8PathBuf, prefix: impl Into<String>) -> Self {
        Self {
            archive,
            prefix: prefix.into(),
        }
    }

    /// Serve assets from `archive` under [`DEFAULT_ASSET_PREFIX`].
    #[must_use]
    pub fn with_default_prefix(archive: Utf8PathBuf) -> Self {
        Self::new(archive, DEFAULT_ASSET_PREFIX)
    }

    fn entry_name(&self, name: &str) -> String {
        format!("{}{name}", self.prefix)
    }
}

impl BundleAssets for ArchiveBundle {
    fn open(&self, name: &str) -> io::Result<Box<dyn Read>> {
        let file = File::open(&self.archive)?;
        let mut archive = zip::ZipArchive::new(file).map_err(zip_to_io)?;
        let entry_name = self.entry_name(name);
        let mut entry = archive.by_name(&entry_name).map_err(zip_to_io)?;
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes)?;
        Ok(Box::new(Cursor::new(bytes)))
    }
}

fn zip_to_io(err: zip::result::ZipError) -> io::Error {
    match err {
        zip::result::ZipError::Io(e) => e,
        zip::result::ZipError::FileNotFound => {
            io::Error::new(io::ErrorKind::NotFound, "asset not found in bundle")
        }
        other => io::Error::new(io::ErrorKind::InvalidData, other),
    }
}
