//! Storage layout for split artifacts.
//!
//! Each split owns one directory under the storage root:
//! `<root>/<split>/<split>.apk`, next to the `SplitCopier.lock` file that
//! serialises access to it. Scratch files for bundle copies live in
//! `<root>/tmp`, a sibling of the split directories so that publishing by
//! rename stays on one filesystem.

use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

use crate::dirs::BaseDirs;
use crate::error::{PreprocessError, Result};
use crate::split::SplitName;

/// Fixed name of the lock file inside each split directory.
pub const LOCK_FILENAME: &str = "SplitCopier.lock";

/// Name of the scratch directory under the storage root.
pub const TMP_DIRNAME: &str = "tmp";

/// Where one split's artifact lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitLocation {
    split_dir: Utf8PathBuf,
    artifact: Utf8PathBuf,
}

impl SplitLocation {
    /// Build a location from a directory and the artifact inside it.
    #[must_use]
    pub fn new(split_dir: Utf8PathBuf, artifact: Utf8PathBuf) -> Self {
        Self {
            split_dir,
            artifact,
        }
    }

    /// The directory that is locked and, on quarantine, deleted.
    #[must_use]
    pub fn split_dir(&self) -> &Utf8Path {
        &self.split_dir
    }

    /// The artifact file handed to the loader.
    #[must_use]
    pub fn artifact(&self) -> &Utf8Path {
        &self.artifact
    }

    /// The lock file guarding this location.
    #[must_use]
    pub fn lock_file(&self) -> Utf8PathBuf {
        self.split_dir.join(LOCK_FILENAME)
    }

    /// Return `true` if anything occupies the artifact path.
    ///
    /// Directories and dangling symlinks count, so a malformed entry is
    /// verified and quarantined rather than mistaken for a missing artifact.
    #[must_use]
    pub fn artifact_exists(&self) -> bool {
        fs::symlink_metadata(&self.artifact).is_ok()
    }

    /// Return `true` if the artifact path holds a regular file.
    #[must_use]
    pub fn artifact_is_file(&self) -> bool {
        fs::symlink_metadata(&self.artifact).is_ok_and(|metadata| metadata.is_file())
    }
}

/// Derives split locations and the scratch directory from a storage root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPathManager {
    root: Utf8PathBuf,
}

impl SplitPathManager {
    /// Create a path manager rooted at `root`.
    #[must_use]
    pub fn new(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    /// Create a path manager rooted at the platform data directory.
    ///
    /// The root is `<splitvault_data_dir>/splits`.
    ///
    /// # Errors
    ///
    /// Returns [`PreprocessError::Io`] when the data directory cannot be
    /// determined or is not valid UTF-8.
    pub fn from_dirs(dirs: &dyn BaseDirs) -> Result<Self> {
        let base = dirs.splitvault_data_dir().ok_or_else(|| {
            PreprocessError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "could not determine splitvault data directory",
            ))
        })?;
        let base = Utf8PathBuf::from_path_buf(base).map_err(|path| {
            PreprocessError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!(
                    "splitvault data directory is not valid UTF-8: {}",
                    path.display()
                ),
            ))
        })?;
        Ok(Self::new(base.join("splits")))
    }

    /// The storage root.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// The scratch directory for in-flight copies.
    #[must_use]
    pub fn tmp_dir(&self) -> Utf8PathBuf {
        self.root.join(TMP_DIRNAME)
    }

    /// The private directory of `split`.
    #[must_use]
    pub fn split_dir(&self, split: &SplitName) -> Utf8PathBuf {
        self.root.join(split.as_str())
    }

    /// The full storage location of `split`.
    #[must_use]
    pub fn location(&self, split: &SplitName) -> SplitLocation {
        let split_dir = self.split_dir(split);
        let artifact = split_dir.join(split.artifact_file_name());
        SplitLocation::new(split_dir, artifact)
    }
}
