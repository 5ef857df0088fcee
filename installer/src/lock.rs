//! Exclusive, cross-process locking of a split directory.
//!
//! [`DirectoryLock`] holds an advisory whole-file lock on
//! `<split_dir>/SplitCopier.lock` via `fs2`. Each acquisition opens its own
//! handle, so the lock serialises threads of one process as well as separate
//! processes. Acquisition blocks without a timeout; it is the only point at
//! which preprocessing waits.

use camino::{Utf8Path, Utf8PathBuf};
use fs2::FileExt;
use log::{info, warn};
use std::fs::{self, File, OpenOptions};

use crate::error::{PreprocessError, Result};
use crate::layout::LOCK_FILENAME;

/// Exclusive ownership of one split directory.
///
/// The lock is released by [`DirectoryLock::release`] or, if that was never
/// called, when the value is dropped. After release every operation fails
/// with [`PreprocessError::InvalidState`].
#[derive(Debug)]
pub struct DirectoryLock {
    split_dir: Utf8PathBuf,
    lock_path: Utf8PathBuf,
    file: Option<File>,
}

impl DirectoryLock {
    /// Lock `split_dir`, creating it and its lock file when absent.
    ///
    /// Blocks until no other holder remains.
    ///
    /// # Errors
    ///
    /// Returns [`PreprocessError::LockAcquisitionFailed`] if the directory or
    /// lock file cannot be created, or the lock call itself fails. Any handle
    /// opened before the failure is closed before the error is returned.
    pub fn acquire(split_dir: &Utf8Path) -> Result<Self> {
        let lock_path = split_dir.join(LOCK_FILENAME);
        let failed = |source| PreprocessError::LockAcquisitionFailed {
            path: lock_path.clone(),
            source,
        };

        fs::create_dir_all(split_dir).map_err(failed)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(failed)?;

        info!("Blocking on lock {lock_path}");
        // On failure `file` is dropped here, closing the handle.
        FileExt::lock_exclusive(&file).map_err(failed)?;
        info!("{lock_path} locked");

        Ok(Self {
            split_dir: split_dir.to_owned(),
            lock_path,
            file: Some(file),
        })
    }

    /// Return `true` while the lock is held.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.file.is_some()
    }

    /// Fail with [`PreprocessError::InvalidState`] unless the lock is held.
    ///
    /// # Errors
    ///
    /// Returns [`PreprocessError::InvalidState`] naming `operation` after the
    /// lock has been released.
    pub fn ensure_valid(&self, operation: &'static str) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(self.invalid_state(operation))
        }
    }

    /// The locked directory.
    #[must_use]
    pub fn split_dir(&self) -> &Utf8Path {
        &self.split_dir
    }

    /// The lock file backing this lock.
    #[must_use]
    pub fn lock_path(&self) -> &Utf8Path {
        &self.lock_path
    }

    /// Unlock and close the lock file.
    ///
    /// # Errors
    ///
    /// Returns [`PreprocessError::InvalidState`] if the lock was already
    /// released, or [`PreprocessError::Io`] if unlocking fails. The handle is
    /// closed in either case, which also drops the OS lock.
    pub fn release(&mut self) -> Result<()> {
        let file = self
            .file
            .take()
            .ok_or_else(|| self.invalid_state("release lock"))?;
        let unlocked = FileExt::unlock(&file);
        drop(file);
        info!("{} released", self.lock_path);
        unlocked.map_err(PreprocessError::Io)
    }

    fn invalid_state(&self, operation: &'static str) -> PreprocessError {
        PreprocessError::InvalidState {
            split_dir: self.split_dir.clone(),
            operation,
        }
    }
}

impl Drop for DirectoryLock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            if let Err(e) = FileExt::unlock(&file) {
                warn!("failed to unlock {}: {e}", self.lock_path);
            }
        }
    }
}
