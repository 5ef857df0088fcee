//! Copying built-in splits out of the host bundle.
//!
//! The copier streams `<split>.zip` from the bundle into a scratch file and
//! publishes it onto the artifact path with a single rename, so a loader
//! polling the artifact path sees either nothing or the complete file. A
//! failed attempt removes whatever reached the artifact path and the loop
//! tries again immediately, up to [`MAX_RETRY_ATTEMPTS`] times. The scratch
//! file is created once per copy and removed when the copy ends, whatever the
//! outcome.

use camino::Utf8Path;
use log::{info, warn};
use splitvault_common::{CleanupOutcome, remove_file_quietly};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use tempfile::TempPath;

use crate::bundle::BundleAssets;
use crate::error::{PreprocessError, Result};
use crate::layout::SplitLocation;
use crate::split::{DOT_APK, SplitName};

/// Upper bound on copy attempts per invocation.
pub const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Summary of a successful copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyReport {
    /// Number of attempts used, including the successful one.
    pub attempts: u32,
    /// Size of the published artifact in bytes.
    pub bytes: u64,
}

#[derive(Debug, thiserror::Error)]
enum AttemptError {
    #[error("failed to read asset: {0}")]
    Read(#[source] io::Error),

    #[error("failed to publish artifact: {0}")]
    Publish(#[source] io::Error),
}

/// Copies built-in split assets from a bundle onto their storage location.
#[derive(Clone, Copy)]
pub struct BuiltInCopier<'a> {
    bundle: &'a dyn BundleAssets,
    tmp_dir: &'a Utf8Path,
}

impl<'a> BuiltInCopier<'a> {
    /// Create a copier reading from `bundle` and staging in `tmp_dir`.
    #[must_use]
    pub fn new(bundle: &'a dyn BundleAssets, tmp_dir: &'a Utf8Path) -> Self {
        Self { bundle, tmp_dir }
    }

    /// Copy `split` from the bundle to `location`'s artifact path.
    ///
    /// The caller must hold the lock on `location`'s split directory.
    ///
    /// # Errors
    ///
    /// Returns [`PreprocessError::ScratchUnavailable`] if no scratch file can
    /// be created, or [`PreprocessError::CopyFailed`] once every attempt has
    /// failed. No artifact is left on disk after a `CopyFailed`, unless its
    /// removal itself failed (which is logged).
    pub fn copy(&self, split: &SplitName, location: &SplitLocation) -> Result<CopyReport> {
        let tmp = self.create_scratch_file(split)?;
        let asset = split.asset_name();
        let artifact = location.artifact();

        let mut attempts = 0;
        let mut copied = None;
        while copied.is_none() && attempts < MAX_RETRY_ATTEMPTS {
            attempts += 1;
            match self.attempt(&asset, &tmp, artifact) {
                Ok(bytes) => copied = Some(bytes),
                Err(AttemptError::Publish(e)) => warn!(
                    "Failed to rename \"{}\" to \"{artifact}\": {e}",
                    tmp.display()
                ),
                Err(e @ AttemptError::Read(_)) => warn!(
                    "Failed to copy built-in split {split}, attempt {attempts}: {e}"
                ),
            }

            info!(
                "Copy built-in split {} '{artifact}': length {}",
                if copied.is_some() { "succeeded" } else { "failed" },
                file_len(artifact)
            );

            if copied.is_none() {
                if let CleanupOutcome::Leftover { source, .. } = remove_file_quietly(artifact) {
                    warn!("Failed to delete corrupted copy of split {split} at '{artifact}': {source}");
                }
            }
        }

        discard_scratch_file(tmp);

        match copied {
            Some(bytes) => Ok(CopyReport { attempts, bytes }),
            None => Err(PreprocessError::CopyFailed {
                split_name: split.clone(),
                asset,
                destination: artifact.to_owned(),
                attempts,
            }),
        }
    }

    fn create_scratch_file(&self, split: &SplitName) -> Result<TempPath> {
        let scratch_failed = |source| PreprocessError::ScratchUnavailable {
            split_name: split.clone(),
            scratch_dir: self.tmp_dir.to_owned(),
            source,
        };
        fs::create_dir_all(self.tmp_dir).map_err(scratch_failed)?;
        let file = tempfile::Builder::new()
            .prefix(&split.temp_prefix())
            .suffix(DOT_APK)
            .tempfile_in(self.tmp_dir)
            .map_err(scratch_failed)?;
        Ok(file.into_temp_path())
    }

    fn attempt(
        &self,
        asset: &str,
        tmp: &Path,
        artifact: &Utf8Path,
    ) -> std::result::Result<u64, AttemptError> {
        let mut source = self.bundle.open(asset).map_err(AttemptError::Read)?;
        let mut file = File::create(tmp).map_err(AttemptError::Read)?;
        let bytes = io::copy(&mut source, &mut file).map_err(AttemptError::Read)?;
        file.sync_all().map_err(AttemptError::Read)?;
        drop(file);

        // Quarantine may have removed the split directory since the lock
        // was taken.
        if let Some(parent) = artifact.parent() {
            fs::create_dir_all(parent).map_err(AttemptError::Publish)?;
        }
        fs::rename(tmp, artifact).map_err(AttemptError::Publish)?;
        Ok(bytes)
    }
}

fn discard_scratch_file(tmp: TempPath) {
    let display = tmp.display().to_string();
    match tmp.close() {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to delete scratch file {display}: {e}"),
    }
}

fn file_len(path: &Utf8Path) -> u64 {
    fs::metadata(path).map_or(0, |metadata| metadata.len())
}
