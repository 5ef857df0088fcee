//! Preparing a split for loading.
//!
//! A [`SplitPreprocessor`] owns the lock on one split directory for its whole
//! lifetime. [`SplitPreprocessor::load`] walks the table in
//! [`crate::decision`]: built-in splits are copied out of the bundle and
//! verified, with a single re-copy when the stored artifact turns out to be
//! corrupt; downloaded splits are only verified, and quarantined when they
//! fail. Every step runs on the caller's thread while the lock is held.

use camino::Utf8Path;
use log::debug;
use splitvault_common::CleanupOutcome;
use std::fmt;

use crate::bundle::BundleAssets;
use crate::copier::BuiltInCopier;
use crate::decision::{Action, ArtifactState, Phase, Settlement, decide};
use crate::error::{PreprocessError, Result};
use crate::janitor::{DirectoryJanitor, Janitor};
use crate::layout::SplitLocation;
use crate::lock::DirectoryLock;
use crate::split::{SplitInfo, SplitOrigin};
use crate::validator::{IntegrityValidator, SignatureValidator, Verification};

/// Collaborators used by [`SplitPreprocessor::load`].
#[derive(Clone, Copy)]
pub struct PreprocessContext<'a> {
    validator: &'a dyn SignatureValidator,
    bundle: &'a dyn BundleAssets,
    tmp_dir: &'a Utf8Path,
    janitor: &'a dyn Janitor,
}

impl<'a> PreprocessContext<'a> {
    /// Verify with `validator`, copy built-in splits from `bundle`, and stage
    /// copies in `tmp_dir`.
    #[must_use]
    pub fn new(
        validator: &'a dyn SignatureValidator,
        bundle: &'a dyn BundleAssets,
        tmp_dir: &'a Utf8Path,
    ) -> Self {
        Self {
            validator,
            bundle,
            tmp_dir,
            janitor: &DirectoryJanitor,
        }
    }

    /// Quarantine rejected splits with `janitor` instead of deleting their
    /// directory tree.
    #[must_use]
    pub fn with_janitor(self, janitor: &'a dyn Janitor) -> Self {
        Self { janitor, ..self }
    }
}

/// Successful result of [`SplitPreprocessor::load`].
#[derive(Debug)]
pub enum LoadOutcome {
    /// The artifact is present, verified, and safe to hand to the loader.
    Verified,
    /// A downloaded split has no artifact yet.
    NotDownloaded,
    /// A downloaded split failed verification and its directory was deleted.
    Quarantined {
        /// How completely the directory was removed.
        cleanup: CleanupOutcome,
    },
}

impl LoadOutcome {
    /// Return `true` when the artifact may be loaded.
    #[must_use]
    pub fn is_loadable(&self) -> bool {
        matches!(self, Self::Verified)
    }
}

impl fmt::Display for LoadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verified => f.write_str("verified"),
            Self::NotDownloaded => f.write_str("not downloaded"),
            Self::Quarantined { cleanup } => match cleanup.leftover() {
                Some(path) => write!(f, "quarantined, leftover files at {path}"),
                None => f.write_str("quarantined"),
            },
        }
    }
}

/// Exclusive preprocessor for one split directory.
///
/// Opening blocks until the directory lock is free. Call
/// [`SplitPreprocessor::close`] when done; dropping an open preprocessor also
/// releases the lock.
#[derive(Debug)]
pub struct SplitPreprocessor {
    location: SplitLocation,
    lock: DirectoryLock,
}

impl SplitPreprocessor {
    /// Lock `location`'s split directory.
    ///
    /// # Errors
    ///
    /// Returns [`PreprocessError::LockAcquisitionFailed`] when the directory
    /// or its lock file cannot be created or locked.
    pub fn open(location: SplitLocation) -> Result<Self> {
        let lock = DirectoryLock::acquire(location.split_dir())?;
        Ok(Self { location, lock })
    }

    /// The location this preprocessor guards.
    #[must_use]
    pub fn location(&self) -> &SplitLocation {
        &self.location
    }

    /// Return `true` until [`SplitPreprocessor::close`] succeeds.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.lock.is_valid()
    }

    /// Make `split`'s artifact safe to load.
    ///
    /// `split` must be the split this preprocessor's location was derived
    /// from.
    ///
    /// # Errors
    ///
    /// - [`PreprocessError::InvalidState`] after [`SplitPreprocessor::close`].
    /// - [`PreprocessError::CopyFailed`] or
    ///   [`PreprocessError::ScratchUnavailable`] when a built-in split cannot
    ///   be copied out of the bundle.
    /// - [`PreprocessError::VerificationFailed`] when a built-in split is
    ///   still rejected after a fresh copy.
    pub fn load(&self, context: &PreprocessContext<'_>, split: &SplitInfo) -> Result<LoadOutcome> {
        self.lock.ensure_valid("load split")?;

        let mut state = self.observe();
        log_starting_point(split, state, &self.location);

        let mut phase = Phase::Initial;
        let mut cleanup = None;
        loop {
            match decide(split.origin(), state, phase) {
                Action::CopyFromBundle { next } => {
                    let report = BuiltInCopier::new(context.bundle, context.tmp_dir)
                        .copy(split.name(), &self.location)?;
                    debug!(
                        "Copied built-in split {} ({} bytes, {} attempt(s))",
                        split.name(),
                        report.bytes,
                        report.attempts
                    );
                    phase = next;
                    state = self.observe();
                }
                Action::Verify => {
                    state = match IntegrityValidator::new(context.validator)
                        .with_janitor(context.janitor)
                        .verify(split.name(), &self.location)
                    {
                        Verification::Verified => ArtifactState::PresentVerified,
                        Verification::Quarantined(outcome) => {
                            cleanup = Some(outcome);
                            ArtifactState::Quarantined
                        }
                    };
                }
                Action::Settle(Settlement::Verified) => return Ok(LoadOutcome::Verified),
                Action::Settle(Settlement::NotDownloaded) => {
                    return Ok(LoadOutcome::NotDownloaded);
                }
                Action::Settle(Settlement::Quarantined) => {
                    return Ok(LoadOutcome::Quarantined {
                        cleanup: cleanup.unwrap_or(CleanupOutcome::AlreadyAbsent),
                    });
                }
                Action::Fail => {
                    return Err(PreprocessError::VerificationFailed {
                        split_name: split.name().clone(),
                    });
                }
            }
        }
    }

    /// Release the directory lock.
    ///
    /// # Errors
    ///
    /// Returns [`PreprocessError::InvalidState`] when already closed, or
    /// [`PreprocessError::Io`] if unlocking fails.
    pub fn close(&mut self) -> Result<()> {
        self.lock.release()
    }

    fn observe(&self) -> ArtifactState {
        if self.location.artifact_exists() {
            ArtifactState::PresentUnverified
        } else {
            ArtifactState::Absent
        }
    }
}

fn log_starting_point(split: &SplitInfo, state: ArtifactState, location: &SplitLocation) {
    let present = state == ArtifactState::PresentUnverified;
    match (split.origin(), present) {
        (SplitOrigin::BuiltIn, true) => debug!(
            "Built-in split {} found at {}, verifying",
            split.name(),
            location.artifact()
        ),
        (SplitOrigin::BuiltIn, false) => debug!(
            "Built-in split {} not found, copying from bundle",
            split.name()
        ),
        (SplitOrigin::Downloaded, true) => debug!(
            "Downloaded split {} found at {}, verifying",
            split.name(),
            location.artifact()
        ),
        (SplitOrigin::Downloaded, false) => {
            debug!("Split {} has not been downloaded", split.name());
        }
    }
}

#[cfg(test)]
#[path = "preprocessor_tests.rs"]
mod tests;
