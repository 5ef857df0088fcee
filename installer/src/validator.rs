//! Artifact authenticity checks.
//!
//! [`SignatureValidator`] is the seam to whatever decides that an artifact is
//! authentic; it only reads. [`IntegrityValidator`] wraps it and quarantines
//! the split when the answer is no. [`DigestValidator`] is the shipped
//! validator, approving artifacts whose SHA-256 matches a [`DigestManifest`].

use camino::Utf8Path;
use log::{debug, warn};
use splitvault_common::CleanupOutcome;

use crate::janitor::{DirectoryJanitor, Janitor};
use crate::layout::SplitLocation;
use crate::manifest::{DigestManifest, Sha256Digest};
use crate::split::SplitName;

/// Decides whether an artifact is authentic.
///
/// Implementations must not modify the artifact.
#[cfg_attr(test, mockall::automock)]
pub trait SignatureValidator {
    /// Return `true` if `artifact` is an authentic copy of `split`.
    fn validate(&self, split: &SplitName, artifact: &Utf8Path) -> bool;
}

/// Validator comparing artifact digests against a manifest.
#[derive(Debug, Clone, Default)]
pub struct DigestValidator {
    manifest: DigestManifest,
}

impl DigestValidator {
    /// Approve artifacts whose digest matches `manifest`.
    #[must_use]
    pub fn new(manifest: DigestManifest) -> Self {
        Self { manifest }
    }
}

impl SignatureValidator for DigestValidator {
    fn validate(&self, split: &SplitName, artifact: &Utf8Path) -> bool {
        let Some(expected) = self.manifest.digest(split) else {
            warn!("No approved digest for split {split}");
            return false;
        };
        match Sha256Digest::of_file(artifact) {
            Ok(actual) if &actual == expected => true,
            Ok(actual) => {
                debug!("digest mismatch for split {split}: manifest={expected}, actual={actual}");
                false
            }
            Err(e) => {
                debug!("failed to digest {artifact}: {e}");
                false
            }
        }
    }
}

/// Result of verifying an artifact.
#[derive(Debug)]
pub enum Verification {
    /// The artifact was approved.
    Verified,
    /// The artifact was rejected and its split directory quarantined.
    Quarantined(CleanupOutcome),
}

impl Verification {
    /// Return `true` if the artifact was approved.
    #[must_use]
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified)
    }
}

/// Verifies artifacts and quarantines the ones that fail.
#[derive(Clone, Copy)]
pub struct IntegrityValidator<'a> {
    validator: &'a dyn SignatureValidator,
    janitor: &'a dyn Janitor,
}

impl<'a> IntegrityValidator<'a> {
    /// Wrap `validator`, quarantining with [`DirectoryJanitor`].
    #[must_use]
    pub fn new(validator: &'a dyn SignatureValidator) -> Self {
        Self {
            validator,
            janitor: &DirectoryJanitor,
        }
    }

    /// Quarantine rejected splits with `janitor` instead.
    #[must_use]
    pub fn with_janitor(self, janitor: &'a dyn Janitor) -> Self {
        Self { janitor, ..self }
    }

    /// Verify `split`'s artifact at `location`.
    ///
    /// Anything other than a regular file at the artifact path is rejected
    /// without consulting the validator. On rejection the whole split
    /// directory is deleted before returning. The caller must hold the lock
    /// on `location`'s split directory.
    pub fn verify(&self, split: &SplitName, location: &SplitLocation) -> Verification {
        if location.artifact_is_file() {
            if self.validator.validate(split, location.artifact()) {
                return Verification::Verified;
            }
        } else {
            warn!(
                "Split {split} artifact {} is not a regular file",
                location.artifact()
            );
        }
        warn!("Failed to check split {split} signature");
        Verification::Quarantined(self.janitor.quarantine(location))
    }
}
