//! Error types for split preprocessing.
//!
//! Every variant that concerns a particular split carries its name so the
//! message can be surfaced to users verbatim. Quarantine cleanup failures are
//! deliberately absent: they are reported through
//! [`splitvault_common::CleanupOutcome`] and never raised.

use crate::config::ConfigError;
use crate::manifest::ManifestError;
use crate::split::SplitName;
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur while preparing a split for loading.
#[derive(Debug, Error)]
pub enum PreprocessError {
    /// The split directory or its lock file could not be opened or locked.
    #[error("failed to lock {path}: {source}")]
    LockAcquisitionFailed {
        /// Path of the lock file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An operation was attempted after the directory lock was released.
    #[error("cannot {operation}: lock on {split_dir} has been released")]
    InvalidState {
        /// The directory whose lock is no longer held.
        split_dir: Utf8PathBuf,
        /// The operation that was rejected.
        operation: &'static str,
    },

    /// Copying a built-in split out of the bundle exhausted its retries.
    #[error(
        "failed to copy built-in file {asset} to path {destination} for split {split_name} after {attempts} attempts"
    )]
    CopyFailed {
        /// The split being copied.
        split_name: SplitName,
        /// Name of the bundle asset that was read.
        asset: String,
        /// The artifact path the copy was published to.
        destination: Utf8PathBuf,
        /// How many attempts were made.
        attempts: u32,
    },

    /// The scratch directory could not hold a temporary file for the copy.
    #[error("failed to create scratch file for split {split_name} in {scratch_dir}: {source}")]
    ScratchUnavailable {
        /// The split being copied.
        split_name: SplitName,
        /// The scratch directory in use.
        scratch_dir: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A built-in split still failed verification after being copied afresh.
    #[error("failed to check built-in split {split_name}, it may be corrupted")]
    VerificationFailed {
        /// The split that failed verification.
        split_name: SplitName,
    },

    /// A split name failed validation.
    #[error("invalid split name \"{value}\": {reason}")]
    InvalidSplitName {
        /// The rejected name.
        value: String,
        /// Description of the violated constraint.
        reason: &'static str,
    },

    /// The digest manifest could not be read or parsed.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// The configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PreprocessError {
    /// Return the split this error concerns, when there is one.
    #[must_use]
    pub fn split_name(&self) -> Option<&SplitName> {
        match self {
            Self::CopyFailed { split_name, .. }
            | Self::ScratchUnavailable { split_name, .. }
            | Self::VerificationFailed { split_name } => Some(split_name),
            Self::LockAcquisitionFailed { .. }
            | Self::InvalidState { .. }
            | Self::InvalidSplitName { .. }
            | Self::Manifest(_)
            | Self::Config(_)
            | Self::Io(_) => None,
        }
    }

    /// Return `true` for errors caused by misconfiguration rather than by
    /// the state of a split on disk.
    #[must_use]
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidSplitName { .. } | Self::Manifest(_) | Self::Config(_)
        )
    }
}

/// Result type alias using [`PreprocessError`].
pub type Result<T> = std::result::Result<T, PreprocessError>;
