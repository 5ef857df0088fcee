//! One-shot preprocessing and read-only inspection of splits.

use std::fmt;
use std::fs;

use crate::error::Result;
use crate::layout::SplitPathManager;
use crate::preprocessor::{LoadOutcome, PreprocessContext, SplitPreprocessor};
use crate::split::{SplitInfo, SplitName};

/// Open a preprocessor for `split`, load it, and close it again.
///
/// The lock is released before returning, whatever the outcome.
///
/// # Errors
///
/// Returns any error from [`SplitPreprocessor::open`],
/// [`SplitPreprocessor::load`], or [`SplitPreprocessor::close`]. A load
/// error takes precedence over a close error.
pub fn preprocess_split(
    paths: &SplitPathManager,
    context: &PreprocessContext<'_>,
    split: &SplitInfo,
) -> Result<LoadOutcome> {
    let mut preprocessor = SplitPreprocessor::open(paths.location(split.name()))?;
    let loaded = preprocessor.load(context, split);
    let closed = preprocessor.close();
    let outcome = loaded?;
    closed?;
    Ok(outcome)
}

/// What is on disk for a split, observed without locking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitStatus {
    /// An artifact of `bytes` bytes is stored.
    Present {
        /// Artifact size.
        bytes: u64,
    },
    /// No artifact is stored.
    Absent,
}

impl fmt::Display for SplitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present { bytes } => write!(f, "present ({bytes} bytes)"),
            Self::Absent => f.write_str("absent"),
        }
    }
}

/// Report whether `split` has an artifact, without creating or locking
/// anything.
///
/// The answer may be stale by the time it is read if another process holds
/// the split's lock.
#[must_use]
pub fn split_status(paths: &SplitPathManager, split: &SplitName) -> SplitStatus {
    let location = paths.location(split);
    match fs::metadata(location.artifact()) {
        Ok(metadata) if metadata.is_file() => SplitStatus::Present {
            bytes: metadata.len(),
        },
        _ => SplitStatus::Absent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PreprocessError;
    use crate::test_utils::{ScriptedValidator, StubBundle, TempStorage};
    use crate::lock::DirectoryLock;

    fn java() -> SplitName {
        SplitName::new("java").expect("valid split name")
    }

    #[test]
    fn preprocess_split_releases_lock_on_success() {
        let storage = TempStorage::new().expect("temp storage");
        let validator = ScriptedValidator::always(true);
        let bundle = StubBundle::new(b"payload");
        let tmp_dir = storage.paths().tmp_dir();
        let context = PreprocessContext::new(&validator, &bundle, &tmp_dir);

        let outcome = preprocess_split(storage.paths(), &context, &SplitInfo::built_in(java()))
            .expect("preprocess");

        assert!(outcome.is_loadable());
        let mut relock =
            DirectoryLock::acquire(storage.location(&java()).split_dir()).expect("lock is free");
        relock.release().expect("release");
    }

    #[test]
    fn preprocess_split_releases_lock_on_failure() {
        let storage = TempStorage::new().expect("temp storage");
        let validator = ScriptedValidator::always(false);
        let bundle = StubBundle::new(b"payload");
        let tmp_dir = storage.paths().tmp_dir();
        let context = PreprocessContext::new(&validator, &bundle, &tmp_dir);

        let err = preprocess_split(storage.paths(), &context, &SplitInfo::built_in(java()))
            .expect_err("verification fails");

        assert!(matches!(err, PreprocessError::VerificationFailed { .. }));
        let mut relock =
            DirectoryLock::acquire(storage.location(&java()).split_dir()).expect("lock is free");
        relock.release().expect("release");
    }

    #[test]
    fn status_reports_artifact_size_without_creating_directories() {
        let storage = TempStorage::new().expect("temp storage");

        assert_eq!(split_status(storage.paths(), &java()), SplitStatus::Absent);
        assert!(!storage.location(&java()).split_dir().exists());

        storage.plant_artifact(&java(), b"12345").expect("plant");
        assert_eq!(
            split_status(storage.paths(), &java()),
            SplitStatus::Present { bytes: 5 }
        );
    }
}
