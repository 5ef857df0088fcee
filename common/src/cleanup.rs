//! Best-effort filesystem cleanup.
//!
//! Removing a quarantined split or a scratch file must never abort the
//! operation that asked for it. These helpers attempt the removal and then
//! describe what is left on disk as a [`CleanupOutcome`], which callers are
//! free to inspect or ignore.

use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use std::fmt;
use std::fs;
use std::io;

/// The result of a best-effort removal.
#[derive(Debug)]
pub enum CleanupOutcome {
    /// The target existed and has been removed.
    Removed,
    /// Nothing existed at the target path.
    AlreadyAbsent,
    /// Removal failed and the target is still present.
    Leftover {
        /// The path that survived the removal attempt.
        path: Utf8PathBuf,
        /// The error reported by the failed removal.
        source: io::Error,
    },
}

impl CleanupOutcome {
    /// Return `true` when nothing remains at the target path.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        !matches!(self, Self::Leftover { .. })
    }

    /// Return the surviving path, if removal left something behind.
    #[must_use]
    pub fn leftover(&self) -> Option<&Utf8Path> {
        match self {
            Self::Leftover { path, .. } => Some(path),
            Self::Removed | Self::AlreadyAbsent => None,
        }
    }
}

impl fmt::Display for CleanupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Removed => write!(f, "removed"),
            Self::AlreadyAbsent => write!(f, "already absent"),
            Self::Leftover { path, source } => write!(f, "{path} left behind: {source}"),
        }
    }
}

/// Recursively remove a directory tree.
///
/// A missing directory counts as [`CleanupOutcome::AlreadyAbsent`]. When the
/// removal fails part-way, the outcome is [`CleanupOutcome::Leftover`] only if
/// the directory still exists afterwards.
///
/// # Examples
///
/// ```
/// use camino::Utf8PathBuf;
/// use splitvault_common::{CleanupOutcome, remove_dir_tree};
///
/// let temp = tempfile::tempdir().unwrap();
/// let dir = Utf8PathBuf::try_from(temp.path().join("split")).unwrap();
/// std::fs::create_dir_all(dir.join("nested")).unwrap();
///
/// assert!(matches!(remove_dir_tree(&dir), CleanupOutcome::Removed));
/// assert!(matches!(remove_dir_tree(&dir), CleanupOutcome::AlreadyAbsent));
/// ```
pub fn remove_dir_tree(path: &Utf8Path) -> CleanupOutcome {
    classify(path, fs::remove_dir_all(path))
}

/// Remove a single file, tolerating its absence.
pub fn remove_file_quietly(path: &Utf8Path) -> CleanupOutcome {
    classify(path, fs::remove_file(path))
}

fn classify(path: &Utf8Path, result: io::Result<()>) -> CleanupOutcome {
    match result {
        Ok(()) => CleanupOutcome::Removed,
        Err(e) if e.kind() == io::ErrorKind::NotFound => CleanupOutcome::AlreadyAbsent,
        Err(e) if path.exists() => {
            debug!("failed to remove {path}: {e}");
            CleanupOutcome::Leftover {
                path: path.to_owned(),
                source: e,
            }
        }
        // A concurrent remover won the race; the path is gone either way.
        Err(_) => CleanupOutcome::Removed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn temp_root() -> (tempfile::TempDir, Utf8PathBuf) {
        let temp = tempfile::tempdir().expect("temp dir");
        let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8 path");
        (temp, root)
    }

    #[test]
    fn remove_dir_tree_removes_nested_contents() {
        let (_temp, root) = temp_root();
        let dir = root.join("split");
        fs::create_dir_all(dir.join("nested")).expect("create dirs");
        fs::write(dir.join("nested").join("base.apk"), b"payload").expect("write file");
        fs::write(dir.join("SplitCopier.lock"), b"").expect("write lock");

        let outcome = remove_dir_tree(&dir);

        assert!(matches!(outcome, CleanupOutcome::Removed));
        assert!(!dir.exists());
    }

    #[test]
    fn remove_dir_tree_reports_missing_directory() {
        let (_temp, root) = temp_root();
        let outcome = remove_dir_tree(&root.join("missing"));
        assert!(matches!(outcome, CleanupOutcome::AlreadyAbsent));
        assert!(outcome.is_clean());
    }

    #[test]
    fn remove_file_quietly_removes_file() {
        let (_temp, root) = temp_root();
        let file = root.join("tmp-split.apk");
        fs::write(&file, b"partial").expect("write file");

        assert!(matches!(
            remove_file_quietly(&file),
            CleanupOutcome::Removed
        ));
        assert!(!file.exists());
    }

    #[test]
    fn remove_file_quietly_reports_leftover_for_directories() {
        let (_temp, root) = temp_root();
        let dir = root.join("not-a-file");
        fs::create_dir_all(&dir).expect("create dir");

        let outcome = remove_file_quietly(&dir);

        assert!(!outcome.is_clean());
        assert_eq!(outcome.leftover(), Some(dir.as_path()));
    }

    #[rstest]
    #[case::removed(CleanupOutcome::Removed, "removed")]
    #[case::absent(CleanupOutcome::AlreadyAbsent, "already absent")]
    fn display_describes_clean_outcomes(#[case] outcome: CleanupOutcome, #[case] expected: &str) {
        assert_eq!(outcome.to_string(), expected);
    }

    #[test]
    fn display_names_leftover_path() {
        let outcome = CleanupOutcome::Leftover {
            path: Utf8PathBuf::from("/data/splits/java"),
            source: io::Error::other("permission denied"),
        };
        let text = outcome.to_string();
        assert!(text.contains("/data/splits/java"));
        assert!(text.contains("permission denied"));
    }
}
