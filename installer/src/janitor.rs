//! Quarantine of corrupted or obsolete splits.
//!
//! Quarantine removes the split's whole directory, not just the artifact, so
//! any sibling state is discarded with it and the next acquisition starts from
//! nothing. A directory that survives is logged and reported, never raised:
//! the next `load` will find the stale artifact and try again.

use log::warn;
use splitvault_common::{CleanupOutcome, remove_dir_tree};

use crate::layout::SplitLocation;

/// Removes the files of a rejected split.
#[cfg_attr(test, mockall::automock)]
pub trait Janitor {
    /// Quarantine `location` and describe what is left on disk.
    fn quarantine(&self, location: &SplitLocation) -> CleanupOutcome;
}

/// Janitor deleting the whole split directory with [`quarantine`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryJanitor;

impl Janitor for DirectoryJanitor {
    fn quarantine(&self, location: &SplitLocation) -> CleanupOutcome {
        quarantine(location)
    }
}

/// Delete `location`'s split directory tree.
pub fn quarantine(location: &SplitLocation) -> CleanupOutcome {
    let outcome = remove_dir_tree(location.split_dir());
    if location.split_dir().exists() {
        warn!(
            "Failed to delete corrupted split files in {}: {outcome}",
            location.split_dir()
        );
    }
    outcome
}
