//! Directory resolution abstraction for platform-specific paths.
//!
//! Wraps `directories-next` behind a trait so path derivation can be tested
//! without depending on the host's home directory.

use std::path::PathBuf;

/// Provides the platform base directories used by splitvault.
#[cfg_attr(test, mockall::automock)]
pub trait BaseDirs {
    /// Per-user local data directory for splitvault, if one can be resolved.
    fn splitvault_data_dir(&self) -> Option<PathBuf>;
}

/// Production [`BaseDirs`] backed by `directories-next`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBaseDirs;

impl BaseDirs for SystemBaseDirs {
    fn splitvault_data_dir(&self) -> Option<PathBuf> {
        directories_next::ProjectDirs::from("", "", "splitvault")
            .map(|dirs| dirs.data_local_dir().to_path_buf())
    }
}
