//! Shared helpers for splitvault crates.
//!
//! Currently this is the best-effort cleanup layer used by the installer when
//! quarantining corrupted splits and tidying scratch files.

pub mod cleanup;

pub use cleanup::{CleanupOutcome, remove_dir_tree, remove_file_quietly};
