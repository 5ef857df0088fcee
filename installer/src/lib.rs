//! Splitvault installer library.
//!
//! This crate prepares independently delivered split packages for loading.
//! Each split's directory is locked across threads and processes, built-in
//! splits are copied out of the host bundle, and every artifact is verified
//! before it is handed on. It is used by the `splitvault-installer` CLI
//! binary and can be consumed programmatically by hosts that load splits.
//!
//! # Modules
//!
//! - [`bundle`] - Read-only access to assets embedded in the host bundle
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - `splitvault.toml` configuration
//! - [`copier`] - Retrying, atomically publishing bundle copier
//! - [`decision`] - Decision table driving a load
//! - [`dirs`] - Directory resolution abstraction for platform-specific paths
//! - [`error`] - Semantic error types
//! - [`flow`] - One-shot preprocessing and read-only status
//! - [`janitor`] - Quarantine of corrupted splits
//! - [`layout`] - Storage layout and path management
//! - [`lock`] - Exclusive cross-process directory locks
//! - [`manifest`] - SHA-256 digest manifest
//! - [`output`] - Output formatting for the CLI
//! - [`preprocessor`] - The per-split load procedure
//! - [`split`] - Split names and descriptors
//! - [`validator`] - Signature validation and quarantine on failure

pub mod bundle;
pub mod cli;
pub mod config;
pub mod copier;
pub mod decision;
pub mod dirs;
pub mod error;
pub mod flow;
pub mod janitor;
pub mod layout;
pub mod lock;
pub mod manifest;
pub mod output;
pub mod preprocessor;
pub mod split;
#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
pub mod validator;
