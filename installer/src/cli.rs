//! CLI argument definitions for the splitvault installer.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use crate::config::PreprocessorConfig;
use crate::error::PreprocessError;
use crate::split::SplitName;
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;

/// Lock, copy, and verify split packages before they are loaded.
#[derive(Parser, Debug)]
#[command(name = "splitvault-installer")]
#[command(version, about)]
#[command(long_about = concat!(
    "Lock, copy, and verify split packages before they are loaded.\n\n",
    "Each split lives in its own directory under the storage root. Loading a ",
    "split takes an exclusive lock on that directory, copies built-in splits ",
    "out of the host bundle when needed, and checks the artifact against the ",
    "digest manifest. Downloaded splits that fail the check are deleted.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Prepare two built-in splits from an application bundle:\n",
    "    $ splitvault-installer --bundle app.apk --manifest splits.json load --built-in java native\n\n",
    "  Verify a downloaded split:\n",
    "    $ splitvault-installer --bundle app.apk --manifest splits.json load maps\n\n",
    "  Show which splits are stored:\n",
    "    $ splitvault-installer status java native maps\n\n",
    "Settings may also be kept in splitvault.toml in the working directory.",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Prepare splits for loading.
    Load(LoadArgs),

    /// Report which splits have an artifact, without changing anything.
    Status(StatusArgs),
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Configuration file [default: ./splitvault.toml when present].
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Directory holding one subdirectory per split.
    #[arg(long, global = true, value_name = "DIR")]
    pub storage_root: Option<Utf8PathBuf>,

    /// Asset directory or zip host bundle containing built-in splits.
    #[arg(long, global = true, value_name = "PATH")]
    pub bundle: Option<Utf8PathBuf>,

    /// Entry prefix of split assets inside a zip host bundle.
    #[arg(long, global = true, value_name = "PREFIX")]
    pub asset_prefix: Option<String>,

    /// JSON digest manifest used to verify artifacts.
    #[arg(long, global = true, value_name = "FILE")]
    pub manifest: Option<Utf8PathBuf>,

    /// Increase log output (repeatable: -v, -vv).
    #[arg(
        short,
        long = "verbose",
        global = true,
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, global = true, conflicts_with = "verbosity")]
    pub quiet: bool,
}

/// Arguments for the load command.
#[derive(Args, Debug, Clone)]
pub struct LoadArgs {
    /// Splits to prepare.
    #[arg(required = true, value_name = "SPLIT", value_parser = parse_split_name)]
    pub splits: Vec<SplitName>,

    /// Treat the splits as shipped inside the bundle rather than downloaded.
    #[arg(long)]
    pub built_in: bool,
}

/// Arguments for the status command.
#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    /// Splits to inspect.
    #[arg(required = true, value_name = "SPLIT", value_parser = parse_split_name)]
    pub splits: Vec<SplitName>,
}

fn parse_split_name(value: &str) -> Result<SplitName, PreprocessError> {
    SplitName::new(value)
}

impl GlobalArgs {
    /// Return the values given on the command line as configuration
    /// overrides.
    ///
    /// # Examples
    ///
    /// ```
    /// use camino::{Utf8Path, Utf8PathBuf};
    /// use splitvault_installer::cli::GlobalArgs;
    ///
    /// let args = GlobalArgs {
    ///     bundle: Some(Utf8PathBuf::from("app.apk")),
    ///     ..GlobalArgs::default()
    /// };
    /// let overrides = args.config_overrides();
    /// assert_eq!(overrides.bundle.as_deref(), Some(Utf8Path::new("app.apk")));
    /// assert!(overrides.manifest.is_none());
    /// ```
    #[must_use]
    pub fn config_overrides(&self) -> PreprocessorConfig {
        PreprocessorConfig {
            storage_root: self.storage_root.clone(),
            bundle: self.bundle.clone(),
            asset_prefix: self.asset_prefix.clone(),
            manifest: self.manifest.clone(),
        }
    }

    /// Default log level when `RUST_LOG` is unset.
    #[must_use]
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbosity {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
