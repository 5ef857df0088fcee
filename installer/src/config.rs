//! Preprocessor configuration loaded from `splitvault.toml`.
//!
//! Every key is optional. Values given on the command line take precedence
//! over the file, and anything still unset falls back to a default: the
//! storage root to the platform data directory, the asset prefix to
//! [`DEFAULT_ASSET_PREFIX`]. The bundle and the digest manifest have no
//! default and must be supplied before a split can be loaded.
//!
//! ```toml
//! storage_root = "/var/lib/app/splits"
//! bundle = "/opt/app/app.apk"
//! asset_prefix = "assets/"
//! manifest = "/opt/app/splits.json"
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::io;
use thiserror::Error;

use crate::bundle::{ArchiveBundle, BundleAssets, DEFAULT_ASSET_PREFIX, DirectoryBundle};
use crate::dirs::BaseDirs;
use crate::layout::SplitPathManager;
use crate::manifest::DigestManifest;

/// File name looked up in the working directory when no path is given.
pub const CONFIG_FILENAME: &str = "splitvault.toml";

/// Errors arising from loading or applying configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// Path to the configuration file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The configuration file is not valid TOML or has unknown keys.
    #[error("invalid config {path}: {source}")]
    Parse {
        /// Path to the configuration file.
        path: Utf8PathBuf,
        /// The TOML decoding error.
        #[source]
        source: Box<toml::de::Error>,
    },

    /// No bundle was configured.
    #[error("no bundle configured; set `bundle` in {CONFIG_FILENAME} or pass --bundle")]
    MissingBundle,

    /// The configured bundle does not exist.
    #[error("bundle {0} does not exist")]
    BundleNotFound(Utf8PathBuf),

    /// No digest manifest was configured.
    #[error("no digest manifest configured; set `manifest` in {CONFIG_FILENAME} or pass --manifest")]
    MissingManifest,
}

/// Settings for locating storage, the bundle, and the digest manifest.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PreprocessorConfig {
    /// Directory holding one subdirectory per split.
    pub storage_root: Option<Utf8PathBuf>,
    /// Asset directory or zip host bundle containing built-in splits.
    pub bundle: Option<Utf8PathBuf>,
    /// Entry prefix of split assets inside a zip host bundle.
    pub asset_prefix: Option<String>,
    /// JSON digest manifest used to verify artifacts.
    pub manifest: Option<Utf8PathBuf>,
}

impl PreprocessorConfig {
    /// Parse configuration text read from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys.
    pub fn parse(path: &Utf8Path, source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|e| ConfigError::Parse {
            path: path.to_owned(),
            source: Box::new(e),
        })
    }

    /// Read and parse the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file cannot be read, or
    /// [`ConfigError::Parse`] if it is invalid.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::parse(path, &source)
    }

    /// Load `explicit` when given, otherwise [`CONFIG_FILENAME`] from the
    /// working directory when it exists, otherwise the defaults.
    ///
    /// # Errors
    ///
    /// Returns any error from [`PreprocessorConfig::load`].
    pub fn discover(explicit: Option<&Utf8Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load(path),
            None if Utf8Path::new(CONFIG_FILENAME).is_file() => {
                Self::load(Utf8Path::new(CONFIG_FILENAME))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply every value set in `overrides` on top of `self`.
    #[must_use]
    pub fn with_overrides(self, overrides: Self) -> Self {
        Self {
            storage_root: overrides.storage_root.or(self.storage_root),
            bundle: overrides.bundle.or(self.bundle),
            asset_prefix: overrides.asset_prefix.or(self.asset_prefix),
            manifest: overrides.manifest.or(self.manifest),
        }
    }

    /// The effective asset prefix.
    #[must_use]
    pub fn asset_prefix(&self) -> &str {
        self.asset_prefix.as_deref().unwrap_or(DEFAULT_ASSET_PREFIX)
    }

    /// Build the path manager for the configured storage root, falling back
    /// to the platform data directory.
    ///
    /// # Errors
    ///
    /// Returns an error when no storage root is configured and the data
    /// directory cannot be determined.
    pub fn path_manager(&self, dirs: &dyn BaseDirs) -> crate::error::Result<SplitPathManager> {
        match &self.storage_root {
            Some(root) => Ok(SplitPathManager::new(root.clone())),
            None => SplitPathManager::from_dirs(dirs),
        }
    }

    /// Open the configured bundle.
    ///
    /// A directory is served as a [`DirectoryBundle`]; any other file is read
    /// as a zip [`ArchiveBundle`] under [`PreprocessorConfig::asset_prefix`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingBundle`] when no bundle is configured,
    /// or [`ConfigError::BundleNotFound`] when the path does not exist.
    pub fn open_bundle(&self) -> Result<Box<dyn BundleAssets>, ConfigError> {
        let path = self.bundle.as_ref().ok_or(ConfigError::MissingBundle)?;
        if path.is_dir() {
            Ok(Box::new(DirectoryBundle::new(path.clone())))
        } else if path.is_file() {
            Ok(Box::new(ArchiveBundle::new(
                path.clone(),
                self.asset_prefix(),
            )))
        } else {
            Err(ConfigError::BundleNotFound(path.clone()))
        }
    }

    /// Load the configured digest manifest.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingManifest`] when no manifest is
    /// configured, or the manifest's own load error.
    pub fn load_manifest(&self) -> crate::error::Result<DigestManifest> {
        let path = self.manifest.as_ref().ok_or(ConfigError::MissingManifest)?;
        Ok(DigestManifest::load(path)?)
    }
}
