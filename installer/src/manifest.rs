//! Digest manifest for split verification.
//!
//! The manifest maps each split name to the SHA-256 digest of its approved
//! artifact:
//!
//! ```json
//! {
//!   "schema_version": 1,
//!   "splits": {
//!     "java": "<64 lowercase hex characters>"
//!   }
//! }
//! ```

use camino::Utf8Path;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use thiserror::Error;

use crate::split::SplitName;

/// Highest manifest schema version this build understands.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Expected length of a hex-encoded SHA-256 digest.
const DIGEST_HEX_LEN: usize = 64;

/// Errors arising from loading or parsing a digest manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest file could not be read.
    #[error("failed to read manifest {path}: {source}")]
    Read {
        /// Path to the manifest.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The manifest is not valid JSON or has the wrong shape.
    #[error("invalid manifest JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The manifest declares a schema version this build does not support.
    #[error("unsupported manifest schema version {value}; current maximum is {max}")]
    UnsupportedSchemaVersion {
        /// The rejected version.
        value: u32,
        /// The highest supported version.
        max: u32,
    },

    /// A digest is not a 64-character lowercase hex string.
    #[error("invalid SHA-256 digest for split {split}: {reason}")]
    InvalidDigest {
        /// The split whose entry is malformed.
        split: String,
        /// Description of the validation failure.
        reason: String,
    },

    /// A key of the `splits` table is not a valid split name.
    #[error("invalid split name \"{0}\" in manifest")]
    InvalidSplitName(String),
}

/// A validated hex-encoded SHA-256 digest.
///
/// # Examples
///
/// ```
/// use splitvault_installer::manifest::Sha256Digest;
///
/// let digest = Sha256Digest::of_bytes(b"hello");
/// assert_eq!(digest.as_str().len(), 64);
/// assert!(Sha256Digest::parse("not-hex").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sha256Digest(String);

impl Sha256Digest {
    /// Parse a 64-character lowercase hex digest.
    ///
    /// # Errors
    ///
    /// Returns a description of the violated constraint.
    pub fn parse(value: &str) -> Result<Self, String> {
        if value.len() != DIGEST_HEX_LEN {
            return Err(format!(
                "expected {DIGEST_HEX_LEN} hex characters, got {}",
                value.len()
            ));
        }
        if !value
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        {
            return Err("must contain only lowercase hex characters".to_owned());
        }
        Ok(Self(value.to_owned()))
    }

    /// Digest an in-memory buffer.
    #[must_use]
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(format!("{:x}", Sha256::digest(bytes)))
    }

    /// Stream a reader through SHA-256.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised by `reader`.
    pub fn of_reader(reader: &mut dyn Read) -> io::Result<Self> {
        let mut hasher = Sha256::new();
        let mut buffer = [0u8; 8192];
        loop {
            let bytes_read = reader.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(buffer.get(..bytes_read).unwrap_or_default());
        }
        Ok(Self(format!("{:x}", hasher.finalize())))
    }

    /// Digest the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read.
    pub fn of_file(path: &Utf8Path) -> io::Result<Self> {
        let mut file = File::open(path)?;
        Self::of_reader(&mut file)
    }

    /// Return the digest as a hex string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
    schema_version: u32,
    #[serde(default)]
    splits: BTreeMap<String, String>,
}

/// Approved digests keyed by split name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DigestManifest {
    digests: BTreeMap<SplitName, Sha256Digest>,
}

impl DigestManifest {
    /// Parse a manifest from JSON text.
    ///
    /// # Errors
    ///
    /// Returns a [`ManifestError`] when the JSON is malformed, the schema
    /// version is unsupported, or any entry is invalid.
    pub fn parse(json: &str) -> Result<Self, ManifestError> {
        let raw: RawManifest = serde_json::from_str(json)?;
        if raw.schema_version == 0 || raw.schema_version > CURRENT_SCHEMA_VERSION {
            return Err(ManifestError::UnsupportedSchemaVersion {
                value: raw.schema_version,
                max: CURRENT_SCHEMA_VERSION,
            });
        }

        let mut digests = BTreeMap::new();
        for (name, digest) in raw.splits {
            let digest = Sha256Digest::parse(&digest).map_err(|reason| {
                ManifestError::InvalidDigest {
                    split: name.clone(),
                    reason,
                }
            })?;
            let name =
                SplitName::new(name.as_str()).map_err(|_| ManifestError::InvalidSplitName(name))?;
            digests.insert(name, digest);
        }
        Ok(Self { digests })
    }

    /// Read and parse the manifest at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Read`] if the file cannot be read, or any
    /// error from [`DigestManifest::parse`].
    pub fn load(path: &Utf8Path) -> Result<Self, ManifestError> {
        let json = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::parse(&json)
    }

    /// Record the approved digest for `split`.
    pub fn insert(&mut self, split: SplitName, digest: Sha256Digest) {
        self.digests.insert(split, digest);
    }

    /// The approved digest for `split`, if any.
    #[must_use]
    pub fn digest(&self, split: &SplitName) -> Option<&Sha256Digest> {
        self.digests.get(split)
    }

    /// Number of splits in the manifest.
    #[must_use]
    pub fn len(&self) -> usize {
        self.digests.len()
    }

    /// Return `true` when the manifest lists no splits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }
}
