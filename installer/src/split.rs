//! Split identity and descriptor types.
//!
//! A split is an independently deliverable package. [`SplitName`] is the
//! validated key used for its storage directory, bundle asset, and artifact
//! file, so it is restricted to characters that are safe in a single path
//! component. [`SplitInfo`] pairs the name with where the bytes come from.

use crate::error::{PreprocessError, Result};
use crate::layout::TMP_DIRNAME;
use std::fmt;

/// Extension of a split's entry in the host bundle's asset namespace.
pub const DOT_ZIP: &str = ".zip";

/// Extension of the published split artifact.
pub const DOT_APK: &str = ".apk";

/// A validated split name.
///
/// # Examples
///
/// ```
/// use splitvault_installer::split::SplitName;
///
/// let name = SplitName::new("java_feature").unwrap();
/// assert_eq!(name.asset_name(), "java_feature.zip");
/// assert!(SplitName::new("../escape").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SplitName(String);

impl SplitName {
    /// Create a split name after validating it.
    ///
    /// # Errors
    ///
    /// Returns [`PreprocessError::InvalidSplitName`] when the value is empty,
    /// starts with a dot, names the scratch directory, or contains characters
    /// other than ASCII alphanumerics, `_`, `-`, and `.`.
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        validate(&value)?;
        Ok(Self(value))
    }

    /// Get the split name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of this split's entry in the bundle asset namespace.
    #[must_use]
    pub fn asset_name(&self) -> String {
        format!("{}{DOT_ZIP}", self.0)
    }

    /// File name of this split's published artifact.
    #[must_use]
    pub fn artifact_file_name(&self) -> String {
        format!("{}{DOT_APK}", self.0)
    }

    /// Prefix for scratch files created while copying this split.
    #[must_use]
    pub fn temp_prefix(&self) -> String {
        format!("tmp-{}", self.0)
    }
}

fn validate(value: &str) -> Result<()> {
    let reason = if value.is_empty() {
        Some("name must not be empty")
    } else if value.starts_with('.') {
        Some("name must not start with '.'")
    } else if value == TMP_DIRNAME {
        Some("name is reserved for the scratch directory")
    } else if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        Some("name may only contain ASCII letters, digits, '_', '-', and '.'")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(PreprocessError::InvalidSplitName {
            value: value.to_owned(),
            reason,
        }),
        None => Ok(()),
    }
}

impl TryFrom<&str> for SplitName {
    type Error = PreprocessError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<String> for SplitName {
    type Error = PreprocessError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl AsRef<str> for SplitName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SplitName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a split's bytes originate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SplitOrigin {
    /// Embedded in the host bundle and always available offline.
    BuiltIn,
    /// Fetched from a remote source at runtime.
    Downloaded,
}

/// Immutable description of one split, owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitInfo {
    name: SplitName,
    origin: SplitOrigin,
}

impl SplitInfo {
    /// Describe a split with an explicit origin.
    #[must_use]
    pub fn new(name: SplitName, origin: SplitOrigin) -> Self {
        Self { name, origin }
    }

    /// Describe a split shipped inside the host bundle.
    #[must_use]
    pub fn built_in(name: SplitName) -> Self {
        Self::new(name, SplitOrigin::BuiltIn)
    }

    /// Describe a split delivered by download.
    #[must_use]
    pub fn downloaded(name: SplitName) -> Self {
        Self::new(name, SplitOrigin::Downloaded)
    }

    /// The split's name.
    #[must_use]
    pub fn name(&self) -> &SplitName {
        &self.name
    }

    /// Where the split's bytes come from.
    #[must_use]
    pub fn origin(&self) -> SplitOrigin {
        self.origin
    }

    /// Return `true` for splits embedded in the host bundle.
    #[must_use]
    pub fn is_built_in(&self) -> bool {
        self.origin == SplitOrigin::BuiltIn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::simple("java")]
    #[case::underscore("native_feature")]
    #[case::dashed("feature-2")]
    #[case::dotted("com.example.feature")]
    fn accepts_component_safe_names(#[case] value: &str) {
        let name = SplitName::new(value).expect("valid split name");
        assert_eq!(name.as_str(), value);
    }

    #[rstest]
    #[case::empty("", "empty")]
    #[case::hidden(".hidden", "start with '.'")]
    #[case::parent("..", "start with '.'")]
    #[case::separator("a/b", "may only contain")]
    #[case::backslash("a\\b", "may only contain")]
    #[case::space("my split", "may only contain")]
    #[case::scratch("tmp", "reserved")]
    fn rejects_unsafe_names(#[case] value: &str, #[case] expected: &str) {
        let err = SplitName::new(value).expect_err("invalid split name");
        assert!(
            matches!(&err, PreprocessError::InvalidSplitName { reason, .. } if reason.contains(expected)),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn derived_file_names_use_fixed_extensions() {
        let name = SplitName::new("java").expect("valid split name");
        assert_eq!(name.asset_name(), "java.zip");
        assert_eq!(name.artifact_file_name(), "java.apk");
        assert_eq!(name.temp_prefix(), "tmp-java");
    }

    #[test]
    fn split_info_reports_origin() {
        let name = SplitName::new("java").expect("valid split name");
        assert!(SplitInfo::built_in(name.clone()).is_built_in());
        assert!(!SplitInfo::downloaded(name).is_built_in());
    }
}
