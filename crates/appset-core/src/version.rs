//! Server versions and feature gates.
//!
//! A [`FeatureSet`] is built once per server connection and passed by reference
//! into every expand call. Nothing here is global, so several connections with
//! different server versions can coexist in one process.

use semver::{BuildMetadata, Version};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A semantic version reported by the remote server.
///
/// Parsing accepts a leading `v` and drops build metadata, so
/// `v2.8.3+abc123` is read as `2.8.3`. A pre-release tag is kept and orders
/// below its release: `2.8.0-rc1` does not have the 2.8.0 features.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServerVersion(Version);

impl ServerVersion {
    /// Create a release version from its components.
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(Version::new(major, minor, patch))
    }

    /// Return the major component.
    #[must_use]
    pub const fn major(&self) -> u64 {
        self.0.major
    }

    /// Return the minor component.
    #[must_use]
    pub const fn minor(&self) -> u64 {
        self.0.minor
    }

    /// Return the patch component.
    #[must_use]
    pub const fn patch(&self) -> u64 {
        self.0.patch
    }

    /// Whether this is a pre-release such as `2.9.0-rc3`.
    #[must_use]
    pub fn is_prerelease(&self) -> bool {
        !self.0.pre.is_empty()
    }
}

impl FromStr for ServerVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(VersionError::Empty);
        }

        let bare = trimmed.strip_prefix('v').unwrap_or(trimmed);
        let mut version = Version::parse(bare).map_err(|source| VersionError::Malformed {
            input: s.to_string(),
            source,
        })?;
        version.build = BuildMetadata::EMPTY;
        Ok(Self(version))
    }
}

impl fmt::Debug for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServerVersion({self})")
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ServerVersion {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ServerVersion> for String {
    fn from(version: ServerVersion) -> Self {
        version.to_string()
    }
}

/// Capabilities that only exist from a given server version onwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Application templates with more than one source.
    MultipleApplicationSources,
    /// `strategy` with rolling sync steps on an application set.
    ApplicationSetProgressiveSync,
    /// `sync_policy.applications_sync` on an application set.
    ApplicationSetApplicationsSyncPolicy,
    /// `ignore_application_differences` on an application set.
    ApplicationSetIgnoreApplicationDifferences,
    /// `template_patch` on an application set.
    ApplicationSetTemplatePatch,
}

impl Feature {
    /// Every known feature, in table order.
    pub const ALL: [Self; 5] = [
        Self::MultipleApplicationSources,
        Self::ApplicationSetProgressiveSync,
        Self::ApplicationSetApplicationsSyncPolicy,
        Self::ApplicationSetIgnoreApplicationDifferences,
        Self::ApplicationSetTemplatePatch,
    ];

    /// The first server version that supports this feature.
    #[must_use]
    pub const fn min_version(self) -> ServerVersion {
        match self {
            Self::MultipleApplicationSources | Self::ApplicationSetApplicationsSyncPolicy => {
                ServerVersion::new(2, 8, 0)
            }
            Self::ApplicationSetProgressiveSync => ServerVersion::new(2, 6, 0),
            Self::ApplicationSetIgnoreApplicationDifferences => ServerVersion::new(2, 9, 0),
            Self::ApplicationSetTemplatePatch => ServerVersion::new(2, 10, 0),
        }
    }

    /// Human-readable name used in error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MultipleApplicationSources => "multiple application sources",
            Self::ApplicationSetProgressiveSync => "application set progressive sync",
            Self::ApplicationSetApplicationsSyncPolicy => {
                "application set applications sync policy"
            }
            Self::ApplicationSetIgnoreApplicationDifferences => {
                "application set ignore application differences"
            }
            Self::ApplicationSetTemplatePatch => "application set template patch",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The capabilities of one connected server.
///
/// Built from the server's reported version. A set with no known version
/// enables every feature; offline tooling uses that when it has no server
/// to ask.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeatureSet {
    version: Option<ServerVersion>,
}

impl FeatureSet {
    /// Features available on a server running `version`.
    #[must_use]
    pub fn for_version(version: ServerVersion) -> Self {
        Self {
            version: Some(version),
        }
    }

    /// A set with every feature enabled.
    #[must_use]
    pub const fn all() -> Self {
        Self { version: None }
    }

    /// The server version this set was built from, if any.
    #[must_use]
    pub const fn version(&self) -> Option<&ServerVersion> {
        self.version.as_ref()
    }

    /// Check whether the server supports `feature`.
    #[must_use]
    pub fn is_supported(&self, feature: Feature) -> bool {
        self.version
            .as_ref()
            .map_or(true, |version| *version >= feature.min_version())
    }

    /// Require `feature`, naming the minimum version when it is missing.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::Unsupported`] if the server is older than the
    /// feature's minimum version.
    pub fn require(&self, feature: Feature) -> Result<(), FeatureError> {
        if self.is_supported(feature) {
            Ok(())
        } else {
            Err(FeatureError::Unsupported {
                feature,
                min_version: feature.min_version(),
            })
        }
    }
}

/// Errors that can occur when parsing a server version.
#[derive(Debug, thiserror::Error)]
pub enum VersionError {
    /// The input was empty.
    #[error("empty version string")]
    Empty,

    /// The input is not a semantic version.
    #[error("malformed version {input:?}: {source}")]
    Malformed {
        /// The text as given.
        input: String,
        /// Why the semver parser rejected it.
        source: semver::Error,
    },
}

/// A configuration shape needs a capability the server lacks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FeatureError {
    /// The feature is newer than the connected server.
    #[error("{feature} is only supported from ArgoCD {min_version} onwards")]
    Unsupported {
        /// The missing feature.
        feature: Feature,
        /// The first server version that has it.
        min_version: ServerVersion,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_parse_plain() {
        let version: ServerVersion = "2.8.3".parse().unwrap();
        assert_eq!(version, ServerVersion::new(2, 8, 3));
    }

    #[test]
    fn version_parse_prefix_and_metadata() {
        let version: ServerVersion = "v2.10.1+7f8e2a1".parse().unwrap();
        assert_eq!(version, ServerVersion::new(2, 10, 1));

        let version: ServerVersion = "v2.9.0-rc3+7f8e2a1".parse().unwrap();
        assert!(version.is_prerelease());
        assert_eq!(version.to_string(), "2.9.0-rc3");
        assert!(version < ServerVersion::new(2, 9, 0));
    }

    #[test]
    fn prerelease_lacks_release_features() {
        let rc = FeatureSet::for_version("v2.8.0-rc1".parse().unwrap());
        assert!(!rc.is_supported(Feature::MultipleApplicationSources));
        assert!(rc.is_supported(Feature::ApplicationSetProgressiveSync));

        let release = FeatureSet::for_version("v2.8.0".parse().unwrap());
        assert!(release.is_supported(Feature::MultipleApplicationSources));
    }

    #[test]
    fn version_parse_errors() {
        assert!(matches!("".parse::<ServerVersion>(), Err(VersionError::Empty)));
        assert!(matches!(
            "2.8".parse::<ServerVersion>(),
            Err(VersionError::Malformed { .. })
        ));
        let err = "2.x.1".parse::<ServerVersion>().unwrap_err();
        assert!(err.to_string().starts_with("malformed version \"2.x.1\""));
    }

    #[test]
    fn version_ordering() {
        assert!(ServerVersion::new(2, 10, 0) > ServerVersion::new(2, 9, 5));
        assert!(ServerVersion::new(3, 0, 0) > ServerVersion::new(2, 99, 99));
    }

    #[test]
    fn version_serde_json() {
        let version = ServerVersion::new(2, 8, 0);
        let json = serde_json::to_string(&version).unwrap();
        assert_eq!(json, "\"2.8.0\"");
        let parsed: ServerVersion = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, version);
    }

    #[test]
    fn feature_gate_boundaries() {
        let old = FeatureSet::for_version(ServerVersion::new(2, 7, 9));
        let exact = FeatureSet::for_version(ServerVersion::new(2, 8, 0));

        assert!(!old.is_supported(Feature::MultipleApplicationSources));
        assert!(exact.is_supported(Feature::MultipleApplicationSources));
        assert!(!exact.is_supported(Feature::ApplicationSetTemplatePatch));
    }

    #[test]
    fn feature_set_all() {
        let all = FeatureSet::all();
        assert!(Feature::ALL.iter().all(|f| all.is_supported(*f)));
        assert_eq!(all.version(), None);
    }

    #[test]
    fn feature_error_names_min_version() {
        let features = FeatureSet::for_version(ServerVersion::new(2, 5, 0));
        let err = features
            .require(Feature::MultipleApplicationSources)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "multiple application sources is only supported from ArgoCD 2.8.0 onwards"
        );
    }
}
