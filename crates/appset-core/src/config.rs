//! Engine configuration.
//!
//! This module defines the settings a caller hands to the expand path: the
//! remote server version used for feature gating and the dispatcher's
//! strictness.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::version::{FeatureSet, ServerVersion};

/// Configuration for one engine instance (usually one server connection).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Version reported by the remote server. `None` enables every feature.
    #[serde(default)]
    pub server_version: Option<ServerVersion>,
    /// Reject generator blocks that populate more than one kind instead of
    /// picking the first one.
    #[serde(default)]
    pub strict: bool,
}

impl EngineConfig {
    /// Create a config for a server running `version`.
    #[must_use]
    pub fn with_server_version(version: ServerVersion) -> Self {
        Self {
            server_version: Some(version),
            ..Default::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Supported environment variables:
    /// - `ARGOCD_SERVER_VERSION`: Remote server version (e.g. `v2.9.3`)
    /// - `APPSET_STRICT`: Reject ambiguous generator blocks (`true`/`1`)
    ///
    /// Falls back to the default when either value is unreadable; use
    /// [`try_from_env`](Self::try_from_env) to surface the error instead.
    #[must_use]
    pub fn from_env() -> Self {
        Self::try_from_env().unwrap_or_default()
    }

    /// Load configuration from environment variables, rejecting bad values.
    ///
    /// Reads the same variables as [`from_env`](Self::from_env). Empty values
    /// count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Version`] if `ARGOCD_SERVER_VERSION` does not
    /// parse, or [`CoreError::Config`] if `APPSET_STRICT` is not a boolean.
    pub fn try_from_env() -> Result<Self> {
        Self::from_vars(
            std::env::var("ARGOCD_SERVER_VERSION").ok().as_deref(),
            std::env::var("APPSET_STRICT").ok().as_deref(),
        )
    }

    fn from_vars(server_version: Option<&str>, strict: Option<&str>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(val) = server_version.filter(|val| !val.trim().is_empty()) {
            config.server_version = Some(val.parse()?);
        }
        if let Some(val) = strict {
            config.strict = match val.to_lowercase().as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" | "" => false,
                other => {
                    return Err(CoreError::Config(format!(
                        "APPSET_STRICT must be a boolean, got {other:?}"
                    )))
                }
            };
        }
        Ok(config)
    }

    /// Derive the feature set for the configured server.
    #[must_use]
    pub fn feature_set(&self) -> FeatureSet {
        self.server_version
            .clone()
            .map_or_else(FeatureSet::all, FeatureSet::for_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::Feature;

    #[test]
    fn default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.server_version, None);
        assert!(!config.strict);
        assert_eq!(config.feature_set(), FeatureSet::all());
    }

    #[test]
    fn feature_set_follows_version() {
        let config = EngineConfig::with_server_version(ServerVersion::new(2, 6, 4));
        let features = config.feature_set();
        assert!(features.is_supported(Feature::ApplicationSetProgressiveSync));
        assert!(!features.is_supported(Feature::ApplicationSetApplicationsSyncPolicy));
    }

    #[test]
    fn vars_are_validated() {
        let config = EngineConfig::from_vars(Some("v2.10.1"), Some("YES")).unwrap();
        assert_eq!(config.server_version, Some(ServerVersion::new(2, 10, 1)));
        assert!(config.strict);

        let config = EngineConfig::from_vars(Some(""), None).unwrap();
        assert_eq!(config, EngineConfig::default());

        assert!(matches!(
            EngineConfig::from_vars(Some("two.eight"), None),
            Err(CoreError::Version(_))
        ));
        let err = EngineConfig::from_vars(None, Some("maybe")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "configuration error: APPSET_STRICT must be a boolean, got \"maybe\""
        );
    }

    #[test]
    fn deserialize_with_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"server_version":"v2.9.1"}"#).unwrap();
        assert_eq!(config.server_version, Some(ServerVersion::new(2, 9, 1)));
        assert!(!config.strict);
    }
}
