//! Credential references.
//!
//! These point at Kubernetes secrets that hold credential material; they never
//! carry the material itself.

use serde::{Deserialize, Serialize};

/// A key inside a named secret.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretRef {
    /// Name of the secret.
    #[serde(default)]
    pub secret_name: String,
    /// Key within the secret's data.
    #[serde(default)]
    pub key: String,
}

impl SecretRef {
    /// Create a reference to `key` in `secret_name`.
    #[must_use]
    pub fn new(secret_name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            secret_name: secret_name.into(),
            key: key.into(),
        }
    }
}

/// Username and password reference for Bitbucket Server (and Cloud pull
/// request) APIs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicAuthBitbucketServer {
    /// Username for the API.
    #[serde(default)]
    pub username: String,
    /// Secret holding the password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_ref: Option<SecretRef>,
}

/// Bearer token reference for Bitbucket Cloud.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BearerTokenBitbucketCloud {
    /// Secret holding the token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_ref: Option<SecretRef>,
}
