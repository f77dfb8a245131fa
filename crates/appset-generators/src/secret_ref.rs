//! Secret reference blocks.

use appset_model::{BasicAuthBitbucketServer, BearerTokenBitbucketCloud, SecretRef};

use crate::attrs::{self, BlockWriter, RawMap};
use crate::error::Result;

/// Read the secret reference block at `key`.
///
/// # Errors
///
/// Returns an error if the block or its fields have the wrong shape.
pub fn expand(raw: &RawMap, key: &str) -> Result<Option<SecretRef>> {
    attrs::block(raw, key)?
        .map(|block| {
            Ok(SecretRef {
                secret_name: attrs::string(block, "secret_name")?,
                key: attrs::string(block, "key")?,
            })
        })
        .transpose()
}

/// Write a secret reference block.
#[must_use]
pub fn flatten(secret: Option<&SecretRef>) -> Option<RawMap> {
    secret.map(|secret| {
        BlockWriter::new()
            .string("secret_name", &secret.secret_name)
            .string("key", &secret.key)
            .build()
    })
}

/// Read a `basic_auth` block.
///
/// # Errors
///
/// Returns an error if the block or its fields have the wrong shape.
pub fn expand_basic_auth(raw: &RawMap, key: &str) -> Result<Option<BasicAuthBitbucketServer>> {
    attrs::block(raw, key)?
        .map(|block| {
            Ok(BasicAuthBitbucketServer {
                username: attrs::string(block, "username")?,
                password_ref: expand(block, "password_ref")?,
            })
        })
        .transpose()
}

/// Write a `basic_auth` block.
#[must_use]
pub fn flatten_basic_auth(auth: Option<&BasicAuthBitbucketServer>) -> Option<RawMap> {
    auth.map(|auth| {
        BlockWriter::new()
            .string("username", &auth.username)
            .block("password_ref", flatten(auth.password_ref.as_ref()))
            .build()
    })
}

/// Read a `bearer_token` block.
///
/// # Errors
///
/// Returns an error if the block or its fields have the wrong shape.
pub fn expand_bearer_token(raw: &RawMap, key: &str) -> Result<Option<BearerTokenBitbucketCloud>> {
    attrs::block(raw, key)?
        .map(|block| {
            Ok(BearerTokenBitbucketCloud {
                token_ref: expand(block, "token_ref")?,
            })
        })
        .transpose()
}

/// Write a `bearer_token` block.
#[must_use]
pub fn flatten_bearer_token(token: Option<&BearerTokenBitbucketCloud>) -> Option<RawMap> {
    token.map(|token| {
        BlockWriter::new()
            .block("token_ref", flatten(token.token_ref.as_ref()))
            .build()
    })
}
