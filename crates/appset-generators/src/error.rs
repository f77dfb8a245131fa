//! Error types for the generator engine.
//!
//! Every error here describes a configuration shape problem. None are
//! transient and none leave partial output behind: an expand or flatten call
//! either returns a complete tree or one of these.

use appset_core::FeatureError;
use appset_model::{GeneratorKind, ModelError};
use thiserror::Error;

/// A result type using `GeneratorError`.
pub type Result<T> = std::result::Result<T, GeneratorError>;

/// Errors that can occur while expanding or flattening generators.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// A generator block has none of its kind sub-blocks populated.
    #[error("no generator kind specified")]
    NoKind,

    /// A block populates more than one mutually exclusive sub-block.
    #[error("{context} block populates more than one of: {populated}")]
    AmbiguousKind {
        /// The block being dispatched (`generator`, `scm_provider`, ...).
        context: &'static str,
        /// The populated sub-blocks, comma separated.
        populated: String,
    },

    /// A composite generator appears below the last level that allows one.
    #[error("{kind} generator cannot be nested at this depth")]
    NestingTooDeep {
        /// The composite kind found.
        kind: GeneratorKind,
    },

    /// A composite generator has the wrong number of children.
    #[error("{kind} generator requires {expected} child generators, got {got}")]
    Arity {
        /// The composite kind.
        kind: GeneratorKind,
        /// The accepted child count, in words.
        expected: &'static str,
        /// The number of children supplied.
        got: usize,
    },

    /// A merge generator has an empty `merge_keys` list.
    #[error("merge generator requires at least one merge key")]
    MissingMergeKeys,

    /// An SCM provider or pull request generator names no provider.
    #[error("no provider specified for {generator} generator")]
    NoProvider {
        /// The generator missing a provider.
        generator: GeneratorKind,
    },

    /// The configuration needs a capability the server lacks.
    #[error(transparent)]
    Unsupported(#[from] FeatureError),

    /// A nested composite generator could not be encoded.
    #[error("failed to marshal nested {kind} generator: {source}")]
    NestedEncode {
        /// The nested composite kind.
        kind: GeneratorKind,
        /// The underlying serializer error.
        source: serde_json::Error,
    },

    /// A nested composite generator blob could not be decoded.
    #[error("failed to unmarshal nested {kind} generator: {source}")]
    NestedDecode {
        /// The nested composite kind.
        kind: GeneratorKind,
        /// The underlying deserializer error.
        source: serde_json::Error,
    },

    /// A nested composite generator held a composite child of its own.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// A list generator element is not a string-keyed document.
    #[error("invalid list generator element {index}: {reason}")]
    ListElement {
        /// Position of the element.
        index: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// A numeric-as-string field does not hold an integer.
    #[error("invalid integer for {field}: {value:?}")]
    InvalidNumber {
        /// The attribute name.
        field: String,
        /// The text that failed to parse.
        value: String,
    },

    /// An attribute has the wrong JSON type.
    #[error("invalid attribute {key}: expected {expected}")]
    InvalidAttribute {
        /// The attribute name.
        key: String,
        /// The expected shape.
        expected: &'static str,
    },

    /// A key path does not address a value in the configuration.
    #[error("invalid configuration path {path}: {reason}")]
    Path {
        /// The path requested.
        path: String,
        /// Why it could not be resolved.
        reason: String,
    },
}

impl GeneratorError {
    /// Whether retrying the same call could succeed.
    ///
    /// Always `false`: these are configuration problems, not transient faults.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        false
    }

    pub(crate) fn invalid(key: &str, expected: &'static str) -> Self {
        Self::InvalidAttribute {
            key: key.to_string(),
            expected,
        }
    }
}
