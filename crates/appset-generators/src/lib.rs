//! Expand and flatten application-set generator trees.
//!
//! This crate converts between two shapes of the same configuration:
//!
//! - the raw shape: nested blocks as stored by a declarative infrastructure
//!   tool, addressed through [`ResourceData`]
//! - the wire shape: the typed [`appset_model`] structs sent to the server
//!
//! Expansion is gated by the server's [`FeatureSet`] and bounded by a
//! [`NestingLevel`] budget: composites (matrix, merge) may be stacked two
//! deep, and the second level travels as an opaque JSON document.
//!
//! # Example
//!
//! ```
//! use appset_core::FeatureSet;
//! use appset_generators::{expand_application_set, ExpandContext, ResourceData};
//! use serde_json::json;
//!
//! let data = ResourceData::new(json!({"spec": [{
//!     "generator": [{"clusters": [{"enabled": true}]}],
//!     "template": [{"metadata": [{"name": "{{name}}-guestbook"}]}],
//! }]}));
//! let ctx = ExpandContext::new(FeatureSet::all());
//! let spec = expand_application_set(&data, &ctx).unwrap();
//! assert_eq!(spec.generators.len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod attrs;
pub mod composite;
pub mod dispatch;
pub mod error;
pub mod leaf;
pub mod level;
pub mod nested;
pub mod resource_data;
pub mod secret_ref;
pub mod selector;
pub mod spec;
pub mod template;

pub use dispatch::{expand_generator, expand_generators, flatten_generator, flatten_generators};
pub use error::{GeneratorError, Result};
pub use level::NestingLevel;
pub use resource_data::ResourceData;
pub use spec::{expand_application_set, flatten_application_set};
pub use template::TemplateOverride;

use appset_core::{EngineConfig, FeatureSet};

/// Per-call settings for expansion.
///
/// Built once per server connection and passed by reference; there is no
/// process-wide state, so contexts for different servers can coexist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandContext {
    /// Capabilities of the target server.
    pub features: FeatureSet,
    /// Reject blocks that populate more than one kind or provider.
    pub strict: bool,
}

impl ExpandContext {
    /// A lenient context for the given features.
    #[must_use]
    pub fn new(features: FeatureSet) -> Self {
        Self {
            features,
            strict: false,
        }
    }

    /// Set strict dispatch.
    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

impl Default for ExpandContext {
    fn default() -> Self {
        Self::new(FeatureSet::all())
    }
}

impl From<&EngineConfig> for ExpandContext {
    fn from(config: &EngineConfig) -> Self {
        Self::new(config.feature_set()).with_strict(config.strict)
    }
}
