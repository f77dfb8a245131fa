//! Error types for model conversions.

use thiserror::Error;

use crate::generator::GeneratorKind;

/// A result type using `ModelError`.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors that can occur when moving generators between levels.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A nested composite generator has a composite child of its own.
    #[error("nested {parent} generator cannot contain a {child} generator")]
    CompositeTooDeep {
        /// The nested composite being converted.
        parent: GeneratorKind,
        /// The composite child found inside it.
        child: GeneratorKind,
    },
}
