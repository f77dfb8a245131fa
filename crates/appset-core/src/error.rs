//! Common error types for the engine crates.
//!
//! This module provides shared error types that are used across multiple crates.

use thiserror::Error;

/// A result type using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core errors that can occur throughout the engine.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A server version string could not be parsed.
    #[error("invalid server version: {0}")]
    Version(#[from] crate::version::VersionError),

    /// An engine setting has a value that cannot be read.
    #[error("configuration error: {0}")]
    Config(String),
}
