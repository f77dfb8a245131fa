//! Core types and utilities for the application-set generator engine.
//!
//! This crate provides the foundational types shared by the model, engine and CLI crates:
//!
//! - **Server versions**: A semantic version of the remote server, backed by `semver`
//! - **Feature gates**: The fixed table of capabilities and the minimum server version each needs
//! - **Configuration**: [`EngineConfig`] loaded from the environment
//! - **Error types**: Common error definitions shared across crates
//!
//! # Example
//!
//! ```
//! use appset_core::{Feature, FeatureSet, ServerVersion};
//!
//! let version: ServerVersion = "v2.7.4+a1b2c3d".parse().unwrap();
//! let features = FeatureSet::for_version(version);
//!
//! assert!(features.is_supported(Feature::ApplicationSetProgressiveSync));
//! assert!(!features.is_supported(Feature::MultipleApplicationSources));
//! assert!(features.require(Feature::MultipleApplicationSources).is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod version;

pub use config::EngineConfig;
pub use error::{CoreError, Result};
pub use version::{Feature, FeatureError, FeatureSet, ServerVersion, VersionError};
