//! Typed wire model of the application-set API.
//!
//! These types mirror the JSON the remote server accepts and returns for
//! application sets. They carry no behaviour beyond small helpers for moving
//! between the polymorphic generator structs and the tagged enums the engine
//! works with.
//!
//! # Generator levels
//!
//! The server stores generators at three levels:
//!
//! - [`ApplicationSetGenerator`]: top-level slot; every kind is a typed field
//! - [`ApplicationSetNestedGenerator`]: child of a matrix or merge; nested
//!   matrix/merge children are opaque JSON documents
//! - [`ApplicationSetTerminalGenerator`]: grandchild; leaf kinds only
//!
//! # Example
//!
//! ```
//! use appset_model::{ApplicationSetGenerator, Generator, GeneratorKind, LeafGenerator, ListGenerator};
//!
//! let generator = ApplicationSetGenerator::from(Generator::Leaf(LeafGenerator::List(
//!     ListGenerator::default(),
//! )));
//! assert_eq!(generator.kind(), Some(GeneratorKind::List));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod application_set;
pub mod error;
pub mod generator;
pub mod pull_request;
pub mod scm;
pub mod secret;
pub mod template;

pub use application_set::{
    ApplicationMatchExpression, ApplicationSetIgnoreDifferences, ApplicationSetRolloutStep,
    ApplicationSetRolloutStrategy, ApplicationSetSpec, ApplicationSetStrategy,
    ApplicationSetSyncPolicy,
};
pub use error::{ModelError, Result};
pub use generator::{
    ApplicationSetGenerator, ApplicationSetNestedGenerator, ApplicationSetTerminalGenerator,
    ClusterGenerator, DuckTypeGenerator, Generator, GeneratorKind, GitDirectoryGeneratorItem,
    GitFileGeneratorItem, GitGenerator, LeafGenerator, LeafSlots, ListGenerator, MatrixGenerator,
    MergeGenerator, NestedGenerator, NestedMatrixGenerator, NestedMergeGenerator,
};
pub use pull_request::{
    PullRequestGenerator, PullRequestGeneratorAzureDevOps, PullRequestGeneratorBitbucket,
    PullRequestGeneratorBitbucketServer, PullRequestGeneratorFilter, PullRequestGeneratorGitea,
    PullRequestGeneratorGithub, PullRequestGeneratorGitlab, PullRequestProvider,
};
pub use scm::{
    ScmProvider, ScmProviderGenerator, ScmProviderGeneratorAzureDevOps,
    ScmProviderGeneratorBitbucket, ScmProviderGeneratorBitbucketServer, ScmProviderGeneratorFilter,
    ScmProviderGeneratorGitea, ScmProviderGeneratorGithub, ScmProviderGeneratorGitlab,
};
pub use secret::{BasicAuthBitbucketServer, BearerTokenBitbucketCloud, SecretRef};
pub use template::{
    ApplicationDestination, ApplicationSetTemplate, ApplicationSetTemplateMeta, ApplicationSource,
    ApplicationSourceDirectory, ApplicationSourceHelm, ApplicationSourceKustomize, ApplicationSpec,
    Backoff, HelmParameter, ResourceIgnoreDifferences, RetryStrategy, SyncPolicy,
    SyncPolicyAutomated,
};

/// Re-export of the Kubernetes types the model embeds.
pub mod k8s {
    pub use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::JSON;
    pub use k8s_openapi::apimachinery::pkg::apis::meta::v1::{
        LabelSelector, LabelSelectorRequirement,
    };
    pub use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
}
