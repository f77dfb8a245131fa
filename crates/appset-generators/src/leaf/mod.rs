//! Codecs for the six leaf generator kinds.
//!
//! Each module reads one raw kind block into its wire struct and writes it
//! back. Dispatch between kinds lives in [`crate::dispatch`].

pub mod cluster_decision_resource;
pub mod clusters;
pub mod git;
pub mod list;
pub mod pull_request;
pub mod scm_provider;

use appset_model::{GeneratorKind, LeafGenerator};
use tracing::warn;

use crate::attrs::RawMap;
use crate::error::{GeneratorError, Result};
use crate::ExpandContext;

/// Write the raw block of a leaf generator.
///
/// # Errors
///
/// Returns [`GeneratorError::ListElement`] if a list element is not a JSON
/// object.
pub fn flatten(leaf: &LeafGenerator) -> Result<RawMap> {
    Ok(match leaf {
        LeafGenerator::ClusterDecisionResource(g) => cluster_decision_resource::flatten(g),
        LeafGenerator::Clusters(g) => clusters::flatten(g),
        LeafGenerator::Git(g) => git::flatten(g),
        LeafGenerator::List(g) => list::flatten(g)?,
        LeafGenerator::ScmProvider(g) => scm_provider::flatten(g),
        LeafGenerator::PullRequest(g) => pull_request::flatten(g),
    })
}

/// Pick the single provider of an SCM or pull request generator.
///
/// `providers` lists the populated provider blocks in declaration order.
fn pick_provider<T>(
    generator: GeneratorKind,
    providers: Vec<(&'static str, T)>,
    ctx: &ExpandContext,
) -> Result<T> {
    if providers.len() > 1 {
        let populated = providers
            .iter()
            .map(|(key, _)| *key)
            .collect::<Vec<_>>()
            .join(", ");
        if ctx.strict {
            return Err(GeneratorError::AmbiguousKind {
                context: generator.as_str(),
                populated,
            });
        }
        warn!(
            generator = %generator,
            populated = %populated,
            "More than one provider populated, using the first"
        );
    }
    providers
        .into_iter()
        .next()
        .map(|(_, provider)| provider)
        .ok_or(GeneratorError::NoProvider { generator })
}
