//! Generator kind dispatch.
//!
//! A raw generator block holds one sub-block per kind and is expected to
//! populate exactly one. Kinds are scanned in [`GeneratorKind::ALL`] order,
//! restricted to those reachable at the current [`NestingLevel`].

use appset_model::k8s::LabelSelector;
use appset_model::{ApplicationSetGenerator, Generator, GeneratorKind, LeafGenerator};
use tracing::{debug, warn};

use crate::attrs::{self, BlockWriter, RawMap};
use crate::error::{GeneratorError, Result};
use crate::leaf::{cluster_decision_resource, clusters, git, list, pull_request, scm_provider};
use crate::level::NestingLevel;
use crate::{composite, leaf, selector, ExpandContext};

/// Raw block key of a generator kind.
#[must_use]
pub const fn raw_key(kind: GeneratorKind) -> &'static str {
    match kind {
        GeneratorKind::ClusterDecisionResource => "cluster_decision_resource",
        GeneratorKind::Clusters => "clusters",
        GeneratorKind::Git => "git",
        GeneratorKind::List => "list",
        GeneratorKind::Matrix => "matrix",
        GeneratorKind::Merge => "merge",
        GeneratorKind::ScmProvider => "scm_provider",
        GeneratorKind::PullRequest => "pull_request",
    }
}

/// Choose the kind of a raw generator block.
///
/// # Errors
///
/// - [`GeneratorError::NoKind`] if nothing is populated
/// - [`GeneratorError::NestingTooDeep`] if only composites are populated
///   and the level does not allow them
/// - [`GeneratorError::AmbiguousKind`] in strict mode if several kinds are
///   populated
pub fn select_kind(raw: &RawMap, level: NestingLevel, strict: bool) -> Result<GeneratorKind> {
    let mut populated = Vec::new();
    for kind in GeneratorKind::ALL {
        if attrs::block(raw, raw_key(kind))?.is_some() {
            populated.push(kind);
        }
    }

    let Some(selected) = populated
        .iter()
        .copied()
        .find(|kind| level.reachable_kinds().any(|reachable| reachable == *kind))
    else {
        return Err(populated
            .first()
            .map_or(GeneratorError::NoKind, |&kind| {
                GeneratorError::NestingTooDeep { kind }
            }));
    };

    if populated.len() > 1 {
        let names = populated
            .iter()
            .map(|kind| raw_key(*kind))
            .collect::<Vec<_>>()
            .join(", ");
        if strict {
            return Err(GeneratorError::AmbiguousKind {
                context: "generator",
                populated: names,
            });
        }
        warn!(
            populated = %names,
            selected = %selected,
            level = level.get(),
            "Generator block populates more than one kind, using the first"
        );
    }

    debug!(kind = %selected, level = level.get(), "Selected generator kind");
    Ok(selected)
}

/// Expand a list of raw generator blocks at `level`.
///
/// # Errors
///
/// Returns the first error from any block; no partial list is produced.
pub fn expand_generators(
    blocks: &[&RawMap],
    level: NestingLevel,
    ctx: &ExpandContext,
) -> Result<Vec<ApplicationSetGenerator>> {
    blocks
        .iter()
        .map(|raw| expand_generator(raw, level, ctx))
        .collect()
}

/// Expand one raw generator block at `level`.
///
/// # Errors
///
/// Returns an error if no kind can be selected or the selected kind's block
/// is malformed.
pub fn expand_generator(
    raw: &RawMap,
    level: NestingLevel,
    ctx: &ExpandContext,
) -> Result<ApplicationSetGenerator> {
    let kind = select_kind(raw, level, ctx.strict)?;
    let block = attrs::block(raw, raw_key(kind))?.ok_or(GeneratorError::NoKind)?;

    let generator = match kind {
        GeneratorKind::ClusterDecisionResource => Generator::Leaf(
            LeafGenerator::ClusterDecisionResource(cluster_decision_resource::expand(block, ctx)?),
        ),
        GeneratorKind::Clusters => {
            Generator::Leaf(LeafGenerator::Clusters(clusters::expand(block, ctx)?))
        }
        GeneratorKind::Git => Generator::Leaf(LeafGenerator::Git(git::expand(block, ctx)?)),
        GeneratorKind::List => Generator::Leaf(LeafGenerator::List(list::expand(block, ctx)?)),
        GeneratorKind::Matrix => Generator::Matrix(composite::expand_matrix(block, level, ctx)?),
        GeneratorKind::Merge => Generator::Merge(composite::expand_merge(block, level, ctx)?),
        GeneratorKind::ScmProvider => {
            Generator::Leaf(LeafGenerator::ScmProvider(scm_provider::expand(block, ctx)?))
        }
        GeneratorKind::PullRequest => {
            Generator::Leaf(LeafGenerator::PullRequest(pull_request::expand(block, ctx)?))
        }
    };

    let selector = selector::expand(raw, "selector")?;
    Ok(ApplicationSetGenerator::from(generator).with_selector(selector))
}

/// Flatten a list of wire generators.
///
/// # Errors
///
/// Returns the first error from any generator.
pub fn flatten_generators(generators: &[ApplicationSetGenerator]) -> Result<Vec<RawMap>> {
    generators.iter().map(flatten_generator).collect()
}

/// Flatten one wire generator into a raw generator block.
///
/// # Errors
///
/// Returns [`GeneratorError::NoKind`] if no kind is populated, or an error
/// from the kind's codec.
pub fn flatten_generator(generator: &ApplicationSetGenerator) -> Result<RawMap> {
    let (variant, selector) = generator.clone().into_parts();
    let variant = variant.ok_or(GeneratorError::NoKind)?;
    let block = match &variant {
        Generator::Leaf(leaf) => leaf::flatten(leaf)?,
        Generator::Matrix(matrix) => composite::flatten_matrix(matrix)?,
        Generator::Merge(merge) => composite::flatten_merge(merge)?,
    };
    Ok(generator_block(variant.kind(), block, selector.as_ref()))
}

/// Wrap a kind block and an optional post-filter selector into a raw
/// generator block.
pub(crate) fn generator_block(
    kind: GeneratorKind,
    block: RawMap,
    selector: Option<&LabelSelector>,
) -> RawMap {
    BlockWriter::new()
        .block(raw_key(kind), Some(block))
        .block("selector", selector::flatten(selector))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn object(value: &Value) -> &RawMap {
        value.as_object().unwrap()
    }

    #[test]
    fn empty_block_has_no_kind() {
        let raw = json!({"selector": [{"match_labels": {"a": "b"}}]});
        let err = select_kind(object(&raw), NestingLevel::TOP, false).unwrap_err();
        assert_eq!(err.to_string(), "no generator kind specified");
    }

    #[test]
    fn first_kind_wins_when_lenient() {
        let raw = json!({
            "list": [{"elements": []}],
            "clusters": [{"enabled": true}],
        });
        let kind = select_kind(object(&raw), NestingLevel::TOP, false).unwrap();
        assert_eq!(kind, GeneratorKind::Clusters);
    }

    #[test]
    fn several_kinds_rejected_when_strict() {
        let raw = json!({
            "list": [{"elements": []}],
            "git": [{"repo_url": "x"}],
        });
        match select_kind(object(&raw), NestingLevel::TOP, true) {
            Err(GeneratorError::AmbiguousKind { context, populated }) => {
                assert_eq!(context, "generator");
                assert_eq!(populated, "git, list");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn composite_unreachable_at_leaf_level() {
        let raw = json!({"matrix": [{"generator": []}]});
        assert!(matches!(
            select_kind(object(&raw), NestingLevel::new(1), false),
            Err(GeneratorError::NestingTooDeep {
                kind: GeneratorKind::Matrix
            })
        ));
        assert_eq!(
            select_kind(object(&raw), NestingLevel::new(2), false).unwrap(),
            GeneratorKind::Matrix
        );
    }

    #[test]
    fn leaf_wins_over_unreachable_composite() {
        let raw = json!({
            "git": [{"repo_url": "x"}],
            "merge": [{"merge_keys": ["server"]}],
        });
        assert_eq!(
            select_kind(object(&raw), NestingLevel::new(1), false).unwrap(),
            GeneratorKind::Git
        );
    }

    #[test]
    fn selector_travels_with_generator() {
        let raw = json!({
            "clusters": [{"enabled": true}],
            "selector": [{"match_labels": {"env": "prod"}}],
        });
        let generator =
            expand_generator(object(&raw), NestingLevel::TOP, &ExpandContext::default()).unwrap();
        assert!(generator.leaves.clusters.is_some());
        assert!(generator.selector.is_some());
        assert_eq!(Value::Object(flatten_generator(&generator).unwrap()), raw);
    }

    #[test]
    fn flatten_empty_generator() {
        assert!(matches!(
            flatten_generator(&ApplicationSetGenerator::default()),
            Err(GeneratorError::NoKind)
        ));
    }
}
