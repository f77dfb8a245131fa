//! Application-set spec codec.
//!
//! The entry points of the engine. The raw spec lives at `spec.0` of the
//! resource data; fields newer than some servers support are gated on the
//! context's feature set.

use appset_core::Feature;
use appset_model::k8s::IntOrString;
use appset_model::{
    ApplicationMatchExpression, ApplicationSetIgnoreDifferences, ApplicationSetRolloutStep,
    ApplicationSetRolloutStrategy, ApplicationSetSpec, ApplicationSetStrategy,
    ApplicationSetSyncPolicy,
};
use serde_json::Value;
use tracing::debug;

use crate::attrs::{self, BlockWriter, RawMap};
use crate::error::{GeneratorError, Result};
use crate::level::NestingLevel;
use crate::resource_data::ResourceData;
use crate::{dispatch, template, ExpandContext};

/// Path of the raw spec block.
pub const SPEC_PATH: &str = "spec.0";

/// Expand the application-set spec stored in `data`.
///
/// # Errors
///
/// Returns an error if the spec block is missing or malformed, or if it uses
/// a feature the target server lacks.
pub fn expand_application_set(
    data: &ResourceData,
    ctx: &ExpandContext,
) -> Result<ApplicationSetSpec> {
    let raw = data
        .get_block(SPEC_PATH)?
        .ok_or_else(|| GeneratorError::Path {
            path: SPEC_PATH.to_string(),
            reason: "no spec block".to_string(),
        })?;
    expand_spec(raw, ctx)
}

/// Flatten `spec` and store it at `spec` in `data`.
///
/// # Errors
///
/// Returns an error if a generator cannot be flattened or `data` cannot hold
/// a `spec` key.
pub fn flatten_application_set(spec: &ApplicationSetSpec, data: &mut ResourceData) -> Result<()> {
    let raw = flatten_spec(spec)?;
    data.set("spec", Value::Array(vec![Value::Object(raw)]))
}

/// Expand a raw spec block.
///
/// # Errors
///
/// See [`expand_application_set`].
pub fn expand_spec(raw: &RawMap, ctx: &ExpandContext) -> Result<ApplicationSetSpec> {
    let blocks = attrs::blocks(raw, "generator")?;
    debug!(generators = blocks.len(), strict = ctx.strict, "Expanding application set");
    let generators = dispatch::expand_generators(&blocks, NestingLevel::TOP, ctx)?;

    let template = attrs::block(raw, "template")?
        .map(|block| template::expand(block, &ctx.features))
        .transpose()?
        .unwrap_or_default();

    let sync_policy = attrs::block(raw, "sync_policy")?
        .map(expand_sync_policy)
        .transpose()?;
    if sync_policy
        .as_ref()
        .is_some_and(|policy| policy.applications_sync.is_some())
    {
        ctx.features
            .require(Feature::ApplicationSetApplicationsSyncPolicy)?;
    }

    let strategy = attrs::block(raw, "strategy")?
        .map(expand_strategy)
        .transpose()?;
    if strategy.is_some() {
        ctx.features.require(Feature::ApplicationSetProgressiveSync)?;
    }

    let ignore_application_differences = attrs::blocks(raw, "ignore_application_differences")?
        .into_iter()
        .map(|block| {
            Ok(ApplicationSetIgnoreDifferences {
                name: attrs::string(block, "name")?,
                json_pointers: attrs::strings(block, "json_pointers")?,
                jq_path_expressions: attrs::strings(block, "jq_path_expressions")?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    if !ignore_application_differences.is_empty() {
        ctx.features
            .require(Feature::ApplicationSetIgnoreApplicationDifferences)?;
    }

    let template_patch = attrs::opt_string(raw, "template_patch")?.filter(|s| !s.is_empty());
    if template_patch.is_some() {
        ctx.features.require(Feature::ApplicationSetTemplatePatch)?;
    }

    Ok(ApplicationSetSpec {
        go_template: attrs::boolean(raw, "go_template")?,
        generators,
        template,
        sync_policy,
        strategy,
        go_template_options: attrs::strings(raw, "go_template_options")?,
        ignore_application_differences,
        template_patch,
    })
}

fn expand_sync_policy(raw: &RawMap) -> Result<ApplicationSetSyncPolicy> {
    Ok(ApplicationSetSyncPolicy {
        preserve_resources_on_deletion: attrs::boolean(raw, "preserve_resources_on_deletion")?,
        applications_sync: attrs::opt_string(raw, "applications_sync")?
            .filter(|s| !s.is_empty()),
    })
}

fn expand_strategy(raw: &RawMap) -> Result<ApplicationSetStrategy> {
    let rolling_sync = attrs::block(raw, "rolling_sync")?
        .map(|rolling| {
            let steps = attrs::blocks(rolling, "step")?
                .into_iter()
                .map(expand_step)
                .collect::<Result<_>>()?;
            Ok::<_, GeneratorError>(ApplicationSetRolloutStrategy { steps })
        })
        .transpose()?;
    Ok(ApplicationSetStrategy {
        strategy_type: attrs::string(raw, "type")?,
        rolling_sync,
    })
}

fn expand_step(raw: &RawMap) -> Result<ApplicationSetRolloutStep> {
    let match_expressions = attrs::blocks(raw, "match_expressions")?
        .into_iter()
        .map(|expr| {
            Ok(ApplicationMatchExpression {
                key: attrs::string(expr, "key")?,
                operator: attrs::string(expr, "operator")?,
                values: attrs::strings(expr, "values")?,
            })
        })
        .collect::<Result<_>>()?;
    Ok(ApplicationSetRolloutStep {
        match_expressions,
        max_update: attrs::opt_string(raw, "max_update")?
            .map(|value| parse_max_update(&value))
            .transpose()?
            .flatten(),
    })
}

/// Parse a `max_update` value: an integer or a percentage such as `"25%"`.
fn parse_max_update(value: &str) -> Result<Option<IntOrString>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    let invalid = || GeneratorError::InvalidNumber {
        field: "max_update".to_string(),
        value: value.to_string(),
    };
    if let Some(percent) = value.strip_suffix('%') {
        percent.parse::<u32>().map_err(|_| invalid())?;
        return Ok(Some(IntOrString::String(value.to_string())));
    }
    value
        .parse()
        .map(|n| Some(IntOrString::Int(n)))
        .map_err(|_| invalid())
}

/// Flatten a wire spec into a raw spec block.
///
/// # Errors
///
/// Returns an error if a generator cannot be flattened.
pub fn flatten_spec(spec: &ApplicationSetSpec) -> Result<RawMap> {
    let generators = dispatch::flatten_generators(&spec.generators)?;

    let sync_policy = spec.sync_policy.as_ref().map(|policy| {
        BlockWriter::new()
            .boolean(
                "preserve_resources_on_deletion",
                policy.preserve_resources_on_deletion,
            )
            .opt_string("applications_sync", policy.applications_sync.as_deref())
            .build()
    });
    let strategy = spec.strategy.as_ref().map(flatten_strategy);
    let ignore_differences = spec
        .ignore_application_differences
        .iter()
        .map(|diff| {
            BlockWriter::new()
                .string("name", &diff.name)
                .strings("json_pointers", &diff.json_pointers)
                .strings("jq_path_expressions", &diff.jq_path_expressions)
                .build()
        })
        .collect();

    Ok(BlockWriter::new()
        .blocks("generator", generators)
        .boolean("go_template", spec.go_template)
        .strings("go_template_options", &spec.go_template_options)
        .block("template", Some(template::flatten(&spec.template)))
        .block("sync_policy", sync_policy)
        .block("strategy", strategy)
        .blocks("ignore_application_differences", ignore_differences)
        .opt_string("template_patch", spec.template_patch.as_deref())
        .build())
}

fn flatten_strategy(strategy: &ApplicationSetStrategy) -> RawMap {
    let rolling_sync = strategy.rolling_sync.as_ref().map(|rolling| {
        let steps = rolling
            .steps
            .iter()
            .map(|step| {
                let expressions = step
                    .match_expressions
                    .iter()
                    .map(|expr| {
                        BlockWriter::new()
                            .string("key", &expr.key)
                            .string("operator", &expr.operator)
                            .strings("values", &expr.values)
                            .build()
                    })
                    .collect();
                let max_update = step.max_update.as_ref().map(|value| match value {
                    IntOrString::Int(n) => n.to_string(),
                    IntOrString::String(s) => s.clone(),
                });
                BlockWriter::new()
                    .blocks("match_expressions", expressions)
                    .opt_string("max_update", max_update.as_deref())
                    .build()
            })
            .collect();
        BlockWriter::new().blocks("step", steps).build()
    });
    BlockWriter::new()
        .string("type", &strategy.strategy_type)
        .block("rolling_sync", rolling_sync)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use appset_core::{FeatureSet, ServerVersion};
    use serde_json::json;

    fn ctx(version: &str) -> ExpandContext {
        ExpandContext::new(FeatureSet::for_version(version.parse::<ServerVersion>().unwrap()))
    }

    #[test]
    fn missing_spec_block() {
        let data = ResourceData::new(json!({}));
        assert!(matches!(
            expand_application_set(&data, &ExpandContext::default()),
            Err(GeneratorError::Path { .. })
        ));
    }

    #[test]
    fn max_update_forms() {
        assert_eq!(parse_max_update("3").unwrap(), Some(IntOrString::Int(3)));
        assert_eq!(
            parse_max_update("25%").unwrap(),
            Some(IntOrString::String("25%".to_string()))
        );
        assert_eq!(parse_max_update("").unwrap(), None);
        assert!(matches!(
            parse_max_update("lots"),
            Err(GeneratorError::InvalidNumber { .. })
        ));
        assert!(parse_max_update("x%").is_err());
    }

    #[test]
    fn progressive_sync_is_gated() {
        let raw = json!({
            "generator": [{"clusters": [{"enabled": true}]}],
            "strategy": [{
                "type": "RollingSync",
                "rolling_sync": [{"step": [
                    {"match_expressions": [{"key": "envLabel", "operator": "In", "values": ["env-dev"]}]},
                    {"match_expressions": [{"key": "envLabel", "operator": "In", "values": ["env-prod"]}], "max_update": "10%"},
                ]}],
            }],
        });
        let raw = raw.as_object().unwrap();

        let err = expand_spec(raw, &ctx("2.5.9")).unwrap_err();
        assert!(err.to_string().contains("2.6.0"));

        let spec = expand_spec(raw, &ctx("v2.6.0")).unwrap();
        let steps = &spec.strategy.as_ref().unwrap().rolling_sync.as_ref().unwrap().steps;
        assert_eq!(steps.len(), 2);
        assert_eq!(
            steps[1].max_update,
            Some(IntOrString::String("10%".to_string()))
        );
    }

    #[test]
    fn applications_sync_is_gated() {
        let raw = json!({"sync_policy": [{
            "preserve_resources_on_deletion": true,
            "applications_sync": "create-only",
        }]});
        let raw = raw.as_object().unwrap();
        assert!(expand_spec(raw, &ctx("2.7.0")).is_err());
        let spec = expand_spec(raw, &ctx("2.8.0")).unwrap();
        assert_eq!(
            spec.sync_policy.unwrap().applications_sync.as_deref(),
            Some("create-only")
        );
    }

    #[test]
    fn preserve_resources_needs_no_gate() {
        let raw = json!({"sync_policy": [{"preserve_resources_on_deletion": true}]});
        let spec = expand_spec(raw.as_object().unwrap(), &ctx("2.4.0")).unwrap();
        assert!(spec.sync_policy.unwrap().preserve_resources_on_deletion);
    }

    #[test]
    fn ignore_differences_and_patch_are_gated() {
        let raw = json!({"ignore_application_differences": [{"json_pointers": ["/spec/source/targetRevision"]}]});
        assert!(expand_spec(raw.as_object().unwrap(), &ctx("2.8.4")).is_err());
        assert!(expand_spec(raw.as_object().unwrap(), &ctx("2.9.0")).is_ok());

        let raw = json!({"template_patch": "spec:\n  project: default\n"});
        assert!(expand_spec(raw.as_object().unwrap(), &ctx("2.9.3")).is_err());
        assert!(expand_spec(raw.as_object().unwrap(), &ctx("2.10.0")).is_ok());
    }

    #[test]
    fn flatten_writes_spec_block() {
        let spec = ApplicationSetSpec {
            go_template: true,
            go_template_options: vec!["missingkey=error".to_string()],
            ..Default::default()
        };
        let mut data = ResourceData::default();
        flatten_application_set(&spec, &mut data).unwrap();
        assert_eq!(
            data.root(),
            &json!({"spec": [{
                "go_template": true,
                "go_template_options": ["missingkey=error"],
                "template": [{}],
            }]})
        );
    }
}
