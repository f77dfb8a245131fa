//! Subcommand implementations.

use std::fs;
use std::path::Path;

use anyhow::Context;
use appset_core::{Feature, FeatureSet};
use appset_generators::{
    expand_application_set, flatten_application_set, ExpandContext, ResourceData,
};
use appset_model::ApplicationSetSpec;
use serde_json::Value;
use tracing::info;

fn read_json(path: &Path) -> anyhow::Result<Value> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path.display()))
}

/// Expand the raw configuration in `path` into a wire spec document.
pub fn expand(path: &Path, ctx: &ExpandContext) -> anyhow::Result<Value> {
    let data = ResourceData::new(read_json(path)?);
    let spec = expand_application_set(&data, ctx).context("failed to expand application set")?;
    info!(generators = spec.generators.len(), "Expanded application set");
    serde_json::to_value(&spec).context("failed to encode application set spec")
}

/// Flatten the wire spec in `path` into a raw configuration document.
///
/// A whole application set resource is accepted too; its `spec` is used.
pub fn flatten(path: &Path) -> anyhow::Result<Value> {
    let doc = match read_json(path)? {
        Value::Object(mut resource) if resource.get("spec").is_some_and(Value::is_object) => {
            resource.remove("spec").unwrap_or_default()
        }
        doc => doc,
    };
    let spec: ApplicationSetSpec =
        serde_json::from_value(doc).context("document is not an application set spec")?;

    let mut data = ResourceData::default();
    flatten_application_set(&spec, &mut data).context("failed to flatten application set")?;
    info!(generators = spec.generators.len(), "Flattened application set");
    Ok(data.into_inner())
}

/// Render the feature table for `features`.
#[must_use]
pub fn features(features: &FeatureSet) -> String {
    let header = features.version().map_or_else(
        || "server version: unknown (all features enabled)".to_string(),
        |version| format!("server version: {version}"),
    );
    let rows = Feature::ALL.into_iter().map(|feature| {
        let status = if features.is_supported(feature) {
            "supported"
        } else {
            "unsupported"
        };
        format!(
            "{:<48} {:>7}  {status}",
            feature.name(),
            feature.min_version().to_string()
        )
    });
    std::iter::once(header)
        .chain(rows)
        .collect::<Vec<_>>()
        .join("\n")
}
