//! Cluster decision resource generator: clusters chosen by an external
//! duck-typed resource.

use appset_model::DuckTypeGenerator;

use crate::attrs::{self, BlockWriter, RawMap};
use crate::error::Result;
use crate::{selector, template, ExpandContext};

/// Read a `cluster_decision_resource` block.
///
/// # Errors
///
/// Returns an error if a field is malformed or `requeue_after_seconds` is
/// not an integer.
pub fn expand(raw: &RawMap, ctx: &ExpandContext) -> Result<DuckTypeGenerator> {
    Ok(DuckTypeGenerator {
        config_map_ref: attrs::string(raw, "config_map_ref")?,
        name: attrs::string(raw, "name")?,
        requeue_after_seconds: attrs::numeric_string(raw, "requeue_after_seconds")?,
        label_selector: selector::expand(raw, "label_selector")?.unwrap_or_default(),
        template: template::expand_override(raw, &ctx.features)?,
        values: attrs::string_map(raw, "values")?,
    })
}

/// Write a `cluster_decision_resource` block.
#[must_use]
pub fn flatten(generator: &DuckTypeGenerator) -> RawMap {
    BlockWriter::new()
        .string("config_map_ref", &generator.config_map_ref)
        .string("name", &generator.name)
        .numeric_string("requeue_after_seconds", generator.requeue_after_seconds)
        .block(
            "label_selector",
            selector::flatten(Some(&generator.label_selector)),
        )
        .block(
            "template",
            template::flatten_override(generator.template.as_ref()),
        )
        .string_map("values", &generator.values)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GeneratorError;
    use serde_json::{json, Value};

    #[test]
    fn duck_type_fields() {
        let raw = json!({
            "config_map_ref": "my-configmap",
            "name": "quak",
            "requeue_after_seconds": "180",
            "label_selector": [{"match_labels": {"duck": "spotted"}}],
            "values": {"count": "2"},
        });
        let generator = expand(raw.as_object().unwrap(), &ExpandContext::default()).unwrap();
        assert_eq!(generator.config_map_ref, "my-configmap");
        assert_eq!(generator.requeue_after_seconds, Some(180));
        assert_eq!(Value::Object(flatten(&generator)), raw);
    }

    #[test]
    fn bad_requeue_interval() {
        let raw = json!({"config_map_ref": "cm", "requeue_after_seconds": "3m"});
        let err = expand(raw.as_object().unwrap(), &ExpandContext::default()).unwrap_err();
        assert!(matches!(err, GeneratorError::InvalidNumber { .. }));
    }
}
