//! Label selector blocks.

use appset_model::k8s::{LabelSelector, LabelSelectorRequirement};

use crate::attrs::{self, BlockWriter, RawMap};
use crate::error::Result;

/// Read the label selector block at `key`.
///
/// # Errors
///
/// Returns an error if the block or its fields have the wrong shape.
pub fn expand(raw: &RawMap, key: &str) -> Result<Option<LabelSelector>> {
    attrs::block(raw, key)?.map(expand_block).transpose()
}

fn expand_block(block: &RawMap) -> Result<LabelSelector> {
    let match_labels = attrs::string_map(block, "match_labels")?;
    let match_expressions = attrs::blocks(block, "match_expressions")?
        .into_iter()
        .map(|expr| {
            let values = attrs::strings(expr, "values")?;
            Ok(LabelSelectorRequirement {
                key: attrs::string(expr, "key")?,
                operator: attrs::string(expr, "operator")?,
                values: (!values.is_empty()).then_some(values),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(LabelSelector {
        match_labels: (!match_labels.is_empty()).then_some(match_labels),
        match_expressions: (!match_expressions.is_empty()).then_some(match_expressions),
    })
}

/// Write a label selector block. Empty selectors are omitted.
#[must_use]
pub fn flatten(selector: Option<&LabelSelector>) -> Option<RawMap> {
    let selector = selector?;
    let expressions: Vec<RawMap> = selector
        .match_expressions
        .iter()
        .flatten()
        .map(|expr| {
            BlockWriter::new()
                .string("key", &expr.key)
                .string("operator", &expr.operator)
                .strings("values", expr.values.as_deref().unwrap_or_default())
                .build()
        })
        .collect();
    let labels = selector.match_labels.clone().unwrap_or_default();

    if labels.is_empty() && expressions.is_empty() {
        return None;
    }
    Some(
        BlockWriter::new()
            .string_map("match_labels", &labels)
            .blocks("match_expressions", expressions)
            .build(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn expands_labels_and_expressions() {
        let raw = json!({"selector": [{
            "match_labels": {"env": "prod"},
            "match_expressions": [{"key": "tier", "operator": "In", "values": ["web"]}],
        }]});
        let selector = expand(raw.as_object().unwrap(), "selector")
            .unwrap()
            .unwrap();
        assert_eq!(
            selector.match_labels.as_ref().unwrap().get("env"),
            Some(&"prod".to_string())
        );
        let exprs = selector.match_expressions.as_ref().unwrap();
        assert_eq!(exprs[0].operator, "In");
        assert_eq!(exprs[0].values, Some(vec!["web".to_string()]));

        let block = flatten(Some(&selector)).unwrap();
        assert_eq!(
            Value::Object(block),
            json!({
                "match_labels": {"env": "prod"},
                "match_expressions": [{"key": "tier", "operator": "In", "values": ["web"]}],
            })
        );
    }

    #[test]
    fn empty_selector_is_omitted() {
        assert!(flatten(Some(&LabelSelector::default())).is_none());
        assert!(flatten(None).is_none());
    }

    #[test]
    fn exists_operator_has_no_values() {
        let raw = json!({"selector": [{
            "match_expressions": [{"key": "tier", "operator": "Exists"}],
        }]});
        let selector = expand(raw.as_object().unwrap(), "selector")
            .unwrap()
            .unwrap();
        assert_eq!(selector.match_expressions.unwrap()[0].values, None);
    }
}
