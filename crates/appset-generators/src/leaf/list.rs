//! List generator: literal parameter sets.
//!
//! Elements are arbitrary string-keyed documents. On the wire each one is a
//! [`JSON`] value; anything other than an object is rejected in both
//! directions.

use appset_model::k8s::JSON;
use appset_model::ListGenerator;
use serde_json::Value;

use crate::attrs::{BlockWriter, RawMap};
use crate::error::{GeneratorError, Result};
use crate::{template, ExpandContext};

fn element(index: usize, value: &Value) -> Result<&RawMap> {
    value.as_object().ok_or_else(|| GeneratorError::ListElement {
        index,
        reason: format!("expected a map, found {}", type_name(value)),
    })
}

const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a map",
    }
}

/// Read a `list` block.
///
/// # Errors
///
/// Returns [`GeneratorError::ListElement`] if an element is not a map.
pub fn expand(raw: &RawMap, ctx: &ExpandContext) -> Result<ListGenerator> {
    let elements = match raw.get("elements") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(index, item)| element(index, item).map(|map| JSON(Value::Object(map.clone()))))
            .collect::<Result<_>>()?,
        Some(_) => return Err(GeneratorError::invalid("elements", "a list of maps")),
    };
    Ok(ListGenerator {
        elements,
        template: template::expand_override(raw, &ctx.features)?,
    })
}

/// Write a `list` block.
///
/// # Errors
///
/// Returns [`GeneratorError::ListElement`] if an element does not decode to
/// a map.
pub fn flatten(generator: &ListGenerator) -> Result<RawMap> {
    let elements = generator
        .elements
        .iter()
        .enumerate()
        .map(|(index, JSON(value))| element(index, value).map(|map| Value::Object(map.clone())))
        .collect::<Result<Vec<_>>>()?;
    let writer = if elements.is_empty() {
        BlockWriter::new()
    } else {
        BlockWriter::new().value("elements", Value::Array(elements))
    };
    Ok(writer
        .block(
            "template",
            template::flatten_override(generator.template.as_ref()),
        )
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn elements_keep_nested_values() {
        let raw = json!({"elements": [
            {"cluster": "engineering-dev", "url": "https://kubernetes.default.svc"},
            {"cluster": "engineering-prod", "values": {"replicas": 3}},
        ]});
        let generator = expand(raw.as_object().unwrap(), &ExpandContext::default()).unwrap();
        assert_eq!(generator.elements.len(), 2);
        assert_eq!(generator.elements[1].0["values"]["replicas"], json!(3));
        assert_eq!(Value::Object(flatten(&generator).unwrap()), raw);
    }

    #[test]
    fn scalar_element_is_rejected() {
        let raw = json!({"elements": [{"cluster": "a"}, "b"]});
        match expand(raw.as_object().unwrap(), &ExpandContext::default()) {
            Err(GeneratorError::ListElement { index, reason }) => {
                assert_eq!(index, 1);
                assert_eq!(reason, "expected a map, found a string");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn undecodable_wire_element() {
        let generator = ListGenerator {
            elements: vec![JSON(json!([1, 2]))],
            template: None,
        };
        assert!(matches!(
            flatten(&generator),
            Err(GeneratorError::ListElement { index: 0, .. })
        ));
    }
}
