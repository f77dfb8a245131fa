//! Key-path access to a raw configuration document.

use serde_json::{Map, Value};

use crate::attrs::RawMap;
use crate::error::{GeneratorError, Result};

/// A raw configuration document addressed by dotted key paths.
///
/// Numeric path segments index arrays, so `spec.0.generator` reads the
/// generator list of the first `spec` block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceData {
    root: Value,
}

enum Segment<'a> {
    Key(&'a str),
    Index(usize),
}

fn segments(path: &str) -> Result<Vec<Segment<'_>>> {
    if path.is_empty() {
        return Ok(Vec::new());
    }
    path.split('.')
        .map(|part| {
            if part.is_empty() {
                Err(path_error(path, "empty segment"))
            } else if let Ok(index) = part.parse() {
                Ok(Segment::Index(index))
            } else {
                Ok(Segment::Key(part))
            }
        })
        .collect()
}

fn path_error(path: &str, reason: impl Into<String>) -> GeneratorError {
    GeneratorError::Path {
        path: path.to_string(),
        reason: reason.into(),
    }
}

impl ResourceData {
    /// Wrap a configuration document.
    #[must_use]
    pub const fn new(root: Value) -> Self {
        Self { root }
    }

    /// The whole document.
    #[must_use]
    pub const fn root(&self) -> &Value {
        &self.root
    }

    /// Unwrap the document.
    #[must_use]
    pub fn into_inner(self) -> Value {
        self.root
    }

    /// Look up the value at `path`. Missing keys and out-of-range indexes
    /// yield `None`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Value> {
        let segments = segments(path).ok()?;
        segments
            .iter()
            .try_fold(&self.root, |value, segment| match segment {
                Segment::Key(key) => value.get(*key),
                Segment::Index(index) => value.get(*index),
            })
    }

    /// Look up the block at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::InvalidAttribute`] if the value is not an
    /// object.
    pub fn get_block(&self, path: &str) -> Result<Option<&RawMap>> {
        match self.get(path) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Object(map)) => Ok(Some(map)),
            Some(_) => Err(GeneratorError::invalid(path, "a block")),
        }
    }

    /// Store `value` at `path`, creating intermediate objects and arrays.
    ///
    /// An index may address an existing element or the slot one past the
    /// end, which appends.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::Path`] if the path crosses a scalar or an
    /// index skips past the end of an array.
    pub fn set(&mut self, path: &str, value: Value) -> Result<()> {
        let segments = segments(path)?;
        let Some((last, parents)) = segments.split_last() else {
            self.root = value;
            return Ok(());
        };

        let mut current = &mut self.root;
        for (i, segment) in parents.iter().enumerate() {
            let next_is_index = matches!(segments[i + 1], Segment::Index(_));
            let empty = || {
                if next_is_index {
                    Value::Array(Vec::new())
                } else {
                    Value::Object(Map::new())
                }
            };
            current = child_mut(current, segment, path, empty)?;
        }
        insert(current, last, value, path)
    }
}

fn child_mut<'v>(
    value: &'v mut Value,
    segment: &Segment<'_>,
    path: &str,
    empty: impl Fn() -> Value,
) -> Result<&'v mut Value> {
    if value.is_null() {
        *value = match segment {
            Segment::Key(_) => Value::Object(Map::new()),
            Segment::Index(_) => Value::Array(Vec::new()),
        };
    }
    match (value, segment) {
        (Value::Object(map), Segment::Key(key)) => Ok(map.entry(*key).or_insert_with(empty)),
        (Value::Array(items), Segment::Index(index)) => {
            if *index == items.len() {
                items.push(empty());
            }
            items
                .get_mut(*index)
                .ok_or_else(|| path_error(path, format!("index {index} out of range")))
        }
        _ => Err(path_error(path, "segment does not match the document")),
    }
}

fn insert(target: &mut Value, segment: &Segment<'_>, value: Value, path: &str) -> Result<()> {
    if target.is_null() {
        *target = match segment {
            Segment::Key(_) => Value::Object(Map::new()),
            Segment::Index(_) => Value::Array(Vec::new()),
        };
    }
    match (target, segment) {
        (Value::Object(map), Segment::Key(key)) => {
            map.insert((*key).to_string(), value);
            Ok(())
        }
        (Value::Array(items), Segment::Index(index)) => {
            if *index < items.len() {
                items[*index] = value;
                Ok(())
            } else if *index == items.len() {
                items.push(value);
                Ok(())
            } else {
                Err(path_error(path, format!("index {index} out of range")))
            }
        }
        _ => Err(path_error(path, "segment does not match the document")),
    }
}

impl From<Value> for ResourceData {
    fn from(root: Value) -> Self {
        Self::new(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_walks_objects_and_arrays() {
        let data = ResourceData::new(json!({"spec": [{"go_template": true}]}));
        assert_eq!(data.get("spec.0.go_template"), Some(&json!(true)));
        assert_eq!(data.get("spec.1"), None);
        assert_eq!(data.get("status"), None);
        assert!(data.get_block("spec.0").unwrap().is_some());
    }

    #[test]
    fn get_block_rejects_scalars() {
        let data = ResourceData::new(json!({"spec": "x"}));
        assert!(data.get_block("spec").is_err());
    }

    #[test]
    fn set_creates_intermediates() {
        let mut data = ResourceData::default();
        data.set("spec.0.go_template", json!(true)).unwrap();
        assert_eq!(data.root(), &json!({"spec": [{"go_template": true}]}));
    }

    #[test]
    fn set_replaces_existing() {
        let mut data = ResourceData::new(json!({"spec": [{"a": 1}]}));
        data.set("spec", json!([{"b": 2}])).unwrap();
        assert_eq!(data.into_inner(), json!({"spec": [{"b": 2}]}));
    }

    #[test]
    fn set_rejects_gaps_and_scalars() {
        let mut data = ResourceData::new(json!({"spec": [], "name": "x"}));
        assert!(matches!(
            data.set("spec.2", json!({})),
            Err(GeneratorError::Path { .. })
        ));
        assert!(data.set("name.first", json!("y")).is_err());
    }
}
