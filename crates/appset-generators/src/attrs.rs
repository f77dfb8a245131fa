//! Typed access to raw configuration blocks.
//!
//! A raw block is a JSON object. Nested blocks are arrays of objects, and a
//! missing key, `null` and `[]` all mean "absent". Readers never coerce
//! between JSON types: a string where a boolean belongs is an error.
//!
//! [`BlockWriter`] is the inverse. It omits empty strings, empty lists and
//! maps, and absent blocks, and always writes booleans.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::{GeneratorError, Result};

/// A raw configuration block.
pub type RawMap = Map<String, Value>;

// =============================================================================
// Readers
// =============================================================================

fn present<'a>(raw: &'a RawMap, key: &str) -> Option<&'a Value> {
    raw.get(key).filter(|value| !value.is_null())
}

/// Read every element of a nested block list.
///
/// # Errors
///
/// Returns [`GeneratorError::InvalidAttribute`] if the value is not an array
/// of objects.
pub fn blocks<'a>(raw: &'a RawMap, key: &str) -> Result<Vec<&'a RawMap>> {
    match present(raw, key) {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_object()
                    .ok_or_else(|| GeneratorError::invalid(key, "a list of blocks"))
            })
            .collect(),
        Some(_) => Err(GeneratorError::invalid(key, "a list of blocks")),
    }
}

/// Read a single-instance nested block.
///
/// # Errors
///
/// Returns [`GeneratorError::InvalidAttribute`] if the value is not an array
/// of objects.
pub fn block<'a>(raw: &'a RawMap, key: &str) -> Result<Option<&'a RawMap>> {
    Ok(blocks(raw, key)?.into_iter().next())
}

/// Read a string, treating absence as empty.
///
/// # Errors
///
/// Returns [`GeneratorError::InvalidAttribute`] for non-string values.
pub fn string(raw: &RawMap, key: &str) -> Result<String> {
    Ok(opt_string(raw, key)?.unwrap_or_default())
}

/// Read a string, keeping absence distinct from empty.
///
/// # Errors
///
/// Returns [`GeneratorError::InvalidAttribute`] for non-string values.
pub fn opt_string(raw: &RawMap, key: &str) -> Result<Option<String>> {
    match present(raw, key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(GeneratorError::invalid(key, "a string")),
    }
}

/// Read a boolean, treating absence as `false`.
///
/// # Errors
///
/// Returns [`GeneratorError::InvalidAttribute`] for non-boolean values.
pub fn boolean(raw: &RawMap, key: &str) -> Result<bool> {
    match present(raw, key) {
        None => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(GeneratorError::invalid(key, "a boolean")),
    }
}

/// Read a list of strings, treating absence as empty.
///
/// # Errors
///
/// Returns [`GeneratorError::InvalidAttribute`] unless the value is an array
/// of strings.
pub fn strings(raw: &RawMap, key: &str) -> Result<Vec<String>> {
    Ok(opt_strings(raw, key)?.unwrap_or_default())
}

/// Read a list of strings, keeping absence distinct from empty.
///
/// # Errors
///
/// Returns [`GeneratorError::InvalidAttribute`] unless the value is an array
/// of strings.
pub fn opt_strings(raw: &RawMap, key: &str) -> Result<Option<Vec<String>>> {
    match present(raw, key) {
        None => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| GeneratorError::invalid(key, "a list of strings"))
            })
            .collect::<Result<Vec<_>>>()
            .map(Some),
        Some(_) => Err(GeneratorError::invalid(key, "a list of strings")),
    }
}

/// Read a string-to-string map, treating absence as empty.
///
/// # Errors
///
/// Returns [`GeneratorError::InvalidAttribute`] unless the value is an
/// object with string values.
pub fn string_map(raw: &RawMap, key: &str) -> Result<BTreeMap<String, String>> {
    match present(raw, key) {
        None => Ok(BTreeMap::new()),
        Some(Value::Object(map)) => map
            .iter()
            .map(|(k, v)| {
                v.as_str()
                    .map(|v| (k.clone(), v.to_string()))
                    .ok_or_else(|| GeneratorError::invalid(key, "a map of strings"))
            })
            .collect(),
        Some(_) => Err(GeneratorError::invalid(key, "a map of strings")),
    }
}

/// Read an integer stored as a string. Empty or absent means `None`.
///
/// # Errors
///
/// Returns [`GeneratorError::InvalidNumber`] if the string is not an integer
/// and [`GeneratorError::InvalidAttribute`] for non-string values.
pub fn numeric_string(raw: &RawMap, key: &str) -> Result<Option<i64>> {
    match opt_string(raw, key)? {
        None => Ok(None),
        Some(s) if s.is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| GeneratorError::InvalidNumber {
                field: key.to_string(),
                value: s,
            }),
    }
}

/// Read an integer stored as a JSON number.
///
/// # Errors
///
/// Returns [`GeneratorError::InvalidAttribute`] for anything but an integer.
pub fn integer(raw: &RawMap, key: &str) -> Result<Option<i64>> {
    match present(raw, key) {
        None => Ok(None),
        Some(value) => value
            .as_i64()
            .map(Some)
            .ok_or_else(|| GeneratorError::invalid(key, "an integer")),
    }
}

// =============================================================================
// Writer
// =============================================================================

/// Builds a raw block, skipping zero values.
#[derive(Debug, Default, Clone)]
pub struct BlockWriter {
    map: RawMap,
}

impl BlockWriter {
    /// Start an empty block.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a string unless empty.
    #[must_use]
    pub fn string(mut self, key: &str, value: &str) -> Self {
        if !value.is_empty() {
            self.map.insert(key.to_string(), Value::from(value));
        }
        self
    }

    /// Write a string whenever it is set, even if empty.
    #[must_use]
    pub fn opt_string(mut self, key: &str, value: Option<&str>) -> Self {
        if let Some(value) = value {
            self.map.insert(key.to_string(), Value::from(value));
        }
        self
    }

    /// Write a boolean.
    #[must_use]
    pub fn boolean(mut self, key: &str, value: bool) -> Self {
        self.map.insert(key.to_string(), Value::Bool(value));
        self
    }

    /// Write a list of strings unless empty.
    #[must_use]
    pub fn strings(self, key: &str, values: &[String]) -> Self {
        if values.is_empty() {
            return self;
        }
        self.opt_strings(key, Some(values))
    }

    /// Write a list of strings whenever it is set, even if empty.
    #[must_use]
    pub fn opt_strings(mut self, key: &str, values: Option<&[String]>) -> Self {
        if let Some(values) = values {
            self.map.insert(
                key.to_string(),
                Value::Array(values.iter().map(|v| Value::from(v.as_str())).collect()),
            );
        }
        self
    }

    /// Write a string map unless empty.
    #[must_use]
    pub fn string_map(mut self, key: &str, values: &BTreeMap<String, String>) -> Self {
        if !values.is_empty() {
            let map = values
                .iter()
                .map(|(k, v)| (k.clone(), Value::from(v.as_str())))
                .collect();
            self.map.insert(key.to_string(), Value::Object(map));
        }
        self
    }

    /// Write an integer as a string if set.
    #[must_use]
    pub fn numeric_string(mut self, key: &str, value: Option<i64>) -> Self {
        if let Some(value) = value {
            self.map.insert(key.to_string(), Value::from(value.to_string()));
        }
        self
    }

    /// Write an integer as a JSON number if set.
    #[must_use]
    pub fn integer(mut self, key: &str, value: Option<i64>) -> Self {
        if let Some(value) = value {
            self.map.insert(key.to_string(), Value::from(value));
        }
        self
    }

    /// Write a single-instance nested block if present.
    #[must_use]
    pub fn block(self, key: &str, block: Option<RawMap>) -> Self {
        match block {
            Some(block) => self.blocks(key, vec![block]),
            None => self,
        }
    }

    /// Write a nested block list unless empty.
    #[must_use]
    pub fn blocks(mut self, key: &str, blocks: Vec<RawMap>) -> Self {
        if !blocks.is_empty() {
            self.map.insert(
                key.to_string(),
                Value::Array(blocks.into_iter().map(Value::Object).collect()),
            );
        }
        self
    }

    /// Write an arbitrary value.
    #[must_use]
    pub fn value(mut self, key: &str, value: Value) -> Self {
        self.map.insert(key.to_string(), value);
        self
    }

    /// Finish the block.
    #[must_use]
    pub fn build(self) -> RawMap {
        self.map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawMap {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn absent_blocks() {
        let raw = raw(json!({"a": null, "b": []}));
        assert!(block(&raw, "a").unwrap().is_none());
        assert!(block(&raw, "b").unwrap().is_none());
        assert!(block(&raw, "c").unwrap().is_none());
    }

    #[test]
    fn block_takes_first_element() {
        let raw = raw(json!({"git": [{"repo_url": "x"}]}));
        let git = block(&raw, "git").unwrap().unwrap();
        assert_eq!(string(git, "repo_url").unwrap(), "x");
    }

    #[test]
    fn no_type_coercion() {
        let raw = raw(json!({"flag": "true", "name": 3, "git": {"repo_url": "x"}}));
        assert!(matches!(
            boolean(&raw, "flag"),
            Err(GeneratorError::InvalidAttribute { .. })
        ));
        assert!(string(&raw, "name").is_err());
        assert!(block(&raw, "git").is_err());
    }

    #[test]
    fn numeric_strings() {
        let raw = raw(json!({"a": "30", "b": "", "c": "soon"}));
        assert_eq!(numeric_string(&raw, "a").unwrap(), Some(30));
        assert_eq!(numeric_string(&raw, "b").unwrap(), None);
        assert_eq!(numeric_string(&raw, "missing").unwrap(), None);
        match numeric_string(&raw, "c") {
            Err(GeneratorError::InvalidNumber { field, value }) => {
                assert_eq!(field, "c");
                assert_eq!(value, "soon");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn optional_strings_keep_empty() {
        let raw = raw(json!({"a": "", "b": []}));
        assert_eq!(opt_string(&raw, "a").unwrap(), Some(String::new()));
        assert_eq!(opt_strings(&raw, "b").unwrap(), Some(Vec::new()));
        assert_eq!(opt_strings(&raw, "c").unwrap(), None);
    }

    #[test]
    fn writer_skips_zero_values() {
        let block = BlockWriter::new()
            .string("empty", "")
            .string("name", "x")
            .strings("list", &[])
            .string_map("map", &BTreeMap::new())
            .boolean("flag", false)
            .block("child", None)
            .numeric_string("seconds", Some(30))
            .build();
        assert_eq!(
            Value::Object(block),
            json!({"name": "x", "flag": false, "seconds": "30"})
        );
    }

    #[test]
    fn writer_keeps_set_empty_optionals() {
        let block = BlockWriter::new()
            .opt_string("branch_match", Some(""))
            .opt_strings("paths_exist", Some(&[]))
            .build();
        assert_eq!(
            Value::Object(block),
            json!({"branch_match": "", "paths_exist": []})
        );
    }
}
