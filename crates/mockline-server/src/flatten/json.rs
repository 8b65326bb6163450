//! JSON flattening and placeholder template generation.

use super::types::{DataType, FlatMap, FlatValue, FlattenError, ScalarValue};
use super::Placeholders;
use serde_json::Value;

/// Flatten a JSON document. A blank document yields an empty map.
pub fn flatten_json(document: &str) -> Result<FlatMap, FlattenError> {
    if document.trim().is_empty() {
        return Ok(FlatMap::new());
    }
    let value: Value = serde_json::from_str(document)?;
    ensure_container(&value)?;
    Ok(flatten_value(&value))
}

/// Flatten an already parsed JSON value.
pub fn flatten_value(value: &Value) -> FlatMap {
    let mut out = FlatMap::new();
    walk("", value, &mut out);
    out
}

/// Flatten a JSON template and rewrite every leaf as its `{{KEY}}` token.
pub fn json_placeholders(template: &str) -> Result<Placeholders, FlattenError> {
    if template.trim().is_empty() {
        return Ok(Placeholders::default());
    }
    let mut value: Value = serde_json::from_str(template)?;
    ensure_container(&value)?;
    let values = flatten_value(&value);
    tokenize("", &mut value);
    Ok(Placeholders {
        values,
        template: value.to_string(),
    })
}

fn ensure_container(value: &Value) -> Result<(), FlattenError> {
    match value {
        Value::Object(_) | Value::Array(_) => Ok(()),
        Value::Null => Err(FlattenError::NotAContainer("null")),
        Value::Bool(_) => Err(FlattenError::NotAContainer("boolean")),
        Value::Number(_) => Err(FlattenError::NotAContainer("number")),
        Value::String(_) => Err(FlattenError::NotAContainer("string")),
    }
}

pub(crate) fn child_key(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

pub(crate) fn index_key(prefix: &str, index: usize) -> String {
    format!("{prefix}[{index}]")
}

fn walk(prefix: &str, value: &Value, out: &mut FlatMap) {
    match value {
        Value::Object(map) => {
            for (name, child) in map {
                walk(&child_key(prefix, name), child, out);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                walk(&index_key(prefix, i), child, out);
            }
        }
        leaf => {
            out.insert(prefix.to_string(), leaf_value(leaf));
        }
    }
}

fn leaf_value(value: &Value) -> FlatValue {
    match value {
        Value::Bool(b) => FlatValue::new(ScalarValue::Bool(*b), DataType::Bool),
        Value::Number(n) => match n.as_i64() {
            Some(i) => FlatValue::new(ScalarValue::Int(i), DataType::Int),
            None => FlatValue::new(
                ScalarValue::Float(n.as_f64().unwrap_or(0.0)),
                DataType::Float64,
            ),
        },
        Value::String(s) => FlatValue::string(s.clone()),
        _ => FlatValue::new(ScalarValue::Null, DataType::Invalid),
    }
}

fn tokenize(prefix: &str, value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (name, child) in map.iter_mut() {
                tokenize(&child_key(prefix, name), child);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter_mut().enumerate() {
                tokenize(&index_key(prefix, i), child);
            }
        }
        leaf => {
            *leaf = Value::String(format!("{{{{{prefix}}}}}"));
        }
    }
}
