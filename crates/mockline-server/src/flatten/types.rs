//! Value and datatype definitions shared by every flattened document.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Declared datatype of a flattened leaf.
///
/// Serialized with its upper-case name (`STRING`, `INT`, ...). Names that are
/// not recognised fall back to `STRING`, which is also how comparisons and
/// formatting treat them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DataType {
    #[default]
    String,
    Int,
    Float64,
    Bool,
    XmlString,
    Invalid,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::String => "STRING",
            DataType::Int => "INT",
            DataType::Float64 => "FLOAT64",
            DataType::Bool => "BOOL",
            DataType::XmlString => "XMLSTRING",
            DataType::Invalid => "INVALID",
        }
    }

    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_uppercase().as_str() {
            "INT" => DataType::Int,
            "FLOAT64" => DataType::Float64,
            "BOOL" => DataType::Bool,
            "XMLSTRING" => DataType::XmlString,
            "INVALID" => DataType::Invalid,
            _ => DataType::String,
        }
    }

    /// True for datatypes compared numerically.
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int | DataType::Float64)
    }
}

impl From<String> for DataType {
    fn from(value: String) -> Self {
        DataType::parse(&value)
    }
}

impl From<DataType> for String {
    fn from(value: DataType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scalar leaf value.
///
/// Conversions never fail: a value that cannot be read as the requested type
/// yields that type's zero value, so typed comparisons are total.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ScalarValue {
    pub fn to_bool(&self) -> bool {
        match self {
            ScalarValue::Bool(b) => *b,
            ScalarValue::Int(i) => *i != 0,
            ScalarValue::Float(f) => *f != 0.0,
            ScalarValue::Str(s) => parse_bool(s),
            ScalarValue::Null => false,
        }
    }

    pub fn to_f64(&self) -> f64 {
        match self {
            ScalarValue::Float(f) => *f,
            ScalarValue::Int(i) => *i as f64,
            ScalarValue::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            ScalarValue::Str(s) => s.trim().parse::<f64>().unwrap_or(0.0),
            ScalarValue::Null => 0.0,
        }
    }

    pub fn to_i64(&self) -> i64 {
        match self {
            ScalarValue::Int(i) => *i,
            ScalarValue::Float(f) => f.trunc() as i64,
            ScalarValue::Bool(b) => i64::from(*b),
            ScalarValue::Str(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .or_else(|_| s.parse::<f64>().map(|f| f.trunc() as i64))
                    .unwrap_or(0)
            }
            ScalarValue::Null => 0,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }
}

/// Lenient boolean parsing: `1`, `t`, `true` (any case) are true; everything else is false.
fn parse_bool(s: &str) -> bool {
    matches!(s.trim().to_ascii_lowercase().as_str(), "1" | "t" | "true")
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => Ok(()),
            ScalarValue::Bool(b) => write!(f, "{b}"),
            ScalarValue::Int(i) => write!(f, "{i}"),
            ScalarValue::Float(v) => write!(f, "{v}"),
            ScalarValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Str(value.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::Str(value)
    }
}

/// A flattened leaf: the value plus the datatype inferred for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatValue {
    pub value: ScalarValue,
    pub datatype: DataType,
}

impl FlatValue {
    pub fn new(value: ScalarValue, datatype: DataType) -> Self {
        Self { value, datatype }
    }

    /// A `STRING` leaf.
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            value: ScalarValue::Str(value.into()),
            datatype: DataType::String,
        }
    }
}

/// Flattened document keyed by dotted/indexed path (`a.b[0].c`).
pub type FlatMap = BTreeMap<String, FlatValue>;

/// Content type of a request body or response template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContentType {
    #[default]
    #[serde(alias = "json")]
    Json,
    #[serde(alias = "xml")]
    Xml,
}

impl ContentType {
    pub fn mime(&self) -> &'static str {
        match self {
            ContentType::Json => "application/json",
            ContentType::Xml => "application/xml",
        }
    }
}

/// Errors raised while flattening a document.
#[derive(Debug, thiserror::Error)]
pub enum FlattenError {
    #[error("Invalid JSON document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid XML document: {0}")]
    Xml(String),

    #[error("Document must be a JSON object or array, got {0}")]
    NotAContainer(&'static str),
}
