//! Type definitions for mock endpoints.
//!
//! Two families live here. `*Record` types are what the store persists and
//! what the catalog edits. `Endpoint` and friends are the fully resolved,
//! immutable shapes the cache hands to request processing.

use crate::flatten::{ContentType, DataType, ScalarValue};
use crate::store::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of the variant chosen when no rule selected one.
pub const DEFAULT_VARIANT_NAME: &str = "DEFAULT";

/// Collection used when an endpoint is saved without one.
pub const DEFAULT_COLLECTION: &str = "V1";

// ===== Shared pieces =====

/// The upstream URL split into the parts the proxy fallback rebuilds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedUrl {
    pub scheme: String,
    pub host: String,
    pub path: String,
    pub raw_query: String,
}

/// One segment of the upstream path: a literal, or a `{name}` variable
/// filled from the live request path at the same position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathSegment {
    pub value: String,
    pub is_variable: bool,
}

impl PathSegment {
    /// Variable name without braces, if this is a variable segment.
    pub fn variable_name(&self) -> Option<&str> {
        if !self.is_variable {
            return None;
        }
        Some(self.value.trim_start_matches('{').trim_end_matches('}'))
    }
}

/// One served call, kept in the endpoint's history when logging is enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallLogEntry {
    pub correlation_id: String,
    pub called_at: DateTime<Utc>,
}

/// A placeholder parameter of a response variant.
///
/// `id` is `<variant id>_<key>`, so a variant's parameters can be addressed
/// without a lookup table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseParam {
    #[serde(default)]
    pub id: String,
    pub owner_id: String,
    pub key: String,
    #[serde(default)]
    pub default_value: ScalarValue,
    #[serde(default)]
    pub default_datatype: DataType,
    /// Override expression: blank, a literal, `REQUEST[..]:KEY` or `*RANDOM:NAME`.
    #[serde(default)]
    pub override_value: String,
}

impl ResponseParam {
    pub fn new(
        owner_id: &str,
        key: &str,
        default_value: ScalarValue,
        default_datatype: DataType,
    ) -> Self {
        Self {
            id: param_id(owner_id, key),
            owner_id: owner_id.to_string(),
            key: key.to_string(),
            default_value,
            default_datatype,
            override_value: String::new(),
        }
    }

    /// Keys starting with `*` drive status, headers or delay instead of body text.
    pub fn is_special(&self) -> bool {
        self.key.starts_with('*')
    }
}

pub fn param_id(variant_id: &str, key: &str) -> String {
    format!("{variant_id}_{key}")
}

/// A single predicate over one request key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(default)]
    pub id: String,
    /// Owning endpoint id.
    #[serde(default)]
    pub owner_id: String,
    #[serde(default)]
    pub name: String,
    pub variable_key: String,
    pub operator: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub datatype: DataType,
}

// ===== Stored records =====

/// A response variant as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantRecord {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub status: u16,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub body_type: ContentType,
    #[serde(default)]
    pub header: String,
    #[serde(default)]
    pub header_type: ContentType,
    /// Body with every leaf replaced by its token. Regenerated on save.
    #[serde(default)]
    pub placeholder: String,
}

/// An endpoint as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub collection: String,
    pub name: String,
    pub method: String,
    #[serde(default)]
    pub on_hold: bool,
    #[serde(default)]
    pub enable_logging: bool,
    #[serde(default)]
    pub actual_url: String,
    #[serde(default)]
    pub parsed_url: ParsedUrl,
    #[serde(default)]
    pub path_params: Vec<PathSegment>,
    #[serde(default)]
    pub request_type: ContentType,
    #[serde(default)]
    pub variants: Vec<VariantRecord>,
}

/// A parameter assignment as stored: which param, and the expression to assign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRecord {
    pub param_id: String,
    /// Param key, used for special keys that have no stored param.
    pub key: String,
    pub expression: String,
}

/// A condition group as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionGroupRecord {
    #[serde(default)]
    pub id: String,
    /// Owning endpoint id.
    pub owner_id: String,
    pub name: String,
    #[serde(default)]
    pub condition_ids: Vec<String>,
    #[serde(default)]
    pub target_variant_id: String,
    #[serde(default)]
    pub call_upstream: bool,
    #[serde(default)]
    pub assignments: Vec<AssignmentRecord>,
}

// ===== Resolved shapes =====

/// A response variant with its parameters attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseVariant {
    pub id: String,
    pub name: String,
    pub status: u16,
    pub body_type: ContentType,
    pub placeholder: String,
    pub params: Vec<ResponseParam>,
}

/// A response parameter plus the expression a passing group assigns to it.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterAssignment {
    pub param: ResponseParam,
    pub expression: String,
}

/// Ordered conditions (AND) plus the action taken when they all pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionGroup {
    pub id: String,
    pub name: String,
    pub conditions: Vec<Condition>,
    /// Variant selected on pass. Blank means "no selection".
    pub target_variant_id: String,
    pub call_upstream: bool,
    pub assignments: Vec<ParameterAssignment>,
}

/// A fully resolved endpoint, shared read-only across requests.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    pub id: String,
    pub collection: String,
    pub name: String,
    pub method: String,
    pub on_hold: bool,
    pub enable_logging: bool,
    pub actual_url: String,
    pub parsed_url: ParsedUrl,
    pub path_params: Vec<PathSegment>,
    pub request_type: ContentType,
    pub variants: Vec<ResponseVariant>,
    /// Evaluated in this order, which is name order.
    pub groups: Vec<ConditionGroup>,
}

impl Endpoint {
    /// Variant used when no group selected one: the one named `DEFAULT`,
    /// else the first 200, else the first 2xx, else the first.
    pub fn default_variant(&self) -> Option<&ResponseVariant> {
        self.variants
            .iter()
            .find(|v| v.name.eq_ignore_ascii_case(DEFAULT_VARIANT_NAME))
            .or_else(|| self.variants.iter().find(|v| v.status == 200))
            .or_else(|| {
                self.variants
                    .iter()
                    .find(|v| (200..300).contains(&v.status))
            })
            .or_else(|| self.variants.first())
    }

    pub fn is_method(&self, method: &str) -> bool {
        self.method.trim().eq_ignore_ascii_case(method.trim())
    }
}

/// Errors raised while resolving or preparing endpoints.
#[derive(Debug, thiserror::Error)]
pub enum EndpointError {
    #[error("not found: {collection} {name} {method}")]
    NotFound {
        collection: String,
        name: String,
        method: String,
    },

    #[error("No response defined for the endpoint.")]
    NoResponse,

    #[error("Failed to load endpoints: {0}")]
    Load(#[from] StoreError),

    #[error("Invalid actual URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: &'static str },
}
