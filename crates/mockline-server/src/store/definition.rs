//! Declarative endpoint definitions.
//!
//! These are what operators write in the server config (or load from a
//! separate YAML/JSON file). Responses are referenced by name, so a
//! definition never has to mention generated ids.

use crate::endpoint::DEFAULT_VARIANT_NAME;
use crate::flatten::{ContentType, DataType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

const METHODS: [&str; 5] = ["GET", "POST", "PUT", "PATCH", "DELETE"];

/// Whether `status` is a servable HTTP status code.
pub(crate) fn is_valid_status(status: u16) -> bool {
    (100..=599).contains(&status)
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointDefinition {
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
    pub request_type: ContentType,
    #[serde(default)]
    pub responses: Vec<VariantDefinition>,
    #[serde(default)]
    pub condition_groups: Vec<GroupDefinition>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantDefinition {
    pub name: String,
    pub status: u16,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub body_type: ContentType,
    /// Header template, e.g. `{"X-Request-Id": "abc"}`.
    #[serde(default)]
    pub headers: String,
    #[serde(default)]
    pub header_type: ContentType,
    /// Override expressions by placeholder key.
    #[serde(default)]
    pub overrides: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionDefinition {
    #[serde(default)]
    pub name: String,
    pub variable: String,
    pub operator: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub datatype: DataType,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AssignmentDefinition {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDefinition {
    pub name: String,
    #[serde(default)]
    pub conditions: Vec<ConditionDefinition>,
    /// Name of the response selected when every condition passes.
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub call_upstream: bool,
    #[serde(default)]
    pub assignments: Vec<AssignmentDefinition>,
}

impl EndpointDefinition {
    /// Check the invariants the engine relies on.
    pub fn validate(&self) -> Result<(), String> {
        let label = format!("{} {}", self.method, self.name);
        if self.name.trim().trim_matches('/').is_empty() {
            return Err("endpoint name cannot be blank".to_string());
        }
        let method = self.method.trim().to_uppercase();
        if !METHODS.contains(&method.as_str()) {
            return Err(format!("{label}: unsupported method '{}'", self.method));
        }

        let defaults = self
            .responses
            .iter()
            .filter(|r| r.name.eq_ignore_ascii_case(DEFAULT_VARIANT_NAME))
            .count();
        if defaults > 1 {
            return Err(format!(
                "{label}: at most one response may be named {DEFAULT_VARIANT_NAME}"
            ));
        }

        let mut seen = HashSet::new();
        for response in &self.responses {
            if response.name.trim().is_empty() {
                return Err(format!("{label}: response name cannot be blank"));
            }
            if !is_valid_status(response.status) {
                return Err(format!(
                    "{label}: response '{}' has invalid status {}",
                    response.name, response.status
                ));
            }
            if !seen.insert((response.status, response.name.to_uppercase())) {
                return Err(format!(
                    "{label}: duplicate response {} {}",
                    response.status, response.name
                ));
            }
        }

        for group in &self.condition_groups {
            if group.response.is_none() && !group.assignments.is_empty() {
                return Err(format!(
                    "{label}: condition group '{}' assigns values but selects no response",
                    group.name
                ));
            }
            if let Some(target) = &group.response {
                if !self
                    .responses
                    .iter()
                    .any(|r| r.name.eq_ignore_ascii_case(target))
                {
                    return Err(format!(
                        "{label}: condition group '{}' references unknown response '{}'",
                        group.name, target
                    ));
                }
            }
        }
        Ok(())
    }
}
