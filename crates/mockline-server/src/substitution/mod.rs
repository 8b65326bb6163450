//! Placeholder substitution.
//!
//! Resolves a parameter's value (default, request field, random generator
//! or literal), renders it by datatype and writes it into the target
//! variant of the current call. Keys starting with `*` are routed to
//! `specials` instead of the body.
//!
//! ## Module Structure
//!
//! - `format`: datatype-driven rendering
//! - `specials`: status, header and delay keys
//! - `random`: `RandomRegistry` for `*RANDOM:NAME`

mod format;
mod random;
mod specials;

use crate::call::Call;
use crate::endpoint::ResponseParam;
use crate::flatten::{placeholder_token, FlatMap, ScalarValue};
use std::sync::Arc;

pub use format::{format_value, Formatted};
pub use random::{Generator, RandomRegistry};
#[allow(unused_imports)]
pub use specials::{is_known_status, KNOWN_STATUS_CODES};

pub const DELAY_KEY: &str = "*DELAY_RESPONSE_MILLI_SEC";
pub const STATUS_CODE_KEY: &str = "*HTTP_STATUS_CODE";
pub const HEADER_PREFIX: &str = "*HEADER_";

const REQUEST_SOURCE: &str = "REQUEST[";
const RANDOM_SOURCE: &str = "*RANDOM";

#[derive(Debug, thiserror::Error)]
pub enum SubstitutionError {
    #[error("Request parameter not found: {0}")]
    MissingRequestKey(String),

    #[error("Random generator not found: {0}")]
    UnknownGenerator(String),
}

/// Resolves and writes placeholder values.
#[derive(Debug, Clone)]
pub struct Substituter {
    random: Arc<RandomRegistry>,
}

impl Substituter {
    pub fn new(random: Arc<RandomRegistry>) -> Self {
        Self { random }
    }

    /// Resolve an override expression against the request.
    ///
    /// - `REQUEST[...]:KEY` reads `KEY` from the request map
    /// - `*RANDOM:NAME` calls the named generator
    /// - anything else is a literal
    pub fn resolve_override(
        &self,
        expression: &str,
        request: &FlatMap,
    ) -> Result<ScalarValue, SubstitutionError> {
        let Some((source, rest)) = expression.split_once(':') else {
            return Ok(ScalarValue::Str(expression.to_string()));
        };
        let source = source.trim();

        if source.starts_with(REQUEST_SOURCE) {
            return request
                .get(rest.trim())
                .map(|v| v.value.clone())
                .ok_or_else(|| SubstitutionError::MissingRequestKey(expression.to_string()));
        }
        if source.starts_with(RANDOM_SOURCE) {
            return self.random.generate(rest).map(ScalarValue::Str);
        }
        Ok(ScalarValue::Str(expression.to_string()))
    }

    /// Resolve `param` and apply it to `variant_id` in `call`.
    ///
    /// A blank `assigned` expression falls back to the param's own override,
    /// and a blank override to its default value. Resolution errors are
    /// logged and degrade to the literal expression.
    pub fn process(&self, call: &mut Call, variant_id: &str, param: &ResponseParam, assigned: &str) {
        let expression = if assigned.trim().is_empty() {
            param.override_value.as_str()
        } else {
            assigned
        };

        let value = if expression.is_empty() {
            param.default_value.clone()
        } else {
            match self.resolve_override(expression, &call.request) {
                Ok(v) => v,
                Err(e) => {
                    call.trace.error(e.to_string());
                    ScalarValue::Str(expression.to_string())
                }
            }
        };
        call.trace
            .info(format!("Param {} assignment. Raw value {}", param.key, value));

        let formatted = format_value(&value, param.default_datatype);
        call.trace.info(format!(
            "Param {} assignment. Final value {}",
            param.key, formatted.replacement
        ));

        if param.is_special() {
            specials::apply_special(call, variant_id, &param.key, &formatted.plain);
            return;
        }

        match call.variant_mut(variant_id) {
            Some(variant) => {
                let token = placeholder_token(&param.key);
                variant.body = variant.body.replace(&token, &formatted.replacement);
            }
            None => call.trace.error(format!(
                "Param {} skipped. Unknown response {}",
                param.key, variant_id
            )),
        }
    }
}

impl Default for Substituter {
    fn default() -> Self {
        Self::new(Arc::new(RandomRegistry::standard()))
    }
}

#[cfg(test)]
mod tests;
