//! Runs one call from rule evaluation to the final response.

use super::context::{Call, CallState, WorkingVariant};
use super::delay::DelaySpec;
use super::upstream::{build_upstream_url, upstream_method, UpstreamClient, UpstreamRequest};
use crate::endpoint::{Endpoint, EndpointError};
use crate::flatten::{ContentType, FlatMap};
use crate::metrics;
use crate::rules::OperatorTable;
use crate::substitution::Substituter;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

pub const CORRELATION_HEADER: &str = "CORRELATIONID";

/// The transport-independent view of an inbound request.
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    pub method: String,
    pub headers: Vec<(String, String)>,
    pub raw_query: String,
    /// Live path segments after the endpoint name.
    pub path_params: Vec<String>,
    pub body: Bytes,
    /// Flattened request used by conditions and `REQUEST[..]` overrides.
    pub flat: FlatMap,
}

#[derive(Debug, Clone)]
pub struct CallOutcome {
    pub correlation_id: String,
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub content_type: ContentType,
    pub from_upstream: bool,
    pub trace: Vec<String>,
}

/// Shared, immutable call pipeline.
#[derive(Clone)]
pub struct CallEngine {
    operators: Arc<OperatorTable>,
    substituter: Substituter,
    upstream: Arc<dyn UpstreamClient>,
}

impl CallEngine {
    pub fn new(
        operators: Arc<OperatorTable>,
        substituter: Substituter,
        upstream: Arc<dyn UpstreamClient>,
    ) -> Self {
        Self {
            operators,
            substituter,
            upstream,
        }
    }

    /// Condition groups in order, then the default pass over every variant.
    pub fn evaluate(&self, endpoint: &Endpoint, call: &mut Call) {
        call.trace.info(format!(
            "Processing {} {}/{}",
            endpoint.method, endpoint.collection, endpoint.name
        ));
        for group in &endpoint.groups {
            group.execute(call, &self.operators, &self.substituter);
        }
        call.advance(CallState::RulesEvaluated);

        call.trace.info("Applying default values");
        for variant in &endpoint.variants {
            for param in &variant.params {
                self.substituter.process(call, &variant.id, param, "");
            }
        }
        call.advance(CallState::DefaultsApplied);
    }

    pub async fn run(
        &self,
        endpoint: &Endpoint,
        request: InboundRequest,
        correlation_id: &str,
    ) -> Result<CallOutcome, EndpointError> {
        if endpoint.variants.is_empty() {
            return Err(EndpointError::NoResponse);
        }

        let InboundRequest {
            method,
            headers,
            raw_query,
            path_params,
            body,
            flat,
        } = request;

        let mut call = Call::new(correlation_id, endpoint, flat, path_params);
        self.evaluate(endpoint, &mut call);

        let chosen = choose_variant(endpoint, &call).ok_or(EndpointError::NoResponse)?;
        call.trace.info(format!(
            "Using response {} with http code {}",
            chosen.name,
            chosen.final_status()
        ));

        if let Some(delay) = call.delay_for(&chosen.id).and_then(DelaySpec::parse) {
            let duration = delay.resolve();
            call.trace
                .info(format!("Adding {} millisecond delay", duration.as_millis()));
            metrics::INJECTED_DELAY_MS.observe(duration.as_millis() as f64);
            tokio::time::sleep(duration).await;
        }

        let mut outcome = CallOutcome {
            correlation_id: correlation_id.to_string(),
            status: chosen.final_status(),
            headers: chosen.headers.clone(),
            body: chosen.body.clone(),
            content_type: chosen.body_type,
            from_upstream: false,
            trace: Vec::new(),
        };

        if call.use_upstream {
            self.call_upstream(endpoint, &mut call, &mut outcome, headers, &raw_query, body)
                .await;
        } else {
            call.advance(CallState::SynthesizedFinal);
        }

        outcome.headers.retain(|k, _| !k.eq_ignore_ascii_case("content-length"));
        outcome
            .headers
            .insert(CORRELATION_HEADER.to_string(), correlation_id.to_string());
        call.advance(CallState::Finalized);

        metrics::CALLS_TOTAL
            .with_label_values(&[method.as_str(), &outcome.status.to_string()])
            .inc();
        debug!(
            correlation_id = %correlation_id,
            "Call finished with status {}", outcome.status
        );

        outcome.trace = call.trace.lines();
        Ok(outcome)
    }

    async fn call_upstream(
        &self,
        endpoint: &Endpoint,
        call: &mut Call,
        outcome: &mut CallOutcome,
        headers: Vec<(String, String)>,
        raw_query: &str,
        body: Bytes,
    ) {
        if endpoint.actual_url.trim().is_empty() {
            call.trace
                .info("Skipped call to actual endpoint due to blank URL");
            call.advance(CallState::SynthesizedFinal);
            return;
        }

        let prepared = build_upstream_url(endpoint, &call.path_params, raw_query)
            .and_then(|url| upstream_method(&endpoint.method).map(|m| (m, url)));
        let (method, url) = match prepared {
            Ok(p) => p,
            Err(e) => {
                call.trace.error(format!("Skipping actual endpoint: {e}"));
                metrics::UPSTREAM_CALLS_TOTAL
                    .with_label_values(&["skipped"])
                    .inc();
                call.advance(CallState::SynthesizedFinal);
                return;
            }
        };

        call.trace
            .info(format!("Calling actual endpoint {method} {url}"));
        let request = UpstreamRequest {
            method: method.to_string(),
            url: url.clone(),
            headers,
            body,
        };

        match self.upstream.send(request).await {
            Ok(response) => {
                call.trace.info(format!(
                    "Using response from actual endpoint {} with http code {}",
                    url, response.status
                ));
                outcome.status = response.status;
                outcome.body = response.body;
                outcome.from_upstream = true;
                for (name, value) in response.headers {
                    let present = outcome
                        .headers
                        .keys()
                        .any(|k| k.eq_ignore_ascii_case(&name));
                    if !present {
                        outcome.headers.insert(name, value);
                    }
                }
                metrics::UPSTREAM_CALLS_TOTAL
                    .with_label_values(&["success"])
                    .inc();
                call.advance(CallState::UpstreamCalled);
            }
            Err(e) => {
                call.trace.error(format!(
                    "Error calling actual endpoint. Using mock response. {e}"
                ));
                metrics::UPSTREAM_CALLS_TOTAL
                    .with_label_values(&["failure"])
                    .inc();
                call.advance(CallState::SynthesizedFinal);
            }
        }
    }
}

/// The group-selected variant if there is one, else the endpoint default.
fn choose_variant(endpoint: &Endpoint, call: &Call) -> Option<WorkingVariant> {
    call.active_variant
        .as_deref()
        .and_then(|id| call.variant(id))
        .or_else(|| {
            endpoint
                .default_variant()
                .and_then(|v| call.variant(&v.id))
        })
        .cloned()
}
