//! Per-request state.

use crate::endpoint::{Endpoint, ResponseVariant};
use crate::flatten::{ContentType, FlatMap};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Lifecycle of one call. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CallState {
    Created,
    RulesEvaluated,
    DefaultsApplied,
    UpstreamCalled,
    SynthesizedFinal,
    Finalized,
}

impl CallState {
    pub fn can_advance_to(self, next: CallState) -> bool {
        use CallState::*;
        matches!(
            (self, next),
            (Created, RulesEvaluated)
                | (RulesEvaluated, DefaultsApplied)
                | (DefaultsApplied, UpstreamCalled)
                | (DefaultsApplied, SynthesizedFinal)
                | (UpstreamCalled, Finalized)
                | (SynthesizedFinal, Finalized)
        )
    }
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Append-only, thread-safe trace of one call.
///
/// Lines look like `INFO \t2024/05/01 10:00:00 message`. Each line is also
/// emitted as a `tracing` event carrying the correlation id.
#[derive(Debug, Clone)]
pub struct TraceLog {
    correlation_id: Arc<str>,
    lines: Arc<Mutex<Vec<String>>>,
}

impl TraceLog {
    pub fn new(correlation_id: &str) -> Self {
        Self {
            correlation_id: Arc::from(correlation_id),
            lines: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn info(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        debug!(correlation_id = %self.correlation_id, "{}", message);
        self.push("INFO ", message);
    }

    pub fn error(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        warn!(correlation_id = %self.correlation_id, "{}", message);
        self.push("ERROR", message);
    }

    fn push(&self, level: &str, message: &str) {
        let stamp = chrono::Local::now().format("%Y/%m/%d %H:%M:%S");
        self.lines.lock().push(format!("{level}\t{stamp} {message}"));
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A call's private copy of a response variant.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingVariant {
    pub id: String,
    pub name: String,
    pub status: u16,
    /// Set by `*HTTP_STATUS_CODE`; wins over `status` when this variant is chosen.
    pub status_override: Option<u16>,
    pub body: String,
    pub body_type: ContentType,
    pub headers: BTreeMap<String, String>,
}

impl From<&ResponseVariant> for WorkingVariant {
    fn from(variant: &ResponseVariant) -> Self {
        Self {
            id: variant.id.clone(),
            name: variant.name.clone(),
            status: variant.status,
            status_override: None,
            body: variant.placeholder.clone(),
            body_type: variant.body_type,
            headers: BTreeMap::new(),
        }
    }
}

impl WorkingVariant {
    pub fn final_status(&self) -> u16 {
        self.status_override.unwrap_or(self.status)
    }
}

/// One request being processed.
#[derive(Debug)]
pub struct Call {
    pub id: String,
    pub request: FlatMap,
    /// Live path segments after the endpoint name.
    pub path_params: Vec<String>,
    pub variants: Vec<WorkingVariant>,
    /// Variant chosen by a condition group.
    pub active_variant: Option<String>,
    pub use_upstream: bool,
    pub trace: TraceLog,
    claimed: HashSet<String>,
    delays: HashMap<String, String>,
    state: CallState,
}

impl Call {
    /// Start a call against `endpoint`, deep-copying its variants.
    pub fn new(id: &str, endpoint: &Endpoint, request: FlatMap, path_params: Vec<String>) -> Self {
        Self {
            id: id.to_string(),
            request,
            path_params,
            variants: endpoint.variants.iter().map(WorkingVariant::from).collect(),
            active_variant: None,
            use_upstream: false,
            trace: TraceLog::new(id),
            claimed: HashSet::new(),
            delays: HashMap::new(),
            state: CallState::Created,
        }
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    /// Move to `next`. Out-of-order transitions are logged and ignored.
    pub fn advance(&mut self, next: CallState) {
        if self.state.can_advance_to(next) {
            self.trace.info(format!("State {} -> {}", self.state, next));
            self.state = next;
        } else {
            self.trace.error(format!(
                "Ignored invalid state transition {} -> {}",
                self.state, next
            ));
        }
    }

    /// Keys are compared case-insensitively.
    pub fn is_claimed(&self, key: &str) -> bool {
        self.claimed.contains(&key.to_uppercase())
    }

    pub fn claim(&mut self, key: &str) {
        self.claimed.insert(key.to_uppercase());
    }

    pub fn variant(&self, id: &str) -> Option<&WorkingVariant> {
        self.variants.iter().find(|v| v.id == id)
    }

    pub fn variant_mut(&mut self, id: &str) -> Option<&mut WorkingVariant> {
        self.variants.iter_mut().find(|v| v.id == id)
    }

    pub fn set_delay(&mut self, variant_id: &str, value: &str) {
        self.delays.insert(variant_id.to_string(), value.to_string());
    }

    pub fn delay_for(&self, variant_id: &str) -> Option<&str> {
        self.delays.get(variant_id).map(String::as_str)
    }
}
