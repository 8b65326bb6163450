//! Call orchestration.
//!
//! A call moves through `Created → RulesEvaluated → DefaultsApplied →
//! (UpstreamCalled | SynthesizedFinal) → Finalized`. Each call works on a
//! private copy of the endpoint's response variants, so concurrent calls to
//! the same endpoint never share substitution state.
//!
//! ## Module Structure
//!
//! - `context`: `Call`, `TraceLog`, `WorkingVariant`, `CallState`
//! - `delay`: `*DELAY_RESPONSE_MILLI_SEC` parsing
//! - `upstream`: `UpstreamClient` and URL building for the actual endpoint
//! - `orchestrator`: `CallEngine::run`
//! - `tasks`: `CallRecorder`, the background persistence worker

mod context;
mod delay;
mod orchestrator;
mod tasks;
mod upstream;


#[allow(unused_imports)]
pub use context::{Call, CallState, TraceLog, WorkingVariant};
pub use delay::DelaySpec;
pub use orchestrator::{CallEngine, CallOutcome, InboundRequest, CORRELATION_HEADER};
pub use tasks::{CallEvent, CallHistory, CallRecorder};
#[allow(unused_imports)]
pub use upstream::{
    build_upstream_url, forwardable_header, upstream_method, ReqwestUpstream, UpstreamClient,
    UpstreamError, UpstreamRequest, UpstreamResponse,
};
