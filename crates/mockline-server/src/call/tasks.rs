//! Background persistence of trace logs and call history.
//!
//! The request path only sends events; a single worker task applies them.
//! Failures and panics inside the worker are logged, counted and dropped so
//! they can never affect a response that has already been written.

use crate::endpoint::CallLogEntry;
use crate::metrics;
use crate::store::{StoreError, TraceLogStore};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Appends entries to an endpoint's call history.
pub trait CallHistory: Send + Sync {
    fn record_call(&self, endpoint_id: &str, entry: CallLogEntry) -> Result<(), StoreError>;
}

#[derive(Debug)]
pub enum CallEvent {
    PersistTrace {
        correlation_id: String,
        lines: Vec<String>,
    },
    RecordCall {
        endpoint_id: String,
        entry: CallLogEntry,
    },
    /// Acknowledged once every earlier event has been handled.
    Flush(oneshot::Sender<()>),
}

impl CallEvent {
    fn task_name(&self) -> &'static str {
        match self {
            CallEvent::PersistTrace { .. } => "persist_trace",
            CallEvent::RecordCall { .. } => "record_call",
            CallEvent::Flush(_) => "flush",
        }
    }
}

/// Handle to the recording worker. Cheap to clone.
#[derive(Clone)]
pub struct CallRecorder {
    tx: mpsc::UnboundedSender<CallEvent>,
}

impl CallRecorder {
    /// Spawn the worker on the current tokio runtime.
    pub fn spawn(
        traces: Arc<dyn TraceLogStore>,
        history: Arc<dyn CallHistory>,
    ) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<CallEvent>();

        let handle = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let task = event.task_name();
                let traces = traces.clone();
                let history = history.clone();
                let outcome = AssertUnwindSafe(async move { apply(event, &*traces, &*history) })
                    .catch_unwind()
                    .await;

                match outcome {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        warn!("Background task {} failed: {}", task, e);
                        metrics::BACKGROUND_TASK_FAILURES_TOTAL
                            .with_label_values(&[task])
                            .inc();
                    }
                    Err(_) => {
                        error!("Background task {} panicked", task);
                        metrics::BACKGROUND_TASK_FAILURES_TOTAL
                            .with_label_values(&[task])
                            .inc();
                    }
                }
            }
            debug!("Call recorder stopped");
        });

        (Self { tx }, handle)
    }

    pub fn persist_trace(&self, correlation_id: &str, lines: Vec<String>) {
        self.send(CallEvent::PersistTrace {
            correlation_id: correlation_id.to_string(),
            lines,
        });
    }

    pub fn record_call(&self, endpoint_id: &str, entry: CallLogEntry) {
        self.send(CallEvent::RecordCall {
            endpoint_id: endpoint_id.to_string(),
            entry,
        });
    }

    /// Wait until every event sent before this call has been handled.
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.send(CallEvent::Flush(ack_tx));
        let _ = ack_rx.await;
    }

    fn send(&self, event: CallEvent) {
        if self.tx.send(event).is_err() {
            warn!("Call recorder is not running, event dropped");
        }
    }
}

fn apply(
    event: CallEvent,
    traces: &dyn TraceLogStore,
    history: &dyn CallHistory,
) -> Result<(), StoreError> {
    match event {
        CallEvent::PersistTrace {
            correlation_id,
            lines,
        } => traces.append(&correlation_id, &lines),
        CallEvent::RecordCall { endpoint_id, entry } => history.record_call(&endpoint_id, entry),
        CallEvent::Flush(ack) => {
            let _ = ack.send(());
            Ok(())
        }
    }
}
