//! HTTP server for mock endpoints.
//!
//! ## Module Structure
//!
//! - `handler`: routing and the mock call handler
//! - `request`: mock path parsing and request flattening
//! - `response`: response builders
//!
//! Routes:
//! - `/api/{collection}/{endpoint}/...` for GET, POST, PUT, PATCH, DELETE
//! - `GET /_mockline/logs/{correlation id}`
//! - `GET /metrics`

mod handler;
mod request;
mod response;

use crate::call::{CallEngine, CallRecorder, ReqwestUpstream, UpstreamClient};
use crate::config::ServerConfig;
use crate::endpoint::EndpointCache;
use crate::rules::OperatorTable;
use crate::store::{Catalog, InMemoryTraceLogStore, TraceLogStore};
use crate::substitution::Substituter;
use anyhow::Context;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

pub use handler::handle_request;
#[allow(unused_imports)]
pub use request::{build_request_map, parse_mock_path, MockPath, RequestParts};
#[allow(unused_imports)]
pub use response::{build_response, build_response_with_headers, error_response};

/// Everything a request handler needs.
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub cache: EndpointCache,
    pub engine: CallEngine,
    pub recorder: CallRecorder,
    pub traces: Arc<dyn TraceLogStore>,
}

impl AppState {
    /// Build state from config, importing every configured endpoint.
    ///
    /// Must be called inside a tokio runtime: it spawns the recorder task.
    pub fn from_config(config: &ServerConfig) -> anyhow::Result<Arc<Self>> {
        let upstream = ReqwestUpstream::new(
            config.upstream.timeout(),
            config.upstream.pool_max_idle_per_host,
        )
        .context("Failed to create upstream HTTP client")?;
        Self::with_upstream(config, Arc::new(upstream))
    }

    pub fn with_upstream(
        config: &ServerConfig,
        upstream: Arc<dyn UpstreamClient>,
    ) -> anyhow::Result<Arc<Self>> {
        let catalog = Arc::new(Catalog::in_memory());
        for definition in &config.endpoints {
            catalog.import(definition).with_context(|| {
                format!(
                    "Failed to import endpoint {} {}",
                    definition.method, definition.name
                )
            })?;
        }

        let cache = EndpointCache::new(
            catalog.clone(),
            catalog.invalidation(),
            config.endpoint_limit(),
        );
        let engine = CallEngine::new(
            Arc::new(OperatorTable::standard()),
            Substituter::default(),
            upstream,
        );
        let traces: Arc<dyn TraceLogStore> = Arc::new(InMemoryTraceLogStore::new());
        let (recorder, _worker) = CallRecorder::spawn(traces.clone(), catalog.clone());

        info!("Loaded {} endpoint definitions", config.endpoints.len());
        Ok(Arc::new(Self {
            catalog,
            cache,
            engine,
            recorder,
            traces,
        }))
    }
}

/// A running server.
pub struct ServerHandle {
    pub local_addr: SocketAddr,
    shutdown_tx: broadcast::Sender<()>,
    join: JoinHandle<()>,
}

impl ServerHandle {
    /// Stop accepting connections and wait for the accept loop to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.join.await {
            error!("Server task failed: {}", e);
        }
    }
}

/// Bind `addr` and serve until shut down.
pub async fn start(addr: &str, state: Arc<AppState>) -> anyhow::Result<ServerHandle> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    let local_addr = listener.local_addr()?;
    info!("Mockline listening on {}", local_addr);

    let (shutdown_tx, _) = broadcast::channel(1);
    let mut shutdown_rx = shutdown_tx.subscribe();

    let join = tokio::spawn(async move {
        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let state = Arc::clone(&state);
                            tokio::spawn(async move {
                                let io = TokioIo::new(stream);
                                let service = service_fn(move |req| {
                                    let state = Arc::clone(&state);
                                    async move { handle_request(req, state, addr).await }
                                });
                                if let Err(e) = http1::Builder::new()
                                    .serve_connection(io, service)
                                    .await
                                {
                                    debug!("Connection error from {}: {}", addr, e);
                                }
                            });
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Mockline on {} shutting down", local_addr);
                    break;
                }
            }
        }
    });

    Ok(ServerHandle {
        local_addr,
        shutdown_tx,
        join,
    })
}
