//! Request routing and the mock call handler.

use super::request::{build_request_map, parse_mock_path, RequestParts};
use super::response::{
    build_response_with_headers, collect_body, error_response, json_response, not_found,
};
use super::AppState;
use crate::call::InboundRequest;
use crate::endpoint::{CallLogEntry, EndpointError};
use crate::metrics;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const LOGS_PREFIX: &str = "/_mockline/logs/";

/// Entry point for every connection's requests.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    client_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: hyper::body::Body,
    B::Error: std::fmt::Display,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    debug!("{} {}", method, path);

    let response = match (&method, path.as_str()) {
        (&Method::GET, "/metrics") => build_response_with_headers(
            StatusCode::OK,
            [("Content-Type", "text/plain; version=0.0.4")],
            metrics::collect_metrics(),
        ),
        (&Method::GET, p) if p.starts_with(LOGS_PREFIX) => {
            handle_logs(&state, &p[LOGS_PREFIX.len()..])
        }
        (m, p) if p.starts_with("/api/") => {
            if matches!(
                *m,
                Method::GET | Method::POST | Method::PUT | Method::PATCH | Method::DELETE
            ) {
                handle_mock(req, &state, client_addr).await
            } else {
                error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
            }
        }
        _ => not_found(),
    };
    Ok(response)
}

fn handle_logs(state: &AppState, correlation_id: &str) -> Response<Full<Bytes>> {
    match state.traces.get(correlation_id) {
        Ok(lines) => json_response(StatusCode::OK, &lines),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

async fn handle_mock<B>(
    req: Request<B>,
    state: &AppState,
    client_addr: SocketAddr,
) -> Response<Full<Bytes>>
where
    B: hyper::body::Body,
    B::Error: std::fmt::Display,
{
    let Some(mock_path) = parse_mock_path(req.uri().path()) else {
        return not_found();
    };
    let method = req.method().as_str().to_string();

    let endpoint = match state
        .cache
        .resolve(&mock_path.collection, &mock_path.endpoint, &method)
    {
        Ok(endpoint) => endpoint,
        Err(e) => return endpoint_error(&e),
    };

    let raw_query = req.uri().query().unwrap_or_default().to_string();
    let headers: Vec<(String, String)> = req
        .headers()
        .iter()
        .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
        .collect();

    let body = match collect_body(req.into_body()).await {
        Ok(body) => body,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e),
    };

    let client_ip = client_addr.to_string();
    let flat = match build_request_map(
        &endpoint,
        RequestParts {
            method: &method,
            headers: &headers,
            raw_query: &raw_query,
            segments: &mock_path.segments,
            body: &body,
            client_ip: &client_ip,
        },
    ) {
        Ok(flat) => flat,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
    };

    let correlation_id = uuid::Uuid::new_v4().to_string();
    let inbound = InboundRequest {
        method,
        headers,
        raw_query,
        path_params: mock_path.segments,
        body,
        flat,
    };

    let outcome = match state.engine.run(&endpoint, inbound, &correlation_id).await {
        Ok(outcome) => outcome,
        Err(e) => return endpoint_error(&e),
    };
    info!(
        correlation_id = %correlation_id,
        "{} {}/{} -> {}",
        endpoint.method, endpoint.collection, endpoint.name, outcome.status
    );

    state
        .recorder
        .persist_trace(&correlation_id, outcome.trace.clone());
    if endpoint.enable_logging {
        state.recorder.record_call(
            &endpoint.id,
            CallLogEntry {
                correlation_id: correlation_id.clone(),
                called_at: chrono::Utc::now(),
            },
        );
    }

    let status = match StatusCode::from_u16(outcome.status) {
        Ok(status) => status,
        Err(_) => {
            warn!("Call {} produced invalid status {}", correlation_id, outcome.status);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    let mut headers: Vec<(String, String)> = outcome.headers.into_iter().collect();
    if !headers
        .iter()
        .any(|(k, _)| k.eq_ignore_ascii_case("content-type"))
    {
        headers.push((
            "Content-Type".to_string(),
            outcome.content_type.mime().to_string(),
        ));
    }
    build_response_with_headers(status, headers, outcome.body)
}

fn endpoint_error(e: &EndpointError) -> Response<Full<Bytes>> {
    match e {
        EndpointError::NotFound { .. } => error_response(StatusCode::NOT_FOUND, &e.to_string()),
        EndpointError::NoResponse => error_response(StatusCode::NOT_IMPLEMENTED, &e.to_string()),
        EndpointError::Load(_) | EndpointError::InvalidUrl { .. } => {
            error!("Endpoint lookup failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}
