//! Forwarding a call to the endpoint's real upstream.

use crate::endpoint::Endpoint;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

/// Request headers never copied to the upstream.
const SKIPPED_HEADERS: [&str; 9] = [
    "host",
    "content-length",
    "connection",
    "keep-alive",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("Upstream host not defined")]
    NoHost,

    #[error("Unsupported upstream method {0}")]
    UnsupportedMethod(String),

    #[error("Upstream call to {url} failed: {reason}")]
    Transport { url: String, reason: String },
}

#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

#[derive(Debug, Clone, Default)]
pub struct UpstreamResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError>;
}

/// Build the upstream URL for `endpoint`.
///
/// Variable path segments take the live value at the same index when one was
/// received. The inbound raw query string is appended unchanged.
pub fn build_upstream_url(
    endpoint: &Endpoint,
    live_path: &[String],
    raw_query: &str,
) -> Result<String, UpstreamError> {
    let host = endpoint.parsed_url.host.trim();
    if host.is_empty() {
        return Err(UpstreamError::NoHost);
    }
    let scheme = match endpoint.parsed_url.scheme.trim() {
        "" => "http",
        s => s,
    };

    let mut url = format!("{scheme}://{host}");
    for (i, segment) in endpoint.path_params.iter().enumerate() {
        url.push('/');
        match live_path.get(i) {
            Some(live) if segment.is_variable => url.push_str(live),
            _ => url.push_str(&segment.value),
        }
    }
    if !raw_query.is_empty() {
        url.push('?');
        url.push_str(raw_query);
    }
    Ok(url)
}

/// Method used for the upstream call. PATCH is sent as POST.
pub fn upstream_method(method: &str) -> Result<&'static str, UpstreamError> {
    match method.trim().to_uppercase().as_str() {
        "GET" => Ok("GET"),
        "POST" | "PATCH" => Ok("POST"),
        "PUT" => Ok("PUT"),
        "DELETE" => Ok("DELETE"),
        other => Err(UpstreamError::UnsupportedMethod(other.to_string())),
    }
}

pub fn forwardable_header(name: &str) -> bool {
    !SKIPPED_HEADERS
        .iter()
        .any(|skipped| skipped.eq_ignore_ascii_case(name))
}

/// `reqwest`-backed client with one shared connection pool.
pub struct ReqwestUpstream {
    client: reqwest::Client,
}

impl ReqwestUpstream {
    pub fn new(timeout: Duration, pool_max_idle_per_host: usize) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(pool_max_idle_per_host)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl UpstreamClient for ReqwestUpstream {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> {
        let url = request.url;
        let transport = |e: reqwest::Error| UpstreamError::Transport {
            url: url.clone(),
            reason: e.to_string(),
        };

        let mut builder = match request.method.as_str() {
            "GET" => self.client.get(&url),
            "POST" => self.client.post(&url),
            "PUT" => self.client.put(&url),
            "DELETE" => self.client.delete(&url),
            other => return Err(UpstreamError::UnsupportedMethod(other.to_string())),
        };

        for (name, value) in &request.headers {
            if forwardable_header(name) {
                builder = builder.header(name, value);
            }
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body);
        }

        debug!("Calling upstream {} {}", request.method, url);
        let response = builder.send().await.map_err(transport)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();
        let body = response.text().await.map_err(transport)?;

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}
