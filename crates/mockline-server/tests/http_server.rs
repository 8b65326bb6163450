//! Drives a real mockline server over HTTP, with an in-process upstream.

use assert_json_diff::assert_json_eq;
use bytes::Bytes;
use http_body_util::Full;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use mockline_server::config::ServerConfig;
use mockline_server::server::{self, AppState, ServerHandle};
use serde_json::{json, Value};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Echoes method, path and query back as JSON.
async fn start_upstream() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let service = service_fn(|req: Request<hyper::body::Incoming>| async move {
                    let body = json!({
                        "method": req.method().as_str(),
                        "path": req.uri().path(),
                        "query": req.uri().query().unwrap_or_default(),
                    });
                    let response = Response::builder()
                        .status(203)
                        .header("Content-Type", "application/json")
                        .header("X-Upstream", "yes")
                        .body(Full::new(Bytes::from(body.to_string())))
                        .unwrap();
                    Ok::<_, Infallible>(response)
                });
                let _ = http1::Builder::new()
                    .serve_connection(TokioIo::new(stream), service)
                    .await;
            });
        }
    });
    addr
}

fn config(upstream: SocketAddr) -> ServerConfig {
    let yaml = format!(
        r#"
listen:
  host: 127.0.0.1
  port: 0
upstream:
  timeout_secs: 5
endpoints:
  - name: users
    method: GET
    enableLogging: true
    actualUrl: http://{upstream}/{{id}}
    responses:
      - name: DEFAULT
        status: 200
        body: '{{"id":"1"}}'
        headers: '{{"X-Mock":"true"}}'
        overrides:
          id: "REQUEST[path]:id"
      - name: NOT_FOUND
        status: 404
        body: '{{"error":"user not found"}}'
    conditionGroups:
      - name: missing
        conditions:
          - variable: id
            operator: EQUALS_TO
            value: "42"
        response: NOT_FOUND
      - name: proxied
        conditions:
          - variable: "*HEADER_X-PASSTHROUGH"
            operator: EQUALS_TO
            value: "1"
        callUpstream: true
  - name: orders
    method: POST
    responses:
      - name: DEFAULT
        status: 201
        body: '{{"orderId":"0","qty":0}}'
        overrides:
          orderId: "REQUEST[body]:order.id"
          qty: "REQUEST[body]:order.qty"
  - name: empty
    method: GET
"#
    );
    let config: ServerConfig = serde_yaml::from_str(&yaml).unwrap();
    config.validate().unwrap();
    config
}

async fn start() -> (ServerHandle, Arc<AppState>, String) {
    let upstream = start_upstream().await;
    let state = AppState::from_config(&config(upstream)).unwrap();
    let handle = server::start("127.0.0.1:0", state.clone()).await.unwrap();
    let base = format!("http://{}", handle.local_addr);
    (handle, state, base)
}

#[tokio::test]
async fn serves_selected_and_default_responses() {
    let (handle, _state, base) = start().await;
    let client = reqwest::Client::new();

    let missing = client.get(format!("{base}/api/v1/users/42")).send().await.unwrap();
    assert_eq!(missing.status(), 404);
    let body: Value = missing.json().await.unwrap();
    assert_json_eq!(body, json!({"error": "user not found"}));

    let found = client.get(format!("{base}/api/v1/users/7")).send().await.unwrap();
    assert_eq!(found.status(), 200);
    assert!(found.headers().contains_key("correlationid"));
    assert_eq!(found.headers()["x-mock"], "true");
    assert_eq!(found.headers()["content-type"], "application/json");
    let body: Value = found.json().await.unwrap();
    assert_json_eq!(body, json!({"id": "7"}));

    handle.shutdown().await;
}

#[tokio::test]
async fn post_body_feeds_overrides() {
    let (handle, _state, base) = start().await;
    let client = reqwest::Client::new();

    let created = client
        .post(format!("{base}/api/v1/orders"))
        .body(r#"{"order":{"id":"A-1","qty":3}}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), 201);
    let body: Value = created.json().await.unwrap();
    assert_json_eq!(body, json!({"orderId": "A-1", "qty": 3}));

    let malformed = client
        .post(format!("{base}/api/v1/orders"))
        .body("{oops")
        .send()
        .await
        .unwrap();
    assert_eq!(malformed.status(), 400);

    handle.shutdown().await;
}

#[tokio::test]
async fn resolution_failures_map_to_error_statuses() {
    let (handle, _state, base) = start().await;
    let client = reqwest::Client::new();

    let unknown = client.get(format!("{base}/api/v1/nothing")).send().await.unwrap();
    assert_eq!(unknown.status(), 404);
    let body: Value = unknown.json().await.unwrap();
    assert_eq!(body["errors"][0]["code"], "404");

    let wrong_method = client.delete(format!("{base}/api/v1/users/1")).send().await.unwrap();
    assert_eq!(wrong_method.status(), 404);

    let empty = client.get(format!("{base}/api/v1/empty")).send().await.unwrap();
    assert_eq!(empty.status(), 501);
    let body: Value = empty.json().await.unwrap();
    assert_eq!(body["errors"][0]["message"], "No response defined for the endpoint.");

    handle.shutdown().await;
}

#[tokio::test]
async fn passthrough_calls_the_actual_endpoint() {
    let (handle, _state, base) = start().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{base}/api/v1/users/9?expand=true"))
        .header("X-Passthrough", "1")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 203);
    assert_eq!(response.headers()["x-upstream"], "yes");
    // Mock headers win and are still present.
    assert_eq!(response.headers()["x-mock"], "true");
    let body: Value = response.json().await.unwrap();
    assert_json_eq!(
        body,
        json!({"method": "GET", "path": "/9", "query": "expand=true"})
    );

    handle.shutdown().await;
}

#[tokio::test]
async fn trace_log_and_call_history_are_recorded() {
    let (handle, state, base) = start().await;
    let client = reqwest::Client::new();

    let response = client.get(format!("{base}/api/v1/users/7")).send().await.unwrap();
    let correlation_id = response.headers()["correlationid"]
        .to_str()
        .unwrap()
        .to_string();
    state.recorder.flush().await;

    let logs: Vec<String> = client
        .get(format!("{base}/_mockline/logs/{correlation_id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!logs.is_empty());
    assert!(logs[0].starts_with("00001. "));

    let users = state.cache.resolve("v1", "users", "GET").unwrap();
    assert!(state
        .catalog
        .call_log(&users.id)
        .iter()
        .any(|entry| entry.correlation_id == correlation_id));

    let metrics = client
        .get(format!("{base}/metrics"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(metrics.contains("mockline_calls_total"));

    handle.shutdown().await;
}
