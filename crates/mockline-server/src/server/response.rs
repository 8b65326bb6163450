//! Response helpers.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Response, StatusCode};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub errors: Vec<ErrorDetail>,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// Build an HTTP response with the given status and body.
///
/// Falls back to a bare 500 if the builder rejects its input.
pub fn build_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .body(Full::new(body.into()))
        .unwrap_or_else(|_| internal_error())
}

/// Build an HTTP response with headers. Headers whose name or value is not
/// valid HTTP are skipped.
pub fn build_response_with_headers<I, K, V>(
    status: StatusCode,
    headers: I,
    body: impl Into<Bytes>,
) -> Response<Full<Bytes>>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut response = build_response(status, body);
    for (key, value) in headers {
        let name = hyper::header::HeaderName::from_bytes(key.as_ref().as_bytes());
        let value = hyper::header::HeaderValue::from_str(value.as_ref());
        match (name, value) {
            (Ok(name), Ok(value)) => {
                response.headers_mut().append(name, value);
            }
            _ => tracing::debug!("Skipping invalid response header {}", key.as_ref()),
        }
    }
    response
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());
    build_response_with_headers(status, [("Content-Type", "application/json")], json)
}

pub fn error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    let error = ErrorResponse {
        errors: vec![ErrorDetail {
            code: status.as_str().to_string(),
            message: message.to_string(),
        }],
    };
    json_response(status, &error)
}

pub fn not_found() -> Response<Full<Bytes>> {
    error_response(StatusCode::NOT_FOUND, "Not Found")
}

fn internal_error() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from("Internal Server Error")));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

/// Collect a request body into bytes.
pub async fn collect_body<B>(body: B) -> Result<Bytes, String>
where
    B: hyper::body::Body,
    B::Error: std::fmt::Display,
{
    body.collect()
        .await
        .map(|c| c.to_bytes())
        .map_err(|e| format!("Failed to read request body: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_text(response: Response<Full<Bytes>>) -> String {
        let bytes = collect_body(response.into_body()).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_error_response_shape() {
        let response = error_response(StatusCode::NOT_IMPLEMENTED, "No response defined for the endpoint.");
        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );
        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["errors"][0]["code"], "501");
        assert_eq!(body["errors"][0]["message"], "No response defined for the endpoint.");
    }

    #[test]
    fn test_invalid_headers_are_skipped() {
        let response = build_response_with_headers(
            StatusCode::OK,
            [("X-Good", "yes"), ("bad header", "x"), ("X-Bad-Value", "a\nb")],
            "",
        );
        assert_eq!(response.headers().len(), 1);
        assert_eq!(response.headers().get("x-good").unwrap(), "yes");
    }
}
