//! Turning an inbound HTTP request into the engine's flat request map.

use crate::endpoint::Endpoint;
use crate::flatten::{flatten, FlatMap, FlatValue, FlattenError};
use crate::substitution::HEADER_PREFIX;

pub const API_PREFIX: &str = "api";
pub const CLIENT_IP_KEY: &str = "*CLIENT_IP";
pub const PATH_PREFIX: &str = "*PATH_";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// `/api/{collection}/{endpoint}/{segment}...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockPath {
    pub collection: String,
    pub endpoint: String,
    pub segments: Vec<String>,
}

/// Split a mock request path. Returns `None` for paths outside `/api/` or
/// without an endpoint name.
pub fn parse_mock_path(path: &str) -> Option<MockPath> {
    let mut parts = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| decode(s, false));

    if parts.next()? != API_PREFIX {
        return None;
    }
    let collection = parts.next()?.trim().to_string();
    let endpoint = parts.next()?.trim().to_string();
    if collection.is_empty() || endpoint.is_empty() {
        return None;
    }
    Some(MockPath {
        collection,
        endpoint,
        segments: parts.collect(),
    })
}

/// Decode `k=v&k2=v2`. Later duplicates win when inserted into a map.
pub fn parse_pairs(raw: &str) -> Vec<(String, String)> {
    raw.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (decode(k, true), decode(v, true))
        })
        .collect()
}

fn decode(raw: &str, plus_as_space: bool) -> String {
    let raw = if plus_as_space {
        raw.replace('+', " ")
    } else {
        raw.to_string()
    };
    urlencoding::decode(&raw)
        .map(|s| s.into_owned())
        .unwrap_or(raw)
}

/// Inputs for `build_request_map`, borrowed from the hyper request.
#[derive(Debug, Clone, Copy)]
pub struct RequestParts<'a> {
    pub method: &'a str,
    pub headers: &'a [(String, String)],
    pub raw_query: &'a str,
    pub segments: &'a [String],
    pub body: &'a [u8],
    pub client_ip: &'a str,
}

/// Build the flat request map.
///
/// GET and DELETE use the query string. POST, PUT and PATCH flatten the
/// body per the endpoint's request type and then add query and form fields.
/// Every method gets path segments, headers and the client address.
pub fn build_request_map(
    endpoint: &Endpoint,
    parts: RequestParts<'_>,
) -> Result<FlatMap, FlattenError> {
    let method = parts.method.to_uppercase();
    let has_body = matches!(method.as_str(), "POST" | "PUT" | "PATCH");
    let is_form = header(parts.headers, "content-type")
        .is_some_and(|ct| ct.to_ascii_lowercase().starts_with(FORM_CONTENT_TYPE));

    let mut map = FlatMap::new();
    if has_body && !is_form {
        let text = String::from_utf8_lossy(parts.body);
        map = flatten(&text, endpoint.request_type)?;
    }

    for (i, segment) in parts.segments.iter().enumerate() {
        map.insert(format!("{PATH_PREFIX}{i}"), FlatValue::string(segment.as_str()));
        if let Some(name) = endpoint.path_params.get(i).and_then(|p| p.variable_name()) {
            map.insert(name.to_string(), FlatValue::string(segment.as_str()));
        }
    }

    for (k, v) in parse_pairs(parts.raw_query) {
        map.insert(k, FlatValue::string(v));
    }

    if has_body && is_form {
        for (k, v) in parse_pairs(&String::from_utf8_lossy(parts.body)) {
            map.insert(k, FlatValue::string(v));
        }
    }

    for (name, value) in parts.headers {
        map.insert(
            format!("{HEADER_PREFIX}{}", name.to_uppercase()),
            FlatValue::string(value.as_str()),
        );
    }
    map.insert(CLIENT_IP_KEY.to_string(), FlatValue::string(parts.client_ip));
    Ok(map)
}

fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
