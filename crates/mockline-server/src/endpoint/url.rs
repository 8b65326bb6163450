//! Parsing of an endpoint's upstream URL into scheme, host, path and query.
//!
//! Path templates may contain `{name}` segments, which are not valid URI
//! characters, so the split is done on the raw text.

use super::types::{EndpointError, ParsedUrl, PathSegment};

/// Split `scheme://host/path?query`. A blank URL parses to the empty value.
pub fn parse_actual_url(url: &str) -> Result<ParsedUrl, EndpointError> {
    let url = url.trim();
    if url.is_empty() {
        return Ok(ParsedUrl::default());
    }

    let invalid = |reason| EndpointError::InvalidUrl {
        url: url.to_string(),
        reason,
    };

    let (scheme, rest) = url
        .split_once("://")
        .ok_or_else(|| invalid("must start with http:// or https://"))?;
    let scheme = scheme.to_ascii_lowercase();
    if scheme != "http" && scheme != "https" {
        return Err(invalid("must start with http:// or https://"));
    }

    let (before_query, raw_query) = match rest.split_once('?') {
        Some((b, q)) => (b, q.to_string()),
        None => (rest, String::new()),
    };
    let (host, path) = match before_query.find('/') {
        Some(idx) => (&before_query[..idx], before_query[idx..].to_string()),
        None => (before_query, String::new()),
    };
    if host.is_empty() {
        return Err(invalid("host is missing"));
    }

    Ok(ParsedUrl {
        scheme,
        host: host.to_string(),
        path,
        raw_query,
    })
}

/// Path segment descriptors, in order. `{name}` segments are variables.
pub fn path_segments(path: &str) -> Vec<PathSegment> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| PathSegment {
            value: s.to_string(),
            is_variable: s.starts_with('{') && s.ends_with('}') && s.len() > 2,
        })
        .collect()
}
