//! Response building and query parsing helpers for the management API.

use crate::config::MAX_PAGE_SIZE;
use crate::error::ServiceError;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;
use std::collections::HashMap;

/// Build a JSON response.
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());
    build_response_with_headers(
        status,
        [("Content-Type", "application/json; charset=UTF-8")],
        json,
    )
}

/// Build a plain-text error response; the message gets a trailing newline.
pub fn text_error(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    build_response_with_headers(
        status,
        [("Content-Type", "text/plain; charset=utf-8")],
        format!("{message}\n"),
    )
}

/// Render a service error as its mapped status and safe message.
pub fn error_response(err: &ServiceError) -> Response<Full<Bytes>> {
    text_error(err.status(), &err.to_string())
}

/// Response with a status and no body.
pub fn empty_response(status: StatusCode) -> Response<Full<Bytes>> {
    build_response(status, Bytes::new())
}

/// Build an HTTP response with the given status and body.
pub fn build_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .body(Full::new(body.into()))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Internal Server Error"))))
}

/// Build an HTTP response with headers.
pub fn build_response_with_headers(
    status: StatusCode,
    headers: impl IntoIterator<Item = (impl AsRef<str>, impl AsRef<str>)>,
    body: impl Into<Bytes>,
) -> Response<Full<Bytes>> {
    let mut builder = Response::builder().status(status);
    for (key, value) in headers {
        builder = builder.header(key.as_ref(), value.as_ref());
    }
    builder
        .body(Full::new(body.into()))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Internal Server Error"))))
}

/// Parse an integer parameter with clamping; parse failures fall back to
/// the default rather than erroring.
pub fn parse_int(value: Option<&str>, min: i64, max: i64, default: i64) -> i64 {
    match value.and_then(|v| v.parse::<i64>().ok()) {
        Some(n) => n.clamp(min, max),
        None => default,
    }
}

/// Decode a query string into single-valued parameters; the first value
/// of a repeated parameter wins.
pub fn parse_query(query: Option<&str>) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for pair in query.unwrap_or("").split('&').filter(|p| !p.is_empty()) {
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        let name = urlencoding::decode(name).unwrap_or_default().into_owned();
        let value = urlencoding::decode(value).unwrap_or_default().into_owned();
        params.entry(name).or_insert(value);
    }
    params
}

/// Pagination window from `max`/`skip` query parameters.
#[derive(Debug, Clone, Copy)]
pub struct PageParams {
    pub max: usize,
    pub skip: usize,
}

impl PageParams {
    pub fn from_query(params: &HashMap<String, String>, page_size: usize) -> Self {
        let max = parse_int(
            params.get("max").map(String::as_str),
            1,
            MAX_PAGE_SIZE as i64,
            page_size as i64,
        );
        let skip = parse_int(params.get("skip").map(String::as_str), 0, i64::MAX, 0);
        Self {
            max: max as usize,
            skip: skip as usize,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int(Some("12"), 1, 100, 50), 12);
        assert_eq!(parse_int(Some("abc"), 1, 100, 50), 50);
        assert_eq!(parse_int(None, 1, 100, 50), 50);
        // out of range values clamp
        assert_eq!(parse_int(Some("0"), 1, 100, 50), 1);
        assert_eq!(parse_int(Some("-10"), 1, 100, 50), 1);
        assert_eq!(parse_int(Some("500"), 1, 100, 50), 100);
    }

    #[test]
    fn test_parse_query() {
        let params = parse_query(Some("q=magic&in=headers&max=5&skip=2"));
        assert_eq!(params["q"], "magic");
        assert_eq!(params["in"], "headers");
        assert_eq!(params["max"], "5");
        assert_eq!(params["skip"], "2");
    }

    #[test]
    fn test_parse_query_decodes_and_handles_empty() {
        let params = parse_query(Some("q=hello%20world&flag"));
        assert_eq!(params["q"], "hello world");
        assert_eq!(params["flag"], "");
        assert!(parse_query(None).is_empty());
    }

    #[test]
    fn test_page_params_defaults() {
        let page = PageParams::from_query(&HashMap::new(), 20);
        assert_eq!(page.max, 20);
        assert_eq!(page.skip, 0);
    }

    #[test]
    fn test_page_params_clamping() {
        let params = parse_query(Some("max=100000&skip=-3"));
        let page = PageParams::from_query(&params, 20);
        assert_eq!(page.max, MAX_PAGE_SIZE);
        assert_eq!(page.skip, 0);
    }

    #[test]
    fn test_json_response_content_type() {
        let response = json_response(StatusCode::CREATED, &serde_json::json!({"token": "abc"}));
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get("Content-Type").unwrap(),
            "application/json; charset=UTF-8"
        );
    }

    #[test]
    fn test_text_error_appends_newline() {
        let response = text_error(StatusCode::BAD_REQUEST, "broken");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get("Content-Type").unwrap(),
            "text/plain; charset=utf-8"
        );
    }

    #[test]
    fn test_error_response_uses_mapped_status() {
        let response = error_response(&ServiceError::NotFound("x".into()));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
