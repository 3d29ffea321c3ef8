//! The capture path: every public request addressed to a basket.
//!
//! The pipeline resolves the basket from the first path segment below
//! the service prefix, captures the request into the basket's store,
//! hands it to the forwarder when one is configured and finally decides
//! the outgoing response: proxied upstream response, configured canned
//! response, or an empty 200.

use crate::api::types::{build_response, empty_response, error_response};
use crate::basket::name::validate_name;
use crate::basket::types::{HeaderDict, RequestData, ResponseConfig};
use crate::error::ServiceError;
use crate::sanitize::sanitize_for_log;
use crate::server::AppState;
use crate::template;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::CONTENT_LENGTH;
use hyper::{HeaderMap, Request, Response, StatusCode};
use tracing::{debug, warn};

/// Resolve the basket name and the remaining subpath from a request
/// path, honoring the configured service prefix.
pub fn split_basket_path<'a>(
    path: &'a str,
    prefix: &str,
) -> Result<(&'a str, &'a str), ServiceError> {
    let below = if prefix.is_empty() {
        path
    } else {
        match path.strip_prefix(prefix) {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
            _ => return Err(ServiceError::OutsidePrefix(prefix.to_string())),
        }
    };
    let below = below.strip_prefix('/').unwrap_or(below);
    let (name, subpath) = match below.find('/') {
        Some(index) => (&below[..index], &below[index..]),
        None => (below, ""),
    };
    validate_name(name)?;
    Ok((name, subpath))
}

/// Canonical `Word-Word` form of a header name, the form header dicts
/// are keyed by.
pub fn canonical_header_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Build the captured record, truncating the body to the configured cap.
pub fn capture(
    method: &str,
    subpath: &str,
    query: &str,
    headers: &HeaderMap,
    body: Bytes,
    max_body_size: usize,
) -> RequestData {
    let mut dict = HeaderDict::new();
    for (name, value) in headers.iter() {
        dict.entry(canonical_header_name(name.as_str()))
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }

    let content_length = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(body.len() as i64);

    // truncation is silent; content_length keeps the value as read
    let body = &body[..body.len().min(max_body_size)];

    RequestData {
        date: chrono::Utc::now().timestamp_millis(),
        headers: dict,
        content_length,
        body: String::from_utf8_lossy(body).into_owned(),
        method: method.to_string(),
        path: subpath.to_string(),
        query: query.to_string(),
    }
}

/// Handle one public request addressed to a basket.
pub async fn accept_request(req: Request<Incoming>, state: &AppState) -> Response<Full<Bytes>> {
    let (parts, body) = req.into_parts();
    let path = parts.uri.path();

    let (name, subpath) = match split_basket_path(path, &state.config.prefix) {
        Ok(split) => split,
        Err(e) => {
            debug!(
                "rejected capture request {} {}: {}",
                parts.method,
                sanitize_for_log(path),
                e
            );
            return error_response(&e);
        }
    };

    let Some(basket) = state.registry.get(name) else {
        return error_response(&ServiceError::NotFound(name.to_string()));
    };

    // a failed body read aborts the pipeline; nothing is admitted
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            return error_response(&ServiceError::ReadFailure(e.to_string()));
        }
    };

    let record = capture(
        parts.method.as_str(),
        subpath,
        parts.uri.query().unwrap_or(""),
        &parts.headers,
        body,
        state.config.max_body_size,
    );
    basket.add_request(record.clone());

    let config = basket.config();
    if !config.forward_url.is_empty() {
        if config.proxy_response {
            // synchronous: the upstream response is relayed verbatim
            return match state.forwarder.proxy(&config, &record).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(
                        "proxying response for basket '{}' failed: {}",
                        sanitize_for_log(name),
                        sanitize_for_log(&e.to_string())
                    );
                    error_response(&e)
                }
            };
        }
        state.forwarder.dispatch(config.clone(), record.clone());
    }

    match basket.configured_response(record.method.as_str()) {
        Some(response) => render_response(response, &record),
        None => empty_response(StatusCode::OK),
    }
}

/// Turn a configured response into the wire response, rendering
/// templates against the captured request. A template that fails to
/// render falls back to its raw text; status and headers still apply.
fn render_response(config: ResponseConfig, record: &RequestData) -> Response<Full<Bytes>> {
    let status = StatusCode::from_u16(config.status).unwrap_or(StatusCode::OK);
    let data = if config.is_template {
        Some(template::template_data(record))
    } else {
        None
    };

    let body = match &data {
        Some(data) => match template::render(&config.body, data) {
            Ok(rendered) => rendered,
            Err(e) => {
                warn!(
                    "failed to render response body template: {}",
                    sanitize_for_log(&e)
                );
                config.body.clone()
            }
        },
        None => config.body.clone(),
    };

    let mut response = build_response(status, body);
    for (name, values) in &config.headers {
        let Ok(header_name) = hyper::header::HeaderName::from_bytes(name.as_bytes()) else {
            continue;
        };
        for value in values {
            let value = match &data {
                Some(data) => match template::render(value, data) {
                    Ok(rendered) => rendered,
                    Err(e) => {
                        warn!(
                            "failed to render response header template: {}",
                            sanitize_for_log(&e)
                        );
                        value.clone()
                    }
                },
                None => value.clone(),
            };
            if let Ok(header_value) = hyper::header::HeaderValue::from_str(&value) {
                response.headers_mut().append(header_name.clone(), header_value);
            }
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basket::name::NAME_PATTERN;
    use crate::basket::types::HeaderDict;

    #[test]
    fn test_split_no_prefix() {
        assert_eq!(
            split_basket_path("/basket200", "").unwrap(),
            ("basket200", "")
        );
        assert_eq!(
            split_basket_path("/basket210/api/users/123", "").unwrap(),
            ("basket210", "/api/users/123")
        );
    }

    #[test]
    fn test_split_invalid_name() {
        let err = split_basket_path("/basket~220/objects/404", "").unwrap_err();
        assert_eq!(
            err.to_string(),
            format!(
                "invalid basket name; the name does not match pattern: {}",
                NAME_PATTERN
            )
        );
    }

    #[test]
    fn test_split_with_prefix() {
        assert_eq!(
            split_basket_path("/abc/basket300", "/abc").unwrap(),
            ("basket300", "")
        );
        assert_eq!(
            split_basket_path("/xyz/basket310/api/users/123", "/xyz").unwrap(),
            ("basket310", "/api/users/123")
        );
    }

    #[test]
    fn test_split_outside_prefix() {
        let err = split_basket_path("/api/objects", "/baskets").unwrap_err();
        assert_eq!(
            err.to_string(),
            "incoming request is outside of configured path prefix: /baskets"
        );
    }

    #[test]
    fn test_split_partial_prefix_segment() {
        assert!(split_basket_path("/abcd", "/abc").is_err());
    }

    #[test]
    fn test_canonical_header_name() {
        assert_eq!(canonical_header_name("content-type"), "Content-Type");
        assert_eq!(canonical_header_name("x-client"), "X-Client");
        assert_eq!(canonical_header_name("HOST"), "Host");
        assert_eq!(canonical_header_name("te"), "Te");
    }

    #[test]
    fn test_capture_reads_request_parts() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", "text/plain".parse().unwrap());
        headers.insert("x-client", "Java/1.8".parse().unwrap());
        let record = capture(
            "POST",
            "/data",
            "id=5",
            &headers,
            Bytes::from("req5 data ..."),
            1024,
        );
        assert_eq!(record.method, "POST");
        assert_eq!(record.path, "/data");
        assert_eq!(record.query, "id=5");
        assert_eq!(record.body, "req5 data ...");
        assert_eq!(record.content_length, 13);
        assert_eq!(record.headers["X-Client"][0], "Java/1.8");
        assert_eq!(record.headers["Content-Type"][0], "text/plain");
        assert!(record.date > 0);
    }

    #[test]
    fn test_capture_truncates_body_silently() {
        let record = capture(
            "POST",
            "",
            "",
            &HeaderMap::new(),
            Bytes::from("0123456789"),
            4,
        );
        assert_eq!(record.body, "0123");
        // length as read is preserved
        assert_eq!(record.content_length, 10);
    }

    #[test]
    fn test_capture_prefers_content_length_header() {
        let mut headers = HeaderMap::new();
        headers.insert("content-length", "42".parse().unwrap());
        let record = capture("PUT", "", "", &headers, Bytes::from("abc"), 1024);
        assert_eq!(record.content_length, 42);
    }

    fn test_record(query: &str) -> RequestData {
        RequestData {
            date: 0,
            headers: HeaderDict::new(),
            content_length: 0,
            body: String::new(),
            method: "GET".to_string(),
            path: String::new(),
            query: query.to_string(),
        }
    }

    #[test]
    fn test_render_plain_response() {
        let mut headers = HeaderDict::new();
        headers.insert(
            "Location".to_string(),
            vec!["http://localhost:55555/id/1234".to_string()],
        );
        headers.insert(
            "X-Rate-Limit".to_string(),
            vec!["10".to_string(), "1000".to_string()],
        );
        let response = render_response(
            ResponseConfig {
                status: 201,
                headers,
                body: "successfully created".to_string(),
                is_template: false,
            },
            &test_record(""),
        );
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get("Location").unwrap(),
            "http://localhost:55555/id/1234"
        );
        let limits: Vec<_> = response.headers().get_all("X-Rate-Limit").iter().collect();
        assert_eq!(limits.len(), 2);
    }

    #[test]
    fn test_render_template_response() {
        let response = render_response(
            ResponseConfig {
                status: 200,
                headers: HeaderDict::new(),
                body: "hello {{range .name}}{{.}} {{end}}".to_string(),
                is_template: true,
            },
            &test_record("name=Adam&name=Dan"),
        );
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(futures_body_bytes(response.into_body()), "hello Adam Dan ");
    }

    #[test]
    fn test_render_template_failure_falls_back_to_raw_body() {
        let response = render_response(
            ResponseConfig {
                status: 201,
                headers: HeaderDict::new(),
                body: "oops {{range .absent}}{{.}}{{end}}".to_string(),
                is_template: true,
            },
            &test_record(""),
        );
        // status still applies, the body is the unrendered template
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            futures_body_bytes(response.into_body()),
            "oops {{range .absent}}{{.}}{{end}}"
        );
    }

    fn futures_body_bytes(body: Full<Bytes>) -> String {
        use http_body_util::BodyExt;
        let collected = futures_block_on(async move { body.collect().await.unwrap() });
        String::from_utf8(collected.to_bytes().to_vec()).unwrap()
    }

    fn futures_block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(future)
    }
}
