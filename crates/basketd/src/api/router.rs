//! Route dispatch for the management API.

use crate::api::auth::presented_token;
use crate::api::handlers::{baskets, requests, responses, system};
use crate::api::types::{error_response, parse_query, text_error};
use crate::config::MANAGEMENT_BODY_LIMIT;
use crate::error::ServiceError;
use crate::server::AppState;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use tracing::debug;

/// Entry point for management requests; reads the body (through the
/// management cap) and dispatches on the parsed route.
///
/// `path` is the request path with the service prefix already removed.
pub async fn route_api(
    req: Request<Incoming>,
    path: &str,
    state: &AppState,
) -> Response<Full<Bytes>> {
    let (parts, body) = req.into_parts();
    let query = parts.uri.query().map(str::to_string);
    let token = presented_token(&parts.headers).map(str::to_string);

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            return error_response(&ServiceError::ReadFailure(e.to_string()));
        }
    };

    debug!("management request: {} {}", parts.method, path);

    dispatch_api(
        &parts.method,
        path,
        query.as_deref(),
        token.as_deref(),
        &body,
        state,
    )
}

/// Dispatch a management request with a pre-collected body.
pub fn dispatch_api(
    method: &Method,
    path: &str,
    query: Option<&str>,
    token: Option<&str>,
    body: &[u8],
    state: &AppState,
) -> Response<Full<Bytes>> {
    // oversize management bodies are cut off; broken JSON then surfaces
    // as a regular parse failure
    let body = &body[..body.len().min(MANAGEMENT_BODY_LIMIT)];
    let params = parse_query(query);
    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();

    match (method, segments.as_slice()) {
        (&Method::GET, ["api", "version"]) => system::version(),
        (&Method::GET, ["api", "stats"]) => system::stats(state, token),

        (&Method::GET, ["api", "baskets"]) => baskets::list(state, token, &params),

        (&Method::POST, ["api", "baskets", name]) => baskets::create(state, name, token, body),
        (&Method::GET, ["api", "baskets", name]) => baskets::get(state, name, token),
        (&Method::PUT, ["api", "baskets", name]) => baskets::update(state, name, token, body),
        (&Method::DELETE, ["api", "baskets", name]) => baskets::delete(state, name, token),

        (&Method::GET, ["api", "baskets", name, "requests"]) => {
            requests::get(state, name, token, &params)
        }
        (&Method::DELETE, ["api", "baskets", name, "requests"]) => {
            requests::clear(state, name, token)
        }

        (&Method::GET, ["api", "baskets", name, "responses", m]) => {
            responses::get(state, name, m, token)
        }
        (&Method::POST, ["api", "baskets", name, "responses", m]) => {
            responses::update(state, name, m, token, body)
        }

        _ => text_error(StatusCode::NOT_FOUND, "404 page not found"),
    }
}
