//! Handlers for per-method response configuration.

use super::baskets::authorized_basket;
use crate::api::types::*;
use crate::basket::{normalize_method, ResponseConfig};
use crate::error::ServiceError;
use crate::server::AppState;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};

/// GET /api/baskets/:name/responses/:method
pub fn get(
    state: &AppState,
    name: &str,
    method: &str,
    token: Option<&str>,
) -> Response<Full<Bytes>> {
    let basket = match authorized_basket(state, name, token) {
        Ok(basket) => basket,
        Err(e) => return error_response(&e),
    };
    let method = match normalize_method(method) {
        Ok(method) => method,
        Err(e) => return error_response(&e),
    };
    json_response(StatusCode::OK, &basket.response(&method))
}

/// POST /api/baskets/:name/responses/:method
pub fn update(
    state: &AppState,
    name: &str,
    method: &str,
    token: Option<&str>,
    body: &[u8],
) -> Response<Full<Bytes>> {
    let basket = match authorized_basket(state, name, token) {
        Ok(basket) => basket,
        Err(e) => return error_response(&e),
    };
    let method = match normalize_method(method) {
        Ok(method) => method,
        Err(e) => return error_response(&e),
    };
    if body.is_empty() {
        return empty_response(StatusCode::NOT_MODIFIED);
    }
    let config = match serde_json::from_slice::<ResponseConfig>(body) {
        Ok(config) => config,
        Err(e) => return error_response(&ServiceError::BadJson(e.to_string())),
    };
    match basket.set_response(&method, config) {
        Ok(()) => empty_response(StatusCode::NO_CONTENT),
        Err(e) => error_response(&e),
    }
}
