//! Handlers for the captured requests of one basket.

use super::baskets::authorized_basket;
use crate::api::types::*;
use crate::basket::SearchScope;
use crate::server::AppState;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use std::collections::HashMap;

/// GET /api/baskets/:name/requests?q=&in=&max=&skip=
pub fn get(
    state: &AppState,
    name: &str,
    token: Option<&str>,
    params: &HashMap<String, String>,
) -> Response<Full<Bytes>> {
    let basket = match authorized_basket(state, name, token) {
        Ok(basket) => basket,
        Err(e) => return error_response(&e),
    };
    let page = PageParams::from_query(params, state.config.page_size);
    match params.get("q").filter(|q| !q.is_empty()) {
        Some(query) => {
            let scope = SearchScope::parse(params.get("in").map(String::as_str));
            json_response(
                StatusCode::OK,
                &basket.find_requests(query, scope, page.max, page.skip),
            )
        }
        None => json_response(StatusCode::OK, &basket.requests(page.max, page.skip)),
    }
}

/// DELETE /api/baskets/:name/requests
pub fn clear(state: &AppState, name: &str, token: Option<&str>) -> Response<Full<Bytes>> {
    match authorized_basket(state, name, token) {
        Ok(basket) => {
            basket.clear();
            empty_response(StatusCode::NO_CONTENT)
        }
        Err(e) => error_response(&e),
    }
}
