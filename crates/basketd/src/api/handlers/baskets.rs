//! Basket CRUD handlers.

use crate::api::auth::{is_master, may_access_basket};
use crate::api::types::*;
use crate::basket::name::{is_reserved, validate_name};
use crate::basket::{Basket, BasketAuth, BasketConfig};
use crate::config::ServiceMode;
use crate::error::ServiceError;
use crate::sanitize::sanitize_for_log;
use crate::server::AppState;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Look up a basket the caller is authorized for; shared by every
/// single-basket endpoint.
pub fn authorized_basket(
    state: &AppState,
    name: &str,
    token: Option<&str>,
) -> Result<Arc<Basket>, ServiceError> {
    validate_name(name)?;
    let basket = state
        .registry
        .get(name)
        .ok_or_else(|| ServiceError::NotFound(name.to_string()))?;
    if !may_access_basket(token, &basket, state) {
        return Err(ServiceError::Unauthorized);
    }
    Ok(basket)
}

/// POST /api/baskets/:name
pub fn create(
    state: &AppState,
    name: &str,
    token: Option<&str>,
    body: &[u8],
) -> Response<Full<Bytes>> {
    if let Err(e) = validate_name(name) {
        return error_response(&e);
    }
    if is_reserved(name) {
        return error_response(&ServiceError::Reserved(name.to_string()));
    }
    if state.config.mode == ServiceMode::Restricted && !is_master(token, state) {
        return error_response(&ServiceError::Unauthorized);
    }

    let config = if body.is_empty() {
        BasketConfig {
            capacity: state.config.init_capacity,
            ..Default::default()
        }
    } else {
        match serde_json::from_slice::<BasketConfig>(body) {
            Ok(config) => config,
            Err(e) => return error_response(&ServiceError::BadJson(e.to_string())),
        }
    };

    match state.registry.create(name, config) {
        Ok(basket_token) => {
            info!("basket '{}' created", sanitize_for_log(name));
            json_response(StatusCode::CREATED, &BasketAuth {
                token: basket_token,
            })
        }
        Err(e) => error_response(&e),
    }
}

/// GET /api/baskets/:name
pub fn get(state: &AppState, name: &str, token: Option<&str>) -> Response<Full<Bytes>> {
    match authorized_basket(state, name, token) {
        Ok(basket) => json_response(StatusCode::OK, &basket.config()),
        Err(e) => error_response(&e),
    }
}

/// PUT /api/baskets/:name
pub fn update(
    state: &AppState,
    name: &str,
    token: Option<&str>,
    body: &[u8],
) -> Response<Full<Bytes>> {
    let basket = match authorized_basket(state, name, token) {
        Ok(basket) => basket,
        Err(e) => return error_response(&e),
    };
    if body.is_empty() {
        return empty_response(StatusCode::NOT_MODIFIED);
    }
    let config = match serde_json::from_slice::<BasketConfig>(body) {
        Ok(config) => config,
        Err(e) => return error_response(&ServiceError::BadJson(e.to_string())),
    };
    if let Err(e) = config.validate(state.config.max_capacity) {
        return error_response(&e);
    }
    basket.update(config);
    empty_response(StatusCode::NO_CONTENT)
}

/// DELETE /api/baskets/:name
pub fn delete(state: &AppState, name: &str, token: Option<&str>) -> Response<Full<Bytes>> {
    if let Err(e) = authorized_basket(state, name, token) {
        return error_response(&e);
    }
    state.registry.delete(name);
    info!("basket '{}' deleted", sanitize_for_log(name));
    empty_response(StatusCode::NO_CONTENT)
}

/// GET /api/baskets?q=&max=&skip=
pub fn list(
    state: &AppState,
    token: Option<&str>,
    params: &HashMap<String, String>,
) -> Response<Full<Bytes>> {
    if !is_master(token, state) {
        return error_response(&ServiceError::Unauthorized);
    }
    let page = PageParams::from_query(params, state.config.page_size);
    match params.get("q").filter(|q| !q.is_empty()) {
        Some(query) => json_response(
            StatusCode::OK,
            &state.registry.find(query, page.max, page.skip),
        ),
        None => json_response(StatusCode::OK, &state.registry.list(page.max, page.skip)),
    }
}
