//! Authorization checks for management endpoints.
//!
//! The `Authorization` header carries the raw token, no scheme. Basket
//! endpoints accept the basket's own token or the master token; listing
//! and stats endpoints accept the master token only. All comparisons
//! are constant-time.

use crate::basket::Basket;
use crate::server::AppState;
use hyper::header::AUTHORIZATION;
use hyper::HeaderMap;

/// Token presented by the caller, if any.
pub fn presented_token(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())
}

/// True when the caller presented the master token.
pub fn is_master(token: Option<&str>, state: &AppState) -> bool {
    token.is_some_and(|t| state.master.matches(t))
}

/// True when the caller may operate on the given basket.
pub fn may_access_basket(token: Option<&str>, basket: &Basket, state: &AppState) -> bool {
    match token {
        Some(t) => basket.authorize(t) || state.master.matches(t),
        None => false,
    }
}
