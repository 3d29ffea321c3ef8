//! System handlers: service statistics and identity.

use crate::api::auth::is_master;
use crate::api::types::*;
use crate::basket::Version;
use crate::error::ServiceError;
use crate::server::AppState;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};

/// How many baskets each stats ranking reports.
const STATS_TOP_COUNT: usize = 5;

/// Name the service reports about itself.
pub const SERVICE_NAME: &str = "basketd";

const SOURCE_CODE_URL: &str = env!("CARGO_PKG_REPOSITORY");

/// GET /api/stats
pub fn stats(state: &AppState, token: Option<&str>) -> Response<Full<Bytes>> {
    if !is_master(token, state) {
        return error_response(&ServiceError::Unauthorized);
    }
    json_response(StatusCode::OK, &state.registry.stats(STATS_TOP_COUNT))
}

/// GET /api/version
pub fn version() -> Response<Full<Bytes>> {
    let commit = option_env!("BASKETD_COMMIT").unwrap_or("n/a");
    json_response(
        StatusCode::OK,
        &Version {
            name: SERVICE_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            commit: commit.to_string(),
            commit_short: commit.chars().take(7).collect(),
            source_code: SOURCE_CODE_URL.to_string(),
        },
    )
}
