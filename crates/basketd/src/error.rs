//! Service-wide error kinds and their HTTP status mapping.
//!
//! Every error that can surface on the wire is a [`ServiceError`]
//! variant; handlers render the display message as a plain-text body
//! and take the status from [`ServiceError::status`]. Internal detail
//! is logged where the error originates, never echoed to clients.

use hyper::StatusCode;

#[derive(Debug, Clone, thiserror::Error)]
pub enum ServiceError {
    #[error("invalid basket name; the name does not match pattern: {pattern}")]
    InvalidName { pattern: String },
    #[error("This basket name conflicts with reserved system path: {0}")]
    Reserved(String),
    #[error("basket '{0}' already exists")]
    Conflict(String),
    #[error("basket '{0}' is not found")]
    NotFound(String),
    #[error("invalid or missing authorization token")]
    Unauthorized,
    #[error("{0}")]
    InvalidConfig(String),
    #[error("unknown HTTP method: {0}")]
    InvalidMethod(String),
    #[error("{0}")]
    BadJson(String),
    #[error("failed to read request body: {0}")]
    ReadFailure(String),
    #[error("invalid forward URL: {url}; {cause}")]
    InvalidForwardUrl { url: String, cause: String },
    #[error("Failed to forward request to {url}: {cause}")]
    UpstreamFailure { url: String, cause: String },
    #[error("incoming request is outside of configured path prefix: {0}")]
    OutsidePrefix(String),
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::InvalidName { .. } => StatusCode::BAD_REQUEST,
            ServiceError::Reserved(_) => StatusCode::FORBIDDEN,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServiceError::InvalidConfig(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::InvalidMethod(_) => StatusCode::BAD_REQUEST,
            ServiceError::BadJson(_) => StatusCode::BAD_REQUEST,
            ServiceError::ReadFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::InvalidForwardUrl { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::UpstreamFailure { .. } => StatusCode::BAD_GATEWAY,
            ServiceError::OutsidePrefix(_) => StatusCode::BAD_REQUEST,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
