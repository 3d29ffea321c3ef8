//! Service configuration.

use clap::ValueEnum;
use std::net::SocketAddr;
use std::time::Duration;

/// Hard ceiling for the `max` pagination parameter.
pub const MAX_PAGE_SIZE: usize = 100;

/// Management request bodies are read through this cap; anything beyond
/// it is dropped before JSON parsing.
pub const MANAGEMENT_BODY_LIMIT: usize = 2048;

/// Who may create baskets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ServiceMode {
    /// Anyone may create baskets.
    Public,
    /// Creating baskets requires the master token.
    Restricted,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    /// Path prefix under which baskets live, `""` or `/{segment...}`.
    pub prefix: String,
    /// Default page size for listings.
    pub page_size: usize,
    /// Capacity assigned to baskets created without one.
    pub init_capacity: i64,
    /// Upper bound a basket capacity may be configured to.
    pub max_capacity: i64,
    /// Captured bodies are truncated to this many bytes.
    pub max_body_size: usize,
    pub mode: ServiceMode,
    pub forward_timeout: Duration,
    /// Storage backend name, `memory` being the built-in one.
    pub backend: String,
}

impl ServerConfig {
    /// Normalize a user-supplied path prefix to `""` or `/{...}` with no
    /// trailing slash.
    pub fn normalize_prefix(raw: &str) -> String {
        let trimmed = raw.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return String::new();
        }
        if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{trimmed}")
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: ([127, 0, 0, 1], 55555).into(),
            prefix: String::new(),
            page_size: 20,
            init_capacity: 200,
            max_capacity: 2000,
            max_body_size: 1024 * 1024,
            mode: ServiceMode::Public,
            forward_timeout: Duration::from_secs(60),
            backend: "memory".to_string(),
        }
    }
}
