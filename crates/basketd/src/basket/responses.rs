//! Per-method response configuration.
//!
//! Each basket may answer every HTTP method with its own canned or
//! templated response. Updates are validated as a whole; a rejected
//! update leaves the previous configuration untouched.

use super::types::ResponseConfig;
use crate::error::ServiceError;
use crate::template;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Methods a response may be configured for.
pub const KNOWN_METHODS: &[&str] = &["GET", "HEAD", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"];

/// Normalize and check a method name; recognition is case-insensitive.
pub fn normalize_method(method: &str) -> Result<String, ServiceError> {
    let upper = method.to_ascii_uppercase();
    if KNOWN_METHODS.contains(&upper.as_str()) {
        Ok(upper)
    } else {
        Err(ServiceError::InvalidMethod(method.to_string()))
    }
}

pub struct ResponseStore {
    responses: RwLock<HashMap<String, ResponseConfig>>,
}

impl ResponseStore {
    pub fn new() -> Self {
        Self {
            responses: RwLock::new(HashMap::new()),
        }
    }

    /// Response explicitly configured for a method, if any.
    pub fn configured(&self, method: &str) -> Option<ResponseConfig> {
        self.responses.read().get(method).cloned()
    }

    /// Configured response, or the synthesized `200` default.
    pub fn get(&self, method: &str) -> ResponseConfig {
        self.configured(method).unwrap_or_default()
    }

    /// Validate and install a response for a method.
    pub fn set(&self, method: &str, config: ResponseConfig) -> Result<(), ServiceError> {
        let method = normalize_method(method)?;
        validate_response(&config)?;
        self.responses.write().insert(method, config);
        Ok(())
    }
}

impl Default for ResponseStore {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_response(config: &ResponseConfig) -> Result<(), ServiceError> {
    if config.status < 100 || config.status > 599 {
        return Err(ServiceError::InvalidConfig(format!(
            "invalid HTTP status of response: {}",
            config.status
        )));
    }
    if config.is_template {
        template::compile(&config.body)
            .map_err(|e| ServiceError::InvalidConfig(format!("error in body template: {e}")))?;
        for (name, values) in &config.headers {
            for value in values {
                template::compile(value).map_err(|e| {
                    ServiceError::InvalidConfig(format!("error in header template ({name}): {e}"))
                })?;
            }
        }
    }
    Ok(())
}
