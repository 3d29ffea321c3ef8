//! Wire-level types of the basket model.
//!
//! Everything here serializes 1:1 to the management API's JSON bodies:
//! basket configuration, captured requests, canned responses and the
//! various page/stats envelopes.

use crate::error::ServiceError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Header multimap as captured from the wire.
pub type HeaderDict = HashMap<String, Vec<String>>;

/// Capacity assigned to baskets created without an explicit one.
pub const DEFAULT_CAPACITY: i64 = 200;

fn default_capacity() -> i64 {
    DEFAULT_CAPACITY
}

/// Per-basket configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasketConfig {
    #[serde(default)]
    pub forward_url: String,
    #[serde(default)]
    pub proxy_response: bool,
    #[serde(default)]
    pub insecure_tls: bool,
    #[serde(default)]
    pub expand_path: bool,
    #[serde(default = "default_capacity")]
    pub capacity: i64,
}

impl Default for BasketConfig {
    fn default() -> Self {
        Self {
            forward_url: String::new(),
            proxy_response: false,
            insecure_tls: false,
            expand_path: false,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl BasketConfig {
    /// Validate the configuration against service limits.
    pub fn validate(&self, max_capacity: i64) -> Result<(), ServiceError> {
        if self.capacity <= 0 {
            return Err(ServiceError::InvalidConfig(
                "capacity should be a positive number".to_string(),
            ));
        }
        if self.capacity > max_capacity {
            return Err(ServiceError::InvalidConfig(format!(
                "capacity may not be greater than {max_capacity}"
            )));
        }
        if !self.forward_url.is_empty() {
            let uri: hyper::Uri = self.forward_url.parse().map_err(|e| {
                ServiceError::InvalidConfig(format!(
                    "invalid URI specified as forward_url: {e}"
                ))
            })?;
            if uri.scheme().is_none() || uri.authority().is_none() {
                return Err(ServiceError::InvalidConfig(format!(
                    "invalid URI specified as forward_url: {}; absolute URL with scheme and host is expected",
                    self.forward_url
                )));
            }
        }
        Ok(())
    }
}

/// A captured HTTP request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestData {
    /// Arrival time, milliseconds since epoch.
    pub date: i64,
    pub headers: HeaderDict,
    pub content_length: i64,
    pub body: String,
    pub method: String,
    /// Path below the basket segment (service prefix and basket name removed).
    pub path: String,
    /// Raw query string, without the leading `?`.
    pub query: String,
}

impl RequestData {
    /// Case-insensitive single-header lookup, first value wins.
    pub fn first_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .and_then(|(_, v)| v.first())
            .map(String::as_str)
    }

    /// Substring search over the chosen part of the record.
    pub fn matches(&self, query: &str, scope: SearchScope) -> bool {
        match scope {
            SearchScope::Body => self.body.contains(query),
            SearchScope::Query => self.query.contains(query),
            SearchScope::Headers => self.headers.iter().any(|(name, values)| {
                name.contains(query) || values.iter().any(|v| v.contains(query))
            }),
            SearchScope::Any => {
                self.matches(query, SearchScope::Body)
                    || self.matches(query, SearchScope::Query)
                    || self.matches(query, SearchScope::Headers)
            }
        }
    }
}

/// Which part of a captured request a search applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchScope {
    Body,
    Query,
    Headers,
    #[default]
    Any,
}

impl SearchScope {
    /// Parse the `in` query parameter; anything unrecognized searches everywhere.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("body") => SearchScope::Body,
            Some("query") => SearchScope::Query,
            Some("headers") => SearchScope::Headers,
            _ => SearchScope::Any,
        }
    }
}

fn default_status() -> u16 {
    200
}

/// Canned or templated response for one HTTP method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseConfig {
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default)]
    pub headers: HeaderDict,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub is_template: bool,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            status: 200,
            headers: HeaderDict::new(),
            body: String::new(),
            is_template: false,
        }
    }
}

/// Create response carrying the only cleartext copy of the token.
#[derive(Debug, Serialize, Deserialize)]
pub struct BasketAuth {
    pub token: String,
}

/// Page of captured requests.
#[derive(Debug, Serialize, Deserialize)]
pub struct RequestsPage {
    pub requests: Vec<RequestData>,
    pub count: usize,
    pub total_count: u64,
    pub has_more: bool,
}

/// Page of captured requests matching a search; no counts are reported.
#[derive(Debug, Serialize, Deserialize)]
pub struct RequestsQueryPage {
    pub requests: Vec<RequestData>,
    pub has_more: bool,
}

/// Page of basket names.
#[derive(Debug, Serialize, Deserialize)]
pub struct BasketNamesPage {
    pub names: Vec<String>,
    pub count: usize,
    pub has_more: bool,
}

/// Page of basket names matching a prefix search.
#[derive(Debug, Serialize, Deserialize)]
pub struct BasketNamesQueryPage {
    pub names: Vec<String>,
    pub has_more: bool,
}

/// Summary of one basket within the stats report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasketSummary {
    pub name: String,
    pub requests_count: usize,
    pub requests_total_count: u64,
    /// Milliseconds since epoch of the newest record; 0 when empty.
    pub last_request_date: i64,
}

/// Service-wide statistics.
#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseStats {
    pub baskets_count: usize,
    pub empty_baskets_count: usize,
    pub requests_count: usize,
    pub max_basket_size: usize,
    pub avg_basket_size: usize,
    pub top_baskets_by_date: Vec<BasketSummary>,
    pub top_baskets_by_size: Vec<BasketSummary>,
}

/// Service identity reported by `GET /api/version`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Version {
    pub name: String,
    pub version: String,
    pub commit: String,
    pub commit_short: String,
    pub source_code: String,
}
