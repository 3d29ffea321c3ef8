//! Forwarding of captured requests to a configured upstream.
//!
//! The forwarder rebuilds the captured request against the basket's
//! `forward_url`: the subpath is appended when `expand_path` is set, the
//! incoming query string is merged after the forward URL's own
//! parameters, hop-by-hop headers are stripped and the captured body is
//! sent as-is. Dispatch is fire-and-forget unless the basket proxies the
//! upstream response back to the caller.

mod client;
mod tls;

pub use client::{ForwardClients, HttpClient};

use crate::basket::types::{BasketConfig, RequestData};
use crate::error::ServiceError;
use crate::sanitize::sanitize_for_log;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::{HeaderValue, USER_AGENT};
use hyper::{Method, Request, Response, Uri};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Headers that belong to one hop and are never forwarded or proxied.
const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

fn is_hop_by_hop(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    HOP_BY_HOP_HEADERS.contains(&lower.as_str()) || lower.starts_with("proxy-")
}

/// Walk an error's source chain into one log-friendly string.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

pub struct Forwarder {
    clients: ForwardClients,
    timeout: Duration,
}

impl Forwarder {
    pub fn new(timeout: Duration) -> Self {
        Self {
            clients: ForwardClients::new(),
            timeout,
        }
    }

    /// Forward a captured request and hand back the upstream response.
    pub async fn forward(
        &self,
        config: &BasketConfig,
        record: &RequestData,
    ) -> Result<Response<hyper::body::Incoming>, ServiceError> {
        let uri = build_forward_uri(&config.forward_url, record, config.expand_path)?;
        let request = build_forward_request(&uri, record)?;

        debug!("forwarding to {}", sanitize_for_log(&uri.to_string()));

        let client = self.clients.select(config.insecure_tls);
        let response = tokio::time::timeout(self.timeout, client.request(request))
            .await
            .map_err(|_| ServiceError::UpstreamFailure {
                url: config.forward_url.clone(),
                cause: format!("request timed out after {}s", self.timeout.as_secs()),
            })?
            .map_err(|e| ServiceError::UpstreamFailure {
                url: config.forward_url.clone(),
                cause: error_chain(&e),
            })?;
        Ok(response)
    }

    /// Fire-and-forget dispatch on a detached worker; failures are only
    /// logged, the caller is not affected.
    pub fn dispatch(self: &Arc<Self>, config: BasketConfig, record: RequestData) {
        let forwarder = Arc::clone(self);
        tokio::spawn(async move {
            match forwarder.forward(&config, &record).await {
                Ok(response) => {
                    debug!(
                        "forwarded {} {} -> {}",
                        record.method,
                        sanitize_for_log(&record.path),
                        response.status()
                    );
                }
                Err(e) => {
                    warn!(
                        "failed to forward request: {}",
                        sanitize_for_log(&e.to_string())
                    );
                }
            }
        });
    }

    /// Synchronous forwarding for `proxy_response` baskets: the upstream
    /// status, headers and body are relayed to the caller verbatim.
    pub async fn proxy(
        &self,
        config: &BasketConfig,
        record: &RequestData,
    ) -> Result<Response<Full<Bytes>>, ServiceError> {
        let upstream = self.forward(config, record).await?;
        let (parts, body) = upstream.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| ServiceError::UpstreamFailure {
                url: config.forward_url.clone(),
                cause: format!("failed to read upstream response: {}", error_chain(&e)),
            })?
            .to_bytes();

        let mut builder = Response::builder().status(parts.status);
        for (name, value) in parts.headers.iter() {
            if is_hop_by_hop(name.as_str()) || name.as_str() == "content-length" {
                continue;
            }
            builder = builder.header(name, value);
        }
        builder
            .body(Full::new(body))
            .map_err(|e| ServiceError::Internal(e.to_string()))
    }
}

/// Compose the upstream URI from the forward URL and the captured request.
pub fn build_forward_uri(
    forward_url: &str,
    record: &RequestData,
    expand_path: bool,
) -> Result<Uri, ServiceError> {
    let uri: Uri = forward_url
        .parse()
        .map_err(|e: hyper::http::uri::InvalidUri| ServiceError::InvalidForwardUrl {
            url: forward_url.to_string(),
            cause: e.to_string(),
        })?;
    let (scheme, authority) = match (uri.scheme(), uri.authority()) {
        (Some(scheme), Some(authority)) => (scheme.clone(), authority.clone()),
        _ => {
            return Err(ServiceError::InvalidForwardUrl {
                url: forward_url.to_string(),
                cause: "absolute URI with scheme and host is required".to_string(),
            })
        }
    };

    let mut path = uri.path().to_string();
    if expand_path && !record.path.is_empty() && record.path != "/" {
        if path.ends_with('/') {
            path.pop();
        }
        path.push_str(&record.path);
    }

    // forward URL's own parameters come first, duplicates are kept
    let mut query = uri.query().unwrap_or("").to_string();
    if !record.query.is_empty() {
        if !query.is_empty() {
            query.push('&');
        }
        query.push_str(&record.query);
    }

    let path_and_query = if query.is_empty() {
        path
    } else {
        format!("{path}?{query}")
    };

    Uri::builder()
        .scheme(scheme)
        .authority(authority)
        .path_and_query(path_and_query)
        .build()
        .map_err(|e| ServiceError::InvalidForwardUrl {
            url: forward_url.to_string(),
            cause: e.to_string(),
        })
}

fn build_forward_request(
    uri: &Uri,
    record: &RequestData,
) -> Result<Request<Full<Bytes>>, ServiceError> {
    let method = Method::from_bytes(record.method.as_bytes())
        .map_err(|e| ServiceError::Internal(format!("invalid method: {e}")))?;

    let mut builder = Request::builder().method(method).uri(uri.clone());
    for (name, values) in &record.headers {
        if is_hop_by_hop(name)
            || name.eq_ignore_ascii_case("host")
            || name.eq_ignore_ascii_case("content-length")
        {
            continue;
        }
        for value in values {
            builder = builder.header(name.as_str(), value.as_str());
        }
    }
    if record.first_header("user-agent").is_none() {
        builder = builder.header(
            USER_AGENT,
            HeaderValue::from_static(concat!("basketd/", env!("CARGO_PKG_VERSION"))),
        );
    }

    builder
        .body(Full::new(Bytes::from(record.body.clone())))
        .map_err(|e| ServiceError::Internal(format!("failed to build forward request: {e}")))
}
