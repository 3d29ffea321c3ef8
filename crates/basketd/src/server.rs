//! HTTP server: one listener serving both the management API and the
//! public capture surface.

use crate::accept::accept_request;
use crate::api::route_api;
use crate::api::types::{build_response_with_headers, error_response};
use crate::basket::TokenHash;
use crate::config::ServerConfig;
use crate::error::ServiceError;
use crate::forward::Forwarder;
use crate::registry::BasketRegistry;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// Everything a request handler needs, shared across connections.
pub struct AppState {
    pub config: ServerConfig,
    pub registry: Arc<dyn BasketRegistry>,
    pub forwarder: Arc<Forwarder>,
    pub master: TokenHash,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        registry: Arc<dyn BasketRegistry>,
        master: TokenHash,
    ) -> Self {
        let forwarder = Arc::new(Forwarder::new(config.forward_timeout));
        Self {
            config,
            registry,
            forwarder,
            master,
        }
    }
}

pub struct BasketServer {
    listener: TcpListener,
    state: Arc<AppState>,
}

impl BasketServer {
    /// Bind the configured address; the bound address is available via
    /// [`BasketServer::local_addr`] (relevant when binding port 0).
    pub async fn bind(state: Arc<AppState>) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(state.config.listen).await?;
        Ok(Self { listener, state })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept loop; every connection is served on its own task.
    pub async fn serve(self) -> anyhow::Result<()> {
        info!(
            "basketd listening on http://{}",
            self.listener.local_addr()?
        );
        loop {
            let (stream, _) = self.listener.accept().await?;
            let io = TokioIo::new(stream);
            let state = Arc::clone(&self.state);

            tokio::spawn(async move {
                let service = service_fn(move |req| {
                    let state = Arc::clone(&state);
                    async move { Ok::<_, Infallible>(dispatch(req, &state).await) }
                });

                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    debug!("connection error: {}", e);
                }
            });
        }
    }

    pub async fn run(state: Arc<AppState>) -> anyhow::Result<()> {
        match Self::bind(state).await {
            Ok(server) => server.serve().await,
            Err(e) => {
                error!("failed to bind listener: {}", e);
                Err(e)
            }
        }
    }
}

/// Top-level routing between the web redirect, the management API and
/// the capture path.
async fn dispatch(req: Request<Incoming>, state: &AppState) -> Response<Full<Bytes>> {
    let path = req.uri().path().to_string();
    let prefix = &state.config.prefix;

    let below = if prefix.is_empty() {
        path
    } else {
        match path.strip_prefix(prefix.as_str()) {
            Some(rest) if rest.is_empty() => "/".to_string(),
            Some(rest) if rest.starts_with('/') => rest.to_string(),
            _ => return error_response(&ServiceError::OutsidePrefix(prefix.clone())),
        }
    };

    if below == "/" {
        return build_response_with_headers(
            StatusCode::FOUND,
            [("Location", format!("{prefix}/web").as_str())],
            Bytes::new(),
        );
    }
    if below == "/web" || below.starts_with("/web/") {
        // the administration UI lives outside this service core
        return build_response_with_headers(
            StatusCode::OK,
            [("Content-Type", "text/html; charset=UTF-8")],
            "<!DOCTYPE html><html><head><title>basketd</title></head>\
             <body><p>Use the REST API under /api to manage baskets.</p></body></html>",
        );
    }
    if below == "/api" || below.starts_with("/api/") {
        return route_api(req, &below, state).await;
    }

    accept_request(req, state).await
}
