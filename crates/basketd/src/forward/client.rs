//! Shared HTTP clients for the forwarder.
//!
//! Two pooled clients are kept for the whole process: one that verifies
//! upstream certificates and one that does not. A basket's
//! `insecure_tls` flag picks the client per call, so disabling
//! verification never leaks to other baskets.

use super::tls::NoVerifier;
use bytes::Bytes;
use http_body_util::Full;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::sync::Arc;

pub type HttpClient = Client<hyper_rustls::HttpsConnector<HttpConnector>, Full<Bytes>>;

pub struct ForwardClients {
    verifying: HttpClient,
    insecure: HttpClient,
}

impl ForwardClients {
    pub fn new() -> Self {
        Self {
            verifying: build_client(false),
            insecure: build_client(true),
        }
    }

    /// Client to use for one forwarded call.
    pub fn select(&self, insecure_tls: bool) -> &HttpClient {
        if insecure_tls {
            &self.insecure
        } else {
            &self.verifying
        }
    }
}

impl Default for ForwardClients {
    fn default() -> Self {
        Self::new()
    }
}

fn build_client(skip_tls_verify: bool) -> HttpClient {
    let mut http_connector = HttpConnector::new();
    http_connector.enforce_http(false); // allow both HTTP and HTTPS

    let https_connector = if skip_tls_verify {
        hyper_rustls::HttpsConnectorBuilder::new()
            .with_tls_config(
                rustls::ClientConfig::builder()
                    .dangerous()
                    .with_custom_certificate_verifier(Arc::new(NoVerifier))
                    .with_no_client_auth(),
            )
            .https_or_http()
            .enable_http1()
            .wrap_connector(http_connector)
    } else {
        hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()
            .expect("Failed to load native root certificates")
            .https_or_http()
            .enable_http1()
            .wrap_connector(http_connector)
    };

    Client::builder(TokioExecutor::new()).build(https_connector)
}
