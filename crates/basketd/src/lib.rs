//! basketd: an HTTP request-capture service.
//!
//! Clients create named baskets; each basket's public URL accepts any
//! verb and path and records the full request into a bounded store.
//! Baskets can answer with configured responses and forward captures to
//! an upstream, optionally proxying the upstream's reply back.

pub mod accept;
pub mod api;
pub mod basket;
pub mod config;
pub mod error;
pub mod forward;
pub mod registry;
pub mod sanitize;
pub mod server;
pub mod template;

pub use config::{ServerConfig, ServiceMode};
pub use error::ServiceError;
pub use server::{AppState, BasketServer};
