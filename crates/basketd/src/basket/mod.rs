//! Basket model: named inboxes that capture HTTP requests.
//!
//! - `name`: name validation and the reserved-name set
//! - `token`: token generation and constant-time comparison
//! - `store`: bounded newest-first request store
//! - `responses`: per-method canned/templated responses
//! - `core`: the `Basket` aggregate tying the pieces together
//! - `types`: wire-level types shared with the management API

mod core;
pub mod name;
mod responses;
mod store;
mod token;
pub mod types;

pub use self::core::Basket;
pub use responses::{normalize_method, ResponseStore, KNOWN_METHODS};
pub use store::RequestStore;
pub use token::{generate_token, TokenHash};
pub use types::{
    BasketAuth, BasketConfig, BasketNamesPage, BasketNamesQueryPage, BasketSummary, DatabaseStats,
    HeaderDict, RequestData, RequestsPage, RequestsQueryPage, ResponseConfig, SearchScope, Version,
    DEFAULT_CAPACITY,
};
