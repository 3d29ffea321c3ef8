//! Basket registry: the storage backend interface.
//!
//! The service talks to its storage through this trait only; the
//! in-memory backend is the one shipped here, durable ones can slot in
//! behind the same capability surface.

mod memory;

pub use memory::InMemoryRegistry;

use crate::basket::{Basket, BasketConfig, BasketNamesPage, BasketNamesQueryPage, DatabaseStats};
use crate::error::ServiceError;
use std::sync::Arc;

/// Capability surface every storage backend provides.
pub trait BasketRegistry: Send + Sync + std::fmt::Debug {
    /// Create a basket and return its cleartext token. Fails with
    /// `InvalidName`, `Reserved`, `Conflict` or `InvalidConfig`.
    fn create(&self, name: &str, config: BasketConfig) -> Result<String, ServiceError>;

    fn get(&self, name: &str) -> Option<Arc<Basket>>;

    /// Remove a basket together with its captured requests and
    /// response table. Returns the removed basket, if any.
    fn delete(&self, name: &str) -> Option<Arc<Basket>>;

    /// Number of baskets currently registered.
    fn size(&self) -> usize;

    /// Page of names in lexicographic order.
    fn list(&self, max: usize, skip: usize) -> BasketNamesPage;

    /// Page of names starting with `prefix`, lexicographic order.
    fn find(&self, prefix: &str, max: usize, skip: usize) -> BasketNamesQueryPage;

    /// Aggregate statistics; `top` bounds the per-ranking basket count.
    fn stats(&self, top: usize) -> DatabaseStats;
}

/// Instantiate the backend selected by configuration.
pub fn create_backend(
    kind: &str,
    max_capacity: i64,
) -> anyhow::Result<Arc<dyn BasketRegistry>> {
    match kind {
        "memory" => Ok(Arc::new(InMemoryRegistry::new(max_capacity))),
        other => anyhow::bail!("unknown storage backend: {other}"),
    }
}
