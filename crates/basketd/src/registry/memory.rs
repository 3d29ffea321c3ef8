//! In-memory storage backend.
//!
//! Baskets live in a map guarded by a single `RwLock`, with a sorted
//! name index kept alongside so that listing and prefix search never
//! have to re-sort.

use super::BasketRegistry;
use crate::basket::name::{is_reserved, validate_name};
use crate::basket::{
    Basket, BasketConfig, BasketNamesPage, BasketNamesQueryPage, BasketSummary, DatabaseStats,
};
use crate::error::ServiceError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

pub struct InMemoryRegistry {
    max_capacity: i64,
    inner: RwLock<Inner>,
}

impl std::fmt::Debug for InMemoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRegistry")
            .field("max_capacity", &self.max_capacity)
            .finish()
    }
}

struct Inner {
    baskets: HashMap<String, Arc<Basket>>,
    /// Names in lexicographic order, maintained on create/delete.
    names: Vec<String>,
}

impl InMemoryRegistry {
    pub fn new(max_capacity: i64) -> Self {
        Self {
            max_capacity,
            inner: RwLock::new(Inner {
                baskets: HashMap::new(),
                names: Vec::new(),
            }),
        }
    }
}

impl BasketRegistry for InMemoryRegistry {
    fn create(&self, name: &str, config: BasketConfig) -> Result<String, ServiceError> {
        validate_name(name)?;
        if is_reserved(name) {
            return Err(ServiceError::Reserved(name.to_string()));
        }
        config.validate(self.max_capacity)?;

        let mut inner = self.inner.write();
        if inner.baskets.contains_key(name) {
            return Err(ServiceError::Conflict(name.to_string()));
        }
        let (basket, token) = Basket::create(name, config);
        inner.baskets.insert(name.to_string(), basket);
        let position = inner
            .names
            .binary_search_by(|n| n.as_str().cmp(name))
            .unwrap_err();
        inner.names.insert(position, name.to_string());
        Ok(token)
    }

    fn get(&self, name: &str) -> Option<Arc<Basket>> {
        self.inner.read().baskets.get(name).cloned()
    }

    fn delete(&self, name: &str) -> Option<Arc<Basket>> {
        let mut inner = self.inner.write();
        let basket = inner.baskets.remove(name)?;
        if let Ok(position) = inner.names.binary_search_by(|n| n.as_str().cmp(name)) {
            inner.names.remove(position);
        }
        Some(basket)
    }

    fn size(&self) -> usize {
        self.inner.read().baskets.len()
    }

    fn list(&self, max: usize, skip: usize) -> BasketNamesPage {
        let inner = self.inner.read();
        let count = inner.names.len();
        let names: Vec<String> = inner.names.iter().skip(skip).take(max).cloned().collect();
        BasketNamesPage {
            names,
            count,
            has_more: count > skip.saturating_add(max),
        }
    }

    fn find(&self, prefix: &str, max: usize, skip: usize) -> BasketNamesQueryPage {
        let inner = self.inner.read();
        let mut names = Vec::new();
        let mut matched = 0usize;
        let mut has_more = false;
        for name in inner.names.iter().filter(|n| n.starts_with(prefix)) {
            matched += 1;
            if matched <= skip {
                continue;
            }
            if names.len() < max {
                names.push(name.clone());
            } else {
                has_more = true;
                break;
            }
        }
        BasketNamesQueryPage { names, has_more }
    }

    fn stats(&self, top: usize) -> DatabaseStats {
        let inner = self.inner.read();
        let mut summaries: Vec<BasketSummary> =
            inner.baskets.values().map(|b| b.summary()).collect();

        let baskets_count = summaries.len();
        let empty_baskets_count = summaries.iter().filter(|s| s.requests_count == 0).count();
        let requests_count: usize = summaries.iter().map(|s| s.requests_count).sum();
        let max_basket_size = summaries.iter().map(|s| s.requests_count).max().unwrap_or(0);
        let avg_basket_size = if baskets_count > 0 {
            requests_count / baskets_count
        } else {
            0
        };

        summaries.sort_by(|a, b| b.last_request_date.cmp(&a.last_request_date));
        let top_baskets_by_date: Vec<BasketSummary> =
            summaries.iter().take(top).cloned().collect();

        summaries.sort_by(|a, b| b.requests_count.cmp(&a.requests_count));
        let top_baskets_by_size: Vec<BasketSummary> =
            summaries.iter().take(top).cloned().collect();

        DatabaseStats {
            baskets_count,
            empty_baskets_count,
            requests_count,
            max_basket_size,
            avg_basket_size,
            top_baskets_by_date,
            top_baskets_by_size,
        }
    }
}
