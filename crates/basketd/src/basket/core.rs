//! The basket aggregate: configuration, capture store, response table
//! and the authentication token, as one shareable unit.

use super::responses::ResponseStore;
use super::store::RequestStore;
use super::token::{generate_token, TokenHash};
use super::types::{
    BasketConfig, BasketSummary, RequestData, RequestsPage, RequestsQueryPage, ResponseConfig,
    SearchScope,
};
use crate::error::ServiceError;
use parking_lot::RwLock;
use std::sync::Arc;

pub struct Basket {
    name: String,
    config: RwLock<BasketConfig>,
    token: TokenHash,
    store: RequestStore,
    responses: ResponseStore,
}

impl Basket {
    /// Create a basket and return it with the cleartext token, the only
    /// copy that will ever exist.
    pub fn create(name: &str, config: BasketConfig) -> (Arc<Basket>, String) {
        let token = generate_token();
        let basket = Arc::new(Basket {
            name: name.to_string(),
            store: RequestStore::new(config.capacity as usize),
            config: RwLock::new(config),
            token: TokenHash::of(&token),
            responses: ResponseStore::new(),
        });
        (basket, token)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> BasketConfig {
        self.config.read().clone()
    }

    /// Replace the configuration; shrinking the capacity trims the
    /// oldest captured requests at once.
    pub fn update(&self, config: BasketConfig) {
        self.store.resize(config.capacity as usize);
        *self.config.write() = config;
    }

    /// Constant-time token check.
    pub fn authorize(&self, token: &str) -> bool {
        self.token.matches(token)
    }

    pub fn add_request(&self, record: RequestData) {
        self.store.insert(record);
    }

    pub fn requests(&self, max: usize, skip: usize) -> RequestsPage {
        self.store.get(max, skip)
    }

    pub fn find_requests(
        &self,
        query: &str,
        scope: SearchScope,
        max: usize,
        skip: usize,
    ) -> RequestsQueryPage {
        self.store.find(query, scope, max, skip)
    }

    pub fn clear(&self) {
        self.store.clear();
    }

    pub fn size(&self) -> usize {
        self.store.size()
    }

    pub fn total(&self) -> u64 {
        self.store.total()
    }

    pub fn last_request_date(&self) -> i64 {
        self.store.last_request_date()
    }

    pub fn response(&self, method: &str) -> ResponseConfig {
        self.responses.get(method)
    }

    pub fn configured_response(&self, method: &str) -> Option<ResponseConfig> {
        self.responses.configured(method)
    }

    pub fn set_response(&self, method: &str, config: ResponseConfig) -> Result<(), ServiceError> {
        self.responses.set(method, config)
    }

    pub fn summary(&self) -> BasketSummary {
        BasketSummary {
            name: self.name.clone(),
            requests_count: self.size(),
            requests_total_count: self.total(),
            last_request_date: self.last_request_date(),
        }
    }
}
