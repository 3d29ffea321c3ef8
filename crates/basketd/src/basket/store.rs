//! Bounded, newest-first store of captured requests.
//!
//! The store is a ring buffer shared between the capture path (writer)
//! and the management handlers (readers, clear, resize). All access
//! goes through one `RwLock`, so a page read always observes a
//! consistent snapshot.

use super::types::{RequestData, RequestsPage, RequestsQueryPage, SearchScope};
use parking_lot::RwLock;
use std::collections::VecDeque;

pub struct RequestStore {
    inner: RwLock<StoreInner>,
}

struct StoreInner {
    /// Front is the oldest record, back the newest.
    requests: VecDeque<RequestData>,
    capacity: usize,
    /// Lifetime count of admitted requests; never reset.
    total: u64,
}

impl RequestStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                requests: VecDeque::with_capacity(capacity.min(1024)),
                capacity,
                total: 0,
            }),
        }
    }

    /// Admit a record, evicting the oldest one when the buffer is full.
    pub fn insert(&self, record: RequestData) {
        let mut inner = self.inner.write();
        while inner.requests.len() >= inner.capacity && inner.requests.pop_front().is_some() {}
        inner.requests.push_back(record);
        inner.total += 1;
    }

    /// Number of records currently held.
    pub fn size(&self) -> usize {
        self.inner.read().requests.len()
    }

    /// Lifetime count of admitted records.
    pub fn total(&self) -> u64 {
        self.inner.read().total
    }

    /// Drop all held records; the lifetime counter is unaffected.
    pub fn clear(&self) {
        self.inner.write().requests.clear();
    }

    /// Change capacity, trimming the oldest records when shrinking.
    pub fn resize(&self, capacity: usize) {
        let mut inner = self.inner.write();
        inner.capacity = capacity;
        while inner.requests.len() > capacity {
            inner.requests.pop_front();
        }
    }

    /// Arrival time of the newest record, 0 when empty.
    pub fn last_request_date(&self) -> i64 {
        self.inner
            .read()
            .requests
            .back()
            .map(|r| r.date)
            .unwrap_or(0)
    }

    /// Page of records, newest first; `skip` positions are counted from
    /// the newest record.
    pub fn get(&self, max: usize, skip: usize) -> RequestsPage {
        let inner = self.inner.read();
        let count = inner.requests.len();
        let requests: Vec<RequestData> = inner
            .requests
            .iter()
            .rev()
            .skip(skip)
            .take(max)
            .cloned()
            .collect();
        RequestsPage {
            requests,
            count,
            total_count: inner.total,
            has_more: count > skip.saturating_add(max),
        }
    }

    /// Page of records matching a substring search, newest first.
    pub fn find(
        &self,
        query: &str,
        scope: SearchScope,
        max: usize,
        skip: usize,
    ) -> RequestsQueryPage {
        let inner = self.inner.read();
        let mut requests = Vec::new();
        let mut matched = 0usize;
        let mut has_more = false;
        for record in inner.requests.iter().rev() {
            if !record.matches(query, scope) {
                continue;
            }
            matched += 1;
            if matched <= skip {
                continue;
            }
            if requests.len() < max {
                requests.push(record.clone());
            } else {
                has_more = true;
                break;
            }
        }
        RequestsQueryPage { requests, has_more }
    }
}
