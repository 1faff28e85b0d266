//! Cache abstraction injected into the fetching providers

use async_trait::async_trait;
use std::time::Duration;

/// Key-value cache with per-entry time-to-live.
///
/// An entry stored with `ttl = None` never expires. Expired entries are never
/// returned by `get`.
#[async_trait]
pub trait Cache<K, V>: Send + Sync {
    async fn get(&self, key: &K) -> Option<V>;
    async fn put(&self, key: K, value: V, ttl: Option<Duration>);
    /// Drops every expired entry and returns how many were removed.
    async fn evict_expired(&self) -> usize;
}
