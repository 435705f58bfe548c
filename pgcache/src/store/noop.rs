//! No-op store for degraded startup.
//!
//! When the backing store is unreachable at startup and
//! `exit_on_startup_error` is off, the service keeps running with this
//! backend: every read misses, every write is accepted and dropped, so
//! all hooks degrade to pass-through.

use super::{Store, StoreError};
use async_trait::async_trait;
use std::time::Duration;

/// Store that never stores.
#[derive(Debug, Clone, Default)]
pub struct NoOpStore;

impl NoOpStore {
    /// Creates a no-op store.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Store for NoOpStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), StoreError> {
        Ok(())
    }

    async fn del(&self, _key: &str) -> Result<(), StoreError> {
        Ok(())
    }

    async fn del_batch(&self, _keys: &[String]) -> Result<(), StoreError> {
        Ok(())
    }

    async fn scan(
        &self,
        _cursor: u64,
        _pattern: &str,
        _count: u64,
    ) -> Result<(u64, Vec<String>), StoreError> {
        Ok((0, Vec::new()))
    }

    async fn keys(&self, _pattern: &str) -> Result<Vec<String>, StoreError> {
        Ok(Vec::new())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
