//! Key-value store access.
//!
//! Exactly one store connection is shared by every component. The
//! [`Store`] trait is the seam: the production backend is Redis via a
//! connection manager, the in-memory backend backs tests, and the no-op
//! backend stands in when the store was unreachable at startup and the
//! operator chose to keep running.
//!
//! TTL convention: `Duration::ZERO` means no expiry (session keys);
//! anything else expires the key.

mod key;
mod memory;
mod noop;
mod redis;

pub use key::{response_key, strip_table_prefix, table_key, table_pattern};
pub use memory::MemoryStore;
pub use noop::NoOpStore;
pub use redis::RedisStore;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend rejected or failed the command
    #[error("store backend error: {0}")]
    Backend(#[from] ::redis::RedisError),
}

/// Minimal command set the cache needs from its backing store.
///
/// All methods take `&self`; implementations provide their own
/// synchronization and must be safe for concurrent use.
#[async_trait]
pub trait Store: Send + Sync {
    /// Reads a key. `Ok(None)` is a miss.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes a key with the given TTL (`Duration::ZERO` = no expiry).
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Deletes a single key.
    async fn del(&self, key: &str) -> Result<(), StoreError>;

    /// Deletes a batch of keys in one pipelined round trip.
    async fn del_batch(&self, keys: &[String]) -> Result<(), StoreError>;

    /// One SCAN step: returns the next cursor and a batch of matching
    /// keys. A returned cursor of zero ends the iteration.
    async fn scan(
        &self,
        cursor: u64,
        pattern: &str,
        count: u64,
    ) -> Result<(u64, Vec<String>), StoreError>;

    /// Lists all keys matching a glob pattern (sweeper fallback).
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, StoreError>;

    /// Liveness probe.
    async fn ping(&self) -> Result<(), StoreError>;
}
