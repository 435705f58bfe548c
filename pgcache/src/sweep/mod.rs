//! Stale-session sweeper daemon.
//!
//! Session keys have no TTL; a client that vanishes without a close
//! notification leaves its binding behind forever. The sweeper runs on
//! a timer, asks the host which clients are still connected, and
//! deletes session keys nobody owns anymore.
//!
//! At most one sweep runs at a time: an overrunning sweep makes the
//! interval skip ticks rather than stack them.

mod address;
pub mod inventory;

pub use address::{is_session_address, validate_address_port, validate_host_port};
pub use inventory::{HttpInventoryApi, InventoryApi, InventoryError, Proxy, ProxyMap};

use crate::metrics::CacheMetrics;
use crate::store::Store;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Pattern selecting every key with at least one colon.
///
/// Shape validation separates the session keys from the compound keys
/// this pattern also matches.
const CANDIDATE_PATTERN: &str = "*:*";

/// Background daemon that removes session keys of departed clients.
pub struct Sweeper {
    store: Arc<dyn Store>,
    inventory: Arc<dyn InventoryApi>,
    start_delay: Duration,
    interval: Duration,
    scan_count: u64,
    metrics: Arc<CacheMetrics>,
}

impl Sweeper {
    /// Creates a sweeper over the shared store handle.
    pub fn new(
        store: Arc<dyn Store>,
        inventory: Arc<dyn InventoryApi>,
        start_delay: Duration,
        interval: Duration,
        scan_count: u64,
        metrics: Arc<CacheMetrics>,
    ) -> Self {
        Self {
            store,
            inventory,
            start_delay,
            interval,
            scan_count,
            metrics,
        }
    }

    /// Runs the sweeper until shutdown is signalled.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            start_delay_secs = self.start_delay.as_secs(),
            interval_secs = self.interval.as_secs(),
            "sweeper starting"
        );

        let first_tick = tokio::time::Instant::now() + self.start_delay;
        let mut interval = tokio::time::interval_at(first_tick, self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("sweeper shutting down");
                    break;
                }

                _ = interval.tick() => {
                    self.sweep_once().await;
                }
            }
        }
    }

    /// One sweep pass. Returns the number of session keys removed.
    pub async fn sweep_once(&self) -> usize {
        let inventory = self.inventory.proxies().await;
        if inventory.is_none() {
            // Without the inventory every client must be presumed
            // connected; sweeping blind would break live sessions.
            warn!("proxy inventory unavailable; skipping sweep");
            return 0;
        }

        let mut removed = 0;
        for key in self.candidate_keys().await {
            if !is_session_address(&key) {
                continue;
            }
            if inventory::is_busy(inventory.as_ref(), &key) {
                trace!(key, "client still connected; keeping session");
                continue;
            }
            match self.store.del(&key).await {
                Ok(()) => {
                    self.metrics.record_delete();
                    debug!(key, "deleted stale session key");
                    removed += 1;
                }
                Err(error) => {
                    self.metrics.record_store_error();
                    debug!(key, %error, "failed to delete session key");
                }
            }
        }

        if removed > 0 {
            info!(removed, "sweep finished");
        } else {
            trace!("no stale session keys");
        }
        removed
    }

    /// Collects candidate keys via SCAN, falling back to KEYS when the
    /// backend does not support cursors.
    async fn candidate_keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        let mut cursor = 0u64;
        loop {
            match self
                .store
                .scan(cursor, CANDIDATE_PATTERN, self.scan_count)
                .await
            {
                Ok((next_cursor, batch)) => {
                    self.metrics.record_scan();
                    keys.extend(batch);
                    cursor = next_cursor;
                    if cursor == 0 {
                        return keys;
                    }
                }
                Err(error) => {
                    debug!(%error, "SCAN failed; falling back to KEYS");
                    break;
                }
            }
        }

        match self.store.keys(CANDIDATE_PATTERN).await {
            Ok(keys) => keys,
            Err(error) => {
                self.metrics.record_store_error();
                debug!(%error, "failed to list session keys");
                Vec::new()
            }
        }
    }
}
