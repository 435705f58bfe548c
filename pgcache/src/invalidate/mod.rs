//! Table-driven cache invalidation.
//!
//! Every cached response is cross-indexed under each table it touches
//! (`<table>:<response-key>`), so invalidating a table is a prefix scan:
//! collect every index key under `<table>:`, recover the response key
//! each one points to, and delete both sides in a single pipelined
//! round trip.

use crate::metrics::CacheMetrics;
use crate::sql;
use crate::store::{self, Store};
use std::sync::Arc;
use tracing::{debug, trace};

/// Deletes every cache entry depending on a mutated table.
#[derive(Clone)]
pub struct Invalidator {
    store: Arc<dyn Store>,
    scan_count: u64,
    metrics: Arc<CacheMetrics>,
}

impl Invalidator {
    /// Creates an invalidator over the shared store handle.
    pub fn new(store: Arc<dyn Store>, scan_count: u64, metrics: Arc<CacheMetrics>) -> Self {
        Self {
            store,
            scan_count,
            metrics,
        }
    }

    /// Invalidates every table a write-shaped statement touches.
    ///
    /// A parse failure skips invalidation for this statement; the entry
    /// will still age out by TTL.
    pub async fn invalidate_statement(&self, sql_text: &str) {
        let tables = match sql::tables_in(sql_text) {
            Ok(tables) => tables,
            Err(error) => {
                debug!(%error, "failed to parse statement for invalidation");
                return;
            }
        };
        trace!(?tables, "invalidating tables");
        for table in tables {
            self.invalidate_table(&table).await;
        }
    }

    /// Removes all index keys of `table` and the response keys they
    /// point to.
    ///
    /// Standard SCAN loop: the cursor advances each step and zero ends
    /// the iteration; deletions are queued and executed as one pipeline
    /// after the scan completes. A concurrent ingest writing between
    /// scan and delete leaves a transient stale entry that the next
    /// write (or the TTL) removes.
    pub async fn invalidate_table(&self, table: &str) {
        let pattern = store::table_pattern(table);
        let mut cursor = 0u64;
        let mut doomed: Vec<String> = Vec::new();

        loop {
            match self.store.scan(cursor, &pattern, self.scan_count).await {
                Ok((next_cursor, keys)) => {
                    self.metrics.record_scan();
                    for index_key in keys {
                        if let Some(response_key) = store::strip_table_prefix(&index_key, table) {
                            doomed.push(response_key.to_string());
                        }
                        doomed.push(index_key);
                    }
                    cursor = next_cursor;
                    if cursor == 0 {
                        break;
                    }
                }
                Err(error) => {
                    self.metrics.record_store_error();
                    debug!(table, %error, "failed to scan index keys");
                    return;
                }
            }
        }

        if doomed.is_empty() {
            trace!(table, "no cache entries to invalidate");
            return;
        }

        match self.store.del_batch(&doomed).await {
            Ok(()) => {
                self.metrics.record_deletes(doomed.len() as u64);
                debug!(table, keys = doomed.len(), "invalidated cache entries");
            }
            Err(error) => {
                self.metrics.record_store_error();
                debug!(table, %error, "failed to delete cache entries");
            }
        }
    }
}
