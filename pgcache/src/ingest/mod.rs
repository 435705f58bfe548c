//! Asynchronous write-path ingestion.
//!
//! The server hook must not pay for store writes, so it enqueues the
//! response's attribute bag into a bounded channel and returns. A
//! single long-lived [`IngestWorker`] drains the channel, caching
//! eligible responses under their composite key and cross-indexing
//! them by table.
//!
//! A full channel blocks the server hook, which blocks the proxy's
//! response pipeline for that connection: writes are never dropped
//! silently. Closing the writer ends the worker's loop; shutdown
//! awaits its join handle.

use crate::attrs::Attrs;
use crate::metrics::CacheMetrics;
use crate::session::SessionResolver;
use crate::sql;
use crate::store::{self, Store};
use crate::wire;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

/// Sending half of the ingest channel.
///
/// Cloneable; all clones share one closable sender. `close()` drops the
/// sender so the worker sees end-of-channel and exits after draining.
#[derive(Clone)]
pub struct CacheWriter {
    sender: Arc<Mutex<Option<mpsc::Sender<Attrs>>>>,
}

impl CacheWriter {
    /// Enqueues a server response for asynchronous caching.
    ///
    /// Blocks when the channel is full (designed backpressure). After
    /// `close()` the message is dropped with a warning.
    pub async fn enqueue(&self, attrs: Attrs) {
        let sender = self
            .sender
            .lock()
            .expect("ingest sender poisoned")
            .clone();
        match sender {
            Some(sender) => {
                if sender.send(attrs).await.is_err() {
                    warn!("ingest worker gone; dropping server response");
                }
            }
            None => warn!("ingest channel closed; dropping server response"),
        }
    }

    /// Closes the channel. The worker drains queued messages and exits.
    pub fn close(&self) {
        self.sender.lock().expect("ingest sender poisoned").take();
    }
}

/// Background worker that persists eligible responses.
pub struct IngestWorker {
    receiver: mpsc::Receiver<Attrs>,
    store: Arc<dyn Store>,
    resolver: SessionResolver,
    expiry: Duration,
    metrics: Arc<CacheMetrics>,
}

impl IngestWorker {
    /// Creates the bounded channel and its worker.
    pub fn new(
        capacity: usize,
        store: Arc<dyn Store>,
        resolver: SessionResolver,
        expiry: Duration,
        metrics: Arc<CacheMetrics>,
    ) -> (CacheWriter, Self) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let writer = CacheWriter {
            sender: Arc::new(Mutex::new(Some(sender))),
        };
        let worker = Self {
            receiver,
            store,
            resolver,
            expiry,
            metrics,
        };
        (writer, worker)
    }

    /// Runs until the channel closes. Per-message failures are logged
    /// and skipped; nothing short of channel close ends the loop.
    pub async fn run(mut self) {
        info!("ingest worker started");
        while let Some(attrs) = self.receiver.recv().await {
            self.process(&attrs).await;
        }
        info!("ingest worker stopped");
    }

    /// Caches one server response, when eligible.
    async fn process(&self, attrs: &Attrs) {
        let error_response = attrs.str("errorResponse");
        let row_description = attrs.str("rowDescription");
        let request = attrs.str("request");
        let response = attrs.str("response");
        let server_remote = attrs.nested_str("server", "remote");

        let Some(database) = self.resolver.resolve(attrs).await else {
            debug!("database unknown for server response; skipping cache");
            return;
        };

        // Only successful, row-bearing responses are worth caching.
        if !error_response.is_empty() || row_description.is_empty() || !attrs.has_items("dataRow") {
            trace!("response not cacheable; skipping");
            return;
        }
        if request.is_empty() || response.is_empty() || server_remote.is_empty() {
            trace!("response missing request context; skipping");
            return;
        }

        let sql_text = match self.decode_sql(request) {
            Some(sql_text) => sql_text,
            None => return,
        };
        if !sql::is_cacheable(&sql_text) {
            trace!("time-dependent query; skipping cache");
            return;
        }

        let response_key = store::response_key(server_remote, &database, request);
        match self
            .store
            .set(&response_key, response, self.expiry)
            .await
        {
            Ok(()) => {
                self.metrics.record_set();
                trace!(key = %response_key, "cached response");
            }
            Err(error) => {
                self.metrics.record_store_error();
                debug!(%error, "failed to cache response");
                return;
            }
        }

        // Same TTL on every index key so response and indexes expire
        // together.
        let tables = match sql::tables_in(&sql_text) {
            Ok(tables) => tables,
            Err(error) => {
                debug!(%error, "failed to enumerate tables; response cached unindexed");
                return;
            }
        };
        for table in tables {
            let index_key = store::table_key(&table, &response_key);
            match self.store.set(&index_key, "", self.expiry).await {
                Ok(()) => self.metrics.record_set(),
                Err(error) => {
                    self.metrics.record_store_error();
                    debug!(table, %error, "failed to write table index");
                }
            }
        }
    }

    /// Decodes the SQL text out of the raw client request bytes.
    fn decode_sql(&self, request: &str) -> Option<String> {
        let bytes = match BASE64.decode(request) {
            Ok(bytes) => bytes,
            Err(error) => {
                debug!(%error, "failed to decode request bytes");
                return None;
            }
        };
        match wire::simple_query_text(&bytes) {
            Ok(sql_text) => Some(sql_text),
            Err(error) => {
                debug!(%error, "request is not a simple query; skipping cache");
                None
            }
        }
    }
}
