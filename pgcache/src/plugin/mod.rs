//! Proxy plugin hooks.
//!
//! Three traffic hooks and a manifest, called by the proxy host with an
//! attribute bag per message. Hooks never fail the host's pipeline: on
//! any internal error they degrade to echoing their input (pass-through).
//!
//! - client hook: session resolution, write-path invalidation, cache
//!   probe; a hit terminates the pipeline with the cached bytes.
//! - server hook: enqueues the response for asynchronous caching and
//!   echoes immediately.
//! - close hook: drops the client's session binding.

use crate::attrs::Attrs;
use crate::ingest::CacheWriter;
use crate::invalidate::Invalidator;
use crate::metrics::CacheMetrics;
use crate::session::{self, SessionResolver};
use crate::sql;
use crate::store::{self, Store};
use crate::wire;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Plugin name reported in the manifest.
pub const PLUGIN_NAME: &str = "pgcache";

/// The cache plugin's hook surface.
pub struct Plugin {
    store: Arc<dyn Store>,
    resolver: SessionResolver,
    invalidator: Invalidator,
    writer: CacheWriter,
    metrics: Arc<CacheMetrics>,
}

impl Plugin {
    /// Wires the hook surface over the shared components.
    pub fn new(
        store: Arc<dyn Store>,
        resolver: SessionResolver,
        invalidator: Invalidator,
        writer: CacheWriter,
        metrics: Arc<CacheMetrics>,
    ) -> Self {
        Self {
            store,
            resolver,
            invalidator,
            writer,
            metrics,
        }
    }

    /// Declarative plugin manifest for the host.
    pub fn manifest() -> serde_json::Value {
        json!({
            "id": {
                "name": PLUGIN_NAME,
                "version": crate::VERSION,
            },
            "description": "Caches read-query results and invalidates them on writes",
            "hooks": ["onTrafficFromClient", "onTrafficFromServer", "onClosed"],
            "tags": ["cache", "postgres"],
        })
    }

    /// Client-message hook: serve from cache or pass through.
    pub async fn on_traffic_from_client(&self, attrs: Attrs) -> Attrs {
        let Some(database) = self.resolver.resolve(&attrs).await else {
            if session::is_database_optional(&attrs) {
                trace!("pre-authentication packet without a database; passing through");
            } else {
                warn!("database unknown for client message; skipping cache");
            }
            return attrs;
        };

        let query = attrs.str("query");
        if query.is_empty() {
            return attrs;
        }
        let Some(sql_text) = decode_query(query) else {
            return attrs;
        };

        // Writes evict before anything else; the classifier is heuristic,
        // so the probe below still runs either way.
        if sql::is_write_shaped(&sql_text) {
            self.invalidator.invalidate_statement(&sql_text).await;
        }

        if !sql::is_cacheable(&sql_text) {
            trace!("time-dependent query; skipping cache probe");
            return attrs;
        }

        let request = attrs.str("request");
        let server_remote = attrs.nested_str("server", "remote");
        if request.is_empty() || server_remote.is_empty() {
            return attrs;
        }

        let cache_key = store::response_key(server_remote, &database, request);
        self.metrics.record_get();
        match self.store.get(&cache_key).await {
            Ok(Some(response)) if !response.is_empty() => {
                self.metrics.record_hit();
                info!(database, "cache hit; terminating pipeline");
                Attrs::terminate_with(response)
            }
            Ok(_) => {
                self.metrics.record_miss();
                attrs
            }
            Err(error) => {
                self.metrics.record_store_error();
                debug!(%error, "cache probe failed; passing through");
                attrs
            }
        }
    }

    /// Server-message hook: enqueue for async caching, echo immediately.
    ///
    /// A full ingest channel blocks here, and with it the proxy's
    /// response pipeline for this connection.
    pub async fn on_traffic_from_server(&self, attrs: Attrs) -> Attrs {
        self.writer.enqueue(attrs.clone()).await;
        attrs
    }

    /// Connection-close hook: drop the session binding.
    pub async fn on_closed(&self, attrs: Attrs) -> Attrs {
        let client_remote = attrs.nested_str("client", "remote");
        if client_remote.is_empty() {
            return attrs;
        }
        match self.store.del(client_remote).await {
            Ok(()) => {
                self.metrics.record_delete();
                debug!(client = client_remote, "session closed; binding removed");
            }
            Err(error) => {
                self.metrics.record_store_error();
                debug!(client = client_remote, %error, "failed to remove session binding");
            }
        }
        attrs
    }
}

/// Decodes the base64 wire `Query` attribute into SQL text.
fn decode_query(encoded: &str) -> Option<String> {
    let bytes = match BASE64.decode(encoded) {
        Ok(bytes) => bytes,
        Err(error) => {
            debug!(%error, "failed to decode query attribute");
            return None;
        }
    };
    match wire::simple_query_text(&bytes) {
        Ok(sql_text) => Some(sql_text),
        Err(error) => {
            debug!(%error, "query attribute is not a simple query");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::IngestWorker;
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::time::Duration;

    struct Harness {
        store: Arc<MemoryStore>,
        plugin: Plugin,
        writer: CacheWriter,
        worker: Option<IngestWorker>,
    }

    fn harness(default_db: &str) -> Harness {
        let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
        let metrics = Arc::new(CacheMetrics::new());
        let resolver = SessionResolver::new(store.clone(), default_db.to_string(), metrics.clone());
        let invalidator = Invalidator::new(store.clone(), 1000, metrics.clone());
        let (writer, worker) = IngestWorker::new(
            8,
            store.clone(),
            resolver.clone(),
            Duration::from_secs(3600),
            metrics.clone(),
        );
        let plugin = Plugin::new(
            store.clone(),
            resolver,
            invalidator,
            writer.clone(),
            metrics,
        );
        Harness {
            store,
            plugin,
            writer,
            worker: Some(worker),
        }
    }

    impl Harness {
        /// Drains everything enqueued so far through the ingest worker.
        async fn drain(&mut self) {
            self.writer.close();
            self.worker.take().expect("already drained").run().await;
        }
    }

    fn encode_query(sql_text: &str) -> String {
        let mut message = vec![b'Q'];
        message.extend_from_slice(&((sql_text.len() as u32 + 5).to_be_bytes()));
        message.extend_from_slice(sql_text.as_bytes());
        message.push(0);
        BASE64.encode(&message)
    }

    fn query_attrs(sql_text: &str) -> Attrs {
        Attrs::from_value(json!({
            "client": {"remote": "localhost:45320"},
            "server": {"remote": "localhost:5432"},
            "query": encode_query(sql_text),
            "request": encode_query(sql_text),
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn cold_probe_passes_through() {
        let h = harness("postgres");
        let attrs = query_attrs("SELECT * FROM users");
        let result = h.plugin.on_traffic_from_client(attrs.clone()).await;
        assert_eq!(result, attrs);
    }

    #[tokio::test]
    async fn populated_key_terminates_with_response() {
        let h = harness("postgres");
        let attrs = query_attrs("SELECT * FROM users");
        let cache_key = store::response_key("localhost:5432", "postgres", attrs.str("request"));
        h.store
            .set(&cache_key, "cached-bytes", Duration::ZERO)
            .await
            .unwrap();

        let result = h.plugin.on_traffic_from_client(attrs).await;
        assert!(result.is_terminate());
        assert_eq!(result.str("response"), "cached-bytes");
    }

    #[tokio::test]
    async fn empty_cached_value_is_a_miss() {
        let h = harness("postgres");
        let attrs = query_attrs("SELECT * FROM users");
        let cache_key = store::response_key("localhost:5432", "postgres", attrs.str("request"));
        h.store.set(&cache_key, "", Duration::ZERO).await.unwrap();

        let result = h.plugin.on_traffic_from_client(attrs.clone()).await;
        assert!(!result.is_terminate());
    }

    #[tokio::test]
    async fn unknown_database_passes_through() {
        let h = harness("");
        let attrs = query_attrs("SELECT * FROM users");
        let result = h.plugin.on_traffic_from_client(attrs.clone()).await;
        assert_eq!(result, attrs);
    }

    #[tokio::test]
    async fn non_query_message_passes_through() {
        let h = harness("postgres");
        let attrs = Attrs::from_value(json!({
            "client": {"remote": "localhost:45320"},
        }))
        .unwrap();
        let result = h.plugin.on_traffic_from_client(attrs.clone()).await;
        assert_eq!(result, attrs);
    }

    #[tokio::test]
    async fn write_shaped_query_invalidates_its_tables() {
        let mut h = harness("postgres");

        // Populate via the ingest path
        let select = query_attrs("SELECT * FROM users");
        let server = Attrs::from_value(json!({
            "client": {"remote": "localhost:45320"},
            "server": {"remote": "localhost:5432"},
            "request": select.str("request"),
            "response": "payload",
            "rowDescription": "id",
            "dataRow": ["1"],
            "errorResponse": "",
        }))
        .unwrap();
        h.plugin.on_traffic_from_server(server).await;
        h.drain().await;

        let cache_key = store::response_key("localhost:5432", "postgres", select.str("request"));
        assert!(h.store.get(&cache_key).await.unwrap().is_some());

        // A write on the same table evicts both keys
        h.plugin
            .on_traffic_from_client(query_attrs("INSERT INTO users VALUES (1)"))
            .await;

        assert!(h.store.get(&cache_key).await.unwrap().is_none());
        assert!(h
            .store
            .get(&store::table_key("users", &cache_key))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn non_deterministic_query_neither_hits_nor_writes() {
        let h = harness("postgres");
        let attrs = query_attrs("SELECT NOW()");
        let cache_key = store::response_key("localhost:5432", "postgres", attrs.str("request"));
        h.store
            .set(&cache_key, "stale", Duration::ZERO)
            .await
            .unwrap();

        let result = h.plugin.on_traffic_from_client(attrs).await;
        assert!(!result.is_terminate());
        // The pre-seeded value was not deleted either: the statement is
        // read-shaped, just never probed.
        assert!(h.store.get(&cache_key).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn server_hook_echoes_input() {
        let h = harness("postgres");
        let attrs = Attrs::from_value(json!({"response": "abc"})).unwrap();
        let result = h.plugin.on_traffic_from_server(attrs.clone()).await;
        assert_eq!(result, attrs);
    }

    #[tokio::test]
    async fn close_hook_removes_session_binding() {
        let h = harness("");
        h.store
            .set("localhost:45320", "postgres", Duration::ZERO)
            .await
            .unwrap();

        let attrs = Attrs::from_value(json!({"client": {"remote": "localhost:45320"}})).unwrap();
        let result = h.plugin.on_closed(attrs.clone()).await;

        assert_eq!(result, attrs);
        assert!(h.store.get("localhost:45320").await.unwrap().is_none());
    }

    #[test]
    fn manifest_names_the_traffic_hooks() {
        let manifest = Plugin::manifest();
        let hooks = manifest["hooks"].as_array().unwrap();
        assert!(hooks.iter().any(|h| h == "onTrafficFromClient"));
        assert!(hooks.iter().any(|h| h == "onTrafficFromServer"));
        assert!(hooks.iter().any(|h| h == "onClosed"));
    }
}
