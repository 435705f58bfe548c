//! End-to-end hook scenarios against the in-memory store.
//!
//! Each scenario feeds literal wire bytes through the client hook, the
//! server hook, and the ingest worker, then inspects the keyspace.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use pgcache::attrs::Attrs;
use pgcache::ingest::{CacheWriter, IngestWorker};
use pgcache::invalidate::Invalidator;
use pgcache::metrics::CacheMetrics;
use pgcache::plugin::Plugin;
use pgcache::session::SessionResolver;
use pgcache::store::{response_key, table_key, MemoryStore, Store};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const CLIENT: &str = "localhost:45320";
const SERVER: &str = "localhost:5432";

/// The row-bearing server response from the protocol capture:
/// RowDescription(id) + DataRow("1") + CommandComplete(SELECT 1) + ReadyForQuery.
const RESPONSE_B64: &str = "VAAAABsAAWlkAAAAQAQAAQAAABcABP////8AAEQAAAALAAEAAAABMUMAAAANU0VMRUNUIDEAWgAAAAVJ";

// ─────────────────────────────────────────────────────────────────────────
// Harness
// ─────────────────────────────────────────────────────────────────────────

struct Harness {
    store: Arc<MemoryStore>,
    plugin: Plugin,
    writer: CacheWriter,
    worker: Option<IngestWorker>,
}

fn harness() -> Harness {
    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    let metrics = Arc::new(CacheMetrics::new());
    let resolver = SessionResolver::new(store.clone(), String::new(), metrics.clone());
    let invalidator = Invalidator::new(store.clone(), 1000, metrics.clone());
    let (writer, worker) = IngestWorker::new(
        16,
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
    /// Closes the ingest channel and runs the worker to completion.
    async fn drain(&mut self) {
        self.writer.close();
        self.worker.take().expect("already drained").run().await;
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Wire-byte builders
// ─────────────────────────────────────────────────────────────────────────

fn startup_message(params: &[(&str, &str)]) -> String {
    let mut body = Vec::new();
    body.extend_from_slice(&196_608u32.to_be_bytes());
    for (key, value) in params {
        body.extend_from_slice(key.as_bytes());
        body.push(0);
        body.extend_from_slice(value.as_bytes());
        body.push(0);
    }
    body.push(0);

    let mut packet = Vec::new();
    packet.extend_from_slice(&((body.len() as u32 + 4).to_be_bytes()));
    packet.extend_from_slice(&body);
    BASE64.encode(&packet)
}

fn query_message(sql: &str) -> String {
    let mut message = vec![b'Q'];
    message.extend_from_slice(&((sql.len() as u32 + 5).to_be_bytes()));
    message.extend_from_slice(sql.as_bytes());
    message.push(0);
    BASE64.encode(&message)
}

fn handshake_attrs() -> Attrs {
    Attrs::from_value(json!({
        "client": {"remote": CLIENT},
        "startupMessage": startup_message(&[("user", "postgres"), ("database", "postgres")]),
    }))
    .unwrap()
}

fn query_attrs(sql: &str) -> Attrs {
    Attrs::from_value(json!({
        "client": {"remote": CLIENT},
        "server": {"remote": SERVER},
        "query": query_message(sql),
        "request": query_message(sql),
    }))
    .unwrap()
}

fn server_attrs(sql: &str, response: &str) -> Attrs {
    Attrs::from_value(json!({
        "client": {"remote": CLIENT},
        "server": {"remote": SERVER},
        "request": query_message(sql),
        "response": response,
        "rowDescription": "id",
        "dataRow": ["1"],
        "errorResponse": "",
    }))
    .unwrap()
}

// ─────────────────────────────────────────────────────────────────────────
// Scenarios
// ─────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn s1_handshake_binds_database() {
    let h = harness();

    let attrs = handshake_attrs();
    let result = h.plugin.on_traffic_from_client(attrs.clone()).await;

    assert_eq!(result, attrs, "handshake must pass through unchanged");
    assert_eq!(
        h.store.get(CLIENT).await.unwrap().as_deref(),
        Some("postgres"),
        "session key must bind the announced database"
    );
}

#[tokio::test]
async fn s2_cold_miss_then_populate_then_hit() {
    let mut h = harness();
    h.plugin.on_traffic_from_client(handshake_attrs()).await;

    // Cold probe: pass-through
    let query = query_attrs("SELECT * FROM users");
    let first = h.plugin.on_traffic_from_client(query.clone()).await;
    assert!(!first.is_terminate());

    // Matching server response, drained through the ingestor
    h.plugin
        .on_traffic_from_server(server_attrs("SELECT * FROM users", RESPONSE_B64))
        .await;
    h.drain().await;

    let request = query_message("SELECT * FROM users");
    let cache_key = response_key(SERVER, "postgres", &request);
    assert_eq!(
        h.store.get(&cache_key).await.unwrap().as_deref(),
        Some(RESPONSE_B64),
        "response key must hold the response bytes"
    );
    assert_eq!(
        h.store
            .get(&table_key("users", &cache_key))
            .await
            .unwrap()
            .as_deref(),
        Some(""),
        "table index key must hold the empty sentinel"
    );

    // Same query again: hit, terminate, cached bytes attached
    let second = h.plugin.on_traffic_from_client(query).await;
    assert!(second.is_terminate());
    assert_eq!(second.str("response"), RESPONSE_B64);
}

#[tokio::test]
async fn s3_write_invalidates() {
    let mut h = harness();
    h.plugin.on_traffic_from_client(handshake_attrs()).await;
    h.plugin
        .on_traffic_from_server(server_attrs("SELECT * FROM users", RESPONSE_B64))
        .await;
    h.drain().await;

    h.plugin
        .on_traffic_from_client(query_attrs("INSERT INTO users VALUES (1)"))
        .await;

    let request = query_message("SELECT * FROM users");
    let cache_key = response_key(SERVER, "postgres", &request);
    assert!(h.store.get(&cache_key).await.unwrap().is_none());
    assert!(h
        .store
        .get(&table_key("users", &cache_key))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn s4_select_does_not_invalidate() {
    let mut h = harness();
    h.plugin.on_traffic_from_client(handshake_attrs()).await;
    h.plugin
        .on_traffic_from_server(server_attrs("SELECT * FROM users", RESPONSE_B64))
        .await;
    h.drain().await;

    h.plugin
        .on_traffic_from_client(query_attrs("SELECT 1 FROM t_unrelated"))
        .await;

    let request = query_message("SELECT * FROM users");
    let cache_key = response_key(SERVER, "postgres", &request);
    assert_eq!(
        h.store.get(&cache_key).await.unwrap().as_deref(),
        Some(RESPONSE_B64)
    );
    assert!(h
        .store
        .get(&table_key("users", &cache_key))
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn s5_non_deterministic_query_bypasses_cache() {
    let mut h = harness();
    h.plugin.on_traffic_from_client(handshake_attrs()).await;

    h.plugin
        .on_traffic_from_client(query_attrs("SELECT NOW()"))
        .await;
    h.plugin
        .on_traffic_from_server(server_attrs("SELECT NOW()", RESPONSE_B64))
        .await;
    h.drain().await;

    let request = query_message("SELECT NOW()");
    let cache_key = response_key(SERVER, "postgres", &request);
    assert!(
        h.store.get(&cache_key).await.unwrap().is_none(),
        "no response key may be created for a time-dependent query"
    );
    assert_eq!(
        h.store.get(CLIENT).await.unwrap().as_deref(),
        Some("postgres"),
        "the session key must survive"
    );
}

#[tokio::test]
async fn s6_closed_connection_clears_session() {
    let mut h = harness();
    h.plugin.on_traffic_from_client(handshake_attrs()).await;
    h.plugin
        .on_traffic_from_server(server_attrs("SELECT * FROM users", RESPONSE_B64))
        .await;
    h.drain().await;

    let close = Attrs::from_value(json!({"client": {"remote": CLIENT}})).unwrap();
    let result = h.plugin.on_closed(close.clone()).await;
    assert_eq!(result, close);

    assert!(h.store.get(CLIENT).await.unwrap().is_none());

    // Response and index keys are unaffected
    let request = query_message("SELECT * FROM users");
    let cache_key = response_key(SERVER, "postgres", &request);
    assert!(h.store.get(&cache_key).await.unwrap().is_some());
    assert!(h
        .store
        .get(&table_key("users", &cache_key))
        .await
        .unwrap()
        .is_some());
}

// ─────────────────────────────────────────────────────────────────────────
// Invariants
// ─────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn ineligible_responses_never_reach_the_store() {
    let mut h = harness();
    h.plugin.on_traffic_from_client(handshake_attrs()).await;

    let mut errored = server_attrs("SELECT * FROM users", RESPONSE_B64);
    errored.set_str("errorResponse", "ERROR: permission denied");
    let mut rowless = server_attrs("SELECT * FROM empty_table", RESPONSE_B64);
    rowless.set("dataRow", json!([]));
    let mut no_description = server_attrs("SELECT * FROM users", RESPONSE_B64);
    no_description.set_str("rowDescription", "");

    for attrs in [errored, rowless, no_description] {
        h.plugin.on_traffic_from_server(attrs).await;
    }
    h.drain().await;

    // Only the session key remains
    assert_eq!(h.store.len(), 1);
    assert!(h.store.get(CLIENT).await.unwrap().is_some());
}

#[tokio::test]
async fn session_key_tracks_most_recent_handshake() {
    let h = harness();

    h.plugin.on_traffic_from_client(handshake_attrs()).await;
    assert_eq!(
        h.store.get(CLIENT).await.unwrap().as_deref(),
        Some("postgres")
    );

    let rebind = Attrs::from_value(json!({
        "client": {"remote": CLIENT},
        "startupMessage": startup_message(&[("user", "postgres"), ("database", "analytics")]),
    }))
    .unwrap();
    h.plugin.on_traffic_from_client(rebind).await;
    assert_eq!(
        h.store.get(CLIENT).await.unwrap().as_deref(),
        Some("analytics")
    );
}

#[tokio::test]
async fn multi_table_join_is_indexed_and_invalidated_by_either_table() {
    let mut h = harness();
    h.plugin.on_traffic_from_client(handshake_attrs()).await;

    let sql = "SELECT * FROM users JOIN orders ON orders.user_id = users.id";
    h.plugin
        .on_traffic_from_server(server_attrs(sql, RESPONSE_B64))
        .await;
    h.drain().await;

    let cache_key = response_key(SERVER, "postgres", &query_message(sql));
    assert!(h.store.get(&cache_key).await.unwrap().is_some());
    assert!(h
        .store
        .get(&table_key("users", &cache_key))
        .await
        .unwrap()
        .is_some());
    assert!(h
        .store
        .get(&table_key("orders", &cache_key))
        .await
        .unwrap()
        .is_some());

    // Mutating the joined table evicts the response too
    h.plugin
        .on_traffic_from_client(query_attrs("UPDATE orders SET total = 0"))
        .await;
    assert!(h.store.get(&cache_key).await.unwrap().is_none());
    assert!(h
        .store
        .get(&table_key("orders", &cache_key))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn ssl_request_without_database_passes_through_quietly() {
    let h = harness();
    let attrs = Attrs::from_value(json!({
        "client": {"remote": CLIENT},
        "sslRequest": true,
    }))
    .unwrap();
    let result = h.plugin.on_traffic_from_client(attrs.clone()).await;
    assert_eq!(result, attrs);
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn closing_the_channel_stops_the_worker_without_losing_messages() {
    let mut h = harness();
    h.plugin.on_traffic_from_client(handshake_attrs()).await;

    for table in ["a", "b", "c", "d", "e"] {
        let sql = format!("SELECT * FROM {table}");
        h.plugin
            .on_traffic_from_server(server_attrs(&sql, RESPONSE_B64))
            .await;
    }
    h.drain().await;

    // Session key + five responses + five table indexes
    assert_eq!(h.store.len(), 11);
}
