//! Session tracking.
//!
//! A client announces its target database exactly once, in the startup
//! packet. The resolver persists that `remote address → database`
//! binding in the store (no expiry) and serves it back for every later
//! message of the session, so both hooks can compose cache keys without
//! re-seeing the handshake.

use crate::attrs::Attrs;
use crate::metrics::CacheMetrics;
use crate::store::Store;
use crate::wire::StartupPacket;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Resolves the database a message belongs to.
#[derive(Clone)]
pub struct SessionResolver {
    store: Arc<dyn Store>,
    default_db: String,
    metrics: Arc<CacheMetrics>,
}

impl SessionResolver {
    /// Creates a resolver over the shared store handle.
    pub fn new(store: Arc<dyn Store>, default_db: String, metrics: Arc<CacheMetrics>) -> Self {
        Self {
            store,
            default_db,
            metrics,
        }
    }

    /// Produces the database for this message, or `None`.
    ///
    /// Order: the configured default database wins without touching the
    /// store; otherwise a present startup packet binds and returns its
    /// `database` parameter; otherwise the stored session binding is
    /// looked up. Store errors never fail the call.
    pub async fn resolve(&self, attrs: &Attrs) -> Option<String> {
        if !self.default_db.is_empty() {
            return Some(self.default_db.clone());
        }

        let client_remote = attrs.nested_str("client", "remote");

        if let Some(database) = self.database_from_startup(attrs, client_remote).await {
            return Some(database);
        }

        if client_remote.is_empty() {
            return None;
        }
        match self.store.get(client_remote).await {
            Ok(Some(database)) if !database.is_empty() => {
                self.metrics.record_get();
                trace!(client = client_remote, database, "session binding found");
                Some(database)
            }
            Ok(_) => {
                self.metrics.record_get();
                self.metrics.record_miss();
                None
            }
            Err(error) => {
                self.metrics.record_store_error();
                debug!(client = client_remote, %error, "failed to read session binding");
                None
            }
        }
    }

    /// Extracts the database from a present startup packet and persists
    /// the session binding.
    async fn database_from_startup(&self, attrs: &Attrs, client_remote: &str) -> Option<String> {
        let encoded = attrs.str("startupMessage");
        if encoded.is_empty() {
            return None;
        }

        let bytes = match BASE64.decode(encoded) {
            Ok(bytes) => bytes,
            Err(error) => {
                debug!(%error, "failed to decode startup message");
                return None;
            }
        };
        let packet = match StartupPacket::parse(&bytes) {
            Ok(packet) => packet,
            Err(error) => {
                debug!(%error, "failed to parse startup message");
                return None;
            }
        };

        let database = packet.database()?;
        if client_remote.is_empty() {
            return None;
        }

        // Session keys carry no expiry; the close hook or the sweeper
        // removes them.
        match self
            .store
            .set(client_remote, database, Duration::ZERO)
            .await
        {
            Ok(()) => {
                self.metrics.record_set();
                debug!(client = client_remote, database, "session binding stored");
            }
            Err(error) => {
                self.metrics.record_store_error();
                debug!(client = client_remote, %error, "failed to store session binding");
            }
        }
        Some(database.to_string())
    }
}

/// True when the message is a recognized pre-authentication packet that
/// legitimately carries no database.
pub fn is_database_optional(attrs: &Attrs) -> bool {
    attrs.contains("sslRequest")
        || attrs.contains("saslInitialResponse")
        || attrs.contains("cancelRequest")
}
