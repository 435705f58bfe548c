//! High-level service facade.
//!
//! Wires the shared store handle, the hook surface, the ingest worker,
//! and the sweeper together, and owns their lifecycle: `start` brings
//! everything up according to the startup-error policy, `shutdown`
//! closes the ingest channel, waits for the worker to drain, and stops
//! the sweeper.

mod config;

pub use config::{ServiceConfig, SweeperConfig};

use crate::ingest::{CacheWriter, IngestWorker};
use crate::invalidate::Invalidator;
use crate::metrics::{CacheMetrics, MetricsSnapshot};
use crate::plugin::Plugin;
use crate::session::SessionResolver;
use crate::store::{NoOpStore, RedisStore, Store, StoreError};
use crate::sweep::{HttpInventoryApi, InventoryError, Sweeper};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Service lifecycle errors.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The backing store was unreachable at startup
    #[error("store unavailable at startup: {0}")]
    Store(#[from] StoreError),

    /// The admin API address was rejected at startup
    #[error("admin API unusable at startup: {0}")]
    Inventory(#[from] InventoryError),
}

/// Running cache service.
///
/// Holds the spawned background tasks; dropping without calling
/// [`PgCacheService::shutdown`] aborts them without draining.
pub struct PgCacheService {
    plugin: Arc<Plugin>,
    writer: CacheWriter,
    worker: JoinHandle<()>,
    sweeper: Option<JoinHandle<()>>,
    shutdown: CancellationToken,
    metrics: Arc<CacheMetrics>,
}

impl PgCacheService {
    /// Brings the service up.
    ///
    /// Startup-error policy: when the store ping or the admin API
    /// address fails and `exit_on_startup_error` is set, the error is
    /// returned (the caller exits 1). Otherwise the failing component
    /// is disabled — a no-op store turns every hook into pass-through,
    /// a bad API address just leaves the sweeper off — and startup
    /// continues.
    pub async fn start(config: ServiceConfig) -> Result<Self, ServiceError> {
        let metrics = Arc::new(CacheMetrics::new());

        let store = Self::connect_store(&config).await?;

        let inventory = if config.sweeper.enabled {
            match HttpInventoryApi::new(&config.api_address) {
                Ok(api) => Some(Arc::new(api)),
                Err(err) if config.exit_on_startup_error => return Err(err.into()),
                Err(err) => {
                    error!(%err, "admin API unusable; sweeper disabled");
                    None
                }
            }
        } else {
            None
        };

        let resolver = SessionResolver::new(
            store.clone(),
            config.default_db_name.clone(),
            metrics.clone(),
        );
        let invalidator = Invalidator::new(store.clone(), config.scan_count, metrics.clone());
        let (writer, ingest_worker) = IngestWorker::new(
            config.buffer_size,
            store.clone(),
            resolver.clone(),
            config.expiry,
            metrics.clone(),
        );
        let worker = tokio::spawn(ingest_worker.run());

        let shutdown = CancellationToken::new();
        let sweeper = inventory.map(|api| {
            let daemon = Sweeper::new(
                store.clone(),
                api,
                config.sweeper.start_delay,
                config.sweeper.interval,
                config.scan_count,
                metrics.clone(),
            );
            tokio::spawn(daemon.run(shutdown.clone()))
        });

        let plugin = Arc::new(Plugin::new(
            store,
            resolver,
            invalidator,
            writer.clone(),
            metrics.clone(),
        ));

        info!(expiry_secs = config.expiry.as_secs(), "cache service started");
        Ok(Self {
            plugin,
            writer,
            worker,
            sweeper,
            shutdown,
            metrics,
        })
    }

    /// Connects and pings the store, applying the startup-error policy.
    async fn connect_store(config: &ServiceConfig) -> Result<Arc<dyn Store>, ServiceError> {
        let outcome = match RedisStore::connect(&config.store_url).await {
            Ok(store) => store.ping().await.map(|()| store),
            Err(err) => Err(err),
        };
        match outcome {
            Ok(store) => Ok(Arc::new(store)),
            Err(err) if config.exit_on_startup_error => Err(err.into()),
            Err(err) => {
                error!(url = %config.store_url, %err, "store unreachable; caching disabled");
                Ok(Arc::new(NoOpStore::new()))
            }
        }
    }

    /// The hook surface to expose to the host.
    pub fn plugin(&self) -> Arc<Plugin> {
        Arc::clone(&self.plugin)
    }

    /// Point-in-time cache counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Stops the service: closes the ingest channel, waits for the
    /// worker to drain, and cancels the sweeper.
    pub async fn shutdown(self) {
        self.writer.close();
        self.shutdown.cancel();

        if let Err(err) = self.worker.await {
            warn!(%err, "ingest worker ended abnormally");
        }
        if let Some(sweeper) = self.sweeper {
            if let Err(err) = sweeper.await {
                warn!(%err, "sweeper ended abnormally");
            }
        }

        let snapshot = self.metrics.snapshot();
        info!(
            hits = snapshot.hits,
            misses = snapshot.misses,
            sets = snapshot.sets,
            deletes = snapshot.deletes,
            store_errors = snapshot.store_errors,
            "cache service stopped"
        );
    }
}
