//! pgcache - Transparent result cache for PostgreSQL wire-protocol proxies
//!
//! This library memoizes the serialized results of read queries flowing
//! through a proxy, keyed by `(backend address, database, request
//! bytes)`, and returns the cached bytes directly to the client when the
//! same request reappears. Writes invalidate every cached result that
//! names a touched table.
//!
//! # High-Level API
//!
//! The [`service`] module provides the facade that owns the store
//! handle and the background tasks:
//!
//! ```ignore
//! use pgcache::config::ConfigFile;
//! use pgcache::service::{PgCacheService, ServiceConfig};
//!
//! let config = ServiceConfig::from(&ConfigFile::load()?);
//! let service = PgCacheService::start(config).await?;
//!
//! // Hand hook calls from the proxy host to the plugin
//! let plugin = service.plugin();
//! let reply = plugin.on_traffic_from_client(attrs).await;
//! ```

pub mod attrs;
pub mod config;
pub mod ingest;
pub mod invalidate;
pub mod logging;
pub mod metrics;
pub mod plugin;
pub mod service;
pub mod session;
pub mod sql;
pub mod store;
pub mod sweep;
pub mod wire;

/// Version of the pgcache library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
