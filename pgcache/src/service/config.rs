//! Service configuration assembled from the config file.

use crate::config::ConfigFile;
use std::time::Duration;

/// Everything `PgCacheService::start` needs, in one immutable struct.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Store connection URL
    pub store_url: String,
    /// TTL on response and index keys
    pub expiry: Duration,
    /// Fallback database when the handshake names none
    pub default_db_name: String,
    /// SCAN batch size
    pub scan_count: u64,
    /// Ingest channel capacity
    pub buffer_size: usize,
    /// Sweeper schedule
    pub sweeper: SweeperConfig,
    /// Host admin API address
    pub api_address: String,
    /// Fail startup instead of degrading on store/API errors
    pub exit_on_startup_error: bool,
}

/// Sweeper schedule.
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    pub enabled: bool,
    pub start_delay: Duration,
    pub interval: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::from(&ConfigFile::default())
    }
}

impl From<&ConfigFile> for ServiceConfig {
    fn from(file: &ConfigFile) -> Self {
        Self {
            store_url: file.store.url.clone(),
            expiry: file.cache.expiry,
            default_db_name: file.cache.default_db_name.clone(),
            scan_count: file.store.scan_count,
            buffer_size: file.cache.buffer_size,
            sweeper: SweeperConfig {
                enabled: file.sweeper.enabled,
                start_delay: file.sweeper.start_delay,
                interval: file.sweeper.interval,
            },
            api_address: file.api.address.clone(),
            exit_on_startup_error: file.service.exit_on_startup_error,
        }
    }
}
