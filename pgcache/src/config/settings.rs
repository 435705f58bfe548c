//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use super::defaults::*;
use std::time::Duration;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    /// Backing store settings
    pub store: StoreSettings,
    /// Cache behavior settings
    pub cache: CacheSettings,
    /// Stale-session sweeper settings
    pub sweeper: SweeperSettings,
    /// Host admin API settings
    pub api: ApiSettings,
    /// Service lifecycle settings
    pub service: ServiceSettings,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            store: StoreSettings::default(),
            cache: CacheSettings::default(),
            sweeper: SweeperSettings::default(),
            api: ApiSettings::default(),
            service: ServiceSettings::default(),
        }
    }
}

/// Backing store configuration.
#[derive(Debug, Clone)]
pub struct StoreSettings {
    /// Store connection URL (`redis://...`)
    pub url: String,
    /// SCAN batch size for invalidation and sweeping
    pub scan_count: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_STORE_URL.to_string(),
            scan_count: DEFAULT_SCAN_COUNT,
        }
    }
}

/// Cache behavior configuration.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// TTL applied to response and index keys
    pub expiry: Duration,
    /// Fallback database when the handshake names none
    pub default_db_name: String,
    /// Ingest channel capacity; a full channel blocks the server hook
    pub buffer_size: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            expiry: DEFAULT_EXPIRY,
            default_db_name: String::new(),
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

/// Stale-session sweeper configuration.
#[derive(Debug, Clone)]
pub struct SweeperSettings {
    /// Whether the sweeper runs at all
    pub enabled: bool,
    /// Delay before the first sweep
    pub start_delay: Duration,
    /// Interval between sweeps; an overrunning sweep skips ticks
    pub interval: Duration,
}

impl Default for SweeperSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            start_delay: DEFAULT_SWEEP_START_DELAY,
            interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

/// Host admin API configuration.
#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// Admin API address serving the proxy inventory
    pub address: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            address: DEFAULT_API_ADDRESS.to_string(),
        }
    }
}

/// Service lifecycle configuration.
#[derive(Debug, Clone, Default)]
pub struct ServiceSettings {
    /// Exit with status 1 on store-ping or API failures at startup;
    /// otherwise continue with the failing component disabled
    pub exit_on_startup_error: bool,
}
