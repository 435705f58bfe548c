//! Default configuration values.

use std::time::Duration;

/// Default store connection string.
pub const DEFAULT_STORE_URL: &str = "redis://localhost:6379";

/// Default SCAN batch size for invalidation and sweeping.
pub const DEFAULT_SCAN_COUNT: u64 = 1000;

/// Default TTL on response and index keys.
pub const DEFAULT_EXPIRY: Duration = Duration::from_secs(60 * 60);

/// Default ingest channel capacity.
pub const DEFAULT_BUFFER_SIZE: usize = 100;

/// Default delay before the sweeper's first pass.
pub const DEFAULT_SWEEP_START_DELAY: Duration = Duration::from_secs(60);

/// Default interval between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Default host admin API address.
pub const DEFAULT_API_ADDRESS: &str = "http://localhost:18080";
