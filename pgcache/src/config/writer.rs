//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! This module contains the `to_config_string()` function that produces
//! the commented INI representation written to `config.ini`.

use super::duration::format_duration;
use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    format!(
        r#"[store]
; Key-value store connection URL
url = {}
; SCAN batch size used by invalidation and the sweeper
scan_count = {}

[cache]
; Time-to-live on cached responses and their table indexes
expiry = {}
; Fallback database when the client handshake names none (empty = off)
default_db_name = {}
; Ingest channel capacity; a full channel blocks the server hook
buffer_size = {}

[sweeper]
; Periodically remove session keys of disconnected clients
enabled = {}
; Delay before the first sweep
start_delay = {}
; Interval between sweeps
interval = {}

[api]
; Host admin API serving the proxy inventory
address = {}

[service]
; Exit with status 1 when the store or admin API is unreachable at
; startup; otherwise continue with the failing component disabled
exit_on_startup_error = {}
"#,
        config.store.url,
        config.store.scan_count,
        format_duration(config.cache.expiry),
        config.cache.default_db_name,
        config.cache.buffer_size,
        config.sweeper.enabled,
        format_duration(config.sweeper.start_delay),
        format_duration(config.sweeper.interval),
        config.api.address,
        config.service.exit_on_startup_error,
    )
}
