//! Configuration for the cache service.
//!
//! Settings load once at startup from `~/.pgcache/config.ini` into an
//! immutable [`ConfigFile`] and are never reread. Settings structs live
//! in [`settings`], constants in [`defaults`], INI parsing in
//! [`parser`], serialization in [`writer`], and duration strings
//! (`30s`, `5m`, `1h`) in [`duration`].

mod defaults;
mod duration;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::{
    DEFAULT_API_ADDRESS, DEFAULT_BUFFER_SIZE, DEFAULT_EXPIRY, DEFAULT_SCAN_COUNT,
    DEFAULT_STORE_URL, DEFAULT_SWEEP_INTERVAL, DEFAULT_SWEEP_START_DELAY,
};
pub use duration::{format_duration, parse_duration, DurationParseError};
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    ApiSettings, CacheSettings, ConfigFile, ServiceSettings, StoreSettings, SweeperSettings,
};
