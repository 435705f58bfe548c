//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This module contains the `parse_ini()` function and its helpers.
//! It is the single place where INI key names are mapped to struct fields.

use ini::Ini;

use super::duration::parse_duration;
use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [store] section
    if let Some(section) = ini.section(Some("store")) {
        if let Some(v) = section.get("url") {
            let v = v.trim();
            if !v.is_empty() {
                config.store.url = v.to_string();
            }
        }
        if let Some(v) = section.get("scan_count") {
            config.store.scan_count = parse_positive(v, "store", "scan_count")?;
        }
    }

    // [cache] section
    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = section.get("expiry") {
            config.cache.expiry = parse_duration_value(v, "cache", "expiry")?;
        }
        if let Some(v) = section.get("default_db_name") {
            config.cache.default_db_name = v.trim().to_string();
        }
        if let Some(v) = section.get("buffer_size") {
            config.cache.buffer_size = parse_positive(v, "cache", "buffer_size")? as usize;
        }
    }

    // [sweeper] section
    if let Some(section) = ini.section(Some("sweeper")) {
        if let Some(v) = section.get("enabled") {
            config.sweeper.enabled = parse_bool(v, "sweeper", "enabled")?;
        }
        if let Some(v) = section.get("start_delay") {
            config.sweeper.start_delay = parse_duration_value(v, "sweeper", "start_delay")?;
        }
        if let Some(v) = section.get("interval") {
            config.sweeper.interval = parse_duration_value(v, "sweeper", "interval")?;
        }
    }

    // [api] section
    if let Some(section) = ini.section(Some("api")) {
        if let Some(v) = section.get("address") {
            let v = v.trim();
            if !v.is_empty() {
                config.api.address = v.to_string();
            }
        }
    }

    // [service] section
    if let Some(section) = ini.section(Some("service")) {
        if let Some(v) = section.get("exit_on_startup_error") {
            config.service.exit_on_startup_error =
                parse_bool(v, "service", "exit_on_startup_error")?;
        }
    }

    Ok(config)
}

fn parse_positive(value: &str, section: &str, key: &str) -> Result<u64, ConfigFileError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigFileError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected a positive integer".to_string(),
        }),
    }
}

fn parse_bool(value: &str, section: &str, key: &str) -> Result<bool, ConfigFileError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(ConfigFileError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

fn parse_duration_value(
    value: &str,
    section: &str,
    key: &str,
) -> Result<std::time::Duration, ConfigFileError> {
    parse_duration(value).map_err(|_| ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: "expected format like '30s', '5m', or '1h'".to_string(),
    })
}
