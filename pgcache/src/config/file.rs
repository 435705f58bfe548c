//! Loading and saving ~/.pgcache/config.ini.
//!
//! A missing file is not an error: defaults apply until the operator
//! writes one (`pgcache init`). Section/key mapping lives in
//! [`super::parser`], the commented output format in [`super::writer`].

use ini::Ini;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::settings::ConfigFile;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// The file or its directory could not be read or written
    #[error("config file I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The file is not well-formed INI
    #[error("config file is not valid INI: {0}")]
    Syntax(#[from] ini::ParseError),

    /// A key was recognized but its value did not parse
    #[error("bad config value {section}.{key} = '{value}': {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigFile {
    /// Loads ~/.pgcache/config.ini, or defaults when absent.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Loads a specific config file, or defaults when absent.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(err.into()),
        };
        let ini = Ini::load_from_str(&content)?;
        super::parser::parse_ini(&ini)
    }

    /// Writes this configuration to `path`, creating parent directories
    /// as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, super::writer::to_config_string(self))?;
        Ok(())
    }

    /// Writes the default config file unless one already exists, and
    /// returns its path.
    pub fn ensure_exists() -> Result<PathBuf, ConfigFileError> {
        let path = config_file_path();
        if !path.exists() {
            Self::default().save_to(&path)?;
        }
        Ok(path)
    }
}

/// The per-user config directory, ~/.pgcache.
pub fn config_directory() -> PathBuf {
    match dirs::home_dir() {
        Some(home) => home.join(".pgcache"),
        None => PathBuf::from(".pgcache"),
    }
}

/// The config file inside [`config_directory`].
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
