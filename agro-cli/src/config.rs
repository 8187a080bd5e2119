//! `agrocalc.toml`: which store to open, whose reports to work with, and
//! how much to log.
//!
//! ```toml
//! owner_id = "produtor-01"
//!
//! [database]
//! backend = "sqlite"
//! connection_string = "agrocalc.db"
//!
//! [logging]
//! level = "info"
//! file = "agrocalc.log"
//! ```
//!
//! Every key is optional.

use std::io;
use std::path::{Path, PathBuf};

use agro_core::DbConfig;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "agrocalc.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Owner used when no `--owner` is given.
    pub owner_id: Option<String>,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
}

/// Either key may be left out; the backend registry supplies the default
/// backend (`sqlite`) and that backend's default location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub backend: Option<String>,
    pub connection_string: Option<String>,
}

impl From<&DatabaseConfig> for DbConfig {
    fn from(db: &DatabaseConfig) -> Self {
        DbConfig::new(
            db.backend.clone().unwrap_or_default(),
            db.connection_string.clone().unwrap_or_default(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Bare level or full filter directive.
    pub level: String,
    /// Append log records to this file as well.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl AppConfig {
    pub fn from_toml(
        text: &str,
        path: &Path,
    ) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads the config at `path`, or `agrocalc.toml` in the working directory
    /// when no path is given. Only the default file may be missing, in which
    /// case every setting takes its default.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        match std::fs::read_to_string(&path) {
            Ok(text) => {
                let config = Self::from_toml(&text, &path)?;
                tracing::debug!(path = %path.display(), "config loaded");
                Ok(config)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound && !explicit => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read { path, source }),
        }
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::from(&self.database)
    }
}
