//! # Ledger Configuration
//!
//! Configuration for the database and the inventory engine.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     STOCKBOOK_DB_PATH=/srv/stockbook/stockbook.db                      │
//! │     STOCKBOOK_APPROVAL_THRESHOLD=500                                   │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/stockbook/stockbook.toml (Linux)                         │
//! │     ~/Library/Application Support/com.stockbook.stockbook/... (macOS)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "stockbook.db"
//! max_connections = 5
//!
//! [ledger]
//! approval_threshold = 1000   # omit to disable
//! lock_timeout_ms = 2000
//!
//! [catalog]
//! default_page_size = 50
//! max_page_size = 200
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::pool::DbConfig;
use stockbook_core::{DEFAULT_APPROVAL_THRESHOLD, MAX_QUANTITY};

const CONFIG_FILE_NAME: &str = "stockbook.toml";

// =============================================================================
// Errors
// =============================================================================

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidValue(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Database Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Path to the SQLite file. `":memory:"` opens a private in-memory store.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("stockbook.db")
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

// =============================================================================
// Ledger Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSettings {
    /// OUT/ADJ quantities at or above this need the admin role.
    /// `None` disables the rule.
    #[serde(default = "default_approval_threshold")]
    pub approval_threshold: Option<i64>,

    /// How long a writer waits for the per-product lock before giving up
    /// with a conflict.
    #[serde(default = "default_lock_timeout")]
    pub lock_timeout_ms: u64,
}

fn default_approval_threshold() -> Option<i64> {
    Some(DEFAULT_APPROVAL_THRESHOLD)
}

fn default_lock_timeout() -> u64 {
    2000
}

impl Default for LedgerSettings {
    fn default() -> Self {
        LedgerSettings {
            approval_threshold: default_approval_threshold(),
            lock_timeout_ms: default_lock_timeout(),
        }
    }
}

impl LedgerSettings {
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

// =============================================================================
// Catalog Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSettings {
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

fn default_page_size() -> u32 {
    50
}

fn default_max_page_size() -> u32 {
    200
}

impl Default for CatalogSettings {
    fn default() -> Self {
        CatalogSettings {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete Stockbook configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub ledger: LedgerSettings,

    #[serde(default)]
    pub catalog: CatalogSettings,
}

impl LedgerConfig {
    /// Defaults backed by an in-memory database. Used by tests.
    pub fn in_memory() -> Self {
        LedgerConfig {
            database: DatabaseSettings {
                path: PathBuf::from(":memory:"),
                max_connections: 1,
            },
            ..Default::default()
        }
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`stockbook.toml`)
    /// 3. Environment variables
    pub fn load(config_path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = Self::default();

        let path = config_path
            .map(Path::to_path_buf)
            .or_else(Self::default_config_path);

        if let Some(path) = path {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else if config_path.is_some() {
                // An explicitly named file must exist.
                return Err(ConfigError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{} not found", path.display()),
                )));
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML document on its own, without file or environment.
    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if let Some(threshold) = self.ledger.approval_threshold {
            if !(1..=MAX_QUANTITY).contains(&threshold) {
                return Err(ConfigError::InvalidValue(format!(
                    "ledger.approval_threshold must be between 1 and {MAX_QUANTITY}, got {threshold}"
                )));
            }
        }

        if self.ledger.lock_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "ledger.lock_timeout_ms must be greater than 0".into(),
            ));
        }

        let catalog = &self.catalog;
        if catalog.default_page_size == 0 || catalog.default_page_size > catalog.max_page_size {
            return Err(ConfigError::InvalidValue(format!(
                "catalog.default_page_size must be between 1 and max_page_size ({})",
                catalog.max_page_size
            )));
        }

        Ok(())
    }

    /// Pool settings derived from the `[database]` section.
    pub fn db_config(&self) -> DbConfig {
        let path = &self.database.path;
        if path.as_os_str() == ":memory:" {
            // Every connection would otherwise see its own empty database
            return DbConfig::in_memory();
        }
        DbConfig::new(path).max_connections(self.database.max_connections)
    }

    fn apply_env_overrides(&mut self) -> ConfigResult<()> {
        if let Ok(path) = std::env::var("STOCKBOOK_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Ok(value) = std::env::var("STOCKBOOK_MAX_CONNECTIONS") {
            self.database.max_connections = parse_env("STOCKBOOK_MAX_CONNECTIONS", &value)?;
        }

        if let Ok(value) = std::env::var("STOCKBOOK_APPROVAL_THRESHOLD") {
            // "off" or an empty value disables the rule
            self.ledger.approval_threshold = match value.trim() {
                "" | "off" | "none" => None,
                v => Some(parse_env("STOCKBOOK_APPROVAL_THRESHOLD", v)?),
            };
            debug!(threshold = ?self.ledger.approval_threshold, "Overriding approval threshold from environment");
        }

        if let Ok(value) = std::env::var("STOCKBOOK_LOCK_TIMEOUT_MS") {
            self.ledger.lock_timeout_ms = parse_env("STOCKBOOK_LOCK_TIMEOUT_MS", &value)?;
        }

        Ok(())
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "stockbook", "stockbook")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> ConfigResult<T> {
    value.trim().parse().map_err(|_| {
        warn!(variable = name, value, "Unparseable environment override");
        ConfigError::InvalidValue(format!("{name} has an invalid value: '{value}'"))
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
