//! # Server Configuration
//!
//! One TOML file configures the whole process. The sync sections (`shops`,
//! `[api]`, `[cron]`) are parsed by [`SyncConfig`]; this module adds the
//! sections only the binary cares about.
//!
//! ```toml
//! shops = [{ id = "202401041041470000069996565184", name = "North Laundry" }]
//!
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//!
//! [database]
//! path = "/var/lib/washwise/washwise.db"
//! max_connections = 5
//!
//! [log]
//! level = "info"
//! ```
//!
//! ## Environment Overrides
//! - `WASHWISE_HOST`, `WASHWISE_PORT`
//! - `WASHWISE_DATABASE_PATH`, `WASHWISE_DATABASE_MAX_CONNECTIONS`
//! - `WASHWISE_LOG_LEVEL`
//! - plus every `WASHWISE_*` key understood by [`SyncConfig`]

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use washwise_sync::{SyncConfig, SyncResult};

// =============================================================================
// Sections
// =============================================================================

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    /// `host:port` for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// SQLite file location and pool size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

/// Platform data directory, or the working directory if there is none.
///
/// - **Linux**: `~/.local/share/washwise/washwise.db`
/// - **macOS**: `~/Library/Application Support/com.washwise.washwise/washwise.db`
fn default_database_path() -> PathBuf {
    directories::ProjectDirs::from("com", "washwise", "washwise")
        .map(|dirs| dirs.data_dir().join("washwise.db"))
        .unwrap_or_else(|| PathBuf::from("washwise.db"))
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Log filter used when `RUST_LOG` is unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogSettings {
    fn default() -> Self {
        LogSettings {
            level: default_log_level(),
        }
    }
}

// =============================================================================
// Whole File
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(flatten)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub log: LogSettings,
}

impl AppConfig {
    /// Reads the file (if any), applies environment overrides and validates.
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = match config_path.or_else(SyncConfig::default_config_path) {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) => {
                warn!(?path, "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.sync.validate()?;

        Ok(config)
    }

    pub fn from_file(path: &Path) -> SyncResult<Self> {
        info!(?path, "Loading config file");
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> SyncResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Applies overrides from a key lookup, sync keys included.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        self.sync.apply_overrides(&lookup);

        if let Some(host) = lookup("WASHWISE_HOST") {
            debug!(host = %host, "Overriding listen host from environment");
            self.server.host = host;
        }

        if let Some(raw) = lookup("WASHWISE_PORT") {
            match raw.trim().parse() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!(value = %raw, "Ignoring unparseable WASHWISE_PORT"),
            }
        }

        if let Some(path) = lookup("WASHWISE_DATABASE_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(raw) = lookup("WASHWISE_DATABASE_MAX_CONNECTIONS") {
            match raw.trim().parse() {
                Ok(max) => self.database.max_connections = max,
                Err(_) => warn!(value = %raw, "Ignoring unparseable WASHWISE_DATABASE_MAX_CONNECTIONS"),
            }
        }

        if let Some(level) = lookup("WASHWISE_LOG_LEVEL") {
            self.log.level = level;
        }
    }
}
