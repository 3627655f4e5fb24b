//! # Sync Configuration
//!
//! Configuration for the polling engine: which shops to watch, how to reach
//! the vending platform, and how often each pass runs.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     WASHWISE_SHOPS=S1,S2                                               │
//! │     WASHWISE_API_BASE_URL=https://userapi.qiekj.com                    │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     $WASHWISE_CONFIG, or                                               │
//! │     ~/.config/washwise/washwise.toml (Linux)                           │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! shops = [
//!     { id = "202401041041470000069996565184", name = "North Laundry" },
//!     "202401041041470000069996565185",
//! ]
//!
//! [api]
//! base_url = "https://userapi.qiekj.com"
//! request_timeout_secs = 10
//! machine_page_size = 1000
//!
//! [cron]
//! machine_types_interval_secs = 3600
//! machines_interval_secs = 600
//! machine_details_interval_secs = 60
//! ```
//!
//! The same file also carries the `[server]`, `[database]` and `[log]`
//! sections read by the server binary; this module ignores them.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{SyncError, SyncResult};

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "WASHWISE_CONFIG";

// =============================================================================
// Shops
// =============================================================================

/// A shop to watch.
///
/// Accepts either a bare id string or a table with a display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ShopEntry")]
pub struct ShopConfig {
    /// Platform shop id.
    pub id: String,

    /// Display name served by the HTTP facade. Empty when not configured.
    pub name: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ShopEntry {
    Id(String),
    Full {
        id: String,
        #[serde(default)]
        name: String,
    },
}

impl From<ShopEntry> for ShopConfig {
    fn from(entry: ShopEntry) -> Self {
        match entry {
            ShopEntry::Id(id) => ShopConfig {
                id,
                name: String::new(),
            },
            ShopEntry::Full { id, name } => ShopConfig { id, name },
        }
    }
}

impl ShopConfig {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        ShopConfig {
            id: id.into(),
            name: name.into(),
        }
    }
}

// =============================================================================
// Platform API Settings
// =============================================================================

/// How to reach the vending platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL; endpoint paths are appended to it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (seconds).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Page size for the machine listing. Only the first page is fetched.
    #[serde(default = "default_machine_page_size")]
    pub machine_page_size: u32,
}

fn default_base_url() -> String {
    "https://userapi.qiekj.com".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_machine_page_size() -> u32 {
    1000
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            machine_page_size: default_machine_page_size(),
        }
    }
}

impl ApiSettings {
    /// Request timeout as a Duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// =============================================================================
// Cadence Settings
// =============================================================================

/// Pass intervals (seconds). Expected order: types ≫ machines ≫ details.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CronSettings {
    #[serde(default = "default_types_interval")]
    pub machine_types_interval_secs: u64,

    #[serde(default = "default_machines_interval")]
    pub machines_interval_secs: u64,

    #[serde(default = "default_details_interval")]
    pub machine_details_interval_secs: u64,
}

fn default_types_interval() -> u64 {
    3600
}

fn default_machines_interval() -> u64 {
    600
}

fn default_details_interval() -> u64 {
    60
}

impl Default for CronSettings {
    fn default() -> Self {
        CronSettings {
            machine_types_interval_secs: default_types_interval(),
            machines_interval_secs: default_machines_interval(),
            machine_details_interval_secs: default_details_interval(),
        }
    }
}

impl CronSettings {
    pub fn machine_types_interval(&self) -> Duration {
        Duration::from_secs(self.machine_types_interval_secs)
    }

    pub fn machines_interval(&self) -> Duration {
        Duration::from_secs(self.machines_interval_secs)
    }

    pub fn machine_details_interval(&self) -> Duration {
        Duration::from_secs(self.machine_details_interval_secs)
    }
}

// =============================================================================
// Main Sync Configuration
// =============================================================================

/// Complete sync configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Shops to watch, in processing order.
    #[serde(default)]
    pub shops: Vec<ShopConfig>,

    /// Platform client settings.
    #[serde(default)]
    pub api: ApiSettings,

    /// Pass intervals.
    #[serde(default)]
    pub cron: CronSettings,
}

impl SyncConfig {
    /// Loads configuration from file and environment, then validates it.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = match config_path.or_else(Self::default_config_path) {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) => {
                debug!(?path, "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parses a config file without applying overrides or validation.
    pub fn from_file(path: &Path) -> SyncResult<Self> {
        info!(?path, "Loading sync config from file");
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses TOML text without applying overrides or validation.
    pub fn from_toml_str(contents: &str) -> SyncResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Validates the configuration.
    ///
    /// Fatal problems return an error; an unusual cadence only warns.
    pub fn validate(&self) -> SyncResult<()> {
        if self.shops.is_empty() {
            return Err(SyncError::InvalidConfig(
                "at least one shop must be configured".into(),
            ));
        }

        if let Some(shop) = self.shops.iter().find(|s| s.id.trim().is_empty()) {
            return Err(SyncError::InvalidConfig(format!(
                "shop id must not be empty (name: '{}')",
                shop.name
            )));
        }

        let url = Url::parse(&self.api.base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SyncError::InvalidUrl(format!(
                "base_url must be http or https, got: {}",
                self.api.base_url
            )));
        }

        if self.api.machine_page_size == 0 {
            return Err(SyncError::InvalidConfig(
                "machine_page_size must be greater than 0".into(),
            ));
        }

        if self.api.request_timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }

        let cron = &self.cron;
        for (name, secs) in [
            ("machine_types_interval_secs", cron.machine_types_interval_secs),
            ("machines_interval_secs", cron.machines_interval_secs),
            ("machine_details_interval_secs", cron.machine_details_interval_secs),
        ] {
            if secs == 0 {
                return Err(SyncError::InvalidConfig(format!(
                    "{name} must be greater than 0"
                )));
            }
        }

        if cron.machines_interval_secs < cron.machine_details_interval_secs {
            warn!(
                machines_interval_secs = cron.machines_interval_secs,
                machine_details_interval_secs = cron.machine_details_interval_secs,
                "Machine list refreshes more often than machine details"
            );
        }

        Ok(())
    }

    /// Applies `WASHWISE_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from an arbitrary key lookup.
    ///
    /// Unparseable numeric values are logged and ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(shops) = lookup("WASHWISE_SHOPS") {
            debug!(shops = %shops, "Overriding shops from environment");
            self.shops = shops
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(|id| {
                    // keep configured display names for shops that stay
                    let name = self
                        .shops
                        .iter()
                        .find(|s| s.id == id)
                        .map(|s| s.name.clone())
                        .unwrap_or_default();
                    ShopConfig::new(id, name)
                })
                .collect();
        }

        if let Some(url) = lookup("WASHWISE_API_BASE_URL") {
            debug!(url = %url, "Overriding platform base URL from environment");
            self.api.base_url = url;
        }

        override_number(&lookup, "WASHWISE_API_TIMEOUT_SECS", &mut self.api.request_timeout_secs);
        override_number(&lookup, "WASHWISE_API_PAGE_SIZE", &mut self.api.machine_page_size);
        override_number(
            &lookup,
            "WASHWISE_TYPES_INTERVAL_SECS",
            &mut self.cron.machine_types_interval_secs,
        );
        override_number(
            &lookup,
            "WASHWISE_MACHINES_INTERVAL_SECS",
            &mut self.cron.machines_interval_secs,
        );
        override_number(
            &lookup,
            "WASHWISE_DETAILS_INTERVAL_SECS",
            &mut self.cron.machine_details_interval_secs,
        );
    }

    /// Returns the default config file path.
    ///
    /// `$WASHWISE_CONFIG` wins over the platform config directory.
    pub fn default_config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(path));
        }
        directories::ProjectDirs::from("com", "washwise", "washwise")
            .map(|dirs| dirs.config_dir().join("washwise.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Shop ids in processing order.
    pub fn shop_ids(&self) -> Vec<String> {
        self.shops.iter().map(|s| s.id.clone()).collect()
    }

    /// Configured display name of a shop, if any.
    pub fn shop_name(&self, shop_id: &str) -> Option<&str> {
        self.shops
            .iter()
            .find(|s| s.id == shop_id && !s.name.is_empty())
            .map(|s| s.name.as_str())
    }
}

fn override_number<F, T>(lookup: &F, key: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + std::fmt::Display,
{
    if let Some(raw) = lookup(key) {
        match raw.trim().parse::<T>() {
            Ok(value) => {
                debug!(key = key, value = %value, "Overriding setting from environment");
                *target = value;
            }
            Err(_) => warn!(key = key, value = %raw, "Ignoring unparseable environment override"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn valid() -> SyncConfig {
        SyncConfig {
            shops: vec![ShopConfig::new("S1", "North Laundry")],
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_full_file() {
        let config = SyncConfig::from_toml_str(
            r#"
            shops = [
                { id = "S1", name = "North Laundry" },
                "S2",
            ]

            [api]
            base_url = "http://127.0.0.1:9000"
            machine_page_size = 50

            [cron]
            machine_types_interval_secs = 7200
            machines_interval_secs = 900
            machine_details_interval_secs = 30

            [server]
            port = 8080
            "#,
        )
        .unwrap();

        assert_eq!(config.shops.len(), 2);
        assert_eq!(config.shops[0], ShopConfig::new("S1", "North Laundry"));
        assert_eq!(config.shops[1], ShopConfig::new("S2", ""));
        assert_eq!(config.api.base_url, "http://127.0.0.1:9000");
        assert_eq!(config.api.machine_page_size, 50);
        assert_eq!(config.api.request_timeout_secs, 10);
        assert_eq!(config.cron.machine_details_interval(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config = SyncConfig::from_toml_str(r#"shops = ["S1"]"#).unwrap();
        assert_eq!(config.api.machine_page_size, 1000);
        assert_eq!(config.cron, CronSettings::default());
        assert_eq!(config.api.base_url, "https://userapi.qiekj.com");
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(valid().validate().is_ok());

        let mut config = valid();
        config.shops.clear();
        assert!(config.validate().unwrap_err().is_config_error());

        let mut config = valid();
        config.cron.machines_interval_secs = 0;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.api.base_url = "not a url".into();
        assert!(matches!(config.validate(), Err(SyncError::InvalidUrl(_))));

        let mut config = valid();
        config.api.base_url = "ftp://example.com".into();
        assert!(matches!(config.validate(), Err(SyncError::InvalidUrl(_))));

        let mut config = valid();
        config.api.machine_page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inverted_cadence_only_warns() {
        let mut config = valid();
        config.cron.machines_interval_secs = 10;
        config.cron.machine_details_interval_secs = 60;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("WASHWISE_SHOPS", "S1, S3"),
            ("WASHWISE_API_BASE_URL", "http://localhost:1234"),
            ("WASHWISE_DETAILS_INTERVAL_SECS", "15"),
            ("WASHWISE_MACHINES_INTERVAL_SECS", "soon"),
        ]
        .into_iter()
        .collect();

        let mut config = valid();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(
            config.shops,
            vec![ShopConfig::new("S1", "North Laundry"), ShopConfig::new("S3", "")]
        );
        assert_eq!(config.api.base_url, "http://localhost:1234");
        assert_eq!(config.cron.machine_details_interval_secs, 15);
        // unparseable value leaves the default in place
        assert_eq!(config.cron.machines_interval_secs, 600);
    }

    #[test]
    fn test_shop_name_lookup() {
        let config = SyncConfig {
            shops: vec![ShopConfig::new("S1", "North Laundry"), ShopConfig::new("S2", "")],
            ..Default::default()
        };
        assert_eq!(config.shop_name("S1"), Some("North Laundry"));
        assert_eq!(config.shop_name("S2"), None);
        assert_eq!(config.shop_name("S9"), None);
        assert_eq!(config.shop_ids(), vec!["S1".to_string(), "S2".to_string()]);
    }
}
