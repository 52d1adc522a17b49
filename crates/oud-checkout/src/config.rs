//! # Terminal Configuration
//!
//! Configuration for one checkout terminal.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     OUD_BACKEND_URL=https://sales.example.ae/api                       │
//! │     OUD_SUBMIT_TIMEOUT_SECS=20                                         │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/oud-pos/pos.toml (Linux)                                 │
//! │     ~/Library/Application Support/ae.oud.pos/pos.toml (macOS)          │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # pos.toml
//! [store]
//! name = "Oud Al Khaleej - Deira"
//! address_lines = ["Al Rigga Road", "Dubai, UAE"]
//! phone = "+971 4 000 0000"
//! tax_registration_number = "100000000000003"
//!
//! [backend]
//! base_url = "https://sales.example.ae/api"
//! submit_timeout_secs = 30
//! request_timeout_secs = 10
//!
//! [receipts]
//! database_path = "/var/lib/oud-pos/receipts.db"
//!
//! [logging]
//! filter = "info,oud=debug,sqlx=warn"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::telemetry::DEFAULT_FILTER;

/// File name of the terminal config inside the platform config dir.
pub const CONFIG_FILE_NAME: &str = "pos.toml";

/// File name of the receipt database inside the platform data dir.
pub const RECEIPT_DB_FILE_NAME: &str = "receipts.db";

// =============================================================================
// Store
// =============================================================================

/// Store metadata printed on receipts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_name")]
    pub name: String,

    #[serde(default)]
    pub address_lines: Vec<String>,

    #[serde(default)]
    pub phone: Option<String>,

    /// UAE VAT TRN.
    #[serde(default)]
    pub tax_registration_number: Option<String>,
}

fn default_store_name() -> String {
    "Oud POS".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            name: default_store_name(),
            address_lines: Vec::new(),
            phone: None,
            tax_registration_number: None,
        }
    }
}

// =============================================================================
// Backend
// =============================================================================

/// Sales backend connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL; `/products`, `/customers` and `/sales/transaction` are
    /// appended to it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Upper bound on a whole transaction submission (seconds).
    #[serde(default = "default_submit_timeout")]
    pub submit_timeout_secs: u64,

    /// HTTP timeout for each catalog read (seconds). The sale POST is
    /// bounded by `submit_timeout_secs` instead.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_submit_timeout() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    10
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig {
            base_url: default_base_url(),
            submit_timeout_secs: default_submit_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

// =============================================================================
// Receipts / Logging
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptsConfig {
    /// Receipt database file. Platform data dir when unset.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive string. `RUST_LOG` still wins.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    DEFAULT_FILTER.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            filter: default_log_filter(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete terminal configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosConfig {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub receipts: ReceiptsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PosConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`config_path`, else `pos.toml` in the platform dir)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading terminal config from file");
                config = Self::from_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns defaults if loading fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load terminal config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Parses a TOML file without env overrides or validation.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        let url = self.backend.base_url.trim();
        if url.is_empty() {
            return Err(ConfigError::Invalid("backend.base_url must not be empty".into()));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "backend.base_url must start with http:// or https://, got: {}",
                url
            )));
        }

        if self.backend.submit_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "backend.submit_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.backend.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "backend.request_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.store.name.trim().is_empty() {
            return Err(ConfigError::Invalid("store.name must not be empty".into()));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `OUD_*` overrides read through `lookup`.
    ///
    /// Unparseable numeric values are ignored with a warning.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(name) = lookup("OUD_STORE_NAME") {
            self.store.name = name;
        }

        if let Some(url) = lookup("OUD_BACKEND_URL") {
            debug!(url = %url, "Overriding backend URL from environment");
            self.backend.base_url = url;
        }

        if let Some(secs) = lookup("OUD_SUBMIT_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(secs) => self.backend.submit_timeout_secs = secs,
                Err(_) => warn!(value = %secs, "Ignoring invalid OUD_SUBMIT_TIMEOUT_SECS"),
            }
        }

        if let Some(path) = lookup("OUD_RECEIPT_DB_PATH") {
            self.receipts.database_path = Some(PathBuf::from(path));
        }

        if let Some(filter) = lookup("OUD_LOG") {
            self.logging.filter = filter;
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("ae", "oud", "pos")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn submit_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.submit_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.request_timeout_secs)
    }

    /// Configured receipt database path, else the platform data dir,
    /// else the working directory.
    pub fn receipt_database_path(&self) -> PathBuf {
        if let Some(path) = &self.receipts.database_path {
            return path.clone();
        }
        directories::ProjectDirs::from("ae", "oud", "pos")
            .map(|dirs| dirs.data_dir().join(RECEIPT_DB_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(RECEIPT_DB_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = PosConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.backend.submit_timeout_secs, 30);
        assert_eq!(config.logging.filter, DEFAULT_FILTER);
        assert_eq!(config.submit_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_config_validation() {
        let mut config = PosConfig::default();

        config.backend.base_url = "  ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config.backend.base_url = "ftp://sales".to_string();
        assert!(config.validate().is_err());

        config.backend.base_url = "https://sales.example.ae".to_string();
        config.backend.submit_timeout_secs = 0;
        assert!(config.validate().is_err());

        config.backend.submit_timeout_secs = 5;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            [store]
            name = "Deira Branch"
            address_lines = ["Al Rigga Road", "Dubai"]
            tax_registration_number = "100000000000003"

            [backend]
            base_url = "https://sales.example.ae/api"
            submit_timeout_secs = 12
            "#
        )
        .unwrap();

        let config = PosConfig::from_file(file.path()).unwrap();

        assert_eq!(config.store.name, "Deira Branch");
        assert_eq!(config.store.address_lines.len(), 2);
        assert_eq!(config.backend.submit_timeout_secs, 12);
        // Unset keys keep their defaults
        assert_eq!(config.backend.request_timeout_secs, 10);
        assert!(config.receipts.database_path.is_none());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = PosConfig::load_or_default(Some(dir.path().join("absent.toml")));
        assert_eq!(config.store.name, "Oud POS");
    }

    #[test]
    fn test_bad_toml_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[backend\nbase_url = ").unwrap();

        assert!(matches!(
            PosConfig::from_file(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("OUD_STORE_NAME", "Mall Kiosk"),
            ("OUD_BACKEND_URL", "https://override.example.ae"),
            ("OUD_SUBMIT_TIMEOUT_SECS", "not-a-number"),
            ("OUD_RECEIPT_DB_PATH", "/tmp/r.db"),
        ]
        .into_iter()
        .collect();

        let mut config = PosConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.store.name, "Mall Kiosk");
        assert_eq!(config.backend.base_url, "https://override.example.ae");
        assert_eq!(config.backend.submit_timeout_secs, 30);
        assert_eq!(config.receipt_database_path(), PathBuf::from("/tmp/r.db"));
    }

    #[test]
    fn test_toml_serialization() {
        let toml_str = toml::to_string_pretty(&PosConfig::default()).unwrap();
        assert!(toml_str.contains("[store]"));
        assert!(toml_str.contains("[backend]"));
    }
}
