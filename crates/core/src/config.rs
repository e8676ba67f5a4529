//! Configuration management
//!
//! This module handles loading, saving, and migrating the ufs configuration file.
//! The configuration file is stored in TOML format at ~/.config/ufs/config.toml,
//! or under `$UFS_CONFIG_DIR` when that variable is set.
//!
//! PROTECTED FILE: Changes to schema_version require migration support.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::path::Protocol;

/// Current configuration schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "UFS_CONFIG_DIR";

/// Maximum number of keys accepted by one bulk-delete request
pub const MAX_DELETE_BATCH: usize = 1000;

/// Default output format
const DEFAULT_OUTPUT: &str = "human";

/// Default color setting
const DEFAULT_COLOR: &str = "auto";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Schema version for migration support
    pub schema_version: u32,

    /// Default settings
    #[serde(default)]
    pub defaults: Defaults,

    /// Storage engine settings
    #[serde(default)]
    pub storage: StorageSettings,

    /// Object-store connection settings
    #[serde(default)]
    pub s3: S3Settings,
}

/// Default settings for CLI behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    /// Output format: "human" or "json"
    #[serde(default = "default_output")]
    pub output: String,

    /// Color mode: "auto", "always", or "never"
    #[serde(default = "default_color")]
    pub color: String,

    /// Show progress bars
    #[serde(default = "default_true")]
    pub progress: bool,
}

/// Settings for the entity model and transfer engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Canonical scheme for object-store paths
    #[serde(default)]
    pub protocol: Protocol,

    /// Report object-store directories as always existing
    #[serde(default = "default_true")]
    pub keep_directories_logical: bool,

    /// Maximum concurrent transfers or delete batches
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Keys per bulk-delete request
    #[serde(default = "default_delete_batch_size")]
    pub delete_batch_size: usize,

    /// Keys requested per list page
    #[serde(default = "default_list_page_size")]
    pub list_page_size: i32,

    /// Parent directory for staging areas (system temp dir when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staging_dir: Option<PathBuf>,
}

/// Connection settings for the S3 client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Settings {
    /// Custom endpoint URL (S3-compatible services)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// AWS region
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Access key ID (default provider chain when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,

    /// Secret access key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,

    /// Bucket lookup style: "auto", "path", or "dns"
    #[serde(default = "default_bucket_lookup")]
    pub bucket_lookup: String,
}

fn default_output() -> String {
    DEFAULT_OUTPUT.to_string()
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn default_true() -> bool {
    true
}

fn default_concurrency() -> usize {
    8
}

fn default_delete_batch_size() -> usize {
    MAX_DELETE_BATCH
}

fn default_list_page_size() -> i32 {
    1000
}

fn default_bucket_lookup() -> String {
    "auto".to_string()
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            progress: true,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            protocol: Protocol::default(),
            keep_directories_logical: true,
            concurrency: default_concurrency(),
            delete_batch_size: default_delete_batch_size(),
            list_page_size: default_list_page_size(),
            staging_dir: None,
        }
    }
}

impl StorageSettings {
    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(Error::Config("storage.concurrency must be at least 1".into()));
        }
        if self.delete_batch_size == 0 || self.delete_batch_size > MAX_DELETE_BATCH {
            return Err(Error::Config(format!(
                "storage.delete_batch_size must be between 1 and {MAX_DELETE_BATCH}"
            )));
        }
        if !(1..=1000).contains(&self.list_page_size) {
            return Err(Error::Config(
                "storage.list_page_size must be between 1 and 1000".into(),
            ));
        }
        Ok(())
    }
}

impl Default for S3Settings {
    fn default() -> Self {
        Self {
            endpoint: None,
            region: None,
            access_key: None,
            secret_key: None,
            bucket_lookup: default_bucket_lookup(),
        }
    }
}

impl S3Settings {
    /// Check the endpoint URL and bucket lookup style
    pub fn validate(&self) -> Result<()> {
        if let Some(endpoint) = &self.endpoint {
            url::Url::parse(endpoint)?;
        }
        if !matches!(self.bucket_lookup.as_str(), "auto" | "path" | "dns") {
            return Err(Error::Config(format!(
                "s3.bucket_lookup must be auto, path, or dns (got '{}')",
                self.bucket_lookup
            )));
        }
        if self.access_key.is_some() != self.secret_key.is_some() {
            return Err(Error::Config(
                "s3.access_key and s3.secret_key must be set together".into(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            defaults: Defaults::default(),
            storage: StorageSettings::default(),
            s3: S3Settings::default(),
        }
    }
}

/// Configuration manager handles loading and saving config
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the default config path
    pub fn new() -> Result<Self> {
        let config_dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .ok_or_else(|| Error::Config("Could not determine config directory".into()))?
                .join("ufs"),
        };
        Ok(Self {
            config_path: config_dir.join("config.toml"),
        })
    }

    /// Create a ConfigManager with a custom path (useful for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load configuration from disk
    ///
    /// If the configuration file doesn't exist, returns a default configuration.
    /// If the schema version doesn't match, attempts migration.
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&self.config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        if config.schema_version < SCHEMA_VERSION {
            config = self.migrate(config)?;
        } else if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "Configuration file version {} is newer than supported version {}. Please upgrade ufs.",
                config.schema_version, SCHEMA_VERSION
            )));
        }

        config.storage.validate()?;
        config.s3.validate()?;
        Ok(config)
    }

    /// Save configuration to disk
    ///
    /// Creates parent directories if they don't exist.
    /// Sets file permissions to 600 (owner read/write only).
    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(config)?;
        std::fs::write(&self.config_path, content)?;

        // Credentials may be stored in the file
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.config_path, permissions)?;
        }

        Ok(())
    }

    /// Migrate configuration from older schema version
    fn migrate(&self, config: Config) -> Result<Config> {
        let mut config = config;
        config.schema_version = SCHEMA_VERSION;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_config_manager() -> (ConfigManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let manager = ConfigManager::with_path(config_path);
        (manager, temp_dir)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.schema_version, SCHEMA_VERSION);
        assert_eq!(config.defaults.output, "human");
        assert_eq!(config.storage.protocol, Protocol::S3);
        assert!(config.storage.keep_directories_logical);
        assert_eq!(config.storage.delete_batch_size, 1000);
        assert_eq!(config.s3.bucket_lookup, "auto");
        assert!(config.storage.validate().is_ok());
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let (manager, _temp_dir) = temp_config_manager();
        let config = manager.load().unwrap();
        assert_eq!(config.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn test_save_and_load() {
        let (manager, _temp_dir) = temp_config_manager();

        let mut config = Config::default();
        config.storage.protocol = Protocol::S3a;
        config.storage.concurrency = 3;
        config.s3.endpoint = Some("http://localhost:9000".to_string());

        manager.save(&config).unwrap();
        let loaded = manager.load().unwrap();

        assert_eq!(loaded.storage.protocol, Protocol::S3a);
        assert_eq!(loaded.storage.concurrency, 3);
        assert_eq!(loaded.s3.endpoint.as_deref(), Some("http://localhost:9000"));
    }

    #[test]
    fn test_protocol_serialized_as_scheme_prefix() {
        let (manager, _temp_dir) = temp_config_manager();
        std::fs::write(
            manager.config_path(),
            "schema_version = 1\n[storage]\nprotocol = \"s3a://\"\n",
        )
        .unwrap();
        let loaded = manager.load().unwrap();
        assert_eq!(loaded.storage.protocol, Protocol::S3a);
        assert_eq!(loaded.storage.list_page_size, 1000);
    }

    #[test]
    fn test_rejects_oversized_delete_batch() {
        let (manager, _temp_dir) = temp_config_manager();
        std::fs::write(
            manager.config_path(),
            "schema_version = 1\n[storage]\ndelete_batch_size = 5000\n",
        )
        .unwrap();
        assert!(matches!(manager.load(), Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_half_credentials() {
        let settings = S3Settings {
            access_key: Some("key".into()),
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_bad_endpoint() {
        let settings = S3Settings {
            endpoint: Some("not a url".into()),
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_schema_version_too_new() {
        let (manager, _temp_dir) = temp_config_manager();

        let content = format!("schema_version = {}\n", SCHEMA_VERSION + 1);
        std::fs::write(manager.config_path(), content).unwrap();

        let result = manager.load();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("newer than supported")
        );
    }
}
