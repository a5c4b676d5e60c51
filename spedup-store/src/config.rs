use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::db::pool::{Dialect, DATABASE_FILE};
use crate::error::{Result, StoreError};

/// Environment variable overriding `data_storage.password`
pub const PASSWORD_ENV: &str = "SPEDUP_DATA_STORAGE_PASSWORD";

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "SPEDUP_DATA_DIR";

/// Name of the config file inside the data directory
pub const CONFIG_FILE: &str = "config.toml";

// ============================================================================
// TOML Configuration
// ============================================================================

/// Storage configuration, read from `<data_dir>/config.toml`
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct StorageConfig {
    #[serde(default)]
    pub data_storage: DataStorageConfig,

    #[serde(default)]
    pub pool: PoolConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataStorageConfig {
    /// Networked MySQL engine instead of the embedded SQLite file
    #[serde(default)]
    pub use_mysql: bool,

    #[serde(default = "default_ip")]
    pub ip: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_database")]
    pub database: String,

    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default)]
    pub password: String,

    #[serde(default)]
    pub use_ssl: bool,
}

impl Default for DataStorageConfig {
    fn default() -> Self {
        Self {
            use_mysql: false,
            ip: default_ip(),
            port: default_port(),
            database: default_database(),
            username: default_username(),
            password: String::new(),
            use_ssl: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PoolConfig {
    #[serde(default = "default_pool_name")]
    pub name: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_max_lifetime_secs")]
    pub max_lifetime_secs: u64,

    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            name: default_pool_name(),
            max_connections: default_max_connections(),
            max_lifetime_secs: default_max_lifetime_secs(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
        }
    }
}

impl PoolConfig {
    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

fn default_ip() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    3306
}

fn default_database() -> String {
    "spedup_furnaces".to_string()
}

fn default_username() -> String {
    "root".to_string()
}

fn default_pool_name() -> String {
    "SpedupFurnacesPlugin".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_max_lifetime_secs() -> u64 {
    60
}

fn default_acquire_timeout_secs() -> u64 {
    30
}

impl StorageConfig {
    /// Parse config from TOML text
    pub fn from_toml_str(content: &str, origin: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|source| StoreError::ConfigParse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Load config from a file, falling back to defaults when it does not exist.
    /// Environment overrides are applied either way.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config = Self::from_toml_str(&content, path)?;
            info!("Loaded storage config from {}", path.display());
            config
        } else {
            debug!("No config at {}, using defaults", path.display());
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load `<data_dir>/config.toml`
    pub fn load_from_data_dir(data_dir: &Path) -> Result<Self> {
        Self::load(&data_dir.join(CONFIG_FILE))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(password) = env::var(PASSWORD_ENV) {
            debug!("Using password from {}", PASSWORD_ENV);
            self.data_storage.password = password;
        }
    }

    /// Reject settings the pool cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.pool.max_connections == 0 {
            return Err(StoreError::config("pool.max_connections must be at least 1"));
        }
        if self.data_storage.use_mysql {
            if self.data_storage.ip.trim().is_empty() {
                return Err(StoreError::config("data_storage.ip is required when use_mysql = true"));
            }
            if self.data_storage.database.trim().is_empty() {
                return Err(StoreError::config(
                    "data_storage.database is required when use_mysql = true",
                ));
            }
        }
        Ok(())
    }

    pub fn dialect(&self) -> Dialect {
        if self.data_storage.use_mysql {
            Dialect::MySql
        } else {
            Dialect::Sqlite
        }
    }

    /// Path of the embedded database file
    pub fn sqlite_path(data_dir: &Path) -> PathBuf {
        data_dir.join(DATABASE_FILE)
    }

    /// Connection URL for the selected engine
    pub fn connection_url(&self, data_dir: &Path) -> String {
        self.url_with_password(data_dir, |password| urlencoding::encode(password).into_owned())
    }

    /// Connection URL safe for logs
    pub fn redacted_url(&self, data_dir: &Path) -> String {
        self.url_with_password(data_dir, |_| "***".to_string())
    }

    fn url_with_password(&self, data_dir: &Path, password: impl Fn(&str) -> String) -> String {
        match self.dialect() {
            Dialect::Sqlite => {
                format!("sqlite://{}?mode=rwc", Self::sqlite_path(data_dir).display())
            }
            Dialect::MySql => {
                let storage = &self.data_storage;
                let credentials = if storage.password.is_empty() {
                    urlencoding::encode(&storage.username).into_owned()
                } else {
                    format!(
                        "{}:{}",
                        urlencoding::encode(&storage.username),
                        password(&storage.password)
                    )
                };
                let ssl_mode = if storage.use_ssl { "REQUIRED" } else { "DISABLED" };
                format!(
                    "mysql://{}@{}:{}/{}?ssl-mode={}",
                    credentials, storage.ip, storage.port, storage.database, ssl_mode
                )
            }
        }
    }
}

/// Data directory from `SPEDUP_DATA_DIR`, if set
pub fn data_dir_from_env() -> Option<PathBuf> {
    env::var_os(DATA_DIR_ENV).map(PathBuf::from)
}
