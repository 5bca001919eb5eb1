//! Configuration module for payout-server.
//!
//! Handles loading configuration from TOML files, CLI arguments,
//! and environment variables. Also handles admin secret hashing.

pub mod file;
pub mod runtime;

use crate::config::file::{FileConfig, WatcherConfig as FileWatcherConfig};
use crate::config::runtime::{AdminConfig, ServerConfig, SharedConfig, WatcherConfig};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("password hashing error: {0}")]
    HashError(String),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// Loaded configuration result containing all parts.
#[derive(Debug)]
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub admin: AdminConfig,
    pub watcher: WatcherConfig,
}

impl LoadedConfig {
    /// Convert into a SharedConfig with Arc<RwLock<T>> wrappers.
    pub fn into_shared(self) -> SharedConfig {
        SharedConfig::new(self.server, self.admin, self.watcher)
    }

    /// Replace every section of `shared` with this configuration.
    pub async fn apply_to(self, shared: &SharedConfig) {
        *shared.server.write().await = self.server;
        *shared.admin.write().await = self.admin;
        *shared.watcher.write().await = self.watcher;
    }
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    /// Create a new config loader.
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// This will:
    /// 1. Read the TOML file
    /// 2. Apply CLI overrides
    /// 3. Validate the configuration
    /// 4. Hash the admin secret if it's plaintext (and rewrite the file)
    /// 5. Build the loaded configuration
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let mut file_config: FileConfig = toml::from_str(&config_content)?;

        self.validate(&file_config)?;

        // Hash admin secret if needed and rewrite config. The rewrite happens
        // before CLI overrides so they never end up in the file.
        let secret_hash = if file_config.is_admin_secret_hashed() {
            file_config.admin.secret.clone()
        } else {
            let hash = self.hash_secret(&file_config.admin.secret)?;
            file_config.admin.secret = hash.clone();
            self.rewrite_config(&file_config)?;
            tracing::info!("Admin secret hashed and config file updated");
            hash
        };

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        Ok(build_loaded_config(file_config, secret_hash))
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn validate(&self, config: &FileConfig) -> Result<(), ConfigError> {
        if config.admin.secret.is_empty() {
            return Err(ConfigError::ValidationError(
                "admin secret must not be empty".into(),
            ));
        }
        if config.watcher.tick_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "watcher.tick_interval_secs must be greater than zero".into(),
            ));
        }
        if config.watcher.gateway_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "watcher.gateway_timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    fn hash_secret(&self, plaintext: &str) -> Result<String, ConfigError> {
        use argon2::{
            Argon2, PasswordHasher,
            password_hash::{SaltString, rand_core::OsRng},
        };

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ConfigError::HashError(e.to_string()))
    }

    fn rewrite_config(&self, config: &FileConfig) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(config)?;

        // Write atomically: write to temp file, then rename
        let temp_path = self.config_path.with_extension("toml.tmp");
        std::fs::write(&temp_path, toml_string)?;
        std::fs::rename(&temp_path, &self.config_path)?;

        Ok(())
    }
}

fn build_loaded_config(file_config: FileConfig, secret_hash: String) -> LoadedConfig {
    LoadedConfig {
        server: ServerConfig {
            listen: file_config.server.listen,
        },
        admin: AdminConfig::new(secret_hash),
        watcher: convert_watcher(&file_config.watcher),
    }
}

fn convert_watcher(w: &FileWatcherConfig) -> WatcherConfig {
    WatcherConfig {
        tick_interval: Duration::from_secs(w.tick_interval_secs),
        gateway_timeout: Duration::from_secs(w.gateway_timeout_secs),
        enabled: w.enabled,
    }
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}
