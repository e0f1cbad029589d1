//! Configuration loader with layered sources.

use crate::AppConfig;
use cachet_core::CachetError;
use config::{Config, ConfigError, Environment, File};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Configuration loader with runtime refresh support.
#[derive(Clone)]
pub struct ConfigLoader {
    config: Arc<RwLock<AppConfig>>,
    config_dir: String,
}

impl ConfigLoader {
    /// Creates a new configuration loader.
    ///
    /// Configuration is loaded from multiple sources in order:
    /// 1. `config/default.toml` - Default values
    /// 2. `config/{environment}.toml` - Environment-specific overrides
    /// 3. `config/local.toml` - Uncommitted local overrides
    /// 4. Environment variables with `CACHET__` prefix (e.g. `CACHET__CACHE__DEFAULT_TTL_SECS`)
    pub fn new(config_dir: impl Into<String>) -> Result<Self, CachetError> {
        let config_dir = config_dir.into();
        let config = Self::load_config(&config_dir)?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_dir,
        })
    }

    /// Loads configuration from the default location (`./config`).
    pub fn from_default_location() -> Result<Self, CachetError> {
        Self::new("./config")
    }

    /// Returns the current configuration.
    pub async fn get(&self) -> AppConfig {
        self.config.read().await.clone()
    }

    /// Reloads the configuration from disk.
    pub async fn reload(&self) -> Result<(), CachetError> {
        let new_config = Self::load_config(&self.config_dir)?;
        let mut config = self.config.write().await;
        *config = new_config;
        info!("Configuration reloaded successfully");
        Ok(())
    }

    /// Loads configuration from the specified directory.
    fn load_config(config_dir: &str) -> Result<AppConfig, CachetError> {
        // Load .env file if present
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file found or error loading it: {}", e);
        }

        let environment =
            std::env::var("CACHET_ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        info!("Loading configuration for environment: {}", environment);

        let mut builder = Config::builder();

        for layer in ["default", environment.as_str(), "local"] {
            let path = format!("{}/{}.toml", config_dir, layer);
            if Path::new(&path).exists() {
                debug!("Loading {} config from: {}", layer, path);
                builder = builder.add_source(File::with_name(&path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("CACHET")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_error_to_cachet_error)?;

        let app_config: AppConfig = config
            .try_deserialize()
            .map_err(config_error_to_cachet_error)?;

        Self::validate_config(&app_config)?;

        Ok(app_config)
    }

    /// Validates the configuration.
    fn validate_config(config: &AppConfig) -> Result<(), CachetError> {
        if config.cache.default_language.trim().is_empty() {
            return Err(CachetError::Configuration(
                "cache.default_language must not be empty".to_string(),
            ));
        }

        if config.cache.default_ttl_secs == 0 {
            return Err(CachetError::Configuration(
                "cache.default_ttl_secs must be greater than zero".to_string(),
            ));
        }

        if config.cache.instance_id_param.is_empty() {
            return Err(CachetError::Configuration(
                "cache.instance_id_param must not be empty".to_string(),
            ));
        }

        if config.redis.enabled {
            url::Url::parse(&config.redis.url).map_err(|e| {
                CachetError::Configuration(format!("Invalid redis.url '{}': {}", config.redis.url, e))
            })?;
        }

        if !config.cache.enabled {
            warn!("Response caching is disabled; every request will reach its handler");
        }

        Ok(())
    }

    /// Gets a specific configuration value by key path.
    pub async fn get_value<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let config = self.config.read().await;
        let json = serde_json::to_value(&*config).ok()?;

        let mut current = &json;
        for part in key.split('.') {
            current = current.get(part)?;
        }

        serde_json::from_value(current.clone()).ok()
    }
}

fn config_error_to_cachet_error(err: ConfigError) -> CachetError {
    CachetError::Configuration(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ServerConfig;
    use std::fs;

    fn write_default(dir: &tempfile::TempDir, contents: &str) {
        fs::write(dir.path().join("default.toml"), contents).unwrap();
    }

    #[tokio::test]
    async fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert!(config.cache.enabled);
        assert!(config.redis.enabled);
    }

    #[tokio::test]
    async fn test_server_address() {
        let config = ServerConfig::default();
        assert_eq!(config.addr(), "0.0.0.0:8080");
    }

    #[tokio::test]
    async fn test_loads_default_toml() {
        let dir = tempfile::tempdir().unwrap();
        write_default(
            &dir,
            r#"
            [cache]
            default_language = "de"
            default_ttl_secs = 120

            [redis]
            enabled = false
            "#,
        );

        let loader = ConfigLoader::new(dir.path().to_string_lossy().to_string()).unwrap();
        let config = loader.get().await;
        assert_eq!(config.cache.default_language, "de");
        assert_eq!(config.cache.default_ttl_secs, 120);
        assert!(!config.redis.enabled);

        let ttl: Option<u64> = loader.get_value("cache.default_ttl_secs").await;
        assert_eq!(ttl, Some(120));
    }

    #[tokio::test]
    async fn test_rejects_zero_ttl() {
        let dir = tempfile::tempdir().unwrap();
        write_default(&dir, "[cache]\ndefault_ttl_secs = 0\n");

        let result = ConfigLoader::new(dir.path().to_string_lossy().to_string());
        assert!(matches!(result, Err(CachetError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_rejects_invalid_redis_url() {
        let dir = tempfile::tempdir().unwrap();
        write_default(&dir, "[redis]\nurl = \"not a url\"\nenabled = true\n");

        let result = ConfigLoader::new(dir.path().to_string_lossy().to_string());
        assert!(matches!(result, Err(CachetError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_reload_picks_up_changes() {
        let dir = tempfile::tempdir().unwrap();
        write_default(&dir, "[cache]\ndefault_language = \"en\"\n");
        let loader = ConfigLoader::new(dir.path().to_string_lossy().to_string()).unwrap();

        write_default(&dir, "[cache]\ndefault_language = \"fr\"\n");
        loader.reload().await.unwrap();

        assert_eq!(loader.get().await.cache.default_language, "fr");
    }
}
