//! Configuration management for webfile
//!
//! Multi-source loading with zero-config defaults: built-in defaults, then a
//! TOML file, then environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::{ClearingPolicy, ClientConfig, PollConfig};
use crate::constants::{env, files, http, poll};
use crate::errors::{ConfigError, ConfigResult};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP client settings
    pub client: ClientConfigToml,
    /// Callback polling settings
    pub poll: PollConfigToml,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfigToml {
    /// TCP keep-alive timeout in seconds (None = disabled)
    pub tcp_keepalive_secs: Option<u64>,
    /// TCP nodelay setting
    pub tcp_nodelay: bool,
    /// Connection pool idle timeout in seconds (None = no timeout)
    pub pool_idle_timeout_secs: Option<u64>,
    /// Maximum idle connections per host
    pub pool_max_per_host: usize,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
    /// Maximum redirects to follow
    pub max_redirects: usize,
    /// User agent override
    pub user_agent: Option<String>,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        Self {
            tcp_keepalive_secs: Some(30),
            tcp_nodelay: true,
            pool_idle_timeout_secs: Some(http::POOL_IDLE_TIMEOUT.as_secs()),
            pool_max_per_host: http::POOL_MAX_PER_HOST,
            request_timeout_secs: http::DEFAULT_TIMEOUT.as_secs(),
            connect_timeout_secs: http::CONNECT_TIMEOUT.as_secs(),
            max_redirects: http::MAX_REDIRECTS,
            user_agent: None,
        }
    }
}

/// TOML-friendly polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfigToml {
    /// Tick interval in milliseconds
    pub tick_interval_ms: u64,
    /// Cancel polling whenever nothing is pending
    pub stop_when_idle: bool,
    /// When the clearing flag is lowered
    pub clearing_policy: ClearingPolicy,
}

impl Default for PollConfigToml {
    fn default() -> Self {
        Self {
            tick_interval_ms: poll::DEFAULT_TICK_INTERVAL.as_millis() as u64,
            stop_when_idle: false,
            clearing_policy: ClearingPolicy::AfterPost,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level for the application
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Convert TOML-friendly configuration to runtime configuration
    pub fn to_runtime_config(&self) -> (ClientConfig, PollConfig) {
        (
            self.client.to_runtime_config(),
            self.poll.to_runtime_config(),
        )
    }

    /// Load configuration with multi-source precedence:
    /// 1. Default values
    /// 2. Config file (explicit, or the first one found)
    /// 3. Environment variables
    pub async fn load(config_file_override: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = match config_file_override {
            Some(path) if !path.exists() => return Err(ConfigError::NotFound { path }),
            Some(path) => Self::load_from_file(&path).await?,
            None => match Self::find_config_file() {
                Some(path) => Self::load_from_file(&path).await?,
                None => {
                    debug!("No config file found in standard locations");
                    Self::default()
                }
            },
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides using `lookup` to read variables
    pub fn apply_env_overrides<L>(&mut self, lookup: L) -> ConfigResult<()>
    where
        L: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(env::TICK_INTERVAL_MS) {
            let millis = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                field: env::TICK_INTERVAL_MS.to_string(),
                value: value.clone(),
                reason: "Expected a whole number of milliseconds".to_string(),
            })?;
            self.poll.tick_interval_ms = millis;
            debug!("Tick interval overridden from environment: {}ms", value);
        }
        Ok(())
    }

    /// Reject values the runtime cannot work with
    pub fn validate(&self) -> ConfigResult<()> {
        let tick = Duration::from_millis(self.poll.tick_interval_ms);
        if tick < poll::MIN_TICK_INTERVAL {
            return Err(ConfigError::InvalidValue {
                field: "poll.tick_interval_ms".to_string(),
                value: self.poll.tick_interval_ms.to_string(),
                reason: format!("Must be at least {:?}", poll::MIN_TICK_INTERVAL),
            });
        }
        if self.client.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "client.request_timeout_secs".to_string(),
                value: "0".to_string(),
                reason: "Must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(files::LOCAL_CONFIG_FILE)];
        if let Some(path) = Self::default_config_path() {
            search_paths.push(path);
        }

        search_paths.into_iter().find(|path| {
            let found = path.exists();
            if found {
                debug!("Found config file: {}", path.display());
            }
            found
        })
    }

    /// Default config file path for the current user
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(files::APP_DIR).join(files::CONFIG_FILE))
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let config: AppConfig = toml::from_str(&content)?;
        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Write a commented default configuration to `path`
    ///
    /// Returns `false` without touching the file if it already exists.
    pub async fn write_default(path: &Path) -> crate::Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, Self::generate_default_config_content()).await?;
        info!("Created default configuration file: {}", path.display());
        Ok(true)
    }

    /// Generate default configuration content with helpful comments
    pub fn generate_default_config_content() -> String {
        format!(
            r#"# webfile configuration

[client]
tcp_keepalive_secs = 30
tcp_nodelay = true
pool_idle_timeout_secs = {}
pool_max_per_host = {}
request_timeout_secs = {}
connect_timeout_secs = {}
max_redirects = {}
# user_agent = "my-app/1.0"

[poll]
# Interval the host is asked to tick at
tick_interval_ms = {}
# Cancel the host schedule whenever nothing is pending
stop_when_idle = false
# "after_post" or "until_delivered"
clearing_policy = "after_post"

[logging]
level = "info"  # error, warn, info, debug, trace
"#,
            http::POOL_IDLE_TIMEOUT.as_secs(),
            http::POOL_MAX_PER_HOST,
            http::DEFAULT_TIMEOUT.as_secs(),
            http::CONNECT_TIMEOUT.as_secs(),
            http::MAX_REDIRECTS,
            poll::DEFAULT_TICK_INTERVAL.as_millis(),
        )
    }
}

impl ClientConfigToml {
    /// Convert to runtime ClientConfig
    pub fn to_runtime_config(&self) -> ClientConfig {
        ClientConfig {
            tcp_keepalive: self.tcp_keepalive_secs.map(Duration::from_secs),
            tcp_nodelay: self.tcp_nodelay,
            pool_idle_timeout: self.pool_idle_timeout_secs.map(Duration::from_secs),
            pool_max_per_host: self.pool_max_per_host,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            max_redirects: self.max_redirects,
            user_agent: self
                .user_agent
                .clone()
                .unwrap_or_else(|| http::USER_AGENT.to_string()),
        }
    }
}

impl PollConfigToml {
    /// Convert to runtime PollConfig
    pub fn to_runtime_config(&self) -> PollConfig {
        PollConfig {
            tick_interval: Duration::from_millis(self.tick_interval_ms),
            stop_when_idle: self.stop_when_idle,
            clearing_policy: self.clearing_policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_creation() {
        let config = AppConfig::default();
        assert_eq!(
            config.poll.tick_interval_ms,
            poll::DEFAULT_TICK_INTERVAL.as_millis() as u64
        );
        assert_eq!(config.client.max_redirects, http::MAX_REDIRECTS);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_file_generation() {
        let content = AppConfig::generate_default_config_content();

        // Should be valid TOML
        let parsed: AppConfig = toml::from_str(&content).unwrap();

        assert_eq!(parsed.poll.clearing_policy, ClearingPolicy::AfterPost);
        assert!(!parsed.poll.stop_when_idle);
        assert!(content.contains("[client]"));
        assert!(content.contains("[poll]"));
    }

    #[tokio::test]
    async fn test_config_loading_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let result = AppConfig::load(Some(config_path)).await;
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_config_loading_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("webfile.toml");

        let test_config = r#"
[poll]
tick_interval_ms = 50
clearing_policy = "until_delivered"

[logging]
level = "debug"
"#;
        tokio::fs::write(&config_path, test_config).await.unwrap();

        let config = AppConfig::load_from_file(&config_path).await.unwrap();

        assert_eq!(config.poll.tick_interval_ms, 50);
        assert_eq!(config.poll.clearing_policy, ClearingPolicy::UntilDelivered);
        assert_eq!(config.logging.level, "debug");
        // Unspecified sections keep their defaults
        assert_eq!(config.client.max_redirects, http::MAX_REDIRECTS);
    }

    #[tokio::test]
    async fn test_config_loading_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("broken.toml");
        tokio::fs::write(&config_path, "[poll\ntick_interval_ms = ")
            .await
            .unwrap();

        let result = AppConfig::load_from_file(&config_path).await;
        assert!(matches!(result, Err(ConfigError::InvalidFormat(_))));
    }

    #[test]
    fn test_env_override() {
        let mut config = AppConfig::default();
        config
            .apply_env_overrides(|key| (key == env::TICK_INTERVAL_MS).then(|| "40".to_string()))
            .unwrap();
        assert_eq!(config.poll.tick_interval_ms, 40);

        let result = config.apply_env_overrides(|_| Some("soon".to_string()));
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_validation_rejects_zero_tick() {
        let mut config = AppConfig::default();
        config.poll.tick_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_runtime_conversion() {
        let mut config = AppConfig::default();
        config.client.user_agent = Some("host/2.0".to_string());
        config.poll.stop_when_idle = true;

        let (client, poll_config) = config.to_runtime_config();
        assert_eq!(client.user_agent, "host/2.0");
        assert_eq!(client.max_redirects, http::MAX_REDIRECTS);
        assert!(poll_config.stop_when_idle);
        assert_eq!(poll_config.tick_interval, poll::DEFAULT_TICK_INTERVAL);
    }

    #[tokio::test]
    async fn test_write_default_does_not_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        assert!(AppConfig::write_default(&path).await.unwrap());
        assert!(!AppConfig::write_default(&path).await.unwrap());

        let loaded = AppConfig::load(Some(path)).await.unwrap();
        assert_eq!(loaded.logging.level, "info");
    }
}
