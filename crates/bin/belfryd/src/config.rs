//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `belfry.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::time::Duration;

use belfry_app::driver::DriverConfig;
use chrono::FixedOffset;
use serde::Deserialize;

/// Largest accepted distance from UTC, in seconds.
const MAX_UTC_OFFSET: i32 = 86_399;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Wall clock settings.
    pub clock: ClockConfig,
    /// Polling driver intervals.
    pub engine: EngineConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Local time offset from UTC, in seconds east.
    pub utc_offset_seconds: i32,
    /// Trust the system clock at startup. When `false` nothing rings until
    /// the time is set through `PUT /api/time`.
    pub assume_synchronized: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tick_ms: u64,
    pub idle_secs: u64,
    pub retry_secs: u64,
    pub error_backoff_ms: u64,
    pub unsynced_backoff_secs: u64,
}

impl Config {
    /// Load configuration from `belfry.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if a
    /// value is out of range.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("belfry.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("BELFRY_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("BELFRY_PORT")
            && let Ok(port) = val.parse()
        {
            self.server.port = port;
        }
        if let Ok(val) = std::env::var("BELFRY_BIND")
            && let Some((host, port)) = val.rsplit_once(':')
        {
            self.server.host = host.to_string();
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("BELFRY_DATABASE_URL") {
            self.database.url = val;
        }
        if let Ok(val) = std::env::var("BELFRY_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("BELFRY_UTC_OFFSET")
            && let Ok(offset) = val.parse()
        {
            self.clock.utc_offset_seconds = offset;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.clock.utc_offset_seconds.abs() > MAX_UTC_OFFSET {
            return Err(ConfigError::Validation(format!(
                "utc offset must be within ±{MAX_UTC_OFFSET} seconds"
            )));
        }
        if self.engine.tick_ms == 0 {
            return Err(ConfigError::Validation(
                "engine tick must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    /// The configured local time offset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] when the offset is out of range.
    pub fn utc_offset(&self) -> Result<FixedOffset, ConfigError> {
        FixedOffset::east_opt(self.clock.utc_offset_seconds).ok_or_else(|| {
            ConfigError::Validation(format!(
                "invalid utc offset {}",
                self.clock.utc_offset_seconds
            ))
        })
    }

    #[must_use]
    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            tick: Duration::from_millis(self.engine.tick_ms),
            idle: Duration::from_secs(self.engine.idle_secs),
            retry: Duration::from_secs(self.engine.retry_secs),
            error_backoff: Duration::from_millis(self.engine.error_backoff_ms),
            unsynced_backoff: Duration::from_secs(self.engine.unsynced_backoff_secs),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:belfry.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "belfryd=info,belfry=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            utc_offset_seconds: 0,
            assume_synchronized: true,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_ms: 100,
            idle_secs: 50,
            retry_secs: 50,
            error_backoff_ms: 1_000,
            unsynced_backoff_secs: 5,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.url, "sqlite:belfry.db?mode=rwc");
        assert_eq!(config.clock.utc_offset_seconds, 0);
        assert!(config.clock.assume_synchronized);
    }

    #[test]
    fn should_match_default_driver_intervals() {
        assert_eq!(Config::default().driver_config(), DriverConfig::default());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.engine.tick_ms, 100);
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [server]
            host = '127.0.0.1'
            port = 9090

            [database]
            url = 'sqlite:test.db'

            [logging]
            filter = 'debug'

            [clock]
            utc_offset_seconds = 19800
            assume_synchronized = false

            [engine]
            tick_ms = 250
            idle_secs = 30
            retry_secs = 20
            error_backoff_ms = 500
            unsynced_backoff_secs = 2
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.database.url, "sqlite:test.db");
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(
            config.utc_offset().unwrap(),
            FixedOffset::east_opt(19_800).unwrap()
        );
        assert!(!config.clock.assume_synchronized);

        let driver = config.driver_config();
        assert_eq!(driver.tick, Duration::from_millis(250));
        assert_eq!(driver.idle, Duration::from_secs(30));
        assert_eq!(driver.retry, Duration::from_secs(20));
        assert_eq!(driver.error_backoff, Duration::from_millis(500));
        assert_eq!(driver.unsynced_backoff, Duration::from_secs(2));
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_reject_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_out_of_range_offset() {
        let mut config = Config::default();
        config.clock.utc_offset_seconds = -86_400;
        assert!(config.validate().is_err());
        assert!(config.utc_offset().is_err());
    }

    #[test]
    fn should_reject_zero_tick() {
        let mut config = Config::default();
        config.engine.tick_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_accept_defaults() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn should_format_custom_bind_addr() {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 9090;
        assert_eq!(config.bind_addr(), "127.0.0.1:9090");
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
