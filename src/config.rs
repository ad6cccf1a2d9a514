// ⚙️ Configuration - environment variables, all optional
//
// BANKS_DATABASE_PATH      SQLite file (":memory:" for a throwaway store)
// BANKS_BIND_ADDR          HTTP listen address
// BANKS_API_URL            peer base URL used by the remote mirror
// BANKS_HTTP_TIMEOUT_SECS  request timeout for the remote mirror
// BANKS_LOG_FORMAT         "pretty" or "json"

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_DATABASE_PATH: &str = "banks.db";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Filter used when RUST_LOG is not set
pub const DEFAULT_LOG_FILTER: &str = "info,banks_api=debug";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("expected 'pretty' or 'json', got '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub bind_addr: SocketAddr,
    pub api_url: String,
    pub http_timeout: Duration,
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(|key| std::env::var(key))
    }

    /// Load configuration from a custom variable reader, so tests never
    /// touch the process environment.
    pub fn from_reader<F>(reader: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, std::env::VarError>,
    {
        let database_path =
            reader("BANKS_DATABASE_PATH").unwrap_or_else(|_| DEFAULT_DATABASE_PATH.to_string());

        if database_path.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "BANKS_DATABASE_PATH".into(),
                "must not be empty".into(),
            ));
        }

        let bind_addr = reader("BANKS_BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BANKS_BIND_ADDR".into(), e.to_string()))?;

        let api_url = reader("BANKS_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "BANKS_API_URL".into(),
                format!("not an http(s) URL: {}", api_url),
            ));
        }

        let http_timeout_secs = reader("BANKS_HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_HTTP_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidValue("BANKS_HTTP_TIMEOUT_SECS".into(), e.to_string())
            })?;

        let log_format = reader("BANKS_LOG_FORMAT")
            .unwrap_or_else(|_| "pretty".to_string())
            .parse::<LogFormat>()
            .map_err(|e| ConfigError::InvalidValue("BANKS_LOG_FORMAT".into(), e))?;

        Ok(Self {
            database_path,
            bind_addr,
            api_url,
            http_timeout: Duration::from_secs(http_timeout_secs),
            log_format,
        })
    }

    pub fn is_in_memory(&self) -> bool {
        self.database_path == ":memory:"
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}
