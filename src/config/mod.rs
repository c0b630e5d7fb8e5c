//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::util::rate_limit::INPUT_RATE_LIMIT;
use crate::util::time::DEFAULT_TICK_INTERVAL;

/// Log output format
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error), used when RUST_LOG is unset
    pub log_level: String,
    pub log_format: LogFormat,

    /// Simulation and broadcast period
    pub tick_interval: Duration,
    /// Max inbound frames per second per connection
    pub input_rate_limit: u32,

    /// Directory of built client files served as the router fallback
    pub static_dir: Option<PathBuf>,
    /// Allowed client origins for CORS (comma-separated); any origin when unset
    pub client_origin: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            tick_interval: DEFAULT_TICK_INTERVAL,
            input_rate_limit: INPUT_RATE_LIMIT,
            static_dir: None,
            client_origin: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = if let Ok(port) = env::var("PORT") {
            format!("0.0.0.0:{}", port)
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?
        } else if let Ok(addr) = env::var("SERVER_ADDR") {
            addr.parse().map_err(|_| ConfigError::InvalidAddress)?
        } else {
            defaults.server_addr
        };

        let log_format = match env::var("LOG_FORMAT").ok().as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(_) => return Err(ConfigError::Invalid("LOG_FORMAT")),
        };

        let tick_ms: u64 = parse_var("TICK_INTERVAL_MS")?
            .unwrap_or(defaults.tick_interval.as_millis() as u64);
        if tick_ms == 0 {
            return Err(ConfigError::Invalid("TICK_INTERVAL_MS"));
        }

        Ok(Self {
            server_addr,
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format,
            tick_interval: Duration::from_millis(tick_ms),
            input_rate_limit: parse_var("INPUT_RATE_LIMIT")?.unwrap_or(defaults.input_rate_limit),
            static_dir: env::var("STATIC_DIR").ok().map(PathBuf::from),
            client_origin: env::var("CLIENT_ORIGIN").ok(),
        })
    }
}

fn parse_var<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map(Some).map_err(|_| ConfigError::Invalid(name)),
        Err(_) => Ok(None),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}
