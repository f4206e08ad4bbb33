use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::scanner::job::DEFAULT_COMMAND;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value `{value}`")]
    Invalid { name: &'static str, value: String },
}

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Scanner device handed to `--device-name`, empty for the default device
    pub device: String,

    /// External scanner program
    /// Default: scanimage
    pub command: String,

    /// Address the HTTP server binds to
    /// Default: 0.0.0.0
    pub host: String,

    /// Default: 3000
    pub port: u16,

    /// Directory for rolling log files
    /// Default: logs
    pub log_dir: String,

    /// Kill a scan that runs longer than this. Unset means wait forever.
    pub scan_timeout: Option<Duration>,

    /// Largest image (in bytes) accepted from the scanner. Unset means no cap.
    pub max_scan_size: Option<usize>,

    /// How long a request waits for a device another request is using
    /// Default: 0 (reject immediately)
    pub device_lock_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Optional environment variables:
    /// - SCAN_DEVICE: scanner device name (default: system default device)
    /// - SCAN_COMMAND: scanner executable (default: scanimage)
    /// - HOST / PORT: bind address (default: 0.0.0.0:3000)
    /// - LOG_DIR: log directory (default: logs)
    /// - SCAN_TIMEOUT_SECS: subprocess timeout in seconds (default: none)
    /// - MAX_SCAN_SIZE: maximum scan output in bytes (default: none)
    /// - DEVICE_LOCK_TIMEOUT_SECS: wait for a busy device in seconds (default: 0)
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let device = lookup("SCAN_DEVICE").unwrap_or_default();
        let command = lookup("SCAN_COMMAND").unwrap_or_else(|| DEFAULT_COMMAND.to_string());
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse(&lookup, "PORT")?.unwrap_or(3000);
        let log_dir = lookup("LOG_DIR").unwrap_or_else(|| "logs".to_string());

        let scan_timeout = parse(&lookup, "SCAN_TIMEOUT_SECS")?.map(Duration::from_secs);
        let max_scan_size = parse(&lookup, "MAX_SCAN_SIZE")?;
        let device_lock_timeout = Duration::from_secs(
            parse(&lookup, "DEVICE_LOCK_TIMEOUT_SECS")?.unwrap_or(0),
        );

        Ok(Config {
            device,
            command,
            host,
            port,
            log_dir,
            scan_timeout,
            max_scan_size,
            device_lock_timeout,
        })
    }
}

fn parse<F, T>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => match value.trim().parse() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(ConfigError::Invalid { name, value }),
        },
    }
}
