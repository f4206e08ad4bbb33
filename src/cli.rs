use clap::Parser;

use crate::config::Config;

/// HTTP front end for a SANE scanner
#[derive(Debug, Parser)]
#[command(name = "scan-server", version, about)]
pub struct Cli {
    /// Address to bind (overrides HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides PORT)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Scanner device name (overrides SCAN_DEVICE)
    #[arg(short, long)]
    pub device: Option<String>,

    /// Directory for log files (overrides LOG_DIR)
    #[arg(long)]
    pub log_dir: Option<String>,
}

impl Cli {
    /// Apply command-line flags on top of the environment configuration
    pub fn apply(self, mut config: Config) -> Config {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(device) = self.device {
            config.device = device;
        }
        if let Some(log_dir) = self.log_dir {
            config.log_dir = log_dir;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn base() -> Config {
        Config {
            device: String::new(),
            command: "scanimage".to_string(),
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_dir: "logs".to_string(),
            scan_timeout: None,
            max_scan_size: None,
            device_lock_timeout: Duration::ZERO,
        }
    }

    #[test]
    fn flags_override_environment() {
        let cli = Cli::parse_from(["scan-server", "--port", "8080", "-d", "pixma:04A91912"]);
        let config = cli.apply(base());

        assert_eq!(config.port, 8080);
        assert_eq!(config.device, "pixma:04A91912");
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    fn no_flags_keeps_environment() {
        let config = Cli::parse_from(["scan-server"]).apply(base());
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_dir, "logs");
    }
}
