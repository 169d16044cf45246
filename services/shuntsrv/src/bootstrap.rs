//! Service bootstrap
//!
//! Command line parsing, configuration loading and logging setup.

use std::path::PathBuf;

use clap::Parser;
use common::logging::{self, LogConfig};
use tracing::{debug, info};

use crate::config::{ShuntSrvConfig, SERVICE_NAME};
use crate::error::{Result, ShuntSrvError};

/// Command-line arguments for shuntsrv
#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "shuntsrv",
    version = env!("CARGO_PKG_VERSION"),
    about = "Junctek KH-F Battery Shunt Service",
    long_about = None
)]
pub struct Args {
    /// Configuration file (yaml, toml or json)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long)]
    pub log_level: Option<String>,

    /// Serial port, overrides the configuration
    #[arg(short = 'p', long)]
    pub port: Option<String>,

    /// Device address, overrides the configuration
    #[arg(short = 'a', long)]
    pub address: Option<u8>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Validation mode - only validate configuration without starting service
    #[arg(long)]
    pub validate: bool,
}

impl Args {
    /// Apply command line overrides on top of the loaded configuration
    pub fn apply_overrides(&self, config: &mut ShuntSrvConfig) {
        if let Some(port) = &self.port {
            config.serial.port = port.clone();
        }
        if let Some(address) = self.address {
            config.device.address = address;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}

/// Load, override and validate
pub fn load_configuration(args: &Args) -> Result<ShuntSrvConfig> {
    let mut config = ShuntSrvConfig::load(args.config.as_deref())?;
    args.apply_overrides(&mut config);
    config.validate()?;
    Ok(config)
}

/// Initialize logging from the validated configuration
pub fn initialize_logging(args: &Args, config: &ShuntSrvConfig) -> Result<()> {
    let log_config = LogConfig {
        service_name: SERVICE_NAME.to_string(),
        console_level: logging::parse_level(&config.logging.level)?,
        log_dir: config.logging.dir.clone(),
        enable_json: config.logging.json,
        enable_ansi: !args.no_color,
    };

    logging::init_with_config(log_config)
        .map_err(|e| ShuntSrvError::LoggingError(format!("Failed to init logging: {}", e)))?;
    debug!("Logging initialized at {}", config.logging.level);
    Ok(())
}

/// Log the effective configuration
pub fn log_configuration(config: &ShuntSrvConfig) {
    info!(
        "Device {} on {} @ {} baud, status every {} ms, settings every {} ms",
        config.device.address,
        config.serial.port,
        config.serial.baud_rate,
        config.device.status_interval_ms,
        config.device.settings_interval_ms
    );
    info!("Publishing {} sensor(s)", config.sensors.len());
    match serde_yaml::to_string(config) {
        Ok(yaml) => debug!("Effective configuration:\n{}", yaml),
        Err(e) => debug!("Failed to render configuration: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        let args = Args::parse_from([
            "shuntsrv",
            "--config",
            "site.yaml",
            "-p",
            "/dev/ttyS3",
            "--address",
            "4",
            "--validate",
        ]);
        assert_eq!(args.config, Some(PathBuf::from("site.yaml")));
        assert_eq!(args.port.as_deref(), Some("/dev/ttyS3"));
        assert_eq!(args.address, Some(4));
        assert!(args.validate);
        assert!(!args.no_color);
    }

    #[test]
    fn test_apply_overrides() {
        let args = Args {
            port: Some("/dev/ttyAMA0".to_string()),
            address: Some(9),
            log_level: Some("debug".to_string()),
            ..Default::default()
        };
        let mut config = ShuntSrvConfig::default();
        args.apply_overrides(&mut config);
        assert_eq!(config.serial.port, "/dev/ttyAMA0");
        assert_eq!(config.device.address, 9);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_no_overrides_keeps_config() {
        let mut config = ShuntSrvConfig::default();
        Args::default().apply_overrides(&mut config);
        assert_eq!(config, ShuntSrvConfig::default());
    }
}
