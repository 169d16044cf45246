//! Service configuration
//!
//! Loaded through `common::ConfigLoader`: defaults, `config/shuntsrv.yaml`,
//! `config/shuntsrv.toml`, the `--config` file, then `SHUNTSRV_*` variables
//! (`SHUNTSRV_DEVICE__ADDRESS=2`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use common::ConfigLoader;
use serde::{Deserialize, Serialize};
use voltage_khf::{
    scheduler::{DEFAULT_SETTINGS_INTERVAL_MS, DEFAULT_STATUS_INTERVAL_MS},
    Measurement, MonitorConfig,
};

use crate::error::{Result, ShuntSrvError};

pub const SERVICE_NAME: &str = "shuntsrv";

/// Default scheduling cycle period (ms)
pub const DEFAULT_CYCLE_INTERVAL_MS: u64 = 20;

/// Shunt device settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Bus address (1..=255)
    pub address: u8,
    /// Flip the current sign for a reversed shunt
    pub invert_current: bool,
    pub status_interval_ms: u64,
    pub settings_interval_ms: u64,
    /// Period of the scheduling cycle
    pub cycle_interval_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            address: 1,
            invert_current: false,
            status_interval_ms: DEFAULT_STATUS_INTERVAL_MS,
            settings_interval_ms: DEFAULT_SETTINGS_INTERVAL_MS,
            cycle_interval_ms: DEFAULT_CYCLE_INTERVAL_MS,
        }
    }
}

impl DeviceConfig {
    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            address: self.address,
            invert_current: self.invert_current,
            settings_interval_ms: self.settings_interval_ms,
            status_interval_ms: self.status_interval_ms,
        }
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_millis(self.cycle_interval_ms)
    }
}

/// Serial port configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Serial port path (e.g., "/dev/ttyUSB0", "COM1")
    pub port: String,
    pub baud_rate: u32,
    /// Data bits (5, 6, 7, 8)
    pub data_bits: u8,
    /// Stop bits (1, 2)
    pub stop_bits: u8,
    /// Parity ("None", "Even", "Odd")
    pub parity: String,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 115_200,
            data_bits: 8,
            stop_bits: 1,
            parity: "None".to_string(),
        }
    }
}

impl SerialConfig {
    pub fn validate(&self) -> Result<()> {
        if self.port.is_empty() {
            return Err(ShuntSrvError::ConfigError(
                "Port path cannot be empty".to_string(),
            ));
        }

        if self.baud_rate == 0 {
            return Err(ShuntSrvError::ConfigError(
                "Baud rate must be greater than zero".to_string(),
            ));
        }

        if ![5, 6, 7, 8].contains(&self.data_bits) {
            return Err(ShuntSrvError::ConfigError(
                "Data bits must be 5, 6, 7, or 8".to_string(),
            ));
        }

        if ![1, 2].contains(&self.stop_bits) {
            return Err(ShuntSrvError::ConfigError(
                "Stop bits must be 1 or 2".to_string(),
            ));
        }

        if !["None", "Even", "Odd"].contains(&self.parity.as_str()) {
            return Err(ShuntSrvError::ConfigError(
                "Parity must be None, Even, or Odd".to_string(),
            ));
        }

        Ok(())
    }

    pub fn parse_parity(&self) -> tokio_serial::Parity {
        match self.parity.as_str() {
            "Even" => tokio_serial::Parity::Even,
            "Odd" => tokio_serial::Parity::Odd,
            _ => tokio_serial::Parity::None,
        }
    }

    pub fn parse_data_bits(&self) -> tokio_serial::DataBits {
        match self.data_bits {
            5 => tokio_serial::DataBits::Five,
            6 => tokio_serial::DataBits::Six,
            7 => tokio_serial::DataBits::Seven,
            _ => tokio_serial::DataBits::Eight,
        }
    }

    pub fn parse_stop_bits(&self) -> tokio_serial::StopBits {
        match self.stop_bits {
            2 => tokio_serial::StopBits::Two,
            _ => tokio_serial::StopBits::One,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Daily log files go here; console only when unset
    pub dir: Option<PathBuf>,
    /// JSON lines in the log file
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
            json: false,
        }
    }
}

/// Complete service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShuntSrvConfig {
    pub device: DeviceConfig,
    pub serial: SerialConfig,
    /// Measurements to publish
    pub sensors: Vec<Measurement>,
    pub logging: LoggingConfig,
}

impl Default for ShuntSrvConfig {
    fn default() -> Self {
        Self {
            device: DeviceConfig::default(),
            serial: SerialConfig::default(),
            sensors: Measurement::ALL.to_vec(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ShuntSrvConfig {
    /// Load from the default locations plus an optional explicit file
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::load_with(ConfigLoader::new(SERVICE_NAME), explicit)
    }

    pub fn load_with(loader: ConfigLoader, explicit: Option<&Path>) -> Result<Self> {
        let loader = match explicit {
            Some(path) => loader.with_file(path),
            None => loader,
        };
        Ok(loader.load()?)
    }

    pub fn validate(&self) -> Result<()> {
        self.device.monitor_config().validate()?;
        if self.device.cycle_interval_ms == 0 {
            return Err(ShuntSrvError::ConfigError(
                "Cycle interval must be greater than zero".to_string(),
            ));
        }
        self.serial.validate()?;
        common::logging::parse_level(&self.logging.level)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ShuntSrvConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.serial.baud_rate, 115_200);
        assert_eq!(config.device.status_interval_ms, 10_000);
        assert_eq!(config.device.settings_interval_ms, 30_000);
        assert_eq!(config.sensors.len(), Measurement::ALL.len());
    }

    #[test]
    fn test_validation_rules() {
        let mut config = ShuntSrvConfig::default();
        config.device.address = 0;
        assert!(matches!(config.validate(), Err(ShuntSrvError::ConfigError(_))));

        let mut config = ShuntSrvConfig::default();
        config.device.cycle_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = ShuntSrvConfig::default();
        config.device.settings_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = ShuntSrvConfig::default();
        config.serial.port.clear();
        assert!(config.validate().is_err());

        let mut config = ShuntSrvConfig::default();
        config.serial.baud_rate = 0;
        assert!(config.validate().is_err());

        let mut config = ShuntSrvConfig::default();
        config.serial.data_bits = 9;
        assert!(config.validate().is_err());

        let mut config = ShuntSrvConfig::default();
        config.serial.stop_bits = 3;
        assert!(config.validate().is_err());

        let mut config = ShuntSrvConfig::default();
        config.serial.parity = "Mark".to_string();
        assert!(config.validate().is_err());

        let mut config = ShuntSrvConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_serial_parsing() {
        let serial = SerialConfig {
            data_bits: 7,
            stop_bits: 2,
            parity: "Even".to_string(),
            ..Default::default()
        };
        assert_eq!(serial.parse_parity(), tokio_serial::Parity::Even);
        assert_eq!(serial.parse_data_bits(), tokio_serial::DataBits::Seven);
        assert_eq!(serial.parse_stop_bits(), tokio_serial::StopBits::Two);
    }

    #[test]
    fn test_monitor_config_mapping() {
        let device = DeviceConfig {
            address: 7,
            invert_current: true,
            ..Default::default()
        };
        let monitor = device.monitor_config();
        assert_eq!(monitor.address, 7);
        assert!(monitor.invert_current);
        assert_eq!(device.cycle_interval(), Duration::from_millis(20));
    }
}
