//! Error handling for the shunt service

use thiserror::Error;
use voltage_khf::KhfError;

/// Shunt Service Error Type
#[derive(Error, Debug, Clone)]
pub enum ShuntSrvError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Serial port open/read/write errors
    #[error("Serial error: {0}")]
    SerialError(String),

    /// Logging setup errors
    #[error("Logging error: {0}")]
    LoggingError(String),

    /// Input/Output operation errors
    #[error("IO error: {0}")]
    IoError(String),

    /// Task or runtime failures
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Result type alias for the shunt service
pub type Result<T> = std::result::Result<T, ShuntSrvError>;

impl From<std::io::Error> for ShuntSrvError {
    fn from(err: std::io::Error) -> Self {
        ShuntSrvError::IoError(err.to_string())
    }
}

impl From<tokio_serial::Error> for ShuntSrvError {
    fn from(err: tokio_serial::Error) -> Self {
        ShuntSrvError::SerialError(err.to_string())
    }
}

impl From<common::Error> for ShuntSrvError {
    fn from(err: common::Error) -> Self {
        match err {
            common::Error::Config(msg) => ShuntSrvError::ConfigError(msg),
            common::Error::Logging(msg) => ShuntSrvError::LoggingError(msg),
            common::Error::Io(e) => ShuntSrvError::IoError(e.to_string()),
        }
    }
}

impl From<KhfError> for ShuntSrvError {
    fn from(err: KhfError) -> Self {
        match err {
            KhfError::Config(msg) => ShuntSrvError::ConfigError(msg),
            other => ShuntSrvError::SerialError(other.to_string()),
        }
    }
}
