//! Shared service plumbing
//!
//! - logging initialisation (console + optional daily file)
//! - layered configuration loading

pub mod config_loader;
pub mod error;
pub mod logging;

pub use config_loader::ConfigLoader;
pub use error::{Error, Result};
pub use logging::LogConfig;
