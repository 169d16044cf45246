//! Shunt Service (`shuntsrv`)
//!
//! Polls one Junctek KH-F battery shunt over a serial port and keeps the
//! latest decoded readings.
//!
//! - `bootstrap`: command line, configuration and logging setup
//! - `config`: layered service configuration
//! - `transport`: serial link adapted to the protocol collaborator traits
//! - `runtime`: the polling task
//! - `readings`: latest-readings store and publish functions

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod readings;
pub mod runtime;
pub mod transport;

pub use config::ShuntSrvConfig;
pub use error::{Result, ShuntSrvError};
pub use readings::{build_sinks, Reading, ReadingStore};
pub use runtime::{log_summary, start_polling_task, PollingExit, PollingOutcome};
pub use transport::SerialLink;
