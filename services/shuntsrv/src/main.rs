//! Shunt Service
//!
//! Polls a Junctek KH-F battery shunt and logs its readings.

use clap::Parser;
use tracing::info;
use voltage_khf::ShuntMonitor;

use shuntsrv::{
    bootstrap::{self, Args},
    build_sinks, log_summary, start_polling_task, PollingExit, ReadingStore, SerialLink,
    ShuntSrvError,
};

#[tokio::main]
async fn main() -> Result<(), ShuntSrvError> {
    let args = Args::parse();
    let config = bootstrap::load_configuration(&args)?;
    bootstrap::initialize_logging(&args, &config)?;

    info!("shuntsrv v{} starting", env!("CARGO_PKG_VERSION"));
    bootstrap::log_configuration(&config);

    // Validation mode: validate and exit
    if args.validate {
        info!("Validation completed successfully");
        return Ok(());
    }

    let store = ReadingStore::new();
    let sinks = build_sinks(&config.sensors, &store);
    let monitor = ShuntMonitor::new(config.device.monitor_config(), sinks);
    let link = SerialLink::open(&config.serial)?;

    let (mut handle, token) = start_polling_task(monitor, link, config.device.cycle_interval());

    let joined = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Shutdown signal received");
            token.cancel();
            (&mut handle).await
        }
        joined = &mut handle => joined,
    };
    let outcome =
        joined.map_err(|e| ShuntSrvError::InternalError(format!("Polling task failed: {}", e)))?;
    log_summary(outcome.monitor.stats(), &store);

    match outcome.exit {
        PollingExit::Cancelled => {
            info!("shuntsrv stopped");
            Ok(())
        },
        PollingExit::LinkLost => Err(ShuntSrvError::SerialError(format!(
            "Serial link to {} lost",
            config.serial.port
        ))),
    }
}
