//! Polling task lifecycle
//!
//! ```text
//! ┌───────────────┐     ┌──────────────────────┐
//! │ interval.tick │────▶│ pump serial input    │
//! └───────────────┘     │ monitor.run_cycle()  │
//!         ▲             └──────────────────────┘
//!         └──────────────────────┘
//! cancelled ──────▶ close link ──▶ PollingExit::Cancelled
//! link closed ────▶ close link ──▶ PollingExit::LinkLost
//! ```

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};
use voltage_khf::{LineOutcome, MonotonicClock, ProtocolStats, ShuntMonitor};

use crate::readings::ReadingStore;
use crate::transport::SerialLink;

/// Why the polling task stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollingExit {
    /// Cancelled through the returned token
    Cancelled,
    /// The serial reader or writer gave up on the stream
    LinkLost,
}

/// Final state handed back by the polling task
#[derive(Debug)]
pub struct PollingOutcome {
    pub monitor: ShuntMonitor,
    pub exit: PollingExit,
}

/// Start the scheduling loop
///
/// # Returns
///
/// - `JoinHandle<PollingOutcome>` - resolves to the monitor and exit reason once stopped
/// - `CancellationToken` - cancel to stop the loop
pub fn start_polling_task(
    mut monitor: ShuntMonitor,
    mut link: SerialLink,
    cycle_interval: Duration,
) -> (JoinHandle<PollingOutcome>, CancellationToken) {
    let token = CancellationToken::new();
    let task_token = token.clone();
    let link_closed = link.closed_token();

    let handle = tokio::spawn(async move {
        let clock = MonotonicClock::new();
        let mut interval = tokio::time::interval(cycle_interval);
        debug!("Polling task started ({:?} cycle)", cycle_interval);

        let exit = loop {
            tokio::select! {
                _ = interval.tick() => {
                    link.input.pump();
                    let report = monitor.run_cycle(&clock, &mut link.input, &mut link.output);
                    match report.line {
                        Some(LineOutcome::Status { published }) => {
                            trace!("Status published {} values", published);
                        },
                        Some(LineOutcome::Settings { published }) => {
                            trace!("Settings published {} values", published);
                        },
                        Some(LineOutcome::Discarded(_)) | None => {},
                    }
                }
                () = task_token.cancelled() => {
                    info!("Polling task received cancellation signal, shutting down");
                    break PollingExit::Cancelled;
                }
                () = link_closed.cancelled() => {
                    error!("Serial link lost, polling stopped");
                    break PollingExit::LinkLost;
                }
            }
        };

        link.shutdown();
        PollingOutcome { monitor, exit }
    });

    (handle, token)
}

/// Log counters and the latest readings
pub fn log_summary(stats: &ProtocolStats, store: &ReadingStore) {
    info!(
        "Protocol stats: lines={}, status={}, settings={}, filtered={}, checksum_failures={}, malformed={}, unrecognized={}, requests={}, request_failures={}",
        stats.lines_received,
        stats.status_accepted,
        stats.settings_accepted,
        stats.address_filtered,
        stats.checksum_failures,
        stats.malformed,
        stats.unrecognized,
        stats.requests_sent,
        stats.request_failures
    );

    if store.is_empty() {
        info!("No readings received");
        return;
    }
    match store.to_json() {
        Ok(json) => info!("Latest readings:\n{}", json),
        Err(e) => warn!("Failed to serialize readings: {}", e),
    }
}
