//! Shunt monitor
//!
//! Runs one cooperative scheduling cycle at a time:
//!
//! ```text
//! ┌──────────────────┐   ┌──────────────────┐   ┌──────────────────┐
//! │ PollScheduler    │──▶│ LineFramer       │──▶│ dispatch_line    │
//! │ emit :R51 / :R50 │   │ drain available  │   │ address/checksum │
//! └──────────────────┘   │ bytes, ≤ 1 line  │   │ decode, publish  │
//!                        └──────────────────┘   └──────────────────┘
//! ```
//!
//! Nothing in a cycle blocks. A line that fails any gate is dropped and the
//! next cycle starts clean; only the partial line in the framer and the
//! session state carry over.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::dispatcher::{dispatch_line, Message, MessageKind};
use crate::error::{DecodeError, KhfError, Result};
use crate::framer::LineFramer;
use crate::measurement::{Measurement, Sinks};
use crate::scheduler::{PollScheduler, DEFAULT_SETTINGS_INTERVAL_MS, DEFAULT_STATUS_INTERVAL_MS};
use crate::session::SessionState;
use crate::settings::SettingsRecord;
use crate::status::StatusRecord;
use crate::traits::{ByteSource, Clock, RequestSink};

/// Device-facing settings of a monitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Bus address of the shunt (1..=255)
    pub address: u8,
    /// Flip the current sign for a shunt wired in reverse
    pub invert_current: bool,
    pub settings_interval_ms: u64,
    pub status_interval_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            address: 1,
            invert_current: false,
            settings_interval_ms: DEFAULT_SETTINGS_INTERVAL_MS,
            status_interval_ms: DEFAULT_STATUS_INTERVAL_MS,
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.address == 0 {
            return Err(KhfError::config("Address must be between 1 and 255"));
        }
        if self.settings_interval_ms == 0 || self.status_interval_ms == 0 {
            return Err(KhfError::config("Poll intervals must be greater than zero"));
        }
        Ok(())
    }
}

/// Protocol counters since the monitor was created
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolStats {
    pub lines_received: u64,
    pub status_accepted: u64,
    pub settings_accepted: u64,
    pub address_filtered: u64,
    pub checksum_failures: u64,
    pub malformed: u64,
    pub unrecognized: u64,
    pub requests_sent: u64,
    pub request_failures: u64,
}

/// What happened to the line completed in a cycle
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    Status { published: usize },
    Settings { published: usize },
    Discarded(DecodeError),
}

/// Summary of one scheduling cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    /// Requests emitted, in order
    pub requests: Vec<MessageKind>,
    /// Outcome of the line completed this cycle, if any
    pub line: Option<LineOutcome>,
}

/// Request/response driver for one KH-F shunt
pub struct ShuntMonitor {
    config: MonitorConfig,
    framer: LineFramer,
    session: SessionState,
    sinks: Sinks,
    stats: ProtocolStats,
}

impl ShuntMonitor {
    pub fn new(config: MonitorConfig, sinks: Sinks) -> Self {
        let scheduler = PollScheduler::new(config.settings_interval_ms, config.status_interval_ms);
        Self {
            config,
            framer: LineFramer::new(),
            session: SessionState::new(scheduler),
            sinks,
            stats: ProtocolStats::default(),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn stats(&self) -> &ProtocolStats {
        &self.stats
    }

    /// Run one cycle using the given clock
    pub fn run_cycle<S, W, C>(&mut self, clock: &C, source: &mut S, sink: &mut W) -> CycleReport
    where
        S: ByteSource + ?Sized,
        W: RequestSink + ?Sized,
        C: Clock + ?Sized,
    {
        self.run_cycle_at(clock.now_ms(), source, sink)
    }

    /// Run one cycle at an explicit monotonic time
    pub fn run_cycle_at<S, W>(&mut self, now_ms: u64, source: &mut S, sink: &mut W) -> CycleReport
    where
        S: ByteSource + ?Sized,
        W: RequestSink + ?Sized,
    {
        let requests = self.send_due_requests(now_ms, sink);
        let line = if self.framer.read_line(source) {
            Some(self.handle_line())
        } else {
            None
        };
        CycleReport { requests, line }
    }

    fn send_due_requests<W>(&mut self, now_ms: u64, sink: &mut W) -> Vec<MessageKind>
    where
        W: RequestSink + ?Sized,
    {
        let due = self.session.scheduler_mut().poll(now_ms);
        for kind in &due {
            let frame = kind.request_frame(self.config.address);
            match sink.write_request(&frame) {
                Ok(()) => {
                    self.stats.requests_sent += 1;
                    trace!(request = frame.trim_end(), "sent");
                },
                Err(e) => {
                    self.stats.request_failures += 1;
                    warn!("Failed to send {:?} request: {}", kind, e);
                },
            }
        }
        due
    }

    fn handle_line(&mut self) -> LineOutcome {
        self.stats.lines_received += 1;
        match dispatch_line(self.framer.line(), self.config.address) {
            Ok(Message::Status(record)) => self.apply_status(&record),
            Ok(Message::Settings(record)) => self.apply_settings(&record),
            Err(err) => {
                let line = String::from_utf8_lossy(self.framer.line());
                match &err {
                    DecodeError::AddressMismatch { .. } => {
                        self.stats.address_filtered += 1;
                        trace!("Ignoring line for another device: {}", line);
                    },
                    DecodeError::UnrecognizedLine => {
                        self.stats.unrecognized += 1;
                        trace!("Ignoring unrecognized line: {}", line);
                    },
                    DecodeError::ChecksumMismatch { .. } => {
                        self.stats.checksum_failures += 1;
                        debug!("Dropping line ({}): {}", err, line);
                    },
                    DecodeError::MalformedField { .. } => {
                        self.stats.malformed += 1;
                        debug!("Dropping line ({}): {}", err, line);
                    },
                }
                LineOutcome::Discarded(err)
            },
        }
    }

    fn apply_status(&mut self, record: &StatusRecord) -> LineOutcome {
        self.stats.status_accepted += 1;
        debug!(
            voltage = record.voltage,
            current = record.signed_current(self.config.invert_current),
            remaining_ah = record.remaining_ah,
            temperature = record.temperature,
            "Status received"
        );
        let values = record.measurements(
            self.config.invert_current,
            self.session.battery_capacity_ah(),
        );
        LineOutcome::Status {
            published: self.publish_all(values),
        }
    }

    fn apply_settings(&mut self, record: &SettingsRecord) -> LineOutcome {
        self.stats.settings_accepted += 1;
        self.session.set_battery_capacity_ah(record.battery_capacity_ah);
        debug!(
            battery_capacity_ah = record.battery_capacity_ah,
            soc100_voltage = record.soc100_voltage,
            soc0_voltage = record.soc0_voltage,
            "Settings received"
        );
        LineOutcome::Settings {
            published: self.publish_all(record.measurements()),
        }
    }

    fn publish_all(&mut self, values: Vec<(Measurement, f64)>) -> usize {
        values
            .into_iter()
            .filter(|(measurement, value)| self.sinks.publish(*measurement, *value))
            .count()
    }
}

impl std::fmt::Debug for ShuntMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShuntMonitor")
            .field("config", &self.config)
            .field("session", &self.session)
            .field("sinks", &self.sinks)
            .field("stats", &self.stats)
            .finish()
    }
}
