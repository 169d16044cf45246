//! Junctek KH-F Shunt Monitor Protocol
//!
//! Decoding and polling for the ASCII telemetry protocol spoken by Junctek
//! KH-F battery shunts over UART/RS485.
//!
//! # Architecture
//!
//! - **Tokenizer**: `TokenCursor` extracts one delimited integer at a time
//! - **Checksum**: `(sum of tail fields % 255) + 1`
//! - **Framer**: `LineFramer` turns a byte stream into CR-terminated lines
//! - **Dispatcher**: routes `:r50=` / `:r51=` lines to the record decoders
//! - **Records**: `StatusRecord` (live telemetry), `SettingsRecord` (configuration)
//! - **Scheduler**: `PollScheduler` emits `:R51=` / `:R50=` requests on fixed intervals
//! - **Monitor**: `ShuntMonitor` ties it together in one non-blocking cycle
//!
//! The crate performs no I/O itself. Byte input, request output and time come
//! in through the traits in [`traits`].

pub mod checksum;
pub mod dispatcher;
pub mod error;
pub mod framer;
pub mod measurement;
pub mod monitor;
pub mod scheduler;
pub mod session;
pub mod settings;
pub mod status;
pub mod tokenizer;
pub mod traits;

// Re-export core types
pub use dispatcher::{dispatch_line, Message, MessageKind, RawMessage};
pub use error::{DecodeError, KhfError, Result};
pub use framer::{LineFramer, MAX_LINE_LEN};
pub use measurement::{Measurement, PublishFn, Sinks};
pub use monitor::{CycleReport, LineOutcome, MonitorConfig, ProtocolStats, ShuntMonitor};
pub use scheduler::{PollScheduler, PollTimer};
pub use session::SessionState;
pub use settings::SettingsRecord;
pub use status::StatusRecord;
pub use tokenizer::TokenCursor;
pub use traits::{ByteSource, Clock, MonotonicClock, RequestSink};
