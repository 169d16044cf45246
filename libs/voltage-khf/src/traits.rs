//! Collaborator traits
//!
//! The protocol core never touches the UART directly. The service adapts its
//! serial link to these traits; tests use the in-memory implementations below.

use std::collections::VecDeque;
use std::time::Instant;

use crate::error::Result;

/// Non-blocking byte input
pub trait ByteSource {
    /// Whether at least one byte can be read without waiting
    fn available(&self) -> bool;

    /// Read one byte, `None` when nothing is buffered
    fn read(&mut self) -> Option<u8>;
}

/// Outbound request channel
pub trait RequestSink {
    /// Write one complete request frame
    fn write_request(&mut self, frame: &str) -> Result<()>;
}

/// Monotonic millisecond clock
pub trait Clock {
    fn now_ms(&self) -> u64;
}

impl ByteSource for VecDeque<u8> {
    fn available(&self) -> bool {
        !self.is_empty()
    }

    fn read(&mut self) -> Option<u8> {
        self.pop_front()
    }
}

impl RequestSink for Vec<String> {
    fn write_request(&mut self, frame: &str) -> Result<()> {
        self.push(frame.to_string());
        Ok(())
    }
}

/// Clock measuring milliseconds since its creation
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}
