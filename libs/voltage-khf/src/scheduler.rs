//! Poll scheduler
//!
//! Two independent timers: settings are requested every 30 s, status every
//! 10 s. A timer fires when it has never fired or when at least one interval
//! has elapsed since it last fired. Both may fire in the same cycle, settings
//! first.

use serde::{Deserialize, Serialize};

use crate::dispatcher::MessageKind;

/// Default settings request interval (ms)
pub const DEFAULT_SETTINGS_INTERVAL_MS: u64 = 30_000;

/// Default status request interval (ms)
pub const DEFAULT_STATUS_INTERVAL_MS: u64 = 10_000;

/// Fixed-interval timer driven by an external monotonic clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollTimer {
    interval_ms: u64,
    last_fired_ms: Option<u64>,
}

impl PollTimer {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_fired_ms: None,
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    pub fn last_fired_ms(&self) -> Option<u64> {
        self.last_fired_ms
    }

    pub fn is_due(&self, now_ms: u64) -> bool {
        match self.last_fired_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.interval_ms,
        }
    }

    /// Fire if due, recording `now_ms` as the last firing time
    pub fn poll(&mut self, now_ms: u64) -> bool {
        if self.is_due(now_ms) {
            self.last_fired_ms = Some(now_ms);
            true
        } else {
            false
        }
    }
}

/// Settings and status request timers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollScheduler {
    settings: PollTimer,
    status: PollTimer,
}

impl Default for PollScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_SETTINGS_INTERVAL_MS, DEFAULT_STATUS_INTERVAL_MS)
    }
}

impl PollScheduler {
    pub fn new(settings_interval_ms: u64, status_interval_ms: u64) -> Self {
        Self {
            settings: PollTimer::new(settings_interval_ms),
            status: PollTimer::new(status_interval_ms),
        }
    }

    /// Requests due at `now_ms`, in emission order
    pub fn poll(&mut self, now_ms: u64) -> Vec<MessageKind> {
        let mut due = Vec::with_capacity(2);
        if self.settings.poll(now_ms) {
            due.push(MessageKind::Settings);
        }
        if self.status.poll(now_ms) {
            due.push(MessageKind::Status);
        }
        due
    }

    pub fn last_settings_request(&self) -> Option<u64> {
        self.settings.last_fired_ms()
    }

    pub fn last_status_request(&self) -> Option<u64> {
        self.status.last_fired_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_fires_immediately_then_waits() {
        let mut timer = PollTimer::new(10);
        assert!(timer.poll(5));
        assert!(!timer.poll(5));
        assert!(!timer.poll(14));
        assert!(timer.poll(15));
        assert_eq!(timer.last_fired_ms(), Some(15));
    }

    #[test]
    fn test_timer_measures_from_last_fire() {
        let mut timer = PollTimer::new(10);
        assert!(timer.poll(0));
        // Late cycle: the next deadline moves with it
        assert!(timer.poll(17));
        assert!(!timer.poll(26));
        assert!(timer.poll(27));
    }

    #[test]
    fn test_first_cycle_fires_both_settings_first() {
        let mut scheduler = PollScheduler::default();
        assert_eq!(
            scheduler.poll(0),
            vec![MessageKind::Settings, MessageKind::Status]
        );
        assert_eq!(scheduler.last_settings_request(), Some(0));
        assert_eq!(scheduler.last_status_request(), Some(0));
    }

    #[test]
    fn test_default_cadence() {
        let mut scheduler = PollScheduler::default();
        let mut settings = Vec::new();
        let mut status = Vec::new();
        for now in (0..=60_000).step_by(1_000) {
            for kind in scheduler.poll(now) {
                match kind {
                    MessageKind::Settings => settings.push(now),
                    MessageKind::Status => status.push(now),
                }
            }
        }
        assert_eq!(settings, vec![0, 30_000, 60_000]);
        assert_eq!(
            status,
            vec![0, 10_000, 20_000, 30_000, 40_000, 50_000, 60_000]
        );
    }

    #[test]
    fn test_irregular_cycles_respect_minimum_spacing() {
        let mut scheduler = PollScheduler::new(30, 10);
        let mut last_settings: Option<u64> = None;
        let mut last_status: Option<u64> = None;
        let mut now = 0u64;

        for step in [1u64, 7, 3, 13, 2, 9, 21, 4, 4, 4, 31, 1, 6, 11, 5] {
            now += step;
            for kind in scheduler.poll(now) {
                let last = match kind {
                    MessageKind::Settings => &mut last_settings,
                    MessageKind::Status => &mut last_status,
                };
                let min = if kind == MessageKind::Settings { 30 } else { 10 };
                if let Some(prev) = *last {
                    assert!(now - prev >= min, "{:?} fired after {} ms", kind, now - prev);
                }
                *last = Some(now);
            }
        }
    }
}
