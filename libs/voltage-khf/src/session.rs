//! Connection-lifetime state shared between polling and decoding

use serde::{Deserialize, Serialize};

use crate::scheduler::PollScheduler;

/// State carried across scheduling cycles
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Set by each accepted settings message, read by status decoding
    battery_capacity_ah: Option<f64>,
    scheduler: PollScheduler,
}

impl SessionState {
    pub fn new(scheduler: PollScheduler) -> Self {
        Self {
            battery_capacity_ah: None,
            scheduler,
        }
    }

    pub fn battery_capacity_ah(&self) -> Option<f64> {
        self.battery_capacity_ah
    }

    pub fn set_battery_capacity_ah(&mut self, capacity: f64) {
        self.battery_capacity_ah = Some(capacity);
    }

    pub fn scheduler(&self) -> &PollScheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut PollScheduler {
        &mut self.scheduler
    }

    pub fn last_status_request(&self) -> Option<u64> {
        self.scheduler.last_status_request()
    }

    pub fn last_settings_request(&self) -> Option<u64> {
        self.scheduler.last_settings_request()
    }
}
