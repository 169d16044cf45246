//! Status message (`r50`) decoding
//!
//! Reference frame from a KH-F module:
//!
//! ```text
//! :r50=1,46,5319,396,254929,25304424,26717081,91107,122,0,99,0,3877,100,101,0,
//!      │ │  │    │   │      │        │        │     │   │ │  │ │    │   │   └ time
//!      │ │  │    │   │      │        │        │     │   │ │  │ │    │   └ date
//!      │ │  │    │   │      │        │        │     │   │ │  │ │    └ time adjustment
//!      │ │  │    │   │      │        │        │     │   │ │  │ └ remaining time (min)
//!      │ │  │    │   │      │        │        │     │   │ │  └ current direction
//!      │ │  │    │   │      │        │        │     │   │ └ output status
//!      │ │  │    │   │      │        │        │     │   └ reserved
//!      │ │  │    │   │      │        │        │     └ temperature + 100
//!      │ │  │    │   │      │        │        └ runtime (s)
//!      │ │  │    │   │      │        └ charged energy (1e-5 kWh)
//!      │ │  │    │   │      └ discharged energy (1e-5 kWh)
//!      │ │  │    │   └ remaining capacity (mAh)
//!      │ │  │    └ current (10 mA)
//!      │ │  └ voltage (10 mV)
//!      │ └ checksum
//!      └ address
//! ```

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;
use crate::measurement::Measurement;
use crate::tokenizer::TokenCursor;

/// Fields following the checksum in a status message
pub const STATUS_FIELD_COUNT: usize = 14;

/// Raw direction flag reported while discharging
pub const DIRECTION_DISCHARGING: i64 = 0;

/// Live telemetry with physical units applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    /// Battery voltage (V)
    pub voltage: f64,
    /// Current magnitude as reported (A), see [`StatusRecord::signed_current`]
    pub current: f64,
    /// Remaining capacity (Ah)
    pub remaining_ah: f64,
    /// Cumulative discharged energy (kWh)
    pub discharged_kwh: f64,
    /// Cumulative charged energy (kWh)
    pub charged_kwh: f64,
    /// Elapsed runtime (s)
    pub runtime_seconds: i64,
    /// Temperature (°C)
    pub temperature: f64,
    pub reserved: i64,
    pub output_status: i64,
    /// 0 = discharging, 1 = charging
    pub current_direction: i64,
    /// Estimated remaining time (min)
    pub remaining_time_minutes: i64,
    pub time_adjustment: i64,
    pub date: i64,
    pub time: i64,
}

impl StatusRecord {
    /// Decode the fields after the checksum, aborting on the first bad field
    pub fn decode(cursor: &mut TokenCursor<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            voltage: cursor.next_field("voltage")? as f64 / 100.0,
            current: cursor.next_field("current")? as f64 / 100.0,
            remaining_ah: cursor.next_field("remaining_ah")? as f64 / 1000.0,
            discharged_kwh: cursor.next_field("discharged_kwh")? as f64 / 100_000.0,
            charged_kwh: cursor.next_field("charged_kwh")? as f64 / 100_000.0,
            runtime_seconds: cursor.next_field("runtime_seconds")?,
            temperature: cursor.next_field("temperature")? as f64 - 100.0,
            reserved: cursor.next_field("reserved")?,
            output_status: cursor.next_field("output_status")?,
            current_direction: cursor.next_field("current_direction")?,
            remaining_time_minutes: cursor.next_field("remaining_time_minutes")?,
            time_adjustment: cursor.next_field("time_adjustment")?,
            date: cursor.next_field("date")?,
            time: cursor.next_field("time")?,
        })
    }

    pub fn is_charging(&self) -> bool {
        self.current_direction != DIRECTION_DISCHARGING
    }

    /// Current with sign: negative while discharging, flipped again for a
    /// shunt wired in reverse.
    pub fn signed_current(&self, invert_current: bool) -> f64 {
        let current = if self.is_charging() {
            self.current
        } else {
            -self.current
        };
        if invert_current {
            -current
        } else {
            current
        }
    }

    /// Power (W), recomputed from voltage and signed current
    pub fn power(&self, invert_current: bool) -> f64 {
        self.voltage * self.signed_current(invert_current)
    }

    /// State of charge (%) against a known battery capacity
    pub fn state_of_charge(&self, battery_capacity_ah: Option<f64>) -> Option<f64> {
        battery_capacity_ah
            .filter(|capacity| *capacity > 0.0)
            .map(|capacity| self.remaining_ah * 100.0 / capacity)
    }

    /// Publishable values. State of charge is left out while the capacity is
    /// unknown.
    pub fn measurements(
        &self,
        invert_current: bool,
        battery_capacity_ah: Option<f64>,
    ) -> Vec<(Measurement, f64)> {
        let mut values = vec![
            (Measurement::Voltage, self.voltage),
            (Measurement::Current, self.signed_current(invert_current)),
            (Measurement::Power, self.power(invert_current)),
        ];
        if let Some(soc) = self.state_of_charge(battery_capacity_ah) {
            values.push((Measurement::BatteryLevel, soc));
        }
        values.extend([
            (Measurement::RemainingAh, self.remaining_ah),
            (Measurement::DischargedKwh, self.discharged_kwh),
            (Measurement::ChargedKwh, self.charged_kwh),
            (Measurement::RuntimeSeconds, self.runtime_seconds as f64),
            (Measurement::Temperature, self.temperature),
            (Measurement::OutputStatus, self.output_status as f64),
            (Measurement::CurrentDirection, self.current_direction as f64),
            (
                Measurement::RemainingTimeMinutes,
                self.remaining_time_minutes as f64,
            ),
            (Measurement::TimeAdjustment, self.time_adjustment as f64),
            (Measurement::Date, self.date as f64),
            (Measurement::Time, self.time as f64),
        ]);
        values
    }
}
