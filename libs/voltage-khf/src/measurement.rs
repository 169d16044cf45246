//! Publishable measurements and their sinks
//!
//! Every quantity the monitor can publish is a [`Measurement`]. Downstream
//! consumers register a publish function per measurement in [`Sinks`];
//! measurements without a registered function are decoded but never emitted.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Named physical quantities decoded from KH-F messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measurement {
    // Status (r50)
    Voltage,
    Current,
    Power,
    BatteryLevel,
    RemainingAh,
    DischargedKwh,
    ChargedKwh,
    RuntimeSeconds,
    Temperature,
    OutputStatus,
    CurrentDirection,
    RemainingTimeMinutes,
    TimeAdjustment,
    Date,
    Time,

    // Settings (r51)
    BatteryCapacityAh,
    Soc100Voltage,
    Soc0Voltage,
    OverVoltageProtection,
    UnderVoltageProtection,
    OverDischargeCurrentProtection,
    OverChargeCurrentProtection,
    OverPowerProtection,
    OverTemperatureProtection,
    UnderTemperatureProtection,
    ProtectionRecoveryTime,
    ProtectionDelayTime,
    VoltageCalibration,
    CurrentCalibration,
    TemperatureCalibration,
    RelayMode,
    CurrentMultiplier,
    TimeCalibration,
    DataLogging,
    FullChargeCurrentPercent,
    MonitoringTimeMinutes,
    TemperatureUnit,
    BluetoothPassword,
    DataLoggingInterval,
}

impl Measurement {
    pub const ALL: [Measurement; 39] = [
        Measurement::Voltage,
        Measurement::Current,
        Measurement::Power,
        Measurement::BatteryLevel,
        Measurement::RemainingAh,
        Measurement::DischargedKwh,
        Measurement::ChargedKwh,
        Measurement::RuntimeSeconds,
        Measurement::Temperature,
        Measurement::OutputStatus,
        Measurement::CurrentDirection,
        Measurement::RemainingTimeMinutes,
        Measurement::TimeAdjustment,
        Measurement::Date,
        Measurement::Time,
        Measurement::BatteryCapacityAh,
        Measurement::Soc100Voltage,
        Measurement::Soc0Voltage,
        Measurement::OverVoltageProtection,
        Measurement::UnderVoltageProtection,
        Measurement::OverDischargeCurrentProtection,
        Measurement::OverChargeCurrentProtection,
        Measurement::OverPowerProtection,
        Measurement::OverTemperatureProtection,
        Measurement::UnderTemperatureProtection,
        Measurement::ProtectionRecoveryTime,
        Measurement::ProtectionDelayTime,
        Measurement::VoltageCalibration,
        Measurement::CurrentCalibration,
        Measurement::TemperatureCalibration,
        Measurement::RelayMode,
        Measurement::CurrentMultiplier,
        Measurement::TimeCalibration,
        Measurement::DataLogging,
        Measurement::FullChargeCurrentPercent,
        Measurement::MonitoringTimeMinutes,
        Measurement::TemperatureUnit,
        Measurement::BluetoothPassword,
        Measurement::DataLoggingInterval,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Measurement::Voltage => "voltage",
            Measurement::Current => "current",
            Measurement::Power => "power",
            Measurement::BatteryLevel => "battery_level",
            Measurement::RemainingAh => "remaining_ah",
            Measurement::DischargedKwh => "discharged_kwh",
            Measurement::ChargedKwh => "charged_kwh",
            Measurement::RuntimeSeconds => "runtime_seconds",
            Measurement::Temperature => "temperature",
            Measurement::OutputStatus => "output_status",
            Measurement::CurrentDirection => "current_direction",
            Measurement::RemainingTimeMinutes => "remaining_time_minutes",
            Measurement::TimeAdjustment => "time_adjustment",
            Measurement::Date => "date",
            Measurement::Time => "time",
            Measurement::BatteryCapacityAh => "battery_capacity_ah",
            Measurement::Soc100Voltage => "soc100_voltage",
            Measurement::Soc0Voltage => "soc0_voltage",
            Measurement::OverVoltageProtection => "over_voltage_protection",
            Measurement::UnderVoltageProtection => "under_voltage_protection",
            Measurement::OverDischargeCurrentProtection => "over_discharge_current_protection",
            Measurement::OverChargeCurrentProtection => "over_charge_current_protection",
            Measurement::OverPowerProtection => "over_power_protection",
            Measurement::OverTemperatureProtection => "over_temperature_protection",
            Measurement::UnderTemperatureProtection => "under_temperature_protection",
            Measurement::ProtectionRecoveryTime => "protection_recovery_time",
            Measurement::ProtectionDelayTime => "protection_delay_time",
            Measurement::VoltageCalibration => "voltage_calibration",
            Measurement::CurrentCalibration => "current_calibration",
            Measurement::TemperatureCalibration => "temperature_calibration",
            Measurement::RelayMode => "relay_mode",
            Measurement::CurrentMultiplier => "current_multiplier",
            Measurement::TimeCalibration => "time_calibration",
            Measurement::DataLogging => "data_logging",
            Measurement::FullChargeCurrentPercent => "full_charge_current_percent",
            Measurement::MonitoringTimeMinutes => "monitoring_time_minutes",
            Measurement::TemperatureUnit => "temperature_unit",
            Measurement::BluetoothPassword => "bluetooth_password",
            Measurement::DataLoggingInterval => "data_logging_interval",
        }
    }

    /// Unit of measurement, empty for plain counters and flags
    pub fn unit(&self) -> &'static str {
        match self {
            Measurement::Voltage
            | Measurement::Soc100Voltage
            | Measurement::Soc0Voltage
            | Measurement::OverVoltageProtection
            | Measurement::UnderVoltageProtection => "V",
            Measurement::Current
            | Measurement::OverDischargeCurrentProtection
            | Measurement::OverChargeCurrentProtection => "A",
            Measurement::Power | Measurement::OverPowerProtection => "W",
            Measurement::BatteryLevel | Measurement::FullChargeCurrentPercent => "%",
            Measurement::RemainingAh | Measurement::BatteryCapacityAh => "Ah",
            Measurement::DischargedKwh | Measurement::ChargedKwh => "kWh",
            Measurement::RuntimeSeconds
            | Measurement::ProtectionRecoveryTime
            | Measurement::ProtectionDelayTime => "s",
            Measurement::RemainingTimeMinutes | Measurement::MonitoringTimeMinutes => "min",
            Measurement::Temperature
            | Measurement::OverTemperatureProtection
            | Measurement::UnderTemperatureProtection
            | Measurement::TemperatureCalibration => "°C",
            Measurement::OutputStatus
            | Measurement::CurrentDirection
            | Measurement::TimeAdjustment
            | Measurement::Date
            | Measurement::Time
            | Measurement::VoltageCalibration
            | Measurement::CurrentCalibration
            | Measurement::RelayMode
            | Measurement::CurrentMultiplier
            | Measurement::TimeCalibration
            | Measurement::DataLogging
            | Measurement::TemperatureUnit
            | Measurement::BluetoothPassword
            | Measurement::DataLoggingInterval => "",
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Measurement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Measurement::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("Unknown measurement: {}", s))
    }
}

/// Publish function for one measurement
pub type PublishFn = Box<dyn FnMut(f64) + Send>;

/// Capability set: measurement name → optional publish function
#[derive(Default)]
pub struct Sinks {
    sinks: HashMap<Measurement, PublishFn>,
}

impl Sinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the publish function for a measurement
    pub fn register<F>(&mut self, measurement: Measurement, publish: F)
    where
        F: FnMut(f64) + Send + 'static,
    {
        self.sinks.insert(measurement, Box::new(publish));
    }

    pub fn with<F>(mut self, measurement: Measurement, publish: F) -> Self
    where
        F: FnMut(f64) + Send + 'static,
    {
        self.register(measurement, publish);
        self
    }

    pub fn is_configured(&self, measurement: Measurement) -> bool {
        self.sinks.contains_key(&measurement)
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Hand a value to its sink. Returns `false` when none is registered.
    pub fn publish(&mut self, measurement: Measurement, value: f64) -> bool {
        match self.sinks.get_mut(&measurement) {
            Some(publish) => {
                publish(value);
                true
            },
            None => false,
        }
    }
}

impl fmt::Debug for Sinks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut configured: Vec<_> = self.sinks.keys().map(Measurement::as_str).collect();
        configured.sort_unstable();
        f.debug_struct("Sinks")
            .field("configured", &configured)
            .finish()
    }
}
