//! Settings message (`r51`) decoding
//!
//! Carries protection thresholds, calibration and battery parameters. The
//! battery capacity is cached in the session and used by status decoding to
//! derive state of charge.
//!
//! Reference frame:
//!
//! ```text
//! :r51=1,65,0,0,0,0,0,255,0,0,2800,100,100,95,0,0,1,100,0,2752,2450,2,20,255,0,0,59,0,
//! ```

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;
use crate::measurement::Measurement;
use crate::tokenizer::TokenCursor;

/// Fields following the checksum in a settings message
pub const SETTINGS_FIELD_COUNT: usize = 26;

/// Device configuration with physical units applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsRecord {
    /// Over-voltage protection threshold (V)
    pub over_voltage_protection: f64,
    /// Under-voltage protection threshold (V)
    pub under_voltage_protection: f64,
    /// Over-discharge-current protection threshold (A)
    pub over_discharge_current_protection: f64,
    /// Over-charge-current protection threshold (A)
    pub over_charge_current_protection: f64,
    /// Over-power protection threshold (W)
    pub over_power_protection: f64,
    /// Over-temperature protection threshold (°C)
    pub over_temperature_protection: f64,
    pub protection_recovery_time_seconds: i64,
    pub protection_delay_time_seconds: i64,
    /// Battery capacity (Ah)
    pub battery_capacity_ah: f64,
    pub voltage_calibration: i64,
    pub current_calibration: i64,
    /// Temperature calibration offset (°C)
    pub temperature_calibration: f64,
    /// Undocumented slot, kept for checksum accounting only
    pub reserved_1: i64,
    /// 0 = normally open, 1 = normally closed
    pub relay_mode: i64,
    pub current_multiplier: i64,
    pub time_calibration: i64,
    /// 0 = enabled, 1 = disabled
    pub data_logging: i64,
    /// Voltage treated as 100 % state of charge (V)
    pub soc100_voltage: f64,
    /// Voltage treated as 0 % state of charge (V)
    pub soc0_voltage: f64,
    pub full_charge_current_percent: i64,
    pub monitoring_time_minutes: f64,
    /// Under-temperature protection threshold (°C)
    pub under_temperature_protection: f64,
    /// 0 = Celsius, 1 = Fahrenheit
    pub temperature_unit: i64,
    pub bluetooth_password: i64,
    /// Raw logging interval, 59 means 60 s
    pub data_logging_interval: i64,
    /// Undocumented slot, kept for checksum accounting only
    pub reserved_2: i64,
}

impl SettingsRecord {
    /// Decode the fields after the checksum, aborting on the first bad field
    pub fn decode(cursor: &mut TokenCursor<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            over_voltage_protection: cursor.next_field("over_voltage_protection")? as f64
                / 100.0,
            under_voltage_protection: cursor.next_field("under_voltage_protection")? as f64
                / 100.0,
            over_discharge_current_protection: cursor
                .next_field("over_discharge_current_protection")?
                as f64
                / 100.0,
            over_charge_current_protection: cursor.next_field("over_charge_current_protection")?
                as f64
                / 100.0,
            over_power_protection: cursor.next_field("over_power_protection")? as f64 / 100.0,
            over_temperature_protection: cursor.next_field("over_temperature_protection")? as f64
                - 100.0,
            protection_recovery_time_seconds: cursor
                .next_field("protection_recovery_time_seconds")?,
            protection_delay_time_seconds: cursor.next_field("protection_delay_time_seconds")?,
            battery_capacity_ah: cursor.next_field("battery_capacity_ah")? as f64 / 10.0,
            voltage_calibration: cursor.next_field("voltage_calibration")?,
            current_calibration: cursor.next_field("current_calibration")?,
            temperature_calibration: cursor.next_field("temperature_calibration")? as f64 - 100.0,
            reserved_1: cursor.next_field("reserved_1")?,
            relay_mode: cursor.next_field("relay_mode")?,
            current_multiplier: cursor.next_field("current_multiplier")?,
            time_calibration: cursor.next_field("time_calibration")?,
            data_logging: cursor.next_field("data_logging")?,
            soc100_voltage: cursor.next_field("soc100_voltage")? as f64 / 100.0,
            soc0_voltage: cursor.next_field("soc0_voltage")? as f64 / 100.0,
            full_charge_current_percent: cursor.next_field("full_charge_current_percent")?,
            monitoring_time_minutes: cursor.next_field("monitoring_time_minutes")? as f64 / 10.0,
            under_temperature_protection: cursor.next_field("under_temperature_protection")?
                as f64
                - 100.0,
            temperature_unit: cursor.next_field("temperature_unit")?,
            bluetooth_password: cursor.next_field("bluetooth_password")?,
            data_logging_interval: cursor.next_field("data_logging_interval")?,
            reserved_2: cursor.next_field("reserved_2")?,
        })
    }

    /// Publishable values. The two reserved slots are never published.
    pub fn measurements(&self) -> Vec<(Measurement, f64)> {
        vec![
            (Measurement::BatteryCapacityAh, self.battery_capacity_ah),
            (Measurement::Soc100Voltage, self.soc100_voltage),
            (Measurement::Soc0Voltage, self.soc0_voltage),
            (
                Measurement::OverVoltageProtection,
                self.over_voltage_protection,
            ),
            (
                Measurement::UnderVoltageProtection,
                self.under_voltage_protection,
            ),
            (
                Measurement::OverDischargeCurrentProtection,
                self.over_discharge_current_protection,
            ),
            (
                Measurement::OverChargeCurrentProtection,
                self.over_charge_current_protection,
            ),
            (Measurement::OverPowerProtection, self.over_power_protection),
            (
                Measurement::OverTemperatureProtection,
                self.over_temperature_protection,
            ),
            (
                Measurement::UnderTemperatureProtection,
                self.under_temperature_protection,
            ),
            (
                Measurement::ProtectionRecoveryTime,
                self.protection_recovery_time_seconds as f64,
            ),
            (
                Measurement::ProtectionDelayTime,
                self.protection_delay_time_seconds as f64,
            ),
            (
                Measurement::VoltageCalibration,
                self.voltage_calibration as f64,
            ),
            (
                Measurement::CurrentCalibration,
                self.current_calibration as f64,
            ),
            (
                Measurement::TemperatureCalibration,
                self.temperature_calibration,
            ),
            (Measurement::RelayMode, self.relay_mode as f64),
            (Measurement::CurrentMultiplier, self.current_multiplier as f64),
            (Measurement::TimeCalibration, self.time_calibration as f64),
            (Measurement::DataLogging, self.data_logging as f64),
            (
                Measurement::FullChargeCurrentPercent,
                self.full_charge_current_percent as f64,
            ),
            (
                Measurement::MonitoringTimeMinutes,
                self.monitoring_time_minutes,
            ),
            (Measurement::TemperatureUnit, self.temperature_unit as f64),
            (Measurement::BluetoothPassword, self.bluetooth_password as f64),
            (
                Measurement::DataLoggingInterval,
                self.data_logging_interval as f64,
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE: &[u8] =
        b"0,0,0,0,0,255,0,0,2800,100,100,95,0,0,1,100,0,2752,2450,2,20,255,0,0,59,0,";

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_decode_reference_frame() {
        let mut cursor = TokenCursor::new(REFERENCE);
        let record = SettingsRecord::decode(&mut cursor).unwrap();

        assert!(approx(record.over_voltage_protection, 0.0));
        assert!(approx(record.over_temperature_protection, 155.0));
        assert!(approx(record.battery_capacity_ah, 280.0));
        assert_eq!(record.voltage_calibration, 100);
        assert_eq!(record.current_calibration, 100);
        assert!(approx(record.temperature_calibration, -5.0));
        assert_eq!(record.relay_mode, 0);
        assert_eq!(record.current_multiplier, 1);
        assert_eq!(record.time_calibration, 100);
        assert!(approx(record.soc100_voltage, 27.52));
        assert!(approx(record.soc0_voltage, 24.50));
        assert_eq!(record.full_charge_current_percent, 2);
        assert!(approx(record.monitoring_time_minutes, 2.0));
        assert!(approx(record.under_temperature_protection, 155.0));
        assert_eq!(record.temperature_unit, 0);
        assert_eq!(record.data_logging_interval, 59);
        assert_eq!(record.reserved_2, 0);
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_field_count() {
        let count = REFERENCE.iter().filter(|b| **b == b',').count();
        assert_eq!(count, SETTINGS_FIELD_COUNT);
    }

    #[test]
    fn test_thresholds_scaled() {
        let line = b"5800,4200,20000,10000,300000,160,5,10,1000,100,100,100,0,1,1,100,1,5600,4400,3,100,90,1,1234,9,7,";
        let mut cursor = TokenCursor::new(line);
        let record = SettingsRecord::decode(&mut cursor).unwrap();

        assert!(approx(record.over_voltage_protection, 58.0));
        assert!(approx(record.under_voltage_protection, 42.0));
        assert!(approx(record.over_discharge_current_protection, 200.0));
        assert!(approx(record.over_charge_current_protection, 100.0));
        assert!(approx(record.over_power_protection, 3000.0));
        assert!(approx(record.over_temperature_protection, 60.0));
        assert_eq!(record.protection_recovery_time_seconds, 5);
        assert_eq!(record.protection_delay_time_seconds, 10);
        assert!(approx(record.battery_capacity_ah, 100.0));
        assert!(approx(record.temperature_calibration, 0.0));
        assert_eq!(record.relay_mode, 1);
        assert_eq!(record.data_logging, 1);
        assert!(approx(record.monitoring_time_minutes, 10.0));
        assert!(approx(record.under_temperature_protection, -10.0));
        assert_eq!(record.temperature_unit, 1);
        assert_eq!(record.bluetooth_password, 1234);
        assert_eq!(record.reserved_2, 7);
    }

    #[test]
    fn test_measurements_cover_thresholds() {
        let mut cursor = TokenCursor::new(REFERENCE);
        let record = SettingsRecord::decode(&mut cursor).unwrap();
        let values = record.measurements();

        assert_eq!(values.len(), 24);
        assert!(values
            .iter()
            .any(|(m, v)| *m == Measurement::BatteryCapacityAh && approx(*v, 280.0)));
    }

    #[test]
    fn test_measurements_cover_configuration_fields() {
        let line = b"5800,4200,20000,10000,300000,160,5,10,1000,100,100,100,0,1,1,100,1,5600,4400,3,100,90,1,1234,9,7,";
        let mut cursor = TokenCursor::new(line);
        let record = SettingsRecord::decode(&mut cursor).unwrap();
        let values = record.measurements();

        let value = |wanted: Measurement| {
            values
                .iter()
                .find(|(m, _)| *m == wanted)
                .map(|(_, v)| *v)
                .unwrap()
        };
        assert!(approx(value(Measurement::ProtectionRecoveryTime), 5.0));
        assert!(approx(value(Measurement::ProtectionDelayTime), 10.0));
        assert!(approx(value(Measurement::TemperatureCalibration), 0.0));
        assert!(approx(value(Measurement::RelayMode), 1.0));
        assert!(approx(value(Measurement::FullChargeCurrentPercent), 3.0));
        assert!(approx(value(Measurement::MonitoringTimeMinutes), 10.0));
        assert!(approx(value(Measurement::BluetoothPassword), 1234.0));
        assert!(approx(value(Measurement::DataLoggingInterval), 9.0));
        // reserved slots carry 0 and 7 here and must not leak out
        assert!(!values.iter().any(|(_, v)| approx(*v, 7.0)));
    }

    #[test]
    fn test_abort_on_missing_reserved_field() {
        let line = b"0,0,0,0,0,255,0,0,2800,100,100,95,0,0,1,100,0,2752,2450,2,20,255,0,0,59,";
        let mut cursor = TokenCursor::new(line);
        assert_eq!(
            SettingsRecord::decode(&mut cursor),
            Err(DecodeError::malformed("reserved_2"))
        );
    }
}
