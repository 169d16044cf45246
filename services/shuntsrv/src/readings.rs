//! Latest-readings store
//!
//! Each configured measurement gets a publish function that overwrites its
//! slot here. Readers (shutdown summary, tests) see the newest value only.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tracing::info;
use voltage_khf::{Measurement, Sinks};

/// One published value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub value: f64,
    pub unit: &'static str,
    pub updated_at: DateTime<Utc>,
}

/// Shared map of the newest value per measurement
#[derive(Debug, Clone, Default)]
pub struct ReadingStore {
    readings: Arc<DashMap<Measurement, Reading>>,
}

impl ReadingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, measurement: Measurement, value: f64) {
        self.readings.insert(
            measurement,
            Reading {
                value,
                unit: measurement.unit(),
                updated_at: Utc::now(),
            },
        );
    }

    pub fn get(&self, measurement: Measurement) -> Option<Reading> {
        self.readings.get(&measurement).map(|r| r.value().clone())
    }

    pub fn value(&self, measurement: Measurement) -> Option<f64> {
        self.readings.get(&measurement).map(|r| r.value)
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Readings keyed by measurement name, sorted
    pub fn snapshot(&self) -> BTreeMap<&'static str, Reading> {
        self.readings
            .iter()
            .map(|entry| (entry.key().as_str(), entry.value().clone()))
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.snapshot())
    }
}

/// Register a publish function for every configured sensor
pub fn build_sinks(sensors: &[Measurement], store: &ReadingStore) -> Sinks {
    let mut sinks = Sinks::new();
    for &measurement in sensors {
        let store = store.clone();
        sinks.register(measurement, move |value| {
            store.record(measurement, value);
            info!("{} = {} {}", measurement, value, measurement.unit());
        });
    }
    sinks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_overwrites() {
        let store = ReadingStore::new();
        assert!(store.is_empty());

        store.record(Measurement::Voltage, 53.19);
        store.record(Measurement::Voltage, 53.2);
        assert_eq!(store.len(), 1);

        let reading = store.get(Measurement::Voltage).unwrap();
        assert_eq!(reading.value, 53.2);
        assert_eq!(reading.unit, "V");
    }

    #[test]
    fn test_build_sinks_only_configured() {
        let store = ReadingStore::new();
        let mut sinks = build_sinks(&[Measurement::Voltage, Measurement::Temperature], &store);
        assert_eq!(sinks.len(), 2);

        assert!(sinks.publish(Measurement::Temperature, 22.0));
        assert!(!sinks.publish(Measurement::Current, -3.96));

        assert_eq!(store.value(Measurement::Temperature), Some(22.0));
        assert_eq!(store.value(Measurement::Current), None);
    }

    #[test]
    fn test_snapshot_json() {
        let store = ReadingStore::new();
        store.record(Measurement::Voltage, 53.19);
        store.record(Measurement::BatteryLevel, 91.05);

        let names: Vec<_> = store.snapshot().keys().copied().collect();
        assert_eq!(names, vec!["battery_level", "voltage"]);

        let json: serde_json::Value = serde_json::from_str(&store.to_json().unwrap()).unwrap();
        assert_eq!(json["voltage"]["value"], 53.19);
        assert_eq!(json["voltage"]["unit"], "V");
        assert!(json["voltage"]["updated_at"].is_string());
    }
}
