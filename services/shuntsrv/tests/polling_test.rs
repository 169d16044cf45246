//! Polling task driven over an in-memory stream standing in for the UART

use std::time::Duration;

use shuntsrv::{build_sinks, start_polling_task, PollingExit, ReadingStore, SerialLink};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::time::{sleep, timeout};
use voltage_khf::{Measurement, MonitorConfig, ShuntMonitor};

const STATUS_FRAME: &[u8] =
    b":r50=1,46,5319,396,254929,25304424,26717081,91107,122,0,99,0,3877,100,101,0,\r\n";
const SETTINGS_FRAME: &[u8] =
    b":r51=1,65,0,0,0,0,0,255,0,0,2800,100,100,95,0,0,1,100,0,2752,2450,2,20,255,0,0,59,0,\r\n";

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

async fn read_until<R: AsyncRead + Unpin>(reader: &mut R, needle: &[u8]) -> Vec<u8> {
    let mut seen = Vec::new();
    let mut buf = [0u8; 64];
    while !seen.windows(needle.len()).any(|w| w == needle) {
        let n = reader.read(&mut buf).await.unwrap();
        assert!(n > 0, "stream closed");
        seen.extend_from_slice(&buf[..n]);
    }
    seen
}

async fn wait_for(store: &ReadingStore, measurement: Measurement) {
    timeout(Duration::from_secs(2), async {
        while store.value(measurement).is_none() {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_requests_then_publishes_status() {
    let (device, host) = tokio::io::duplex(1024);
    let (mut device_rx, mut device_tx) = tokio::io::split(device);

    let store = ReadingStore::new();
    let sinks = build_sinks(&[Measurement::Voltage, Measurement::Current], &store);
    let monitor = ShuntMonitor::new(MonitorConfig::default(), sinks);
    let (handle, token) = start_polling_task(
        monitor,
        SerialLink::spawn_io(host),
        Duration::from_millis(5),
    );

    let requests = timeout(
        Duration::from_secs(2),
        read_until(&mut device_rx, b":R50=1,2,1,\r\n"),
    )
    .await
    .unwrap();
    assert!(requests.starts_with(b":R51=1,2,1,\r\n"));

    device_tx.write_all(STATUS_FRAME).await.unwrap();
    wait_for(&store, Measurement::Current).await;

    token.cancel();
    let monitor = handle.await.unwrap().monitor;

    assert_eq!(monitor.stats().status_accepted, 1);
    assert_eq!(monitor.stats().requests_sent, 2);
    assert!(approx(store.value(Measurement::Voltage).unwrap(), 53.19));
    assert!(approx(store.value(Measurement::Current).unwrap(), -3.96));
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn test_settings_enable_state_of_charge() {
    let (device, host) = tokio::io::duplex(1024);
    let (_device_rx, mut device_tx) = tokio::io::split(device);

    let store = ReadingStore::new();
    let sinks = build_sinks(&Measurement::ALL, &store);
    let monitor = ShuntMonitor::new(MonitorConfig::default(), sinks);
    let (handle, token) = start_polling_task(
        monitor,
        SerialLink::spawn_io(host),
        Duration::from_millis(5),
    );

    device_tx.write_all(SETTINGS_FRAME).await.unwrap();
    wait_for(&store, Measurement::BatteryCapacityAh).await;
    device_tx.write_all(STATUS_FRAME).await.unwrap();
    wait_for(&store, Measurement::BatteryLevel).await;

    token.cancel();
    let monitor = handle.await.unwrap().monitor;

    assert_eq!(monitor.stats().settings_accepted, 1);
    assert!(approx(
        store.value(Measurement::BatteryCapacityAh).unwrap(),
        280.0
    ));
    let soc = store.value(Measurement::BatteryLevel).unwrap();
    assert!((soc - 91.046).abs() < 0.001);
}

#[tokio::test]
async fn test_corrupted_and_foreign_lines_publish_nothing() {
    let (device, host) = tokio::io::duplex(1024);
    let (_device_rx, mut device_tx) = tokio::io::split(device);

    let store = ReadingStore::new();
    let sinks = build_sinks(&Measurement::ALL, &store);
    let config = MonitorConfig {
        address: 2,
        ..Default::default()
    };
    let (handle, token) = start_polling_task(
        ShuntMonitor::new(config, sinks),
        SerialLink::spawn_io(host),
        Duration::from_millis(5),
    );

    // Addressed to device 1, then a checksum failure for device 2
    device_tx.write_all(STATUS_FRAME).await.unwrap();
    device_tx
        .write_all(b":r50=2,47,5319,396,254929,25304424,26717081,91107,122,0,99,0,3877,100,101,0,\r\n")
        .await
        .unwrap();
    sleep(Duration::from_millis(100)).await;

    token.cancel();
    let monitor = handle.await.unwrap().monitor;

    assert!(store.is_empty());
    assert_eq!(monitor.stats().lines_received, 2);
    assert_eq!(monitor.stats().address_filtered, 1);
    assert_eq!(monitor.stats().checksum_failures, 1);
}

#[tokio::test]
async fn test_lost_link_stops_polling() {
    let (device, host) = tokio::io::duplex(1024);
    let (mut device_rx, device_tx) = tokio::io::split(device);

    let store = ReadingStore::new();
    let sinks = build_sinks(&Measurement::ALL, &store);
    let (handle, _token) = start_polling_task(
        ShuntMonitor::new(MonitorConfig::default(), sinks),
        SerialLink::spawn_io(host),
        Duration::from_millis(5),
    );

    timeout(
        Duration::from_secs(2),
        read_until(&mut device_rx, b":R50=1,2,1,\r\n"),
    )
    .await
    .unwrap();

    // Unplug the device: both halves of its end go away
    drop(device_rx);
    drop(device_tx);

    let outcome = timeout(Duration::from_secs(2), handle)
        .await
        .expect("polling task kept running on a dead link")
        .unwrap();
    assert_eq!(outcome.exit, PollingExit::LinkLost);
    assert_eq!(outcome.monitor.stats().requests_sent, 2);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_cancel_reports_cancelled_exit() {
    let (_device, host) = tokio::io::duplex(1024);
    let store = ReadingStore::new();
    let (handle, token) = start_polling_task(
        ShuntMonitor::new(MonitorConfig::default(), build_sinks(&[], &store)),
        SerialLink::spawn_io(host),
        Duration::from_millis(5),
    );

    sleep(Duration::from_millis(20)).await;
    token.cancel();
    let outcome = handle.await.unwrap();
    assert_eq!(outcome.exit, PollingExit::Cancelled);
}
