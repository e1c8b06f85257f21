// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Controller Integration Tests
//!
//! Connection lifecycle, discovery and group operations over simulated buses.

use std::time::Duration;

use dynabus::{
    ConnectionError, Controller, ControllerConfig, ControllerState, HardwareErrors, RegisterSize,
};
use dynabus_tests::common::assertions::{
    assert_connection_variant, assert_elapsed_between, ServoErrorAssertions,
};
use dynabus_tests::common::fixtures::{
    BusFixtures, ConfigFixtures, ControllerFixtures, ModelFixtures,
};
use dynabus_tests::common::{init_test_logging, LogCapture};
use tokio::time::Instant;

const MOVING_ADDRESS: u16 = 122;

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_connect_discovers_present_ids_only() {
    init_test_logging();
    let sim = BusFixtures::xm430_at(&[2]);
    let mut controller = ControllerFixtures::with_config(&sim, ConfigFixtures::scanning([1, 2, 3]));

    let found = controller.connect(None).await.unwrap();
    assert_eq!(found.into_iter().collect::<Vec<_>>(), vec![2]);
    assert_eq!(controller.state(), ControllerState::Connected);
    assert_eq!(controller.connected_ids(), vec![2]);
    assert!(controller.servo(1).is_none());
    assert_eq!(controller.servo(2).unwrap().model().unwrap().name(), "XM430-W210");
}

#[tokio::test(start_paused = true)]
async fn test_connect_with_explicit_candidates() {
    let sim = BusFixtures::mixed();
    let mut controller = ControllerFixtures::disconnected(&sim);

    let found = controller.connect(Some(&[2, 3, 9])).await.unwrap();
    assert_eq!(found.into_iter().collect::<Vec<_>>(), vec![2, 3]);
    assert_eq!(controller.servo(2).unwrap().model().unwrap().name(), "XL430-W250");
}

#[tokio::test(start_paused = true)]
async fn test_connect_twice_is_rejected() {
    let sim = BusFixtures::single_xm430();
    let mut controller = ControllerFixtures::connected(&sim).await;

    let err = controller.connect(None).await.unwrap_err();
    assert_connection_variant(&err, |e| matches!(e, ConnectionError::AlreadyConnected { .. }));
    assert!(controller.is_connected());
    assert_eq!(controller.connected_ids(), vec![1]);
}

#[tokio::test(start_paused = true)]
async fn test_connect_open_failure_leaves_disconnected() {
    let sim = BusFixtures::single_xm430();
    sim.fail_open(true);
    let mut controller = ControllerFixtures::disconnected(&sim);

    let err = controller.connect(None).await.unwrap_err();
    err.assert_connection_error();
    assert_eq!(controller.state(), ControllerState::Disconnected);
    assert!(controller.connected_ids().is_empty());

    sim.fail_open(false);
    controller.connect(None).await.unwrap();
    assert!(controller.is_connected());
}

#[tokio::test]
async fn test_connect_baud_rate_failure() {
    let sim = BusFixtures::single_xm430();
    sim.fail_baud_rate(true);
    let mut controller = ControllerFixtures::disconnected(&sim);

    let err = controller.connect(None).await.unwrap_err();
    assert_connection_variant(&err, |e| matches!(e, ConnectionError::BaudRateFailed { .. }));
    assert_eq!(controller.state(), ControllerState::Disconnected);
    assert!(!controller.bus().is_open().await);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_is_idempotent() {
    let sim = BusFixtures::single_xm430();
    let mut controller = ControllerFixtures::connected(&sim).await;

    controller.disconnect().await;
    controller.disconnect().await;
    assert_eq!(controller.state(), ControllerState::Disconnected);
    assert!(controller.servos().next().is_none());

    let err = controller.scan(&[1]).await.unwrap_err();
    assert_connection_variant(&err, |e| matches!(e, ConnectionError::NotConnected));
}

// =============================================================================
// Discovery
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_scan_tolerates_faulted_and_silent_servos() {
    let sim = BusFixtures::xm430_at(&[1, 2, 3, 4]);
    sim.set_hardware_error(2, HardwareErrors::INPUT_VOLTAGE);
    sim.set_silent(3, true);
    let mut controller = ControllerFixtures::connected(&sim).await;

    assert_eq!(controller.connected_ids(), vec![1, 4]);

    sim.set_hardware_error(2, HardwareErrors::empty());
    sim.set_silent(3, false);
    let found = controller.scan(&[2, 3]).await.unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(controller.connected_ids(), vec![1, 2, 3, 4]);
}

// =============================================================================
// Group Operations
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_set_all_torque_reports_partial_failure() {
    let sim = BusFixtures::mixed();
    let mut controller = ControllerFixtures::with_config(&sim, ConfigFixtures::scanning([1, 2, 3]));
    controller.connect(None).await.unwrap();

    assert!(controller.set_all_torque(true).await);

    sim.set_hardware_error(3, HardwareErrors::OVERHEATING);
    assert!(!controller.set_all_torque(false).await);
    // The healthy servos were still switched.
    assert_eq!(sim.peek(1, 64, 1), Some(0));
    assert_eq!(sim.peek(2, 64, 1), Some(0));
}

#[tokio::test(start_paused = true)]
async fn test_set_all_torque_logs_each_failure() {
    let sim = BusFixtures::xm430_at(&[1, 2]);
    let mut controller = ControllerFixtures::with_config(&sim, ConfigFixtures::scanning([1, 2]));
    controller.connect(None).await.unwrap();
    sim.set_hardware_error(2, HardwareErrors::OVERLOAD);

    let (logs, _guard) = LogCapture::install();
    assert!(!controller.set_all_torque(true).await);

    let lines = logs.lines_with(&["ERROR", "category=\"fault\"", "set_all_torque(true) on servo 2"]);
    assert_eq!(lines.len(), 1, "captured: {}", logs.contents());
    assert!(lines[0].contains("retryable=false"));
    assert!(logs.lines_with(&["on servo 1"]).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_wait_until_stopped_times_out_with_pending_ids() {
    let sim = BusFixtures::xm430_at(&[1, 2]);
    let mut controller = ControllerFixtures::with_config(&sim, ConfigFixtures::scanning([1, 2]));
    controller.connect(None).await.unwrap();
    sim.poke(2, MOVING_ADDRESS, RegisterSize::Byte, 1);

    let start = Instant::now();
    let err = controller
        .wait_until_stopped(Duration::from_millis(300))
        .await
        .unwrap_err();

    err.assert_motion_timeout(&[2]);
    assert_elapsed_between(
        start.elapsed(),
        Duration::from_millis(300),
        Duration::from_millis(350),
    );
}

#[tokio::test(start_paused = true)]
async fn test_wait_until_stopped_after_motion_ends() {
    let sim = BusFixtures::xm430_at(&[1]);
    let controller = ControllerFixtures::connected(&sim).await;
    sim.poke(1, MOVING_ADDRESS, RegisterSize::Byte, 1);

    let stopper = sim.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(420)).await;
        stopper.poke(1, MOVING_ADDRESS, RegisterSize::Byte, 0);
    });

    let start = Instant::now();
    controller
        .wait_until_stopped(Duration::from_secs(2))
        .await
        .unwrap();
    assert_elapsed_between(
        start.elapsed(),
        Duration::from_millis(420),
        Duration::from_millis(600),
    );
}

#[tokio::test]
async fn test_wait_requires_connection() {
    let sim = BusFixtures::single_xm430();
    let controller = ControllerFixtures::disconnected(&sim);

    let err = controller
        .wait_until_stopped(Duration::from_millis(100))
        .await
        .unwrap_err();
    err.assert_connection_error();
}

#[test]
fn test_zero_poll_interval_is_rejected() {
    let config = ControllerConfig {
        poll_interval: Duration::ZERO,
        ..ConfigFixtures::default_config()
    };
    let err = Controller::new(BusFixtures::single_xm430(), ModelFixtures::registry(), config)
        .err()
        .unwrap();
    assert_eq!(err.category(), "configuration");

    let config = ControllerConfig {
        scan_ids: Vec::new(),
        ..ConfigFixtures::default_config()
    };
    assert!(Controller::new(BusFixtures::single_xm430(), ModelFixtures::registry(), config).is_err());
}
