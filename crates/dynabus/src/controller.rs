// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Bus lifecycle, discovery and multi-device coordination.
//!
//! A [`Controller`] owns one [`Bus`] and the map of discovered devices.
//! Lifecycle:
//!
//! ```text
//! Disconnected --connect--> Connecting --open+baud ok--> Connected
//!      ^                        |                            |
//!      +------open/baud failed--+                            |
//!      +----------------------disconnect---------------------+
//! ```
//!
//! Discovery binds a model to each responding id; ids that do not answer,
//! answer with a fault, or report an unknown model number are skipped.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::bus::Bus;
use crate::config::{ControllerConfig, SUPPORTED_PROTOCOL_VERSION};
use crate::error::{ConnectionError, ServoError, ServoResult, TimeoutError};
use crate::model::ModelRegistry;
use crate::servo::Servo;
use crate::transport::{BusTransport, TransportError};
use crate::types::ServoId;

#[cfg(feature = "serial")]
use crate::transport::{find_port, SerialTransport};

/// Controller lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ControllerState {
    /// Transport closed, no devices.
    #[default]
    Disconnected,
    /// Opening the transport.
    Connecting,
    /// Transport open; devices may be addressed.
    Connected,
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Controller
// =============================================================================

/// Owns a bus and the devices discovered on it.
pub struct Controller<T> {
    bus: Bus<T>,
    registry: Arc<ModelRegistry>,
    config: ControllerConfig,
    state: ControllerState,
    servos: BTreeMap<ServoId, Servo<T>>,
}

impl<T> fmt::Debug for Controller<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("state", &self.state)
            .field("servos", &self.servos.keys().collect::<Vec<_>>())
            .field("config", &self.config)
            .finish()
    }
}

impl<T: BusTransport> Controller<T> {
    /// Creates a disconnected controller over `transport`.
    ///
    /// Fails with a configuration error if `config` does not validate.
    pub fn new(
        transport: T,
        registry: Arc<ModelRegistry>,
        config: ControllerConfig,
    ) -> ServoResult<Self> {
        config.validate()?;
        Ok(Self {
            bus: Bus::new(transport, config.response_timeout),
            registry,
            config,
            state: ControllerState::Disconnected,
            servos: BTreeMap::new(),
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Returns `true` once `connect` has succeeded and until `disconnect`.
    pub fn is_connected(&self) -> bool {
        self.state == ControllerState::Connected
    }

    /// Settings this controller was built with.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Models available for detection.
    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    /// The shared bus.
    pub fn bus(&self) -> &Bus<T> {
        &self.bus
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Opens the bus, sets the baud rate and discovers devices.
    ///
    /// Probes `candidate_ids`, or the configured scan ids when `None`, and
    /// returns the ids that answered with a known model.
    pub async fn connect(&mut self, candidate_ids: Option<&[u8]>) -> ServoResult<BTreeSet<u8>> {
        if self.state == ControllerState::Connected {
            return Err(ConnectionError::AlreadyConnected {
                port: self.bus.display_name().await,
            }
            .into());
        }

        let version = self.config.protocol_version;
        if (version - SUPPORTED_PROTOCOL_VERSION).abs() > f32::EPSILON {
            return Err(ConnectionError::UnsupportedProtocol { version }.into());
        }

        self.state = ControllerState::Connecting;
        self.servos.clear();
        let port = self.bus.display_name().await;
        let baud_rate = self.config.baud_rate.bps();

        if let Err(error) = self.bus.open().await {
            self.abort_connect().await;
            return Err(open_error(&port, error).into());
        }
        if let Err(error) = self.bus.set_baud_rate(baud_rate).await {
            self.abort_connect().await;
            return Err(baud_rate_error(&port, baud_rate, error).into());
        }

        self.state = ControllerState::Connected;
        info!(port = %port, baud_rate, "Bus connected");

        let ids = candidate_ids
            .map(<[u8]>::to_vec)
            .unwrap_or_else(|| self.config.scan_ids.clone());
        self.scan(&ids).await
    }

    async fn abort_connect(&mut self) {
        if let Err(error) = self.bus.close().await {
            debug!(error = %error, "Close after failed connect");
        }
        self.state = ControllerState::Disconnected;
    }

    /// Closes the bus and forgets every device. Safe to call repeatedly.
    pub async fn disconnect(&mut self) {
        let was_connected = self.state == ControllerState::Connected;
        if let Err(error) = self.bus.close().await {
            warn!(error = %error, "Failed to close bus");
        }
        self.servos.clear();
        self.state = ControllerState::Disconnected;
        if was_connected {
            info!(port = %self.bus.display_name().await, "Bus disconnected");
        }
    }

    // =========================================================================
    // Discovery
    // =========================================================================

    /// Probes each id and adds the responding devices.
    ///
    /// Returns the ids found by this scan. Devices found earlier stay in the
    /// map.
    pub async fn scan(&mut self, ids: &[u8]) -> ServoResult<BTreeSet<u8>> {
        if !self.is_connected() {
            return Err(ServoError::not_connected());
        }

        let mut found = BTreeSet::new();
        for &raw in ids {
            let id = match ServoId::new(raw) {
                Ok(id) if !id.is_broadcast() => id,
                _ => {
                    debug!(servo_id = raw, "Skipping id that cannot be scanned");
                    continue;
                }
            };

            let mut servo = Servo::new(id, self.bus.clone());
            match servo.detect_model(&self.registry).await {
                Ok(model) => {
                    info!(servo_id = raw, model = model.name(), "Servo found");
                    self.servos.insert(id, servo);
                    found.insert(raw);
                }
                Err(error) => {
                    debug!(servo_id = raw, error = %error, "No servo detected");
                }
            }
        }

        info!(found = ?found, probed = ids.len(), "Scan complete");
        Ok(found)
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Returns the handle for device `id`, if discovered.
    pub fn servo(&self, id: u8) -> Option<&Servo<T>> {
        let id = ServoId::new(id).ok()?;
        self.servos.get(&id)
    }

    /// Discovered devices in id order.
    pub fn servos(&self) -> impl Iterator<Item = &Servo<T>> + '_ {
        self.servos.values()
    }

    /// Sorted ids of discovered devices.
    pub fn connected_ids(&self) -> Vec<u8> {
        self.servos.keys().map(|id| id.get()).collect()
    }

    // =========================================================================
    // Coordination
    // =========================================================================

    /// Switches torque on every device.
    ///
    /// Each device is tried independently; returns `true` only if all
    /// succeeded.
    pub async fn set_all_torque(&self, enable: bool) -> bool {
        let mut all_ok = true;
        for servo in self.servos.values() {
            if let Err(error) = servo.set_torque(enable).await {
                error.log(&format!("set_all_torque({enable}) on servo {}", servo.id()));
                all_ok = false;
            }
        }
        all_ok
    }

    /// Waits until every device reports `MOVING == 0`.
    ///
    /// Polls every `poll_interval`. A failed read counts as still moving.
    /// Fails with [`TimeoutError::MotionWait`] listing the pending ids once
    /// `timeout` has elapsed.
    pub async fn wait_until_stopped(&self, timeout: Duration) -> ServoResult<()> {
        if !self.is_connected() {
            return Err(ServoError::not_connected());
        }

        let started = Instant::now();
        loop {
            let mut pending = Vec::new();
            for servo in self.servos.values() {
                match servo.is_moving().await {
                    Ok(false) => {}
                    Ok(true) => pending.push(servo.id().get()),
                    Err(error) => {
                        error.log(&format!("moving poll on servo {}", servo.id()));
                        pending.push(servo.id().get());
                    }
                }
            }

            if pending.is_empty() {
                debug!(elapsed = ?started.elapsed(), "All servos stopped");
                return Ok(());
            }

            let elapsed = started.elapsed();
            if elapsed >= timeout {
                return Err(TimeoutError::MotionWait { timeout, pending }.into());
            }
            tokio::time::sleep(self.config.poll_interval.min(timeout - elapsed)).await;
        }
    }
}

#[cfg(feature = "serial")]
impl Controller<SerialTransport> {
    /// Builds a controller on the configured serial port, or on the first
    /// detected USB adapter when none is configured.
    pub fn serial(config: ControllerConfig, registry: Arc<ModelRegistry>) -> ServoResult<Self> {
        let port = match config.port.clone() {
            Some(port) => port,
            None => {
                let port = find_port().ok_or(ConnectionError::NoPortFound)?;
                info!(port = %port, "Detected servo adapter");
                port
            }
        };
        let transport = SerialTransport::new(port, config.baud_rate.bps());
        Self::new(transport, registry, config)
    }
}

fn open_error(port: &str, error: TransportError) -> ConnectionError {
    match error {
        TransportError::PortNotFound { port } => ConnectionError::PortNotFound { port },
        TransportError::AccessDenied { port } => ConnectionError::AccessDenied { port },
        other => ConnectionError::open_failed(port, other.to_string()),
    }
}

fn baud_rate_error(port: &str, baud_rate: u32, error: TransportError) -> ConnectionError {
    match error {
        TransportError::BaudRate { message, .. } => {
            ConnectionError::baud_rate_failed(port, baud_rate, message)
        }
        other => ConnectionError::baud_rate_failed(port, baud_rate, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control_table::RegisterSize;
    use crate::model::{xl430, xm430};
    use crate::registers;
    use crate::transport::SimulatedBus;
    use dynabus_protocol::HardwareErrors;

    const MOVING_ADDRESS: u16 = 122;

    fn controller(sim: &SimulatedBus) -> Controller<SimulatedBus> {
        let registry = Arc::new(ModelRegistry::builtin().unwrap());
        Controller::new(sim.clone(), registry, ControllerConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_connect_discovers_servos() {
        let sim = SimulatedBus::new()
            .with_servo(1, &xm430::model().unwrap())
            .with_servo(3, &xl430::model().unwrap());
        let mut controller = controller(&sim);

        let found = controller.connect(None).await.unwrap();
        assert_eq!(found, BTreeSet::from([1, 3]));
        assert_eq!(controller.state(), ControllerState::Connected);
        assert_eq!(controller.connected_ids(), vec![1, 3]);
        assert_eq!(controller.servo(3).unwrap().model().unwrap().name(), "XL430-W250");
        assert!(controller.servo(2).is_none());
        assert_eq!(sim.baud_rate(), 57_600);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_skips_missing_ids() {
        let sim = SimulatedBus::new().with_servo(2, &xm430::model().unwrap());
        let mut controller = controller(&sim);

        let found = controller.connect(Some(&[1, 2, 3])).await.unwrap();
        assert_eq!(found, BTreeSet::from([2]));
    }

    #[tokio::test]
    async fn test_scan_skips_unknown_models_and_faults() {
        let sim = SimulatedBus::new()
            .with_servo(1, &xm430::model().unwrap())
            .with_servo(2, &xm430::model().unwrap())
            .with_servo(3, &xm430::model().unwrap());
        sim.poke(2, 0, RegisterSize::Word, 9999);
        sim.set_hardware_error(3, HardwareErrors::OVERHEATING);
        let mut controller = controller(&sim);

        let found = controller.connect(Some(&[1, 2, 3, 253])).await.unwrap();
        assert_eq!(found, BTreeSet::from([1]));
    }

    #[tokio::test]
    async fn test_scan_accumulates() {
        let sim = SimulatedBus::new()
            .with_servo(1, &xm430::model().unwrap())
            .with_servo(5, &xm430::model().unwrap());
        let mut controller = controller(&sim);

        controller.connect(Some(&[1])).await.unwrap();
        let found = controller.scan(&[5]).await.unwrap();
        assert_eq!(found, BTreeSet::from([5]));
        assert_eq!(controller.connected_ids(), vec![1, 5]);
    }

    #[tokio::test]
    async fn test_scan_requires_connection() {
        let sim = SimulatedBus::new();
        let mut controller = controller(&sim);
        let err = controller.scan(&[1]).await.unwrap_err();
        assert!(matches!(err, ServoError::Connection(ConnectionError::NotConnected)));
    }

    #[tokio::test]
    async fn test_connect_twice_fails() {
        let sim = SimulatedBus::new();
        let mut controller = controller(&sim);
        controller.connect(Some(&[])).await.unwrap();

        let err = controller.connect(None).await.unwrap_err();
        assert!(matches!(
            err,
            ServoError::Connection(ConnectionError::AlreadyConnected { .. })
        ));
        assert!(controller.is_connected());
    }

    #[tokio::test]
    async fn test_unsupported_protocol() {
        let sim = SimulatedBus::new();
        let registry = Arc::new(ModelRegistry::builtin().unwrap());
        let config = ControllerConfig {
            protocol_version: 1.0,
            ..Default::default()
        };
        let mut controller = Controller::new(sim.clone(), registry, config).unwrap();

        let err = controller.connect(None).await.unwrap_err();
        assert!(matches!(
            err,
            ServoError::Connection(ConnectionError::UnsupportedProtocol { .. })
        ));
        assert!(!sim.is_open());
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let registry = Arc::new(ModelRegistry::builtin().unwrap());
        let config = ControllerConfig {
            poll_interval: Duration::ZERO,
            ..Default::default()
        };
        let err = Controller::new(SimulatedBus::new(), Arc::clone(&registry), config)
            .err()
            .unwrap();
        assert_eq!(err.category(), "configuration");
        assert!(err.to_string().contains("poll_interval"));

        let config = ControllerConfig {
            scan_ids: vec![254],
            ..Default::default()
        };
        assert!(Controller::new(SimulatedBus::new(), registry, config).is_err());
    }

    #[tokio::test]
    async fn test_open_failure_returns_to_disconnected() {
        let sim = SimulatedBus::new();
        sim.fail_open(true);
        let mut controller = controller(&sim);

        let err = controller.connect(None).await.unwrap_err();
        assert!(matches!(err, ServoError::Connection(ConnectionError::OpenFailed { .. })));
        assert_eq!(controller.state(), ControllerState::Disconnected);
    }

    #[tokio::test]
    async fn test_baud_failure_closes_transport() {
        let sim = SimulatedBus::new().with_servo(1, &xm430::model().unwrap());
        sim.fail_baud_rate(true);
        let mut controller = controller(&sim);

        let err = controller.connect(None).await.unwrap_err();
        assert!(matches!(
            err,
            ServoError::Connection(ConnectionError::BaudRateFailed { baud_rate: 57_600, .. })
        ));
        assert_eq!(controller.state(), ControllerState::Disconnected);
        assert!(!sim.is_open());
        assert!(controller.connected_ids().is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let sim = SimulatedBus::new().with_servo(1, &xm430::model().unwrap());
        let mut controller = controller(&sim);
        controller.connect(None).await.unwrap();

        controller.disconnect().await;
        controller.disconnect().await;
        assert_eq!(controller.state(), ControllerState::Disconnected);
        assert!(controller.connected_ids().is_empty());
        assert!(!sim.is_open());

        // Reconnect after disconnect.
        assert_eq!(controller.connect(None).await.unwrap(), BTreeSet::from([1]));
    }

    #[tokio::test]
    async fn test_set_all_torque() {
        let sim = SimulatedBus::new()
            .with_servo(1, &xm430::model().unwrap())
            .with_servo(2, &xm430::model().unwrap());
        let mut controller = controller(&sim);
        controller.connect(None).await.unwrap();

        assert!(controller.set_all_torque(true).await);
        assert_eq!(sim.peek(1, 64, 1), Some(1));
        assert_eq!(sim.peek(2, 64, 1), Some(1));

        sim.set_hardware_error(2, HardwareErrors::OVERLOAD);
        assert!(!controller.set_all_torque(false).await);
        assert_eq!(sim.peek(1, 64, 1), Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_stopped_returns_when_idle() {
        let sim = SimulatedBus::new().with_servo(1, &xm430::model().unwrap());
        let mut controller = controller(&sim);
        controller.connect(None).await.unwrap();

        let started = Instant::now();
        controller
            .wait_until_stopped(Duration::from_secs(1))
            .await
            .unwrap();
        assert!(started.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_stopped_sees_motion_end() {
        let sim = SimulatedBus::new().with_servo(1, &xm430::model().unwrap());
        sim.poke(1, MOVING_ADDRESS, RegisterSize::Byte, 1);
        let mut controller = controller(&sim);
        controller.connect(None).await.unwrap();

        let stopper = sim.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(250)).await;
            stopper.poke(1, MOVING_ADDRESS, RegisterSize::Byte, 0);
        });

        let started = Instant::now();
        controller
            .wait_until_stopped(Duration::from_secs(1))
            .await
            .unwrap();
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(250) && elapsed < Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_stopped_times_out() {
        let sim = SimulatedBus::new()
            .with_servo(1, &xm430::model().unwrap())
            .with_servo(2, &xm430::model().unwrap());
        sim.poke(2, MOVING_ADDRESS, RegisterSize::Byte, 1);
        let mut controller = controller(&sim);
        controller.connect(None).await.unwrap();

        let started = Instant::now();
        let err = controller
            .wait_until_stopped(Duration::from_millis(300))
            .await
            .unwrap_err();
        let elapsed = started.elapsed();

        match err {
            ServoError::Timeout(TimeoutError::MotionWait { timeout, pending }) => {
                assert_eq!(timeout, Duration::from_millis(300));
                assert_eq!(pending, vec![2]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(elapsed >= Duration::from_millis(300) && elapsed < Duration::from_millis(350));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_counts_read_failures_as_moving() {
        let sim = SimulatedBus::new().with_servo(1, &xm430::model().unwrap());
        let mut controller = controller(&sim);
        controller.connect(None).await.unwrap();
        sim.set_silent(1, true);

        let err = controller
            .wait_until_stopped(Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServoError::Timeout(TimeoutError::MotionWait { ref pending, .. }) if pending == &vec![1]
        ));
    }

    #[tokio::test]
    async fn test_servo_handles_share_bus() {
        let sim = SimulatedBus::new().with_servo(1, &xm430::model().unwrap());
        let mut controller = controller(&sim);
        controller.connect(None).await.unwrap();

        let servo = controller.servo(1).unwrap().clone();
        servo.set_position(90.0).await.unwrap();
        assert_eq!(
            controller.servo(1).unwrap().read_raw(registers::GOAL_POSITION).await.unwrap(),
            1024
        );
    }
}
