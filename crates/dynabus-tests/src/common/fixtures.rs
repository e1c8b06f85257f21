// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Fixtures
//!
//! Pre-built configurations, registries, buses and controllers.
//!
//! Every bus fixture returns the [`SimulatedBus`] handle alongside whatever
//! owns its clone, so tests can inject faults and inspect memory.

use std::sync::Arc;
use std::time::Duration;

use dynabus::model::{xl430, xm430};
use dynabus::{Bus, Controller, ControllerConfig, Model, ModelRegistry, Servo, ServoId, SimulatedBus};

// =============================================================================
// Model Fixtures
// =============================================================================

/// Fixture providing models and registries.
pub struct ModelFixtures;

impl ModelFixtures {
    /// The XM430-W210 model.
    pub fn xm430() -> Model {
        xm430::model().expect("XM430 model builds")
    }

    /// The XL430-W250 model.
    pub fn xl430() -> Model {
        xl430::model().expect("XL430 model builds")
    }

    /// Registry with every built-in model.
    pub fn registry() -> Arc<ModelRegistry> {
        Arc::new(ModelRegistry::builtin().expect("built-in registry builds"))
    }
}

// =============================================================================
// Config Fixtures
// =============================================================================

/// Fixture providing controller configurations.
pub struct ConfigFixtures;

impl ConfigFixtures {
    /// Default settings.
    pub fn default_config() -> ControllerConfig {
        ControllerConfig::default()
    }

    /// Short deadlines for tests that expect missing replies.
    pub fn fast() -> ControllerConfig {
        ControllerConfig::builder()
            .response_timeout(Duration::from_millis(10))
            .poll_interval(Duration::from_millis(20))
            .wait_timeout(Duration::from_millis(200))
            .build()
            .expect("fast config is valid")
    }

    /// Default settings probing `ids`.
    pub fn scanning(ids: impl IntoIterator<Item = u8>) -> ControllerConfig {
        ControllerConfig::builder()
            .scan_ids(ids)
            .build()
            .expect("scan config is valid")
    }
}

// =============================================================================
// Bus Fixtures
// =============================================================================

/// Fixture providing simulated buses.
pub struct BusFixtures;

impl BusFixtures {
    /// Empty bus.
    pub fn empty() -> SimulatedBus {
        SimulatedBus::new()
    }

    /// One XM430 at id 1.
    pub fn single_xm430() -> SimulatedBus {
        SimulatedBus::new().with_servo(1, &ModelFixtures::xm430())
    }

    /// XM430s at ids 1 and 3, XL430 at id 2.
    pub fn mixed() -> SimulatedBus {
        SimulatedBus::new()
            .with_servo(1, &ModelFixtures::xm430())
            .with_servo(2, &ModelFixtures::xl430())
            .with_servo(3, &ModelFixtures::xm430())
    }

    /// XM430s at each of `ids`.
    pub fn xm430_at(ids: &[u8]) -> SimulatedBus {
        let bus = SimulatedBus::new();
        let model = ModelFixtures::xm430();
        for &id in ids {
            bus.add_servo(id, &model);
        }
        bus
    }
}

// =============================================================================
// Controller / Servo Fixtures
// =============================================================================

/// Fixture providing controllers and servo handles over simulated buses.
pub struct ControllerFixtures;

impl ControllerFixtures {
    /// A disconnected controller over `bus` with `config`.
    pub fn with_config(bus: &SimulatedBus, config: ControllerConfig) -> Controller<SimulatedBus> {
        Controller::new(bus.clone(), ModelFixtures::registry(), config).expect("config is valid")
    }

    /// A disconnected controller over `bus` with default settings.
    pub fn disconnected(bus: &SimulatedBus) -> Controller<SimulatedBus> {
        Self::with_config(bus, ConfigFixtures::default_config())
    }

    /// A controller over `bus` that has connected and scanned the default ids.
    pub async fn connected(bus: &SimulatedBus) -> Controller<SimulatedBus> {
        let mut controller = Self::disconnected(bus);
        controller.connect(None).await.expect("connect succeeds");
        controller
    }

    /// An open bus and an XM430 handle at id 1, model already bound.
    pub async fn xm430_servo() -> (SimulatedBus, Servo<SimulatedBus>) {
        let sim = BusFixtures::single_xm430();
        let bus = Bus::new(sim.clone(), Duration::from_millis(50));
        bus.open().await.expect("simulated bus opens");
        let id = ServoId::new(1).expect("valid id");
        let servo = Servo::new(id, bus).with_model(Arc::new(ModelFixtures::xm430()));
        (sim, servo)
    }

    /// An open bus and an XL430 handle at id 1, model already bound.
    pub async fn xl430_servo() -> (SimulatedBus, Servo<SimulatedBus>) {
        let sim = SimulatedBus::new().with_servo(1, &ModelFixtures::xl430());
        let bus = Bus::new(sim.clone(), Duration::from_millis(50));
        bus.open().await.expect("simulated bus opens");
        let id = ServoId::new(1).expect("valid id");
        let servo = Servo::new(id, bus).with_model(Arc::new(ModelFixtures::xl430()));
        (sim, servo)
    }
}
