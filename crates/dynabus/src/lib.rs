// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # dynabus
//!
//! Control-table driven servo bus stack for Dynamixel protocol 2.0 devices.
//!
//! This crate provides:
//!
//! - **Control tables**: register schemas with access rules, value ranges and
//!   unit conversions ([`control_table`])
//! - **Models**: XM430-W210 and XL430-W250 capability profiles and an explicit
//!   [`ModelRegistry`] used for detection
//! - **Register engine**: validated, converted reads and writes by register
//!   name on a [`Servo`] handle
//! - **Controller**: bus lifecycle, discovery, torque and motion coordination
//! - **Transports**: a `tokio-serial` port and a frame-level [`SimulatedBus`]
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Controller                              │
//! │         (connect, scan, set_all_torque, wait_until_stopped)     │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 Servo (typed accessors + engine)                │
//! │              Model ── ControlTable ── Conversions               │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 Bus (one exchange per lock)                     │
//! │                 dynabus-protocol codec                          │
//! └─────────────────────────────────────────────────────────────────┘
//!            │                                     │
//!            ▼                                     ▼
//! ┌─────────────────────┐             ┌─────────────────────┐
//! │   SerialTransport   │             │    SimulatedBus     │
//! │   (tokio-serial)    │             │     (in-memory)     │
//! └─────────────────────┘             └─────────────────────┘
//! ```
//!
//! ## Features
//!
//! - `serial` (default): real serial port transport and adapter detection
//!
//! ## Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use dynabus::prelude::*;
//! use dynabus::model::xm430;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> ServoResult<()> {
//! let sim = SimulatedBus::new().with_servo(1, &xm430::model()?);
//! let registry = Arc::new(ModelRegistry::builtin()?);
//! let mut controller = Controller::new(sim, registry, ControllerConfig::default())?;
//!
//! let found = controller.connect(None).await?;
//! assert!(found.contains(&1));
//!
//! if let Some(servo) = controller.servo(1) {
//!     servo.enable_torque().await?;
//!     servo.set_position(180.0).await?;
//! }
//! controller.wait_until_stopped(controller.config().wait_timeout).await?;
//! controller.disconnect().await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod bus;
pub mod config;
pub mod control_table;
pub mod controller;
pub mod engine;
pub mod error;
pub mod model;
pub mod registers;
pub mod servo;
pub mod transport;
pub mod types;

// =============================================================================
// Re-exports
// =============================================================================

pub use bus::{Bus, PingInfo, StatusReply};
pub use config::{ControllerConfig, ControllerConfigBuilder};
pub use control_table::{Access, Conversion, ControlTable, ControlTableItem, RegisterSize, ValueRange};
pub use controller::{Controller, ControllerState};
pub use error::{
    // Main error type
    ServoError,
    ServoResult,
    // Error categories
    CapabilityError,
    CommFailure,
    CommunicationError,
    ConfigurationError,
    ConnectionError,
    ModelError,
    RegisterError,
    ServoFault,
    TimeoutError,
    // Error metadata
    ErrorSeverity,
};
pub use model::{Feature, FeatureSet, Model, ModelBuilder, ModelInfo, ModelRegistry, OperatingMode};
pub use servo::{PiGains, PidGains, Servo};
pub use transport::{BusTransport, SimulatedBus, TransportError, TransportResult, TransportState};
pub use types::{BaudRate, ServoId};

#[cfg(feature = "serial")]
pub use transport::{find_port, SerialTransport};

pub use dynabus_protocol::{FactoryResetMode, HardwareErrors, ProtocolError};

/// Commonly used types.
pub mod prelude {
    pub use crate::config::ControllerConfig;
    pub use crate::controller::{Controller, ControllerState};
    pub use crate::error::{ServoError, ServoResult};
    pub use crate::model::{Feature, ModelRegistry, OperatingMode};
    pub use crate::registers;
    pub use crate::servo::{PiGains, PidGains, Servo};
    pub use crate::transport::{BusTransport, SimulatedBus};
    pub use crate::types::{BaudRate, ServoId};

    #[cfg(feature = "serial")]
    pub use crate::transport::SerialTransport;
}
