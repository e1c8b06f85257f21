// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # dynabus Integration Tests
//!
//! Integration suites for the dynabus workspace and the shared helpers they
//! use. Every suite runs against the in-memory [`SimulatedBus`]
//! (`dynabus::SimulatedBus`), so no hardware is needed.
//!
//! ## Module Structure
//!
//! - [`common`]: Shared test utilities
//!   - `fixtures`: Pre-built configurations, registries, buses and controllers
//!   - `assertions`: Assertion helpers for errors, values and bus traffic
//!
//! ## Running Tests
//!
//! ```bash
//! # Run all integration tests
//! cargo test -p dynabus-tests
//!
//! # Run one suite
//! cargo test -p dynabus-tests --test integration_protocol
//! cargo test -p dynabus-tests --test integration_servo
//! cargo test -p dynabus-tests --test integration_controller
//! cargo test -p dynabus-tests --test integration_config
//! ```
//!
//! ## Test Categories
//!
//! ### Protocol (`integration_protocol.rs`)
//! - Frame vectors, CRC cross-check, stream reassembly
//!
//! ### Servo (`integration_servo.rs`)
//! - Register conversions, validation boundaries, access gating, faults
//!
//! ### Controller (`integration_controller.rs`)
//! - Lifecycle, discovery resilience, torque fan-out, motion waits
//!
//! ### Config (`integration_config.rs`)
//! - YAML/TOML loading and environment overrides

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod common;

/// Re-export commonly used items for convenience.
pub mod prelude {
    pub use crate::common::assertions::*;
    pub use crate::common::fixtures::*;
    pub use crate::common::init_test_logging;
}
