// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # dynabus-bin
//!
//! Command-line front end for the dynabus servo stack.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         main.rs                             │
//! └─────────────────────────┬───────────────────────────────────┘
//!                           │
//!               ┌───────────┼───────────┐
//!               ▼           ▼           ▼
//!        ┌──────────┐ ┌──────────┐ ┌──────────┐
//!        │   cli    │ │  config  │ │ logging  │
//!        └──────────┘ └──────────┘ └──────────┘
//!                           │
//!                    ┌──────▼──────┐
//!                    │  commands   │
//!                    └──────┬──────┘
//!                           │
//!                    ┌──────▼──────┐
//!                    │   dynabus   │
//!                    └─────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # List servos on the auto-detected adapter
//! dynabus scan
//!
//! # Read servo 1 from a specific port as JSON
//! dynabus --port /dev/ttyUSB0 --format json status 1
//!
//! # Move servo 2 to 90 degrees and wait for it to settle
//! dynabus move 2 90 --wait
//!
//! # Try it without hardware
//! dynabus --simulate scan
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;

pub use cli::{Cli, Commands};
pub use error::{BinError, BinResult};
pub use logging::init_logging;
