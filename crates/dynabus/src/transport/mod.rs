// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Byte-level transport boundary.
//!
//! This module defines the [`BusTransport`] trait that the [`Bus`](crate::bus::Bus)
//! drives. Implementations move raw bytes only; framing, checksums and
//! deadlines live above this layer.
//!
//! # Implementors
//!
//! - `SerialTransport`: a real serial port via `tokio-serial` (feature `serial`)
//! - [`SimulatedBus`](sim::SimulatedBus): in-memory devices for tests and dry runs

#[cfg(feature = "serial")]
pub mod serial;
pub mod sim;

use std::fmt;
use std::io;

use async_trait::async_trait;
use thiserror::Error;

#[cfg(feature = "serial")]
pub use serial::{find_port, SerialTransport};
pub use sim::SimulatedBus;

/// Result type alias for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

// =============================================================================
// TransportState
// =============================================================================

/// Connection state of a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransportState {
    /// Port is closed.
    #[default]
    Disconnected,
    /// Port is being opened.
    Connecting,
    /// Port is open.
    Connected,
    /// The last open or I/O attempt failed.
    Error,
}

impl TransportState {
    /// Returns `true` if the port is open.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

// =============================================================================
// TransportError
// =============================================================================

/// Failures reported by a transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The port does not exist.
    #[error("port not found: {port}")]
    PortNotFound {
        /// Port path.
        port: String,
    },

    /// The port cannot be opened by this user.
    #[error("access denied: {port}")]
    AccessDenied {
        /// Port path.
        port: String,
    },

    /// Opening the port failed for another reason.
    #[error("open failed: {0}")]
    OpenFailed(String),

    /// The port rejected a baud rate.
    #[error("baud rate {baud_rate} rejected: {message}")]
    BaudRate {
        /// Requested baud rate.
        baud_rate: u32,
        /// Underlying error message.
        message: String,
    },

    /// An operation needed an open port.
    #[error("port is not open")]
    NotOpen,

    /// I/O failure on an open port.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

// =============================================================================
// BusTransport Trait
// =============================================================================

/// Half-duplex byte transport shared by every device on one bus.
///
/// All methods take `&mut self`; the [`Bus`](crate::bus::Bus) holds the
/// transport behind an async mutex and owns it for one exchange at a time.
#[async_trait]
pub trait BusTransport: Send {
    // =========================================================================
    // Connection Management
    // =========================================================================

    /// Opens the port.
    async fn open(&mut self) -> TransportResult<()>;

    /// Closes the port. Closing a closed port is not an error.
    async fn close(&mut self) -> TransportResult<()>;

    /// Changes the line speed of an open port.
    async fn set_baud_rate(&mut self, baud_rate: u32) -> TransportResult<()>;

    /// Returns `true` if the port is open.
    fn is_open(&self) -> bool;

    /// Returns the current state.
    fn state(&self) -> TransportState;

    // =========================================================================
    // I/O
    // =========================================================================

    /// Discards any bytes received but not yet read.
    ///
    /// # Default Implementation
    ///
    /// Does nothing.
    async fn clear_input(&mut self) -> TransportResult<()> {
        Ok(())
    }

    /// Writes all of `bytes`.
    async fn send(&mut self, bytes: &[u8]) -> TransportResult<()>;

    /// Waits for at least one byte and copies what is available into `buf`.
    ///
    /// Deadlines are applied by the caller, so this may wait indefinitely.
    async fn receive(&mut self, buf: &mut [u8]) -> TransportResult<usize>;

    // =========================================================================
    // Metadata
    // =========================================================================

    /// Returns a display name for this transport.
    fn display_name(&self) -> String;
}
