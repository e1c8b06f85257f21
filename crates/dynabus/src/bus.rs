// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Request/response exchanges over a shared transport.
//!
//! [`Bus`] owns the transport behind an async mutex. Each exchange is one
//! critical section: lock, drop stale input, send, collect the reply under a
//! deadline, unlock. The guard is a local, so the lock is released on every
//! exit path including cancellation of the calling future.
//!
//! Failures are reported as [`CommFailure`] without a device context; the
//! register engine attaches the id and maps them onto [`ServoError`](crate::error::ServoError).

use std::sync::Arc;
use std::time::Duration;

use dynabus_protocol::{
    FactoryResetMode, FrameAssembler, HardwareErrors, Instruction, Packet, StatusPacket,
    BROADCAST_ID, MAX_PACKET_LENGTH,
};
use tokio::sync::Mutex;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, trace};

use crate::error::CommFailure;
use crate::transport::{BusTransport, TransportResult};

/// A decoded reply: the responding id, its error byte and a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReply<V> {
    /// Responding device.
    pub id: u8,
    /// Error byte reported by the device.
    pub errors: HardwareErrors,
    /// Payload.
    pub value: V,
}

impl<V> StatusReply<V> {
    /// Returns `true` if the device reported no error.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Information returned by PING.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingInfo {
    /// Model number.
    pub model_number: u16,
    /// Firmware version.
    pub firmware_version: u8,
}

// =============================================================================
// Bus
// =============================================================================

/// Shared handle to one serial bus.
pub struct Bus<T> {
    transport: Arc<Mutex<T>>,
    response_timeout: Duration,
}

impl<T> Clone for Bus<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            response_timeout: self.response_timeout,
        }
    }
}

impl<T: BusTransport> Bus<T> {
    /// Wraps a transport.
    pub fn new(transport: T, response_timeout: Duration) -> Self {
        Self {
            transport: Arc::new(Mutex::new(transport)),
            response_timeout,
        }
    }

    /// Per-exchange response deadline.
    pub fn response_timeout(&self) -> Duration {
        self.response_timeout
    }

    // =========================================================================
    // Port control
    // =========================================================================

    /// Opens the transport.
    pub async fn open(&self) -> TransportResult<()> {
        self.transport.lock().await.open().await
    }

    /// Closes the transport.
    pub async fn close(&self) -> TransportResult<()> {
        self.transport.lock().await.close().await
    }

    /// Changes the line speed.
    pub async fn set_baud_rate(&self, baud_rate: u32) -> TransportResult<()> {
        self.transport.lock().await.set_baud_rate(baud_rate).await
    }

    /// Returns `true` if the transport is open.
    pub async fn is_open(&self) -> bool {
        self.transport.lock().await.is_open()
    }

    /// Transport display name.
    pub async fn display_name(&self) -> String {
        self.transport.lock().await.display_name()
    }

    // =========================================================================
    // Exchanges
    // =========================================================================

    /// Sends `request` and waits for the addressed device's STATUS reply.
    ///
    /// Returns `Ok(None)` for broadcasts and instructions that are not
    /// answered. Frames from other ids and non-STATUS frames (adapter echo)
    /// are skipped.
    pub async fn transact(&self, request: &Packet) -> Result<Option<StatusPacket>, CommFailure> {
        let frame = request.encode().map_err(CommFailure::InvalidRequest)?;

        let mut transport = self.transport.lock().await;
        if !transport.is_open() {
            return Err(CommFailure::NotOpen);
        }
        transport
            .clear_input()
            .await
            .map_err(|e| CommFailure::Transmit(e.to_string()))?;
        transport
            .send(&frame)
            .await
            .map_err(|e| CommFailure::Transmit(e.to_string()))?;
        trace!(id = request.id, instruction = %request.instruction, bytes = frame.len(), "Sent");

        if request.id == BROADCAST_ID || !request.instruction.expects_status() {
            return Ok(None);
        }

        let deadline = Instant::now() + self.response_timeout;
        let mut assembler = FrameAssembler::new();
        let mut buf = [0u8; MAX_PACKET_LENGTH];
        loop {
            while let Some(decoded) = assembler.next_frame() {
                let packet = decoded.map_err(CommFailure::Corrupt)?;
                if packet.id != request.id || packet.instruction != Instruction::Status {
                    debug!(
                        expected = request.id,
                        id = packet.id,
                        instruction = %packet.instruction,
                        "Skipping unrelated frame"
                    );
                    continue;
                }
                let status = packet.into_status().map_err(CommFailure::Corrupt)?;
                return Ok(Some(status));
            }

            let n = match timeout_at(deadline, transport.receive(&mut buf)).await {
                Ok(Ok(n)) => n,
                Ok(Err(e)) => return Err(CommFailure::Receive(e.to_string())),
                Err(_) => {
                    return Err(CommFailure::NoResponse {
                        timeout: self.response_timeout,
                    })
                }
            };
            assembler.push(&buf[..n]);
        }
    }

    async fn expect_status(&self, request: Packet) -> Result<StatusPacket, CommFailure> {
        self.transact(&request)
            .await?
            .ok_or_else(|| CommFailure::Unexpected(format!("no status for {}", request.instruction)))
    }

    /// PING: presence check returning model number and firmware version.
    pub async fn ping(&self, id: u8) -> Result<StatusReply<PingInfo>, CommFailure> {
        let status = self.expect_status(Packet::ping(id)).await?;
        let value = match status.data.as_slice() {
            [m0, m1, firmware] => PingInfo {
                model_number: u16::from_le_bytes([*m0, *m1]),
                firmware_version: *firmware,
            },
            other => {
                return Err(CommFailure::Unexpected(format!(
                    "ping reply of {} bytes",
                    other.len()
                )))
            }
        };
        Ok(StatusReply {
            id: status.id,
            errors: status.errors,
            value,
        })
    }

    /// READ of `length` bytes at `address`.
    pub async fn read(
        &self,
        id: u8,
        address: u16,
        length: u16,
    ) -> Result<StatusReply<Vec<u8>>, CommFailure> {
        let status = self.expect_status(Packet::read(id, address, length)).await?;
        if status.data.len() != usize::from(length) {
            return Err(CommFailure::Unexpected(format!(
                "read of {length} bytes at {address} returned {} bytes",
                status.data.len()
            )));
        }
        Ok(StatusReply {
            id: status.id,
            errors: status.errors,
            value: status.data,
        })
    }

    /// WRITE of `data` at `address`.
    pub async fn write(&self, id: u8, address: u16, data: &[u8]) -> Result<StatusReply<()>, CommFailure> {
        let status = self.expect_status(Packet::write(id, address, data)).await?;
        Ok(StatusReply {
            id: status.id,
            errors: status.errors,
            value: (),
        })
    }

    /// REBOOT.
    pub async fn reboot(&self, id: u8) -> Result<StatusReply<()>, CommFailure> {
        let status = self.expect_status(Packet::reboot(id)).await?;
        Ok(StatusReply {
            id: status.id,
            errors: status.errors,
            value: (),
        })
    }

    /// FACTORY_RESET.
    pub async fn factory_reset(
        &self,
        id: u8,
        mode: FactoryResetMode,
    ) -> Result<StatusReply<()>, CommFailure> {
        let status = self.expect_status(Packet::factory_reset(id, mode)).await?;
        Ok(StatusReply {
            id: status.id,
            errors: status.errors,
            value: (),
        })
    }
}
