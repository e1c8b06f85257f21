// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Serial port transport over `tokio-serial`.
//!
//! The port is opened 8N1 at the requested baud rate. USB adapters are
//! auto-detected by vendor id when no port is configured.

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{ClearBuffer, SerialPort, SerialPortBuilderExt, SerialPortType, SerialStream};
use tracing::{debug, info};

use super::{BusTransport, TransportError, TransportResult, TransportState};

/// USB vendor ids of common servo adapters: FTDI, Silicon Labs, Prolific.
const ADAPTER_VENDOR_IDS: [u16; 3] = [0x0403, 0x10c4, 0x067b];

/// Finds the first serial port that looks like a servo adapter.
///
/// Prefers ports whose USB vendor id matches a known adapter, then falls
/// back to any port whose name contains `USB`.
pub fn find_port() -> Option<String> {
    let ports = tokio_serial::available_ports().ok()?;

    let by_vendor = ports.iter().find(|info| match &info.port_type {
        SerialPortType::UsbPort(usb) => ADAPTER_VENDOR_IDS.contains(&usb.vid),
        _ => false,
    });
    if let Some(info) = by_vendor {
        debug!(port = %info.port_name, "Adapter matched by USB vendor id");
        return Some(info.port_name.clone());
    }

    ports
        .iter()
        .find(|info| info.port_name.to_uppercase().contains("USB"))
        .map(|info| info.port_name.clone())
}

// =============================================================================
// SerialTransport
// =============================================================================

/// A servo bus on a local serial port.
pub struct SerialTransport {
    port: String,
    baud_rate: u32,
    stream: Option<SerialStream>,
    state: TransportState,
}

impl SerialTransport {
    /// Creates a closed transport for `port`.
    pub fn new(port: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port: port.into(),
            baud_rate,
            stream: None,
            state: TransportState::Disconnected,
        }
    }

    /// Returns the port path.
    pub fn port(&self) -> &str {
        &self.port
    }

    /// Returns the configured baud rate.
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    fn map_open_error(&self, error: tokio_serial::Error) -> TransportError {
        match error.kind {
            tokio_serial::ErrorKind::NoDevice => TransportError::PortNotFound {
                port: self.port.clone(),
            },
            tokio_serial::ErrorKind::Io(std::io::ErrorKind::NotFound) => TransportError::PortNotFound {
                port: self.port.clone(),
            },
            tokio_serial::ErrorKind::Io(std::io::ErrorKind::PermissionDenied) => {
                TransportError::AccessDenied {
                    port: self.port.clone(),
                }
            }
            _ => TransportError::OpenFailed(error.to_string()),
        }
    }

    fn stream_mut(&mut self) -> TransportResult<&mut SerialStream> {
        self.stream.as_mut().ok_or(TransportError::NotOpen)
    }
}

#[async_trait]
impl BusTransport for SerialTransport {
    async fn open(&mut self) -> TransportResult<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        self.state = TransportState::Connecting;
        match tokio_serial::new(&self.port, self.baud_rate).open_native_async() {
            Ok(stream) => {
                self.stream = Some(stream);
                self.state = TransportState::Connected;
                info!(port = %self.port, baud_rate = self.baud_rate, "Serial port opened");
                Ok(())
            }
            Err(e) => {
                self.state = TransportState::Error;
                Err(self.map_open_error(e))
            }
        }
    }

    async fn close(&mut self) -> TransportResult<()> {
        if self.stream.take().is_some() {
            info!(port = %self.port, "Serial port closed");
        }
        self.state = TransportState::Disconnected;
        Ok(())
    }

    async fn set_baud_rate(&mut self, baud_rate: u32) -> TransportResult<()> {
        let stream = self.stream_mut()?;
        stream
            .set_baud_rate(baud_rate)
            .map_err(|e| TransportError::BaudRate {
                baud_rate,
                message: e.to_string(),
            })?;
        self.baud_rate = baud_rate;
        debug!(port = %self.port, baud_rate, "Baud rate set");
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    fn state(&self) -> TransportState {
        self.state
    }

    async fn clear_input(&mut self) -> TransportResult<()> {
        let stream = self.stream_mut()?;
        stream
            .clear(ClearBuffer::Input)
            .map_err(|e| TransportError::Io(e.into()))
    }

    async fn send(&mut self, bytes: &[u8]) -> TransportResult<()> {
        let stream = self.stream_mut()?;
        stream.write_all(bytes).await?;
        stream.flush().await?;
        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8]) -> TransportResult<usize> {
        let stream = self.stream_mut()?;
        let n = stream.read(buf).await?;
        if n == 0 {
            return Err(TransportError::Io(std::io::ErrorKind::UnexpectedEof.into()));
        }
        Ok(n)
    }

    fn display_name(&self) -> String {
        format!("serial:{}@{}", self.port, self.baud_rate)
    }
}
