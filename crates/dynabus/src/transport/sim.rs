// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! In-memory servo bus.
//!
//! [`SimulatedBus`] implements [`BusTransport`] at frame level: every frame
//! sent is decoded with the protocol codec, applied to the addressed device's
//! register memory, and answered with an encoded STATUS frame that the next
//! `receive` returns. Devices are seeded from a [`Model`]'s register defaults.
//!
//! The handle is cheap to clone and all clones share state, so a test can
//! keep one clone for inspection and fault injection while the controller
//! owns another.
//!
//! ```
//! use dynabus::model::xm430;
//! use dynabus::transport::SimulatedBus;
//!
//! let model = xm430::model().unwrap();
//! let bus = SimulatedBus::new().with_servo(1, &model);
//! assert_eq!(bus.peek(1, 0, 2), Some(1030));
//! ```

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use dynabus_protocol::{FactoryResetMode, HardwareErrors, Instruction, Packet, BROADCAST_ID};
use parking_lot::Mutex;
use tracing::trace;

use super::{BusTransport, TransportError, TransportResult, TransportState};
use crate::control_table::RegisterSize;
use crate::model::Model;
use crate::registers;

/// Bytes of register memory per simulated device.
const MEMORY_SIZE: usize = 256;
/// `ID` and `BAUD_RATE` addresses, fixed across protocol 2.0 devices.
const ID_ADDRESS: usize = 7;
const BAUD_RATE_ADDRESS: usize = 8;

// =============================================================================
// Simulated device
// =============================================================================

#[derive(Debug, Clone)]
struct SimServo {
    memory: Vec<u8>,
    defaults: Vec<u8>,
    errors: HardwareErrors,
    silent: bool,
    /// `(goal, present)` position addresses; a goal write lands instantly.
    motion: Option<(u16, u16)>,
}

impl SimServo {
    fn from_model(id: u8, model: &Model) -> Self {
        let mut memory = vec![0u8; MEMORY_SIZE];
        for item in model.control_table().items() {
            if let Some(raw) = item.default {
                store(&mut memory, item.address, item.size, raw);
            }
        }
        if let Ok(item) = model.lookup(registers::ID) {
            store(&mut memory, item.address, item.size, i64::from(id));
        }
        let address = |name: &str| model.lookup(name).ok().map(|item| item.address);
        let motion = address(registers::GOAL_POSITION).zip(address(registers::PRESENT_POSITION));
        Self {
            defaults: memory.clone(),
            memory,
            errors: HardwareErrors::empty(),
            silent: false,
            motion,
        }
    }

    fn read(&self, address: u16, length: u16) -> Option<&[u8]> {
        let start = usize::from(address);
        self.memory.get(start..start + usize::from(length))
    }

    fn write(&mut self, address: u16, data: &[u8]) -> bool {
        let start = usize::from(address);
        let Some(target) = self.memory.get_mut(start..start + data.len()) else {
            return false;
        };
        target.copy_from_slice(data);
        if let Some((goal, present)) = self.motion {
            if address == goal && data.len() == 4 {
                let present = usize::from(present);
                self.memory[present..present + 4].copy_from_slice(data);
            }
        }
        true
    }

    fn factory_reset(&mut self, mode: u8) {
        let id = self.memory[ID_ADDRESS];
        let baud_rate = self.memory[BAUD_RATE_ADDRESS];
        self.memory.copy_from_slice(&self.defaults);
        if mode != FactoryResetMode::All.code() {
            self.memory[ID_ADDRESS] = id;
        }
        if mode == FactoryResetMode::ExceptIdAndBaudRate.code() {
            self.memory[BAUD_RATE_ADDRESS] = baud_rate;
        }
    }
}

fn store(memory: &mut [u8], address: u16, size: RegisterSize, raw: i64) {
    let start = usize::from(address);
    let bytes = size.encode(raw);
    if let Some(target) = memory.get_mut(start..start + bytes.len()) {
        target.copy_from_slice(&bytes);
    }
}

// =============================================================================
// Shared state
// =============================================================================

#[derive(Debug, Default)]
struct SimState {
    servos: BTreeMap<u8, SimServo>,
    rx: VecDeque<u8>,
    open: bool,
    state: TransportState,
    baud_rate: u32,
    sent: Vec<Packet>,
    send_count: usize,
    corrupt_next: bool,
    fail_next_send: bool,
    fail_open: bool,
    fail_baud_rate: bool,
}

impl SimState {
    fn handle(&mut self, request: Packet) {
        let id = request.id;
        if id == BROADCAST_ID {
            return;
        }
        let Some(servo) = self.servos.get_mut(&id) else {
            return;
        };
        if servo.silent {
            return;
        }

        let params = request.params.as_slice();
        let data: Option<Vec<u8>> = match request.instruction {
            Instruction::Ping => {
                let mut reply = servo.memory[0..2].to_vec();
                reply.push(servo.memory[6]);
                Some(reply)
            }
            Instruction::Read => match params {
                [a0, a1, l0, l1] => {
                    let address = u16::from_le_bytes([*a0, *a1]);
                    let length = u16::from_le_bytes([*l0, *l1]);
                    Some(servo.read(address, length).map(<[u8]>::to_vec).unwrap_or_default())
                }
                _ => None,
            },
            Instruction::Write if params.len() > 2 => {
                let address = u16::from_le_bytes([params[0], params[1]]);
                servo.write(address, &params[2..]).then(Vec::new)
            }
            Instruction::Reboot => Some(Vec::new()),
            Instruction::FactoryReset => {
                let mode = params.first().copied().unwrap_or(FactoryResetMode::All.code());
                servo.factory_reset(mode);
                Some(Vec::new())
            }
            _ => None,
        };

        let Some(data) = data else {
            return;
        };
        let Ok(mut frame) = Packet::status(id, servo.errors, &data).encode() else {
            return;
        };
        if std::mem::take(&mut self.corrupt_next) {
            if let Some(last) = frame.last_mut() {
                *last ^= 0x01;
            }
        }
        self.rx.extend(frame);
    }
}

// =============================================================================
// SimulatedBus
// =============================================================================

/// A simulated multi-drop servo bus.
#[derive(Debug, Clone)]
pub struct SimulatedBus {
    inner: Arc<Mutex<SimState>>,
}

impl Default for SimulatedBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedBus {
    /// Creates an empty, closed bus.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SimState {
                baud_rate: 57_600,
                ..SimState::default()
            })),
        }
    }

    /// Adds a device and returns the bus.
    pub fn with_servo(self, id: u8, model: &Model) -> Self {
        self.add_servo(id, model);
        self
    }

    /// Adds or replaces device `id`, seeded from `model`'s defaults.
    pub fn add_servo(&self, id: u8, model: &Model) {
        self.inner.lock().servos.insert(id, SimServo::from_model(id, model));
    }

    /// Removes device `id`.
    pub fn remove_servo(&self, id: u8) -> bool {
        self.inner.lock().servos.remove(&id).is_some()
    }

    /// Ids of all simulated devices.
    pub fn servo_ids(&self) -> Vec<u8> {
        self.inner.lock().servos.keys().copied().collect()
    }

    /// Makes device `id` ignore every request.
    pub fn set_silent(&self, id: u8, silent: bool) {
        if let Some(servo) = self.inner.lock().servos.get_mut(&id) {
            servo.silent = silent;
        }
    }

    /// Stores `raw` little-endian at `address` of device `id`.
    pub fn poke(&self, id: u8, address: u16, size: RegisterSize, raw: i64) {
        if let Some(servo) = self.inner.lock().servos.get_mut(&id) {
            store(&mut servo.memory, address, size, raw);
        }
    }

    /// Reads `size` bytes at `address` of device `id` as an unsigned value.
    pub fn peek(&self, id: u8, address: u16, size: u8) -> Option<i64> {
        let size = RegisterSize::try_from(usize::from(size)).ok()?;
        let state = self.inner.lock();
        let servo = state.servos.get(&id)?;
        size.decode(servo.read(address, u16::from(size.bytes()))?, false)
    }

    /// Sets the error byte device `id` reports in every reply.
    pub fn set_hardware_error(&self, id: u8, errors: HardwareErrors) {
        if let Some(servo) = self.inner.lock().servos.get_mut(&id) {
            servo.errors = errors;
        }
    }

    /// Flips a checksum bit in the next reply.
    pub fn corrupt_next_response(&self) {
        self.inner.lock().corrupt_next = true;
    }

    /// Fails the next `send` with an I/O error.
    pub fn fail_next_send(&self) {
        self.inner.lock().fail_next_send = true;
    }

    /// Makes `open` fail while set.
    pub fn fail_open(&self, fail: bool) {
        self.inner.lock().fail_open = fail;
    }

    /// Makes `set_baud_rate` fail while set.
    pub fn fail_baud_rate(&self, fail: bool) {
        self.inner.lock().fail_baud_rate = fail;
    }

    /// Decoded requests sent so far.
    pub fn sent_packets(&self) -> Vec<Packet> {
        self.inner.lock().sent.clone()
    }

    /// Number of `send` calls, including failed ones.
    pub fn sent_count(&self) -> usize {
        self.inner.lock().send_count
    }

    /// Clears the request log and counter.
    pub fn clear_log(&self) {
        let mut state = self.inner.lock();
        state.sent.clear();
        state.send_count = 0;
    }

    /// Current line speed.
    pub fn baud_rate(&self) -> u32 {
        self.inner.lock().baud_rate
    }
}

#[async_trait]
impl BusTransport for SimulatedBus {
    async fn open(&mut self) -> TransportResult<()> {
        let mut state = self.inner.lock();
        if state.fail_open {
            state.state = TransportState::Error;
            return Err(TransportError::OpenFailed("simulated open failure".into()));
        }
        state.open = true;
        state.state = TransportState::Connected;
        Ok(())
    }

    async fn close(&mut self) -> TransportResult<()> {
        let mut state = self.inner.lock();
        state.open = false;
        state.state = TransportState::Disconnected;
        state.rx.clear();
        Ok(())
    }

    async fn set_baud_rate(&mut self, baud_rate: u32) -> TransportResult<()> {
        let mut state = self.inner.lock();
        if !state.open {
            return Err(TransportError::NotOpen);
        }
        if state.fail_baud_rate {
            return Err(TransportError::BaudRate {
                baud_rate,
                message: "simulated baud rate failure".into(),
            });
        }
        state.baud_rate = baud_rate;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.inner.lock().open
    }

    fn state(&self) -> TransportState {
        self.inner.lock().state
    }

    async fn clear_input(&mut self) -> TransportResult<()> {
        self.inner.lock().rx.clear();
        Ok(())
    }

    async fn send(&mut self, bytes: &[u8]) -> TransportResult<()> {
        let mut state = self.inner.lock();
        state.send_count += 1;
        if !state.open {
            return Err(TransportError::NotOpen);
        }
        if std::mem::take(&mut state.fail_next_send) {
            return Err(TransportError::Io(std::io::ErrorKind::BrokenPipe.into()));
        }
        match Packet::decode(bytes) {
            Ok(request) => {
                trace!(id = request.id, instruction = %request.instruction, "Simulated request");
                state.sent.push(request.clone());
                state.handle(request);
            }
            Err(e) => trace!(error = %e, "Simulated bus dropped an undecodable frame"),
        }
        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8]) -> TransportResult<usize> {
        {
            let mut state = self.inner.lock();
            if !state.open {
                return Err(TransportError::NotOpen);
            }
            if !state.rx.is_empty() {
                let n = buf.len().min(state.rx.len());
                for (slot, byte) in buf.iter_mut().zip(state.rx.drain(..n)) {
                    *slot = byte;
                }
                return Ok(n);
            }
        }
        // Nothing will arrive; the caller's deadline ends the wait.
        std::future::pending().await
    }

    fn display_name(&self) -> String {
        "simulated".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::xm430;
    use dynabus_protocol::FrameAssembler;

    async fn exchange(bus: &mut SimulatedBus, request: Packet) -> Packet {
        bus.send(&request.encode().unwrap()).await.unwrap();
        let mut buf = [0u8; 64];
        let n = bus.receive(&mut buf).await.unwrap();
        let mut assembler = FrameAssembler::new();
        assembler.push(&buf[..n]);
        assembler.next_frame().unwrap().unwrap()
    }

    fn bus() -> SimulatedBus {
        SimulatedBus::new().with_servo(1, &xm430::model().unwrap())
    }

    #[tokio::test]
    async fn test_ping_reply() {
        let mut bus = bus();
        bus.open().await.unwrap();
        let reply = exchange(&mut bus, Packet::ping(1)).await.into_status().unwrap();
        assert_eq!(reply.id, 1);
        assert!(reply.is_ok());
        assert_eq!(&reply.data[..2], &1030u16.to_le_bytes());
    }

    #[tokio::test]
    async fn test_goal_write_moves_present_position() {
        let mut bus = bus();
        bus.open().await.unwrap();
        let reply = exchange(&mut bus, Packet::write(1, 116, &2048u32.to_le_bytes())).await;
        assert!(reply.into_status().unwrap().data.is_empty());
        assert_eq!(bus.peek(1, 132, 4), Some(2048));
        assert_eq!(bus.sent_count(), 1);
        assert_eq!(bus.sent_packets()[0].instruction, Instruction::Write);
    }

    #[tokio::test]
    async fn test_defaults_and_poke() {
        let bus = bus();
        assert_eq!(bus.peek(1, 7, 1), Some(1));
        assert_eq!(bus.peek(1, 48, 4), Some(4095));
        bus.poke(1, 122, RegisterSize::Byte, 1);
        assert_eq!(bus.peek(1, 122, 1), Some(1));
        assert_eq!(bus.peek(2, 122, 1), None);
    }

    #[tokio::test]
    async fn test_hardware_error_in_reply() {
        let mut bus = bus();
        bus.open().await.unwrap();
        bus.set_hardware_error(1, HardwareErrors::OVERHEATING);
        let reply = exchange(&mut bus, Packet::read(1, 146, 1)).await.into_status().unwrap();
        assert_eq!(reply.errors, HardwareErrors::OVERHEATING);
        assert_eq!(reply.data, vec![30]);
    }

    #[tokio::test]
    async fn test_corrupt_reply_fails_checksum() {
        let mut bus = bus();
        bus.open().await.unwrap();
        bus.corrupt_next_response();
        bus.send(&Packet::ping(1).encode().unwrap()).await.unwrap();
        let mut buf = [0u8; 64];
        let n = bus.receive(&mut buf).await.unwrap();
        assert!(Packet::decode(&buf[..n]).unwrap_err().is_checksum());
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_servo_never_replies() {
        let mut bus = bus();
        bus.open().await.unwrap();
        bus.set_silent(1, true);
        bus.send(&Packet::ping(1).encode().unwrap()).await.unwrap();
        let mut buf = [0u8; 16];
        let waited =
            tokio::time::timeout(std::time::Duration::from_millis(50), bus.receive(&mut buf)).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let mut bus = bus();
        bus.fail_open(true);
        assert!(bus.open().await.is_err());
        bus.fail_open(false);
        bus.open().await.unwrap();

        bus.fail_baud_rate(true);
        assert!(bus.set_baud_rate(1_000_000).await.is_err());
        bus.fail_baud_rate(false);
        bus.set_baud_rate(1_000_000).await.unwrap();
        assert_eq!(bus.baud_rate(), 1_000_000);

        bus.fail_next_send();
        assert!(bus.send(&Packet::ping(1).encode().unwrap()).await.is_err());
        assert!(bus.send(&Packet::ping(1).encode().unwrap()).await.is_ok());
        assert_eq!(bus.sent_count(), 2);
    }

    #[tokio::test]
    async fn test_factory_reset_keeps_id() {
        let mut bus = bus();
        bus.open().await.unwrap();
        bus.poke(1, 7, RegisterSize::Byte, 9);
        bus.poke(1, 31, RegisterSize::Byte, 50);
        let reply = exchange(&mut bus, Packet::factory_reset(1, FactoryResetMode::ExceptId)).await;
        assert!(reply.into_status().is_ok());
        assert_eq!(bus.peek(1, 7, 1), Some(9));
        assert_eq!(bus.peek(1, 31, 1), Some(80));
    }
}
