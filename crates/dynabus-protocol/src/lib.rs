// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # dynabus-protocol
//!
//! Packet codec for the Dynamixel protocol 2.0 servo bus.
//!
//! This crate is pure: it performs no I/O and holds no state between calls.
//! It provides:
//!
//! - **Framing**: [`Packet::encode`] / [`Packet::decode`] with header, length,
//!   byte stuffing and CRC handling
//! - **CRC-16**: table-driven checksum in [`crc`]
//! - **Status decoding**: [`StatusPacket`] and [`HardwareErrors`]
//! - **Stream reassembly**: [`FrameAssembler`] for byte streams read from a port
//!
//! ## Wire Format
//!
//! ```text
//! ┌────────────┬──────┬────┬─────────┬───────┬────────────┬─────────┐
//! │ FF FF FD   │  00  │ ID │ LEN(LE) │ INSTR │ PARAMS ... │ CRC(LE) │
//! └────────────┴──────┴────┴─────────┴───────┴────────────┴─────────┘
//!                               LEN = params + 3
//! ```
//!
//! ## Example
//!
//! ```
//! use dynabus_protocol::{Instruction, Packet};
//!
//! let ping = Packet::ping(1);
//! let bytes = ping.encode().unwrap();
//! assert_eq!(bytes, [0xFF, 0xFF, 0xFD, 0x00, 0x01, 0x03, 0x00, 0x01, 0x19, 0x4E]);
//!
//! let decoded = Packet::decode(&bytes).unwrap();
//! assert_eq!(decoded.instruction, Instruction::Ping);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod crc;
pub mod error;
pub mod frame;
pub mod instruction;
pub mod packet;
pub mod status;

pub use error::{ProtocolError, ProtocolResult};
pub use frame::FrameAssembler;
pub use instruction::{FactoryResetMode, Instruction};
pub use packet::{decode, encode, Packet};
pub use status::{HardwareErrors, StatusPacket};

// =============================================================================
// Protocol Constants
// =============================================================================

/// Fixed 3-byte packet header.
pub const HEADER: [u8; 3] = [0xFF, 0xFF, 0xFD];

/// Reserved byte following the header.
pub const RESERVED: u8 = 0x00;

/// Smallest valid frame: header, reserved, id, length, instruction, CRC.
pub const MIN_PACKET_LENGTH: usize = 10;

/// Largest frame this codec will produce or accept.
pub const MAX_PACKET_LENGTH: usize = 256;

/// Bytes before the instruction byte (header, reserved, id, length).
pub const PREAMBLE_LENGTH: usize = 7;

/// Broadcast device id.
pub const BROADCAST_ID: u8 = 254;

/// Highest addressable device id.
pub const MAX_ID: u8 = 252;

/// Factory-default device id.
pub const DEFAULT_ID: u8 = 1;

/// Address of the model number register, shared by every protocol 2.0 device.
pub const MODEL_NUMBER_ADDRESS: u16 = 0;

/// Width of the model number register in bytes.
pub const MODEL_NUMBER_LENGTH: u16 = 2;

/// The only protocol version this codec speaks.
pub const PROTOCOL_VERSION: f32 = 2.0;
