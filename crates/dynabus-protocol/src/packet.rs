// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Packet framing.
//!
//! [`Packet`] holds the logical content of a frame (id, instruction,
//! parameters). Encoding adds the header, length, byte stuffing and CRC;
//! decoding validates structure first, then the CRC, then unstuffs.

use crate::crc::checksum;
use crate::error::{ProtocolError, ProtocolResult};
use crate::instruction::{FactoryResetMode, Instruction};
use crate::status::{HardwareErrors, StatusPacket};
use crate::{HEADER, MAX_PACKET_LENGTH, MIN_PACKET_LENGTH, PREAMBLE_LENGTH, RESERVED};

/// Marker that triggers byte stuffing inside the parameter field.
const STUFFING_PATTERN: [u8; 3] = [0xFF, 0xFF, 0xFD];
const STUFFING_BYTE: u8 = 0xFD;

/// Parameters that clear the multi-turn position count.
const CLEAR_MULTI_TURN: [u8; 5] = [0x01, 0x44, 0x58, 0x4C, 0x22];

// =============================================================================
// Packet
// =============================================================================

/// Logical content of a protocol 2.0 frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Target (request) or source (status) device id.
    pub id: u8,
    /// Instruction code.
    pub instruction: Instruction,
    /// Parameter bytes, unstuffed.
    pub params: Vec<u8>,
}

impl Packet {
    /// Creates a packet from its parts.
    pub fn new(id: u8, instruction: Instruction, params: impl Into<Vec<u8>>) -> Self {
        Self {
            id,
            instruction,
            params: params.into(),
        }
    }

    /// PING request.
    pub fn ping(id: u8) -> Self {
        Self::new(id, Instruction::Ping, Vec::new())
    }

    /// READ request for `length` bytes starting at `address`.
    pub fn read(id: u8, address: u16, length: u16) -> Self {
        let mut params = Vec::with_capacity(4);
        params.extend_from_slice(&address.to_le_bytes());
        params.extend_from_slice(&length.to_le_bytes());
        Self::new(id, Instruction::Read, params)
    }

    /// WRITE request of `data` starting at `address`.
    pub fn write(id: u8, address: u16, data: &[u8]) -> Self {
        Self::new(id, Instruction::Write, address_prefixed(address, data))
    }

    /// REG_WRITE request, executed on the next ACTION.
    pub fn reg_write(id: u8, address: u16, data: &[u8]) -> Self {
        Self::new(id, Instruction::RegWrite, address_prefixed(address, data))
    }

    /// ACTION request.
    pub fn action(id: u8) -> Self {
        Self::new(id, Instruction::Action, Vec::new())
    }

    /// REBOOT request.
    pub fn reboot(id: u8) -> Self {
        Self::new(id, Instruction::Reboot, Vec::new())
    }

    /// FACTORY_RESET request.
    pub fn factory_reset(id: u8, mode: FactoryResetMode) -> Self {
        Self::new(id, Instruction::FactoryReset, vec![mode.code()])
    }

    /// CLEAR request resetting the multi-turn count.
    pub fn clear(id: u8) -> Self {
        Self::new(id, Instruction::Clear, CLEAR_MULTI_TURN.to_vec())
    }

    /// SYNC_READ of the same range from each of `ids`.
    pub fn sync_read(address: u16, length: u16, ids: &[u8]) -> Self {
        let mut params = Vec::with_capacity(4 + ids.len());
        params.extend_from_slice(&address.to_le_bytes());
        params.extend_from_slice(&length.to_le_bytes());
        params.extend_from_slice(ids);
        Self::new(crate::BROADCAST_ID, Instruction::SyncRead, params)
    }

    /// SYNC_WRITE of the same range on several devices.
    ///
    /// Every entry's data must be `length` bytes long; shorter or longer
    /// entries are rejected as malformed.
    pub fn sync_write(address: u16, length: u16, entries: &[(u8, &[u8])]) -> ProtocolResult<Self> {
        let mut params = Vec::with_capacity(4 + entries.len() * (1 + length as usize));
        params.extend_from_slice(&address.to_le_bytes());
        params.extend_from_slice(&length.to_le_bytes());
        for (id, data) in entries {
            if data.len() != length as usize {
                return Err(ProtocolError::LengthMismatch {
                    declared: length as usize,
                    actual: data.len(),
                });
            }
            params.push(*id);
            params.extend_from_slice(data);
        }
        Ok(Self::new(crate::BROADCAST_ID, Instruction::SyncWrite, params))
    }

    /// BULK_READ of `(id, address, length)` triples.
    pub fn bulk_read(requests: &[(u8, u16, u16)]) -> Self {
        let mut params = Vec::with_capacity(requests.len() * 5);
        for (id, address, length) in requests {
            params.push(*id);
            params.extend_from_slice(&address.to_le_bytes());
            params.extend_from_slice(&length.to_le_bytes());
        }
        Self::new(crate::BROADCAST_ID, Instruction::BulkRead, params)
    }

    /// BULK_WRITE of `(id, address, data)` entries.
    pub fn bulk_write(entries: &[(u8, u16, &[u8])]) -> ProtocolResult<Self> {
        let mut params = Vec::new();
        for (id, address, data) in entries {
            let length = u16::try_from(data.len()).map_err(|_| ProtocolError::FrameTooLong {
                max: MAX_PACKET_LENGTH,
                actual: data.len(),
            })?;
            params.push(*id);
            params.extend_from_slice(&address.to_le_bytes());
            params.extend_from_slice(&length.to_le_bytes());
            params.extend_from_slice(data);
        }
        Ok(Self::new(crate::BROADCAST_ID, Instruction::BulkWrite, params))
    }

    /// STATUS response carrying `errors` and `data`.
    pub fn status(id: u8, errors: HardwareErrors, data: &[u8]) -> Self {
        let mut params = Vec::with_capacity(1 + data.len());
        params.push(errors.bits());
        params.extend_from_slice(data);
        Self::new(id, Instruction::Status, params)
    }

    /// Encodes the packet into a transmit-ready frame.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        encode(self.id, self.instruction, &self.params)
    }

    /// Decodes a complete frame.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        decode(bytes)
    }

    /// Splits a STATUS packet into its error byte and payload.
    pub fn into_status(self) -> ProtocolResult<StatusPacket> {
        if self.instruction != Instruction::Status {
            return Err(ProtocolError::NotStatus {
                actual: self.instruction.name(),
            });
        }
        let mut params = self.params;
        if params.is_empty() {
            return Err(ProtocolError::MissingErrorByte { id: self.id });
        }
        let errors = HardwareErrors::from_bits(params.remove(0));
        Ok(StatusPacket {
            id: self.id,
            errors,
            data: params,
        })
    }
}

fn address_prefixed(address: u16, data: &[u8]) -> Vec<u8> {
    let mut params = Vec::with_capacity(2 + data.len());
    params.extend_from_slice(&address.to_le_bytes());
    params.extend_from_slice(data);
    params
}

// =============================================================================
// Encode / Decode
// =============================================================================

/// Encodes a frame for `id`, `instruction` and `params`.
///
/// The length field counts the stuffed parameters plus instruction and CRC.
pub fn encode(id: u8, instruction: Instruction, params: &[u8]) -> ProtocolResult<Vec<u8>> {
    let stuffed = stuff(params);
    let total = PREAMBLE_LENGTH + 1 + stuffed.len() + 2;
    if total > MAX_PACKET_LENGTH {
        return Err(ProtocolError::FrameTooLong {
            max: MAX_PACKET_LENGTH,
            actual: total,
        });
    }

    let length = (stuffed.len() + 3) as u16;
    let mut frame = Vec::with_capacity(total);
    frame.extend_from_slice(&HEADER);
    frame.push(RESERVED);
    frame.push(id);
    frame.extend_from_slice(&length.to_le_bytes());
    frame.push(instruction.code());
    frame.extend_from_slice(&stuffed);

    let crc = checksum(&frame);
    frame.extend_from_slice(&crc.to_le_bytes());
    Ok(frame)
}

/// Decodes one complete frame.
pub fn decode(bytes: &[u8]) -> ProtocolResult<Packet> {
    if bytes.len() < MIN_PACKET_LENGTH {
        return Err(ProtocolError::FrameTooShort {
            expected: MIN_PACKET_LENGTH,
            actual: bytes.len(),
        });
    }
    if bytes.len() > MAX_PACKET_LENGTH {
        return Err(ProtocolError::FrameTooLong {
            max: MAX_PACKET_LENGTH,
            actual: bytes.len(),
        });
    }
    if bytes[..3] != HEADER || bytes[3] != RESERVED {
        return Err(ProtocolError::InvalidHeader {
            found: [bytes[0], bytes[1], bytes[2], bytes[3]],
        });
    }

    let declared = u16::from_le_bytes([bytes[5], bytes[6]]) as usize;
    let actual = bytes.len() - PREAMBLE_LENGTH;
    if declared < 3 || declared != actual {
        return Err(ProtocolError::LengthMismatch { declared, actual });
    }

    let (body, trailer) = bytes.split_at(bytes.len() - 2);
    let expected = checksum(body);
    let carried = u16::from_le_bytes([trailer[0], trailer[1]]);
    if expected != carried {
        return Err(ProtocolError::ChecksumMismatch {
            expected,
            actual: carried,
        });
    }

    let instruction = Instruction::try_from(bytes[PREAMBLE_LENGTH])?;
    Ok(Packet {
        id: bytes[4],
        instruction,
        params: unstuff(&body[PREAMBLE_LENGTH + 1..]),
    })
}

/// Inserts a stuffing byte after every `FF FF FD` run in the parameters.
fn stuff(params: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(params.len() + params.len() / 3);
    for &byte in params {
        out.push(byte);
        if out.ends_with(&STUFFING_PATTERN) {
            out.push(STUFFING_BYTE);
        }
    }
    out
}

/// Removes stuffing bytes inserted by [`stuff`].
fn unstuff(wire: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(wire.len());
    let mut i = 0;
    while i < wire.len() {
        out.push(wire[i]);
        if out.ends_with(&STUFFING_PATTERN) && wire.get(i + 1) == Some(&STUFFING_BYTE) {
            i += 1;
        }
        i += 1;
    }
    out
}

// =============================================================================
// Tests
// =============================================================================
