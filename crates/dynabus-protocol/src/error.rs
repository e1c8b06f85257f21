// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Codec error types.
//!
//! Two families exist: checksum failures and malformed frames. Structural
//! checks run before the CRC, so a frame with a broken header or length is
//! always reported as malformed even if its CRC would also fail.

use thiserror::Error;

/// Result type alias for codec operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors produced while encoding or decoding frames.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The trailing CRC does not match the recomputed value.
    #[error("Checksum mismatch: computed {expected:#06X}, frame carries {actual:#06X}")]
    ChecksumMismatch {
        /// CRC recomputed over the frame body.
        expected: u16,
        /// CRC found in the frame.
        actual: u16,
    },

    /// Fewer bytes than the smallest valid frame.
    #[error("Frame too short: need at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Minimum acceptable length.
        expected: usize,
        /// Length received.
        actual: usize,
    },

    /// More bytes than the largest valid frame.
    #[error("Frame too long: at most {max} bytes allowed, got {actual}")]
    FrameTooLong {
        /// Maximum acceptable length.
        max: usize,
        /// Length produced or received.
        actual: usize,
    },

    /// Header or reserved byte does not match `FF FF FD 00`.
    #[error("Invalid header: {found:02X?}")]
    InvalidHeader {
        /// First four bytes of the frame.
        found: [u8; 4],
    },

    /// The length field disagrees with the number of bytes present.
    #[error("Length mismatch: header declares {declared} bytes, {actual} present")]
    LengthMismatch {
        /// Value of the length field.
        declared: usize,
        /// Bytes following the length field.
        actual: usize,
    },

    /// Instruction byte is not a known code.
    #[error("Unknown instruction code {code:#04X}")]
    UnknownInstruction {
        /// The offending byte.
        code: u8,
    },

    /// A status packet was expected but another instruction arrived.
    #[error("Expected a status packet, got {actual}")]
    NotStatus {
        /// Instruction name of the received packet.
        actual: &'static str,
    },

    /// A status packet carries no error byte.
    #[error("Status packet from id {id} has no error byte")]
    MissingErrorByte {
        /// Device id of the packet.
        id: u8,
    },
}

impl ProtocolError {
    /// Returns true for CRC failures.
    pub fn is_checksum(&self) -> bool {
        matches!(self, Self::ChecksumMismatch { .. })
    }

    /// Returns true for structural failures (everything that is not a CRC failure).
    pub fn is_malformed(&self) -> bool {
        !self.is_checksum()
    }
}
