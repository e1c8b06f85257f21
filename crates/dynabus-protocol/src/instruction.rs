// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Instruction codes.

use std::fmt;

use crate::error::ProtocolError;

/// Instruction byte of a protocol 2.0 packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Instruction {
    /// Presence check; the device answers with model number and firmware.
    Ping = 0x01,
    /// Read a contiguous register range.
    Read = 0x02,
    /// Write a contiguous register range.
    Write = 0x03,
    /// Stage a write until [`Instruction::Action`].
    RegWrite = 0x04,
    /// Execute staged writes.
    Action = 0x05,
    /// Restore factory settings.
    FactoryReset = 0x06,
    /// Restart the device.
    Reboot = 0x08,
    /// Clear the multi-turn position count.
    Clear = 0x10,
    /// Response from a device.
    Status = 0x55,
    /// Read one range from several devices.
    SyncRead = 0x82,
    /// Write one range on several devices.
    SyncWrite = 0x83,
    /// Read arbitrary ranges from several devices.
    BulkRead = 0x92,
    /// Write arbitrary ranges on several devices.
    BulkWrite = 0x93,
}

impl Instruction {
    /// Every instruction, in code order.
    pub const ALL: [Instruction; 13] = [
        Self::Ping,
        Self::Read,
        Self::Write,
        Self::RegWrite,
        Self::Action,
        Self::FactoryReset,
        Self::Reboot,
        Self::Clear,
        Self::Status,
        Self::SyncRead,
        Self::SyncWrite,
        Self::BulkRead,
        Self::BulkWrite,
    ];

    /// Returns the wire code.
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Returns the upper-case protocol name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ping => "PING",
            Self::Read => "READ",
            Self::Write => "WRITE",
            Self::RegWrite => "REG_WRITE",
            Self::Action => "ACTION",
            Self::FactoryReset => "FACTORY_RESET",
            Self::Reboot => "REBOOT",
            Self::Clear => "CLEAR",
            Self::Status => "STATUS",
            Self::SyncRead => "SYNC_READ",
            Self::SyncWrite => "SYNC_WRITE",
            Self::BulkRead => "BULK_READ",
            Self::BulkWrite => "BULK_WRITE",
        }
    }

    /// Returns true if a device answers this instruction with a status packet
    /// when it is addressed to a single id.
    pub const fn expects_status(self) -> bool {
        !matches!(
            self,
            Self::Status | Self::SyncWrite | Self::BulkWrite | Self::SyncRead | Self::BulkRead
        )
    }
}

impl TryFrom<u8> for Instruction {
    type Error = ProtocolError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|instruction| instruction.code() == code)
            .ok_or(ProtocolError::UnknownInstruction { code })
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Scope of a factory reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum FactoryResetMode {
    /// Reset every setting, including id and baud rate.
    All = 0xFF,
    /// Keep the id.
    #[default]
    ExceptId = 0x01,
    /// Keep the id and baud rate.
    ExceptIdAndBaudRate = 0x02,
}

impl FactoryResetMode {
    /// Returns the parameter byte.
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }
}
