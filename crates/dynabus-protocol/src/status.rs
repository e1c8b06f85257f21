// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Status packets and the device error byte.

use std::fmt;

/// Decoded device error byte.
///
/// Each flag is a distinct bit and several may be set at once. Bits outside
/// the known flags are preserved and reported by [`HardwareErrors::unknown_bits`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HardwareErrors(u8);

impl HardwareErrors {
    /// Input voltage out of the operating range.
    pub const INPUT_VOLTAGE: Self = Self(0x01);
    /// Internal temperature above the limit.
    pub const OVERHEATING: Self = Self(0x02);
    /// Encoder malfunction.
    pub const MOTOR_ENCODER: Self = Self(0x04);
    /// Electrical shock or insufficient power.
    pub const ELECTRICAL_SHOCK: Self = Self(0x08);
    /// Persistent load above the maximum output.
    pub const OVERLOAD: Self = Self(0x10);

    const KNOWN: [(Self, &'static str); 5] = [
        (Self::INPUT_VOLTAGE, "input_voltage"),
        (Self::OVERHEATING, "overheating"),
        (Self::MOTOR_ENCODER, "motor_encoder"),
        (Self::ELECTRICAL_SHOCK, "electrical_shock"),
        (Self::OVERLOAD, "overload"),
    ];

    /// No error bits set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Wraps a raw error byte, keeping unknown bits.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Returns the raw byte.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns true if no bit is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns true if every bit of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns bits that do not correspond to a known flag.
    pub const fn unknown_bits(self) -> u8 {
        self.0 & !0x1F
    }

    /// Names of the known flags that are set, lowest bit first.
    pub fn names(self) -> Vec<&'static str> {
        Self::KNOWN
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl std::ops::BitOr for HardwareErrors {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for HardwareErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut parts: Vec<String> = self.names().into_iter().map(str::to_string).collect();
        if self.unknown_bits() != 0 {
            parts.push(format!("unknown({:#04X})", self.unknown_bits()));
        }
        f.write_str(&parts.join("|"))
    }
}

/// A decoded STATUS packet: the device id, its error byte and the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPacket {
    /// Responding device.
    pub id: u8,
    /// Error byte reported by the device.
    pub errors: HardwareErrors,
    /// Payload following the error byte.
    pub data: Vec<u8>,
}

impl StatusPacket {
    /// Returns true if the device reported no error.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiple_bits() {
        let errors = HardwareErrors::from_bits(0x12);
        assert!(errors.contains(HardwareErrors::OVERHEATING));
        assert!(errors.contains(HardwareErrors::OVERLOAD));
        assert!(!errors.contains(HardwareErrors::INPUT_VOLTAGE));
        assert_eq!(errors.names(), vec!["overheating", "overload"]);
        assert_eq!(errors.to_string(), "overheating|overload");
    }

    #[test]
    fn test_unknown_bits_kept() {
        let errors = HardwareErrors::from_bits(0x81);
        assert_eq!(errors.unknown_bits(), 0x80);
        assert_eq!(errors.to_string(), "input_voltage|unknown(0x80)");
    }

    #[test]
    fn test_empty() {
        assert!(HardwareErrors::empty().is_empty());
        assert_eq!(HardwareErrors::default().to_string(), "none");
        assert_eq!(
            (HardwareErrors::MOTOR_ENCODER | HardwareErrors::ELECTRICAL_SHOCK).bits(),
            0x0C
        );
    }
}
