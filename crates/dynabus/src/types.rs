// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Core value types: device ids and baud rates.

use std::fmt;
use std::str::FromStr;

use dynabus_protocol::{BROADCAST_ID, MAX_ID};
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

// =============================================================================
// ServoId
// =============================================================================

/// A validated device id: 0-252, or 254 for broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ServoId(u8);

impl ServoId {
    /// The broadcast id; addresses every device on the bus.
    pub const BROADCAST: ServoId = ServoId(BROADCAST_ID);

    /// Validates `id`.
    pub fn new(id: u8) -> Result<Self, ConfigurationError> {
        if id <= MAX_ID || id == BROADCAST_ID {
            Ok(Self(id))
        } else {
            Err(ConfigurationError::InvalidId { id })
        }
    }

    /// Returns the raw id.
    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Returns `true` for the broadcast id.
    #[inline]
    pub const fn is_broadcast(self) -> bool {
        self.0 == BROADCAST_ID
    }
}

impl TryFrom<u8> for ServoId {
    type Error = ConfigurationError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl From<ServoId> for u8 {
    fn from(id: ServoId) -> Self {
        id.0
    }
}

impl fmt::Display for ServoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// BaudRate
// =============================================================================

/// Bus speeds selectable through the `BAUD_RATE` register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum BaudRate {
    /// 9600 bps (code 0).
    B9600,
    /// 57600 bps (code 1), factory default.
    B57600,
    /// 115200 bps (code 2).
    B115200,
    /// 1 Mbps (code 3).
    B1M,
    /// 2 Mbps (code 4).
    B2M,
    /// 3 Mbps (code 5).
    B3M,
    /// 4 Mbps (code 6).
    B4M,
    /// 4.5 Mbps (code 7).
    B4_5M,
}

impl BaudRate {
    /// Every supported rate, in register-code order.
    pub const ALL: [BaudRate; 8] = [
        Self::B9600,
        Self::B57600,
        Self::B115200,
        Self::B1M,
        Self::B2M,
        Self::B3M,
        Self::B4M,
        Self::B4_5M,
    ];

    /// Bits per second.
    pub const fn bps(self) -> u32 {
        match self {
            Self::B9600 => 9_600,
            Self::B57600 => 57_600,
            Self::B115200 => 115_200,
            Self::B1M => 1_000_000,
            Self::B2M => 2_000_000,
            Self::B3M => 3_000_000,
            Self::B4M => 4_000_000,
            Self::B4_5M => 4_500_000,
        }
    }

    /// Value stored in the `BAUD_RATE` register.
    pub const fn code(self) -> u8 {
        match self {
            Self::B9600 => 0,
            Self::B57600 => 1,
            Self::B115200 => 2,
            Self::B1M => 3,
            Self::B2M => 4,
            Self::B3M => 5,
            Self::B4M => 6,
            Self::B4_5M => 7,
        }
    }

    /// Looks up a rate by register code.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|rate| rate.code() == code)
    }

    /// Looks up a rate by bits per second.
    pub fn from_bps(bps: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|rate| rate.bps() == bps)
    }
}

impl Default for BaudRate {
    fn default() -> Self {
        Self::B57600
    }
}

impl TryFrom<u32> for BaudRate {
    type Error = ConfigurationError;

    fn try_from(bps: u32) -> Result<Self, Self::Error> {
        Self::from_bps(bps).ok_or(ConfigurationError::InvalidBaudRate { baud_rate: bps })
    }
}

impl From<BaudRate> for u32 {
    fn from(rate: BaudRate) -> Self {
        rate.bps()
    }
}

impl fmt::Display for BaudRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bps())
    }
}

impl FromStr for BaudRate {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bps = s
            .trim()
            .parse::<u32>()
            .map_err(|_| ConfigurationError::invalid_value("baud_rate", format!("'{s}' is not a number")))?;
        Self::try_from(bps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_servo_id_bounds() {
        assert!(ServoId::new(0).is_ok());
        assert!(ServoId::new(252).is_ok());
        assert!(ServoId::new(254).unwrap().is_broadcast());
        assert_eq!(ServoId::new(253), Err(ConfigurationError::InvalidId { id: 253 }));
        assert!(ServoId::new(255).is_err());
    }

    #[test]
    fn test_servo_id_serde() {
        let id: ServoId = serde_json::from_str("7").unwrap();
        assert_eq!(id.get(), 7);
        assert!(serde_json::from_str::<ServoId>("253").is_err());
        assert_eq!(serde_json::to_string(&id).unwrap(), "7");
    }

    #[test]
    fn test_baud_codes() {
        assert_eq!(BaudRate::from_code(3), Some(BaudRate::B1M));
        assert_eq!(BaudRate::from_code(8), None);
        assert_eq!(BaudRate::B4_5M.bps(), 4_500_000);
        for rate in BaudRate::ALL {
            assert_eq!(BaudRate::from_code(rate.code()), Some(rate));
            assert_eq!(BaudRate::from_bps(rate.bps()), Some(rate));
        }
    }

    #[test]
    fn test_baud_parse() {
        assert_eq!("115200".parse::<BaudRate>(), Ok(BaudRate::B115200));
        assert_eq!(
            "12345".parse::<BaudRate>(),
            Err(ConfigurationError::InvalidBaudRate { baud_rate: 12345 })
        );
        assert!("fast".parse::<BaudRate>().is_err());
        assert_eq!(BaudRate::default(), BaudRate::B57600);
    }
}
