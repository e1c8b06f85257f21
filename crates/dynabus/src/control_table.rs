// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Control table schema.
//!
//! A control table maps symbolic register names to their address, width,
//! access mode, valid range and unit conversion. Tables are built once per
//! model and never change afterwards.
//!
//! Values cross this module in two forms:
//!
//! - **Engineering units** (`f64`): degrees, rpm, mA, volts, as seen by callers.
//!   Range validation happens here, before any scaling.
//! - **Raw values** (`i64`): the integer stored in the register, signed or
//!   unsigned depending on the register.
//!
//! # Examples
//!
//! ```
//! use dynabus::control_table::{ControlTableItem, Conversion, RegisterSize, ValueRange};
//!
//! let item = ControlTableItem::read_write("GOAL_POSITION", 116, RegisterSize::DWord)
//!     .with_range(ValueRange::MinMax { min: 0.0, max: 359.9 })
//!     .with_conversion(Conversion::Linear { step: 360.0 / 4096.0, unit: "deg" });
//!
//! assert!(item.validate(180.0));
//! assert_eq!(item.to_raw(180.0), 2048);
//! assert_eq!(item.from_raw(2048), 180.0);
//! ```

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigurationError, RegisterError};

// =============================================================================
// Access
// =============================================================================

/// Register access mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    /// Readable only; writes are rejected before reaching the bus.
    ReadOnly,
    /// Readable and writable.
    ReadWrite,
}

impl Access {
    /// Returns `true` if the register accepts writes.
    #[inline]
    pub const fn is_writable(&self) -> bool {
        matches!(self, Self::ReadWrite)
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadOnly => write!(f, "R"),
            Self::ReadWrite => write!(f, "RW"),
        }
    }
}

// =============================================================================
// RegisterSize
// =============================================================================

/// Register width. Only 1, 2 and 4 byte registers exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterSize {
    /// 1 byte.
    Byte,
    /// 2 bytes, little-endian.
    Word,
    /// 4 bytes, little-endian.
    DWord,
}

impl RegisterSize {
    /// Width in bytes.
    #[inline]
    pub const fn bytes(self) -> u8 {
        match self {
            Self::Byte => 1,
            Self::Word => 2,
            Self::DWord => 4,
        }
    }

    /// Inclusive raw bounds for this width.
    pub const fn raw_bounds(self, signed: bool) -> (i64, i64) {
        match (self, signed) {
            (Self::Byte, false) => (0, u8::MAX as i64),
            (Self::Byte, true) => (i8::MIN as i64, i8::MAX as i64),
            (Self::Word, false) => (0, u16::MAX as i64),
            (Self::Word, true) => (i16::MIN as i64, i16::MAX as i64),
            (Self::DWord, false) => (0, u32::MAX as i64),
            (Self::DWord, true) => (i32::MIN as i64, i32::MAX as i64),
        }
    }

    /// Little-endian bytes of `raw`, truncated to this width.
    ///
    /// Callers check [`RegisterSize::raw_bounds`] first.
    pub fn encode(self, raw: i64) -> Vec<u8> {
        (raw as u32).to_le_bytes()[..self.bytes() as usize].to_vec()
    }

    /// Decodes little-endian `bytes`, sign-extending when `signed`.
    ///
    /// Returns `None` if `bytes` is not exactly this width.
    pub fn decode(self, bytes: &[u8], signed: bool) -> Option<i64> {
        let value = match (self, bytes) {
            (Self::Byte, [b0]) if signed => i64::from(*b0 as i8),
            (Self::Byte, [b0]) => i64::from(*b0),
            (Self::Word, [b0, b1]) if signed => i64::from(i16::from_le_bytes([*b0, *b1])),
            (Self::Word, [b0, b1]) => i64::from(u16::from_le_bytes([*b0, *b1])),
            (Self::DWord, [b0, b1, b2, b3]) if signed => {
                i64::from(i32::from_le_bytes([*b0, *b1, *b2, *b3]))
            }
            (Self::DWord, [b0, b1, b2, b3]) => i64::from(u32::from_le_bytes([*b0, *b1, *b2, *b3])),
            _ => return None,
        };
        Some(value)
    }
}

impl TryFrom<usize> for RegisterSize {
    type Error = ConfigurationError;

    fn try_from(size: usize) -> Result<Self, Self::Error> {
        match size {
            1 => Ok(Self::Byte),
            2 => Ok(Self::Word),
            4 => Ok(Self::DWord),
            _ => Err(ConfigurationError::InvalidRegisterSize { size }),
        }
    }
}

// =============================================================================
// ValueRange
// =============================================================================

/// Valid values of a register, in engineering units.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueRange {
    /// No restriction.
    Any,
    /// Exactly one value.
    Exact(f64),
    /// Inclusive bounds.
    MinMax {
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },
    /// One of a fixed set of values.
    OneOf(&'static [f64]),
    /// Bounds held in other registers of the same device.
    ///
    /// The bound registers store values in the same raw unit as this one.
    /// A `None` lower bound means the negated upper bound.
    Linked {
        /// Register holding the lower bound.
        min: Option<&'static str>,
        /// Register holding the upper bound.
        max: &'static str,
    },
}

impl ValueRange {
    /// Returns `true` if `value` is acceptable.
    ///
    /// Linked ranges reject everything; resolve them to [`ValueRange::MinMax`]
    /// against the device first.
    pub fn contains(&self, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        match self {
            Self::Any => true,
            Self::Exact(expected) => value == *expected,
            Self::MinMax { min, max } => (*min..=*max).contains(&value),
            Self::OneOf(values) => values.contains(&value),
            Self::Linked { .. } => false,
        }
    }

    /// Returns `true` if the bounds must be read from the device.
    pub fn is_linked(&self) -> bool {
        matches!(self, Self::Linked { .. })
    }
}

impl fmt::Display for ValueRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::Exact(value) => write!(f, "exactly {value}"),
            Self::MinMax { min, max } => write!(f, "[{min}, {max}]"),
            Self::OneOf(values) => write!(f, "one of {values:?}"),
            Self::Linked { min: Some(min), max } => write!(f, "[{min}, {max}]"),
            Self::Linked { min: None, max } => write!(f, "[-{max}, {max}]"),
        }
    }
}

// =============================================================================
// Conversion
// =============================================================================

/// Raw to engineering-unit conversion.
#[derive(Debug, Clone, Copy)]
pub enum Conversion {
    /// Raw value is the engineering value.
    Identity,
    /// `engineering = raw * step`; the inverse rounds to the nearest raw unit.
    Linear {
        /// Engineering units per raw unit.
        step: f64,
        /// Unit label.
        unit: &'static str,
    },
    /// Arbitrary conversion pair.
    Custom {
        /// Unit label.
        unit: &'static str,
        /// Engineering to raw.
        to_raw: fn(f64) -> i64,
        /// Raw to engineering.
        from_raw: fn(i64) -> f64,
    },
}

impl Conversion {
    /// Converts an engineering value to raw.
    pub fn to_raw(&self, value: f64) -> i64 {
        match self {
            Self::Identity => value.round() as i64,
            Self::Linear { step, .. } => (value / step).round() as i64,
            Self::Custom { to_raw, .. } => to_raw(value),
        }
    }

    /// Converts a raw value to engineering units.
    pub fn from_raw(&self, raw: i64) -> f64 {
        match self {
            Self::Identity => raw as f64,
            Self::Linear { step, .. } => raw as f64 * step,
            Self::Custom { from_raw, .. } => from_raw(raw),
        }
    }

    /// Unit label, empty for identity.
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Identity => "",
            Self::Linear { unit, .. } | Self::Custom { unit, .. } => unit,
        }
    }
}

// =============================================================================
// ControlTableItem
// =============================================================================

/// One register in a control table.
#[derive(Debug, Clone)]
pub struct ControlTableItem {
    /// Symbolic name, unique within the table.
    pub name: &'static str,
    /// Start address.
    pub address: u16,
    /// Width.
    pub size: RegisterSize,
    /// Access mode.
    pub access: Access,
    /// Whether the raw value is two's complement.
    pub signed: bool,
    /// Valid engineering values.
    pub range: ValueRange,
    /// Unit conversion.
    pub conversion: Conversion,
    /// Factory default raw value, if documented.
    pub default: Option<i64>,
    /// Human readable description.
    pub description: &'static str,
}

impl ControlTableItem {
    fn new(name: &'static str, address: u16, size: RegisterSize, access: Access) -> Self {
        Self {
            name,
            address,
            size,
            access,
            signed: false,
            range: ValueRange::Any,
            conversion: Conversion::Identity,
            default: None,
            description: "",
        }
    }

    /// A read-only register.
    pub fn read_only(name: &'static str, address: u16, size: RegisterSize) -> Self {
        Self::new(name, address, size, Access::ReadOnly)
    }

    /// A read-write register.
    pub fn read_write(name: &'static str, address: u16, size: RegisterSize) -> Self {
        Self::new(name, address, size, Access::ReadWrite)
    }

    /// Sets the valid range.
    pub fn with_range(mut self, range: ValueRange) -> Self {
        self.range = range;
        self
    }

    /// Sets the conversion.
    pub fn with_conversion(mut self, conversion: Conversion) -> Self {
        self.conversion = conversion;
        self
    }

    /// Marks the raw value as signed.
    pub fn signed(mut self) -> Self {
        self.signed = true;
        self
    }

    /// Sets the factory default raw value.
    pub fn with_default(mut self, raw: i64) -> Self {
        self.default = Some(raw);
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Returns `true` if the register accepts writes.
    #[inline]
    pub fn is_writable(&self) -> bool {
        self.access.is_writable()
    }

    /// Checks `value` against the static range.
    #[inline]
    pub fn validate(&self, value: f64) -> bool {
        self.range.contains(value)
    }

    /// Converts an engineering value to raw.
    #[inline]
    pub fn to_raw(&self, value: f64) -> i64 {
        self.conversion.to_raw(value)
    }

    /// Converts a raw value to engineering units.
    #[inline]
    pub fn from_raw(&self, raw: i64) -> f64 {
        self.conversion.from_raw(raw)
    }

    /// Unit label.
    pub fn unit(&self) -> &'static str {
        self.conversion.unit()
    }

    /// Encodes `raw` for the wire, failing if it does not fit the register.
    pub fn encode(&self, raw: i64) -> Result<Vec<u8>, RegisterError> {
        let (min, max) = self.size.raw_bounds(self.signed);
        if !(min..=max).contains(&raw) {
            return Err(RegisterError::RawOverflow {
                name: self.name.to_string(),
                raw,
                size: self.size.bytes(),
            });
        }
        Ok(self.size.encode(raw))
    }

    /// Decodes wire bytes into a raw value.
    pub fn decode(&self, bytes: &[u8]) -> Option<i64> {
        self.size.decode(bytes, self.signed)
    }
}

// =============================================================================
// ControlTable
// =============================================================================

/// Name-indexed register schema of one model.
#[derive(Debug, Clone, Default)]
pub struct ControlTable {
    model: &'static str,
    items: HashMap<&'static str, ControlTableItem>,
}

impl ControlTable {
    /// Builds a table, rejecting duplicate names.
    pub fn from_items(
        model: &'static str,
        items: impl IntoIterator<Item = ControlTableItem>,
    ) -> Result<Self, ConfigurationError> {
        let mut table = Self {
            model,
            items: HashMap::new(),
        };
        for item in items {
            if table.items.contains_key(item.name) {
                return Err(ConfigurationError::DuplicateRegister {
                    name: item.name,
                    model,
                });
            }
            table.items.insert(item.name, item);
        }
        Ok(table)
    }

    /// Looks up a register by name.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&ControlTableItem> {
        self.items.get(name)
    }

    /// Looks up a register by name, failing with [`RegisterError::Unknown`].
    pub fn lookup(&self, name: &str) -> Result<&ControlTableItem, RegisterError> {
        self.get(name)
            .ok_or_else(|| RegisterError::unknown(name, self.model))
    }

    /// Model this table belongs to.
    pub fn model(&self) -> &'static str {
        self.model
    }

    /// Returns `true` if the table defines `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.items.contains_key(name)
    }

    /// Number of registers.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Registers ordered by address, then name.
    pub fn items(&self) -> Vec<&ControlTableItem> {
        let mut items: Vec<_> = self.items.values().collect();
        items.sort_by_key(|item| (item.address, item.name));
        items
    }
}

// =============================================================================
// Tests
// =============================================================================
