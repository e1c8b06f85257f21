// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CRC-16 used by protocol 2.0 frames.
//!
//! Polynomial `0x8005`, MSB-first, initial value 0, no final XOR
//! (catalogued as CRC-16/UMTS). The lookup table is generated at compile time.

const POLYNOMIAL: u16 = 0x8005;

/// Byte-indexed lookup table.
pub const CRC_TABLE: [u16; 256] = build_table();

const fn build_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u16) << 8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ POLYNOMIAL
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Folds `data` into a running CRC accumulator.
///
/// Calls compose: `update_crc(update_crc(0, a), b) == update_crc(0, a ++ b)`.
#[inline]
pub fn update_crc(accum: u16, data: &[u8]) -> u16 {
    data.iter().fold(accum, |crc, &byte| {
        let index = ((crc >> 8) ^ u16::from(byte)) & 0xFF;
        (crc << 8) ^ CRC_TABLE[index as usize]
    })
}

/// Computes the CRC of `data` from a zero seed.
#[inline]
pub fn checksum(data: &[u8]) -> u16 {
    update_crc(0, data)
}

// =============================================================================
// Tests
// =============================================================================
