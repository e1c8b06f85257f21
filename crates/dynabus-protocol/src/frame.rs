// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Reassembly of frames from a byte stream.
//!
//! Serial reads return arbitrary chunks: a frame may arrive split across
//! several reads, preceded by line noise, or followed by the start of the
//! next frame. [`FrameAssembler`] buffers the chunks and yields one decode
//! result per complete frame.

use crate::error::{ProtocolError, ProtocolResult};
use crate::packet::Packet;
use crate::{HEADER, MAX_PACKET_LENGTH, PREAMBLE_LENGTH};

/// Incremental frame reassembler.
#[derive(Debug, Default, Clone)]
pub struct FrameAssembler {
    buffer: Vec<u8>,
}

impl FrameAssembler {
    /// Creates an empty assembler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends received bytes.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Number of bytes buffered but not yet consumed.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Drops all buffered bytes.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Extracts the next complete frame, if one is buffered.
    ///
    /// Bytes before a header are discarded. A frame whose length field is
    /// impossible yields an error and the assembler resynchronises on the
    /// next header. Returns `None` while a frame is still incomplete.
    pub fn next_frame(&mut self) -> Option<ProtocolResult<Packet>> {
        match find_header(&self.buffer) {
            Some(start) => {
                self.buffer.drain(..start);
            }
            None => {
                let keep = partial_header_suffix(&self.buffer);
                let cut = self.buffer.len() - keep;
                self.buffer.drain(..cut);
                return None;
            }
        }

        if self.buffer.len() < PREAMBLE_LENGTH {
            return None;
        }

        let declared = u16::from_le_bytes([self.buffer[5], self.buffer[6]]) as usize;
        let total = PREAMBLE_LENGTH + declared;
        if declared < 3 || total > MAX_PACKET_LENGTH {
            let actual = self.buffer.len() - PREAMBLE_LENGTH;
            // Skip this header so the next search starts past it.
            self.buffer.drain(..1);
            return Some(Err(ProtocolError::LengthMismatch { declared, actual }));
        }

        if self.buffer.len() < total {
            return None;
        }

        let frame: Vec<u8> = self.buffer.drain(..total).collect();
        Some(Packet::decode(&frame))
    }
}

/// Finds the first `FF FF FD 00` sequence.
fn find_header(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(4)
        .position(|window| window[..3] == HEADER && window[3] == crate::RESERVED)
}

/// Length of a trailing prefix of the header that may complete later.
fn partial_header_suffix(buffer: &[u8]) -> usize {
    let full = [HEADER[0], HEADER[1], HEADER[2], crate::RESERVED];
    (1..full.len())
        .rev()
        .find(|&len| buffer.len() >= len && buffer[buffer.len() - len..] == full[..len])
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::Instruction;
    use crate::status::HardwareErrors;

    fn status_frame(id: u8, data: &[u8]) -> Vec<u8> {
        Packet::status(id, HardwareErrors::empty(), data).encode().unwrap()
    }

    #[test]
    fn test_split_frame() {
        let frame = status_frame(1, &[0x00, 0x08, 0x00, 0x00]);
        let mut assembler = FrameAssembler::new();

        assembler.push(&frame[..5]);
        assert!(assembler.next_frame().is_none());
        assembler.push(&frame[5..]);

        let packet = assembler.next_frame().unwrap().unwrap();
        assert_eq!(packet.id, 1);
        assert_eq!(packet.instruction, Instruction::Status);
        assert_eq!(assembler.buffered(), 0);
    }

    #[test]
    fn test_leading_noise_discarded() {
        let mut assembler = FrameAssembler::new();
        assembler.push(&[0x00, 0x13, 0xFF]);
        assembler.push(&status_frame(3, &[]));
        let packet = assembler.next_frame().unwrap().unwrap();
        assert_eq!(packet.id, 3);
    }

    #[test]
    fn test_back_to_back_frames() {
        let mut assembler = FrameAssembler::new();
        let mut stream = status_frame(1, &[1]);
        stream.extend(status_frame(2, &[2]));
        assembler.push(&stream);

        assert_eq!(assembler.next_frame().unwrap().unwrap().id, 1);
        assert_eq!(assembler.next_frame().unwrap().unwrap().id, 2);
        assert!(assembler.next_frame().is_none());
    }

    #[test]
    fn test_partial_header_kept() {
        let mut assembler = FrameAssembler::new();
        let frame = status_frame(4, &[]);
        assembler.push(&[0x42, 0x42, 0xFF, 0xFF]);
        assert!(assembler.next_frame().is_none());
        assert_eq!(assembler.buffered(), 2);
        assembler.push(&frame[2..]);
        assert_eq!(assembler.next_frame().unwrap().unwrap().id, 4);
    }

    #[test]
    fn test_corrupt_frame_reported() {
        let mut frame = status_frame(1, &[0x10]);
        let last = frame.len() - 1;
        frame[last] ^= 0x01;
        let mut assembler = FrameAssembler::new();
        assembler.push(&frame);
        let err = assembler.next_frame().unwrap().unwrap_err();
        assert!(err.is_checksum());
    }

    #[test]
    fn test_impossible_length_resyncs() {
        let mut assembler = FrameAssembler::new();
        assembler.push(&[0xFF, 0xFF, 0xFD, 0x00, 0x01, 0xFF, 0xFF]);
        assert!(assembler.next_frame().unwrap().is_err());
        assembler.push(&status_frame(2, &[]));
        assert_eq!(assembler.next_frame().unwrap().unwrap().id, 2);
    }
}
