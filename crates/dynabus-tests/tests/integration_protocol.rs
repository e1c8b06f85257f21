// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Protocol Integration Tests
//!
//! - `test_frame_*`: Known wire vectors and encode/decode agreement
//! - `test_crc_*`: Checksum cross-checked against the `crc` crate
//! - `test_stream_*`: Reassembly from chunked reads

use crc::{Crc, CRC_16_UMTS};
use dynabus_protocol::{
    crc::checksum, decode, FactoryResetMode, FrameAssembler, HardwareErrors, Instruction, Packet,
    BROADCAST_ID,
};

const UMTS: Crc<u16> = Crc::<u16>::new(&CRC_16_UMTS);

// =============================================================================
// Frames
// =============================================================================

#[test]
fn test_frame_ping_vector() {
    let frame = Packet::ping(1).encode().unwrap();
    assert_eq!(frame, [0xFF, 0xFF, 0xFD, 0x00, 0x01, 0x03, 0x00, 0x01, 0x19, 0x4E]);
}

#[test]
fn test_frame_decode_matches_request() {
    let requests = [
        Packet::ping(7),
        Packet::read(1, 132, 4),
        Packet::write(2, 116, &2048u32.to_le_bytes()),
        Packet::reboot(3),
        Packet::factory_reset(4, FactoryResetMode::ExceptIdAndBaudRate),
        Packet::action(BROADCAST_ID),
    ];

    for request in requests {
        let frame = request.encode().unwrap();
        assert_eq!(decode(&frame).unwrap(), request, "frame {frame:02X?}");
    }
}

#[test]
fn test_frame_stuffed_params_survive() {
    // A parameter run equal to the header must be escaped on the wire.
    let data = [0xFF, 0xFF, 0xFD, 0x10, 0xFF, 0xFF, 0xFD];
    let request = Packet::write(1, 200, &data);
    let frame = request.encode().unwrap();

    let escaped_runs = frame[7..]
        .windows(4)
        .filter(|w| w == &[0xFF, 0xFF, 0xFD, 0xFD])
        .count();
    assert_eq!(escaped_runs, 2);
    assert_eq!(Packet::decode(&frame).unwrap().params[2..], data);
}

#[test]
fn test_frame_any_bit_flip_is_rejected() {
    let frame = Packet::write(5, 64, &[1]).encode().unwrap();
    for byte in 0..frame.len() {
        for bit in 0..8 {
            let mut corrupted = frame.clone();
            corrupted[byte] ^= 1 << bit;
            assert!(
                decode(&corrupted).is_err(),
                "flip of bit {bit} in byte {byte} was accepted"
            );
        }
    }
}

#[test]
fn test_frame_status_roundtrip() {
    let status = Packet::status(1, HardwareErrors::OVERHEATING, &[0x1E])
        .encode()
        .and_then(|frame| Packet::decode(&frame))
        .and_then(Packet::into_status)
        .unwrap();

    assert_eq!(status.id, 1);
    assert!(status.errors.contains(HardwareErrors::OVERHEATING));
    assert_eq!(status.data, vec![0x1E]);
}

#[test]
fn test_frame_request_is_not_status() {
    let packet = decode(&Packet::ping(1).encode().unwrap()).unwrap();
    assert_eq!(packet.instruction, Instruction::Ping);
    assert!(packet.into_status().is_err());
}

// =============================================================================
// CRC
// =============================================================================

#[test]
fn test_crc_matches_reference() {
    let samples: [&[u8]; 4] = [
        b"123456789",
        &[0xFF, 0xFF, 0xFD, 0x00, 0x01, 0x03, 0x00, 0x01],
        &[],
        &[0x00; 64],
    ];
    for sample in samples {
        assert_eq!(checksum(sample), UMTS.checksum(sample), "sample {sample:02X?}");
    }
}

#[test]
fn test_crc_covers_encoded_frames() {
    for id in [0u8, 1, 42, 252] {
        let frame = Packet::read(id, 126, 2).encode().unwrap();
        let (body, trailer) = frame.split_at(frame.len() - 2);
        assert_eq!(
            u16::from_le_bytes([trailer[0], trailer[1]]),
            UMTS.checksum(body)
        );
    }
}

// =============================================================================
// Streams
// =============================================================================

#[test]
fn test_stream_byte_at_a_time() {
    let frame = Packet::status(3, HardwareErrors::empty(), &[0x00, 0x08, 0x00, 0x00])
        .encode()
        .unwrap();
    let mut assembler = FrameAssembler::new();

    for (i, byte) in frame.iter().enumerate() {
        assembler.push(&[*byte]);
        let next = assembler.next_frame();
        if i + 1 < frame.len() {
            assert!(next.is_none(), "frame completed early at byte {i}");
        } else {
            let packet = next.unwrap().unwrap();
            assert_eq!(packet.id, 3);
        }
    }
}

#[test]
fn test_stream_noise_and_back_to_back_frames() {
    let first = Packet::status(1, HardwareErrors::empty(), &[1]).encode().unwrap();
    let second = Packet::status(2, HardwareErrors::empty(), &[2]).encode().unwrap();

    let mut stream = vec![0x00, 0x13, 0xFF];
    stream.extend_from_slice(&first);
    stream.extend_from_slice(&second);

    let mut assembler = FrameAssembler::new();
    assembler.push(&stream);
    assert_eq!(assembler.next_frame().unwrap().unwrap().id, 1);
    assert_eq!(assembler.next_frame().unwrap().unwrap().id, 2);
    assert!(assembler.next_frame().is_none());
    assert_eq!(assembler.buffered(), 0);
}

#[test]
fn test_stream_corrupt_frame_then_recovery() {
    let mut bad = Packet::status(1, HardwareErrors::empty(), &[9]).encode().unwrap();
    let last = bad.len() - 1;
    bad[last] ^= 0x01;
    let good = Packet::status(1, HardwareErrors::empty(), &[9]).encode().unwrap();

    let mut assembler = FrameAssembler::new();
    assembler.push(&bad);
    assembler.push(&good);

    let err = assembler.next_frame().unwrap().unwrap_err();
    assert!(err.is_checksum());
    assert_eq!(assembler.next_frame().unwrap().unwrap().params, vec![0, 9]);
}
