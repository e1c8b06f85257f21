// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Custom Test Assertions
//!
//! Assertion helpers with failure messages that name the servo and the
//! expected error category.

use std::time::Duration;

use dynabus::{
    ConnectionError, HardwareErrors, RegisterError, ServoError, SimulatedBus, TimeoutError,
};

// =============================================================================
// ServoError Assertions
// =============================================================================

/// Assertion extensions for [`ServoError`].
pub trait ServoErrorAssertions {
    /// Assert the error is a [`RegisterError`].
    fn assert_register_error(&self);

    /// Assert the error is [`RegisterError::OutOfRange`].
    fn assert_out_of_range(&self);

    /// Assert the error is [`RegisterError::ReadOnly`].
    fn assert_read_only(&self);

    /// Assert the error is a [`ConnectionError`].
    fn assert_connection_error(&self);

    /// Assert the error is a response timeout.
    fn assert_response_timeout(&self);

    /// Assert the error is a motion-wait timeout listing `pending`.
    fn assert_motion_timeout(&self, pending: &[u8]);

    /// Assert the error is a device fault carrying `bits`.
    fn assert_fault(&self, bits: HardwareErrors);
}

impl ServoErrorAssertions for ServoError {
    fn assert_register_error(&self) {
        assert!(
            matches!(self, ServoError::Register(_)),
            "Expected register error, got [{}] {}",
            self.category(),
            self
        );
    }

    fn assert_out_of_range(&self) {
        assert!(
            matches!(self, ServoError::Register(RegisterError::OutOfRange { .. })),
            "Expected out-of-range error, got [{}] {}",
            self.category(),
            self
        );
    }

    fn assert_read_only(&self) {
        assert!(
            matches!(self, ServoError::Register(RegisterError::ReadOnly { .. })),
            "Expected read-only error, got [{}] {}",
            self.category(),
            self
        );
    }

    fn assert_connection_error(&self) {
        assert!(
            matches!(self, ServoError::Connection(_)),
            "Expected connection error, got [{}] {}",
            self.category(),
            self
        );
    }

    fn assert_response_timeout(&self) {
        assert!(
            matches!(self, ServoError::Timeout(TimeoutError::Response { .. })),
            "Expected response timeout, got [{}] {}",
            self.category(),
            self
        );
    }

    fn assert_motion_timeout(&self, pending: &[u8]) {
        match self {
            ServoError::Timeout(TimeoutError::MotionWait { pending: actual, .. }) => {
                assert_eq!(actual.as_slice(), pending, "Unexpected pending servos");
            }
            other => panic!(
                "Expected motion-wait timeout, got [{}] {}",
                other.category(),
                other
            ),
        }
    }

    fn assert_fault(&self, bits: HardwareErrors) {
        assert_eq!(
            self.fault_bits(),
            Some(bits),
            "Expected device fault {:?}, got [{}] {}",
            bits,
            self.category(),
            self
        );
    }
}

/// Asserts `err` is a connection error accepted by `check`.
pub fn assert_connection_variant(err: &ServoError, check: impl Fn(&ConnectionError) -> bool) {
    match err {
        ServoError::Connection(inner) => assert!(check(inner), "Unexpected connection error: {inner}"),
        other => panic!("Expected connection error, got [{}] {}", other.category(), other),
    }
}

// =============================================================================
// Value Assertions
// =============================================================================

/// Asserts `actual` is within `tolerance` of `expected`.
pub fn assert_approx(actual: f64, expected: f64, tolerance: f64) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= tolerance,
        "Expected {} ± {}, but got {} (diff: {})",
        expected,
        tolerance,
        actual,
        diff
    );
}

/// Asserts `elapsed` lies in `[min, max)`.
pub fn assert_elapsed_between(elapsed: Duration, min: Duration, max: Duration) {
    assert!(
        elapsed >= min && elapsed < max,
        "Expected elapsed time in [{:?}, {:?}), got {:?}",
        min,
        max,
        elapsed
    );
}

// =============================================================================
// SimulatedBus Assertions
// =============================================================================

/// Assertion extensions for [`SimulatedBus`].
pub trait SimulatedBusAssertions {
    /// Assert the number of `send` calls.
    fn assert_sent_count(&self, expected: usize);

    /// Assert the unsigned raw value at `address` of device `id`.
    fn assert_raw(&self, id: u8, address: u16, size: u8, expected: i64);
}

impl SimulatedBusAssertions for SimulatedBus {
    fn assert_sent_count(&self, expected: usize) {
        assert_eq!(
            self.sent_count(),
            expected,
            "Expected {} frames sent, got {}",
            expected,
            self.sent_count()
        );
    }

    fn assert_raw(&self, id: u8, address: u16, size: u8, expected: i64) {
        assert_eq!(
            self.peek(id, address, size),
            Some(expected),
            "Unexpected raw value at servo {} address {}",
            id,
            address
        );
    }
}
