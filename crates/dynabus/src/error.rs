// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for servo bus operations.
//!
//! Every fallible operation in this crate returns [`ServoResult`]. The
//! top-level [`ServoError`] wraps one enum per failure domain so callers can
//! match on the domain they care about and let the rest propagate.
//!
//! # Error Categories
//!
//! ```text
//! ServoError
//! ├── Connection     - port open / baud-set / state failures
//! ├── Timeout        - response deadline or motion wait exceeded
//! ├── Protocol       - corrupt or malformed frames (checksum, framing)
//! ├── Model          - no detected model, unknown model number
//! ├── Capability     - feature not supported by the detected model
//! ├── Register       - unknown name, read-only, out of range
//! ├── Communication  - transport reported a failure
//! ├── Fault          - device reported hardware error bits
//! └── Configuration  - invalid settings or schema
//! ```
//!
//! Nothing in this crate retries. [`ServoError::is_retryable`] tells the
//! caller which failures are worth a second attempt.
//!
//! # Examples
//!
//! ```
//! use dynabus::error::{RegisterError, ServoError, ErrorSeverity};
//!
//! let error = ServoError::from(RegisterError::read_only("PRESENT_POSITION"));
//! assert_eq!(error.category(), "register");
//! assert!(!error.is_retryable());
//! assert_eq!(error.severity(), ErrorSeverity::Error);
//! ```

use std::fmt;
use std::time::Duration;

use dynabus_protocol::{HardwareErrors, ProtocolError};
use thiserror::Error;
use tracing::Level;

use crate::model::Feature;

/// Result type alias for servo operations.
pub type ServoResult<T> = Result<T, ServoError>;

// =============================================================================
// ServoError - Main Error Type
// =============================================================================

/// The main error type for servo bus operations.
#[derive(Debug, Error)]
pub enum ServoError {
    /// Port open, baud-set or connection state errors.
    #[error("{0}")]
    Connection(#[from] ConnectionError),

    /// A deadline elapsed.
    #[error("{0}")]
    Timeout(#[from] TimeoutError),

    /// A received frame failed validation.
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The device has no usable model.
    #[error("{0}")]
    Model(#[from] ModelError),

    /// The model lacks a required feature.
    #[error("{0}")]
    Capability(#[from] CapabilityError),

    /// Register lookup, access or range errors.
    #[error("{0}")]
    Register(#[from] RegisterError),

    /// The transport failed to complete an exchange.
    #[error("{0}")]
    Communication(#[from] CommunicationError),

    /// The device reported hardware errors.
    #[error("{0}")]
    Fault(#[from] ServoFault),

    /// Invalid configuration or schema.
    #[error("{0}")]
    Configuration(#[from] ConfigurationError),
}

impl ServoError {
    // =========================================================================
    // Factory Methods
    // =========================================================================

    /// Creates a not connected error.
    #[inline]
    pub fn not_connected() -> Self {
        Self::Connection(ConnectionError::NotConnected)
    }

    /// Creates a model-not-detected error for `id`.
    #[inline]
    pub fn no_model(id: u8) -> Self {
        Self::Model(ModelError::NotDetected { id })
    }

    /// Creates a fault error from a device error byte.
    #[inline]
    pub fn fault(id: u8, errors: HardwareErrors) -> Self {
        Self::Fault(ServoFault { id, errors })
    }

    /// Maps a failed bus exchange with device `id` onto the taxonomy.
    ///
    /// A missing reply becomes [`TimeoutError::Response`], a corrupt reply
    /// becomes [`ServoError::Protocol`], anything else is a
    /// [`CommunicationError`].
    pub fn from_comm(id: u8, failure: CommFailure) -> Self {
        match failure {
            CommFailure::NoResponse { timeout } => Self::Timeout(TimeoutError::Response { id, timeout }),
            CommFailure::Corrupt(error) => Self::Protocol(error),
            other => Self::Communication(CommunicationError { id, failure: other }),
        }
    }

    // =========================================================================
    // Error Properties
    // =========================================================================

    /// Returns `true` if a later attempt at the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(e) => e.is_retryable(),
            Self::Timeout(_) | Self::Protocol(_) => true,
            Self::Communication(e) => e.failure.is_retryable(),
            Self::Fault(_) => false,
            Self::Model(_) | Self::Capability(_) | Self::Register(_) | Self::Configuration(_) => false,
        }
    }

    /// Returns the severity level of this error.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Connection(e) => e.severity(),
            Self::Timeout(_) | Self::Protocol(_) | Self::Communication(_) => ErrorSeverity::Warning,
            Self::Model(_) | Self::Capability(_) | Self::Register(_) => ErrorSeverity::Error,
            Self::Fault(_) | Self::Configuration(_) => ErrorSeverity::Critical,
        }
    }

    /// Returns the error category for logging.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection",
            Self::Timeout(_) => "timeout",
            Self::Protocol(_) => "protocol",
            Self::Model(_) => "model",
            Self::Capability(_) => "capability",
            Self::Register(_) => "register",
            Self::Communication(_) => "communication",
            Self::Fault(_) => "fault",
            Self::Configuration(_) => "configuration",
        }
    }

    /// Returns the hardware error bits if this is a device fault.
    pub fn fault_bits(&self) -> Option<HardwareErrors> {
        match self {
            Self::Fault(fault) => Some(fault.errors),
            _ => None,
        }
    }

    /// Returns `true` for any timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Returns the tracing level for this error.
    pub fn tracing_level(&self) -> Level {
        self.severity().to_tracing_level()
    }

    /// Logs this error with appropriate level and context.
    pub fn log(&self, context: &str) {
        match self.tracing_level() {
            Level::ERROR => tracing::error!(
                category = self.category(),
                context = context,
                retryable = self.is_retryable(),
                "{self}"
            ),
            Level::WARN => tracing::warn!(
                category = self.category(),
                context = context,
                retryable = self.is_retryable(),
                "{self}"
            ),
            _ => tracing::debug!(
                category = self.category(),
                context = context,
                retryable = self.is_retryable(),
                "{self}"
            ),
        }
    }
}

// =============================================================================
// ConnectionError
// =============================================================================

/// Connection lifecycle errors.
#[derive(Debug, Clone, Error)]
pub enum ConnectionError {
    /// The named port does not exist.
    #[error("Serial port not found: {port}")]
    PortNotFound {
        /// Port path.
        port: String,
    },

    /// No port was configured and none could be detected.
    #[error("No servo adapter port detected")]
    NoPortFound,

    /// The port exists but cannot be opened by this user.
    #[error("Access denied to serial port {port}")]
    AccessDenied {
        /// Port path.
        port: String,
    },

    /// Opening the port failed.
    #[error("Failed to open {port}: {message}")]
    OpenFailed {
        /// Port path.
        port: String,
        /// Underlying error message.
        message: String,
    },

    /// The port refused the requested baud rate.
    #[error("Failed to set baud rate {baud_rate} on {port}: {message}")]
    BaudRateFailed {
        /// Port path.
        port: String,
        /// Requested baud rate.
        baud_rate: u32,
        /// Underlying error message.
        message: String,
    },

    /// Only protocol 2.0 is supported.
    #[error("Unsupported protocol version {version}")]
    UnsupportedProtocol {
        /// Requested version.
        version: f32,
    },

    /// The controller is not connected.
    #[error("Not connected")]
    NotConnected,

    /// The controller is already connected.
    #[error("Already connected to {port}")]
    AlreadyConnected {
        /// Port in use.
        port: String,
    },
}

impl ConnectionError {
    /// Creates an open failure.
    pub fn open_failed(port: impl Into<String>, message: impl Into<String>) -> Self {
        Self::OpenFailed {
            port: port.into(),
            message: message.into(),
        }
    }

    /// Creates a baud-rate failure.
    pub fn baud_rate_failed(port: impl Into<String>, baud_rate: u32, message: impl Into<String>) -> Self {
        Self::BaudRateFailed {
            port: port.into(),
            baud_rate,
            message: message.into(),
        }
    }

    /// Returns `true` if reconnecting later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::OpenFailed { .. } | Self::BaudRateFailed { .. } | Self::NotConnected
        )
    }

    /// Returns the severity level.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotConnected | Self::AlreadyConnected { .. } => ErrorSeverity::Warning,
            Self::AccessDenied { .. } | Self::UnsupportedProtocol { .. } => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }
}

// =============================================================================
// TimeoutError
// =============================================================================

/// Deadline errors.
#[derive(Debug, Clone, Error)]
pub enum TimeoutError {
    /// A device did not answer a request in time.
    #[error("No response from servo {id} within {timeout:?}")]
    Response {
        /// Addressed device.
        id: u8,
        /// Response deadline.
        timeout: Duration,
    },

    /// Devices were still moving when the wait deadline passed.
    #[error("Servos {pending:?} still moving after {timeout:?}")]
    MotionWait {
        /// Wait deadline.
        timeout: Duration,
        /// Ids that had not reported stopped.
        pending: Vec<u8>,
    },
}

impl TimeoutError {
    /// Returns the deadline that elapsed.
    pub fn duration(&self) -> Duration {
        match self {
            Self::Response { timeout, .. } | Self::MotionWait { timeout, .. } => *timeout,
        }
    }
}

// =============================================================================
// ModelError / CapabilityError
// =============================================================================

/// Model detection and binding errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// The handle has no detected model.
    #[error("Servo {id} has no detected model")]
    NotDetected {
        /// Device id.
        id: u8,
    },

    /// The device reported a model number that is not registered.
    #[error("Servo {id} reports unknown model number {model_number}")]
    UnknownModel {
        /// Device id.
        id: u8,
        /// Reported model number.
        model_number: u16,
    },
}

/// A feature required by an operation is missing from the model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Model {model} (servo {id}) does not support {feature}")]
pub struct CapabilityError {
    /// Device id.
    pub id: u8,
    /// Model name.
    pub model: &'static str,
    /// Missing feature.
    pub feature: Feature,
}

// =============================================================================
// RegisterError
// =============================================================================

/// Register lookup and value errors. All are raised before any byte is sent.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegisterError {
    /// No register with this name in the model's control table.
    #[error("Unknown register '{name}' for model {model}")]
    Unknown {
        /// Requested name.
        name: String,
        /// Model name.
        model: &'static str,
    },

    /// Write attempted on a read-only register.
    #[error("Register '{name}' is read-only")]
    ReadOnly {
        /// Register name.
        name: String,
    },

    /// Value outside the register's valid range.
    #[error("Value {value} out of range for '{name}': expected {range}")]
    OutOfRange {
        /// Register name.
        name: String,
        /// Rejected value.
        value: f64,
        /// Rendered valid range.
        range: String,
    },

    /// The converted raw value does not fit the register width.
    #[error("Raw value {raw} does not fit {size}-byte register '{name}'")]
    RawOverflow {
        /// Register name.
        name: String,
        /// Converted raw value.
        raw: i64,
        /// Register width in bytes.
        size: u8,
    },
}

impl RegisterError {
    /// Creates an unknown-register error.
    pub fn unknown(name: impl Into<String>, model: &'static str) -> Self {
        Self::Unknown {
            name: name.into(),
            model,
        }
    }

    /// Creates a read-only error.
    pub fn read_only(name: impl Into<String>) -> Self {
        Self::ReadOnly { name: name.into() }
    }

    /// Creates an out-of-range error.
    pub fn out_of_range(name: impl Into<String>, value: f64, range: impl fmt::Display) -> Self {
        Self::OutOfRange {
            name: name.into(),
            value,
            range: range.to_string(),
        }
    }
}

// =============================================================================
// Communication
// =============================================================================

/// Why a request/response exchange did not complete.
#[derive(Debug, Clone, Error)]
pub enum CommFailure {
    /// The transport is not open.
    #[error("port is not open")]
    NotOpen,

    /// Writing the request failed.
    #[error("transmit failed: {0}")]
    Transmit(String),

    /// Reading the reply failed.
    #[error("receive failed: {0}")]
    Receive(String),

    /// No reply arrived before the deadline.
    #[error("no response within {timeout:?}")]
    NoResponse {
        /// Response deadline.
        timeout: Duration,
    },

    /// The reply failed frame validation.
    #[error("corrupt response: {0}")]
    Corrupt(ProtocolError),

    /// The reply was well-formed but not what was asked for.
    #[error("unexpected response: {0}")]
    Unexpected(String),

    /// The request could not be encoded.
    #[error("invalid request: {0}")]
    InvalidRequest(ProtocolError),
}

impl CommFailure {
    /// Returns `true` for failures that may clear on a later attempt.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::NotOpen | Self::InvalidRequest(_))
    }
}

/// The transport could not complete an exchange with a device.
#[derive(Debug, Clone, Error)]
#[error("Communication with servo {id} failed: {failure}")]
pub struct CommunicationError {
    /// Addressed device.
    pub id: u8,
    /// Failure detail.
    pub failure: CommFailure,
}

/// The device answered with a nonzero hardware error byte.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Servo {id} reported hardware error: {errors}")]
pub struct ServoFault {
    /// Reporting device.
    pub id: u8,
    /// Decoded error bits.
    pub errors: HardwareErrors,
}

// =============================================================================
// ConfigurationError
// =============================================================================

/// Invalid settings or schema definitions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// Id outside 0-252 and not the broadcast id.
    #[error("Invalid servo id {id}: must be 0-252 or 254")]
    InvalidId {
        /// Offending id.
        id: u8,
    },

    /// Baud rate not in the supported table.
    #[error("Unsupported baud rate {baud_rate}")]
    InvalidBaudRate {
        /// Offending baud rate.
        baud_rate: u32,
    },

    /// Register width other than 1, 2 or 4 bytes.
    #[error("Invalid register size {size}: must be 1, 2 or 4")]
    InvalidRegisterSize {
        /// Offending width.
        size: usize,
    },

    /// Two registers share a name in one model.
    #[error("Duplicate register '{name}' in model {model}")]
    DuplicateRegister {
        /// Register name.
        name: &'static str,
        /// Model name.
        model: &'static str,
    },

    /// A field holds an invalid value.
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue {
        /// Field name.
        field: String,
        /// What is wrong.
        message: String,
    },
}

impl ConfigurationError {
    /// Creates an invalid value error.
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

// =============================================================================
// ErrorSeverity
// =============================================================================

/// Error severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    /// Informational - no action required.
    Info,
    /// Warning - action may be required.
    Warning,
    /// Error - action required, but recoverable.
    Error,
    /// Critical - immediate action required.
    Critical,
}

impl ErrorSeverity {
    /// Converts to tracing level.
    pub fn to_tracing_level(self) -> Level {
        match self {
            Self::Info => Level::INFO,
            Self::Warning => Level::WARN,
            Self::Error | Self::Critical => Level::ERROR,
        }
    }

    /// Returns the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_comm_mapping() {
        let timeout = Duration::from_millis(50);
        let err = ServoError::from_comm(3, CommFailure::NoResponse { timeout });
        assert!(matches!(
            err,
            ServoError::Timeout(TimeoutError::Response { id: 3, .. })
        ));

        let crc = ProtocolError::ChecksumMismatch {
            expected: 1,
            actual: 2,
        };
        let err = ServoError::from_comm(3, CommFailure::Corrupt(crc.clone()));
        assert!(matches!(err, ServoError::Protocol(ref e) if *e == crc));

        let err = ServoError::from_comm(3, CommFailure::Transmit("broken pipe".into()));
        assert_eq!(err.category(), "communication");
        assert!(err.is_retryable());
        assert_eq!(
            err.to_string(),
            "Communication with servo 3 failed: transmit failed: broken pipe"
        );
    }

    #[test]
    fn test_fault_bits() {
        let errors = HardwareErrors::OVERHEATING | HardwareErrors::OVERLOAD;
        let err = ServoError::fault(2, errors);
        assert_eq!(err.fault_bits(), Some(errors));
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(!err.is_retryable());
        assert_eq!(
            err.to_string(),
            "Servo 2 reported hardware error: overheating|overload"
        );
    }

    #[test]
    fn test_categories() {
        assert_eq!(ServoError::not_connected().category(), "connection");
        assert_eq!(ServoError::no_model(4).category(), "model");
        let cap = CapabilityError {
            id: 1,
            model: "XL430-W250",
            feature: Feature::CurrentControl,
        };
        assert_eq!(ServoError::from(cap).category(), "capability");
    }

    #[test]
    fn test_motion_wait_display() {
        let err = TimeoutError::MotionWait {
            timeout: Duration::from_millis(300),
            pending: vec![1, 2],
        };
        assert_eq!(err.to_string(), "Servos [1, 2] still moving after 300ms");
        assert_eq!(err.duration(), Duration::from_millis(300));
    }

    #[test]
    fn test_register_error_display() {
        let err = RegisterError::out_of_range("LED", 2.0, "[0, 1]");
        assert_eq!(err.to_string(), "Value 2 out of range for 'LED': expected [0, 1]");
    }

    #[test]
    fn test_severity_ordering() {
        assert!(ErrorSeverity::Critical > ErrorSeverity::Warning);
        assert_eq!(ErrorSeverity::Warning.to_tracing_level(), Level::WARN);
        assert_eq!(ErrorSeverity::Critical.to_string(), "critical");
    }
}
