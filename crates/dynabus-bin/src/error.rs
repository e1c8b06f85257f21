// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for the dynabus binary.

use dynabus::{ConfigurationError, ServoError};
use thiserror::Error;

/// Result type alias for binary operations.
pub type BinResult<T> = Result<T, BinError>;

/// Errors that end a CLI invocation.
#[derive(Debug, Error)]
pub enum BinError {
    /// Configuration file or override problem.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Servo stack error.
    #[error("{0}")]
    Servo(#[from] ServoError),

    /// A requested servo was not discovered.
    #[error("Servo {0} not found on the bus")]
    ServoNotFound(u8),

    /// Command failed.
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),

    /// Error with context.
    #[error("{context}: {source}")]
    WithContext {
        /// The context description.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<BinError>,
    },
}

impl BinError {
    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates a runtime error.
    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }

    /// Adds context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) => 1,
            Self::Servo(ServoError::Configuration(_)) => 1,
            Self::Servo(ServoError::Connection(_)) => 2,
            Self::Servo(ServoError::Timeout(_)) => 3,
            Self::Servo(_) => 4,
            Self::ServoNotFound(_) => 5,
            Self::Runtime(_) => 6,
            Self::Io(_) => 7,
            Self::WithContext { source, .. } => source.exit_code(),
        }
    }
}

impl From<ConfigurationError> for BinError {
    fn from(err: ConfigurationError) -> Self {
        Self::Configuration(err.to_string())
    }
}

impl From<std::io::Error> for BinError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BinError {
    fn from(err: serde_json::Error) -> Self {
        Self::Runtime(err.to_string())
    }
}

// =============================================================================
// Error Reporting
// =============================================================================

impl BinError {
    /// The innermost servo error and the context wrapped around it, if any.
    pub fn servo_error(&self) -> Option<(&ServoError, Option<&str>)> {
        match self {
            Self::Servo(error) => Some((error, None)),
            Self::WithContext { context, source } => source
                .servo_error()
                .map(|(error, inner)| (error, Some(inner.unwrap_or(context.as_str())))),
            _ => None,
        }
    }
}

/// Logs servo errors at their severity, then prints the error and its cause
/// chain to stderr.
pub fn report_error(error: &BinError) {
    if let Some((servo_error, context)) = error.servo_error() {
        servo_error.log(context.unwrap_or("command"));
    }
    eprintln!("Error: {}", error);

    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        eprintln!("  Caused by: {}", cause);
        source = cause.source();
    }
}
