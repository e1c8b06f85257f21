// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Controller settings.
//!
//! [`ControllerConfig`] is plain serde data so it can be embedded in a YAML
//! or TOML file; durations are written in humantime form (`50ms`, `5s`).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::types::{BaudRate, ServoId};

/// The only protocol revision this crate speaks.
pub const SUPPORTED_PROTOCOL_VERSION: f32 = 2.0;

// =============================================================================
// ControllerConfig
// =============================================================================

/// Configuration for a [`Controller`](crate::controller::Controller).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Serial port path. `None` means auto-detect.
    pub port: Option<String>,

    /// Bus speed.
    pub baud_rate: BaudRate,

    /// Protocol revision. Only 2.0 is accepted at connect time.
    pub protocol_version: f32,

    /// Ids probed by discovery when `connect` is given no candidates.
    pub scan_ids: Vec<u8>,

    /// Deadline for each request/response exchange.
    #[serde(with = "humantime_serde")]
    pub response_timeout: Duration,

    /// Interval between `MOVING` polls while waiting for motion to finish.
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Default deadline for waiting on motion.
    #[serde(with = "humantime_serde")]
    pub wait_timeout: Duration,
}

fn default_scan_ids() -> Vec<u8> {
    vec![1, 2, 3, 4]
}

fn default_response_timeout() -> Duration {
    Duration::from_millis(50)
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(100)
}

fn default_wait_timeout() -> Duration {
    Duration::from_secs(5)
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: BaudRate::default(),
            protocol_version: SUPPORTED_PROTOCOL_VERSION,
            scan_ids: default_scan_ids(),
            response_timeout: default_response_timeout(),
            poll_interval: default_poll_interval(),
            wait_timeout: default_wait_timeout(),
        }
    }
}

impl ControllerConfig {
    /// Creates a new builder.
    pub fn builder() -> ControllerConfigBuilder {
        ControllerConfigBuilder::default()
    }

    /// Creates a configuration for a known port with default settings.
    pub fn with_port(port: impl Into<String>) -> Self {
        Self {
            port: Some(port.into()),
            ..Default::default()
        }
    }

    /// Validates this configuration.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if let Some(port) = &self.port {
            if port.trim().is_empty() {
                return Err(ConfigurationError::invalid_value(
                    "port",
                    "must not be empty",
                ));
            }
        }

        if !self.protocol_version.is_finite() || self.protocol_version <= 0.0 {
            return Err(ConfigurationError::invalid_value(
                "protocol_version",
                format!("{} is not a protocol version", self.protocol_version),
            ));
        }

        if self.scan_ids.is_empty() {
            return Err(ConfigurationError::invalid_value(
                "scan_ids",
                "at least one id is required",
            ));
        }
        for &id in &self.scan_ids {
            if ServoId::new(id)?.is_broadcast() {
                return Err(ConfigurationError::invalid_value(
                    "scan_ids",
                    "the broadcast id cannot be scanned",
                ));
            }
        }

        for (field, duration) in [
            ("response_timeout", self.response_timeout),
            ("poll_interval", self.poll_interval),
            ("wait_timeout", self.wait_timeout),
        ] {
            if duration.is_zero() {
                return Err(ConfigurationError::invalid_value(
                    field,
                    "must be greater than 0",
                ));
            }
        }

        Ok(())
    }
}

// =============================================================================
// ControllerConfigBuilder
// =============================================================================

/// Builder for [`ControllerConfig`].
#[derive(Debug, Default)]
pub struct ControllerConfigBuilder {
    port: Option<String>,
    baud_rate: Option<BaudRate>,
    protocol_version: Option<f32>,
    scan_ids: Option<Vec<u8>>,
    response_timeout: Option<Duration>,
    poll_interval: Option<Duration>,
    wait_timeout: Option<Duration>,
}

impl ControllerConfigBuilder {
    /// Sets the serial port path.
    pub fn port(mut self, port: impl Into<String>) -> Self {
        self.port = Some(port.into());
        self
    }

    /// Sets the bus speed.
    pub fn baud_rate(mut self, baud_rate: BaudRate) -> Self {
        self.baud_rate = Some(baud_rate);
        self
    }

    /// Sets the protocol version.
    pub fn protocol_version(mut self, version: f32) -> Self {
        self.protocol_version = Some(version);
        self
    }

    /// Sets the ids probed by default discovery.
    pub fn scan_ids(mut self, ids: impl IntoIterator<Item = u8>) -> Self {
        self.scan_ids = Some(ids.into_iter().collect());
        self
    }

    /// Sets the per-exchange response deadline.
    pub fn response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = Some(timeout);
        self
    }

    /// Sets the motion poll interval.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Sets the default motion wait deadline.
    pub fn wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = Some(timeout);
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> Result<ControllerConfig, ConfigurationError> {
        let config = ControllerConfig {
            port: self.port,
            baud_rate: self.baud_rate.unwrap_or_default(),
            protocol_version: self.protocol_version.unwrap_or(SUPPORTED_PROTOCOL_VERSION),
            scan_ids: self.scan_ids.unwrap_or_else(default_scan_ids),
            response_timeout: self.response_timeout.unwrap_or_else(default_response_timeout),
            poll_interval: self.poll_interval.unwrap_or_else(default_poll_interval),
            wait_timeout: self.wait_timeout.unwrap_or_else(default_wait_timeout),
        };

        config.validate()?;
        Ok(config)
    }
}
