// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Device handles and their typed accessors.
//!
//! A [`Servo`] is an id, an optional bound model and a clone of the shared
//! [`Bus`]. Handles are cheap to clone and can be driven from several tasks;
//! the bus serialises the exchanges. Every accessor here is a thin wrapper
//! over the register engine with a fixed register name.

use std::fmt;
use std::sync::Arc;

use dynabus_protocol::FactoryResetMode;
use serde::{Deserialize, Serialize};

use crate::bus::{Bus, PingInfo};
use crate::engine::check;
use crate::error::{RegisterError, ServoError, ServoResult};
use crate::model::{Feature, Model, ModelInfo, OperatingMode};
use crate::registers as r;
use crate::transport::BusTransport;
use crate::types::{BaudRate, ServoId};

/// Position loop gains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PidGains {
    /// Proportional gain.
    pub p: u16,
    /// Integral gain.
    pub i: u16,
    /// Derivative gain.
    pub d: u16,
}

/// Velocity loop gains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PiGains {
    /// Proportional gain.
    pub p: u16,
    /// Integral gain.
    pub i: u16,
}

// =============================================================================
// Servo
// =============================================================================

/// Handle to one device on the bus.
pub struct Servo<T> {
    id: ServoId,
    model: Option<Arc<Model>>,
    bus: Bus<T>,
}

impl<T> Clone for Servo<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            model: self.model.clone(),
            bus: self.bus.clone(),
        }
    }
}

impl<T> fmt::Debug for Servo<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Servo")
            .field("id", &self.id)
            .field("model", &self.model.as_ref().map(|m| m.name()))
            .finish()
    }
}

impl<T> Servo<T> {
    /// Creates a handle without a model.
    pub fn new(id: ServoId, bus: Bus<T>) -> Self {
        Self {
            id,
            model: None,
            bus,
        }
    }

    /// Binds `model` and returns the handle.
    pub fn with_model(mut self, model: Arc<Model>) -> Self {
        self.model = Some(model);
        self
    }

    /// Device id.
    pub fn id(&self) -> ServoId {
        self.id
    }

    /// Bound model, if detected.
    pub fn model(&self) -> Option<&Arc<Model>> {
        self.model.as_ref()
    }

    /// Serialisable summary of the bound model.
    pub fn model_info(&self) -> Option<ModelInfo> {
        self.model.as_ref().map(|model| model.info())
    }

    pub(crate) fn bind_model(&mut self, model: Arc<Model>) {
        self.model = Some(model);
    }

    pub(crate) fn bus(&self) -> &Bus<T> {
        &self.bus
    }
}

fn gain(raw: i64) -> u16 {
    u16::try_from(raw).unwrap_or(u16::MAX)
}

impl<T: BusTransport> Servo<T> {
    // =========================================================================
    // Torque
    // =========================================================================

    /// Enables torque.
    pub async fn enable_torque(&self) -> ServoResult<()> {
        self.set_torque(true).await
    }

    /// Disables torque.
    pub async fn disable_torque(&self) -> ServoResult<()> {
        self.set_torque(false).await
    }

    /// Switches torque on or off.
    pub async fn set_torque(&self, enable: bool) -> ServoResult<()> {
        self.write_register(r::TORQUE_ENABLE, f64::from(u8::from(enable))).await
    }

    /// Returns `true` if torque is on.
    pub async fn torque_enabled(&self) -> ServoResult<bool> {
        Ok(self.read_raw(r::TORQUE_ENABLE).await? != 0)
    }

    // =========================================================================
    // Position / velocity / PWM
    // =========================================================================

    /// Sets the goal position in degrees.
    pub async fn set_position(&self, degrees: f64) -> ServoResult<()> {
        self.write_register(r::GOAL_POSITION, degrees).await
    }

    /// Present position in degrees.
    pub async fn position(&self) -> ServoResult<f64> {
        self.read_register(r::PRESENT_POSITION).await
    }

    /// Goal position in degrees.
    pub async fn goal_position(&self) -> ServoResult<f64> {
        self.read_register(r::GOAL_POSITION).await
    }

    /// Sets the goal velocity in rpm.
    pub async fn set_velocity(&self, rpm: f64) -> ServoResult<()> {
        self.write_register(r::GOAL_VELOCITY, rpm).await
    }

    /// Present velocity in rpm.
    pub async fn velocity(&self) -> ServoResult<f64> {
        self.read_register(r::PRESENT_VELOCITY).await
    }

    /// Sets the goal PWM in percent.
    pub async fn set_pwm(&self, percent: f64) -> ServoResult<()> {
        self.write_register(r::GOAL_PWM, percent).await
    }

    /// Present PWM in percent.
    pub async fn pwm(&self) -> ServoResult<f64> {
        self.read_register(r::PRESENT_PWM).await
    }

    // =========================================================================
    // Current (requires current sensing)
    // =========================================================================

    /// Sets the goal current in mA.
    pub async fn set_current(&self, milliamps: f64) -> ServoResult<()> {
        self.require_feature(Feature::CurrentControl)?;
        self.write_register(r::GOAL_CURRENT, milliamps).await
    }

    /// Present current in mA.
    pub async fn current(&self) -> ServoResult<f64> {
        self.require_feature(Feature::CurrentControl)?;
        self.read_register(r::PRESENT_CURRENT).await
    }

    /// Sets the current limit in mA.
    pub async fn set_current_limit(&self, milliamps: f64) -> ServoResult<()> {
        self.require_feature(Feature::CurrentControl)?;
        self.write_register(r::CURRENT_LIMIT, milliamps).await
    }

    /// Current limit in mA.
    pub async fn current_limit(&self) -> ServoResult<f64> {
        self.require_feature(Feature::CurrentControl)?;
        self.read_register(r::CURRENT_LIMIT).await
    }

    /// Moves to `degrees` with the goal current capped at `milliamps`.
    ///
    /// Only meaningful in current-based position mode.
    pub async fn set_current_based_position(&self, degrees: f64, milliamps: f64) -> ServoResult<()> {
        self.require_feature(Feature::CurrentBasedPosition)?;
        self.write_register(r::GOAL_CURRENT, milliamps).await?;
        self.write_register(r::GOAL_POSITION, degrees).await
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// Sets the profile velocity in rpm; 0 means unlimited.
    pub async fn set_profile_velocity(&self, rpm: f64) -> ServoResult<()> {
        self.write_register(r::PROFILE_VELOCITY, rpm).await
    }

    /// Profile velocity in rpm.
    pub async fn profile_velocity(&self) -> ServoResult<f64> {
        self.read_register(r::PROFILE_VELOCITY).await
    }

    /// Sets the profile acceleration in rev/min²; 0 means unlimited.
    pub async fn set_profile_acceleration(&self, acceleration: f64) -> ServoResult<()> {
        self.write_register(r::PROFILE_ACCELERATION, acceleration).await
    }

    /// Profile acceleration in rev/min².
    pub async fn profile_acceleration(&self) -> ServoResult<f64> {
        self.read_register(r::PROFILE_ACCELERATION).await
    }

    // =========================================================================
    // Gains
    // =========================================================================

    /// Writes the position loop gains.
    pub async fn set_position_gains(&self, gains: PidGains) -> ServoResult<()> {
        self.write_register(r::POSITION_P_GAIN, f64::from(gains.p)).await?;
        self.write_register(r::POSITION_I_GAIN, f64::from(gains.i)).await?;
        self.write_register(r::POSITION_D_GAIN, f64::from(gains.d)).await
    }

    /// Reads the position loop gains.
    pub async fn position_gains(&self) -> ServoResult<PidGains> {
        Ok(PidGains {
            p: gain(self.read_raw(r::POSITION_P_GAIN).await?),
            i: gain(self.read_raw(r::POSITION_I_GAIN).await?),
            d: gain(self.read_raw(r::POSITION_D_GAIN).await?),
        })
    }

    /// Writes the velocity loop gains.
    pub async fn set_velocity_gains(&self, gains: PiGains) -> ServoResult<()> {
        self.write_register(r::VELOCITY_P_GAIN, f64::from(gains.p)).await?;
        self.write_register(r::VELOCITY_I_GAIN, f64::from(gains.i)).await
    }

    /// Reads the velocity loop gains.
    pub async fn velocity_gains(&self) -> ServoResult<PiGains> {
        Ok(PiGains {
            p: gain(self.read_raw(r::VELOCITY_P_GAIN).await?),
            i: gain(self.read_raw(r::VELOCITY_I_GAIN).await?),
        })
    }

    // =========================================================================
    // LED / sensors
    // =========================================================================

    /// Switches the LED.
    pub async fn set_led(&self, on: bool) -> ServoResult<()> {
        self.write_register(r::LED, f64::from(u8::from(on))).await
    }

    /// Returns `true` if the LED is on.
    pub async fn led(&self) -> ServoResult<bool> {
        Ok(self.read_raw(r::LED).await? != 0)
    }

    /// Internal temperature in °C.
    pub async fn temperature(&self) -> ServoResult<f64> {
        self.read_register(r::PRESENT_TEMPERATURE).await
    }

    /// Input voltage in volts.
    pub async fn voltage(&self) -> ServoResult<f64> {
        self.read_register(r::PRESENT_INPUT_VOLTAGE).await
    }

    /// Load in percent of maximum torque.
    pub async fn load(&self) -> ServoResult<f64> {
        self.read_register(r::PRESENT_LOAD).await
    }

    /// Returns `true` while a motion profile is running.
    pub async fn is_moving(&self) -> ServoResult<bool> {
        Ok(self.read_raw(r::MOVING).await? != 0)
    }

    // =========================================================================
    // Configuration registers
    // =========================================================================

    /// Switches the operating mode.
    ///
    /// Fails with a capability error, before any write, if the model lacks
    /// the mode's feature.
    pub async fn set_operating_mode(&self, mode: OperatingMode) -> ServoResult<()> {
        self.require_feature(mode.required_feature())?;
        self.write_register(r::OPERATING_MODE, f64::from(mode.value())).await
    }

    /// Current operating mode.
    pub async fn operating_mode(&self) -> ServoResult<OperatingMode> {
        let raw = self.read_raw(r::OPERATING_MODE).await?;
        u8::try_from(raw)
            .ok()
            .and_then(OperatingMode::from_value)
            .ok_or_else(|| {
                RegisterError::out_of_range(r::OPERATING_MODE, raw as f64, "a known operating mode")
                    .into()
            })
    }

    /// Writes the `BAUD_RATE` register. Takes effect on the device at once.
    pub async fn set_baud_rate(&self, baud_rate: BaudRate) -> ServoResult<()> {
        self.write_register(r::BAUD_RATE, f64::from(baud_rate.code())).await
    }

    /// Reads the `BAUD_RATE` register.
    pub async fn baud_rate(&self) -> ServoResult<BaudRate> {
        let raw = self.read_raw(r::BAUD_RATE).await?;
        u8::try_from(raw)
            .ok()
            .and_then(BaudRate::from_code)
            .ok_or_else(|| {
                RegisterError::out_of_range(r::BAUD_RATE, raw as f64, "0-7").into()
            })
    }

    // =========================================================================
    // Instructions
    // =========================================================================

    /// PING. Does not need a model.
    pub async fn ping(&self) -> ServoResult<PingInfo> {
        let id = self.id.get();
        let reply = self
            .bus
            .ping(id)
            .await
            .map_err(|failure| ServoError::from_comm(id, failure))?;
        check(reply)
    }

    /// REBOOT.
    pub async fn reboot(&self) -> ServoResult<()> {
        let id = self.id.get();
        let reply = self
            .bus
            .reboot(id)
            .await
            .map_err(|failure| ServoError::from_comm(id, failure))?;
        check(reply)
    }

    /// FACTORY_RESET.
    pub async fn factory_reset(&self, mode: FactoryResetMode) -> ServoResult<()> {
        let id = self.id.get();
        let reply = self
            .bus
            .factory_reset(id, mode)
            .await
            .map_err(|failure| ServoError::from_comm(id, failure))?;
        check(reply)
    }
}
