// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Register names shared by the built-in models.

#![allow(missing_docs)]

// EEPROM area
pub const MODEL_NUMBER: &str = "MODEL_NUMBER";
pub const MODEL_INFORMATION: &str = "MODEL_INFORMATION";
pub const FIRMWARE_VERSION: &str = "FIRMWARE_VERSION";
pub const ID: &str = "ID";
pub const BAUD_RATE: &str = "BAUD_RATE";
pub const RETURN_DELAY_TIME: &str = "RETURN_DELAY_TIME";
pub const DRIVE_MODE: &str = "DRIVE_MODE";
pub const OPERATING_MODE: &str = "OPERATING_MODE";
pub const SECONDARY_ID: &str = "SECONDARY_ID";
pub const PROTOCOL_VERSION: &str = "PROTOCOL_VERSION";
pub const HOMING_OFFSET: &str = "HOMING_OFFSET";
pub const MOVING_THRESHOLD: &str = "MOVING_THRESHOLD";
pub const TEMPERATURE_LIMIT: &str = "TEMPERATURE_LIMIT";
pub const MAX_VOLTAGE_LIMIT: &str = "MAX_VOLTAGE_LIMIT";
pub const MIN_VOLTAGE_LIMIT: &str = "MIN_VOLTAGE_LIMIT";
pub const PWM_LIMIT: &str = "PWM_LIMIT";
pub const CURRENT_LIMIT: &str = "CURRENT_LIMIT";
pub const VELOCITY_LIMIT: &str = "VELOCITY_LIMIT";
pub const MAX_POSITION_LIMIT: &str = "MAX_POSITION_LIMIT";
pub const MIN_POSITION_LIMIT: &str = "MIN_POSITION_LIMIT";
pub const SHUTDOWN: &str = "SHUTDOWN";

// RAM area
pub const TORQUE_ENABLE: &str = "TORQUE_ENABLE";
pub const LED: &str = "LED";
pub const STATUS_RETURN_LEVEL: &str = "STATUS_RETURN_LEVEL";
pub const REGISTERED_INSTRUCTION: &str = "REGISTERED_INSTRUCTION";
pub const HARDWARE_ERROR_STATUS: &str = "HARDWARE_ERROR_STATUS";
pub const VELOCITY_I_GAIN: &str = "VELOCITY_I_GAIN";
pub const VELOCITY_P_GAIN: &str = "VELOCITY_P_GAIN";
pub const POSITION_D_GAIN: &str = "POSITION_D_GAIN";
pub const POSITION_I_GAIN: &str = "POSITION_I_GAIN";
pub const POSITION_P_GAIN: &str = "POSITION_P_GAIN";
pub const FEEDFORWARD_2ND_GAIN: &str = "FEEDFORWARD_2ND_GAIN";
pub const FEEDFORWARD_1ST_GAIN: &str = "FEEDFORWARD_1ST_GAIN";
pub const BUS_WATCHDOG: &str = "BUS_WATCHDOG";
pub const GOAL_PWM: &str = "GOAL_PWM";
pub const GOAL_CURRENT: &str = "GOAL_CURRENT";
pub const GOAL_VELOCITY: &str = "GOAL_VELOCITY";
pub const PROFILE_ACCELERATION: &str = "PROFILE_ACCELERATION";
pub const PROFILE_VELOCITY: &str = "PROFILE_VELOCITY";
pub const GOAL_POSITION: &str = "GOAL_POSITION";
pub const REALTIME_TICK: &str = "REALTIME_TICK";
pub const MOVING: &str = "MOVING";
pub const MOVING_STATUS: &str = "MOVING_STATUS";
pub const PRESENT_PWM: &str = "PRESENT_PWM";
pub const PRESENT_LOAD: &str = "PRESENT_LOAD";
pub const PRESENT_CURRENT: &str = "PRESENT_CURRENT";
pub const PRESENT_VELOCITY: &str = "PRESENT_VELOCITY";
pub const PRESENT_POSITION: &str = "PRESENT_POSITION";
pub const VELOCITY_TRAJECTORY: &str = "VELOCITY_TRAJECTORY";
pub const POSITION_TRAJECTORY: &str = "POSITION_TRAJECTORY";
pub const PRESENT_INPUT_VOLTAGE: &str = "PRESENT_INPUT_VOLTAGE";
pub const PRESENT_TEMPERATURE: &str = "PRESENT_TEMPERATURE";
