// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Control table layout shared by the X-series families.

use crate::control_table::{ControlTableItem, Conversion, RegisterSize, ValueRange};
use crate::registers as r;

use RegisterSize::{Byte, DWord, Word};

/// Degrees per position pulse (4096 pulses per revolution).
pub(crate) const POSITION_STEP: f64 = 360.0 / 4096.0;
/// Rpm per velocity unit.
pub(crate) const VELOCITY_STEP: f64 = 0.229;
/// Rev/min² per profile acceleration unit.
pub(crate) const ACCELERATION_STEP: f64 = 214.577;
/// Percent per PWM unit (885 = 100 %).
pub(crate) const PWM_STEP: f64 = 100.0 / 885.0;
/// Volts per voltage unit.
pub(crate) const VOLTAGE_STEP: f64 = 0.1;
/// Percent per load unit.
pub(crate) const LOAD_STEP: f64 = 0.1;

pub(crate) const DEGREES: Conversion = Conversion::Linear {
    step: POSITION_STEP,
    unit: "deg",
};
pub(crate) const RPM: Conversion = Conversion::Linear {
    step: VELOCITY_STEP,
    unit: "rpm",
};
const PWM_PERCENT: Conversion = Conversion::Linear {
    step: PWM_STEP,
    unit: "%",
};
const VOLTS: Conversion = Conversion::Linear {
    step: VOLTAGE_STEP,
    unit: "V",
};
const CELSIUS: Conversion = Conversion::Linear {
    step: 1.0,
    unit: "°C",
};

const OPERATING_MODES: &[f64] = &[0.0, 1.0, 3.0, 4.0, 5.0, 16.0];
const MAX_GAIN: f64 = 16383.0;

/// Values that differ between families sharing this layout.
pub(crate) struct SeriesDefaults {
    pub model_number: u16,
    pub temperature_limit: i64,
    pub voltage_range: (f64, f64),
    pub max_voltage_limit: i64,
    pub min_voltage_limit: i64,
    pub velocity_i_gain: i64,
    pub velocity_p_gain: i64,
    pub position_p_gain: i64,
}

fn range(min: f64, max: f64) -> ValueRange {
    ValueRange::MinMax { min, max }
}

fn gain(name: &'static str, address: u16, default: i64) -> ControlTableItem {
    ControlTableItem::read_write(name, address, Word)
        .with_range(range(0.0, MAX_GAIN))
        .with_default(default)
}

/// Registers present on every X-series family.
pub(crate) fn common_items(defaults: &SeriesDefaults) -> Vec<ControlTableItem> {
    let (min_volts, max_volts) = defaults.voltage_range;
    vec![
        // EEPROM area
        ControlTableItem::read_only(r::MODEL_NUMBER, 0, Word)
            .with_range(ValueRange::Exact(f64::from(defaults.model_number)))
            .with_default(i64::from(defaults.model_number))
            .with_description("Model number"),
        ControlTableItem::read_only(r::MODEL_INFORMATION, 2, DWord),
        ControlTableItem::read_only(r::FIRMWARE_VERSION, 6, Byte).with_default(45),
        ControlTableItem::read_write(r::ID, 7, Byte)
            .with_range(range(0.0, 252.0))
            .with_default(1),
        ControlTableItem::read_write(r::BAUD_RATE, 8, Byte)
            .with_range(range(0.0, 7.0))
            .with_default(1)
            .with_description("Baud rate code"),
        ControlTableItem::read_write(r::RETURN_DELAY_TIME, 9, Byte)
            .with_range(range(0.0, 254.0))
            .with_default(250)
            .with_description("Status return delay in 2 µs units"),
        ControlTableItem::read_write(r::DRIVE_MODE, 10, Byte)
            .with_range(range(0.0, 5.0))
            .with_default(0),
        ControlTableItem::read_write(r::OPERATING_MODE, 11, Byte)
            .with_range(ValueRange::OneOf(OPERATING_MODES))
            .with_default(3),
        ControlTableItem::read_write(r::SECONDARY_ID, 12, Byte).with_range(range(0.0, 252.0)),
        ControlTableItem::read_write(r::PROTOCOL_VERSION, 13, Byte)
            .with_range(range(1.0, 2.0))
            .with_default(2),
        ControlTableItem::read_write(r::HOMING_OFFSET, 20, DWord)
            .signed()
            .with_conversion(DEGREES)
            .with_range(range(-1_044_479.0 * POSITION_STEP, 1_044_479.0 * POSITION_STEP))
            .with_default(0),
        ControlTableItem::read_write(r::MOVING_THRESHOLD, 24, DWord)
            .with_conversion(RPM)
            .with_range(range(0.0, 1023.0 * VELOCITY_STEP))
            .with_default(10),
        ControlTableItem::read_write(r::TEMPERATURE_LIMIT, 31, Byte)
            .with_conversion(CELSIUS)
            .with_range(range(0.0, 100.0))
            .with_default(defaults.temperature_limit),
        ControlTableItem::read_write(r::MAX_VOLTAGE_LIMIT, 32, Word)
            .with_conversion(VOLTS)
            .with_range(range(min_volts, max_volts))
            .with_default(defaults.max_voltage_limit),
        ControlTableItem::read_write(r::MIN_VOLTAGE_LIMIT, 34, Word)
            .with_conversion(VOLTS)
            .with_range(range(min_volts, max_volts))
            .with_default(defaults.min_voltage_limit),
        ControlTableItem::read_write(r::PWM_LIMIT, 36, Word)
            .with_conversion(PWM_PERCENT)
            .with_range(range(0.0, 885.0 * PWM_STEP))
            .with_default(885),
        ControlTableItem::read_write(r::VELOCITY_LIMIT, 44, DWord)
            .with_conversion(RPM)
            .with_range(range(0.0, 1023.0 * VELOCITY_STEP))
            .with_default(1023),
        ControlTableItem::read_write(r::MAX_POSITION_LIMIT, 48, DWord)
            .with_conversion(DEGREES)
            .with_range(range(0.0, 4095.0 * POSITION_STEP))
            .with_default(4095),
        ControlTableItem::read_write(r::MIN_POSITION_LIMIT, 52, DWord)
            .with_conversion(DEGREES)
            .with_range(range(0.0, 4095.0 * POSITION_STEP))
            .with_default(0),
        ControlTableItem::read_write(r::SHUTDOWN, 63, Byte)
            .with_range(range(0.0, 127.0))
            .with_default(52),
        // RAM area
        ControlTableItem::read_write(r::TORQUE_ENABLE, 64, Byte)
            .with_range(range(0.0, 1.0))
            .with_default(0),
        ControlTableItem::read_write(r::LED, 65, Byte)
            .with_range(range(0.0, 1.0))
            .with_default(0),
        ControlTableItem::read_write(r::STATUS_RETURN_LEVEL, 68, Byte)
            .with_range(range(0.0, 2.0))
            .with_default(2),
        ControlTableItem::read_only(r::REGISTERED_INSTRUCTION, 69, Byte).with_default(0),
        ControlTableItem::read_only(r::HARDWARE_ERROR_STATUS, 70, Byte).with_default(0),
        gain(r::VELOCITY_I_GAIN, 76, defaults.velocity_i_gain),
        gain(r::VELOCITY_P_GAIN, 78, defaults.velocity_p_gain),
        gain(r::POSITION_D_GAIN, 80, 0),
        gain(r::POSITION_I_GAIN, 82, 0),
        gain(r::POSITION_P_GAIN, 84, defaults.position_p_gain),
        gain(r::FEEDFORWARD_2ND_GAIN, 88, 0),
        gain(r::FEEDFORWARD_1ST_GAIN, 90, 0),
        ControlTableItem::read_write(r::BUS_WATCHDOG, 98, Byte)
            .with_range(range(1.0, 127.0))
            .with_description("Watchdog period in 20 ms units"),
        ControlTableItem::read_write(r::GOAL_PWM, 100, Word)
            .signed()
            .with_conversion(PWM_PERCENT)
            .with_range(ValueRange::Linked {
                min: None,
                max: r::PWM_LIMIT,
            }),
        ControlTableItem::read_write(r::GOAL_VELOCITY, 104, DWord)
            .signed()
            .with_conversion(RPM)
            .with_range(ValueRange::Linked {
                min: None,
                max: r::VELOCITY_LIMIT,
            }),
        ControlTableItem::read_write(r::PROFILE_ACCELERATION, 108, DWord)
            .with_conversion(Conversion::Linear {
                step: ACCELERATION_STEP,
                unit: "rev/min²",
            })
            .with_range(range(0.0, 32767.0 * ACCELERATION_STEP))
            .with_default(0),
        ControlTableItem::read_write(r::PROFILE_VELOCITY, 112, DWord)
            .with_conversion(RPM)
            .with_range(range(0.0, 32767.0 * VELOCITY_STEP))
            .with_default(0),
        ControlTableItem::read_write(r::GOAL_POSITION, 116, DWord)
            .signed()
            .with_conversion(DEGREES)
            .with_range(ValueRange::Linked {
                min: Some(r::MIN_POSITION_LIMIT),
                max: r::MAX_POSITION_LIMIT,
            })
            .with_description("Target position"),
        ControlTableItem::read_only(r::REALTIME_TICK, 120, Word).with_conversion(Conversion::Linear {
            step: 1.0,
            unit: "ms",
        }),
        ControlTableItem::read_only(r::MOVING, 122, Byte).with_default(0),
        ControlTableItem::read_only(r::MOVING_STATUS, 123, Byte).with_default(0),
        ControlTableItem::read_only(r::PRESENT_PWM, 124, Word)
            .signed()
            .with_conversion(PWM_PERCENT),
        ControlTableItem::read_only(r::PRESENT_LOAD, 126, Word)
            .signed()
            .with_conversion(Conversion::Linear {
                step: LOAD_STEP,
                unit: "%",
            }),
        ControlTableItem::read_only(r::PRESENT_VELOCITY, 128, DWord)
            .signed()
            .with_conversion(RPM),
        ControlTableItem::read_only(r::PRESENT_POSITION, 132, DWord)
            .signed()
            .with_conversion(DEGREES)
            .with_default(2048),
        ControlTableItem::read_only(r::VELOCITY_TRAJECTORY, 136, DWord)
            .signed()
            .with_conversion(RPM),
        ControlTableItem::read_only(r::POSITION_TRAJECTORY, 140, DWord)
            .signed()
            .with_conversion(DEGREES),
        ControlTableItem::read_only(r::PRESENT_INPUT_VOLTAGE, 144, Word)
            .with_conversion(VOLTS)
            .with_default(120),
        ControlTableItem::read_only(r::PRESENT_TEMPERATURE, 146, Byte)
            .with_conversion(CELSIUS)
            .with_default(30),
    ]
}
