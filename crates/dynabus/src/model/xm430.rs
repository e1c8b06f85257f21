// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! XM430-W210: position, velocity, current and PWM control with current sensing.

use crate::control_table::{ControlTableItem, Conversion, RegisterSize, ValueRange};
use crate::error::ConfigurationError;
use crate::model::x_series::{self, SeriesDefaults, DEGREES, RPM};
use crate::model::{Feature, Model};
use crate::registers as r;

/// Model name.
pub const NAME: &str = "XM430-W210";

/// Value of the `MODEL_NUMBER` register.
pub const MODEL_NUMBER: u16 = 1030;

/// Milliamps per current unit.
pub const CURRENT_STEP: f64 = 2.69;

const MILLIAMPS: Conversion = Conversion::Linear {
    step: CURRENT_STEP,
    unit: "mA",
};

const DEFAULTS: SeriesDefaults = SeriesDefaults {
    model_number: MODEL_NUMBER,
    temperature_limit: 80,
    voltage_range: (9.5, 16.0),
    max_voltage_limit: 160,
    min_voltage_limit: 95,
    velocity_i_gain: 1920,
    velocity_p_gain: 100,
    position_p_gain: 800,
};

/// Builds the XM430-W210 model.
pub fn model() -> Result<Model, ConfigurationError> {
    Model::builder(NAME, MODEL_NUMBER)
        .features([
            Feature::PositionControl,
            Feature::VelocityControl,
            Feature::CurrentControl,
            Feature::ExtendedPosition,
            Feature::CurrentBasedPosition,
            Feature::PwmControl,
        ])
        .position_conversion(DEGREES)
        .velocity_conversion(RPM)
        .items(x_series::common_items(&DEFAULTS))
        .items([
            ControlTableItem::read_write(r::CURRENT_LIMIT, 38, RegisterSize::Word)
                .with_conversion(MILLIAMPS)
                .with_range(ValueRange::MinMax {
                    min: 0.0,
                    max: 1193.0 * CURRENT_STEP,
                })
                .with_default(1193),
            ControlTableItem::read_write(r::GOAL_CURRENT, 102, RegisterSize::Word)
                .signed()
                .with_conversion(MILLIAMPS)
                .with_range(ValueRange::Linked {
                    min: None,
                    max: r::CURRENT_LIMIT,
                }),
            ControlTableItem::read_only(r::PRESENT_CURRENT, 126, RegisterSize::Word)
                .signed()
                .with_conversion(MILLIAMPS),
        ])
        .build()
}
