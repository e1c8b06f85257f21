// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! XL430-W250: the X-series layout without current sensing.

use crate::error::ConfigurationError;
use crate::model::x_series::{self, SeriesDefaults, DEGREES, RPM};
use crate::model::{Feature, Model};

/// Model name.
pub const NAME: &str = "XL430-W250";

/// Value of the `MODEL_NUMBER` register.
pub const MODEL_NUMBER: u16 = 1060;

const DEFAULTS: SeriesDefaults = SeriesDefaults {
    model_number: MODEL_NUMBER,
    temperature_limit: 72,
    voltage_range: (6.0, 14.0),
    max_voltage_limit: 140,
    min_voltage_limit: 60,
    velocity_i_gain: 1000,
    velocity_p_gain: 100,
    position_p_gain: 640,
};

/// Builds the XL430-W250 model.
pub fn model() -> Result<Model, ConfigurationError> {
    Model::builder(NAME, MODEL_NUMBER)
        .features([
            Feature::PositionControl,
            Feature::VelocityControl,
            Feature::ExtendedPosition,
            Feature::PwmControl,
        ])
        .position_conversion(DEGREES)
        .velocity_conversion(RPM)
        .items(x_series::common_items(&DEFAULTS))
        .build()
}
