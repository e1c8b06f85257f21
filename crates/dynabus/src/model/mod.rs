// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Hardware models and their capabilities.
//!
//! A [`Model`] is plain data: a control table, a feature set and the
//! position/velocity conversions of one hardware family. Models are built
//! once, wrapped in `Arc` and shared by every servo of that family.
//!
//! Operating modes and features are closed enums; the mapping from a mode to
//! the feature it needs is an exhaustive `match`, so adding a mode without
//! deciding its feature does not compile.

mod registry;
mod x_series;
pub mod xl430;
pub mod xm430;

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

pub use registry::ModelRegistry;

use crate::control_table::{ControlTable, ControlTableItem, Conversion, RegisterSize};
use crate::error::{CapabilityError, ConfigurationError, RegisterError};
use crate::registers;

// =============================================================================
// Feature
// =============================================================================

/// A capability a model may or may not have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Single-turn position control.
    PositionControl,
    /// Velocity control.
    VelocityControl,
    /// Current (torque) control and current sensing.
    CurrentControl,
    /// Multi-turn position control.
    ExtendedPosition,
    /// Position control with a current ceiling.
    CurrentBasedPosition,
    /// Direct PWM control.
    PwmControl,
}

impl Feature {
    /// Every feature.
    pub const ALL: [Feature; 6] = [
        Self::PositionControl,
        Self::VelocityControl,
        Self::CurrentControl,
        Self::ExtendedPosition,
        Self::CurrentBasedPosition,
        Self::PwmControl,
    ];

    /// Snake-case name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PositionControl => "position_control",
            Self::VelocityControl => "velocity_control",
            Self::CurrentControl => "current_control",
            Self::ExtendedPosition => "extended_position",
            Self::CurrentBasedPosition => "current_based_position",
            Self::PwmControl => "pwm_control",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of features supported by a model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSet(BTreeSet<Feature>);

impl FeatureSet {
    /// Returns `true` if `feature` is in the set.
    #[inline]
    pub fn contains(&self, feature: Feature) -> bool {
        self.0.contains(&feature)
    }

    /// Adds a feature.
    pub fn insert(&mut self, feature: Feature) -> bool {
        self.0.insert(feature)
    }

    /// Iterates in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = Feature> + '_ {
        self.0.iter().copied()
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no feature is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Feature> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// =============================================================================
// OperatingMode
// =============================================================================

/// Values of the `OPERATING_MODE` register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatingMode {
    /// Current control (0).
    Current,
    /// Velocity control (1).
    Velocity,
    /// Position control (3).
    Position,
    /// Multi-turn position control (4).
    ExtendedPosition,
    /// Current-limited position control (5).
    CurrentBasedPosition,
    /// PWM control (16).
    Pwm,
}

impl OperatingMode {
    /// Every mode.
    pub const ALL: [OperatingMode; 6] = [
        Self::Current,
        Self::Velocity,
        Self::Position,
        Self::ExtendedPosition,
        Self::CurrentBasedPosition,
        Self::Pwm,
    ];

    /// Register value.
    pub const fn value(self) -> u8 {
        match self {
            Self::Current => 0,
            Self::Velocity => 1,
            Self::Position => 3,
            Self::ExtendedPosition => 4,
            Self::CurrentBasedPosition => 5,
            Self::Pwm => 16,
        }
    }

    /// Feature a model must have to enter this mode.
    pub const fn required_feature(self) -> Feature {
        match self {
            Self::Current => Feature::CurrentControl,
            Self::Velocity => Feature::VelocityControl,
            Self::Position => Feature::PositionControl,
            Self::ExtendedPosition => Feature::ExtendedPosition,
            Self::CurrentBasedPosition => Feature::CurrentBasedPosition,
            Self::Pwm => Feature::PwmControl,
        }
    }

    /// Parses a register value.
    pub fn from_value(value: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.value() == value)
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Current => "current",
            Self::Velocity => "velocity",
            Self::Position => "position",
            Self::ExtendedPosition => "extended_position",
            Self::CurrentBasedPosition => "current_based_position",
            Self::Pwm => "pwm",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Model
// =============================================================================

/// Immutable description of one hardware family.
#[derive(Debug, Clone)]
pub struct Model {
    name: &'static str,
    model_number: u16,
    protocol_version: f32,
    control_table: ControlTable,
    features: FeatureSet,
    position: Conversion,
    velocity: Conversion,
}

impl Model {
    /// Starts building a model.
    pub fn builder(name: &'static str, model_number: u16) -> ModelBuilder {
        ModelBuilder::new(name, model_number)
    }

    /// Model name, e.g. `XM430-W210`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Value of the `MODEL_NUMBER` register.
    pub fn model_number(&self) -> u16 {
        self.model_number
    }

    /// Protocol version spoken by the model.
    pub fn protocol_version(&self) -> f32 {
        self.protocol_version
    }

    /// The register schema.
    pub fn control_table(&self) -> &ControlTable {
        &self.control_table
    }

    /// Supported features.
    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    /// Returns `true` if the model has `feature`.
    #[inline]
    pub fn supports(&self, feature: Feature) -> bool {
        self.features.contains(feature)
    }

    /// Fails with [`CapabilityError`] unless the model has `feature`.
    pub fn require(&self, id: u8, feature: Feature) -> Result<(), CapabilityError> {
        if self.supports(feature) {
            Ok(())
        } else {
            Err(CapabilityError {
                id,
                model: self.name,
                feature,
            })
        }
    }

    /// Resolves a register name.
    pub fn lookup(&self, name: &str) -> Result<&ControlTableItem, RegisterError> {
        self.control_table.lookup(name)
    }

    /// Raw position to degrees.
    pub fn position_to_degrees(&self, raw: i64) -> f64 {
        self.position.from_raw(raw)
    }

    /// Degrees to raw position, rounded to the nearest pulse.
    pub fn degrees_to_position(&self, degrees: f64) -> i64 {
        self.position.to_raw(degrees)
    }

    /// Raw velocity to rpm.
    pub fn velocity_to_rpm(&self, raw: i64) -> f64 {
        self.velocity.from_raw(raw)
    }

    /// Rpm to raw velocity, rounded to the nearest unit.
    pub fn rpm_to_velocity(&self, rpm: f64) -> i64 {
        self.velocity.to_raw(rpm)
    }

    /// Serialisable summary.
    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            name: self.name.to_string(),
            model_number: self.model_number,
            protocol_version: self.protocol_version,
            features: self.features.iter().collect(),
        }
    }
}

/// Summary of a model for display and serialisation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model name.
    pub name: String,
    /// Model number.
    pub model_number: u16,
    /// Protocol version.
    pub protocol_version: f32,
    /// Supported features.
    pub features: Vec<Feature>,
}

// =============================================================================
// ModelBuilder
// =============================================================================

/// Builder for [`Model`].
#[derive(Debug, Clone)]
pub struct ModelBuilder {
    name: &'static str,
    model_number: u16,
    protocol_version: f32,
    features: FeatureSet,
    position: Conversion,
    velocity: Conversion,
    items: Vec<ControlTableItem>,
}

impl ModelBuilder {
    fn new(name: &'static str, model_number: u16) -> Self {
        Self {
            name,
            model_number,
            protocol_version: dynabus_protocol::PROTOCOL_VERSION,
            features: FeatureSet::default(),
            position: Conversion::Identity,
            velocity: Conversion::Identity,
            items: Vec::new(),
        }
    }

    /// Sets the protocol version.
    pub fn protocol_version(mut self, version: f32) -> Self {
        self.protocol_version = version;
        self
    }

    /// Adds features.
    pub fn features(mut self, features: impl IntoIterator<Item = Feature>) -> Self {
        for feature in features {
            self.features.insert(feature);
        }
        self
    }

    /// Sets the position conversion (raw pulses to degrees).
    pub fn position_conversion(mut self, conversion: Conversion) -> Self {
        self.position = conversion;
        self
    }

    /// Sets the velocity conversion (raw units to rpm).
    pub fn velocity_conversion(mut self, conversion: Conversion) -> Self {
        self.velocity = conversion;
        self
    }

    /// Adds registers.
    pub fn items(mut self, items: impl IntoIterator<Item = ControlTableItem>) -> Self {
        self.items.extend(items);
        self
    }

    /// Builds the model.
    ///
    /// Fails on duplicate register names, or if `MODEL_NUMBER` is not the
    /// 2-byte register at address 0 that detection relies on.
    pub fn build(self) -> Result<Model, ConfigurationError> {
        let control_table = ControlTable::from_items(self.name, self.items)?;
        let model_number_ok = control_table
            .get(registers::MODEL_NUMBER)
            .map(|item| {
                item.address == dynabus_protocol::MODEL_NUMBER_ADDRESS && item.size == RegisterSize::Word
            })
            .unwrap_or(false);
        if !model_number_ok {
            return Err(ConfigurationError::invalid_value(
                registers::MODEL_NUMBER,
                format!("model {} must define a 2-byte MODEL_NUMBER at address 0", self.name),
            ));
        }
        Ok(Model {
            name: self.name,
            model_number: self.model_number,
            protocol_version: self.protocol_version,
            control_table,
            features: self.features,
            position: self.position,
            velocity: self.velocity,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal(name: &'static str, number: u16) -> ModelBuilder {
        Model::builder(name, number).items([ControlTableItem::read_only(
            registers::MODEL_NUMBER,
            0,
            RegisterSize::Word,
        )])
    }

    #[test]
    fn test_mode_feature_mapping() {
        assert_eq!(OperatingMode::Current.required_feature(), Feature::CurrentControl);
        assert_eq!(OperatingMode::Pwm.required_feature(), Feature::PwmControl);
        assert_eq!(
            OperatingMode::CurrentBasedPosition.required_feature(),
            Feature::CurrentBasedPosition
        );
        for mode in OperatingMode::ALL {
            assert_eq!(OperatingMode::from_value(mode.value()), Some(mode));
        }
        assert_eq!(OperatingMode::from_value(2), None);
    }

    #[test]
    fn test_require_feature() {
        let model = minimal("TEST", 1)
            .features([Feature::PositionControl])
            .build()
            .unwrap();
        assert!(model.require(3, Feature::PositionControl).is_ok());
        let err = model.require(3, Feature::CurrentControl).unwrap_err();
        assert_eq!(err.feature, Feature::CurrentControl);
        assert_eq!(err.to_string(), "Model TEST (servo 3) does not support current_control");
    }

    #[test]
    fn test_build_requires_model_number() {
        let err = Model::builder("BROKEN", 2).build().unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidValue { .. }));

        let misplaced = Model::builder("BROKEN", 2)
            .items([ControlTableItem::read_only(registers::MODEL_NUMBER, 4, RegisterSize::Word)])
            .build();
        assert!(misplaced.is_err());
    }

    #[test]
    fn test_lookup_unknown() {
        let model = minimal("TEST", 1).build().unwrap();
        assert!(model.lookup(registers::MODEL_NUMBER).is_ok());
        assert_eq!(
            model.lookup("NOPE").unwrap_err(),
            RegisterError::unknown("NOPE", "TEST")
        );
    }

    #[test]
    fn test_feature_serde() {
        let json = serde_json::to_string(&Feature::CurrentBasedPosition).unwrap();
        assert_eq!(json, "\"current_based_position\"");
        let set: FeatureSet = [Feature::PwmControl, Feature::PositionControl].into_iter().collect();
        assert_eq!(
            serde_json::to_string(&set).unwrap(),
            "[\"position_control\",\"pwm_control\"]"
        );
    }
}
