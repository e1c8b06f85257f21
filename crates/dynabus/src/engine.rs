// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Register access engine.
//!
//! Turns `(register name, engineering value)` into a validated WRITE, and a
//! READ back into an engineering value. Everything that can be rejected
//! locally is rejected before the bus is touched:
//!
//! 1. the handle must have a detected model;
//! 2. the name must exist in that model's control table;
//! 3. writes need a read-write register;
//! 4. the value must be in range, with linked bounds read live from the device;
//! 5. the converted raw value must fit the register width.
//!
//! Bus failures are mapped with [`ServoError::from_comm`] and a nonzero
//! device error byte becomes [`ServoError::Fault`].

use std::sync::Arc;

use dynabus_protocol::{MODEL_NUMBER_ADDRESS, MODEL_NUMBER_LENGTH};
use tracing::debug;

use crate::bus::StatusReply;
use crate::control_table::{ControlTableItem, ValueRange};
use crate::error::{CommFailure, ModelError, RegisterError, ServoError, ServoResult};
use crate::model::{Feature, Model, ModelRegistry};
use crate::servo::Servo;
use crate::transport::BusTransport;

impl<T: BusTransport> Servo<T> {
    // =========================================================================
    // Model binding
    // =========================================================================

    /// Returns the bound model, failing with [`ModelError::NotDetected`].
    pub fn require_model(&self) -> ServoResult<&Arc<Model>> {
        self.model().ok_or_else(|| ServoError::no_model(self.id().get()))
    }

    /// Fails with a capability error unless the bound model has `feature`.
    pub fn require_feature(&self, feature: Feature) -> ServoResult<()> {
        self.require_model()?.require(self.id().get(), feature)?;
        Ok(())
    }

    /// Reads `MODEL_NUMBER` and binds the matching registered model.
    ///
    /// Works on a handle without a model: the model number lives at the same
    /// address on every protocol 2.0 device.
    pub async fn detect_model(&mut self, registry: &ModelRegistry) -> ServoResult<Arc<Model>> {
        let id = self.id().get();
        let reply = self
            .bus()
            .read(id, MODEL_NUMBER_ADDRESS, MODEL_NUMBER_LENGTH)
            .await
            .map_err(|failure| ServoError::from_comm(id, failure))?;
        let data = check(reply)?;
        let model_number = match data.as_slice() {
            [lo, hi] => u16::from_le_bytes([*lo, *hi]),
            _ => {
                return Err(ServoError::from_comm(
                    id,
                    CommFailure::Unexpected(format!("model number of {} bytes", data.len())),
                ))
            }
        };

        let model = registry
            .detect(model_number)
            .ok_or(ModelError::UnknownModel { id, model_number })?;
        debug!(servo_id = id, model = model.name(), model_number, "Model detected");
        self.bind_model(Arc::clone(&model));
        Ok(model)
    }

    // =========================================================================
    // Named access
    // =========================================================================

    /// Writes an engineering value to a named register.
    pub async fn write_register(&self, name: &str, value: f64) -> ServoResult<()> {
        let model = Arc::clone(self.require_model()?);
        let item = model.lookup(name)?;
        if !item.is_writable() {
            return Err(RegisterError::read_only(name).into());
        }

        let range = self.resolve_range(&model, item).await?;
        if !range.contains(value) {
            return Err(RegisterError::out_of_range(name, value, &range).into());
        }

        let raw = item.to_raw(value);
        debug!(servo_id = self.id().get(), register = name, value, raw, "Writing register");
        self.write_item(item, raw).await
    }

    /// Reads a named register in engineering units.
    pub async fn read_register(&self, name: &str) -> ServoResult<f64> {
        let model = Arc::clone(self.require_model()?);
        let item = model.lookup(name)?;
        let raw = self.read_item(item).await?;
        Ok(item.from_raw(raw))
    }

    /// Reads a named register as its raw integer.
    pub async fn read_raw(&self, name: &str) -> ServoResult<i64> {
        let model = Arc::clone(self.require_model()?);
        let item = model.lookup(name)?;
        self.read_item(item).await
    }

    // =========================================================================
    // Item access
    // =========================================================================

    /// Resolves linked bounds against the device; other ranges pass through.
    ///
    /// Bound registers share the raw unit of `item`, so they are converted
    /// with `item`'s conversion.
    async fn resolve_range(&self, model: &Model, item: &ControlTableItem) -> ServoResult<ValueRange> {
        let ValueRange::Linked { min, max } = item.range else {
            return Ok(item.range.clone());
        };
        let max = item.from_raw(self.read_item(model.lookup(max)?).await?);
        let min = match min {
            Some(name) => item.from_raw(self.read_item(model.lookup(name)?).await?),
            None => -max,
        };
        Ok(ValueRange::MinMax { min, max })
    }

    async fn write_item(&self, item: &ControlTableItem, raw: i64) -> ServoResult<()> {
        let id = self.id().get();
        let bytes = item.encode(raw)?;
        let reply = self
            .bus()
            .write(id, item.address, &bytes)
            .await
            .map_err(|failure| ServoError::from_comm(id, failure))?;
        check(reply)
    }

    async fn read_item(&self, item: &ControlTableItem) -> ServoResult<i64> {
        let id = self.id().get();
        let reply = self
            .bus()
            .read(id, item.address, u16::from(item.size.bytes()))
            .await
            .map_err(|failure| ServoError::from_comm(id, failure))?;
        let data = check(reply)?;
        item.decode(&data).ok_or_else(|| {
            ServoError::from_comm(
                id,
                CommFailure::Unexpected(format!("{} returned {} bytes", item.name, data.len())),
            )
        })
    }
}

/// Unwraps a reply, turning a nonzero error byte into a fault.
pub(crate) fn check<V>(reply: StatusReply<V>) -> ServoResult<V> {
    if reply.is_ok() {
        Ok(reply.value)
    } else {
        Err(ServoError::fault(reply.id, reply.errors))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use dynabus_protocol::HardwareErrors;

    use super::*;
    use crate::bus::Bus;
    use crate::control_table::RegisterSize;
    use crate::error::TimeoutError;
    use crate::model::{xl430, xm430};
    use crate::registers as r;
    use crate::transport::SimulatedBus;
    use crate::types::ServoId;

    async fn servo_with(model: Model) -> (SimulatedBus, Servo<SimulatedBus>) {
        let sim = SimulatedBus::new().with_servo(1, &model);
        let bus = Bus::new(sim.clone(), Duration::from_millis(50));
        bus.open().await.unwrap();
        let servo = Servo::new(ServoId::new(1).unwrap(), bus).with_model(Arc::new(model));
        (sim, servo)
    }

    async fn servo() -> (SimulatedBus, Servo<SimulatedBus>) {
        servo_with(xm430::model().unwrap()).await
    }

    #[tokio::test]
    async fn test_write_converts_to_raw() {
        let (sim, servo) = servo().await;
        servo.write_register(r::GOAL_POSITION, 180.0).await.unwrap();
        assert_eq!(sim.peek(1, 116, 4), Some(2048));
        assert_eq!(servo.read_register(r::PRESENT_POSITION).await.unwrap(), 180.0);
        assert_eq!(servo.read_raw(r::PRESENT_POSITION).await.unwrap(), 2048);
    }

    #[tokio::test]
    async fn test_read_only_rejected_without_traffic() {
        let (sim, servo) = servo().await;
        let err = servo.write_register(r::PRESENT_POSITION, 10.0).await.unwrap_err();
        assert!(matches!(err, ServoError::Register(RegisterError::ReadOnly { .. })));
        assert_eq!(sim.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_register() {
        let (sim, servo) = servo().await;
        let err = servo.read_register("NOT_A_REGISTER").await.unwrap_err();
        assert!(matches!(err, ServoError::Register(RegisterError::Unknown { .. })));
        assert_eq!(sim.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_static_range_boundaries() {
        let (sim, servo) = servo().await;
        servo.write_register(r::TEMPERATURE_LIMIT, 0.0).await.unwrap();
        servo.write_register(r::TEMPERATURE_LIMIT, 100.0).await.unwrap();
        let sent = sim.sent_count();
        for value in [-1.0, 101.0, f64::NAN] {
            let err = servo.write_register(r::TEMPERATURE_LIMIT, value).await.unwrap_err();
            assert!(matches!(err, ServoError::Register(RegisterError::OutOfRange { .. })));
        }
        assert_eq!(sim.sent_count(), sent);
    }

    #[tokio::test]
    async fn test_linked_range_read_live() {
        let (sim, servo) = servo().await;
        // Limits 1024..=3072 pulses, i.e. 90..=270 degrees.
        sim.poke(1, 52, RegisterSize::DWord, 1024);
        sim.poke(1, 48, RegisterSize::DWord, 3072);

        servo.write_register(r::GOAL_POSITION, 90.0).await.unwrap();
        servo.write_register(r::GOAL_POSITION, 270.0).await.unwrap();
        let err = servo.write_register(r::GOAL_POSITION, 45.0).await.unwrap_err();
        assert!(matches!(err, ServoError::Register(RegisterError::OutOfRange { .. })));
        assert_eq!(sim.peek(1, 116, 4), Some(3072));
    }

    #[tokio::test]
    async fn test_symmetric_linked_range() {
        let (sim, servo) = servo().await;
        sim.poke(1, 44, RegisterSize::DWord, 100);
        servo.write_register(r::GOAL_VELOCITY, -22.9).await.unwrap();
        assert_eq!(servo.read_raw(r::GOAL_VELOCITY).await.unwrap(), -100);
        assert!(servo.write_register(r::GOAL_VELOCITY, 23.0).await.is_err());
    }

    #[tokio::test]
    async fn test_fault_carries_bits() {
        let (sim, servo) = servo().await;
        sim.set_hardware_error(1, HardwareErrors::OVERHEATING | HardwareErrors::OVERLOAD);
        let err = servo.write_register(r::LED, 1.0).await.unwrap_err();
        let bits = err.fault_bits().unwrap();
        assert!(bits.contains(HardwareErrors::OVERHEATING));
        assert!(bits.contains(HardwareErrors::OVERLOAD));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_response_is_timeout() {
        let (sim, servo) = servo().await;
        sim.set_silent(1, true);
        let err = servo.read_register(r::PRESENT_TEMPERATURE).await.unwrap_err();
        assert!(matches!(err, ServoError::Timeout(TimeoutError::Response { id: 1, .. })));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_corrupt_reply_is_protocol_error() {
        let (sim, servo) = servo().await;
        sim.corrupt_next_response();
        let err = servo.read_register(r::PRESENT_TEMPERATURE).await.unwrap_err();
        assert!(matches!(err, ServoError::Protocol(ref e) if e.is_checksum()));
    }

    #[tokio::test]
    async fn test_send_failure_is_communication_error() {
        let (sim, servo) = servo().await;
        sim.fail_next_send();
        let err = servo.write_register(r::LED, 1.0).await.unwrap_err();
        assert_eq!(err.category(), "communication");
    }

    #[tokio::test]
    async fn test_no_model() {
        let sim = SimulatedBus::new();
        let bus = Bus::new(sim.clone(), Duration::from_millis(50));
        let servo = Servo::new(ServoId::new(3).unwrap(), bus);
        let err = servo.write_register(r::LED, 1.0).await.unwrap_err();
        assert!(matches!(err, ServoError::Model(ModelError::NotDetected { id: 3 })));
        assert_eq!(sim.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_detect_model() {
        let sim = SimulatedBus::new().with_servo(2, &xl430::model().unwrap());
        let bus = Bus::new(sim.clone(), Duration::from_millis(50));
        bus.open().await.unwrap();
        let registry = ModelRegistry::builtin().unwrap();

        let mut servo = Servo::new(ServoId::new(2).unwrap(), bus);
        let model = servo.detect_model(&registry).await.unwrap();
        assert_eq!(model.name(), "XL430-W250");
        assert_eq!(servo.model().unwrap().model_number(), 1060);

        sim.poke(2, 0, RegisterSize::Word, 9999);
        let err = servo.detect_model(&ModelRegistry::builtin().unwrap()).await.unwrap_err();
        assert!(matches!(
            err,
            ServoError::Model(ModelError::UnknownModel { id: 2, model_number: 9999 })
        ));
    }
}
