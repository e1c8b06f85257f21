// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `move` and `torque` commands.

use std::time::Duration;

use dynabus::{BusTransport, Controller};
use tracing::info;

use crate::cli::{Cli, MoveArgs, OutputFormat, TorqueArgs};
use crate::error::{BinError, BinResult};

use super::connect_one;

/// Enables torque on the servo, writes the goal and optionally waits.
///
/// Returns the present position after the move (or right after the write
/// when not waiting).
pub async fn drive<T: BusTransport>(controller: &mut Controller<T>, args: &MoveArgs) -> BinResult<f64> {
    let servo = connect_one(controller, args.id).await?;

    servo.enable_torque().await?;
    servo.set_position(args.degrees).await?;
    info!(servo_id = args.id, degrees = args.degrees, "Goal position written");

    if args.wait {
        let timeout = args
            .timeout
            .map(Duration::from_millis)
            .unwrap_or(controller.config().wait_timeout);
        controller.wait_until_stopped(timeout).await?;
    }

    Ok(servo.position().await?)
}

/// Executes the `move` command.
pub async fn move_servo<T: BusTransport>(
    cli: &Cli,
    controller: &mut Controller<T>,
    args: &MoveArgs,
) -> BinResult<()> {
    let position = drive(controller, args).await?;

    match cli.format {
        OutputFormat::Text => println!(
            "Servo {}: goal {:.2} deg, present {:.2} deg",
            args.id, args.degrees, position
        ),
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({
                "id": args.id,
                "goal": args.degrees,
                "position": position,
            })
        ),
    }
    Ok(())
}

/// Applies a torque switch; returns the ids it was applied to.
pub async fn switch_torque<T: BusTransport>(
    controller: &mut Controller<T>,
    args: &TorqueArgs,
) -> BinResult<Vec<u8>> {
    let enable = args.state.enabled();
    match args.id {
        Some(id) => {
            let servo = connect_one(controller, id).await?;
            servo.set_torque(enable).await?;
            Ok(vec![id])
        }
        None => {
            controller.connect(None).await?;
            if controller.set_all_torque(enable).await {
                Ok(controller.connected_ids())
            } else {
                Err(BinError::runtime(format!(
                    "Torque could not be switched {} on every servo",
                    if enable { "on" } else { "off" }
                )))
            }
        }
    }
}

/// Executes the `torque` command.
pub async fn torque<T: BusTransport>(
    cli: &Cli,
    controller: &mut Controller<T>,
    args: &TorqueArgs,
) -> BinResult<()> {
    let ids = switch_torque(controller, args).await?;
    let enabled = args.state.enabled();

    match cli.format {
        OutputFormat::Text => println!(
            "Torque {} for servos {:?}",
            if enabled { "on" } else { "off" },
            ids
        ),
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "torque_enabled": enabled, "ids": ids })
        ),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::TorqueState;
    use crate::commands::simulated_bus;
    use dynabus::{ControllerConfig, HardwareErrors, ModelRegistry, SimulatedBus};
    use std::sync::Arc;

    fn controller(sim: &SimulatedBus) -> Controller<SimulatedBus> {
        let registry = Arc::new(ModelRegistry::builtin().unwrap());
        Controller::new(sim.clone(), registry, ControllerConfig::default()).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_drive_and_wait() {
        let sim = simulated_bus().unwrap();
        let mut controller = controller(&sim);
        let args = MoveArgs {
            id: 1,
            degrees: 90.0,
            wait: true,
            timeout: Some(500),
        };

        let position = drive(&mut controller, &args).await.unwrap();
        assert!((position - 90.0).abs() < 1e-9);
        assert_eq!(sim.peek(1, 64, 1), Some(1));
        assert_eq!(sim.peek(1, 116, 4), Some(1024));
    }

    #[tokio::test]
    async fn test_drive_rejects_out_of_range_goal() {
        let sim = simulated_bus().unwrap();
        let mut controller = controller(&sim);
        let args = MoveArgs {
            id: 1,
            degrees: 400.0,
            wait: false,
            timeout: None,
        };

        let err = drive(&mut controller, &args).await.unwrap_err();
        assert!(matches!(err, BinError::Servo(dynabus::ServoError::Register(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_torque_all() {
        let sim = simulated_bus().unwrap();
        let mut controller = controller(&sim);
        let args = TorqueArgs {
            state: TorqueState::On,
            id: None,
        };

        let ids = switch_torque(&mut controller, &args).await.unwrap();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(sim.peek(2, 64, 1), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_torque_all_skips_faulted_servo() {
        let sim = simulated_bus().unwrap();
        let mut controller = controller(&sim);
        controller.connect(None).await.unwrap();
        controller.disconnect().await;
        sim.set_hardware_error(2, HardwareErrors::ELECTRICAL_SHOCK);

        // Servo 2 now fails detection, so only servo 1 is switched.
        let args = TorqueArgs {
            state: TorqueState::On,
            id: None,
        };
        let ids = switch_torque(&mut controller, &args).await.unwrap();
        assert_eq!(ids, vec![1]);
    }
}
