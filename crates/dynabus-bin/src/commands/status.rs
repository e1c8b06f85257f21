// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `status` command.

use dynabus::{BusTransport, Controller, Servo, ServoResult};
use serde::Serialize;

use crate::cli::{Cli, OutputFormat, StatusArgs};
use crate::error::BinResult;

use super::connect_one;

/// Live state of one servo.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServoStatus {
    /// Device id.
    pub id: u8,
    /// Model name.
    pub model: String,
    /// Present position in degrees.
    pub position: f64,
    /// Present velocity in rpm.
    pub velocity: f64,
    /// Temperature in degrees Celsius.
    pub temperature: f64,
    /// Input voltage in volts.
    pub voltage: f64,
    /// Load in percent of maximum torque.
    pub load: f64,
    /// Whether the servo is moving.
    pub moving: bool,
    /// Whether torque is enabled.
    pub torque_enabled: bool,
}

/// Reads every status field of `servo`.
pub async fn read_status<T: BusTransport>(servo: &Servo<T>) -> ServoResult<ServoStatus> {
    let model = servo.require_model()?.name().to_string();
    Ok(ServoStatus {
        id: servo.id().get(),
        model,
        position: servo.position().await?,
        velocity: servo.velocity().await?,
        temperature: servo.temperature().await?,
        voltage: servo.voltage().await?,
        load: servo.load().await?,
        moving: servo.is_moving().await?,
        torque_enabled: servo.torque_enabled().await?,
    })
}

/// Executes the `status` command.
pub async fn status<T: BusTransport>(
    cli: &Cli,
    controller: &mut Controller<T>,
    args: &StatusArgs,
) -> BinResult<()> {
    let servo = connect_one(controller, args.id).await?;
    let status = read_status(&servo).await?;

    match cli.format {
        OutputFormat::Text => {
            println!("Servo {} ({})", status.id, status.model);
            println!("  Position:    {:.2} deg", status.position);
            println!("  Velocity:    {:.2} rpm", status.velocity);
            println!("  Temperature: {:.0} C", status.temperature);
            println!("  Voltage:     {:.1} V", status.voltage);
            println!("  Load:        {:.1} %", status.load);
            println!("  Moving:      {}", if status.moving { "yes" } else { "no" });
            println!("  Torque:      {}", if status.torque_enabled { "on" } else { "off" });
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
    }
    Ok(())
}
