// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI command implementations.
//!
//! - `scan`: List servos found on the bus
//! - `status`: Read the live state of one servo
//! - `move` / `torque`: Drive servos
//! - `models`: List built-in models

mod models;
mod motion;
mod scan;
mod status;

pub use models::models;
pub use motion::{move_servo, torque};
pub use scan::scan;
pub use status::status;

use std::sync::Arc;

use dynabus::model::{xl430, xm430};
use dynabus::{BusTransport, Controller, ModelRegistry, Servo, SimulatedBus};
use tracing::info;

use crate::cli::{Cli, Commands};
use crate::config;
use crate::error::{BinError, BinResult};

/// Executes the command selected on the command line.
pub async fn execute(cli: Cli) -> BinResult<()> {
    let registry = Arc::new(ModelRegistry::builtin()?);

    if !cli.needs_bus() {
        return models::models(&cli, &registry);
    }

    let config = config::resolve(&cli)?;
    if cli.simulate {
        info!("Using simulated bus");
        let controller = Controller::new(simulated_bus()?, registry, config)?;
        run(&cli, controller).await
    } else {
        let controller = Controller::serial(config, registry)?;
        run(&cli, controller).await
    }
}

async fn run<T: BusTransport>(cli: &Cli, mut controller: Controller<T>) -> BinResult<()> {
    let result = match &cli.command {
        Commands::Scan(args) => scan::scan(cli, &mut controller, args).await,
        Commands::Status(args) => status::status(cli, &mut controller, args).await,
        Commands::Move(args) => motion::move_servo(cli, &mut controller, args).await,
        Commands::Torque(args) => motion::torque(cli, &mut controller, args).await,
        Commands::Models => Ok(()),
    };
    controller.disconnect().await;
    result
}

/// An in-memory bus with an XM430 at id 1 and an XL430 at id 2.
pub fn simulated_bus() -> BinResult<SimulatedBus> {
    Ok(SimulatedBus::new()
        .with_servo(1, &xm430::model()?)
        .with_servo(2, &xl430::model()?))
}

/// Connects probing only `id` and returns its handle.
async fn connect_one<T: BusTransport>(
    controller: &mut Controller<T>,
    id: u8,
) -> BinResult<Servo<T>> {
    controller.connect(Some(&[id])).await?;
    controller
        .servo(id)
        .cloned()
        .ok_or(BinError::ServoNotFound(id))
}
