// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `scan` command.

use dynabus::{BusTransport, Controller};
use serde::Serialize;

use crate::cli::{Cli, OutputFormat, ScanArgs};
use crate::error::BinResult;

/// One discovered servo.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanEntry {
    /// Device id.
    pub id: u8,
    /// Model name.
    pub model: String,
    /// Model number.
    pub model_number: u16,
    /// Firmware version, if the servo answered PING.
    pub firmware_version: Option<u8>,
}

/// Connects, discovers servos and returns what was found.
pub async fn collect<T: BusTransport>(
    controller: &mut Controller<T>,
    args: &ScanArgs,
) -> BinResult<Vec<ScanEntry>> {
    let candidates = (!args.ids.is_empty()).then_some(args.ids.as_slice());
    controller.connect(candidates).await?;

    let mut entries = Vec::new();
    for servo in controller.servos() {
        let Some(model) = servo.model() else {
            continue;
        };
        let firmware_version = servo.ping().await.ok().map(|info| info.firmware_version);
        entries.push(ScanEntry {
            id: servo.id().get(),
            model: model.name().to_string(),
            model_number: model.model_number(),
            firmware_version,
        });
    }
    Ok(entries)
}

/// Executes the `scan` command.
pub async fn scan<T: BusTransport>(
    cli: &Cli,
    controller: &mut Controller<T>,
    args: &ScanArgs,
) -> BinResult<()> {
    let entries = collect(controller, args).await?;

    match cli.format {
        OutputFormat::Text => {
            if entries.is_empty() {
                println!("No servos found");
                return Ok(());
            }
            println!("{:>4}  {:<12} {:>6}  {:>8}", "ID", "MODEL", "NUMBER", "FIRMWARE");
            for entry in &entries {
                let firmware = entry
                    .firmware_version
                    .map_or_else(|| "-".to_string(), |v| v.to_string());
                println!(
                    "{:>4}  {:<12} {:>6}  {:>8}",
                    entry.id, entry.model, entry.model_number, firmware
                );
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
    }
    Ok(())
}
