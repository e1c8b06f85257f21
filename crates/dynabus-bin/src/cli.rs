// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI argument parsing and command definitions.
//!
//! - `scan`: List servos found on the bus
//! - `status`: Read the live state of one servo
//! - `move`: Move a servo to an angle
//! - `torque`: Switch torque on or off
//! - `models`: List built-in models

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// =============================================================================
// Main CLI Structure
// =============================================================================

/// dynabus - servo bus control
///
/// Discovers, inspects and drives Dynamixel protocol 2.0 servos over a
/// serial adapter.
#[derive(Parser, Debug)]
#[command(
    name = "dynabus",
    author = "Sylvex <contact@sylvex.io>",
    version,
    about = "Control-table driven servo bus tool",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    /// Configuration file path (YAML or TOML)
    #[arg(short, long, env = "DYNABUS_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Serial port (overrides configuration and DYNABUS_PORT)
    #[arg(short, long, global = true)]
    pub port: Option<String>,

    /// Baud rate (overrides configuration and DYNABUS_BAUD_RATE)
    #[arg(short, long, global = true)]
    pub baud_rate: Option<u32>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        short,
        long,
        default_value = "info",
        env = "DYNABUS_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json, compact)
    #[arg(long, default_value = "text", env = "DYNABUS_LOG_FORMAT", global = true)]
    pub log_format: LogFormat,

    /// Output format for command results
    #[arg(short, long, default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Use an in-memory bus instead of a serial port
    #[arg(long, global = true)]
    pub simulate: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

// =============================================================================
// Subcommands
// =============================================================================

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Scan the bus and list discovered servos
    Scan(ScanArgs),

    /// Read position, velocity, temperature, voltage, load, moving and torque
    Status(StatusArgs),

    /// Move a servo to an angle in degrees
    Move(MoveArgs),

    /// Switch torque on or off
    Torque(TorqueArgs),

    /// List built-in models and their features
    Models,
}

// =============================================================================
// Command Arguments
// =============================================================================

/// Arguments for the `scan` command.
#[derive(Args, Debug, Default, Clone)]
pub struct ScanArgs {
    /// Ids to probe (default: configured scan ids)
    #[arg(short, long, value_delimiter = ',')]
    pub ids: Vec<u8>,
}

/// Arguments for the `status` command.
#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    /// Servo id
    pub id: u8,
}

/// Arguments for the `move` command.
#[derive(Args, Debug, Clone)]
pub struct MoveArgs {
    /// Servo id
    pub id: u8,

    /// Goal angle in degrees
    #[arg(allow_negative_numbers = true)]
    pub degrees: f64,

    /// Wait until the servo stops moving
    #[arg(short, long)]
    pub wait: bool,

    /// Wait deadline in milliseconds (default: configured wait timeout)
    #[arg(short, long, value_name = "MS", requires = "wait")]
    pub timeout: Option<u64>,
}

/// Arguments for the `torque` command.
#[derive(Args, Debug, Clone)]
pub struct TorqueArgs {
    /// Desired state
    pub state: TorqueState,

    /// Servo id (default: every discovered servo)
    #[arg(short, long)]
    pub id: Option<u8>,
}

// =============================================================================
// Enums
// =============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for structured logging
    Json,
    /// Compact format for minimal output
    Compact,
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for programmatic parsing
    Json,
}

/// Torque switch position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TorqueState {
    /// Torque enabled
    On,
    /// Torque disabled
    Off,
}

impl TorqueState {
    /// Returns `true` for [`TorqueState::On`].
    pub fn enabled(self) -> bool {
        self == Self::On
    }
}

impl Cli {
    /// Parse CLI arguments from the command line.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns `true` if the command needs a bus.
    pub fn needs_bus(&self) -> bool {
        !matches!(self.command, Commands::Models)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_command() {
        let cli = Cli::parse_from(["dynabus", "scan", "--ids", "1,2,3"]);
        match &cli.command {
            Commands::Scan(args) => assert_eq!(args.ids, vec![1, 2, 3]),
            other => panic!("Expected Scan command, got {other:?}"),
        }
        assert!(cli.needs_bus());
    }

    #[test]
    fn test_scan_default_ids() {
        let cli = Cli::parse_from(["dynabus", "scan"]);
        assert!(matches!(cli.command, Commands::Scan(ref args) if args.ids.is_empty()));
    }

    #[test]
    fn test_move_command() {
        let cli = Cli::parse_from(["dynabus", "move", "2", "-45.5", "--wait", "--timeout", "800"]);
        if let Commands::Move(args) = cli.command {
            assert_eq!(args.id, 2);
            assert_eq!(args.degrees, -45.5);
            assert!(args.wait);
            assert_eq!(args.timeout, Some(800));
        } else {
            panic!("Expected Move command");
        }
    }

    #[test]
    fn test_timeout_requires_wait() {
        assert!(Cli::try_parse_from(["dynabus", "move", "1", "90", "--timeout", "100"]).is_err());
    }

    #[test]
    fn test_torque_command() {
        let cli = Cli::parse_from(["dynabus", "torque", "off", "--id", "3"]);
        if let Commands::Torque(args) = cli.command {
            assert!(!args.state.enabled());
            assert_eq!(args.id, Some(3));
        } else {
            panic!("Expected Torque command");
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from([
            "dynabus",
            "status",
            "1",
            "--port",
            "/dev/ttyUSB1",
            "--baud-rate",
            "1000000",
            "--simulate",
            "--format",
            "json",
        ]);
        assert_eq!(cli.port.as_deref(), Some("/dev/ttyUSB1"));
        assert_eq!(cli.baud_rate, Some(1_000_000));
        assert!(cli.simulate);
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn test_models_needs_no_bus() {
        let cli = Cli::parse_from(["dynabus", "models"]);
        assert!(!cli.needs_bus());
    }
}
