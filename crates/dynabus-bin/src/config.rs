// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration loading.
//!
//! Precedence, lowest first: built-in defaults, the configuration file,
//! `DYNABUS_*` environment variables, command-line flags.

use std::fs;
use std::path::Path;

use dynabus::{BaudRate, ControllerConfig};
use tracing::{debug, info};

use crate::cli::Cli;
use crate::error::{BinError, BinResult};

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "DYNABUS";

// =============================================================================
// ConfigFormat
// =============================================================================

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML format.
    Yaml,
    /// TOML format.
    Toml,
}

impl ConfigFormat {
    /// Determines the format from a file extension.
    pub fn from_path(path: &Path) -> BinResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("toml") => Ok(ConfigFormat::Toml),
            Some(other) => Err(BinError::config(format!(
                "Unsupported configuration format: .{other}"
            ))),
            None => Err(BinError::config(format!(
                "Cannot determine format of {} (no extension)",
                path.display()
            ))),
        }
    }
}

// =============================================================================
// Loading
// =============================================================================

/// Parses configuration text.
pub fn parse_config(content: &str, format: ConfigFormat) -> BinResult<ControllerConfig> {
    match format {
        ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| BinError::config(e.to_string())),
        ConfigFormat::Toml => toml::from_str(content).map_err(|e| BinError::config(e.to_string())),
    }
}

/// Reads and parses a configuration file.
pub fn load_file(path: &Path) -> BinResult<ControllerConfig> {
    if !path.exists() {
        return Err(BinError::config(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }
    let format = ConfigFormat::from_path(path)?;
    let content = fs::read_to_string(path)?;
    info!(path = %path.display(), "Loading configuration");
    parse_config(&content, format).map_err(|e| e.with_context(path.display().to_string()))
}

/// Applies `DYNABUS_PORT`, `DYNABUS_BAUD_RATE` and `DYNABUS_SCAN_IDS`.
///
/// `lookup` resolves a variable name to its value.
pub fn apply_env_overrides<F>(config: &mut ControllerConfig, lookup: F) -> BinResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = lookup(&format!("{ENV_PREFIX}_PORT")) {
        debug!(port = %port, "Port overridden from environment");
        config.port = Some(port);
    }

    if let Some(value) = lookup(&format!("{ENV_PREFIX}_BAUD_RATE")) {
        config.baud_rate = value.parse::<BaudRate>().map_err(|e| {
            BinError::config(format!("{ENV_PREFIX}_BAUD_RATE: {e}"))
        })?;
    }

    if let Some(value) = lookup(&format!("{ENV_PREFIX}_SCAN_IDS")) {
        config.scan_ids = parse_id_list(&value).map_err(|e| {
            BinError::config(format!("{ENV_PREFIX}_SCAN_IDS: {e}"))
        })?;
    }

    Ok(())
}

/// Parses `1,2,3` or a range `1-4`, or a mix of both.
pub fn parse_id_list(value: &str) -> Result<Vec<u8>, String> {
    let mut ids = Vec::new();
    for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((start, end)) => {
                let start: u8 = start.trim().parse().map_err(|_| format!("'{part}' is not an id range"))?;
                let end: u8 = end.trim().parse().map_err(|_| format!("'{part}' is not an id range"))?;
                if start > end {
                    return Err(format!("'{part}' is an empty range"));
                }
                ids.extend(start..=end);
            }
            None => ids.push(part.parse().map_err(|_| format!("'{part}' is not an id"))?),
        }
    }
    Ok(ids)
}

/// Builds the effective configuration for a CLI invocation.
pub fn resolve(cli: &Cli) -> BinResult<ControllerConfig> {
    let mut config = match &cli.config {
        Some(path) => load_file(path)?,
        None => ControllerConfig::default(),
    };

    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;

    if let Some(port) = &cli.port {
        config.port = Some(port.clone());
    }
    if let Some(bps) = cli.baud_rate {
        config.baud_rate = BaudRate::try_from(bps)?;
    }

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ConfigFormat::from_path(Path::new("bus.yaml")).unwrap(), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("bus.YML")).unwrap(), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("bus.toml")).unwrap(), ConfigFormat::Toml);
        assert!(ConfigFormat::from_path(Path::new("bus.json")).is_err());
        assert!(ConfigFormat::from_path(Path::new("bus")).is_err());
    }

    #[test]
    fn test_load_yaml() {
        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        writeln!(
            file,
            "port: /dev/ttyUSB0\nbaud_rate: 1000000\nscan_ids: [1, 2]\nresponse_timeout: 20ms\nwait_timeout: 3s"
        )
        .unwrap();

        let config = load_file(file.path()).unwrap();
        assert_eq!(config.port.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(config.baud_rate, BaudRate::B1M);
        assert_eq!(config.scan_ids, vec![1, 2]);
        assert_eq!(config.response_timeout, Duration::from_millis(20));
        assert_eq!(config.wait_timeout, Duration::from_secs(3));
        assert_eq!(config.poll_interval, Duration::from_millis(100));
    }

    #[test]
    fn test_load_toml() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(file, "baud_rate = 115200\npoll_interval = \"50ms\"").unwrap();

        let config = load_file(file.path()).unwrap();
        assert_eq!(config.port, None);
        assert_eq!(config.baud_rate, BaudRate::B115200);
        assert_eq!(config.poll_interval, Duration::from_millis(50));
    }

    #[test]
    fn test_load_rejects_bad_baud_rate() {
        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        writeln!(file, "baud_rate: 12345").unwrap();
        assert!(load_file(file.path()).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = load_file(Path::new("/nonexistent/dynabus.yaml")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ControllerConfig::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("DYNABUS_PORT", "/dev/ttyACM0"),
                ("DYNABUS_BAUD_RATE", "2000000"),
                ("DYNABUS_SCAN_IDS", "1-3,7"),
            ]),
        )
        .unwrap();

        assert_eq!(config.port.as_deref(), Some("/dev/ttyACM0"));
        assert_eq!(config.baud_rate, BaudRate::B2M);
        assert_eq!(config.scan_ids, vec![1, 2, 3, 7]);
    }

    #[test]
    fn test_env_override_errors() {
        let mut config = ControllerConfig::default();
        assert!(apply_env_overrides(&mut config, env(&[("DYNABUS_BAUD_RATE", "fast")])).is_err());
        assert!(apply_env_overrides(&mut config, env(&[("DYNABUS_SCAN_IDS", "3-1")])).is_err());
    }

    #[test]
    fn test_parse_id_list() {
        assert_eq!(parse_id_list("1, 2,3").unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_id_list("10-12").unwrap(), vec![10, 11, 12]);
        assert!(parse_id_list("x").is_err());
        assert!(parse_id_list("300").is_err());
    }
}
