// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `models` command.

use dynabus::{ModelInfo, ModelRegistry};

use crate::cli::{Cli, OutputFormat};
use crate::error::BinResult;

/// Summaries of every registered model, by model number.
pub fn list(registry: &ModelRegistry) -> Vec<ModelInfo> {
    registry.models().iter().map(|model| model.info()).collect()
}

/// Executes the `models` command.
pub fn models(cli: &Cli, registry: &ModelRegistry) -> BinResult<()> {
    let infos = list(registry);

    match cli.format {
        OutputFormat::Text => {
            for info in &infos {
                let features: Vec<&str> = info.features.iter().map(|f| f.as_str()).collect();
                println!(
                    "{} (model {}, protocol {:.1})",
                    info.name, info.model_number, info.protocol_version
                );
                println!("  features: {}", features.join(", "));
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&infos)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynabus::Feature;

    #[test]
    fn test_list_builtin() {
        let registry = ModelRegistry::builtin().unwrap();
        let infos = list(&registry);

        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].name, "XM430-W210");
        assert_eq!(infos[1].name, "XL430-W250");
        assert!(infos[0].features.contains(&Feature::CurrentControl));
        assert!(!infos[1].features.contains(&Feature::CurrentControl));
    }

    #[test]
    fn test_json_shape() {
        let registry = ModelRegistry::builtin().unwrap();
        let json = serde_json::to_value(list(&registry)).unwrap();
        assert_eq!(json[0]["model_number"], 1030);
        assert_eq!(json[1]["features"][0], "position_control");
    }
}
