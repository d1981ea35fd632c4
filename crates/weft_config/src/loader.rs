//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::{DesignKind, FabricConfig, ProtocolKind, StructureKind};
use std::collections::HashSet;
use std::path::Path;

/// File name looked up when [`load_config`] is given a directory.
pub const CONFIG_FILE_NAME: &str = "weft.toml";

/// Loads and validates a fabric configuration.
///
/// `path` may name the file itself or a directory containing `weft.toml`.
pub fn load_config(path: &Path) -> Result<FabricConfig, ConfigError> {
    let config_path = if path.is_dir() {
        path.join(CONFIG_FILE_NAME)
    } else {
        path.to_path_buf()
    };
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates a fabric configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<FabricConfig, ConfigError> {
    let config: FabricConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &FabricConfig) -> Result<(), ConfigError> {
    validate_device(config)?;
    validate_technology(config)?;
    validate_routing(config)?;
    validate_clock_network(config)?;
    Ok(())
}

fn ensure_unique<'a>(
    what: &str,
    names: impl IntoIterator<Item = &'a str>,
) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate {what} name '{name}'"
            )));
        }
    }
    Ok(())
}

fn validate_device(config: &FabricConfig) -> Result<(), ConfigError> {
    let device = &config.device;
    if device.name.is_empty() {
        return Err(ConfigError::MissingField("device.name".to_string()));
    }
    if device.width < 3 || device.height < 3 {
        return Err(ConfigError::ValidationError(format!(
            "device grid {}x{} is too small, need at least 3x3",
            device.width, device.height
        )));
    }
    ensure_unique("block", device.blocks.iter().map(|b| b.name.as_str()))?;
    for block in &device.blocks {
        if block.width == 0 || block.height == 0 {
            return Err(ConfigError::ValidationError(format!(
                "block '{}' has zero size",
                block.name
            )));
        }
    }

    let io = config
        .block(&device.io)
        .ok_or_else(|| ConfigError::UnknownReference {
            kind: "block",
            name: device.io.clone(),
        })?;
    if io.width != 1 || io.height != 1 {
        return Err(ConfigError::ValidationError(format!(
            "I/O block '{}' must occupy a single tile",
            io.name
        )));
    }
    let core = config
        .block(&device.core)
        .ok_or_else(|| ConfigError::UnknownReference {
            kind: "block",
            name: device.core.clone(),
        })?;
    if core.width != 1 || core.height != 1 {
        return Err(ConfigError::ValidationError(format!(
            "core block '{}' must occupy a single tile",
            core.name
        )));
    }

    for column in &device.columns {
        let block = config
            .block(&column.block)
            .ok_or_else(|| ConfigError::UnknownReference {
                kind: "block",
                name: column.block.clone(),
            })?;
        if column.x == 0 || column.x + block.width > device.width - 1 {
            return Err(ConfigError::ValidationError(format!(
                "column of '{}' at x={} does not fit inside the I/O ring",
                block.name, column.x
            )));
        }
    }
    Ok(())
}

fn validate_technology(config: &FabricConfig) -> Result<(), ConfigError> {
    let tech = &config.technology;
    ensure_unique("mux model", tech.muxes.iter().map(|m| m.name.as_str()))?;
    for mux in &tech.muxes {
        if mux.structure == StructureKind::MultiLevel && mux.levels.unwrap_or(0) == 0 {
            return Err(ConfigError::MissingField(format!(
                "technology.muxes.{}.levels",
                mux.name
            )));
        }
        if mux.design == DesignKind::Rram && tech.protocol != ProtocolKind::MemoryBank {
            return Err(ConfigError::ValidationError(format!(
                "RRAM multiplexer '{}' requires the memory_bank protocol",
                mux.name
            )));
        }
    }
    Ok(())
}

fn validate_routing(config: &FabricConfig) -> Result<(), ConfigError> {
    let routing = &config.routing;
    if routing.channel_width == 0 || routing.channel_width % 2 != 0 {
        return Err(ConfigError::ValidationError(format!(
            "channel_width must be a positive even number, got {}",
            routing.channel_width
        )));
    }
    for (name, fc) in [("fc_in", routing.fc_in), ("fc_out", routing.fc_out)] {
        if fc == 0 || fc > routing.channel_width {
            return Err(ConfigError::ValidationError(format!(
                "{name} must be between 1 and the channel width ({}), got {fc}",
                routing.channel_width
            )));
        }
    }

    if routing.segments.is_empty() {
        return Err(ConfigError::MissingField("routing.segments".to_string()));
    }
    ensure_unique("segment", routing.segments.iter().map(|s| s.name.as_str()))?;
    if let Some(seg) = routing.segments.iter().find(|s| s.length == 0) {
        return Err(ConfigError::ValidationError(format!(
            "segment '{}' has zero length",
            seg.name
        )));
    }

    ensure_unique("switch", routing.switches.iter().map(|s| s.name.as_str()))?;
    for switch in &routing.switches {
        if config.mux(&switch.model).is_none() {
            return Err(ConfigError::UnknownReference {
                kind: "mux model",
                name: switch.model.clone(),
            });
        }
    }
    for name in [&routing.sb_switch, &routing.cb_switch] {
        if !routing.switches.iter().any(|s| &s.name == name) {
            return Err(ConfigError::UnknownReference {
                kind: "switch",
                name: name.clone(),
            });
        }
    }
    Ok(())
}

fn validate_clock_network(config: &FabricConfig) -> Result<(), ConfigError> {
    let clk = &config.clock_network;
    if let Some(seg) = &clk.default_segment {
        if !config.routing.segments.iter().any(|s| &s.name == seg) {
            return Err(ConfigError::UnknownReference {
                kind: "segment",
                name: seg.clone(),
            });
        }
    }
    if let Some(sw) = &clk.default_switch {
        if !config.routing.switches.iter().any(|s| &s.name == sw) {
            return Err(ConfigError::UnknownReference {
                kind: "switch",
                name: sw.clone(),
            });
        }
    }

    ensure_unique("clock tree", clk.trees.iter().map(|t| t.name.as_str()))?;
    for tree in &clk.trees {
        if tree.width == 0 {
            return Err(ConfigError::ValidationError(format!(
                "clock tree '{}' has zero width",
                tree.name
            )));
        }
        let axes = tree.level_axes();
        if axes.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "clock tree '{}' has no levels",
                tree.name
            )));
        }
        if axes.windows(2).any(|pair| pair[0] == pair[1]) {
            return Err(ConfigError::ValidationError(format!(
                "clock tree '{}' levels must alternate between x and y channels",
                tree.name
            )));
        }
    }
    Ok(())
}
