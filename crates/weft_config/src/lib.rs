//! Parsing and validation of `weft.toml` fabric configuration files.
//!
//! The configuration describes the device grid, the routing architecture
//! (channel width, segments, switches, pin connectivity), the programmable
//! clock network, the multiplexer circuit library with its configuration
//! memory organization, and netlist output options. Loading produces a
//! validated [`FabricConfig`]; every cross-reference between sections is
//! checked before any generation starts.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE_NAME};
pub use types::*;
