//! Configuration types deserialized from `weft.toml`.

use serde::Deserialize;

/// The top-level fabric configuration parsed from `weft.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct FabricConfig {
    /// Device grid and block types.
    pub device: DeviceConfig,
    /// Routing architecture.
    pub routing: RoutingConfig,
    /// Programmable clock network appended to the routing graph.
    #[serde(default)]
    pub clock_network: ClockNetworkConfig,
    /// Multiplexer circuit library and configuration memory organization.
    #[serde(default)]
    pub technology: TechnologyConfig,
    /// Netlist output options.
    #[serde(default)]
    pub output: OutputConfig,
}

impl FabricConfig {
    /// Looks up a block type by name.
    pub fn block(&self, name: &str) -> Option<&BlockConfig> {
        self.device.blocks.iter().find(|b| b.name == name)
    }

    /// Looks up a multiplexer model by name.
    pub fn mux(&self, name: &str) -> Option<&MuxConfig> {
        self.technology.muxes.iter().find(|m| m.name == name)
    }

    /// Name of the segment used by clock tracks.
    ///
    /// Falls back to the first routing segment when the clock network does
    /// not name one.
    pub fn clock_segment(&self) -> &str {
        self.clock_network
            .default_segment
            .as_deref()
            .or_else(|| self.routing.segments.first().map(|s| s.name.as_str()))
            .unwrap_or_default()
    }

    /// Name of the switch used by clock edges, falling back to the switch-block switch.
    pub fn clock_switch(&self) -> &str {
        self.clock_network
            .default_switch
            .as_deref()
            .unwrap_or(&self.routing.sb_switch)
    }
}

/// Device grid description.
///
/// The grid is `width × height` tiles including a ring of I/O tiles on the
/// perimeter; corner tiles stay empty. Every other tile holds the `core`
/// block unless a [`ColumnConfig`] places a different block type there.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    /// The device name.
    pub name: String,
    /// Grid width in tiles, I/O ring included.
    pub width: u32,
    /// Grid height in tiles, I/O ring included.
    pub height: u32,
    /// Whether routing channels cross multi-tile blocks.
    #[serde(default)]
    pub through_channel: bool,
    /// Available block types.
    #[serde(default = "default_blocks")]
    pub blocks: Vec<BlockConfig>,
    /// Block type of the I/O ring.
    #[serde(default = "default_io_block")]
    pub io: String,
    /// Block type filling the core.
    #[serde(default = "default_core_block")]
    pub core: String,
    /// Columns of the core filled with another block type.
    #[serde(default)]
    pub columns: Vec<ColumnConfig>,
}

/// A placeable block type.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockConfig {
    /// Block type name.
    pub name: String,
    /// Number of input pins.
    #[serde(default)]
    pub inputs: u32,
    /// Number of output pins.
    #[serde(default)]
    pub outputs: u32,
    /// Width in tiles.
    #[serde(default = "one")]
    pub width: u32,
    /// Height in tiles.
    #[serde(default = "one")]
    pub height: u32,
}

/// A core column filled with a given block type.
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnConfig {
    /// Block type name.
    pub block: String,
    /// Column index (must be inside the I/O ring).
    pub x: u32,
}

/// Routing architecture.
#[derive(Debug, Clone, Deserialize)]
pub struct RoutingConfig {
    /// Number of tracks per channel; even, half increasing and half decreasing.
    pub channel_width: u32,
    /// Number of tracks each input pin can be connected to.
    #[serde(default = "default_fc_in")]
    pub fc_in: u32,
    /// Number of tracks each output pin drives at each channel end.
    #[serde(default = "default_fc_out")]
    pub fc_out: u32,
    /// Wire segment types, assigned to track pairs round-robin.
    #[serde(default = "default_segments")]
    pub segments: Vec<SegmentConfig>,
    /// Programmable switch types.
    #[serde(default = "default_switches")]
    pub switches: Vec<SwitchConfig>,
    /// Switch used for track-to-track and pin-to-track connections.
    #[serde(default = "default_sb_switch")]
    pub sb_switch: String,
    /// Switch used for track-to-input-pin connections.
    #[serde(default = "default_cb_switch")]
    pub cb_switch: String,
}

/// A wire segment type.
#[derive(Debug, Clone, Deserialize)]
pub struct SegmentConfig {
    /// Segment name.
    pub name: String,
    /// Number of tiles a wire spans.
    #[serde(default = "one")]
    pub length: u32,
}

/// A programmable switch type and the multiplexer model implementing it.
#[derive(Debug, Clone, Deserialize)]
pub struct SwitchConfig {
    /// Switch name.
    pub name: String,
    /// Multiplexer model name from `[[technology.muxes]]`.
    pub model: String,
}

/// Channel orientation of a clock level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelAxis {
    /// Horizontal channels.
    X,
    /// Vertical channels.
    Y,
}

/// The programmable clock network.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClockNetworkConfig {
    /// Segment used by clock tracks.
    #[serde(default)]
    pub default_segment: Option<String>,
    /// Switch used by clock edges.
    #[serde(default)]
    pub default_switch: Option<String>,
    /// Clock trees.
    #[serde(default)]
    pub trees: Vec<ClockTreeConfig>,
}

/// One clock tree.
#[derive(Debug, Clone, Deserialize)]
pub struct ClockTreeConfig {
    /// Tree name.
    pub name: String,
    /// Number of clock pins carried by every level.
    pub width: u32,
    /// Channel axis of each level, root first.
    #[serde(default)]
    pub levels: Vec<ChannelAxis>,
    /// Number of levels when `levels` is omitted; axes alternate starting with X.
    #[serde(default)]
    pub depth: Option<u32>,
}

impl ClockTreeConfig {
    /// The channel axis of every level, root first.
    pub fn level_axes(&self) -> Vec<ChannelAxis> {
        if !self.levels.is_empty() {
            return self.levels.clone();
        }
        let depth = self.depth.unwrap_or(2);
        (0..depth)
            .map(|lvl| {
                if lvl % 2 == 0 {
                    ChannelAxis::X
                } else {
                    ChannelAxis::Y
                }
            })
            .collect()
    }
}

/// How configuration memories are organized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolKind {
    /// Every SRAM bit is a standalone port.
    Standalone,
    /// SRAM bits form a shift-register chain.
    #[default]
    ScanChain,
    /// Bits are addressed through bit lines and word lines.
    MemoryBank,
}

/// Device technology of a multiplexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesignKind {
    /// Transmission-gate multiplexer driven by SRAM bits.
    #[default]
    Cmos,
    /// Resistive-memory multiplexer programmed through BL/WL pairs.
    Rram,
}

/// Multiplexer topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureKind {
    /// Binary tree of 2:1 stages.
    #[default]
    Tree,
    /// A single stage with one select line per input.
    OneLevel,
    /// A fixed number of stages, one-hot select per stage.
    MultiLevel,
}

/// The technology section.
#[derive(Debug, Clone, Deserialize)]
pub struct TechnologyConfig {
    /// Configuration memory organization.
    #[serde(default)]
    pub protocol: ProtocolKind,
    /// Multiplexer models.
    #[serde(default = "default_muxes")]
    pub muxes: Vec<MuxConfig>,
}

impl Default for TechnologyConfig {
    fn default() -> Self {
        Self {
            protocol: ProtocolKind::default(),
            muxes: default_muxes(),
        }
    }
}

/// A multiplexer circuit model.
#[derive(Debug, Clone, Deserialize)]
pub struct MuxConfig {
    /// Model name, referenced from `[[routing.switches]]`.
    pub name: String,
    /// Prefix of generated primitive names (`<prefix>_size<N>`); defaults to the name.
    #[serde(default)]
    pub prefix: Option<String>,
    /// Device technology.
    #[serde(default)]
    pub design: DesignKind,
    /// Topology.
    #[serde(default)]
    pub structure: StructureKind,
    /// Number of stages for `multi_level`.
    #[serde(default)]
    pub levels: Option<u32>,
}

/// Netlist output options.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Output directory.
    #[serde(default = "default_output_dir")]
    pub directory: String,
    /// Emit one module per unique block shape instead of one per block.
    #[serde(default)]
    pub compact_routing_hierarchy: bool,
    /// Connect instance ports by name instead of by position.
    #[serde(default)]
    pub explicit_port_mapping: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            compact_routing_hierarchy: false,
            explicit_port_mapping: false,
        }
    }
}

fn one() -> u32 {
    1
}

fn default_blocks() -> Vec<BlockConfig> {
    vec![
        BlockConfig {
            name: "io".to_string(),
            inputs: 1,
            outputs: 1,
            width: 1,
            height: 1,
        },
        BlockConfig {
            name: "clb".to_string(),
            inputs: 4,
            outputs: 2,
            width: 1,
            height: 1,
        },
    ]
}

fn default_io_block() -> String {
    "io".to_string()
}

fn default_core_block() -> String {
    "clb".to_string()
}

fn default_fc_in() -> u32 {
    2
}

fn default_fc_out() -> u32 {
    1
}

fn default_segments() -> Vec<SegmentConfig> {
    vec![SegmentConfig {
        name: "L1".to_string(),
        length: 1,
    }]
}

fn default_switches() -> Vec<SwitchConfig> {
    vec![
        SwitchConfig {
            name: "sb_mux".to_string(),
            model: "mux_tree".to_string(),
        },
        SwitchConfig {
            name: "cb_mux".to_string(),
            model: "mux_tree".to_string(),
        },
    ]
}

fn default_sb_switch() -> String {
    "sb_mux".to_string()
}

fn default_cb_switch() -> String {
    "cb_mux".to_string()
}

fn default_muxes() -> Vec<MuxConfig> {
    vec![MuxConfig {
        name: "mux_tree".to_string(),
        prefix: None,
        design: DesignKind::Cmos,
        structure: StructureKind::Tree,
        levels: None,
    }]
}

fn default_output_dir() -> String {
    "weft_out".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_axes_default_alternates() {
        let tree = ClockTreeConfig {
            name: "clk".to_string(),
            width: 1,
            levels: Vec::new(),
            depth: Some(3),
        };
        assert_eq!(
            tree.level_axes(),
            vec![ChannelAxis::X, ChannelAxis::Y, ChannelAxis::X]
        );
    }

    #[test]
    fn level_axes_explicit_wins() {
        let tree = ClockTreeConfig {
            name: "clk".to_string(),
            width: 1,
            levels: vec![ChannelAxis::Y, ChannelAxis::X],
            depth: Some(5),
        };
        assert_eq!(tree.level_axes(), vec![ChannelAxis::Y, ChannelAxis::X]);
    }

    #[test]
    fn defaults() {
        assert_eq!(ProtocolKind::default(), ProtocolKind::ScanChain);
        assert_eq!(DesignKind::default(), DesignKind::Cmos);
        assert_eq!(StructureKind::default(), StructureKind::Tree);
        assert_eq!(OutputConfig::default().directory, "weft_out");
        assert_eq!(TechnologyConfig::default().muxes.len(), 1);
    }
}
