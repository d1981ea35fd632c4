//! Structural Verilog for channels, switch blocks and connection blocks.
//!
//! Every module goes to its own file under `routing/`, and a header
//! `routing.v` includes them all. Port names encode the channel tile or grid
//! pin they belong to (`chanx_1__0__in_3`, `grid_2__1__pin_top__0_`) in a
//! flat hierarchy; a compact hierarchy names them relative to the block side
//! (`left_chanx_in_3`, `top_grid_pin_0_`) so one module serves every
//! instance of a shape.

use crate::allocator::BlockConfig;
use crate::gsb::{ConnectionBlock, GridPin, RoutingBlock, SwitchBlock};
use crate::interconnect::{DriverPort, Interconnect, Sink};
use crate::mux::{bit_string, MuxBits, MuxLibrary};
use crate::selection::RouteSelection;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use weft_common::{InternalError, WeftResult};
use weft_config::{DesignKind, ProtocolKind};
use weft_rr::{ChannelTile, Direction, PortDirection, Side};

/// Name of the directory holding one file per module.
pub const ROUTING_DIR: &str = "routing";
/// Name of the header including every routing module.
pub const ROUTING_HEADER: &str = "routing.v";

/// Destination of generated module files.
pub trait NetlistSink {
    /// Stores one module under `file_name` (relative to the routing directory).
    fn write_module(&mut self, file_name: &str, content: &str) -> io::Result<()>;

    /// Writes the header that includes every stored module.
    fn finish(&mut self) -> io::Result<()>;
}

/// Header text including the given module files.
pub fn header(files: &[String]) -> String {
    let mut out = String::from("// Routing modules\n");
    for file in files {
        out.push_str(&format!("`include \"{ROUTING_DIR}/{file}\"\n"));
    }
    out
}

/// Writes modules to `<root>/routing/` and the header to `<root>/routing.v`.
pub struct DirectorySink {
    root: PathBuf,
    files: Vec<String>,
}

impl DirectorySink {
    /// Creates the output directories.
    pub fn create(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(root.join(ROUTING_DIR))?;
        Ok(Self {
            root,
            files: Vec::new(),
        })
    }

    /// Output root.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl NetlistSink for DirectorySink {
    fn write_module(&mut self, file_name: &str, content: &str) -> io::Result<()> {
        std::fs::write(self.root.join(ROUTING_DIR).join(file_name), content)?;
        self.files.push(file_name.to_string());
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        std::fs::write(self.root.join(ROUTING_HEADER), header(&self.files))
    }
}

/// Keeps modules in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    /// `(file name, content)` in write order.
    pub modules: Vec<(String, String)>,
    /// Header text, once finished.
    pub header: Option<String>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Content of a module file.
    pub fn module(&self, file_name: &str) -> Option<&str> {
        self.modules
            .iter()
            .find(|(name, _)| name == file_name)
            .map(|(_, content)| content.as_str())
    }
}

impl NetlistSink for MemorySink {
    fn write_module(&mut self, file_name: &str, content: &str) -> io::Result<()> {
        self.modules.push((file_name.to_string(), content.to_string()));
        Ok(())
    }

    fn finish(&mut self) -> io::Result<()> {
        let files: Vec<String> = self.modules.iter().map(|(n, _)| n.clone()).collect();
        self.header = Some(header(&files));
        Ok(())
    }
}

/// How module ports are named.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortNaming {
    /// Grid coordinates in every name; one module per block.
    Absolute,
    /// Names relative to the block side; one module per shape.
    Relative,
}

/// Netlist formatting options.
#[derive(Clone, Copy, Debug)]
pub struct NetlistOptions {
    /// Port naming scheme.
    pub naming: PortNaming,
    /// Connect multiplexer ports by name.
    pub explicit_port_mapping: bool,
    /// Configuration memory organization.
    pub protocol: ProtocolKind,
}

fn track_port(naming: PortNaming, side: Side, tile: ChannelTile, port: &str, t: usize) -> String {
    match naming {
        PortNaming::Absolute => format!("{}_{}__{}__{port}_{t}", tile.chan, tile.x, tile.y),
        PortNaming::Relative => format!("{side}_{}_{port}_{t}", tile.chan),
    }
}

fn grid_pin_port(naming: PortNaming, side: Side, index: usize, pin: &GridPin) -> String {
    match naming {
        PortNaming::Absolute => {
            format!("grid_{}__{}__pin_{}__{}_", pin.x, pin.y, pin.side, pin.ptc)
        }
        PortNaming::Relative => format!("{side}_grid_pin_{index}_"),
    }
}

/// Port names of one block, resolved from [`DriverPort`]s and sinks.
trait BlockPorts {
    /// `(name, is_input)` in declaration order.
    fn declarations(&self, naming: PortNaming) -> Vec<(String, bool)>;
    fn driver(&self, naming: PortNaming, port: DriverPort) -> WeftResult<String>;
    fn output(&self, naming: PortNaming, sink: &Sink) -> WeftResult<String>;
}

impl BlockPorts for SwitchBlock {
    fn declarations(&self, naming: PortNaming) -> Vec<(String, bool)> {
        let mut ports = Vec::new();
        for side in Side::ALL {
            let s = self.side(side);
            let Some(tile) = s.channel else { continue };
            for (t, entry) in s.tracks.iter().enumerate() {
                let input = entry.port == PortDirection::In;
                ports.push((track_port(naming, side, tile, entry.port.name(), t), input));
            }
            for (i, pin) in s.opins.iter().enumerate() {
                ports.push((grid_pin_port(naming, side, i, pin), true));
            }
        }
        ports
    }

    fn driver(&self, naming: PortNaming, port: DriverPort) -> WeftResult<String> {
        let missing = || {
            InternalError::new(format!(
                "{port:?} is not a port of switch block ({}, {})",
                self.x, self.y
            ))
        };
        match port {
            DriverPort::Track { side, index } => {
                let s = self.side(side);
                let tile = s.channel.ok_or_else(missing)?;
                let entry = s.tracks.get(index).ok_or_else(missing)?;
                if entry.port != PortDirection::In {
                    return Err(missing());
                }
                Ok(track_port(naming, side, tile, "in", index))
            }
            DriverPort::GridPin { side, index } => {
                let pin = self.side(side).opins.get(index).ok_or_else(missing)?;
                Ok(grid_pin_port(naming, side, index, pin))
            }
        }
    }

    fn output(&self, naming: PortNaming, sink: &Sink) -> WeftResult<String> {
        let tile = self.side(sink.side).channel.ok_or_else(|| {
            InternalError::new(format!(
                "switch block ({}, {}) has no channel on its {} side",
                self.x, self.y, sink.side
            ))
        })?;
        Ok(track_port(naming, sink.side, tile, "out", sink.index))
    }
}

impl ConnectionBlock {
    fn midout_port(&self, naming: PortNaming, t: usize) -> String {
        track_port(naming, self.channel_side(), self.channel(), "midout", t)
    }

    fn ipin(&self, side: Side, index: usize) -> Option<&GridPin> {
        self.ipin_sides
            .iter()
            .find(|(s, _)| *s == side)
            .and_then(|(_, pins)| pins.get(index))
    }
}

impl BlockPorts for ConnectionBlock {
    fn declarations(&self, naming: PortNaming) -> Vec<(String, bool)> {
        let mut ports: Vec<(String, bool)> = (0..self.tracks.len())
            .map(|t| (self.midout_port(naming, t), true))
            .collect();
        for (side, pins) in &self.ipin_sides {
            for (i, pin) in pins.iter().enumerate() {
                ports.push((grid_pin_port(naming, *side, i, pin), false));
            }
        }
        ports
    }

    fn driver(&self, naming: PortNaming, port: DriverPort) -> WeftResult<String> {
        match port {
            DriverPort::Track { index, .. } if index < self.tracks.len() => {
                Ok(self.midout_port(naming, index))
            }
            other => Err(InternalError::new(format!(
                "{other:?} cannot drive an input pin of {}({}, {})",
                self.chan, self.x, self.y
            ))),
        }
    }

    fn output(&self, naming: PortNaming, sink: &Sink) -> WeftResult<String> {
        let pin = self.ipin(sink.side, sink.index).ok_or_else(|| {
            InternalError::new(format!(
                "connection block {}({}, {}) has no input pin {} on its {} side",
                self.chan, self.x, self.y, sink.index, sink.side
            ))
        })?;
        Ok(grid_pin_port(naming, sink.side, sink.index, pin))
    }
}

fn range(lsb: u32, width: u32) -> String {
    format!("[{lsb}:{}]", lsb + width - 1)
}

fn config_ports(config: &BlockConfig, protocol: ProtocolKind) -> Vec<String> {
    let mut ports = Vec::new();
    if config.num_bits > 0 {
        let r = range(config.lsb, config.num_bits);
        let (a, b) = match protocol {
            ProtocolKind::MemoryBank => ("bl", "wl"),
            _ => ("sram", "sram_inv"),
        };
        ports.push(format!("input {r} {a}"));
        ports.push(format!("input {r} {b}"));
    }
    if config.num_reserved > 0 {
        let r = range(0, config.num_reserved);
        ports.push(format!("input {r} reserved_bl"));
        ports.push(format!("input {r} reserved_wl"));
    }
    ports
}

fn describe_bits(bits: &MuxBits) -> String {
    match bits {
        MuxBits::Sram(values) => format!("sram {}", bit_string(values)),
        MuxBits::BlWl { bl, wl } => format!("bl {}, wl {}", bit_string(bl), bit_string(wl)),
    }
}

/// Writes the module of a switch or connection block.
///
/// Multiplexers take consecutive slices of `config`, in sink order. The
/// selected path of each multiplexer is looked up in `selection` and
/// documented next to the instance.
pub fn write_block_module(
    name: &str,
    block: &RoutingBlock,
    config: &BlockConfig,
    library: &MuxLibrary,
    selection: &RouteSelection,
    options: &NetlistOptions,
) -> WeftResult<String> {
    match block {
        RoutingBlock::Switch(sb) => {
            let title = format!("Switch block at ({}, {})", sb.x, sb.y);
            emit_module(name, &title, sb, &sb.sinks, config, library, selection, options)
        }
        RoutingBlock::Connection(cb) => {
            let title = format!("Connection block on {}({}, {})", cb.chan, cb.x, cb.y);
            emit_module(name, &title, cb, &cb.sinks, config, library, selection, options)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn emit_module(
    name: &str,
    title: &str,
    ports: &impl BlockPorts,
    sinks: &[Sink],
    config: &BlockConfig,
    library: &MuxLibrary,
    selection: &RouteSelection,
    options: &NetlistOptions,
) -> WeftResult<String> {
    let naming = options.naming;
    let mut out = String::new();
    out.push_str("//-------------------------------------------\n");
    out.push_str(&format!("// {title}\n"));
    out.push_str("//-------------------------------------------\n");
    out.push_str(&format!("module {name} (\n"));
    let mut decls: Vec<String> = ports
        .declarations(naming)
        .into_iter()
        .map(|(port, input)| format!("{} {port}", if input { "input" } else { "output" }))
        .collect();
    decls.extend(config_ports(config, options.protocol));
    out.push_str(&format!("  {}\n", decls.join(",\n  ")));
    out.push_str(");\n");

    let mut offset = 0u32;
    let mut counters: HashMap<String, usize> = HashMap::new();
    for sink in sinks {
        let output = ports.output(naming, sink)?;
        match &sink.interconnect {
            Interconnect::PassThrough(input) | Interconnect::Short(input) => {
                let input = ports.driver(naming, *input)?;
                out.push_str(&format!("  assign {output} = {input};\n"));
            }
            Interconnect::Undriven => {
                out.push_str(&format!("  // {output} is not driven\n"));
            }
            Interconnect::Mux { inputs, model } => {
                let model = library.get(model)?;
                let size = inputs.len();
                let num_bits = model.num_conf_bits(size)?;
                let primitive = model.primitive_name(size);
                let counter = counters.entry(primitive.clone()).or_default();
                let instance = format!("{primitive}_{counter}_");
                let inbus = format!("{primitive}_{counter}_inbus");
                *counter += 1;

                out.push_str(&format!("  wire [0:{}] {inbus};\n", size - 1));
                for (i, input) in inputs.iter().enumerate() {
                    let input = ports.driver(naming, *input)?;
                    out.push_str(&format!("  assign {inbus}[{i}] = {input};\n"));
                }

                let bits = range(config.lsb + offset, num_bits);
                let mut connections = vec![
                    ("in", inbus),
                    ("out", output.clone()),
                ];
                match (model.design, options.protocol) {
                    (DesignKind::Rram, _) => {
                        let reserved = range(0, model.num_reserved_conf_bits(size));
                        connections.push(("bl", format!("bl{bits}")));
                        connections.push(("wl", format!("wl{bits}")));
                        connections.push(("reserved_bl", format!("reserved_bl{reserved}")));
                        connections.push(("reserved_wl", format!("reserved_wl{reserved}")));
                    }
                    (DesignKind::Cmos, ProtocolKind::MemoryBank) => {
                        connections.push(("bl", format!("bl{bits}")));
                        connections.push(("wl", format!("wl{bits}")));
                    }
                    (DesignKind::Cmos, _) => {
                        connections.push(("sram", format!("sram{bits}")));
                        connections.push(("sram_inv", format!("sram_inv{bits}")));
                    }
                }
                let mapped: Vec<String> = connections
                    .into_iter()
                    .map(|(port, net)| {
                        if options.explicit_port_mapping {
                            format!(".{port}({net})")
                        } else {
                            net
                        }
                    })
                    .collect();
                out.push_str(&format!("  {primitive} {instance} (\n"));
                out.push_str(&format!("    {}\n", mapped.join(",\n    ")));
                out.push_str("  );\n");

                let path = selection.path_id(sink.node, &sink.drivers, name)?;
                let pattern = model.decode(size, path)?;
                let path = path.map_or("unrouted".to_string(), |p| format!("path {p}"));
                out.push_str(&format!(
                    "  // {instance}: {path}, {}\n",
                    describe_bits(&pattern)
                ));
                offset += num_bits;
            }
        }
    }
    if offset != config.num_bits {
        return Err(InternalError::new(format!(
            "module {name} uses {offset} configuration bits but {} were allocated",
            config.num_bits
        )));
    }
    out.push_str("endmodule\n");
    Ok(out)
}

/// Writes a channel module: every track is routed straight through and
/// tapped in the middle for the connection block.
pub fn write_channel_module(name: &str, tile: ChannelTile, directions: &[Direction]) -> String {
    let mut out = String::new();
    out.push_str("//-------------------------------------------\n");
    out.push_str(&format!("// Channel {}({}, {})\n", tile.chan, tile.x, tile.y));
    out.push_str("//-------------------------------------------\n");
    out.push_str(&format!("module {name} (\n"));
    let n = directions.len();
    let mut decls = Vec::with_capacity(3 * n);
    decls.extend((0..n).map(|t| format!("input in_{t}")));
    decls.extend((0..n).map(|t| format!("output out_{t}")));
    decls.extend((0..n).map(|t| format!("output midout_{t}")));
    out.push_str(&format!("  {}\n", decls.join(",\n  ")));
    out.push_str(");\n");
    for (t, direction) in directions.iter().enumerate() {
        out.push_str(&format!("  // track {t}: {direction:?}\n"));
        out.push_str(&format!("  assign out_{t} = in_{t};\n"));
        out.push_str(&format!("  assign midout_{t} = in_{t};\n"));
    }
    out.push_str("endmodule\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gsb::{build_connection_block, build_switch_block};
    use crate::mux::MuxLibrary;
    use crate::test_util::{device, fabric};
    use weft_config::TechnologyConfig;
    use weft_rr::ChanType;

    fn options(naming: PortNaming, explicit: bool) -> NetlistOptions {
        NetlistOptions {
            naming,
            explicit_port_mapping: explicit,
            protocol: ProtocolKind::ScanChain,
        }
    }

    fn block_config(block: &RoutingBlock, library: &MuxLibrary, lsb: u32) -> BlockConfig {
        let count = crate::allocator::count_block(block, library).unwrap();
        BlockConfig {
            lsb,
            num_bits: count.num_bits,
            num_reserved: count.num_reserved,
        }
    }

    #[test]
    fn switch_block_module() {
        let config = fabric(4, 4, 4, "");
        let (grid, graph) = device(&config);
        let library = MuxLibrary::from_config(&config.technology);
        let block = RoutingBlock::Switch(build_switch_block(&graph, &grid, 1, 1).unwrap().unwrap());
        let cfg = block_config(&block, &library, 10);
        let text = write_block_module(
            &block.flat_name(),
            &block,
            &cfg,
            &library,
            &RouteSelection::new(),
            &options(PortNaming::Absolute, true),
        )
        .unwrap();
        assert!(text.contains("module sb_1__1_ ("));
        assert!(text.contains("input chanx_1__1__in_0"));
        assert!(text.contains("output chanx_1__1__out_1"));
        assert!(text.contains(&format!("input [10:{}] sram", 9 + cfg.num_bits)));
        assert!(text.contains(".in(mux_tree_size"));
        assert!(text.contains("unrouted"));
        assert!(text.trim_end().ends_with("endmodule"));
    }

    #[test]
    fn relative_names_hide_coordinates() {
        let config = fabric(4, 4, 4, "");
        let (grid, graph) = device(&config);
        let library = MuxLibrary::from_config(&config.technology);
        let block = RoutingBlock::Connection(
            build_connection_block(&graph, &grid, ChanType::Y, 1, 1)
                .unwrap()
                .unwrap(),
        );
        let cfg = block_config(&block, &library, 0);
        let text = write_block_module(
            "cby_0_",
            &block,
            &cfg,
            &library,
            &RouteSelection::new(),
            &options(PortNaming::Relative, false),
        )
        .unwrap();
        assert!(text.contains("input bottom_chany_midout_0"));
        assert!(text.contains("output right_grid_pin_0_"));
        assert!(!text.contains("__"));
        // positional mapping has no named connections
        assert!(!text.contains(".in("));
    }

    #[test]
    fn routed_path_is_documented() {
        let config = fabric(4, 4, 4, "");
        let (grid, graph) = device(&config);
        let library = MuxLibrary::from_config(&config.technology);
        let cb = build_connection_block(&graph, &grid, ChanType::X, 1, 1)
            .unwrap()
            .unwrap();
        let sink = cb
            .sinks
            .iter()
            .find(|s| s.interconnect.mux().is_some())
            .unwrap()
            .clone();
        let mut selection = RouteSelection::new();
        selection.insert(sink.node, sink.drivers[1]);
        let block = RoutingBlock::Connection(cb);
        let cfg = block_config(&block, &library, 0);
        let text = write_block_module(
            "cbx_1__1_",
            &block,
            &cfg,
            &library,
            &selection,
            &options(PortNaming::Absolute, true),
        )
        .unwrap();
        assert!(text.contains("path 1, sram 1"));
    }

    #[test]
    fn allocation_mismatch_is_an_error() {
        let config = fabric(4, 4, 4, "");
        let (grid, graph) = device(&config);
        let library = MuxLibrary::from_config(&TechnologyConfig::default());
        let block = RoutingBlock::Switch(build_switch_block(&graph, &grid, 1, 1).unwrap().unwrap());
        let cfg = BlockConfig {
            lsb: 0,
            num_bits: 1,
            num_reserved: 0,
        };
        let opts = options(PortNaming::Absolute, true);
        assert!(
            write_block_module("sb", &block, &cfg, &library, &RouteSelection::new(), &opts)
                .is_err()
        );
    }

    #[test]
    fn channel_module_taps_every_track() {
        let text = write_channel_module(
            "chanx_1__0_",
            ChannelTile::new(ChanType::X, 1, 0),
            &[Direction::Inc, Direction::Dec],
        );
        assert!(text.contains("assign out_1 = in_1;"));
        assert!(text.contains("assign midout_0 = in_0;"));
        assert!(text.contains("output midout_1\n);"));
        assert!(text.contains("// Channel chanx(1, 0)\n"));
        assert!(text.contains("module chanx_1__0_ (\n  input in_0,\n  input in_1,\n"));
        assert!(text.contains("  // track 1: Dec\n"));
        assert!(text.ends_with("endmodule\n"));
    }

    #[test]
    fn header_includes_every_module() {
        let mut sink = MemorySink::new();
        sink.write_module("sb_0__0_.v", "module sb_0__0_ ();\nendmodule\n")
            .unwrap();
        sink.finish().unwrap();
        assert_eq!(
            sink.header.as_deref(),
            Some("// Routing modules\n`include \"routing/sb_0__0_.v\"\n")
        );
        assert!(sink.module("sb_0__0_.v").is_some());
    }
}
