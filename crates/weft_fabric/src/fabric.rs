//! Routing-resource generation: from a configuration to netlists and a bitstream.

use crate::allocator::{count_block, BlockConfig, BlockState, ConfigAllocator, CounterState};
use crate::bitstream::FabricBitstream;
use crate::error::GenerateError;
use crate::gsb::{collect_blocks, is_unidirectional, RoutingBlock};
use crate::mux::MuxLibrary;
use crate::netlist::{
    write_block_module, write_channel_module, NetlistOptions, NetlistSink, PortNaming,
};
use crate::selection::RouteSelection;
use crate::unique::{address_all_instances, size_unique_shapes, UniqueModules};
use std::collections::HashMap;
use weft_common::{ExecStatus, InternalError, ScopedTimer, WeftResult};
use weft_config::{FabricConfig, OutputConfig, ProtocolKind};
use weft_diagnostics::DiagnosticSink;
use weft_rr::{
    append_clock_rr_graph, build_rr_graph, ChanType, ChannelTile, ClockNetwork,
    ClockSpatialLookup, DeviceGrid, Direction, RoutingArch, RrGraph,
};

/// Hierarchy and port-mapping options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    /// One module per unique block shape instead of one per block.
    pub compact: bool,
    /// Connect multiplexer ports by name.
    pub explicit_port_mapping: bool,
}

impl GenerateOptions {
    /// Options of an `[output]` section.
    pub fn from_config(output: &OutputConfig) -> Self {
        Self {
            compact: output.compact_routing_hierarchy,
            explicit_port_mapping: output.explicit_port_mapping,
        }
    }
}

/// A device grid with its routing graph, clock network included.
pub struct PreparedDevice {
    /// Device grid.
    pub grid: DeviceGrid,
    /// Routing-resource graph.
    pub graph: RrGraph,
    /// Clock nodes appended to the graph.
    pub clock_lookup: ClockSpatialLookup,
    /// Outcome of the clock extension; diagnostics explain a fatal status.
    pub clock_status: ExecStatus,
}

/// Builds the grid and the routing graph of `config` and appends the clock
/// network to it.
pub fn prepare_device(config: &FabricConfig, sink: &DiagnosticSink) -> WeftResult<PreparedDevice> {
    let grid = DeviceGrid::from_config(config)?;
    let mut graph = build_rr_graph(&grid, &RoutingArch::from_config(config))?;
    let clock = ClockNetwork::from_config(config, &graph)?;
    let mut clock_lookup = ClockSpatialLookup::new();
    let clock_status = append_clock_rr_graph(
        &mut graph,
        &mut clock_lookup,
        &grid,
        config.device.through_channel,
        &clock,
        sink,
    )?;
    Ok(PreparedDevice {
        grid,
        graph,
        clock_lookup,
        clock_status,
    })
}

/// What one generation run produced.
#[derive(Debug)]
pub struct GenerationReport {
    /// Switch blocks in the device.
    pub num_switch_blocks: usize,
    /// Connection blocks in the device.
    pub num_connection_blocks: usize,
    /// Channel modules written.
    pub num_channel_modules: usize,
    /// Block modules written.
    pub num_block_modules: usize,
    /// Final configuration counter.
    pub counter: CounterState,
    /// Flat block name and address range of every block, in scan order.
    pub configs: Vec<(String, BlockConfig)>,
    /// Assembled configuration bits.
    pub bitstream: FabricBitstream,
}

/// Generates every routing module into `sink` and assembles the bitstream.
///
/// Blocks are addressed in canonical scan order in both hierarchy modes, so
/// the address ranges do not depend on `options.compact`.
pub fn generate_routing(
    graph: &RrGraph,
    grid: &DeviceGrid,
    library: &MuxLibrary,
    protocol: ProtocolKind,
    selection: &RouteSelection,
    options: GenerateOptions,
    sink: &mut dyn NetlistSink,
) -> Result<GenerationReport, GenerateError> {
    if !is_unidirectional(graph) {
        return Err(InternalError::new("routing netlists need unidirectional channel wires").into());
    }

    let blocks = {
        let _timer = ScopedTimer::new("Build switch and connection blocks");
        collect_blocks(graph, grid)?
    };
    let num_switch_blocks = blocks
        .iter()
        .filter(|b| matches!(b, RoutingBlock::Switch(_)))
        .count();

    let _timer = ScopedTimer::new("Generate routing netlists");
    let netlist = NetlistOptions {
        naming: if options.compact {
            PortNaming::Relative
        } else {
            PortNaming::Absolute
        },
        explicit_port_mapping: options.explicit_port_mapping,
        protocol,
    };
    let mut allocator = ConfigAllocator::new(protocol);

    let (configs, num_block_modules) = if options.compact {
        let mut unique = UniqueModules::build(&blocks)?;
        size_unique_shapes(&mut unique, &blocks, library, &mut allocator)?;
        for shape in unique.shapes() {
            let scratch = shape.scratch.ok_or_else(|| {
                InternalError::new(format!("shape {} has no scratch range", shape.name))
            })?;
            let text = write_block_module(
                &shape.name,
                &blocks[shape.representative],
                &scratch,
                library,
                selection,
                &netlist,
            )?;
            sink.write_module(&format!("{}.v", shape.name), &text)?;
        }
        let configs = address_all_instances(&mut unique, &blocks, library, &mut allocator)?;
        (configs, unique.num_shapes())
    } else {
        let mut configs = Vec::with_capacity(blocks.len());
        for block in &blocks {
            let mut state = BlockState::default();
            state.count(count_block(block, library)?)?;
            let config = state.allocate(&mut allocator)?;
            let name = block.flat_name();
            let text = write_block_module(&name, block, &config, library, selection, &netlist)?;
            sink.write_module(&format!("{name}.v"), &text)?;
            configs.push(config);
        }
        (configs, blocks.len())
    };

    let num_channel_modules = write_channel_modules(graph, grid, options.compact, sink)?;

    let counter = allocator.state();
    let bitstream = FabricBitstream::assemble(
        &blocks,
        &configs,
        library,
        selection,
        protocol,
        counter.num_mem_bits,
    )?;
    sink.finish()?;

    log::info!(
        "Generated {} routing modules for {} blocks using {} configuration bits",
        num_block_modules + num_channel_modules,
        blocks.len(),
        counter.num_mem_bits
    );
    if protocol == ProtocolKind::MemoryBank {
        log::info!(
            "Memory bank: {} bit lines, {} word lines, {} reserved BL/WL",
            counter.num_bl,
            counter.num_wl,
            counter.reserved_blwl
        );
    }

    Ok(GenerationReport {
        num_switch_blocks,
        num_connection_blocks: blocks.len() - num_switch_blocks,
        num_channel_modules,
        num_block_modules,
        counter,
        configs: blocks
            .iter()
            .map(RoutingBlock::flat_name)
            .zip(configs)
            .collect(),
        bitstream,
    })
}

/// Writes one module per channel tile, or per distinct track pattern in a
/// compact hierarchy. Returns the number of modules written.
fn write_channel_modules(
    graph: &RrGraph,
    grid: &DeviceGrid,
    compact: bool,
    sink: &mut dyn NetlistSink,
) -> Result<usize, GenerateError> {
    let mut unique: HashMap<(ChanType, Vec<Direction>), usize> = HashMap::new();
    let mut per_chan: HashMap<ChanType, usize> = HashMap::new();
    let mut written = 0;
    for chan in ChanType::ALL {
        for x in 0..grid.width() {
            for y in 0..grid.height() {
                let tile = ChannelTile::new(chan, x, y);
                if !tile.in_bounds(grid.width(), grid.height()) {
                    continue;
                }
                let directions: Vec<Direction> = graph
                    .channel_tracks(tile)
                    .iter()
                    .flatten()
                    .map(|&n| graph.node(n).direction)
                    .collect();
                if directions.is_empty() {
                    continue;
                }
                let name = if compact {
                    let key = (chan, directions.clone());
                    if unique.contains_key(&key) {
                        continue;
                    }
                    let n = per_chan.entry(chan).or_default();
                    let name = format!("{chan}_{n}_");
                    *n += 1;
                    unique.insert(key, written);
                    name
                } else {
                    format!("{chan}_{x}__{y}_")
                };
                let text = write_channel_module(&name, tile, &directions);
                sink.write_module(&format!("{name}.v"), &text)?;
                written += 1;
            }
        }
    }
    Ok(written)
}
