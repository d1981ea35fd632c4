//! `weft stats`: graph and configuration sizes of a device.

use serde::Serialize;
use weft_config::FabricConfig;
use weft_diagnostics::DiagnosticSink;
use weft_fabric::{
    collect_blocks, count_block, prepare_device, ConfigAllocator, MuxLibrary, RoutingBlock,
    UniqueModules,
};

use crate::{GlobalArgs, ReportFormat, StatsArgs};

/// Sizes reported by `weft stats`.
#[derive(Debug, Serialize)]
pub struct FabricStats {
    /// Device name.
    pub device: String,
    /// Grid width in tiles.
    pub width: u32,
    /// Grid height in tiles.
    pub height: u32,
    /// Routing graph nodes, clock nodes included.
    pub num_nodes: usize,
    /// Routing graph edges, clock edges included.
    pub num_edges: usize,
    /// Nodes added by the clock network.
    pub num_clock_nodes: usize,
    /// Switch blocks.
    pub num_switch_blocks: usize,
    /// Connection blocks.
    pub num_connection_blocks: usize,
    /// Distinct block shapes.
    pub num_unique_blocks: usize,
    /// Configuration bits of the whole fabric.
    pub num_config_bits: u32,
    /// Reserved bit/word lines, for memory-bank fabrics.
    pub num_reserved_blwl: u32,
}

/// Computes the statistics of `config`. `None` when the clock network was
/// rejected; the reason is in `sink`.
pub fn collect(
    config: &FabricConfig,
    sink: &DiagnosticSink,
) -> Result<Option<FabricStats>, Box<dyn std::error::Error>> {
    let device = prepare_device(config, sink)?;
    if !device.clock_status.is_success() {
        return Ok(None);
    }
    let library = MuxLibrary::from_config(&config.technology);
    let blocks = collect_blocks(&device.graph, &device.grid)?;
    let unique = UniqueModules::build(&blocks)?;
    let mut allocator = ConfigAllocator::new(config.technology.protocol);
    for block in &blocks {
        allocator.allocate(count_block(block, &library)?);
    }
    let num_switch_blocks = blocks
        .iter()
        .filter(|b| matches!(b, RoutingBlock::Switch(_)))
        .count();
    let counter = allocator.state();

    Ok(Some(FabricStats {
        device: config.device.name.clone(),
        width: device.grid.width(),
        height: device.grid.height(),
        num_nodes: device.graph.num_nodes(),
        num_edges: device.graph.num_edges(),
        num_clock_nodes: device.clock_lookup.len(),
        num_switch_blocks,
        num_connection_blocks: blocks.len() - num_switch_blocks,
        num_unique_blocks: unique.num_shapes(),
        num_config_bits: counter.num_mem_bits,
        num_reserved_blwl: counter.reserved_blwl,
    }))
}

fn render_text(stats: &FabricStats) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} ({}x{})\n",
        stats.device, stats.width, stats.height
    ));
    out.push_str(&format!(
        "  rr graph:          {} nodes, {} edges\n",
        stats.num_nodes, stats.num_edges
    ));
    out.push_str(&format!("  clock nodes:       {}\n", stats.num_clock_nodes));
    out.push_str(&format!(
        "  routing blocks:    {} switch, {} connection ({} unique)\n",
        stats.num_switch_blocks, stats.num_connection_blocks, stats.num_unique_blocks
    ));
    out.push_str(&format!("  configuration:     {} bits\n", stats.num_config_bits));
    if stats.num_reserved_blwl > 0 {
        out.push_str(&format!("  reserved BL/WL:    {}\n", stats.num_reserved_blwl));
    }
    out
}

/// Runs `weft stats`.
pub fn run(args: &StatsArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = global.load_config()?;
    let sink = DiagnosticSink::new();
    let stats = collect(&config, &sink)?;
    global.render_diagnostics(&sink);
    let Some(stats) = stats else {
        return Ok(1);
    };
    match args.format {
        ReportFormat::Text => print!("{}", render_text(&stats)),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
    }
    Ok(0)
}
