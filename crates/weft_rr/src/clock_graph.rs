//! Appends the clock network to an existing routing-resource graph.
//!
//! Every routable channel tile receives one track per (tree, level,
//! direction, pin) whose level runs in that channel type. Clock tracks sit
//! above the tile's regular tracks. Edges follow the clock fan-out rule: a
//! track drives the same track in the next tile along its direction, and
//! the next level's tracks of the same pin in both directions at the switch
//! block it runs into.

use crate::clock::ClockNetwork;
use crate::clock_lookup::{ClockNodeKey, ClockSpatialLookup};
use crate::geometry::{channel_end_switch_blocks, sb_output_direction, sb_side_channel, ChannelTile};
use crate::graph::RrGraph;
use crate::grid::DeviceGrid;
use crate::ids::{ClockLevelId, RrNodeId};
use crate::types::{ChanType, Direction, NodeKind, Side};
use weft_common::{ExecStatus, InternalError, ScopedTimer, WeftResult};
use weft_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink, Location};

/// More than one clock tree is configured.
pub const UNSUPPORTED_CLOCK_TREES: DiagnosticCode = DiagnosticCode::new(Category::Error, 301);
/// No clock tree is configured.
pub const NO_CLOCK_TREE: DiagnosticCode = DiagnosticCode::new(Category::Warning, 302);

/// Channel tiles that receive clock tracks, in creation order.
///
/// X channels are visited row by row, Y channels column by column. Tiles
/// inside a multi-tile block are skipped unless channels run through blocks.
fn clock_tiles(grid: &DeviceGrid, through_channel: bool, chan: ChanType) -> Vec<ChannelTile> {
    let (w, h) = (grid.width(), grid.height());
    let mut tiles = Vec::new();
    match chan {
        ChanType::X => {
            for y in 0..h.saturating_sub(1) {
                for x in 1..w.saturating_sub(1) {
                    if through_channel || grid.is_chanx_exist(x, y) {
                        tiles.push(ChannelTile::new(chan, x, y));
                    }
                }
            }
        }
        ChanType::Y => {
            for x in 0..w.saturating_sub(1) {
                for y in 1..h.saturating_sub(1) {
                    if through_channel || grid.is_chany_exist(x, y) {
                        tiles.push(ChannelTile::new(chan, x, y));
                    }
                }
            }
        }
    }
    tiles
}

/// Number of nodes [`append_clock_rr_graph`] will create.
pub fn estimate_clock_rr_graph_num_nodes(
    grid: &DeviceGrid,
    through_channel: bool,
    clk: &ClockNetwork,
) -> usize {
    let mut total = 0usize;
    for chan in ChanType::ALL {
        let per_tile: u32 = clk
            .trees()
            .flat_map(|tree| clk.levels(tree).map(move |level| (tree, level)))
            .map(|(tree, level)| clk.num_tracks(tree, level, chan))
            .sum();
        total += clock_tiles(grid, through_channel, chan).len() * per_tile as usize;
    }
    total
}

/// Adds the clock network's nodes and edges to `graph`.
///
/// With no clock tree this is a no-op. More than one tree is reported as
/// [`UNSUPPORTED_CLOCK_TREES`] and returns [`ExecStatus::FatalError`] with
/// the graph untouched. Every created node is registered in `lookup`.
pub fn append_clock_rr_graph(
    graph: &mut RrGraph,
    lookup: &mut ClockSpatialLookup,
    grid: &DeviceGrid,
    through_channel: bool,
    clk: &ClockNetwork,
    sink: &DiagnosticSink,
) -> WeftResult<ExecStatus> {
    match clk.num_trees() {
        0 => {
            log::info!("No clock tree defined, skipping the clock network");
            sink.emit(Diagnostic::new(
                NO_CLOCK_TREE,
                "no clock tree is defined, the clock network is left empty",
                Location::config("clock_network.trees"),
            ));
            return Ok(ExecStatus::Success);
        }
        1 => {}
        n => {
            sink.emit(
                Diagnostic::new(
                    UNSUPPORTED_CLOCK_TREES,
                    format!("{n} clock trees are defined, but only one is supported"),
                    Location::config("clock_network.trees"),
                )
                .with_help("merge the clocks into a single tree with a larger width"),
            );
            return Ok(ExecStatus::FatalError);
        }
    }

    let _timer = ScopedTimer::new("Append clock network");
    let orig_nodes = graph.num_nodes();
    let orig_edges = graph.num_edges();
    let estimate = estimate_clock_rr_graph_num_nodes(grid, through_channel, clk);
    graph.reserve_nodes(estimate);
    lookup.reserve(estimate);

    for chan in ChanType::ALL {
        for tile in clock_tiles(grid, through_channel, chan) {
            add_tile_nodes(graph, lookup, clk, tile)?;
        }
    }
    if graph.num_nodes() != orig_nodes + estimate {
        return Err(InternalError::new(format!(
            "clock network created {} nodes, expected {estimate}",
            graph.num_nodes() - orig_nodes
        )));
    }

    let added_edges = add_clock_edges(graph, lookup, grid, through_channel, clk)?;
    let added_nodes = graph.num_nodes() - orig_nodes;
    let percent = if orig_nodes == 0 {
        0.0
    } else {
        added_nodes as f64 * 100.0 / orig_nodes as f64
    };
    log::info!(
        "Appended {added_nodes} clock nodes (+{percent:.1}%) and {added_edges} clock edges ({} edges in total, {orig_edges} before)",
        graph.num_edges()
    );
    Ok(ExecStatus::Success)
}

fn add_tile_nodes(
    graph: &mut RrGraph,
    lookup: &mut ClockSpatialLookup,
    clk: &ClockNetwork,
    tile: ChannelTile,
) -> WeftResult<()> {
    let mut ptc = graph.channel_width(tile);
    let cost_index = graph.chan_cost_index(tile.chan, clk.default_segment());
    for tree in clk.trees() {
        for level in clk.levels(tree) {
            for direction in Direction::UNIDIR {
                for pin in clk.pins(tree, level, tile.chan, direction) {
                    let node = graph.create_node(tile.x, tile.y, NodeKind::Chan(tile.chan), ptc)?;
                    graph.set_node_direction(node, direction);
                    graph.set_node_capacity(node, 1);
                    graph.set_node_cost_index(node, cost_index);
                    lookup.add_node(
                        ClockNodeKey {
                            x: tile.x,
                            y: tile.y,
                            tree,
                            level,
                            pin,
                            direction,
                        },
                        node,
                    )?;
                    ptc += 1;
                }
            }
        }
    }
    Ok(())
}

/// Creates the edges of every clock node, sealing them tile by tile.
fn add_clock_edges(
    graph: &mut RrGraph,
    lookup: &ClockSpatialLookup,
    grid: &DeviceGrid,
    through_channel: bool,
    clk: &ClockNetwork,
) -> WeftResult<usize> {
    let mut edges = 0;
    let switch = clk.default_switch();
    for chan in ChanType::ALL {
        for tile in clock_tiles(grid, through_channel, chan) {
            for tree in clk.trees() {
                for level in clk.levels(tree) {
                    for direction in Direction::UNIDIR {
                        for pin in clk.pins(tree, level, chan, direction) {
                            let key = ClockNodeKey {
                                x: tile.x,
                                y: tile.y,
                                tree,
                                level,
                                pin,
                                direction,
                            };
                            let driver = lookup.find_node(&key).ok_or_else(|| {
                                InternalError::new(format!(
                                    "no clock node for {key:?} at {} ({}, {})",
                                    chan, tile.x, tile.y
                                ))
                            })?;
                            for dst in clock_fan_out(lookup, grid, clk, tile, &key) {
                                graph.create_edge(driver, dst, switch);
                            }
                        }
                    }
                }
            }
            edges += graph.build_edges();
        }
    }
    Ok(edges)
}

/// Destinations of the clock node `key` sitting in `tile`.
///
/// The node runs into one switch block. Leaving it on the opposite side it
/// continues straight at the same level; on the two perpendicular sides it
/// turns into the next level.
fn clock_fan_out(
    lookup: &ClockSpatialLookup,
    grid: &DeviceGrid,
    clk: &ClockNetwork,
    tile: ChannelTile,
    key: &ClockNodeKey,
) -> Vec<RrNodeId> {
    let [low, high] = channel_end_switch_blocks(tile);
    let ((sx, sy), entry) = match key.direction {
        Direction::Inc => high,
        Direction::Dec | Direction::Bi => low,
    };
    let find = |side: Side, level: ClockLevelId, direction: Direction| {
        let next = sb_side_channel(sx, sy, side, grid.width(), grid.height())?;
        lookup.find_node(&ClockNodeKey {
            x: next.x,
            y: next.y,
            tree: key.tree,
            level,
            pin: key.pin,
            direction,
        })
    };

    let mut out = Vec::with_capacity(3);
    out.extend(find(entry.opposite(), key.level, key.direction));
    if let Some(next_level) = clk.next_level(key.tree, key.level) {
        let turns = match tile.chan {
            ChanType::X => [Side::Top, Side::Bottom],
            ChanType::Y => [Side::Right, Side::Left],
        };
        for side in turns {
            out.extend(find(side, next_level, sb_output_direction(side)));
        }
    }
    out
}
