//! Builds the base routing-resource graph of a tileable island-style fabric.
//!
//! Tracks are unidirectional: even tracks run towards increasing
//! coordinates and odd tracks towards decreasing ones, and track pair
//! `(2k, 2k+1)` uses segment `k mod num_segments`. A wire of length `L`
//! spans `L` channel tiles, with starting points staggered per track pair.
//! Wires are driven only at their starting switch block, where they are fed
//! by every wire that ends there (disjoint pattern: same track straight on,
//! the same track pair when turning) and by `fc_out` output pins per
//! adjacent block side. Input pins see `fc_in` tracks of their channel.

use crate::geometry::{
    channel_end_switch_blocks, pin_channel, sb_output_direction, sb_port_direction,
    sb_side_channel, ChannelTile, PortDirection,
};
use crate::graph::{RrGraph, RrSegment, RrSwitch};
use crate::grid::DeviceGrid;
use crate::ids::{RrNodeId, RrSegmentId, RrSwitchId};
use crate::types::{
    ChanType, Direction, NodeKind, Side, IPIN_COST_INDEX, OPIN_COST_INDEX, SINK_COST_INDEX,
    SOURCE_COST_INDEX,
};
use weft_common::{InternalError, ScopedTimer, WeftResult};
use weft_config::FabricConfig;

/// Name of the hard-wired switch used between pins and their source/sink.
pub const DELAYLESS_SWITCH: &str = "__delayless__";

/// Parameters of the base routing architecture.
#[derive(Debug, Clone)]
pub struct RoutingArch {
    /// Tracks per channel.
    pub channel_width: u32,
    /// Tracks per input pin.
    pub fc_in: u32,
    /// Tracks per output pin at each channel end.
    pub fc_out: u32,
    /// Whether channels cross multi-tile blocks.
    pub through_channel: bool,
    /// Segment types as `(name, length)`.
    pub segments: Vec<(String, u32)>,
    /// Switch types as `(name, mux model)`.
    pub switches: Vec<(String, String)>,
    /// Switch for wire-to-wire and pin-to-wire connections.
    pub sb_switch: String,
    /// Switch for wire-to-input-pin connections.
    pub cb_switch: String,
}

impl RoutingArch {
    /// Extracts the routing architecture from a validated configuration.
    pub fn from_config(config: &FabricConfig) -> Self {
        let routing = &config.routing;
        Self {
            channel_width: routing.channel_width,
            fc_in: routing.fc_in,
            fc_out: routing.fc_out,
            through_channel: config.device.through_channel,
            segments: routing
                .segments
                .iter()
                .map(|s| (s.name.clone(), s.length))
                .collect(),
            switches: routing
                .switches
                .iter()
                .map(|s| (s.name.clone(), s.model.clone()))
                .collect(),
            sb_switch: routing.sb_switch.clone(),
            cb_switch: routing.cb_switch.clone(),
        }
    }
}

struct Switches {
    sb: RrSwitchId,
    cb: RrSwitchId,
    delayless: RrSwitchId,
}

/// Builds the routing-resource graph for `grid`.
pub fn build_rr_graph(grid: &DeviceGrid, arch: &RoutingArch) -> WeftResult<RrGraph> {
    let _timer = ScopedTimer::new("Build routing resource graph");
    if arch.channel_width == 0 || arch.channel_width % 2 != 0 {
        return Err(InternalError::new(format!(
            "unidirectional routing needs an even channel width, got {}",
            arch.channel_width
        )));
    }

    let mut graph = RrGraph::new();
    for (name, length) in &arch.segments {
        graph.add_segment(RrSegment {
            name: name.clone(),
            length: *length,
        });
    }
    for (name, model) in &arch.switches {
        graph.add_switch(RrSwitch {
            name: name.clone(),
            model: Some(model.clone()),
        });
    }
    let delayless = graph.add_switch(RrSwitch {
        name: DELAYLESS_SWITCH.to_string(),
        model: None,
    });
    let find = |graph: &RrGraph, name: &str| {
        graph
            .find_switch(name)
            .ok_or_else(|| InternalError::new(format!("switch '{name}' is not defined")))
    };
    let switches = Switches {
        sb: find(&graph, &arch.sb_switch)?,
        cb: find(&graph, &arch.cb_switch)?,
        delayless,
    };

    create_block_nodes(&mut graph, grid, &switches)?;
    for chan in ChanType::ALL {
        create_channel_nodes(&mut graph, grid, arch, chan)?;
    }
    create_switch_block_edges(&mut graph, grid, arch, switches.sb);
    create_opin_edges(&mut graph, grid, arch, switches.sb);
    create_ipin_edges(&mut graph, grid, arch, switches.cb);
    graph.build_edges();

    log::info!(
        "Built routing resource graph: {} nodes, {} edges",
        graph.num_nodes(),
        graph.num_edges()
    );
    Ok(graph)
}

/// Tile on `side` of a block whose lower-left tile is `(x, y)`.
fn side_tile(x: u32, y: u32, width: u32, height: u32, side: Side) -> (u32, u32) {
    match side {
        Side::Top => (x, y + height - 1),
        Side::Right => (x + width - 1, y),
        Side::Bottom | Side::Left => (x, y),
    }
}

fn create_block_nodes(graph: &mut RrGraph, grid: &DeviceGrid, switches: &Switches) -> WeftResult<()> {
    let roots: Vec<_> = grid.block_roots().collect();
    for (x, y, ty) in roots {
        let block = grid.block_type(ty).clone();
        if block.inputs == 0 && block.outputs == 0 {
            continue;
        }
        let sides = grid.pin_sides(x, y);
        let source = graph.create_node(x, y, NodeKind::Source, 0)?;
        graph.set_node_cost_index(source, SOURCE_COST_INDEX);
        let sink = graph.create_node(x, y, NodeKind::Sink, 0)?;
        graph.set_node_cost_index(sink, SINK_COST_INDEX);

        for pin in 0..block.inputs {
            let side = sides[pin as usize % sides.len()];
            let (tx, ty) = side_tile(x, y, block.width, block.height, side);
            let ipin = graph.create_pin_node(tx, ty, NodeKind::Ipin, side, pin)?;
            graph.set_node_cost_index(ipin, IPIN_COST_INDEX);
            graph.create_edge(ipin, sink, switches.delayless);
        }
        for pin in 0..block.outputs {
            let side = sides[pin as usize % sides.len()];
            let (tx, ty) = side_tile(x, y, block.width, block.height, side);
            let opin = graph.create_pin_node(tx, ty, NodeKind::Opin, side, block.inputs + pin)?;
            graph.set_node_cost_index(opin, OPIN_COST_INDEX);
            graph.create_edge(source, opin, switches.delayless);
        }
    }
    Ok(())
}

fn channel_exists(grid: &DeviceGrid, through_channel: bool, tile: ChannelTile) -> bool {
    through_channel
        || match tile.chan {
            ChanType::X => grid.is_chanx_exist(tile.x, tile.y),
            ChanType::Y => grid.is_chany_exist(tile.x, tile.y),
        }
}

/// Existing channel tiles of one row (X) or column (Y), in increasing order.
fn channel_lines(grid: &DeviceGrid, through_channel: bool, chan: ChanType) -> Vec<Vec<ChannelTile>> {
    let (w, h) = (grid.width(), grid.height());
    let (lines, positions) = match chan {
        ChanType::X => (0..h - 1, 1..w - 1),
        ChanType::Y => (0..w - 1, 1..h - 1),
    };
    lines
        .map(|line| {
            positions
                .clone()
                .map(|pos| match chan {
                    ChanType::X => ChannelTile::new(chan, pos, line),
                    ChanType::Y => ChannelTile::new(chan, line, pos),
                })
                .filter(|&tile| channel_exists(grid, through_channel, tile))
                .collect()
        })
        .collect()
}

fn create_channel_nodes(
    graph: &mut RrGraph,
    grid: &DeviceGrid,
    arch: &RoutingArch,
    chan: ChanType,
) -> WeftResult<()> {
    let num_segments = arch.segments.len().max(1) as u32;
    for line in channel_lines(grid, arch.through_channel, chan) {
        for track in 0..arch.channel_width {
            let pair = track / 2;
            let segment = RrSegmentId::from_raw(pair % num_segments);
            let length = arch
                .segments
                .get(segment.index())
                .map_or(1, |(_, len)| *len)
                .max(1);
            let stagger = pair % length;
            let direction = if track % 2 == 0 {
                Direction::Inc
            } else {
                Direction::Dec
            };

            let mut current: Option<(RrNodeId, u32)> = None;
            let mut prev_pos: Option<u32> = None;
            for tile in &line {
                let pos = match chan {
                    ChanType::X => tile.x,
                    ChanType::Y => tile.y,
                };
                let contiguous = prev_pos.is_some_and(|p| p + 1 == pos);
                let boundary = (pos - 1 + stagger) % length == 0;
                let full = current.is_some_and(|(_, len)| len >= length);
                match current {
                    Some((node, len)) if contiguous && !boundary && !full => {
                        let (xh, yh) = match chan {
                            ChanType::X => (pos, tile.y),
                            ChanType::Y => (tile.x, pos),
                        };
                        graph.set_node_extent(node, xh, yh)?;
                        current = Some((node, len + 1));
                    }
                    _ => {
                        let node = graph.create_node(tile.x, tile.y, NodeKind::Chan(chan), track)?;
                        graph.set_node_direction(node, direction);
                        graph.set_node_capacity(node, 1);
                        graph.set_node_cost_index(node, graph.chan_cost_index(chan, segment));
                        current = Some((node, 1));
                    }
                }
                prev_pos = Some(pos);
            }
        }
    }
    Ok(())
}

/// A channel wire seen from one side of a switch block.
#[derive(Clone, Copy, Debug)]
struct SideTrack {
    node: RrNodeId,
    port: PortDirection,
    passing: bool,
}

fn side_tracks(graph: &RrGraph, x: u32, y: u32, side: Side, grid: &DeviceGrid, width: u32) -> Vec<Option<SideTrack>> {
    let Some(tile) = sb_side_channel(x, y, side, grid.width(), grid.height()) else {
        return vec![None; width as usize];
    };
    let opposite = sb_side_channel(x, y, side.opposite(), grid.width(), grid.height())
        .map(|t| graph.channel_tracks(t))
        .unwrap_or(&[]);
    let tracks = graph.channel_tracks(tile);
    (0..width as usize)
        .map(|t| {
            let node = tracks.get(t).copied().flatten()?;
            let port = sb_port_direction(side, graph.node(node).direction)?;
            let passing = opposite.get(t).copied().flatten() == Some(node);
            Some(SideTrack {
                node,
                port,
                passing,
            })
        })
        .collect()
}

fn create_switch_block_edges(graph: &mut RrGraph, grid: &DeviceGrid, arch: &RoutingArch, switch: RrSwitchId) {
    let width = arch.channel_width;
    for x in 0..grid.width() - 1 {
        for y in 0..grid.height() - 1 {
            let sides: Vec<Vec<Option<SideTrack>>> = Side::ALL
                .iter()
                .map(|&side| side_tracks(graph, x, y, side, grid, width))
                .collect();
            let mut edges = Vec::new();
            for from in Side::ALL {
                for (t, entry) in sides[from.index()].iter().enumerate() {
                    let Some(src) = entry else { continue };
                    if src.port != PortDirection::In || src.passing {
                        continue;
                    }
                    for to in Side::ALL.into_iter().filter(|&s| s != from) {
                        let src_dir = graph.node(src.node).direction;
                        let target = if src_dir == sb_output_direction(to) {
                            t
                        } else {
                            t ^ 1
                        };
                        let Some(Some(dst)) = sides[to.index()].get(target) else {
                            continue;
                        };
                        if dst.port == PortDirection::Out && !dst.passing {
                            edges.push((src.node, dst.node));
                        }
                    }
                }
            }
            for (src, dst) in edges {
                graph.create_edge(src, dst, switch);
            }
        }
    }
}

/// Wires driven at the switch block `(x, y)` on `side`, in track order.
fn starting_tracks(graph: &RrGraph, grid: &DeviceGrid, arch: &RoutingArch, x: u32, y: u32, side: Side) -> Vec<RrNodeId> {
    side_tracks(graph, x, y, side, grid, arch.channel_width)
        .into_iter()
        .flatten()
        .filter(|t| t.port == PortDirection::Out && !t.passing)
        .map(|t| t.node)
        .collect()
}

fn create_opin_edges(graph: &mut RrGraph, grid: &DeviceGrid, arch: &RoutingArch, switch: RrSwitchId) {
    let opins: Vec<(RrNodeId, u32, u32, Side, u32)> = graph
        .nodes()
        .filter(|(_, n)| n.kind == NodeKind::Opin)
        .filter_map(|(id, n)| n.side.map(|side| (id, n.xlow, n.ylow, side, n.ptc)))
        .collect();
    for (opin, x, y, side, ptc) in opins {
        let Some(tile) = pin_channel(x, y, side) else { continue };
        if !tile.in_bounds(grid.width(), grid.height()) {
            continue;
        }
        for ((sx, sy), sb_side) in channel_end_switch_blocks(tile) {
            let candidates = starting_tracks(graph, grid, arch, sx, sy, sb_side);
            if candidates.is_empty() {
                continue;
            }
            let take = (arch.fc_out as usize).min(candidates.len());
            let start = (ptc as usize * take) % candidates.len();
            for k in 0..take {
                let dst = candidates[(start + k) % candidates.len()];
                graph.create_edge(opin, dst, switch);
            }
        }
    }
}

fn create_ipin_edges(graph: &mut RrGraph, grid: &DeviceGrid, arch: &RoutingArch, switch: RrSwitchId) {
    let ipins: Vec<(RrNodeId, u32, u32, Side, u32)> = graph
        .nodes()
        .filter(|(_, n)| n.kind == NodeKind::Ipin)
        .filter_map(|(id, n)| n.side.map(|side| (id, n.xlow, n.ylow, side, n.ptc)))
        .collect();
    let width = arch.channel_width;
    let step = (width / arch.fc_in.max(1)).max(1);
    for (ipin, x, y, side, ptc) in ipins {
        let Some(tile) = pin_channel(x, y, side) else { continue };
        if !tile.in_bounds(grid.width(), grid.height()) {
            continue;
        }
        let tracks = graph.channel_tracks(tile).to_vec();
        let mut chosen: Vec<u32> = Vec::new();
        for k in 0..arch.fc_in {
            let t = (ptc + k * step) % width;
            if !chosen.contains(&t) {
                chosen.push(t);
            }
        }
        for t in chosen {
            if let Some(Some(track)) = tracks.get(t as usize) {
                graph.create_edge(*track, ipin, switch);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{arch, block, island_grid};

    #[test]
    fn every_channel_tile_has_full_width() {
        let grid = island_grid(5, 5);
        let g = build_rr_graph(&grid, &arch(4, 1)).unwrap();
        for y in 0..4 {
            for x in 1..4 {
                assert_eq!(g.channel_width(ChannelTile::new(ChanType::X, x, y)), 4);
            }
        }
        for x in 0..4 {
            for y in 1..4 {
                assert_eq!(g.channel_width(ChannelTile::new(ChanType::Y, x, y)), 4);
            }
        }
    }

    #[test]
    fn even_tracks_increase_odd_tracks_decrease() {
        let grid = island_grid(4, 4);
        let g = build_rr_graph(&grid, &arch(4, 1)).unwrap();
        let tracks = g.channel_tracks(ChannelTile::new(ChanType::X, 1, 1));
        for (t, node) in tracks.iter().enumerate() {
            let dir = g.node(node.unwrap()).direction;
            assert_eq!(dir, if t % 2 == 0 { Direction::Inc } else { Direction::Dec });
        }
    }

    #[test]
    fn long_wires_span_several_tiles() {
        let grid = island_grid(6, 4);
        let g = build_rr_graph(&grid, &arch(4, 2)).unwrap();
        let row: Vec<_> = (1..5)
            .map(|x| g.channel_tracks(ChannelTile::new(ChanType::X, x, 1))[0].unwrap())
            .collect();
        // track pair 0 has no stagger: wires (1..2) and (3..4)
        assert_eq!(row[0], row[1]);
        assert_ne!(row[1], row[2]);
        assert_eq!(row[2], row[3]);
        let node = g.node(row[0]);
        assert_eq!((node.xlow, node.xhigh), (1, 2));
    }

    #[test]
    fn passing_wires_have_no_drivers_mid_span() {
        let grid = island_grid(6, 4);
        let g = build_rr_graph(&grid, &arch(4, 2)).unwrap();
        let wire = g.channel_tracks(ChannelTile::new(ChanType::X, 1, 1))[0].unwrap();
        assert_eq!((g.node(wire).xlow, g.node(wire).xhigh), (1, 2));
        // every driver sits at the starting switch block (0,1), which has no left side
        assert!(!g.fan_in(wire).is_empty());
        for driver in g.drivers(wire) {
            let n = g.node(driver);
            match n.kind {
                NodeKind::Opin => assert_eq!((n.xlow, n.ylow, n.side), (1, 1, Some(Side::Top))),
                NodeKind::Chan(ChanType::Y) => assert_eq!(n.xlow, 0),
                other => panic!("unexpected driver kind {other}"),
            }
        }
    }

    #[test]
    fn ipins_see_fc_in_tracks() {
        let grid = island_grid(4, 4);
        let g = build_rr_graph(&grid, &arch(4, 1)).unwrap();
        for (id, node) in g.nodes() {
            if node.kind == NodeKind::Ipin {
                assert_eq!(g.fan_in(id).len(), 2, "ipin {id} at ({}, {})", node.xlow, node.ylow);
                for d in g.drivers(id) {
                    assert!(matches!(g.node(d).kind, NodeKind::Chan(_)));
                }
            }
        }
    }

    #[test]
    fn tall_block_splits_channel() {
        let mut grid = DeviceGrid::new(
            5,
            5,
            vec![block("io", 1, 1, 1), block("ram", 2, 1, 2)],
        );
        let ram = grid.find_block_type("ram").unwrap();
        grid.place_block(2, 1, ram).unwrap();
        let g = build_rr_graph(&grid, &arch(2, 1)).unwrap();
        assert_eq!(g.channel_width(ChannelTile::new(ChanType::X, 2, 1)), 0);
        assert_eq!(g.channel_width(ChannelTile::new(ChanType::X, 2, 2)), 2);

        let mut through = arch(2, 1);
        through.through_channel = true;
        let g = build_rr_graph(&grid, &through).unwrap();
        assert_eq!(g.channel_width(ChannelTile::new(ChanType::X, 2, 1)), 2);
    }

    #[test]
    fn odd_width_is_rejected() {
        let grid = island_grid(4, 4);
        assert!(build_rr_graph(&grid, &arch(3, 1)).is_err());
    }
}
