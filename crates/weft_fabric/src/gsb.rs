//! Switch and connection blocks extracted from the routing graph.
//!
//! A switch block sits at the upper-right corner of tile `(x, y)` and sees up
//! to four channels plus the output pins of the blocks along each channel.
//! A connection block covers one channel tile and connects its tracks to the
//! input pins of the tiles on either side of it.
//!
//! Every driver of a block output is resolved to a [`DriverPort`] when the
//! block is built, so later stages never inspect node kinds again.

use crate::interconnect::{classify, DriverPort, Sink};
use std::collections::HashMap;
use weft_common::{InternalError, WeftResult};
use weft_rr::geometry::{sb_port_direction, sb_side_channel};
use weft_rr::{
    ChanType, ChannelTile, DeviceGrid, Direction, NodeKind, PortDirection, RrGraph, RrNodeId,
    RrSegmentId, Side,
};

/// A block pin seen from a switch or connection block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridPin {
    /// Pin node.
    pub node: RrNodeId,
    /// Tile column of the pin.
    pub x: u32,
    /// Tile row of the pin.
    pub y: u32,
    /// Tile side the pin is on.
    pub side: Side,
    /// Pin index within its block.
    pub ptc: u32,
}

/// A channel track on one side of a switch block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelEntry {
    /// Track node.
    pub node: RrNodeId,
    /// Whether the track enters or leaves the block.
    pub port: PortDirection,
    /// Segment type of the wire.
    pub segment: Option<RrSegmentId>,
    /// The wire continues on the opposite side.
    pub passing: bool,
}

/// One side of a switch block.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SbSide {
    /// Channel on this side, if it exists.
    pub channel: Option<ChannelTile>,
    /// Tracks by index.
    pub tracks: Vec<ChannelEntry>,
    /// Output pins of the blocks along the channel.
    pub opins: Vec<GridPin>,
}

/// A switch block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwitchBlock {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
    /// Sides, indexed by [`Side::index`].
    pub sides: [SbSide; 4],
    /// Outgoing tracks with their interconnect, side by side in track order.
    pub sinks: Vec<Sink>,
}

impl SwitchBlock {
    /// The given side.
    pub fn side(&self, side: Side) -> &SbSide {
        &self.sides[side.index()]
    }
}

/// A connection block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionBlock {
    /// Channel type.
    pub chan: ChanType,
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
    /// Channel tracks by index.
    pub tracks: Vec<RrNodeId>,
    /// Input pins on each side of the channel.
    pub ipin_sides: Vec<(Side, Vec<GridPin>)>,
    /// Input pins with their interconnect, side by side in pin order.
    pub sinks: Vec<Sink>,
}

impl ConnectionBlock {
    /// The block side its channel tracks are attached to.
    pub fn channel_side(&self) -> Side {
        match self.chan {
            ChanType::X => Side::Left,
            ChanType::Y => Side::Bottom,
        }
    }

    /// The channel tile this block sits on.
    pub fn channel(&self) -> ChannelTile {
        ChannelTile::new(self.chan, self.x, self.y)
    }
}

/// A switch or connection block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RoutingBlock {
    /// Switch block.
    Switch(SwitchBlock),
    /// Connection block.
    Connection(ConnectionBlock),
}

impl RoutingBlock {
    /// Block outputs.
    pub fn sinks(&self) -> &[Sink] {
        match self {
            RoutingBlock::Switch(sb) => &sb.sinks,
            RoutingBlock::Connection(cb) => &cb.sinks,
        }
    }

    /// Module name prefix: `sb`, `cbx` or `cby`.
    pub fn kind_prefix(&self) -> &'static str {
        match self {
            RoutingBlock::Switch(_) => "sb",
            RoutingBlock::Connection(cb) => match cb.chan {
                ChanType::X => "cbx",
                ChanType::Y => "cby",
            },
        }
    }

    /// Grid coordinate.
    pub fn coord(&self) -> (u32, u32) {
        match self {
            RoutingBlock::Switch(sb) => (sb.x, sb.y),
            RoutingBlock::Connection(cb) => (cb.x, cb.y),
        }
    }

    /// Module name of the block in a flat hierarchy, e.g. `sb_1__2_`.
    pub fn flat_name(&self) -> String {
        let (x, y) = self.coord();
        format!("{}_{x}__{y}_", self.kind_prefix())
    }
}

fn grid_pins(graph: &RrGraph, x: u32, y: u32, kind: NodeKind, side: Side) -> Vec<GridPin> {
    graph
        .pins_on_side(x, y, kind, side)
        .into_iter()
        .map(|node| GridPin {
            node,
            x,
            y,
            side,
            ptc: graph.node(node).ptc,
        })
        .collect()
}

/// Tracks of a channel tile, rejecting holes.
fn dense_tracks(graph: &RrGraph, tile: ChannelTile) -> WeftResult<Vec<RrNodeId>> {
    graph
        .channel_tracks(tile)
        .iter()
        .enumerate()
        .map(|(t, slot)| {
            slot.ok_or_else(|| {
                InternalError::new(format!(
                    "track {t} of {}({}, {}) has no node",
                    tile.chan, tile.x, tile.y
                ))
            })
        })
        .collect()
}

/// Output pins of the blocks on either side of an SB channel.
fn side_opins(graph: &RrGraph, tile: ChannelTile) -> Vec<GridPin> {
    let (below, above) = match tile.chan {
        ChanType::X => (
            (tile.x, tile.y, Side::Top),
            (tile.x, tile.y + 1, Side::Bottom),
        ),
        ChanType::Y => (
            (tile.x, tile.y, Side::Right),
            (tile.x + 1, tile.y, Side::Left),
        ),
    };
    let mut pins = grid_pins(graph, below.0, below.1, NodeKind::Opin, below.2);
    pins.extend(grid_pins(graph, above.0, above.1, NodeKind::Opin, above.2));
    pins
}

fn sb_side(graph: &RrGraph, grid: &DeviceGrid, x: u32, y: u32, side: Side) -> WeftResult<SbSide> {
    let (w, h) = (grid.width(), grid.height());
    let Some(tile) = sb_side_channel(x, y, side, w, h) else {
        return Ok(SbSide::default());
    };
    let nodes = dense_tracks(graph, tile)?;
    if nodes.is_empty() {
        return Ok(SbSide::default());
    }
    let opposite = sb_side_channel(x, y, side.opposite(), w, h)
        .map(|t| graph.channel_tracks(t))
        .unwrap_or(&[]);
    let tracks = nodes
        .iter()
        .enumerate()
        .map(|(t, &node)| {
            let direction = graph.node(node).direction;
            let port = sb_port_direction(side, direction).ok_or_else(|| {
                InternalError::new(format!(
                    "track {t} on the {side} side of switch block ({x}, {y}) is bidirectional"
                ))
            })?;
            Ok(ChannelEntry {
                node,
                port,
                segment: graph.node_segment(node),
                passing: opposite.get(t).copied().flatten() == Some(node),
            })
        })
        .collect::<WeftResult<Vec<_>>>()?;
    Ok(SbSide {
        channel: Some(tile),
        tracks,
        opins: side_opins(graph, tile),
    })
}

/// Extracts the switch block at `(x, y)`; `None` when it touches no channel.
pub fn build_switch_block(
    graph: &RrGraph,
    grid: &DeviceGrid,
    x: u32,
    y: u32,
) -> WeftResult<Option<SwitchBlock>> {
    let sides = [
        sb_side(graph, grid, x, y, Side::Top)?,
        sb_side(graph, grid, x, y, Side::Right)?,
        sb_side(graph, grid, x, y, Side::Bottom)?,
        sb_side(graph, grid, x, y, Side::Left)?,
    ];
    if sides.iter().all(|s| s.channel.is_none()) {
        return Ok(None);
    }

    let mut ports: HashMap<RrNodeId, DriverPort> = HashMap::new();
    for side in Side::ALL {
        let s = &sides[side.index()];
        for (index, entry) in s.tracks.iter().enumerate() {
            if entry.port == PortDirection::In {
                ports.insert(entry.node, DriverPort::Track { side, index });
            }
        }
        for (index, pin) in s.opins.iter().enumerate() {
            ports.entry(pin.node).or_insert(DriverPort::GridPin { side, index });
        }
    }

    let mut sinks = Vec::new();
    for side in Side::ALL {
        for (index, entry) in sides[side.index()].tracks.iter().enumerate() {
            if entry.port != PortDirection::Out {
                continue;
            }
            let passing = entry.passing.then_some(DriverPort::Track {
                side: side.opposite(),
                index,
            });
            let (drivers, interconnect) =
                classify(graph, entry.node, passing, |n| ports.get(&n).copied(), (x, y))?;
            sinks.push(Sink {
                node: entry.node,
                side,
                index,
                drivers,
                interconnect,
            });
        }
    }
    Ok(Some(SwitchBlock { x, y, sides, sinks }))
}

/// Extracts the connection block on channel tile `(chan, x, y)`.
///
/// `None` when the channel does not exist or no input pin faces it.
pub fn build_connection_block(
    graph: &RrGraph,
    grid: &DeviceGrid,
    chan: ChanType,
    x: u32,
    y: u32,
) -> WeftResult<Option<ConnectionBlock>> {
    let tile = ChannelTile::new(chan, x, y);
    if !tile.in_bounds(grid.width(), grid.height()) {
        return Ok(None);
    }
    let tracks = dense_tracks(graph, tile)?;
    if tracks.is_empty() {
        return Ok(None);
    }
    let candidates = match chan {
        ChanType::X => [
            (Side::Top, (x, y + 1, Side::Bottom)),
            (Side::Bottom, (x, y, Side::Top)),
        ],
        ChanType::Y => [
            (Side::Right, (x + 1, y, Side::Left)),
            (Side::Left, (x, y, Side::Right)),
        ],
    };
    let ipin_sides: Vec<(Side, Vec<GridPin>)> = candidates
        .into_iter()
        .map(|(cb_side, (px, py, pin_side))| {
            (cb_side, grid_pins(graph, px, py, NodeKind::Ipin, pin_side))
        })
        .filter(|(_, pins)| !pins.is_empty())
        .collect();
    if ipin_sides.is_empty() {
        log::debug!("Skipping {chan}({x}, {y}) connection block without input pins");
        return Ok(None);
    }

    let channel_side = match chan {
        ChanType::X => Side::Left,
        ChanType::Y => Side::Bottom,
    };
    let ports: HashMap<RrNodeId, DriverPort> = tracks
        .iter()
        .enumerate()
        .map(|(index, &node)| {
            (
                node,
                DriverPort::Track {
                    side: channel_side,
                    index,
                },
            )
        })
        .collect();

    let mut sinks = Vec::new();
    for (side, pins) in &ipin_sides {
        for (index, pin) in pins.iter().enumerate() {
            let (drivers, interconnect) =
                classify(graph, pin.node, None, |n| ports.get(&n).copied(), (x, y))?;
            sinks.push(Sink {
                node: pin.node,
                side: *side,
                index,
                drivers,
                interconnect,
            });
        }
    }
    Ok(Some(ConnectionBlock {
        chan,
        x,
        y,
        tracks,
        ipin_sides,
        sinks,
    }))
}

/// All routing blocks in canonical scan order.
///
/// Switch blocks come first, `x` outer and `y` inner. Connection blocks
/// follow channel type by channel type, every X block before any Y block,
/// each again `x` outer and `y` inner.
pub fn collect_blocks(graph: &RrGraph, grid: &DeviceGrid) -> WeftResult<Vec<RoutingBlock>> {
    let (w, h) = (grid.width(), grid.height());
    let mut blocks = Vec::new();
    for x in 0..w.saturating_sub(1) {
        for y in 0..h.saturating_sub(1) {
            if let Some(sb) = build_switch_block(graph, grid, x, y)? {
                blocks.push(RoutingBlock::Switch(sb));
            }
        }
    }
    for chan in ChanType::ALL {
        for x in 0..w {
            for y in 0..h {
                if let Some(cb) = build_connection_block(graph, grid, chan, x, y)? {
                    blocks.push(RoutingBlock::Connection(cb));
                }
            }
        }
    }
    Ok(blocks)
}

/// Whether every channel wire of `graph` is unidirectional.
pub fn is_unidirectional(graph: &RrGraph) -> bool {
    graph
        .nodes()
        .filter(|(_, n)| matches!(n.kind, NodeKind::Chan(_)))
        .all(|(_, n)| n.direction != Direction::Bi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interconnect::Interconnect;
    use crate::test_util::{arch, island_grid};
    use weft_rr::build_rr_graph;

    fn device(w: u32, h: u32) -> (DeviceGrid, RrGraph) {
        let grid = island_grid(w, h);
        let graph = build_rr_graph(&grid, &arch(4, 1)).unwrap();
        (grid, graph)
    }

    #[test]
    fn corner_switch_block_has_two_sides() {
        let (grid, graph) = device(4, 4);
        let sb = build_switch_block(&graph, &grid, 0, 0).unwrap().unwrap();
        assert!(sb.side(Side::Top).channel.is_some());
        assert!(sb.side(Side::Right).channel.is_some());
        assert!(sb.side(Side::Bottom).channel.is_none());
        assert!(sb.side(Side::Left).channel.is_none());
        // half of the tracks on each present side leave the block
        assert_eq!(sb.sinks.len(), 4);
        assert!(sb.sinks.iter().all(|s| s.side == Side::Top || s.side == Side::Right));
    }

    #[test]
    fn every_output_is_classified() {
        let (grid, graph) = device(5, 5);
        let blocks = collect_blocks(&graph, &grid).unwrap();
        assert!(!blocks.is_empty());
        for block in &blocks {
            for sink in block.sinks() {
                match &sink.interconnect {
                    Interconnect::Mux { inputs, .. } => {
                        assert_eq!(inputs.len(), sink.drivers.len());
                        assert!(inputs.len() >= 2);
                    }
                    Interconnect::Short(_) => assert_eq!(sink.drivers.len(), 1),
                    Interconnect::Undriven => assert!(sink.drivers.is_empty()),
                    Interconnect::PassThrough(_) => {}
                }
            }
        }
    }

    #[test]
    fn scan_order_is_x_outer() {
        let (grid, graph) = device(4, 4);
        let blocks = collect_blocks(&graph, &grid).unwrap();
        let sbs: Vec<(u32, u32)> = blocks
            .iter()
            .filter(|b| matches!(b, RoutingBlock::Switch(_)))
            .map(RoutingBlock::coord)
            .collect();
        assert_eq!(sbs[0], (0, 0));
        assert_eq!(sbs[1], (0, 1));
        assert_eq!(sbs.len(), 9);
        let first_cb = blocks
            .iter()
            .position(|b| matches!(b, RoutingBlock::Connection(_)))
            .unwrap();
        assert!(blocks[first_cb..]
            .iter()
            .all(|b| matches!(b, RoutingBlock::Connection(_))));

        // every cbx precedes every cby, each x outer
        let prefixes: Vec<&str> = blocks[first_cb..].iter().map(RoutingBlock::kind_prefix).collect();
        let first_cby = prefixes.iter().position(|&p| p == "cby").unwrap();
        assert!(prefixes[..first_cby].iter().all(|&p| p == "cbx"));
        assert!(prefixes[first_cby..].iter().all(|&p| p == "cby"));
        let cbx: Vec<(u32, u32)> = blocks[first_cb..first_cb + first_cby]
            .iter()
            .map(RoutingBlock::coord)
            .collect();
        let mut sorted = cbx.clone();
        sorted.sort();
        assert_eq!(cbx, sorted);
    }

    #[test]
    fn connection_block_sides() {
        let (grid, graph) = device(4, 4);
        let cb = build_connection_block(&graph, &grid, ChanType::X, 1, 1)
            .unwrap()
            .unwrap();
        let sides: Vec<Side> = cb.ipin_sides.iter().map(|(s, _)| *s).collect();
        assert_eq!(sides, vec![Side::Top, Side::Bottom]);
        assert_eq!(cb.tracks.len(), 4);
        assert_eq!(cb.channel_side(), Side::Left);
        // every input pin is driven by tracks of this channel only
        for sink in &cb.sinks {
            for d in &sink.drivers {
                assert!(cb.tracks.contains(d));
            }
        }
    }

    #[test]
    fn out_of_range_connection_block_is_none() {
        let (grid, graph) = device(4, 4);
        assert!(build_connection_block(&graph, &grid, ChanType::X, 0, 1)
            .unwrap()
            .is_none());
        assert!(build_connection_block(&graph, &grid, ChanType::Y, 1, 3)
            .unwrap()
            .is_none());
    }

    #[test]
    fn base_graph_is_unidirectional() {
        let (_, graph) = device(4, 4);
        assert!(is_unidirectional(&graph));
    }

    #[test]
    fn passing_wires_pass_through() {
        let grid = island_grid(6, 4);
        let graph = build_rr_graph(&grid, &arch(4, 2)).unwrap();
        let blocks = collect_blocks(&graph, &grid).unwrap();
        let passing = blocks
            .iter()
            .flat_map(|b| b.sinks())
            .filter(|s| matches!(s.interconnect, Interconnect::PassThrough(_)))
            .count();
        assert!(passing > 0);
    }
}
