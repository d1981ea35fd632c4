//! The routing-resource graph.
//!
//! Nodes and edges live in flat arenas indexed by [`RrNodeId`] and
//! [`RrEdgeId`]. The graph is also its own builder: nodes are created and
//! configured through setters, and edges are buffered by
//! [`create_edge`](RrGraph::create_edge) until
//! [`build_edges`](RrGraph::build_edges) seals them into the per-node fan-in
//! and fan-out lists. Pending edges are invisible to every query except
//! [`num_edges`](RrGraph::num_edges). Nothing is ever removed.

use crate::geometry::ChannelTile;
use crate::ids::{RrEdgeId, RrNodeId, RrSegmentId, RrSwitchId};
use crate::types::{ChanType, Direction, NodeKind, Side, CHANX_COST_INDEX_START};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use weft_common::{InternalError, WeftResult};

/// A routing-resource node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RrNode {
    /// Node kind.
    pub kind: NodeKind,
    /// Lowest column covered.
    pub xlow: u32,
    /// Lowest row covered.
    pub ylow: u32,
    /// Highest column covered.
    pub xhigh: u32,
    /// Highest row covered.
    pub yhigh: u32,
    /// Track index for channels, pin index for pins, class index otherwise.
    pub ptc: u32,
    /// Signal direction; [`Direction::Bi`] for everything but unidirectional wires.
    pub direction: Direction,
    /// Tile side of a pin.
    pub side: Option<Side>,
    /// How many nets may use the node.
    pub capacity: u32,
    /// Index into the router's cost table.
    pub cost_index: u32,
}

/// A directed, switch-annotated edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RrEdge {
    /// Driving node.
    pub src: RrNodeId,
    /// Driven node.
    pub dst: RrNodeId,
    /// Switch implementing the connection.
    pub switch: RrSwitchId,
}

/// A wire segment type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RrSegment {
    /// Segment name.
    pub name: String,
    /// Number of tiles a wire spans.
    pub length: u32,
}

/// A programmable switch type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RrSwitch {
    /// Switch name.
    pub name: String,
    /// Multiplexer model implementing the switch; `None` for hard-wired connections.
    pub model: Option<String>,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum LookupKey {
    Chan { x: u32, y: u32, chan: ChanType },
    Pin { x: u32, y: u32, kind: PinKind, side: Side },
    Class { x: u32, y: u32, source: bool },
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum PinKind {
    Input,
    Output,
}

/// The routing-resource graph.
#[derive(Debug, Clone, Default)]
pub struct RrGraph {
    nodes: Vec<RrNode>,
    edges: Vec<RrEdge>,
    pending: Vec<RrEdge>,
    fan_in: Vec<Vec<RrEdgeId>>,
    fan_out: Vec<Vec<RrEdgeId>>,
    segments: Vec<RrSegment>,
    switches: Vec<RrSwitch>,
    lookup: HashMap<LookupKey, Vec<Option<RrNodeId>>>,
}

impl RrGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    // -- segments and switches --

    /// Adds a segment type and returns its ID.
    pub fn add_segment(&mut self, segment: RrSegment) -> RrSegmentId {
        let id = RrSegmentId::from_raw(self.segments.len() as u32);
        self.segments.push(segment);
        id
    }

    /// Adds a switch type and returns its ID.
    pub fn add_switch(&mut self, switch: RrSwitch) -> RrSwitchId {
        let id = RrSwitchId::from_raw(self.switches.len() as u32);
        self.switches.push(switch);
        id
    }

    /// Returns the segment with the given ID.
    pub fn segment(&self, id: RrSegmentId) -> &RrSegment {
        &self.segments[id.index()]
    }

    /// Returns the switch with the given ID.
    pub fn switch(&self, id: RrSwitchId) -> &RrSwitch {
        &self.switches[id.index()]
    }

    /// Looks up a segment by name.
    pub fn find_segment(&self, name: &str) -> Option<RrSegmentId> {
        self.segments
            .iter()
            .position(|s| s.name == name)
            .map(|i| RrSegmentId::from_raw(i as u32))
    }

    /// Looks up a switch by name.
    pub fn find_switch(&self, name: &str) -> Option<RrSwitchId> {
        self.switches
            .iter()
            .position(|s| s.name == name)
            .map(|i| RrSwitchId::from_raw(i as u32))
    }

    /// Number of segment types.
    pub fn num_segments(&self) -> usize {
        self.segments.len()
    }

    /// Cost index of a channel wire of the given type and segment.
    pub fn chan_cost_index(&self, chan: ChanType, segment: RrSegmentId) -> u32 {
        match chan {
            ChanType::X => CHANX_COST_INDEX_START + segment.as_raw(),
            ChanType::Y => {
                CHANX_COST_INDEX_START + self.segments.len() as u32 + segment.as_raw()
            }
        }
    }

    /// Segment of a channel node, recovered from its cost index.
    pub fn node_segment(&self, id: RrNodeId) -> Option<RrSegmentId> {
        let node = self.node(id);
        let base = match node.kind {
            NodeKind::Chan(ChanType::X) => CHANX_COST_INDEX_START,
            NodeKind::Chan(ChanType::Y) => CHANX_COST_INDEX_START + self.segments.len() as u32,
            _ => return None,
        };
        node.cost_index
            .checked_sub(base)
            .filter(|&seg| (seg as usize) < self.segments.len())
            .map(RrSegmentId::from_raw)
    }

    // -- node construction --

    /// Reserves storage for at least `additional` more nodes.
    pub fn reserve_nodes(&mut self, additional: usize) {
        self.nodes.reserve(additional);
        self.fan_in.reserve(additional);
        self.fan_out.reserve(additional);
    }

    /// Creates a channel, source or sink node covering the single tile `(x, y)`.
    ///
    /// The node starts with direction [`Direction::Bi`], capacity 1 and cost
    /// index 0; use the setters to configure it. Channel nodes are
    /// registered in the spatial index under track `ptc`.
    pub fn create_node(&mut self, x: u32, y: u32, kind: NodeKind, ptc: u32) -> WeftResult<RrNodeId> {
        let key = match kind {
            NodeKind::Chan(chan) => LookupKey::Chan { x, y, chan },
            NodeKind::Source => LookupKey::Class { x, y, source: true },
            NodeKind::Sink => LookupKey::Class { x, y, source: false },
            NodeKind::Ipin | NodeKind::Opin => {
                return Err(InternalError::new(format!(
                    "{kind} node at ({x}, {y}) needs a side, use create_pin_node"
                )))
            }
        };
        self.push_node(key, x, y, kind, ptc, None)
    }

    /// Creates an input or output pin on `side` of tile `(x, y)`.
    pub fn create_pin_node(
        &mut self,
        x: u32,
        y: u32,
        kind: NodeKind,
        side: Side,
        ptc: u32,
    ) -> WeftResult<RrNodeId> {
        let pin = match kind {
            NodeKind::Ipin => PinKind::Input,
            NodeKind::Opin => PinKind::Output,
            other => {
                return Err(InternalError::new(format!(
                    "{other} node at ({x}, {y}) is not a pin"
                )))
            }
        };
        let key = LookupKey::Pin {
            x,
            y,
            kind: pin,
            side,
        };
        self.push_node(key, x, y, kind, ptc, Some(side))
    }

    fn push_node(
        &mut self,
        key: LookupKey,
        x: u32,
        y: u32,
        kind: NodeKind,
        ptc: u32,
        side: Option<Side>,
    ) -> WeftResult<RrNodeId> {
        let id = RrNodeId::from_raw(self.nodes.len() as u32);
        self.register(key, ptc, id)?;
        self.nodes.push(RrNode {
            kind,
            xlow: x,
            ylow: y,
            xhigh: x,
            yhigh: y,
            ptc,
            direction: Direction::Bi,
            side,
            capacity: 1,
            cost_index: 0,
        });
        self.fan_in.push(Vec::new());
        self.fan_out.push(Vec::new());
        Ok(id)
    }

    fn register(&mut self, key: LookupKey, ptc: u32, id: RrNodeId) -> WeftResult<()> {
        let slots = self.lookup.entry(key).or_default();
        let idx = ptc as usize;
        if slots.len() <= idx {
            slots.resize(idx + 1, None);
        }
        if let Some(existing) = slots[idx] {
            return Err(InternalError::new(format!(
                "index {ptc} of {key:?} already holds node {existing}, cannot add node {id}"
            )));
        }
        slots[idx] = Some(id);
        Ok(())
    }

    /// Extends a channel node along its channel up to `(xhigh, yhigh)`.
    ///
    /// Every newly covered tile indexes the node under the same track.
    pub fn set_node_extent(&mut self, id: RrNodeId, xhigh: u32, yhigh: u32) -> WeftResult<()> {
        let node = self.node(id).clone();
        let chan = node.kind.chan_type().ok_or_else(|| {
            InternalError::new(format!("node {id} ({}) is not a channel wire", node.kind))
        })?;
        let along_channel = match chan {
            ChanType::X => yhigh == node.ylow && xhigh >= node.xhigh,
            ChanType::Y => xhigh == node.xlow && yhigh >= node.yhigh,
        };
        if !along_channel {
            return Err(InternalError::new(format!(
                "cannot extend {} node {id} from ({}, {}) to ({xhigh}, {yhigh})",
                node.kind, node.xlow, node.ylow
            )));
        }
        let tiles: Vec<(u32, u32)> = match chan {
            ChanType::X => (node.xhigh + 1..=xhigh).map(|x| (x, node.ylow)).collect(),
            ChanType::Y => (node.yhigh + 1..=yhigh).map(|y| (node.xlow, y)).collect(),
        };
        for (x, y) in tiles {
            self.register(LookupKey::Chan { x, y, chan }, node.ptc, id)?;
        }
        let node = &mut self.nodes[id.index()];
        node.xhigh = xhigh;
        node.yhigh = yhigh;
        Ok(())
    }

    /// Sets the signal direction of a node.
    pub fn set_node_direction(&mut self, id: RrNodeId, direction: Direction) {
        self.nodes[id.index()].direction = direction;
    }

    /// Sets the capacity of a node.
    pub fn set_node_capacity(&mut self, id: RrNodeId, capacity: u32) {
        self.nodes[id.index()].capacity = capacity;
    }

    /// Sets the cost index of a node.
    pub fn set_node_cost_index(&mut self, id: RrNodeId, cost_index: u32) {
        self.nodes[id.index()].cost_index = cost_index;
    }

    // -- edge construction --

    /// Buffers an edge. It becomes visible after the next [`build_edges`](Self::build_edges).
    pub fn create_edge(&mut self, src: RrNodeId, dst: RrNodeId, switch: RrSwitchId) {
        self.pending.push(RrEdge { src, dst, switch });
    }

    /// Reserves storage for at least `additional` more edges.
    pub fn reserve_edges(&mut self, additional: usize) {
        self.pending.reserve(additional);
        self.edges.reserve(additional);
    }

    /// Seals all buffered edges into the fan-in and fan-out lists.
    ///
    /// Fan-in order is edge creation order; it determines multiplexer input
    /// order downstream. Returns the number of edges sealed.
    pub fn build_edges(&mut self) -> usize {
        let pending = std::mem::take(&mut self.pending);
        let count = pending.len();
        for edge in pending {
            let id = RrEdgeId::from_raw(self.edges.len() as u32);
            self.fan_out[edge.src.index()].push(id);
            self.fan_in[edge.dst.index()].push(id);
            self.edges.push(edge);
        }
        count
    }

    // -- queries --

    /// Number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges, sealed or pending.
    pub fn num_edges(&self) -> usize {
        self.edges.len() + self.pending.len()
    }

    /// Number of edges still waiting for [`build_edges`](Self::build_edges).
    pub fn num_pending_edges(&self) -> usize {
        self.pending.len()
    }

    /// Returns the node with the given ID.
    pub fn node(&self, id: RrNodeId) -> &RrNode {
        &self.nodes[id.index()]
    }

    /// Iterates over all nodes with their IDs.
    pub fn nodes(&self) -> impl Iterator<Item = (RrNodeId, &RrNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (RrNodeId::from_raw(i as u32), n))
    }

    /// Returns the sealed edge with the given ID.
    pub fn edge(&self, id: RrEdgeId) -> &RrEdge {
        &self.edges[id.index()]
    }

    /// Sealed incoming edges of a node, in creation order.
    pub fn fan_in(&self, id: RrNodeId) -> &[RrEdgeId] {
        &self.fan_in[id.index()]
    }

    /// Sealed outgoing edges of a node, in creation order.
    pub fn fan_out(&self, id: RrNodeId) -> &[RrEdgeId] {
        &self.fan_out[id.index()]
    }

    /// Driving nodes of a node, in fan-in order.
    pub fn drivers(&self, id: RrNodeId) -> impl Iterator<Item = RrNodeId> + '_ {
        self.fan_in(id).iter().map(|&e| self.edge(e).src)
    }

    /// Channel nodes indexing tile `(x, y)`, by track.
    ///
    /// Holes (tracks without a node at this tile) are `None`.
    pub fn channel_tracks(&self, tile: ChannelTile) -> &[Option<RrNodeId>] {
        self.lookup
            .get(&LookupKey::Chan {
                x: tile.x,
                y: tile.y,
                chan: tile.chan,
            })
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of tracks used at a channel tile (highest track index plus one).
    pub fn channel_width(&self, tile: ChannelTile) -> u32 {
        self.channel_tracks(tile).len() as u32
    }

    /// Finds a pin node.
    pub fn find_pin(&self, x: u32, y: u32, kind: NodeKind, side: Side, ptc: u32) -> Option<RrNodeId> {
        let pin = match kind {
            NodeKind::Ipin => PinKind::Input,
            NodeKind::Opin => PinKind::Output,
            _ => return None,
        };
        self.lookup
            .get(&LookupKey::Pin {
                x,
                y,
                kind: pin,
                side,
            })
            .and_then(|slots| slots.get(ptc as usize).copied().flatten())
    }

    /// Pin nodes of a kind on one side of a tile, by pin index.
    pub fn pins_on_side(&self, x: u32, y: u32, kind: NodeKind, side: Side) -> Vec<RrNodeId> {
        let pin = match kind {
            NodeKind::Ipin => PinKind::Input,
            NodeKind::Opin => PinKind::Output,
            _ => return Vec::new(),
        };
        self.lookup
            .get(&LookupKey::Pin {
                x,
                y,
                kind: pin,
                side,
            })
            .map(|slots| slots.iter().flatten().copied().collect())
            .unwrap_or_default()
    }
}
