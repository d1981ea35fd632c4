//! Routing-resource graph of an island-style FPGA fabric.
//!
//! This crate owns the device grid, the routing-resource graph (nodes for
//! pins and channel wires, switch-annotated edges, spatial indices), a
//! builder for the base routing architecture, and the clock network that is
//! appended on top of it.
//!
//! The graph is append-only: nodes are created through [`RrGraph`] setters
//! and edges are buffered until [`RrGraph::build_edges`] seals them.
//! Coordinates follow the VPR convention described in [`geometry`].

#![warn(missing_docs)]

pub mod builder;
pub mod clock;
pub mod clock_graph;
pub mod clock_lookup;
pub mod geometry;
pub mod graph;
pub mod grid;
pub mod ids;
pub mod types;

#[cfg(test)]
mod test_util;

pub use builder::{build_rr_graph, RoutingArch, DELAYLESS_SWITCH};
pub use clock::{ClockLevel, ClockNetwork, ClockTree};
pub use clock_graph::{
    append_clock_rr_graph, estimate_clock_rr_graph_num_nodes, NO_CLOCK_TREE,
    UNSUPPORTED_CLOCK_TREES,
};
pub use clock_lookup::{ClockNodeKey, ClockSpatialLookup};
pub use geometry::{ChannelTile, PortDirection};
pub use graph::{RrEdge, RrGraph, RrNode, RrSegment, RrSwitch};
pub use grid::{BlockType, DeviceGrid, GridTile};
pub use ids::*;
pub use types::*;
