//! Classification of block outputs into wires and multiplexers.

use serde::Serialize;
use weft_common::{InternalError, WeftResult};
use weft_rr::{RrGraph, RrNodeId, Side};

/// A signal source inside a switch or connection block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DriverPort {
    /// The `index`-th grid pin on `side` of the block.
    GridPin {
        /// Block side.
        side: Side,
        /// Position in the side's pin list.
        index: usize,
    },
    /// Track `index` of the channel on `side` of the block.
    Track {
        /// Block side.
        side: Side,
        /// Track index.
        index: usize,
    },
}

/// How a block output is driven.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Interconnect {
    /// A wire crossing the block; the output is the given input.
    PassThrough(DriverPort),
    /// Nothing drives the output.
    Undriven,
    /// Exactly one driver.
    Short(DriverPort),
    /// Two or more drivers selected by a multiplexer.
    Mux {
        /// Inputs in fan-in order; position is the path id.
        inputs: Vec<DriverPort>,
        /// Multiplexer model name.
        model: String,
    },
}

impl Interconnect {
    /// Multiplexer model and fan-in, for multiplexers.
    pub fn mux(&self) -> Option<(&str, usize)> {
        match self {
            Interconnect::Mux { inputs, model } => Some((model.as_str(), inputs.len())),
            _ => None,
        }
    }
}

/// A block output with its resolved interconnect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sink {
    /// Driven node.
    pub node: RrNodeId,
    /// Block side of the output.
    pub side: Side,
    /// Track index (switch blocks) or pin position (connection blocks).
    pub index: usize,
    /// Driving nodes in fan-in order.
    pub drivers: Vec<RrNodeId>,
    /// How the output is driven.
    pub interconnect: Interconnect,
}

/// Classifies the output `node` of the block at `(x, y)`.
///
/// `passing` is the opposite-side input when `node` is a wire crossing the
/// block. `resolve` maps a node to its port in the block, or `None` when the
/// node is not part of it.
pub fn classify(
    graph: &RrGraph,
    node: RrNodeId,
    passing: Option<DriverPort>,
    resolve: impl Fn(RrNodeId) -> Option<DriverPort>,
    (x, y): (u32, u32),
) -> WeftResult<(Vec<RrNodeId>, Interconnect)> {
    let drivers: Vec<RrNodeId> = graph.drivers(node).collect();

    if let Some(input) = passing {
        if let Some(local) = drivers
            .iter()
            .find(|&&d| matches!(resolve(d), Some(DriverPort::Track { .. })))
        {
            return Err(InternalError::new(format!(
                "node {node} crosses the block at ({x}, {y}) but is driven by track {local} of that block"
            )));
        }
        return Ok((drivers, Interconnect::PassThrough(input)));
    }

    let inputs = drivers
        .iter()
        .map(|&d| {
            resolve(d).ok_or_else(|| {
                let n = graph.node(d);
                InternalError::new(format!(
                    "{} node {d} at ({}, {}) drives node {node} but is not part of the block at ({x}, {y})",
                    n.kind, n.xlow, n.ylow
                ))
            })
        })
        .collect::<WeftResult<Vec<_>>>()?;

    let interconnect = match inputs.len() {
        0 => Interconnect::Undriven,
        1 => Interconnect::Short(inputs[0]),
        _ => {
            let edge = graph.edge(graph.fan_in(node)[0]);
            let switch = graph.switch(edge.switch);
            let model = switch.model.clone().ok_or_else(|| {
                InternalError::new(format!(
                    "switch '{}' driving node {node} at ({x}, {y}) has no multiplexer model",
                    switch.name
                ))
            })?;
            Interconnect::Mux { inputs, model }
        }
    };
    Ok((drivers, interconnect))
}
