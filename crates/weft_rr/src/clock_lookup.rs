//! Spatial index of clock nodes.

use crate::ids::{ClockLevelId, ClockPinId, ClockTreeId, RrNodeId};
use crate::types::Direction;
use std::collections::HashMap;
use weft_common::{InternalError, WeftResult};

/// Identifies a clock node: tile, tree, level, pin and direction.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ClockNodeKey {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
    /// Clock tree.
    pub tree: ClockTreeId,
    /// Level within the tree.
    pub level: ClockLevelId,
    /// Clock pin.
    pub pin: ClockPinId,
    /// Track direction.
    pub direction: Direction,
}

/// Maps clock node keys to routing-graph nodes. Every key is inserted at most once.
#[derive(Debug, Clone, Default)]
pub struct ClockSpatialLookup {
    nodes: HashMap<ClockNodeKey, RrNodeId>,
}

impl ClockSpatialLookup {
    /// Creates an empty lookup.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves room for `additional` more entries.
    pub fn reserve(&mut self, additional: usize) {
        self.nodes.reserve(additional);
    }

    /// Registers a clock node. A key that is already present is an internal error.
    pub fn add_node(&mut self, key: ClockNodeKey, node: RrNodeId) -> WeftResult<()> {
        if let Some(existing) = self.nodes.insert(key, node) {
            return Err(InternalError::new(format!(
                "clock node {key:?} registered twice (nodes {existing} and {node})"
            )));
        }
        Ok(())
    }

    /// Finds a clock node.
    pub fn find_node(&self, key: &ClockNodeKey) -> Option<RrNodeId> {
        self.nodes.get(key).copied()
    }

    /// Iterates over all registered clock nodes in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&ClockNodeKey, RrNodeId)> {
        self.nodes.iter().map(|(k, &v)| (k, v))
    }

    /// Number of registered clock nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if no clock node is registered.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
