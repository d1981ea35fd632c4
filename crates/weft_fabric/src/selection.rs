//! Routed predecessors used to pick multiplexer paths.
//!
//! A selection maps a routed node to the node that drives it in the routing
//! result. It is read from JSON as an object of decimal node ids:
//!
//! ```json
//! { "42": 17, "43": 42 }
//! ```

use std::collections::HashMap;
use std::path::Path;
use weft_common::{InternalError, WeftResult};
use weft_rr::RrNodeId;

use crate::error::GenerateError;

/// Routed predecessor of each used node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RouteSelection {
    prev: HashMap<RrNodeId, RrNodeId>,
}

impl RouteSelection {
    /// An empty selection; every multiplexer keeps its default pattern.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `node` is driven by `prev`.
    pub fn insert(&mut self, node: RrNodeId, prev: RrNodeId) {
        self.prev.insert(node, prev);
    }

    /// Routed predecessor of `node`.
    pub fn prev(&self, node: RrNodeId) -> Option<RrNodeId> {
        self.prev.get(&node).copied()
    }

    /// Position of the routed predecessor of `node` in `drivers`, or `None`
    /// when the node is not routed.
    ///
    /// A routed node whose predecessor is not one of its drivers is an
    /// internal error; `block` names the block it sits in.
    pub fn path_id(
        &self,
        node: RrNodeId,
        drivers: &[RrNodeId],
        block: &str,
    ) -> WeftResult<Option<usize>> {
        let Some(prev) = self.prev(node) else {
            return Ok(None);
        };
        drivers
            .iter()
            .position(|&d| d == prev)
            .map(Some)
            .ok_or_else(|| {
                InternalError::new(format!(
                    "node {node} in {block} is routed from node {prev}, which does not drive it"
                ))
            })
    }

    /// Number of routed nodes.
    pub fn len(&self) -> usize {
        self.prev.len()
    }

    /// Returns `true` if nothing is routed.
    pub fn is_empty(&self) -> bool {
        self.prev.is_empty()
    }

    /// Parses a selection from JSON text.
    pub fn from_json(text: &str) -> Result<Self, GenerateError> {
        let raw: HashMap<u32, u32> = serde_json::from_str(text)?;
        Ok(Self {
            prev: raw
                .into_iter()
                .map(|(node, prev)| (RrNodeId::from_raw(node), RrNodeId::from_raw(prev)))
                .collect(),
        })
    }

    /// Reads a selection from a JSON file.
    pub fn load(path: &Path) -> Result<Self, GenerateError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}
