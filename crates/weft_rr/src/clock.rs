//! Read-only model of the programmable clock network.
//!
//! A clock tree is a sequence of levels, root first. Each level runs in one
//! channel type and carries `width` clock pins in each unidirectional
//! direction. Level `L` drives level `L + 1` of the same tree through a turn
//! into the perpendicular channel.

use crate::graph::RrGraph;
use crate::ids::{ClockLevelId, ClockPinId, ClockTreeId, RrSegmentId, RrSwitchId};
use crate::types::{ChanType, Direction};
use weft_common::{InternalError, WeftResult};
use weft_config::{ChannelAxis, FabricConfig};

/// One level of a clock tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockLevel {
    /// Channel type the level's tracks run in.
    pub chan: ChanType,
}

/// A clock tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockTree {
    /// Tree name.
    pub name: String,
    /// Clock pins carried by every level, per direction.
    pub width: u32,
    /// Levels, root first.
    pub levels: Vec<ClockLevel>,
}

/// The clock trees of a device plus the segment and switch their tracks use.
#[derive(Debug, Clone)]
pub struct ClockNetwork {
    default_segment: RrSegmentId,
    default_switch: RrSwitchId,
    trees: Vec<ClockTree>,
}

impl ClockNetwork {
    /// Creates an empty network whose tracks use the given segment and switch.
    pub fn new(default_segment: RrSegmentId, default_switch: RrSwitchId) -> Self {
        Self {
            default_segment,
            default_switch,
            trees: Vec::new(),
        }
    }

    /// Builds the clock network of a validated configuration.
    ///
    /// The segment and switch names are resolved against `graph`.
    pub fn from_config(config: &FabricConfig, graph: &RrGraph) -> WeftResult<Self> {
        let segment_name = config.clock_segment();
        let segment = graph.find_segment(segment_name).ok_or_else(|| {
            InternalError::new(format!("clock segment '{segment_name}' is not in the routing graph"))
        })?;
        let switch_name = config.clock_switch();
        let switch = graph.find_switch(switch_name).ok_or_else(|| {
            InternalError::new(format!("clock switch '{switch_name}' is not in the routing graph"))
        })?;

        let mut network = ClockNetwork::new(segment, switch);
        for tree in &config.clock_network.trees {
            let levels = tree
                .level_axes()
                .into_iter()
                .map(|axis| ClockLevel {
                    chan: match axis {
                        ChannelAxis::X => ChanType::X,
                        ChannelAxis::Y => ChanType::Y,
                    },
                })
                .collect();
            network.add_tree(ClockTree {
                name: tree.name.clone(),
                width: tree.width,
                levels,
            });
        }
        Ok(network)
    }

    /// Adds a tree and returns its ID.
    pub fn add_tree(&mut self, tree: ClockTree) -> ClockTreeId {
        let id = ClockTreeId::from_raw(self.trees.len() as u32);
        self.trees.push(tree);
        id
    }

    /// Number of clock trees.
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// IDs of all trees.
    pub fn trees(&self) -> impl Iterator<Item = ClockTreeId> {
        (0..self.trees.len() as u32).map(ClockTreeId::from_raw)
    }

    /// Returns the tree with the given ID.
    pub fn tree(&self, id: ClockTreeId) -> &ClockTree {
        &self.trees[id.index()]
    }

    /// IDs of the levels of a tree, root first.
    pub fn levels(&self, tree: ClockTreeId) -> impl Iterator<Item = ClockLevelId> {
        (0..self.tree(tree).levels.len() as u32).map(ClockLevelId::from_raw)
    }

    /// Pins of a level in the given channel type and direction.
    ///
    /// Empty when the level runs in the other channel type.
    pub fn pins(
        &self,
        tree: ClockTreeId,
        level: ClockLevelId,
        chan: ChanType,
        _direction: Direction,
    ) -> impl Iterator<Item = ClockPinId> {
        let t = self.tree(tree);
        let count = match t.levels.get(level.index()) {
            Some(l) if l.chan == chan => t.width,
            _ => 0,
        };
        (0..count).map(ClockPinId::from_raw)
    }

    /// Tracks a level occupies in one channel tile of type `chan`, both directions.
    pub fn num_tracks(&self, tree: ClockTreeId, level: ClockLevelId, chan: ChanType) -> u32 {
        let t = self.tree(tree);
        match t.levels.get(level.index()) {
            Some(l) if l.chan == chan => 2 * t.width,
            _ => 0,
        }
    }

    /// The level driven by `level`, if any.
    pub fn next_level(&self, tree: ClockTreeId, level: ClockLevelId) -> Option<ClockLevelId> {
        let next = level.as_raw() + 1;
        ((next as usize) < self.tree(tree).levels.len()).then(|| ClockLevelId::from_raw(next))
    }

    /// Segment used by clock tracks.
    pub fn default_segment(&self) -> RrSegmentId {
        self.default_segment
    }

    /// Switch used by clock edges.
    pub fn default_switch(&self) -> RrSwitchId {
        self.default_switch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_level() -> (ClockNetwork, ClockTreeId) {
        let mut clk = ClockNetwork::new(RrSegmentId::from_raw(0), RrSwitchId::from_raw(0));
        let tree = clk.add_tree(ClockTree {
            name: "clk".to_string(),
            width: 3,
            levels: vec![ClockLevel { chan: ChanType::X }, ClockLevel { chan: ChanType::Y }],
        });
        (clk, tree)
    }

    #[test]
    fn tracks_only_in_the_level_channel() {
        let (clk, tree) = two_level();
        let root = ClockLevelId::from_raw(0);
        assert_eq!(clk.num_tracks(tree, root, ChanType::X), 6);
        assert_eq!(clk.num_tracks(tree, root, ChanType::Y), 0);
        assert_eq!(clk.pins(tree, root, ChanType::X, Direction::Dec).count(), 3);
        assert_eq!(clk.pins(tree, root, ChanType::Y, Direction::Inc).count(), 0);
    }

    #[test]
    fn next_level_stops_at_leaf() {
        let (clk, tree) = two_level();
        let levels: Vec<_> = clk.levels(tree).collect();
        assert_eq!(levels.len(), 2);
        assert_eq!(clk.next_level(tree, levels[0]), Some(levels[1]));
        assert_eq!(clk.next_level(tree, levels[1]), None);
    }

    #[test]
    fn from_config_resolves_names() {
        let config = weft_config::load_config_from_str(
            r#"
[device]
name = "t"
width = 4
height = 4

[routing]
channel_width = 4

[[routing.segments]]
name = "L1"
length = 1

[[routing.segments]]
name = "L4"
length = 4

[clock_network]
default_segment = "L4"

[[clock_network.trees]]
name = "clk"
width = 2
levels = ["y", "x", "y"]
"#,
        )
        .unwrap();
        let grid = crate::DeviceGrid::from_config(&config).unwrap();
        let graph =
            crate::build_rr_graph(&grid, &crate::RoutingArch::from_config(&config)).unwrap();
        let clk = ClockNetwork::from_config(&config, &graph).unwrap();
        assert_eq!(clk.num_trees(), 1);
        assert_eq!(clk.default_segment(), graph.find_segment("L4").unwrap());
        assert_eq!(clk.default_switch(), graph.find_switch("sb_mux").unwrap());
        let tree = clk.trees().next().unwrap();
        assert_eq!(clk.tree(tree).levels[0].chan, ChanType::Y);
        assert_eq!(clk.tree(tree).levels.len(), 3);
    }
}
