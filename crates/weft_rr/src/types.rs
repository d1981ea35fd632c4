//! Shared enums describing routing resources.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Cost index of SOURCE nodes.
pub const SOURCE_COST_INDEX: u32 = 0;
/// Cost index of SINK nodes.
pub const SINK_COST_INDEX: u32 = 1;
/// Cost index of output pins.
pub const OPIN_COST_INDEX: u32 = 2;
/// Cost index of input pins.
pub const IPIN_COST_INDEX: u32 = 3;
/// First channel cost index. X channels use `start + segment`, Y channels
/// use `start + num_segments + segment`.
pub const CHANX_COST_INDEX_START: u32 = 4;

/// Routing channel orientation.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum ChanType {
    /// Horizontal channel.
    X,
    /// Vertical channel.
    Y,
}

impl ChanType {
    /// Both channel types, X first.
    pub const ALL: [ChanType; 2] = [ChanType::X, ChanType::Y];

    /// The other channel type.
    pub fn perpendicular(self) -> ChanType {
        match self {
            ChanType::X => ChanType::Y,
            ChanType::Y => ChanType::X,
        }
    }

    /// Name prefix used in netlists (`chanx` / `chany`).
    pub fn prefix(self) -> &'static str {
        match self {
            ChanType::X => "chanx",
            ChanType::Y => "chany",
        }
    }
}

impl fmt::Display for ChanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Signal direction of a channel wire.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Direction {
    /// Towards increasing coordinates.
    Inc,
    /// Towards decreasing coordinates.
    Dec,
    /// Either way (pins and bidirectional wires).
    Bi,
}

impl Direction {
    /// The two unidirectional directions, increasing first.
    pub const UNIDIR: [Direction; 2] = [Direction::Inc, Direction::Dec];
}

/// A side of a tile or of a switch block.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Side {
    /// Towards increasing y.
    Top,
    /// Towards increasing x.
    Right,
    /// Towards decreasing y.
    Bottom,
    /// Towards decreasing x.
    Left,
}

impl Side {
    /// All sides in the canonical order used for iteration and emission.
    pub const ALL: [Side; 4] = [Side::Top, Side::Right, Side::Bottom, Side::Left];

    /// The facing side.
    pub fn opposite(self) -> Side {
        match self {
            Side::Top => Side::Bottom,
            Side::Right => Side::Left,
            Side::Bottom => Side::Top,
            Side::Left => Side::Right,
        }
    }

    /// Position in [`Side::ALL`].
    pub fn index(self) -> usize {
        match self {
            Side::Top => 0,
            Side::Right => 1,
            Side::Bottom => 2,
            Side::Left => 3,
        }
    }

    /// Lower-case name used in netlists.
    pub fn name(self) -> &'static str {
        match self {
            Side::Top => "top",
            Side::Right => "right",
            Side::Bottom => "bottom",
            Side::Left => "left",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind of a routing-resource node.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum NodeKind {
    /// Logical signal source of a block.
    Source,
    /// Logical signal sink of a block.
    Sink,
    /// Block input pin.
    Ipin,
    /// Block output pin.
    Opin,
    /// Routing track in a channel.
    Chan(ChanType),
}

impl NodeKind {
    /// Returns the channel type for channel nodes.
    pub fn chan_type(self) -> Option<ChanType> {
        match self {
            NodeKind::Chan(chan) => Some(chan),
            _ => None,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Source => write!(f, "SOURCE"),
            NodeKind::Sink => write!(f, "SINK"),
            NodeKind::Ipin => write!(f, "IPIN"),
            NodeKind::Opin => write!(f, "OPIN"),
            NodeKind::Chan(ChanType::X) => write!(f, "CHANX"),
            NodeKind::Chan(ChanType::Y) => write!(f, "CHANY"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_involution() {
        for side in Side::ALL {
            assert_eq!(side.opposite().opposite(), side);
            assert_ne!(side.opposite(), side);
        }
    }

    #[test]
    fn side_index_matches_all() {
        for (i, side) in Side::ALL.iter().enumerate() {
            assert_eq!(side.index(), i);
        }
    }

    #[test]
    fn chan_perpendicular() {
        assert_eq!(ChanType::X.perpendicular(), ChanType::Y);
        assert_eq!(ChanType::Y.perpendicular(), ChanType::X);
        assert_eq!(ChanType::X.to_string(), "chanx");
    }

    #[test]
    fn node_kind_display() {
        assert_eq!(NodeKind::Chan(ChanType::Y).to_string(), "CHANY");
        assert_eq!(NodeKind::Opin.to_string(), "OPIN");
        assert_eq!(NodeKind::Chan(ChanType::X).chan_type(), Some(ChanType::X));
        assert_eq!(NodeKind::Ipin.chan_type(), None);
    }
}
