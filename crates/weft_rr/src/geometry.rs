//! Where channels sit relative to switch blocks and tiles.
//!
//! Switch block `(x, y)` sits at the upper-right corner of tile `(x, y)`.
//! Its four sides see `chany(x, y+1)` (top), `chanx(x+1, y)` (right),
//! `chany(x, y)` (bottom) and `chanx(x, y)` (left).

use crate::types::{ChanType, Direction, Side};
use serde::{Deserialize, Serialize};

/// A channel segment between two switch blocks.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct ChannelTile {
    /// Channel orientation.
    pub chan: ChanType,
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
}

impl ChannelTile {
    /// Creates a channel tile.
    pub fn new(chan: ChanType, x: u32, y: u32) -> Self {
        Self { chan, x, y }
    }

    /// Whether the coordinate lies in the routable range of a `width × height` grid.
    ///
    /// X channels run over `x in 1..width-1`, `y in 0..height-1`; Y channels
    /// over `x in 0..width-1`, `y in 1..height-1`.
    pub fn in_bounds(&self, width: u32, height: u32) -> bool {
        match self.chan {
            ChanType::X => self.x >= 1 && self.x + 1 < width && self.y + 1 < height,
            ChanType::Y => self.x + 1 < width && self.y >= 1 && self.y + 1 < height,
        }
    }
}

/// Whether a channel wire enters or leaves a switch block.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum PortDirection {
    /// The wire drives into the switch block.
    In,
    /// The switch block drives the wire.
    Out,
}

impl PortDirection {
    /// Lower-case name used in port names.
    pub fn name(self) -> &'static str {
        match self {
            PortDirection::In => "in",
            PortDirection::Out => "out",
        }
    }
}

/// The channel on `side` of switch block `(x, y)`, if it is in bounds.
pub fn sb_side_channel(x: u32, y: u32, side: Side, width: u32, height: u32) -> Option<ChannelTile> {
    let tile = match side {
        Side::Top => ChannelTile::new(ChanType::Y, x, y + 1),
        Side::Right => ChannelTile::new(ChanType::X, x + 1, y),
        Side::Bottom => ChannelTile::new(ChanType::Y, x, y),
        Side::Left => ChannelTile::new(ChanType::X, x, y),
    };
    tile.in_bounds(width, height).then_some(tile)
}

/// Port direction of a wire with direction `dir` seen from `side` of a switch block.
///
/// Returns `None` for bidirectional wires, which have no fixed port direction.
pub fn sb_port_direction(side: Side, dir: Direction) -> Option<PortDirection> {
    match (side, dir) {
        (_, Direction::Bi) => None,
        (Side::Top | Side::Right, Direction::Inc) => Some(PortDirection::Out),
        (Side::Top | Side::Right, Direction::Dec) => Some(PortDirection::In),
        (Side::Bottom | Side::Left, Direction::Inc) => Some(PortDirection::In),
        (Side::Bottom | Side::Left, Direction::Dec) => Some(PortDirection::Out),
    }
}

/// Direction of the wires a switch block drives on `side`.
pub fn sb_output_direction(side: Side) -> Direction {
    match side {
        Side::Top | Side::Right => Direction::Inc,
        Side::Bottom | Side::Left => Direction::Dec,
    }
}

/// The channel running along `side` of tile `(x, y)`.
///
/// Block pins on that side connect to this channel.
pub fn pin_channel(x: u32, y: u32, side: Side) -> Option<ChannelTile> {
    match side {
        Side::Top => Some(ChannelTile::new(ChanType::X, x, y)),
        Side::Right => Some(ChannelTile::new(ChanType::Y, x, y)),
        Side::Bottom => y.checked_sub(1).map(|y| ChannelTile::new(ChanType::X, x, y)),
        Side::Left => x.checked_sub(1).map(|x| ChannelTile::new(ChanType::Y, x, y)),
    }
}

/// The two switch blocks at the ends of a channel tile, with the side of each
/// switch block the channel sits on.
///
/// The first entry is the switch block at the low end (the channel is on its
/// right or top side), the second the one at the high end. `tile` must be
/// in bounds.
pub fn channel_end_switch_blocks(tile: ChannelTile) -> [((u32, u32), Side); 2] {
    match tile.chan {
        ChanType::X => [
            ((tile.x - 1, tile.y), Side::Right),
            ((tile.x, tile.y), Side::Left),
        ],
        ChanType::Y => [
            ((tile.x, tile.y - 1), Side::Top),
            ((tile.x, tile.y), Side::Bottom),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_switch_block_sides() {
        // SB(0,0) on a 4x4 grid only sees the top and right channels
        assert_eq!(
            sb_side_channel(0, 0, Side::Top, 4, 4),
            Some(ChannelTile::new(ChanType::Y, 0, 1))
        );
        assert_eq!(
            sb_side_channel(0, 0, Side::Right, 4, 4),
            Some(ChannelTile::new(ChanType::X, 1, 0))
        );
        assert_eq!(sb_side_channel(0, 0, Side::Bottom, 4, 4), None);
        assert_eq!(sb_side_channel(0, 0, Side::Left, 4, 4), None);
    }

    #[test]
    fn two_by_two_has_no_channels() {
        for x in 0..2 {
            for y in 0..2 {
                for side in Side::ALL {
                    assert_eq!(sb_side_channel(x, y, side, 2, 2), None);
                }
            }
        }
    }

    #[test]
    fn port_directions_are_consistent_across_a_channel() {
        // an increasing chanx wire leaves SB(x-1,y) on its right and enters SB(x,y) on its left
        assert_eq!(
            sb_port_direction(Side::Right, Direction::Inc),
            Some(PortDirection::Out)
        );
        assert_eq!(
            sb_port_direction(Side::Left, Direction::Inc),
            Some(PortDirection::In)
        );
        assert_eq!(
            sb_port_direction(Side::Top, Direction::Dec),
            Some(PortDirection::In)
        );
        assert_eq!(
            sb_port_direction(Side::Bottom, Direction::Dec),
            Some(PortDirection::Out)
        );
        assert_eq!(sb_port_direction(Side::Top, Direction::Bi), None);
        for side in Side::ALL {
            assert_eq!(
                sb_port_direction(side, sb_output_direction(side)),
                Some(PortDirection::Out)
            );
        }
    }

    #[test]
    fn channel_ends() {
        let [low, high] = channel_end_switch_blocks(ChannelTile::new(ChanType::X, 2, 1));
        assert_eq!(low, ((1, 1), Side::Right));
        assert_eq!(high, ((2, 1), Side::Left));
        let [low, high] = channel_end_switch_blocks(ChannelTile::new(ChanType::Y, 2, 1));
        assert_eq!(low, ((2, 0), Side::Top));
        assert_eq!(high, ((2, 1), Side::Bottom));
    }

    #[test]
    fn pin_channels() {
        assert_eq!(
            pin_channel(1, 1, Side::Bottom),
            Some(ChannelTile::new(ChanType::X, 1, 0))
        );
        assert_eq!(
            pin_channel(1, 1, Side::Left),
            Some(ChannelTile::new(ChanType::Y, 0, 1))
        );
        assert_eq!(pin_channel(0, 0, Side::Left), None);
    }
}
