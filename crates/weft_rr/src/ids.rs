//! Opaque ID newtypes for routing-resource entities.
//!
//! Each ID is a thin `u32` wrapper used as an arena index into the
//! [`RrGraph`](crate::RrGraph), the [`DeviceGrid`](crate::DeviceGrid) or the
//! [`ClockNetwork`](crate::ClockNetwork). They are `Copy`, `Hash`, ordered,
//! and `Serialize`/`Deserialize`.

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }

            /// Returns the index as a `usize` for slice access.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Opaque, copyable ID for a node in the routing-resource graph.
    RrNodeId
);

define_id!(
    /// Opaque, copyable ID for an edge in the routing-resource graph.
    RrEdgeId
);

define_id!(
    /// Opaque, copyable ID for a programmable switch type.
    RrSwitchId
);

define_id!(
    /// Opaque, copyable ID for a wire segment type.
    RrSegmentId
);

define_id!(
    /// Opaque, copyable ID for a block type placed on the device grid.
    BlockTypeId
);

define_id!(
    /// Opaque, copyable ID for a clock tree.
    ClockTreeId
);

define_id!(
    /// Level within a clock tree, 0 being the root.
    ClockLevelId
);

define_id!(
    /// Clock pin (clock index) carried by a clock tree level.
    ClockPinId
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn id_roundtrip() {
        let id = RrNodeId::from_raw(42);
        assert_eq!(id.as_raw(), 42);
        assert_eq!(id.index(), 42);
    }

    #[test]
    fn id_hash_in_set() {
        let mut set = HashSet::new();
        set.insert(RrEdgeId::from_raw(1));
        set.insert(RrEdgeId::from_raw(2));
        set.insert(RrEdgeId::from_raw(1));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn id_ordering() {
        assert!(ClockLevelId::from_raw(0) < ClockLevelId::from_raw(1));
    }

    #[test]
    fn id_serde_roundtrip() {
        let id = RrSwitchId::from_raw(99);
        let json = serde_json::to_string(&id).unwrap();
        let restored: RrSwitchId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, restored);
    }

    #[test]
    fn id_display() {
        assert_eq!(ClockPinId::from_raw(3).to_string(), "3");
    }
}
