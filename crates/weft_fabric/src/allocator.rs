//! Sequential configuration-memory address allocation.
//!
//! Blocks are allocated in device-scan order. Each block receives the range
//! `[total, total + num_bits - 1]` and the counter advances by `num_bits`.
//! Reserved BL/WL lines are shared by every block, so the counter only keeps
//! their high-water mark.

use crate::gsb::RoutingBlock;
use crate::mux::MuxLibrary;
use serde::Serialize;
use weft_common::{InternalError, WeftResult};
use weft_config::ProtocolKind;

/// Global counter of allocated configuration resources.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CounterState {
    /// Configuration bits allocated so far.
    pub num_mem_bits: u32,
    /// Bit lines allocated so far (memory-bank only).
    pub num_bl: u32,
    /// Word lines allocated so far (memory-bank only).
    pub num_wl: u32,
    /// Largest reserved BL/WL count of any block.
    pub reserved_blwl: u32,
}

/// Configuration cost of one block, before allocation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BlockCount {
    /// Configuration bits.
    pub num_bits: u32,
    /// Reserved BL/WL lines.
    pub num_reserved: u32,
}

/// The address range allocated to one block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BlockConfig {
    /// First bit.
    pub lsb: u32,
    /// Number of bits.
    pub num_bits: u32,
    /// Reserved BL/WL lines.
    pub num_reserved: u32,
}

impl BlockConfig {
    /// Last bit, or `None` for an empty range.
    pub fn msb(&self) -> Option<u32> {
        self.num_bits.checked_sub(1).map(|n| self.lsb + n)
    }

    /// The bits of the range.
    pub fn bits(&self) -> std::ops::Range<u32> {
        self.lsb..self.lsb + self.num_bits
    }
}

/// The configuration counter.
#[derive(Clone, Debug)]
pub struct ConfigAllocator {
    protocol: ProtocolKind,
    state: CounterState,
}

impl ConfigAllocator {
    /// Creates a counter at zero.
    pub fn new(protocol: ProtocolKind) -> Self {
        Self {
            protocol,
            state: CounterState::default(),
        }
    }

    /// Configuration memory organization.
    pub fn protocol(&self) -> ProtocolKind {
        self.protocol
    }

    /// Current counter values.
    pub fn state(&self) -> CounterState {
        self.state
    }

    /// Copies the counter.
    pub fn snapshot(&self) -> CounterState {
        self.state
    }

    /// Resets the counter to a snapshot.
    pub fn restore(&mut self, state: CounterState) {
        self.state = state;
    }

    /// Allocates the next range for a block.
    pub fn allocate(&mut self, count: BlockCount) -> BlockConfig {
        let config = BlockConfig {
            lsb: self.state.num_mem_bits,
            num_bits: count.num_bits,
            num_reserved: count.num_reserved,
        };
        self.state.num_mem_bits += count.num_bits;
        if self.protocol == ProtocolKind::MemoryBank {
            self.state.num_bl += count.num_bits;
            self.state.num_wl += count.num_bits;
        }
        self.state.reserved_blwl = self.state.reserved_blwl.max(count.num_reserved);
        config
    }
}

/// Allocation progress of one block instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BlockState {
    /// Nothing computed yet.
    #[default]
    Uncounted,
    /// Cost computed from the block itself.
    Counted(BlockCount),
    /// Cost recomputed for a mirror of a unique shape.
    ReplayCounted(BlockCount),
    /// Range assigned.
    Allocated(BlockConfig),
}

impl BlockState {
    /// Records the cost of a block.
    pub fn count(&mut self, count: BlockCount) -> WeftResult<()> {
        match *self {
            BlockState::Uncounted => {
                *self = BlockState::Counted(count);
                Ok(())
            }
            other => Err(InternalError::new(format!(
                "block counted in state {other:?}"
            ))),
        }
    }

    /// Records the recomputed cost of a mirror; it must equal the shape's cost.
    pub fn replay_count(&mut self, count: BlockCount, shape: BlockCount) -> WeftResult<()> {
        if count != shape {
            return Err(InternalError::new(format!(
                "mirror costs {count:?} but its unique shape costs {shape:?}"
            )));
        }
        match *self {
            BlockState::Uncounted => {
                *self = BlockState::ReplayCounted(count);
                Ok(())
            }
            other => Err(InternalError::new(format!(
                "block replayed in state {other:?}"
            ))),
        }
    }

    /// Assigns the next range from `allocator`.
    pub fn allocate(&mut self, allocator: &mut ConfigAllocator) -> WeftResult<BlockConfig> {
        match *self {
            BlockState::Counted(count) | BlockState::ReplayCounted(count) => {
                let config = allocator.allocate(count);
                *self = BlockState::Allocated(config);
                Ok(config)
            }
            BlockState::Uncounted => Err(InternalError::new(
                "block allocated before it was counted",
            )),
            BlockState::Allocated(config) => Err(InternalError::new(format!(
                "block allocated twice (already at bit {})",
                config.lsb
            ))),
        }
    }

    /// The assigned range, if any.
    pub fn config(&self) -> Option<BlockConfig> {
        match self {
            BlockState::Allocated(config) => Some(*config),
            _ => None,
        }
    }
}

/// Configuration cost of a block: the bits of its multiplexers and the
/// largest reserved BL/WL count among them.
pub fn count_block(block: &RoutingBlock, library: &MuxLibrary) -> WeftResult<BlockCount> {
    let mut count = BlockCount::default();
    for (model, size) in block.sinks().iter().filter_map(|s| s.interconnect.mux()) {
        let model = library.get(model)?;
        count.num_bits += model.num_conf_bits(size)?;
        count.num_reserved = count.num_reserved.max(model.num_reserved_conf_bits(size));
    }
    Ok(count)
}
