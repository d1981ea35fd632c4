//! Deduplication of structurally identical routing blocks.
//!
//! Two blocks share a module when their position-independent signatures are
//! equal. Configuration addresses are still assigned per instance, in two
//! phases:
//!
//! 1. [`size_unique_shapes`] counts and allocates every unique shape on the
//!    live counter, used as scratch space, then restores the counter. Switch
//!    block shapes and connection block shapes are sized from the same
//!    starting counter.
//! 2. [`address_all_instances`] walks every instance in scan order,
//!    recounts it against its shape and allocates its final range. The
//!    state of every instance is kept, so an instance is allocated once.

use crate::allocator::{count_block, BlockConfig, BlockCount, BlockState, ConfigAllocator};
use crate::gsb::RoutingBlock;
use crate::interconnect::Interconnect;
use crate::mux::MuxLibrary;
use serde::Serialize;
use std::collections::HashMap;
use weft_common::{ContentHash, InternalError, WeftResult};
use weft_rr::{PortDirection, RrSegmentId, Side};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
struct TrackShape {
    port: PortDirection,
    segment: Option<RrSegmentId>,
    passing: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
enum Shape {
    Switch {
        sides: Vec<Option<(Vec<TrackShape>, usize)>>,
    },
    Connection {
        prefix: &'static str,
        tracks: usize,
        ipin_sides: Vec<(Side, usize)>,
    },
}

/// Everything that determines a block's module, without its coordinate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BlockSignature {
    shape: Shape,
    sinks: Vec<(Side, usize, Interconnect)>,
}

impl BlockSignature {
    /// Signature of a block.
    pub fn of(block: &RoutingBlock) -> Self {
        let shape = match block {
            RoutingBlock::Switch(sb) => Shape::Switch {
                sides: sb
                    .sides
                    .iter()
                    .map(|side| {
                        side.channel.map(|_| {
                            let tracks = side
                                .tracks
                                .iter()
                                .map(|t| TrackShape {
                                    port: t.port,
                                    segment: t.segment,
                                    passing: t.passing,
                                })
                                .collect();
                            (tracks, side.opins.len())
                        })
                    })
                    .collect(),
            },
            RoutingBlock::Connection(cb) => Shape::Connection {
                prefix: block.kind_prefix(),
                tracks: cb.tracks.len(),
                ipin_sides: cb.ipin_sides.iter().map(|(s, p)| (*s, p.len())).collect(),
            },
        };
        let sinks = block
            .sinks()
            .iter()
            .map(|s| (s.side, s.index, s.interconnect.clone()))
            .collect();
        Self { shape, sinks }
    }

    /// Hash of the canonical encoding.
    pub fn hash(&self) -> WeftResult<ContentHash> {
        ContentHash::of(self)
    }
}

/// One unique block shape.
#[derive(Clone, Debug)]
pub struct UniqueShape {
    /// Module name, e.g. `sb_0_`.
    pub name: String,
    /// Index of the first block with this shape.
    pub representative: usize,
    /// Configuration cost, once sized.
    pub count: Option<BlockCount>,
    /// Scratch range used to emit the module.
    pub scratch: Option<BlockConfig>,
    signature: BlockSignature,
}

/// Unique shapes of a block list and the shape of every instance.
#[derive(Clone, Debug, Default)]
pub struct UniqueModules {
    shapes: Vec<UniqueShape>,
    instance_shape: Vec<usize>,
    instance_state: Vec<BlockState>,
}

impl UniqueModules {
    /// Groups `blocks` by signature. Shapes are numbered per module prefix
    /// in order of first appearance.
    pub fn build(blocks: &[RoutingBlock]) -> WeftResult<Self> {
        let mut modules = UniqueModules::default();
        let mut by_hash: HashMap<ContentHash, Vec<usize>> = HashMap::new();
        let mut per_prefix: HashMap<&'static str, usize> = HashMap::new();
        for (i, block) in blocks.iter().enumerate() {
            let signature = BlockSignature::of(block);
            let hash = signature.hash()?;
            let candidates = by_hash.entry(hash).or_default();
            let existing = candidates
                .iter()
                .copied()
                .find(|&s| modules.shapes[s].signature == signature);
            let shape = match existing {
                Some(shape) => shape,
                None => {
                    let prefix = block.kind_prefix();
                    let n = per_prefix.entry(prefix).or_default();
                    let shape = modules.shapes.len();
                    log::debug!(
                        "New routing module {prefix}_{n}_ from block {i} (bucket {:08x})",
                        hash.short()
                    );
                    modules.shapes.push(UniqueShape {
                        name: format!("{prefix}_{n}_"),
                        representative: i,
                        count: None,
                        scratch: None,
                        signature,
                    });
                    *n += 1;
                    candidates.push(shape);
                    shape
                }
            };
            modules.instance_shape.push(shape);
            modules.instance_state.push(BlockState::default());
        }
        log::info!(
            "Identified {} unique routing modules among {} blocks",
            modules.shapes.len(),
            blocks.len()
        );
        Ok(modules)
    }

    /// Unique shapes, in order of first appearance.
    pub fn shapes(&self) -> &[UniqueShape] {
        &self.shapes
    }

    /// Number of unique shapes.
    pub fn num_shapes(&self) -> usize {
        self.shapes.len()
    }

    /// Shape index of block `instance`.
    pub fn shape_of(&self, instance: usize) -> usize {
        self.instance_shape[instance]
    }

    /// Number of instances.
    pub fn num_instances(&self) -> usize {
        self.instance_shape.len()
    }

    /// Final range of block `instance`, once addressed.
    pub fn instance_config(&self, instance: usize) -> Option<BlockConfig> {
        self.instance_state[instance].config()
    }
}

/// Counts and allocates every unique shape on scratch space.
///
/// The counter is snapshotted before each block kind and restored after it,
/// so it is unchanged on return. The scratch ranges are stored on the shapes.
pub fn size_unique_shapes(
    unique: &mut UniqueModules,
    blocks: &[RoutingBlock],
    library: &MuxLibrary,
    allocator: &mut ConfigAllocator,
) -> WeftResult<()> {
    for switch in [true, false] {
        let saved = allocator.snapshot();
        for shape in &mut unique.shapes {
            let block = &blocks[shape.representative];
            if matches!(block, RoutingBlock::Switch(_)) != switch {
                continue;
            }
            let mut state = BlockState::default();
            let count = count_block(block, library)?;
            state.count(count)?;
            shape.scratch = Some(state.allocate(allocator)?);
            shape.count = Some(count);
        }
        allocator.restore(saved);
    }
    Ok(())
}

/// Assigns every instance its final range, in scan order.
///
/// Each instance is recounted from its own sinks; a count that differs from
/// its shape's is an internal error, as is addressing an instance twice.
pub fn address_all_instances(
    unique: &mut UniqueModules,
    blocks: &[RoutingBlock],
    library: &MuxLibrary,
    allocator: &mut ConfigAllocator,
) -> WeftResult<Vec<BlockConfig>> {
    if blocks.len() != unique.num_instances() {
        return Err(InternalError::new(format!(
            "{} blocks but {} deduplicated instances",
            blocks.len(),
            unique.num_instances()
        )));
    }
    let mut configs = Vec::with_capacity(blocks.len());
    for (i, block) in blocks.iter().enumerate() {
        let shape = &unique.shapes[unique.instance_shape[i]];
        let state = &mut unique.instance_state[i];
        if *state == BlockState::Uncounted {
            let expected = shape.count.ok_or_else(|| {
                InternalError::new(format!("shape {} addressed before it was sized", shape.name))
            })?;
            state.replay_count(count_block(block, library)?, expected)?;
        }
        let config = state
            .allocate(allocator)
            .map_err(|e| InternalError::new(format!("{}: {}", block.flat_name(), e.message)))?;
        configs.push(config);
    }
    Ok(configs)
}
