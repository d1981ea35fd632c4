//! Switch and connection block generation for an island-style fabric.
//!
//! Starting from a routing-resource graph, this crate extracts every switch
//! block and connection block, classifies each block output as a wire or a
//! multiplexer, gives every block instance a disjoint range of the
//! configuration address space, and writes one structural Verilog module per
//! block (or per unique block shape) together with the fabric bitstream.
//!
//! The entry points are [`prepare_device`], which builds the grid and the
//! routing graph including its clock network, and [`generate_routing`].

#![warn(missing_docs)]

pub mod allocator;
pub mod bitstream;
pub mod error;
pub mod fabric;
pub mod gsb;
pub mod interconnect;
pub mod mux;
pub mod netlist;
pub mod selection;
pub mod unique;

#[cfg(test)]
mod test_util;

pub use allocator::{count_block, BlockConfig, BlockCount, BlockState, ConfigAllocator, CounterState};
pub use bitstream::{FabricBitstream, BITSTREAM_FILE};
pub use error::GenerateError;
pub use fabric::{generate_routing, prepare_device, GenerateOptions, GenerationReport, PreparedDevice};
pub use gsb::{
    build_connection_block, build_switch_block, collect_blocks, ChannelEntry, ConnectionBlock,
    GridPin, RoutingBlock, SbSide, SwitchBlock,
};
pub use interconnect::{DriverPort, Interconnect, Sink};
pub use mux::{MuxBits, MuxLibrary, MuxModel, MuxStructure};
pub use netlist::{DirectorySink, MemorySink, NetlistSink, ROUTING_DIR, ROUTING_HEADER};
pub use selection::RouteSelection;
pub use unique::{address_all_instances, size_unique_shapes, BlockSignature, UniqueModules};
