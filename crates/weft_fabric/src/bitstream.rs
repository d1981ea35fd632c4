//! Fabric bitstream assembly.
//!
//! Every multiplexer's pattern is placed at its block's address range, in
//! sink order, so bit `i` of the bitstream is bit `i` of the configuration
//! address space.

use crate::allocator::BlockConfig;
use crate::gsb::RoutingBlock;
use crate::mux::{MuxBits, MuxLibrary};
use crate::selection::RouteSelection;
use std::io::{self, Write};
use std::path::Path;
use weft_common::{InternalError, WeftResult};
use weft_config::ProtocolKind;

/// File name of the written bitstream.
pub const BITSTREAM_FILE: &str = "fabric_bitstream.txt";

/// Configuration bits of the routing fabric.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FabricBitstream {
    bits: Vec<bool>,
    wl: Option<Vec<bool>>,
}

impl FabricBitstream {
    /// Decodes every multiplexer of `blocks` into a bitstream of
    /// `total_bits` bits. `configs[i]` is the range of `blocks[i]`.
    pub fn assemble(
        blocks: &[RoutingBlock],
        configs: &[BlockConfig],
        library: &MuxLibrary,
        selection: &RouteSelection,
        protocol: ProtocolKind,
        total_bits: u32,
    ) -> WeftResult<Self> {
        if blocks.len() != configs.len() {
            return Err(InternalError::new(format!(
                "{} blocks but {} address ranges",
                blocks.len(),
                configs.len()
            )));
        }
        let total = total_bits as usize;
        let mut bits = vec![false; total];
        let mut wl = (protocol == ProtocolKind::MemoryBank).then(|| vec![false; total]);

        for (block, config) in blocks.iter().zip(configs) {
            let mut at = config.lsb as usize;
            for sink in block.sinks() {
                let Some((model, size)) = sink.interconnect.mux() else {
                    continue;
                };
                let model = library.get(model)?;
                let path = selection.path_id(sink.node, &sink.drivers, &block.flat_name())?;
                let pattern = model.decode(size, path)?;
                let end = at + pattern.len();
                if end > total {
                    return Err(InternalError::new(format!(
                        "{} ends at bit {end}, past the {total}-bit address space",
                        block.flat_name()
                    )));
                }
                match (&pattern, wl.as_mut()) {
                    (MuxBits::Sram(values), None) => bits[at..end].copy_from_slice(values),
                    (MuxBits::Sram(values), Some(wl)) => {
                        bits[at..end].copy_from_slice(values);
                        wl[at..end].fill(true);
                    }
                    (MuxBits::BlWl { bl, wl: lines }, Some(wl)) => {
                        bits[at..end].copy_from_slice(bl);
                        wl[at..end].copy_from_slice(lines);
                    }
                    (MuxBits::BlWl { .. }, None) => {
                        return Err(InternalError::new(format!(
                            "multiplexer '{}' needs a memory-bank configuration protocol",
                            model.name
                        )))
                    }
                }
                at = end;
            }
            if at != (config.lsb + config.num_bits) as usize {
                return Err(InternalError::new(format!(
                    "{} decodes {} bits into a {}-bit range",
                    block.flat_name(),
                    at - config.lsb as usize,
                    config.num_bits
                )));
            }
        }
        Ok(Self { bits, wl })
    }

    /// Number of configuration bits.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Returns `true` if the fabric has no configuration bits.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// SRAM or bit-line values.
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    /// Word-line values, for memory-bank fabrics.
    pub fn word_lines(&self) -> Option<&[bool]> {
        self.wl.as_deref()
    }

    /// Writes one bit per line, or `bl wl` pairs for memory-bank fabrics.
    pub fn write_to(&self, mut out: impl Write) -> io::Result<()> {
        let digit = |b: bool| if b { '1' } else { '0' };
        match &self.wl {
            None => {
                for &b in &self.bits {
                    writeln!(out, "{}", digit(b))?;
                }
            }
            Some(wl) => {
                for (&b, &w) in self.bits.iter().zip(wl) {
                    writeln!(out, "{} {}", digit(b), digit(w))?;
                }
            }
        }
        Ok(())
    }

    /// Writes the bitstream to `dir/fabric_bitstream.txt`.
    pub fn save(&self, dir: &Path) -> io::Result<()> {
        let file = std::fs::File::create(dir.join(BITSTREAM_FILE))?;
        self.write_to(io::BufWriter::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::{count_block, ConfigAllocator};
    use crate::gsb::collect_blocks;
    use crate::test_util::{device, fabric};

    fn assembled(selection: &RouteSelection) -> (FabricBitstream, Vec<RoutingBlock>, Vec<BlockConfig>) {
        let config = fabric(4, 4, 4, "");
        let (grid, graph) = device(&config);
        let library = MuxLibrary::from_config(&config.technology);
        let blocks = collect_blocks(&graph, &grid).unwrap();
        let mut alloc = ConfigAllocator::new(ProtocolKind::ScanChain);
        let configs: Vec<BlockConfig> = blocks
            .iter()
            .map(|b| alloc.allocate(count_block(b, &library).unwrap()))
            .collect();
        let bitstream = FabricBitstream::assemble(
            &blocks,
            &configs,
            &library,
            selection,
            ProtocolKind::ScanChain,
            alloc.state().num_mem_bits,
        )
        .unwrap();
        (bitstream, blocks, configs)
    }

    #[test]
    fn unrouted_fabric_is_all_zero() {
        let (bitstream, _, _) = assembled(&RouteSelection::new());
        assert!(!bitstream.is_empty());
        assert!(bitstream.bits().iter().all(|b| !b));
        assert!(bitstream.word_lines().is_none());
    }

    #[test]
    fn routed_mux_sets_its_bits() {
        let (_, blocks, configs) = assembled(&RouteSelection::new());
        // route the first multiplexer of the first block through its last input
        let (i, sink) = blocks
            .iter()
            .enumerate()
            .find_map(|(i, b)| b.sinks().iter().find(|s| s.interconnect.mux().is_some()).map(|s| (i, s)))
            .unwrap();
        let mut selection = RouteSelection::new();
        selection.insert(sink.node, *sink.drivers.last().unwrap());
        let (bitstream, _, _) = assembled(&selection);
        let lsb = configs[i].lsb as usize;
        assert!(bitstream.bits()[lsb..lsb + 2].iter().any(|&b| b));
    }

    #[test]
    fn text_format() {
        let bitstream = FabricBitstream {
            bits: vec![true, false],
            wl: Some(vec![true, true]),
        };
        let mut out = Vec::new();
        bitstream.write_to(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1 1\n0 1\n");
    }

    #[test]
    fn range_mismatch_is_an_error() {
        let (_, blocks, mut configs) = assembled(&RouteSelection::new());
        let library = MuxLibrary::from_config(&fabric(4, 4, 4, "").technology);
        let total: u32 = configs.iter().map(|c| c.num_bits).sum();
        configs[0].num_bits += 1;
        assert!(FabricBitstream::assemble(
            &blocks,
            &configs,
            &library,
            &RouteSelection::new(),
            ProtocolKind::ScanChain,
            total + 1,
        )
        .is_err());
    }
}
