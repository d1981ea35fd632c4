use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use weft_config::{load_config_from_str, FabricConfig, ProtocolKind};
use weft_diagnostics::DiagnosticSink;
use weft_fabric::{
    address_all_instances, collect_blocks, count_block, generate_routing, prepare_device,
    size_unique_shapes, BlockConfig, ConfigAllocator, FabricBitstream, GenerateOptions,
    GenerationReport, MemorySink, MuxLibrary, RouteSelection, UniqueModules,
};

fn config(w: u32, h: u32, channel_width: u32, length: u32, extra: &str) -> FabricConfig {
    let toml = format!(
        r#"
[device]
name = "fabric"
width = {w}
height = {h}

[routing]
channel_width = {channel_width}
fc_in = 2
fc_out = 2

[[routing.segments]]
name = "L{length}"
length = {length}

{extra}
"#
    );
    load_config_from_str(&toml).unwrap()
}

fn generate(config: &FabricConfig, compact: bool) -> (GenerationReport, MemorySink) {
    let diags = DiagnosticSink::new();
    let device = prepare_device(config, &diags).unwrap();
    let library = MuxLibrary::from_config(&config.technology);
    let mut sink = MemorySink::new();
    let report = generate_routing(
        &device.graph,
        &device.grid,
        &library,
        config.technology.protocol,
        &RouteSelection::new(),
        GenerateOptions {
            compact,
            explicit_port_mapping: false,
        },
        &mut sink,
    )
    .unwrap();
    (report, sink)
}

fn assert_contiguous(configs: &[BlockConfig], total: u32) {
    let mut next = 0;
    for config in configs {
        assert_eq!(config.lsb, next, "ranges must follow scan order without gaps");
        next += config.num_bits;
    }
    assert_eq!(next, total);
}

#[test]
fn ranges_are_disjoint_and_contiguous() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..6 {
        let w = rng.gen_range(3..8);
        let h = rng.gen_range(3..8);
        let width = 2 * rng.gen_range(1..5);
        let length = rng.gen_range(1..4);
        let config = config(w, h, width, length, "");
        let (report, _) = generate(&config, false);
        let configs: Vec<BlockConfig> = report.configs.iter().map(|(_, c)| *c).collect();
        assert_contiguous(&configs, report.counter.num_mem_bits);
        assert_eq!(report.bitstream.len(), report.counter.num_mem_bits as usize);
    }
}

#[test]
fn flat_and_compact_allocate_identically() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..4 {
        let w = rng.gen_range(4..9);
        let h = rng.gen_range(4..9);
        let config = config(w, h, 6, 2, "");
        let (flat, _) = generate(&config, false);
        let (compact, _) = generate(&config, true);
        assert_eq!(flat.configs, compact.configs);
        assert_eq!(flat.bitstream, compact.bitstream);
        assert!(compact.num_block_modules <= flat.num_block_modules);
    }
}

#[test]
fn replay_matches_unique_shape_sizing() {
    let config = config(8, 6, 8, 4, "");
    let diags = DiagnosticSink::new();
    let device = prepare_device(&config, &diags).unwrap();
    let library = MuxLibrary::from_config(&config.technology);
    let blocks = collect_blocks(&device.graph, &device.grid).unwrap();

    let mut unique = UniqueModules::build(&blocks).unwrap();
    let mut allocator = ConfigAllocator::new(ProtocolKind::ScanChain);
    size_unique_shapes(&mut unique, &blocks, &library, &mut allocator).unwrap();
    let replayed = address_all_instances(&mut unique, &blocks, &library, &mut allocator).unwrap();

    let mut flat = ConfigAllocator::new(ProtocolKind::ScanChain);
    let direct: Vec<BlockConfig> = blocks
        .iter()
        .map(|b| flat.allocate(count_block(b, &library).unwrap()))
        .collect();
    assert_eq!(replayed, direct);
    for (i, config) in replayed.iter().enumerate() {
        let shape = &unique.shapes()[unique.shape_of(i)];
        assert_eq!(Some(config.num_bits), shape.count.map(|c| c.num_bits));
    }
}

#[test]
fn memory_bank_rram_fabric() {
    let config = config(
        5,
        5,
        4,
        1,
        r#"
[[routing.switches]]
name = "sb_mux"
model = "rram_mux"

[[routing.switches]]
name = "cb_mux"
model = "rram_mux"

[technology]
protocol = "memory_bank"

[[technology.muxes]]
name = "rram_mux"
design = "rram"
structure = "one_level"
"#,
    );
    let (report, sink) = generate(&config, false);
    let counter = report.counter;
    assert_eq!(counter.num_bl, counter.num_mem_bits);
    assert_eq!(counter.num_wl, counter.num_mem_bits);
    assert!(counter.reserved_blwl >= 2);
    let wl = report.bitstream.word_lines().unwrap();
    assert_eq!(wl.len(), report.bitstream.len());
    let sb = sink.module("sb_1__1_.v").unwrap();
    assert!(sb.contains("reserved_bl"));
    assert!(sb.contains(" bl"));
    assert!(!sb.contains("sram"));
}

#[test]
fn routed_selection_reaches_the_bitstream() {
    let config = config(4, 4, 4, 1, "");
    let diags = DiagnosticSink::new();
    let device = prepare_device(&config, &diags).unwrap();
    let library = MuxLibrary::from_config(&config.technology);
    let blocks = collect_blocks(&device.graph, &device.grid).unwrap();

    let mut selection = RouteSelection::new();
    for block in &blocks {
        for sink in block.sinks() {
            if sink.interconnect.mux().is_some() {
                selection.insert(sink.node, *sink.drivers.last().unwrap());
            }
        }
    }
    let mut out = MemorySink::new();
    let report = generate_routing(
        &device.graph,
        &device.grid,
        &library,
        ProtocolKind::ScanChain,
        &selection,
        GenerateOptions::default(),
        &mut out,
    )
    .unwrap();
    assert!(report.bitstream.bits().iter().any(|&b| b));
    let sb = out.module("sb_1__1_.v").unwrap();
    assert!(sb.contains("path "));
    assert!(!sb.contains("unrouted"));
}

#[test]
fn predecessor_that_does_not_drive_the_node_is_rejected() {
    let config = config(4, 4, 4, 1, "");
    let diags = DiagnosticSink::new();
    let device = prepare_device(&config, &diags).unwrap();
    let library = MuxLibrary::from_config(&config.technology);
    let blocks = collect_blocks(&device.graph, &device.grid).unwrap();
    let mut allocator = ConfigAllocator::new(ProtocolKind::ScanChain);
    let configs: Vec<BlockConfig> = blocks
        .iter()
        .map(|b| allocator.allocate(count_block(b, &library).unwrap()))
        .collect();

    let sink = blocks
        .iter()
        .flat_map(|b| b.sinks())
        .find(|s| s.interconnect.mux().is_some())
        .unwrap();
    let foreign = device
        .graph
        .nodes()
        .map(|(id, _)| id)
        .find(|id| *id != sink.node && !sink.drivers.contains(id))
        .unwrap();
    let mut selection = RouteSelection::new();
    selection.insert(sink.node, foreign);

    let total = allocator.state().num_mem_bits;
    let err = FabricBitstream::assemble(
        &blocks,
        &configs,
        &library,
        &selection,
        ProtocolKind::ScanChain,
        total,
    )
    .unwrap_err();
    assert!(err.message.contains(&format!("node {}", sink.node)));
    assert!(err.message.contains(&format!("node {foreign}")));

    // the same node routed through one of its drivers assembles fine
    selection.insert(sink.node, sink.drivers[0]);
    assert!(FabricBitstream::assemble(
        &blocks,
        &configs,
        &library,
        &selection,
        ProtocolKind::ScanChain,
        total,
    )
    .is_ok());
}
