//! `weft generate`: routing netlists and fabric bitstream.
//!
//! 1. Load `weft.toml`
//! 2. Build the grid and routing graph, append the clock network
//! 3. Read the routing result, if any
//! 4. Write one module per block or block shape, channel modules and the
//!    `routing.v` header
//! 5. Save `fabric_bitstream.txt`

use std::path::PathBuf;

use weft_common::ExecStatus;
use weft_diagnostics::DiagnosticSink;
use weft_fabric::{
    generate_routing, prepare_device, DirectorySink, GenerateOptions, MuxLibrary, RouteSelection,
    BITSTREAM_FILE, ROUTING_HEADER,
};

use crate::{GenerateArgs, GlobalArgs};

/// Runs `weft generate`. Returns exit code 0 on success, 1 when the device
/// description is rejected.
pub fn run(args: &GenerateArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = global.load_config()?;
    if !global.quiet {
        eprintln!(
            "  Generating {} ({}x{})",
            config.device.name, config.device.width, config.device.height
        );
    }

    let sink = DiagnosticSink::new();
    let device = prepare_device(&config, &sink)?;
    global.render_diagnostics(&sink);
    if device.clock_status == ExecStatus::FatalError || sink.has_errors() {
        return Ok(1);
    }

    let selection = match &args.routing {
        Some(path) => {
            let selection = RouteSelection::load(path)?;
            log::info!("Loaded {} routed nodes from {}", selection.len(), path.display());
            selection
        }
        None => RouteSelection::new(),
    };

    let mut options = GenerateOptions::from_config(&config.output);
    options.compact |= args.compact;
    options.explicit_port_mapping |= args.explicit_port_mapping;

    let out = args
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output.directory));
    let library = MuxLibrary::from_config(&config.technology);
    let mut netlists = DirectorySink::create(&out)?;
    let report = generate_routing(
        &device.graph,
        &device.grid,
        &library,
        config.technology.protocol,
        &selection,
        options,
        &mut netlists,
    )?;
    report.bitstream.save(&out)?;

    if !global.quiet {
        eprintln!(
            "    Finished {} switch blocks, {} connection blocks, {} modules, {} configuration bits",
            report.num_switch_blocks,
            report.num_connection_blocks,
            report.num_block_modules + report.num_channel_modules,
            report.counter.num_mem_bits
        );
        eprintln!(
            "     Written {} and {}",
            out.join(ROUTING_HEADER).display(),
            out.join(BITSTREAM_FILE).display()
        );
    }
    Ok(0)
}
