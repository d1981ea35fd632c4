//! Fixtures shared by unit tests.

use weft_config::{load_config_from_str, FabricConfig};
use weft_rr::{build_rr_graph, DeviceGrid, RoutingArch, RrGraph};

/// A `w × h` island device with default blocks and switches, plus `extra`
/// TOML appended verbatim.
pub(crate) fn fabric(w: u32, h: u32, channel_width: u32, extra: &str) -> FabricConfig {
    let toml = format!(
        "[device]\nname = \"test\"\nwidth = {w}\nheight = {h}\n\n\
         [routing]\nchannel_width = {channel_width}\n\n{extra}"
    );
    load_config_from_str(&toml).unwrap()
}

pub(crate) fn island_grid(w: u32, h: u32) -> DeviceGrid {
    DeviceGrid::from_config(&fabric(w, h, 4, "")).unwrap()
}

pub(crate) fn arch(width: u32, length: u32) -> RoutingArch {
    let mut arch = RoutingArch::from_config(&fabric(4, 4, width, ""));
    arch.segments = vec![("L".to_string(), length)];
    arch
}

pub(crate) fn device(config: &FabricConfig) -> (DeviceGrid, RrGraph) {
    let grid = DeviceGrid::from_config(config).unwrap();
    let graph = build_rr_graph(&grid, &RoutingArch::from_config(config)).unwrap();
    (grid, graph)
}
