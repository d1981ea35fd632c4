//! Fixtures shared by unit tests.

use crate::builder::RoutingArch;
use crate::grid::{BlockType, DeviceGrid};

pub(crate) fn block(name: &str, inputs: u32, outputs: u32, height: u32) -> BlockType {
    BlockType {
        name: name.to_string(),
        inputs,
        outputs,
        width: 1,
        height,
    }
}

/// An I/O ring around a core of 4-input, 2-output logic blocks.
pub(crate) fn island_grid(w: u32, h: u32) -> DeviceGrid {
    let mut grid = DeviceGrid::new(w, h, vec![block("io", 1, 1, 1), block("clb", 4, 2, 1)]);
    let io = grid.find_block_type("io").unwrap();
    let clb = grid.find_block_type("clb").unwrap();
    for x in 0..w {
        for y in 0..h {
            let corner = (x == 0 || x == w - 1) && (y == 0 || y == h - 1);
            if corner {
                continue;
            }
            let ring = x == 0 || x == w - 1 || y == 0 || y == h - 1;
            grid.place_block(x, y, if ring { io } else { clb }).unwrap();
        }
    }
    grid
}

pub(crate) fn arch(width: u32, length: u32) -> RoutingArch {
    RoutingArch {
        channel_width: width,
        fc_in: 2,
        fc_out: 1,
        through_channel: false,
        segments: vec![("L".to_string(), length)],
        switches: vec![
            ("sb_mux".to_string(), "mux_tree".to_string()),
            ("cb_mux".to_string(), "mux_tree".to_string()),
        ],
        sb_switch: "sb_mux".to_string(),
        cb_switch: "cb_mux".to_string(),
    }
}
