//! The device grid: which block type occupies each tile.
//!
//! Coordinates follow the usual island-style convention. Tile `(x, y)` has
//! the horizontal channel `chanx(x, y)` above it and the vertical channel
//! `chany(x, y)` to its right. A channel inside a multi-tile block does not
//! exist unless the architecture routes channels through blocks.

use crate::ids::BlockTypeId;
use crate::types::Side;
use weft_common::{InternalError, WeftResult};
use weft_config::FabricConfig;

/// A placeable block type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockType {
    /// Block type name.
    pub name: String,
    /// Number of input pins.
    pub inputs: u32,
    /// Number of output pins.
    pub outputs: u32,
    /// Width in tiles.
    pub width: u32,
    /// Height in tiles.
    pub height: u32,
}

/// One grid location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GridTile {
    /// Block type covering this tile, `None` for empty tiles.
    pub block: Option<BlockTypeId>,
    /// Column offset of this tile inside its block.
    pub width_offset: u32,
    /// Row offset of this tile inside its block.
    pub height_offset: u32,
}

impl GridTile {
    /// Returns `true` if this tile is the lower-left tile of its block.
    pub fn is_root(&self) -> bool {
        self.block.is_some() && self.width_offset == 0 && self.height_offset == 0
    }
}

/// A `width × height` array of tiles.
#[derive(Debug, Clone)]
pub struct DeviceGrid {
    width: u32,
    height: u32,
    block_types: Vec<BlockType>,
    tiles: Vec<GridTile>,
}

impl DeviceGrid {
    /// Creates an empty grid with the given block types.
    pub fn new(width: u32, height: u32, block_types: Vec<BlockType>) -> Self {
        Self {
            width,
            height,
            block_types,
            tiles: vec![GridTile::default(); (width * height) as usize],
        }
    }

    /// Builds the grid described by a validated configuration.
    ///
    /// The perimeter holds the I/O block (corners stay empty), configured
    /// columns are stacked bottom-up with their block type, and all other
    /// core tiles hold the core block.
    pub fn from_config(config: &FabricConfig) -> WeftResult<Self> {
        let device = &config.device;
        let block_types = device
            .blocks
            .iter()
            .map(|b| BlockType {
                name: b.name.clone(),
                inputs: b.inputs,
                outputs: b.outputs,
                width: b.width,
                height: b.height,
            })
            .collect();
        let mut grid = DeviceGrid::new(device.width, device.height, block_types);
        let io = grid.require_block_type(&device.io)?;
        let core = grid.require_block_type(&device.core)?;
        let (w, h) = (device.width, device.height);

        for x in 1..w - 1 {
            grid.place_block(x, 0, io)?;
            grid.place_block(x, h - 1, io)?;
        }
        for y in 1..h - 1 {
            grid.place_block(0, y, io)?;
            grid.place_block(w - 1, y, io)?;
        }

        for column in &device.columns {
            let ty = grid.require_block_type(&column.block)?;
            let bh = grid.block_type(ty).height;
            let mut y = 1;
            while y + bh <= h - 1 {
                if grid.tile(column.x, y).block.is_none() {
                    grid.place_block(column.x, y, ty)?;
                }
                y += bh;
            }
        }

        for x in 1..w - 1 {
            for y in 1..h - 1 {
                if grid.tile(x, y).block.is_none() {
                    grid.place_block(x, y, core)?;
                }
            }
        }
        Ok(grid)
    }

    fn require_block_type(&self, name: &str) -> WeftResult<BlockTypeId> {
        self.find_block_type(name)
            .ok_or_else(|| InternalError::new(format!("block type '{name}' is not defined")))
    }

    /// Places a block with its lower-left tile at `(x, y)`.
    pub fn place_block(&mut self, x: u32, y: u32, ty: BlockTypeId) -> WeftResult<()> {
        let (bw, bh) = {
            let block = self.block_type(ty);
            (block.width, block.height)
        };
        if x + bw > self.width || y + bh > self.height {
            return Err(InternalError::new(format!(
                "block '{}' at ({x}, {y}) does not fit in the {}x{} grid",
                self.block_type(ty).name,
                self.width,
                self.height
            )));
        }
        for dx in 0..bw {
            for dy in 0..bh {
                let idx = self.tile_index(x + dx, y + dy);
                if self.tiles[idx].block.is_some() {
                    return Err(InternalError::new(format!(
                        "tile ({}, {}) is already occupied",
                        x + dx,
                        y + dy
                    )));
                }
                self.tiles[idx] = GridTile {
                    block: Some(ty),
                    width_offset: dx,
                    height_offset: dy,
                };
            }
        }
        Ok(())
    }

    fn tile_index(&self, x: u32, y: u32) -> usize {
        (y * self.width + x) as usize
    }

    /// Grid width in tiles.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in tiles.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the tile at `(x, y)`.
    pub fn tile(&self, x: u32, y: u32) -> &GridTile {
        &self.tiles[self.tile_index(x, y)]
    }

    /// Returns the block type with the given ID.
    pub fn block_type(&self, id: BlockTypeId) -> &BlockType {
        &self.block_types[id.index()]
    }

    /// Looks up a block type by name.
    pub fn find_block_type(&self, name: &str) -> Option<BlockTypeId> {
        self.block_types
            .iter()
            .position(|b| b.name == name)
            .map(|i| BlockTypeId::from_raw(i as u32))
    }

    /// The block type covering `(x, y)`, if any.
    pub fn block_at(&self, x: u32, y: u32) -> Option<&BlockType> {
        self.tile(x, y).block.map(|id| self.block_type(id))
    }

    /// Whether `chanx(x, y)` exists, i.e. tile `(x, y)` is the top row of its block.
    pub fn is_chanx_exist(&self, x: u32, y: u32) -> bool {
        let tile = self.tile(x, y);
        match tile.block {
            None => true,
            Some(id) => tile.height_offset + 1 == self.block_type(id).height,
        }
    }

    /// Whether `chany(x, y)` exists, i.e. tile `(x, y)` is the right column of its block.
    pub fn is_chany_exist(&self, x: u32, y: u32) -> bool {
        let tile = self.tile(x, y);
        match tile.block {
            None => true,
            Some(id) => tile.width_offset + 1 == self.block_type(id).width,
        }
    }

    /// Lower-left coordinates of every placed block, row-major.
    pub fn block_roots(&self) -> impl Iterator<Item = (u32, u32, BlockTypeId)> + '_ {
        (0..self.height).flat_map(move |y| {
            (0..self.width).filter_map(move |x| {
                let tile = self.tile(x, y);
                match tile.block {
                    Some(id) if tile.is_root() => Some((x, y, id)),
                    _ => None,
                }
            })
        })
    }

    /// Sides of a block at `(x, y)` that face a routing channel.
    ///
    /// Perimeter I/O blocks face the core only; everything else uses all four sides.
    pub fn pin_sides(&self, x: u32, y: u32) -> Vec<Side> {
        if x == 0 {
            vec![Side::Right]
        } else if x == self.width - 1 {
            vec![Side::Left]
        } else if y == 0 {
            vec![Side::Top]
        } else if y == self.height - 1 {
            vec![Side::Bottom]
        } else {
            Side::ALL.to_vec()
        }
    }
}
