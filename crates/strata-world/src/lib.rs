//! Chunk coordinates, floored world math, and world bounds.
#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

/// Edge length of a cubic chunk in voxels.
pub const CHUNK_SIZE: i32 = 32;
/// Voxel count of one chunk.
pub const CHUNK_VOLUME: usize = (CHUNK_SIZE as usize) * (CHUNK_SIZE as usize) * (CHUNK_SIZE as usize);

/// Address of one cubic chunk in the infinite grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub cx: i32,
    pub cy: i32,
    pub cz: i32,
}

impl ChunkCoord {
    #[inline]
    pub const fn new(cx: i32, cy: i32, cz: i32) -> Self {
        Self { cx, cy, cz }
    }

    /// Chunk containing the given block position. Floored division, so
    /// negative coordinates land in the correct chunk.
    #[inline]
    pub fn of_block(bx: i32, by: i32, bz: i32) -> Self {
        Self {
            cx: bx.div_euclid(CHUNK_SIZE),
            cy: by.div_euclid(CHUNK_SIZE),
            cz: bz.div_euclid(CHUNK_SIZE),
        }
    }

    /// Chunk containing the given world-space position.
    #[inline]
    pub fn of_world(wx: f32, wy: f32, wz: f32) -> Self {
        let (bx, by, bz) = world_to_block(wx, wy, wz);
        Self::of_block(bx, by, bz)
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            cx: self.cx + dx,
            cy: self.cy + dy,
            cz: self.cz + dz,
        }
    }

    /// Block position of this chunk's minimum corner.
    #[inline]
    pub fn base(self) -> (i32, i32, i32) {
        (
            self.cx * CHUNK_SIZE,
            self.cy * CHUNK_SIZE,
            self.cz * CHUNK_SIZE,
        )
    }

    /// Chebyshev distance in chunks, split into horizontal and vertical parts.
    #[inline]
    pub fn chebyshev_hv(self, other: ChunkCoord) -> (i32, i32) {
        let dh = (self.cx - other.cx).abs().max((self.cz - other.cz).abs());
        let dv = (self.cy - other.cy).abs();
        (dh, dv)
    }
}

impl From<(i32, i32, i32)> for ChunkCoord {
    fn from(value: (i32, i32, i32)) -> Self {
        Self::new(value.0, value.1, value.2)
    }
}

/// Component-wise floor of a world-space position.
#[inline]
pub fn world_to_block(wx: f32, wy: f32, wz: f32) -> (i32, i32, i32) {
    (
        wx.floor() as i32,
        wy.floor() as i32,
        wz.floor() as i32,
    )
}

/// Local cell of a block within its owning chunk, always in `[0, CHUNK_SIZE)`.
#[inline]
pub fn block_to_local(bx: i32, by: i32, bz: i32) -> (usize, usize, usize) {
    (
        bx.rem_euclid(CHUNK_SIZE) as usize,
        by.rem_euclid(CHUNK_SIZE) as usize,
        bz.rem_euclid(CHUNK_SIZE) as usize,
    )
}

/// Local cell of a block relative to an explicit chunk. The result may be
/// out of `[0, CHUNK_SIZE)` when the block lies outside that chunk.
#[inline]
pub fn block_to_local_of(bx: i32, by: i32, bz: i32, coord: ChunkCoord) -> (i32, i32, i32) {
    let (ox, oy, oz) = coord.base();
    (bx - ox, by - oy, bz - oz)
}

/// Optional hard extents of the world in chunk coordinates.
///
/// A zero value leaves that axis unbounded; `size_x`/`size_z` bound the
/// horizontal axes symmetrically around the origin.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldBounds {
    pub size_x: i32,
    pub size_z: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl WorldBounds {
    pub const UNBOUNDED: WorldBounds = WorldBounds {
        size_x: 0,
        size_z: 0,
        min_y: 0,
        max_y: 0,
    };

    #[inline]
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        (self.size_x == 0 || (coord.cx >= -self.size_x && coord.cx <= self.size_x))
            && (self.size_z == 0 || (coord.cz >= -self.size_z && coord.cz <= self.size_z))
            && (self.min_y == 0 || coord.cy >= self.min_y)
            && (self.max_y == 0 || coord.cy <= self.max_y)
    }
}
