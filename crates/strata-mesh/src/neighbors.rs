use strata_blocks::BlockId;
use strata_chunk::{ChunkData, PackedLight};
use strata_world::CHUNK_SIZE;

/// The 3×3×3 neighborhood a mesh build reads from: the center chunk plus its
/// 26 neighbors, any of which may be unloaded. Out-of-range local coordinates
/// are normalized into `[0, S)` and dispatched to the matching slot, instead
/// of six axis-specific branches at every seam.
pub struct NeighborRefs<'a> {
    slots: [Option<&'a ChunkData>; 27],
}

#[inline]
const fn slot_index(dx: i32, dy: i32, dz: i32) -> usize {
    ((dx + 1) + 3 * (dy + 1) + 9 * (dz + 1)) as usize
}

impl<'a> NeighborRefs<'a> {
    /// Builds the view from slots ordered x-fastest, i.e.
    /// `index = (dx+1) + 3*(dy+1) + 9*(dz+1)` for offsets in `-1..=1`.
    pub fn new(slots: [Option<&'a ChunkData>; 27]) -> Self {
        Self { slots }
    }

    /// A view with only the center chunk present.
    pub fn solo(center: &'a ChunkData) -> Self {
        let mut slots = [None; 27];
        slots[slot_index(0, 0, 0)] = Some(center);
        Self { slots }
    }

    #[inline]
    pub fn center(&self) -> Option<&'a ChunkData> {
        self.slots[slot_index(0, 0, 0)]
    }

    #[inline]
    fn resolve(&self, lx: i32, ly: i32, lz: i32) -> Option<(&'a ChunkData, usize, usize, usize)> {
        let (dx, cx) = (lx.div_euclid(CHUNK_SIZE), lx.rem_euclid(CHUNK_SIZE));
        let (dy, cy) = (ly.div_euclid(CHUNK_SIZE), ly.rem_euclid(CHUNK_SIZE));
        let (dz, cz) = (lz.div_euclid(CHUNK_SIZE), lz.rem_euclid(CHUNK_SIZE));
        debug_assert!((-1..=1).contains(&dx) && (-1..=1).contains(&dy) && (-1..=1).contains(&dz));
        let chunk = self.slots[slot_index(dx, dy, dz)]?;
        Some((chunk, cx as usize, cy as usize, cz as usize))
    }

    /// Voxel at a center-chunk-local coordinate which may spill up to one
    /// chunk outside. `None` when that part of the world is not loaded.
    #[inline]
    pub fn block_at(&self, lx: i32, ly: i32, lz: i32) -> Option<BlockId> {
        self.resolve(lx, ly, lz)
            .map(|(chunk, x, y, z)| chunk.get(x, y, z))
    }

    /// True when the cell is air or outside the loaded world: a face against
    /// it is visible.
    #[inline]
    pub fn is_open(&self, lx: i32, ly: i32, lz: i32) -> bool {
        match self.block_at(lx, ly, lz) {
            Some(id) => id == strata_blocks::AIR,
            None => true,
        }
    }

    /// Packed light at the cell; dark when unloaded.
    #[inline]
    pub fn light_at(&self, lx: i32, ly: i32, lz: i32) -> PackedLight {
        self.resolve(lx, ly, lz)
            .map(|(chunk, x, y, z)| chunk.light(x, y, z))
            .unwrap_or(PackedLight::DARK)
    }

    /// Light of an air cell, `None` when the cell is opaque or unloaded.
    /// Smooth lighting averages only over these.
    #[inline]
    pub fn air_light_at(&self, lx: i32, ly: i32, lz: i32) -> Option<PackedLight> {
        let (chunk, x, y, z) = self.resolve(lx, ly, lz)?;
        (chunk.get(x, y, z) == strata_blocks::AIR).then(|| chunk.light(x, y, z))
    }
}
