//! Chunk voxel storage, packed light field, and generation stages.
#![forbid(unsafe_code)]

use std::sync::{Arc, RwLock};

use strata_blocks::{BlockId, BlockRegistry, AIR};
use strata_world::{ChunkCoord, CHUNK_SIZE, CHUNK_VOLUME};

pub mod codec;
pub mod light;
pub mod worldgen;

pub use light::{LightChannel, PackedLight};
pub use worldgen::{FlatWorldGen, TerrainWorldGen, WorldGen};

/// Shared ownership of one resident chunk. The map lock of the store guards
/// map structure only; chunk contents are guarded by this per-chunk lock.
pub type ChunkHandle = Arc<RwLock<ChunkData>>;

/// `world_gen_stage` value meaning all generation passes have run.
pub const WORLDGEN_COMPLETE: u8 = 255;

/// Lighting progress of a chunk. Never regresses.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum LightingStage {
    WorldGenInProgress = 0,
    ReadyForLighting = 1,
    LocalLightCalculated = 2,
}

impl LightingStage {
    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    #[inline]
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(LightingStage::WorldGenInProgress),
            1 => Some(LightingStage::ReadyForLighting),
            2 => Some(LightingStage::LocalLightCalculated),
            _ => None,
        }
    }
}

/// Voxel and light payload of one resident chunk.
///
/// Index order is `y + S*(x + S*z)`: the inner loop over `y` walks memory
/// contiguously, and both the mesher and the lighting engine iterate in that
/// order. The order is also the on-disk cell order (see [`codec`]).
pub struct ChunkData {
    coord: ChunkCoord,
    pub(crate) voxels: Vec<BlockId>,
    pub(crate) light: Vec<u16>,
    pub(crate) world_gen_stage: u8,
    pub(crate) lighting_stage: LightingStage,
    // Local cells holding emitter blocks, maintained by `set` so full
    // lighting seeds without scanning the whole voxel array.
    emitters: Vec<(u8, u8, u8)>,
}

impl ChunkData {
    pub fn new(coord: ChunkCoord) -> Self {
        Self {
            coord,
            voxels: vec![AIR; CHUNK_VOLUME],
            light: vec![0; CHUNK_VOLUME],
            world_gen_stage: 0,
            lighting_stage: LightingStage::WorldGenInProgress,
            emitters: Vec::new(),
        }
    }

    #[inline]
    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    #[inline]
    pub const fn index(x: usize, y: usize, z: usize) -> usize {
        y + (CHUNK_SIZE as usize) * (x + (CHUNK_SIZE as usize) * z)
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> BlockId {
        self.voxels[Self::index(x, y, z)]
    }

    /// Writes a voxel and keeps the emitter index in sync.
    pub fn set(&mut self, reg: &BlockRegistry, x: usize, y: usize, z: usize, id: BlockId) {
        let i = Self::index(x, y, z);
        let old = self.voxels[i];
        if old == id {
            return;
        }
        if reg.get(old).light_emitter {
            let cell = (x as u8, y as u8, z as u8);
            self.emitters.retain(|&e| e != cell);
        }
        self.voxels[i] = id;
        if reg.get(id).light_emitter {
            self.emitters.push((x as u8, y as u8, z as u8));
        }
    }

    #[inline]
    pub fn light(&self, x: usize, y: usize, z: usize) -> PackedLight {
        PackedLight(self.light[Self::index(x, y, z)])
    }

    #[inline]
    pub fn set_light(&mut self, x: usize, y: usize, z: usize, value: PackedLight) {
        self.light[Self::index(x, y, z)] = value.raw();
    }

    #[inline]
    pub fn light_channel(&self, x: usize, y: usize, z: usize, ch: LightChannel) -> u8 {
        self.light(x, y, z).channel(ch)
    }

    #[inline]
    pub fn set_light_channel(&mut self, x: usize, y: usize, z: usize, ch: LightChannel, v: u8) {
        let i = Self::index(x, y, z);
        self.light[i] = PackedLight(self.light[i]).with_channel(ch, v).raw();
    }

    pub fn clear_light(&mut self) {
        self.light.fill(0);
    }

    #[inline]
    pub fn emitters(&self) -> &[(u8, u8, u8)] {
        &self.emitters
    }

    /// Rebuilds the emitter index from the voxel array, used after bulk
    /// writes that bypass `set` (worldgen fills, codec decode).
    pub fn rebuild_emitters(&mut self, reg: &BlockRegistry) {
        self.emitters.clear();
        for z in 0..CHUNK_SIZE as usize {
            for x in 0..CHUNK_SIZE as usize {
                for y in 0..CHUNK_SIZE as usize {
                    if reg.get(self.get(x, y, z)).light_emitter {
                        self.emitters.push((x as u8, y as u8, z as u8));
                    }
                }
            }
        }
    }

    #[inline]
    pub fn world_gen_stage(&self) -> u8 {
        self.world_gen_stage
    }

    /// Monotonic: a lower stage than the current one is ignored.
    #[inline]
    pub fn advance_world_gen_stage(&mut self, stage: u8) {
        self.world_gen_stage = self.world_gen_stage.max(stage);
    }

    #[inline]
    pub fn lighting_stage(&self) -> LightingStage {
        self.lighting_stage
    }

    /// Monotonic: a lower stage than the current one is ignored.
    #[inline]
    pub fn advance_lighting_stage(&mut self, stage: LightingStage) {
        self.lighting_stage = self.lighting_stage.max(stage);
    }

    /// Raw voxel cells in index order. Used by the codec.
    #[inline]
    pub fn voxel_cells(&self) -> &[BlockId] {
        &self.voxels
    }

    /// Raw packed-light cells in index order. Used by the codec.
    #[inline]
    pub fn light_cells(&self) -> &[u16] {
        &self.light
    }
}
