//! Worldgen seam plus the built-in generators.
//!
//! Terrain algorithms live behind [`WorldGen`]; the store only ever calls
//! `generate`. The built-in generators keep the engine runnable and testable
//! without a host application.

use fastnoise_lite::{FastNoiseLite, NoiseType};

use strata_blocks::{BlockId, BlockRegistry};
use strata_world::CHUNK_SIZE;

use crate::{ChunkData, WORLDGEN_COMPLETE};

/// Fills or advances a chunk's voxel array up to the requested stage.
///
/// Implementations must be idempotent when called with a stage not greater
/// than the chunk's current `world_gen_stage`, and must advance the stage via
/// [`ChunkData::advance_world_gen_stage`] as passes complete.
pub trait WorldGen: Send + Sync {
    fn generate(
        &self,
        chunk: &mut ChunkData,
        reg: &BlockRegistry,
        origin: (i32, i32, i32),
        target_stage: u8,
    );
}

/// Flat slab of one block up to a fixed world height. Single pass.
pub struct FlatWorldGen {
    pub surface_y: i32,
    pub block: BlockId,
}

impl WorldGen for FlatWorldGen {
    fn generate(
        &self,
        chunk: &mut ChunkData,
        reg: &BlockRegistry,
        origin: (i32, i32, i32),
        target_stage: u8,
    ) {
        if chunk.world_gen_stage() >= target_stage {
            return;
        }
        let s = CHUNK_SIZE as usize;
        for z in 0..s {
            for x in 0..s {
                for y in 0..s {
                    let wy = origin.1 + y as i32;
                    if wy <= self.surface_y {
                        chunk.set(reg, x, y, z, self.block);
                    }
                }
            }
        }
        chunk.advance_world_gen_stage(WORLDGEN_COMPLETE);
    }
}

/// Noise heightmap terrain: stone body, soil band, surface block. Single pass.
pub struct TerrainWorldGen {
    noise: FastNoiseLite,
    base_height: i32,
    amplitude: f32,
    stone: BlockId,
    soil: BlockId,
    surface: BlockId,
}

impl TerrainWorldGen {
    pub fn new(
        seed: i32,
        base_height: i32,
        amplitude: f32,
        stone: BlockId,
        soil: BlockId,
        surface: BlockId,
    ) -> Self {
        let mut noise = FastNoiseLite::with_seed(seed);
        noise.set_noise_type(Some(NoiseType::OpenSimplex2));
        noise.set_frequency(Some(0.008));
        Self {
            noise,
            base_height,
            amplitude,
            stone,
            soil,
            surface,
        }
    }

    #[inline]
    fn column_height(&self, wx: i32, wz: i32) -> i32 {
        let n = self.noise.get_noise_2d(wx as f32, wz as f32);
        self.base_height + (n * self.amplitude) as i32
    }
}

impl WorldGen for TerrainWorldGen {
    fn generate(
        &self,
        chunk: &mut ChunkData,
        reg: &BlockRegistry,
        origin: (i32, i32, i32),
        target_stage: u8,
    ) {
        if chunk.world_gen_stage() >= target_stage {
            return;
        }
        let s = CHUNK_SIZE as usize;
        const SOIL_DEPTH: i32 = 3;
        for z in 0..s {
            let wz = origin.2 + z as i32;
            for x in 0..s {
                let wx = origin.0 + x as i32;
                let height = self.column_height(wx, wz);
                for y in 0..s {
                    let wy = origin.1 + y as i32;
                    if wy > height {
                        break;
                    }
                    let id = if wy == height {
                        self.surface
                    } else if wy >= height - SOIL_DEPTH {
                        self.soil
                    } else {
                        self.stone
                    };
                    chunk.set(reg, x, y, z, id);
                }
            }
        }
        chunk.advance_world_gen_stage(WORLDGEN_COMPLETE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_blocks::{Emission, FaceTextures};
    use strata_world::ChunkCoord;

    fn reg() -> (BlockRegistry, BlockId) {
        let mut reg = BlockRegistry::new();
        let stone = reg
            .register("stone", FaceTextures::default(), Emission::NONE)
            .unwrap();
        (reg, stone)
    }

    #[test]
    fn flat_gen_fills_below_surface() {
        let (reg, stone) = reg();
        let gen = FlatWorldGen {
            surface_y: 3,
            block: stone,
        };
        let mut chunk = ChunkData::new(ChunkCoord::new(0, 0, 0));
        gen.generate(&mut chunk, &reg, (0, 0, 0), WORLDGEN_COMPLETE);
        assert_eq!(chunk.get(0, 3, 0), stone);
        assert_eq!(chunk.get(0, 4, 0), strata_blocks::AIR);
        assert_eq!(chunk.world_gen_stage(), WORLDGEN_COMPLETE);
    }

    #[test]
    fn generate_is_idempotent_at_stage() {
        let (reg, stone) = reg();
        let gen = FlatWorldGen {
            surface_y: 0,
            block: stone,
        };
        let mut chunk = ChunkData::new(ChunkCoord::new(0, 0, 0));
        gen.generate(&mut chunk, &reg, (0, 0, 0), WORLDGEN_COMPLETE);
        // Mutate after generation; a repeat call at the same stage must not
        // overwrite the edit.
        chunk.set(&reg, 7, 0, 7, strata_blocks::AIR);
        gen.generate(&mut chunk, &reg, (0, 0, 0), WORLDGEN_COMPLETE);
        assert_eq!(chunk.get(7, 0, 7), strata_blocks::AIR);
    }

    #[test]
    fn terrain_gen_matches_column_heights() {
        let (reg, stone) = reg();
        let gen = TerrainWorldGen::new(1337, 10, 6.0, stone, stone, stone);
        let mut chunk = ChunkData::new(ChunkCoord::new(0, 0, 0));
        gen.generate(&mut chunk, &reg, (0, 0, 0), WORLDGEN_COMPLETE);
        for &(x, z) in &[(0usize, 0usize), (13, 5), (31, 31)] {
            let h = gen.column_height(x as i32, z as i32);
            for y in 0..CHUNK_SIZE {
                let expect_solid = y <= h;
                assert_eq!(
                    chunk.get(x, y as usize, z) != strata_blocks::AIR,
                    expect_solid,
                    "column ({x},{z}) at y={y}"
                );
            }
        }
    }
}
