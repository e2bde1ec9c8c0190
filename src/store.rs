//! Resident chunk map with shared-read / exclusive-write locking, stage
//! driving, and on-disk persistence.
//!
//! The map lock guards map structure only. Chunk contents are guarded by the
//! per-chunk lock inside [`ChunkHandle`]; lighting passes are serialized by
//! one global mutex owned here.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use hashbrown::HashMap;
use log::warn;

use strata_blocks::{BlockId, BlockRegistry, AIR};
use strata_chunk::{ChunkData, ChunkHandle, LightingStage, WorldGen, WORLDGEN_COMPLETE};
use strata_lighting::{compute_full_lighting, ChunkSource, RemeshSet};
use strata_world::{block_to_local, world_to_block, ChunkCoord, WorldBounds};

use crate::persist::{self, ChunkIoError};

pub struct ChunkStore {
    chunks: RwLock<HashMap<ChunkCoord, ChunkHandle>>,
    bounds: WorldBounds,
    registry: Arc<BlockRegistry>,
    worldgen: Arc<dyn WorldGen>,
    // Serializes every lighting pass. Lighting holds at most one chunk lock
    // at a time beneath it, so it cannot deadlock against mesh readers.
    lighting_lock: Mutex<()>,
    // Neighbors dirtied by store-driven full lighting, drained by the engine
    // into remesh jobs.
    pending_dirty: Mutex<RemeshSet>,
    save_root: Option<PathBuf>,
}

impl ChunkStore {
    pub fn new(
        bounds: WorldBounds,
        registry: Arc<BlockRegistry>,
        worldgen: Arc<dyn WorldGen>,
        save_root: Option<PathBuf>,
    ) -> Self {
        Self {
            chunks: RwLock::new(HashMap::new()),
            bounds,
            registry,
            worldgen,
            lighting_lock: Mutex::new(()),
            pending_dirty: Mutex::new(RemeshSet::new()),
            save_root,
        }
    }

    #[inline]
    pub fn registry(&self) -> &Arc<BlockRegistry> {
        &self.registry
    }

    #[inline]
    pub fn bounds(&self) -> WorldBounds {
        self.bounds
    }

    /// Chunk at `coord`, loading from disk or generating as needed, driven
    /// forward to the requested stages on the calling thread.
    pub fn get(
        &self,
        coord: ChunkCoord,
        req_light: LightingStage,
        req_gen: u8,
    ) -> Option<ChunkHandle> {
        if !self.bounds.contains(coord) {
            return None;
        }
        let handle = self.obtain(coord);
        self.ensure_stages(&handle, req_light, req_gen);
        Some(handle)
    }

    /// The resident chunk only if it already satisfies both stage
    /// requirements. Never blocks on generation or lighting.
    pub fn try_get(
        &self,
        coord: ChunkCoord,
        req_light: LightingStage,
        req_gen: u8,
    ) -> Option<ChunkHandle> {
        let handle = self.resident_chunk(coord)?;
        let g = handle.read().unwrap();
        if g.world_gen_stage() >= req_gen && g.lighting_stage() >= req_light {
            drop(g);
            Some(handle)
        } else {
            None
        }
    }

    #[inline]
    pub fn resident_chunk(&self, coord: ChunkCoord) -> Option<ChunkHandle> {
        self.chunks.read().unwrap().get(&coord).cloned()
    }

    pub fn resident_coords(&self) -> Vec<ChunkCoord> {
        self.chunks.read().unwrap().keys().copied().collect()
    }

    /// Block at a world-space position; air when the chunk is not resident.
    pub fn get_block(&self, wx: f32, wy: f32, wz: f32) -> BlockId {
        let (bx, by, bz) = world_to_block(wx, wy, wz);
        let coord = ChunkCoord::of_block(bx, by, bz);
        let Some(handle) = self.resident_chunk(coord) else {
            return AIR;
        };
        let (lx, ly, lz) = block_to_local(bx, by, bz);
        let result = handle.read().unwrap().get(lx, ly, lz);
        result
    }

    /// Raw voxel write; returns the previous id when anything changed.
    /// Lighting and remesh scheduling are the engine's responsibility.
    pub(crate) fn write_block(&self, b: (i32, i32, i32), id: BlockId) -> Option<BlockId> {
        let coord = ChunkCoord::of_block(b.0, b.1, b.2);
        if !self.bounds.contains(coord) {
            return None;
        }
        let handle = self.resident_chunk(coord)?;
        let (lx, ly, lz) = block_to_local(b.0, b.1, b.2);
        let mut g = handle.write().unwrap();
        let old = g.get(lx, ly, lz);
        if old == id {
            return None;
        }
        g.set(&self.registry, lx, ly, lz, id);
        Some(old)
    }

    pub fn save(&self, coord: ChunkCoord) -> Result<(), ChunkIoError> {
        let Some(root) = &self.save_root else {
            return Ok(());
        };
        let Some(handle) = self.resident_chunk(coord) else {
            return Ok(());
        };
        let g = handle.read().unwrap();
        persist::save_chunk(root, &g)
    }

    /// Reads a persisted chunk without making it resident. A corrupt or
    /// version-mismatched file is discarded with a warning.
    pub fn load(&self, coord: ChunkCoord) -> Option<ChunkData> {
        let root = self.save_root.as_ref()?;
        match persist::load_chunk(root, coord, &self.registry) {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!(
                    "discarding persisted chunk ({}, {}, {}): {}",
                    coord.cx, coord.cy, coord.cz, e
                );
                None
            }
        }
    }

    /// Saves (best effort) and drops the chunk. A failed save is logged and
    /// eviction proceeds; the data is regenerated or re-saved next time.
    pub fn evict(&self, coord: ChunkCoord) {
        if let Err(e) = self.save(coord) {
            log::error!(
                "failed to save chunk ({}, {}, {}) during eviction: {}",
                coord.cx,
                coord.cy,
                coord.cz,
                e
            );
        }
        self.chunks.write().unwrap().remove(&coord);
    }

    pub(crate) fn lighting_guard(&self) -> MutexGuard<'_, ()> {
        self.lighting_lock.lock().unwrap()
    }

    pub(crate) fn take_dirty(&self) -> RemeshSet {
        std::mem::take(&mut self.pending_dirty.lock().unwrap())
    }

    fn obtain(&self, coord: ChunkCoord) -> ChunkHandle {
        if let Some(handle) = self.chunks.read().unwrap().get(&coord) {
            return handle.clone();
        }
        let data = self.load_or_new(coord);
        let mut map = self.chunks.write().unwrap();
        map.entry(coord)
            .or_insert_with(|| Arc::new(RwLock::new(data)))
            .clone()
    }

    fn load_or_new(&self, coord: ChunkCoord) -> ChunkData {
        self.load(coord).unwrap_or_else(|| ChunkData::new(coord))
    }

    fn ensure_stages(&self, handle: &ChunkHandle, req_light: LightingStage, req_gen: u8) {
        // Lighting requires finished voxels.
        let want_gen = if req_light >= LightingStage::ReadyForLighting {
            WORLDGEN_COMPLETE
        } else {
            req_gen
        };
        let (gen_stage, light_stage) = {
            let g = handle.read().unwrap();
            (g.world_gen_stage(), g.lighting_stage())
        };
        if gen_stage < want_gen {
            let mut g = handle.write().unwrap();
            if g.world_gen_stage() < want_gen {
                let origin = g.coord().base();
                self.worldgen
                    .generate(&mut *g, &self.registry, origin, want_gen);
            }
            if g.world_gen_stage() == WORLDGEN_COMPLETE {
                g.advance_lighting_stage(LightingStage::ReadyForLighting);
            }
        } else if gen_stage == WORLDGEN_COMPLETE && light_stage < LightingStage::ReadyForLighting {
            handle
                .write()
                .unwrap()
                .advance_lighting_stage(LightingStage::ReadyForLighting);
        }

        if req_light >= LightingStage::LocalLightCalculated
            && handle.read().unwrap().lighting_stage() < LightingStage::LocalLightCalculated
        {
            let _light = self.lighting_guard();
            // Another thread may have lit the chunk while we waited.
            if handle.read().unwrap().lighting_stage() < LightingStage::LocalLightCalculated {
                let dirtied = compute_full_lighting(self, handle, &self.registry);
                self.pending_dirty.lock().unwrap().extend(dirtied);
            }
        }
    }
}

impl ChunkSource for ChunkStore {
    /// Synthesizes an absent chunk within bounds but does not drive its
    /// worldgen: a fresh entry stays `WorldGenInProgress`, so propagation
    /// into it is deferred instead of recursing into ungenerated regions.
    /// (Sky light steps down at full strength; forcing generation here would
    /// walk an unbounded world all the way down.)
    fn chunk(&self, coord: ChunkCoord) -> Option<ChunkHandle> {
        if !self.bounds.contains(coord) {
            return None;
        }
        Some(self.obtain(coord))
    }

    fn resident(&self, coord: ChunkCoord) -> Option<ChunkHandle> {
        self.resident_chunk(coord)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_chunk::FlatWorldGen;

    fn flat_store(bounds: WorldBounds) -> ChunkStore {
        let mut registry = BlockRegistry::new();
        let stone = registry
            .register(
                "stone",
                strata_blocks::FaceTextures::default(),
                strata_blocks::Emission::NONE,
            )
            .unwrap();
        ChunkStore::new(
            bounds,
            Arc::new(registry),
            Arc::new(FlatWorldGen {
                surface_y: 3,
                block: stone,
            }),
            None,
        )
    }

    #[test]
    fn get_synthesizes_and_drives_stages() {
        let store = flat_store(WorldBounds::UNBOUNDED);
        let coord = ChunkCoord::new(2, 0, -1);
        let h = store
            .get(coord, LightingStage::LocalLightCalculated, 0)
            .unwrap();
        let g = h.read().unwrap();
        assert_eq!(g.world_gen_stage(), WORLDGEN_COMPLETE);
        assert_eq!(g.lighting_stage(), LightingStage::LocalLightCalculated);
        // Flat terrain up to world y=3, open sky above
        assert_ne!(g.get(0, 3, 0), AIR);
        assert_eq!(g.get(0, 4, 0), AIR);
        assert_eq!(
            g.light_channel(0, 10, 0, strata_chunk::LightChannel::Sky),
            15
        );
    }

    #[test]
    fn try_get_never_generates() {
        let store = flat_store(WorldBounds::UNBOUNDED);
        let coord = ChunkCoord::new(0, 0, 0);
        assert!(store
            .try_get(coord, LightingStage::WorldGenInProgress, 0)
            .is_none());
        store.get(coord, LightingStage::ReadyForLighting, 0).unwrap();
        assert!(store
            .try_get(coord, LightingStage::ReadyForLighting, 0)
            .is_some());
        // Stage requirement above what the chunk has reached
        assert!(store
            .try_get(coord, LightingStage::LocalLightCalculated, 0)
            .is_none());
    }

    #[test]
    fn out_of_bounds_returns_none_and_never_allocates() {
        let bounds = WorldBounds {
            size_x: 1,
            size_z: 1,
            min_y: -1,
            max_y: 1,
        };
        let store = flat_store(bounds);
        assert!(store
            .get(ChunkCoord::new(5, 0, 0), LightingStage::ReadyForLighting, 0)
            .is_none());
        assert!(store.resident_coords().is_empty());
    }

    #[test]
    fn get_block_is_air_when_not_resident() {
        let store = flat_store(WorldBounds::UNBOUNDED);
        assert_eq!(store.get_block(10.5, 2.0, 10.5), AIR);
        store
            .get(ChunkCoord::new(0, 0, 0), LightingStage::ReadyForLighting, 0)
            .unwrap();
        assert_ne!(store.get_block(10.5, 2.0, 10.5), AIR);
    }
}
