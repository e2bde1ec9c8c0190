//! Engine facade: wires the store, lighting engine, mesher, work pool, and
//! streaming thread into the public chunk-store contract.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, Weak};
use std::thread::JoinHandle;
use std::time::Duration;

use hashbrown::HashMap;

use strata_blocks::{BlockId, BlockRegistry, Emission, AIR};
use strata_chunk::{ChunkData, ChunkHandle, LightingStage, WorldGen, WORLDGEN_COMPLETE};
use strata_lighting::{self as lighting, RemeshSet};
use strata_mesh::{build_chunk_mesh_with_cancel, ChunkMesh, MeshLighting, NeighborRefs};
use strata_runtime::{Priority, WorkPool};
use strata_world::{block_to_local, world_to_block, ChunkCoord, WorldBounds, CHUNK_SIZE};

use crate::persist::ChunkIoError;
use crate::renderer::ChunkRenderer;
use crate::store::ChunkStore;
use crate::streaming;
use crate::EngineConfig;

/// Lighting work implied by a voxel transition.
enum LightDelta {
    EmitterPlaced { emission: Emission, over_air: bool },
    EmitterRemoved,
    BlockerPlaced { over_air: bool },
    BlockerRemoved,
}

pub(crate) struct EngineShared {
    pub(crate) store: ChunkStore,
    pub(crate) renderers: RwLock<HashMap<ChunkCoord, Arc<ChunkRenderer>>>,
    // Out-of-range renderers parked here until the next render call so any
    // GPU-side resources survive the handoff.
    pub(crate) deletion_queue: Mutex<Vec<Arc<ChunkRenderer>>>,
    pub(crate) pool: WorkPool,
    pub(crate) viewer: Mutex<Option<(f32, f32, f32)>>,
    pub(crate) view_distance: Mutex<(i32, i32)>,
    pub(crate) mesh_lighting: MeshLighting,
    pub(crate) stop: AtomicBool,
}

impl EngineShared {
    pub(crate) fn renderer(&self, coord: ChunkCoord) -> Option<Arc<ChunkRenderer>> {
        self.renderers.read().unwrap().get(&coord).cloned()
    }

    /// Schedules one rebuild job per chunk id in the set.
    pub(crate) fn schedule_remesh_set(self: &Arc<Self>, set: &RemeshSet, priority: Priority) {
        for &coord in set {
            self.schedule_remesh(coord, priority);
        }
    }

    pub(crate) fn schedule_remesh(self: &Arc<Self>, coord: ChunkCoord, priority: Priority) {
        let Some(renderer) = self.renderer(coord) else {
            return;
        };
        let version = renderer.next_version();
        let weak = Arc::downgrade(&renderer);
        let shared = self.clone();
        self.pool.submit(priority, move || {
            // Upgrade at job start so jobs never keep evicted chunks alive
            let Some(renderer) = weak.upgrade() else {
                return;
            };
            shared.run_mesh_build(&renderer, version);
        });
    }

    /// Bumps every version up front and rebuilds the batch in one job, so a
    /// multi-chunk edit becomes visible as a unit.
    pub(crate) fn schedule_remesh_batch(self: &Arc<Self>, coords: &[ChunkCoord], priority: Priority) {
        let jobs: Vec<(Weak<ChunkRenderer>, u32)> = coords
            .iter()
            .filter_map(|&coord| {
                let renderer = self.renderer(coord)?;
                let version = renderer.next_version();
                Some((Arc::downgrade(&renderer), version))
            })
            .collect();
        if jobs.is_empty() {
            return;
        }
        let shared = self.clone();
        self.pool.submit(priority, move || {
            for (weak, version) in &jobs {
                let Some(renderer) = weak.upgrade() else {
                    continue;
                };
                shared.run_mesh_build(&renderer, *version);
            }
        });
    }

    /// Builds and publishes one mesh unless the version tag moved on.
    fn run_mesh_build(&self, renderer: &Arc<ChunkRenderer>, version: u32) {
        if renderer.current_version() != version {
            return;
        }
        let coord = renderer.coord();
        // Resolve the neighborhood before taking the generation lock. Face
        // neighbors are synthesized so seams never flicker open; diagonal
        // neighbors contribute only if already resident.
        let mut handles: [Option<ChunkHandle>; 27] = std::array::from_fn(|_| None);
        for dz in -1..=1i32 {
            for dy in -1..=1i32 {
                for dx in -1..=1i32 {
                    let idx = ((dx + 1) + 3 * (dy + 1) + 9 * (dz + 1)) as usize;
                    let ncoord = coord.offset(dx, dy, dz);
                    handles[idx] = if dx.abs() + dy.abs() + dz.abs() <= 1 {
                        // Face neighbors need real voxels for culling
                        self.store.get(ncoord, LightingStage::ReadyForLighting, 0)
                    } else {
                        self.store.resident_chunk(ncoord)
                    };
                }
            }
        }
        let _generation = renderer.generation_lock();
        if renderer.current_version() != version {
            return;
        }
        let guards: Vec<Option<RwLockReadGuard<'_, ChunkData>>> = handles
            .iter()
            .map(|h| h.as_ref().map(|h| h.read().unwrap()))
            .collect();
        let mut slots: [Option<&ChunkData>; 27] = [None; 27];
        for (slot, guard) in slots.iter_mut().zip(guards.iter()) {
            *slot = guard.as_deref();
        }
        let nbh = NeighborRefs::new(slots);
        let built = build_chunk_mesh_with_cancel(&nbh, self.store.registry(), self.mesh_lighting, &|| {
            renderer.current_version() != version
        });
        drop(guards);
        if let Some(mesh) = built {
            renderer.publish(version, mesh);
        }
    }

    /// Streaming-load job: bring the chunk to `LocalLightCalculated`, give it
    /// a renderer, mesh it, and refresh the neighbors its lighting dirtied.
    pub(crate) fn run_chunk_load(self: &Arc<Self>, coord: ChunkCoord) {
        if self.stop.load(Ordering::Relaxed) || self.renderer(coord).is_some() {
            return;
        }
        if self
            .store
            .get(coord, LightingStage::LocalLightCalculated, WORLDGEN_COMPLETE)
            .is_none()
        {
            return;
        }
        let dirtied = self.store.take_dirty();
        let renderer = {
            let mut map = self.renderers.write().unwrap();
            map.entry(coord)
                .or_insert_with(|| Arc::new(ChunkRenderer::new(coord)))
                .clone()
        };
        let version = renderer.next_version();
        self.run_mesh_build(&renderer, version);
        self.schedule_remesh_set(&dirtied, Priority::Medium);
    }
}

/// The chunk residency and mutation engine.
///
/// Owns the resident chunk map, the per-chunk renderers, the worker pool,
/// and the streaming thread. One instance serves the render thread, the
/// gameplay layer, and the background streaming pipeline concurrently.
pub struct ChunkEngine {
    shared: Arc<EngineShared>,
    streaming: Option<JoinHandle<()>>,
}

impl ChunkEngine {
    pub fn new(
        config: EngineConfig,
        registry: Arc<BlockRegistry>,
        worldgen: Arc<dyn WorldGen>,
    ) -> Self {
        let bounds = WorldBounds {
            size_x: config.world_size_x,
            size_z: config.world_size_z,
            min_y: config.world_min_y,
            max_y: config.world_max_y,
        };
        let workers = if config.worker_count == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(8)
        } else {
            config.worker_count
        };
        let shared = Arc::new(EngineShared {
            store: ChunkStore::new(bounds, registry, worldgen, config.save_root.clone()),
            renderers: RwLock::new(HashMap::new()),
            deletion_queue: Mutex::new(Vec::new()),
            pool: WorkPool::new(workers),
            viewer: Mutex::new(None),
            view_distance: Mutex::new((config.render_distance, config.render_height)),
            mesh_lighting: if config.smooth_lighting {
                MeshLighting::Smooth
            } else {
                MeshLighting::Flat
            },
            stop: AtomicBool::new(false),
        });
        let streaming = {
            let shared = shared.clone();
            std::thread::spawn(move || streaming::run(shared))
        };
        Self {
            shared,
            streaming: Some(streaming),
        }
    }

    /// Chunk access driven forward to the requested stages; see the store.
    pub fn get(
        &self,
        coord: ChunkCoord,
        req_light: LightingStage,
        req_gen: u8,
    ) -> Option<ChunkHandle> {
        let handle = self.shared.store.get(coord, req_light, req_gen)?;
        // Full lighting run by this call may have dirtied neighbor meshes
        let dirtied = self.shared.store.take_dirty();
        self.shared.schedule_remesh_set(&dirtied, Priority::Medium);
        Some(handle)
    }

    pub fn try_get(
        &self,
        coord: ChunkCoord,
        req_light: LightingStage,
        req_gen: u8,
    ) -> Option<ChunkHandle> {
        self.shared.store.try_get(coord, req_light, req_gen)
    }

    pub fn get_renderer(&self, coord: ChunkCoord) -> Option<Arc<ChunkRenderer>> {
        self.shared.renderer(coord)
    }

    pub fn get_block(&self, wx: f32, wy: f32, wz: f32) -> BlockId {
        self.shared.store.get_block(wx, wy, wz)
    }

    /// Mutates one voxel and schedules the derived lighting and remesh work.
    /// Silently does nothing for out-of-bounds or non-resident positions.
    pub fn set_block(&self, wx: f32, wy: f32, wz: f32, id: BlockId) {
        let (bx, by, bz) = world_to_block(wx, wy, wz);
        let coord = ChunkCoord::of_block(bx, by, bz);
        let Some(old) = self.shared.store.write_block((bx, by, bz), id) else {
            return;
        };

        // Owner plus the facing neighbor for each border axis
        let (lx, ly, lz) = block_to_local(bx, by, bz);
        let last = (CHUNK_SIZE - 1) as usize;
        let mut batch = vec![coord];
        if lx == 0 {
            batch.push(coord.offset(-1, 0, 0));
        } else if lx == last {
            batch.push(coord.offset(1, 0, 0));
        }
        if ly == 0 {
            batch.push(coord.offset(0, -1, 0));
        } else if ly == last {
            batch.push(coord.offset(0, 1, 0));
        }
        if lz == 0 {
            batch.push(coord.offset(0, 0, -1));
        } else if lz == last {
            batch.push(coord.offset(0, 0, 1));
        }
        self.shared.schedule_remesh_batch(&batch, Priority::High);

        let reg = self.shared.store.registry();
        let new_def = reg.get(id);
        let old_emitter = reg.get(old).light_emitter;
        let delta = if new_def.light_emitter {
            Some(LightDelta::EmitterPlaced {
                emission: new_def.emission,
                over_air: old == AIR,
            })
        } else if id == AIR {
            if old_emitter {
                Some(LightDelta::EmitterRemoved)
            } else {
                Some(LightDelta::BlockerRemoved)
            }
        } else if old == AIR || old_emitter {
            Some(LightDelta::BlockerPlaced { over_air: old == AIR })
        } else {
            // Opaque replaced by opaque: light is unaffected
            None
        };
        let Some(delta) = delta else {
            return;
        };

        let shared = self.shared.clone();
        let p = (bx, by, bz);
        self.shared.pool.submit(Priority::High, move || {
            let remesh = {
                let _light = shared.store.lighting_guard();
                let store = &shared.store;
                match delta {
                    LightDelta::EmitterPlaced { emission, over_air } => {
                        let mut set = lighting::add_emitter_light(store, p, emission);
                        if over_air {
                            set.extend(lighting::add_sky_blocker(store, p));
                        }
                        set
                    }
                    LightDelta::EmitterRemoved => {
                        let mut set = lighting::remove_emitter_light(store, p);
                        set.extend(lighting::remove_sky_blocker(store, p));
                        set
                    }
                    LightDelta::BlockerPlaced { over_air } => {
                        let mut set = lighting::add_blocker_light(store, p);
                        if over_air {
                            set.extend(lighting::add_sky_blocker(store, p));
                        }
                        set
                    }
                    LightDelta::BlockerRemoved => {
                        let mut set = lighting::remove_blocker_light(store, p);
                        set.extend(lighting::remove_sky_blocker(store, p));
                        set
                    }
                }
            };
            shared.schedule_remesh_set(&remesh, Priority::High);
        });
    }

    pub fn save(&self, coord: ChunkCoord) -> Result<(), ChunkIoError> {
        self.shared.store.save(coord)
    }

    /// Reads a persisted chunk from disk without making it resident.
    pub fn load(&self, coord: ChunkCoord) -> Option<ChunkData> {
        self.shared.store.load(coord)
    }

    /// Saves and drops the chunk plus its renderer, regardless of distance.
    pub fn evict(&self, coord: ChunkCoord) {
        if let Some(renderer) = self.shared.renderers.write().unwrap().remove(&coord) {
            self.shared.deletion_queue.lock().unwrap().push(renderer);
        }
        self.shared.store.evict(coord);
    }

    pub fn set_viewer(&self, x: f32, y: f32, z: f32) {
        *self.shared.viewer.lock().unwrap() = Some((x, y, z));
    }

    pub fn set_view_distance(&self, render_distance: i32, render_height: i32) {
        *self.shared.view_distance.lock().unwrap() = (render_distance, render_height);
    }

    /// Render-thread entry: frees parked renderers, then hands every freshly
    /// meshed chunk to `upload`.
    pub fn render<F: FnMut(ChunkCoord, &ChunkMesh)>(&self, mut upload: F) {
        self.shared.deletion_queue.lock().unwrap().clear();
        let renderers: Vec<Arc<ChunkRenderer>> = self
            .shared
            .renderers
            .read()
            .unwrap()
            .values()
            .cloned()
            .collect();
        for renderer in renderers {
            if renderer.take_dirty() {
                renderer.with_mesh(|mesh| upload(renderer.coord(), mesh));
            }
        }
    }

    /// Direct access to the store for hosts that bypass the facade.
    pub fn store(&self) -> &ChunkStore {
        &self.shared.store
    }

    /// Blocks until the work pool drains; for tests and controlled shutdown.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.shared.pool.wait_idle(timeout)
    }

    fn shutdown_impl(&mut self) {
        self.shared.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.streaming.take() {
            let _ = handle.join();
        }
        self.shared.pool.join();
    }
}

impl Drop for ChunkEngine {
    fn drop(&mut self) {
        self.shutdown_impl();
    }
}
