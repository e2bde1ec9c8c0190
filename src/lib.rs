//! Chunked voxel world engine: residency, lighting, meshing, streaming.
//!
//! The world is an infinite grid of 32³ chunks. [`ChunkEngine`] is the
//! entry point: it owns the resident chunk map, runs incremental block- and
//! sky-light propagation over block edits, derives face-culled meshes on a
//! priority worker pool with version-tagged cancellation, and streams chunks
//! in and out of residency as the viewer moves. Terrain generation and block
//! authoring stay outside, behind the [`WorldGen`] and [`BlockRegistry`]
//! seams.
#![forbid(unsafe_code)]

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

mod engine;
pub mod persist;
mod renderer;
mod store;
mod streaming;

pub use engine::ChunkEngine;
pub use renderer::ChunkRenderer;
pub use store::ChunkStore;

pub use strata_blocks::{
    BlockDef, BlockId, BlockRegistry, Emission, FaceRole, FaceTextures, UvRect, AIR,
};
pub use strata_chunk::{
    ChunkData, ChunkHandle, FlatWorldGen, LightChannel, LightingStage, PackedLight,
    TerrainWorldGen, WorldGen, WORLDGEN_COMPLETE,
};
pub use strata_lighting::{ChunkSource, RemeshSet};
pub use strata_mesh::{ChunkMesh, ChunkVertex, MeshLighting};
pub use strata_runtime::{Priority, WorkPool};
pub use strata_world::{ChunkCoord, WorldBounds, CHUNK_SIZE, CHUNK_VOLUME};

/// Engine construction options; see the per-field docs for units.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Worker threads in the pool; 0 means one per available core.
    pub worker_count: usize,
    /// Horizontal residency radius around the viewer, in chunks (Chebyshev).
    pub render_distance: i32,
    /// Vertical residency radius around the viewer, in chunks.
    pub render_height: i32,
    /// Hard horizontal world bound in chunks; 0 leaves the axis unbounded.
    pub world_size_x: i32,
    pub world_size_z: i32,
    /// Hard vertical chunk bounds; 0 leaves that side unbounded.
    pub world_min_y: i32,
    pub world_max_y: i32,
    /// Smooth (corner-averaged) instead of flat per-face lighting.
    pub smooth_lighting: bool,
    /// Directory for persisted chunks; `None` disables persistence.
    pub save_root: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_count: 0,
            render_distance: 8,
            render_height: 2,
            world_size_x: 0,
            world_size_z: 0,
            world_min_y: 0,
            world_max_y: 0,
            smooth_lighting: false,
            save_root: None,
        }
    }
}
