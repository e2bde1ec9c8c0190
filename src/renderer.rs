//! Per-chunk render-side state: the published mesh and the version tag used
//! to cancel superseded build jobs.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};

use strata_mesh::ChunkMesh;
use strata_world::ChunkCoord;

pub struct ChunkRenderer {
    coord: ChunkCoord,
    // Monotonic cancellation tag: schedulers increment-and-capture, jobs
    // compare before publishing. The last scheduled job wins.
    version: AtomicU32,
    published_version: AtomicU32,
    // Serializes mesh builds for this renderer; at most one runs at a time.
    generation: Mutex<()>,
    mesh: Mutex<ChunkMesh>,
    dirty: AtomicBool,
}

impl ChunkRenderer {
    pub fn new(coord: ChunkCoord) -> Self {
        Self {
            coord,
            version: AtomicU32::new(0),
            published_version: AtomicU32::new(0),
            generation: Mutex::new(()),
            mesh: Mutex::new(ChunkMesh::default()),
            dirty: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    #[inline]
    pub fn current_version(&self) -> u32 {
        self.version.load(Ordering::Acquire)
    }

    /// Reserves the next version for a newly scheduled job.
    #[inline]
    pub fn next_version(&self) -> u32 {
        self.version.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Version of the mesh currently held, 0 before the first publish.
    #[inline]
    pub fn published_version(&self) -> u32 {
        self.published_version.load(Ordering::Acquire)
    }

    pub(crate) fn generation_lock(&self) -> MutexGuard<'_, ()> {
        self.generation.lock().unwrap()
    }

    /// Publishes a finished mesh unless the job was superseded while it ran.
    /// Returns true when the mesh was installed.
    pub fn publish(&self, version: u32, mesh: ChunkMesh) -> bool {
        let mut slot = self.mesh.lock().unwrap();
        if self.current_version() != version {
            return false;
        }
        *slot = mesh;
        self.published_version.store(version, Ordering::Release);
        self.dirty.store(true, Ordering::Release);
        true
    }

    /// Runs `f` against the published mesh.
    pub fn with_mesh<R>(&self, f: impl FnOnce(&ChunkMesh) -> R) -> R {
        let slot = self.mesh.lock().unwrap();
        f(&slot)
    }

    /// True when a new mesh is waiting for upload; clears the flag.
    pub fn take_dirty(&self) -> bool {
        self.dirty.swap(false, Ordering::AcqRel)
    }
}
