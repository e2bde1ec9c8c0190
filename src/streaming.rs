//! Streaming thread: rebuilds the load queue when the viewer crosses a chunk
//! boundary and evicts residency that fell out of range.
//!
//! Enumeration is center-first by Chebyshev shell: for each radius the side
//! middles go first, then edges, then corners, each column alternating
//! upward and downward layers. FIFO drain then loads near chunks first.

use std::collections::VecDeque;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use strata_runtime::Priority;
use strata_world::ChunkCoord;

use crate::engine::EngineShared;
use crate::renderer::ChunkRenderer;

const IDLE_SLEEP: Duration = Duration::from_millis(5);
// Keep the pool from drowning in speculative loads when the queue rebuilds.
const MAX_QUEUED_LOADS: usize = 64;

pub(crate) fn run(shared: Arc<EngineShared>) {
    let mut prev_center: Option<ChunkCoord> = None;
    let mut prev_distance = (i32::MIN, i32::MIN);
    let mut queue: VecDeque<ChunkCoord> = VecDeque::new();

    while !shared.stop.load(Ordering::Relaxed) {
        let Some((vx, vy, vz)) = *shared.viewer.lock().unwrap() else {
            thread::sleep(IDLE_SLEEP);
            continue;
        };
        let (radius, height) = *shared.view_distance.lock().unwrap();
        let center = ChunkCoord::of_world(vx, vy, vz);

        if prev_center != Some(center) || prev_distance != (radius, height) {
            prev_center = Some(center);
            prev_distance = (radius, height);
            queue.clear();
            build_queue(&mut queue, center, radius, height);
            evict_out_of_range(&shared, center, radius, height);
        }

        let (_, queued_medium, _, _) = shared.pool.queue_debug_counts();
        if queued_medium >= MAX_QUEUED_LOADS {
            thread::sleep(IDLE_SLEEP);
            continue;
        }

        match queue.pop_front() {
            Some(coord) => {
                if !shared.store.bounds().contains(coord) {
                    continue;
                }
                if shared.renderer(coord).is_some() {
                    continue;
                }
                let job_shared = shared.clone();
                shared
                    .pool
                    .submit(Priority::Medium, move || job_shared.run_chunk_load(coord));
            }
            None => thread::sleep(IDLE_SLEEP),
        }
    }
}

/// One vertical column, layer 0 first, then alternating up/down.
fn push_column(queue: &mut VecDeque<ChunkCoord>, center: ChunkCoord, cx: i32, cz: i32, height: i32) {
    for dy in 0..=height {
        queue.push_back(ChunkCoord::new(cx, center.cy + dy, cz));
        if dy > 0 {
            queue.push_back(ChunkCoord::new(cx, center.cy - dy, cz));
        }
    }
}

fn build_queue(queue: &mut VecDeque<ChunkCoord>, center: ChunkCoord, radius: i32, height: i32) {
    push_column(queue, center, center.cx, center.cz, height);
    for r in 1..=radius {
        // Side middles
        push_column(queue, center, center.cx, center.cz + r, height);
        push_column(queue, center, center.cx + r, center.cz, height);
        push_column(queue, center, center.cx, center.cz - r, height);
        push_column(queue, center, center.cx - r, center.cz, height);
        // Edges, stepping away from the middles
        for e in 1..r {
            push_column(queue, center, center.cx + e, center.cz + r, height);
            push_column(queue, center, center.cx - e, center.cz + r, height);
            push_column(queue, center, center.cx + r, center.cz + e, height);
            push_column(queue, center, center.cx + r, center.cz - e, height);
            push_column(queue, center, center.cx + e, center.cz - r, height);
            push_column(queue, center, center.cx - e, center.cz - r, height);
            push_column(queue, center, center.cx - r, center.cz + e, height);
            push_column(queue, center, center.cx - r, center.cz - e, height);
        }
        // Corners
        push_column(queue, center, center.cx + r, center.cz + r, height);
        push_column(queue, center, center.cx + r, center.cz - r, height);
        push_column(queue, center, center.cx - r, center.cz + r, height);
        push_column(queue, center, center.cx - r, center.cz - r, height);
    }
}

fn evict_out_of_range(shared: &Arc<EngineShared>, center: ChunkCoord, radius: i32, height: i32) {
    // Renderers beyond the view distance move to the deletion queue, drained
    // on the next render call.
    let stale: Vec<Arc<ChunkRenderer>> = {
        let map = shared.renderers.read().unwrap();
        map.values()
            .filter(|r| {
                let (dh, dv) = r.coord().chebyshev_hv(center);
                dh > radius || dv > height
            })
            .cloned()
            .collect()
    };
    if !stale.is_empty() {
        {
            let mut map = shared.renderers.write().unwrap();
            for renderer in &stale {
                map.remove(&renderer.coord());
            }
        }
        shared.deletion_queue.lock().unwrap().extend(stale);
    }

    // Chunk data goes only when nothing in its ±1 neighborhood is rendered,
    // so meshing always finds its neighbors resident.
    let to_evict: Vec<ChunkCoord> = {
        let renderers = shared.renderers.read().unwrap();
        shared
            .store
            .resident_coords()
            .into_iter()
            .filter(|coord| {
                for dz in -1..=1 {
                    for dy in -1..=1 {
                        for dx in -1..=1 {
                            if renderers.contains_key(&coord.offset(dx, dy, dz)) {
                                return false;
                            }
                        }
                    }
                }
                true
            })
            .collect()
    };
    for coord in to_evict {
        shared.store.evict(coord);
    }
}
