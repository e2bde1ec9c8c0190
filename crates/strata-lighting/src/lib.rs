//! Block-light and sky-light flood fill with incremental add/remove.
//!
//! All operations work in world block coordinates and reach across chunk
//! seams through a [`ChunkSource`] passed in explicitly; nothing here holds a
//! back-pointer to the store. Every operation returns the set of chunks whose
//! meshes are stale afterwards.
//!
//! Locking discipline: at most one chunk lock is held at any moment. Crossing
//! a seam drops the current chunk before touching the next, so these routines
//! can never form a lock cycle with the mesher, which holds read guards on a
//! whole neighborhood at once.
#![forbid(unsafe_code)]

use std::collections::VecDeque;

use hashbrown::{HashMap, HashSet};

use strata_blocks::{BlockRegistry, Emission, AIR};
use strata_chunk::{ChunkData, ChunkHandle, LightChannel, LightingStage};
use strata_world::{block_to_local, ChunkCoord, CHUNK_SIZE};


/// Chunk ids whose meshes must be rebuilt after a lighting operation.
pub type RemeshSet = HashSet<ChunkCoord>;

/// Maximum light level of every channel.
pub const MAX_LIGHT: u8 = 15;

/// Resident-chunk access used when propagation crosses a chunk seam.
///
/// The store implements this; tests use a plain map. `chunk` may synthesize
/// an absent chunk when the world bounds permit, `resident` never does.
pub trait ChunkSource {
    /// Chunk at `coord`, loading or generating it if the bounds allow.
    /// `None` outside the world.
    fn chunk(&self, coord: ChunkCoord) -> Option<ChunkHandle>;

    /// Chunk at `coord` only if it is already resident.
    fn resident(&self, coord: ChunkCoord) -> Option<ChunkHandle>;
}

const DIRS: [(i32, i32, i32); 6] = [
    (1, 0, 0),
    (-1, 0, 0),
    (0, 1, 0),
    (0, -1, 0),
    (0, 0, 1),
    (0, 0, -1),
];

#[inline]
fn local_of(p: (i32, i32, i32)) -> (usize, usize, usize) {
    block_to_local(p.0, p.1, p.2)
}

/// Cursor over the chunks a flood fill touches. Caches handle lookups and
/// readiness so the source is consulted once per chunk per operation.
struct LightVolume<'a, S: ChunkSource + ?Sized> {
    source: &'a S,
    // None marks chunks that are out of the world or not ready for light.
    ready: HashMap<ChunkCoord, Option<ChunkHandle>>,
}

impl<'a, S: ChunkSource + ?Sized> LightVolume<'a, S> {
    fn new(source: &'a S) -> Self {
        Self {
            source,
            ready: HashMap::new(),
        }
    }

    /// Handle of a chunk light may enter, or `None` when the chunk is out of
    /// the world or its lighting stage is still below `ReadyForLighting`
    /// (propagation into ungenerated regions is deferred, not forced).
    fn ready(&mut self, coord: ChunkCoord) -> Option<ChunkHandle> {
        if let Some(entry) = self.ready.get(&coord) {
            return entry.clone();
        }
        let entry = self.source.chunk(coord).filter(|h| {
            h.read().unwrap().lighting_stage() >= LightingStage::ReadyForLighting
        });
        self.ready.insert(coord, entry.clone());
        entry
    }

    fn is_air(&mut self, p: (i32, i32, i32)) -> bool {
        let Some(h) = self.ready(ChunkCoord::of_block(p.0, p.1, p.2)) else {
            return false;
        };
        let (lx, ly, lz) = local_of(p);
        let result = h.read().unwrap().get(lx, ly, lz) == AIR;
        result
    }

    fn level(&mut self, p: (i32, i32, i32), ch: LightChannel) -> u8 {
        let Some(h) = self.ready(ChunkCoord::of_block(p.0, p.1, p.2)) else {
            return 0;
        };
        let (lx, ly, lz) = local_of(p);
        let result = h.read().unwrap().light_channel(lx, ly, lz, ch);
        result
    }

    fn set_level(&mut self, p: (i32, i32, i32), ch: LightChannel, v: u8) {
        let Some(h) = self.ready(ChunkCoord::of_block(p.0, p.1, p.2)) else {
            return;
        };
        let (lx, ly, lz) = local_of(p);
        h.write().unwrap().set_light_channel(lx, ly, lz, ch, v);
    }

    /// One propagation step into `p`: requires air and a current value below
    /// `new`. Returns true when the cell was raised (and must be enqueued).
    fn raise(&mut self, p: (i32, i32, i32), ch: LightChannel, new: u8) -> bool {
        let Some(h) = self.ready(ChunkCoord::of_block(p.0, p.1, p.2)) else {
            return false;
        };
        let (lx, ly, lz) = local_of(p);
        let mut g = h.write().unwrap();
        if g.get(lx, ly, lz) != AIR {
            return false;
        }
        if g.light_channel(lx, ly, lz, ch) >= new {
            return false;
        }
        g.set_light_channel(lx, ly, lz, ch, new);
        true
    }
}

#[inline]
fn step_value(ch: LightChannel, level: u8, dir: (i32, i32, i32)) -> u8 {
    // Sky light keeps full strength straight down; every other step loses 1.
    if ch == LightChannel::Sky && dir == (0, -1, 0) {
        level
    } else {
        level.saturating_sub(1)
    }
}

/// Spreads queued `(cell, level)` seeds outward until exhausted. Seeds are
/// assumed already written (or to lie in foreign chunks that hold their own
/// value); only the cells stepped into are mutated.
fn propagate<S: ChunkSource + ?Sized>(
    vol: &mut LightVolume<'_, S>,
    ch: LightChannel,
    mut queue: VecDeque<((i32, i32, i32), u8)>,
    remesh: &mut RemeshSet,
) {
    while let Some((p, level)) = queue.pop_front() {
        if level == 0 {
            continue;
        }
        let home = ChunkCoord::of_block(p.0, p.1, p.2);
        for dir in DIRS {
            let np = (p.0 + dir.0, p.1 + dir.1, p.2 + dir.2);
            let new = step_value(ch, level, dir);
            if new == 0 {
                continue;
            }
            let ncoord = ChunkCoord::of_block(np.0, np.1, np.2);
            if ncoord != home {
                if vol.ready(ncoord).is_none() {
                    continue;
                }
                remesh.insert(ncoord);
            }
            if vol.raise(np, ch, new) {
                queue.push_back((np, new));
            }
        }
    }
}

/// Two-phase removal: darken everything fed by the removed source, then
/// re-run propagation from every brighter frontier cell left standing.
fn unpropagate<S: ChunkSource + ?Sized>(
    vol: &mut LightVolume<'_, S>,
    ch: LightChannel,
    mut queue: VecDeque<((i32, i32, i32), u8)>,
    remesh: &mut RemeshSet,
) {
    let mut refill: VecDeque<((i32, i32, i32), u8)> = VecDeque::new();
    while let Some((p, old_level)) = queue.pop_front() {
        let home = ChunkCoord::of_block(p.0, p.1, p.2);
        for dir in DIRS {
            let np = (p.0 + dir.0, p.1 + dir.1, p.2 + dir.2);
            let ncoord = ChunkCoord::of_block(np.0, np.1, np.2);
            if ncoord != home {
                if vol.ready(ncoord).is_none() {
                    continue;
                }
                remesh.insert(ncoord);
            }
            let nv = vol.level(np, ch);
            if nv == 0 {
                continue;
            }
            if !vol.is_air(np) {
                // Emitter cells keep their own value and reseed the region.
                refill.push_back((np, nv));
                continue;
            }
            // A downward step keeps full strength, so a below-cell at exactly
            // the removed level may have been fed from here.
            let fed_by_us = if ch == LightChannel::Sky && dir == (0, -1, 0) {
                nv <= old_level
            } else {
                nv < old_level
            };
            if fed_by_us {
                vol.set_level(np, ch, 0);
                queue.push_back((np, nv));
            } else {
                refill.push_back((np, nv));
            }
        }
    }
    propagate(vol, ch, refill, remesh);
}

/// Full-chunk initial lighting, run once a chunk's worldgen is complete and
/// before its first mesh. Clears the light field, reseeds sky and block
/// light, floods, and advances the chunk to `LocalLightCalculated`. Returns
/// the neighbor chunks dirtied by cross-seam propagation.
pub fn compute_full_lighting<S: ChunkSource + ?Sized>(
    source: &S,
    target: &ChunkHandle,
    reg: &BlockRegistry,
) -> RemeshSet {
    let s = CHUNK_SIZE as usize;
    let coord = target.read().unwrap().coord();
    let (bx, by, bz) = coord.base();
    let mut remesh = RemeshSet::new();

    // Sky seed for each column: the bottom plane of a lit chunk above; open
    // sky when nothing real is above; darkness while the chunk above has
    // voxels but no light yet (its own pass will write down across the seam
    // and dirty this chunk). An entry still in `WorldGenInProgress` has no
    // voxels at all and counts as absent.
    let above = source.resident(coord.offset(0, 1, 0));
    let above_plane: Option<Vec<u8>> = above.as_ref().and_then(|h| {
        let g = h.read().unwrap();
        match g.lighting_stage() {
            LightingStage::LocalLightCalculated => {
                let mut plane = vec![0u8; s * s];
                for z in 0..s {
                    for x in 0..s {
                        plane[z * s + x] = g.light_channel(x, 0, z, LightChannel::Sky);
                    }
                }
                Some(plane)
            }
            LightingStage::ReadyForLighting => Some(vec![0u8; s * s]),
            LightingStage::WorldGenInProgress => None,
        }
    });

    let mut sky_seeds: VecDeque<((i32, i32, i32), u8)> = VecDeque::new();
    let mut block_seeds: [VecDeque<((i32, i32, i32), u8)>; 3] =
        [VecDeque::new(), VecDeque::new(), VecDeque::new()];
    {
        let mut g = target.write().unwrap();
        g.clear_light();
        for z in 0..s {
            for x in 0..s {
                let level = match &above_plane {
                    Some(plane) => plane[z * s + x],
                    None => MAX_LIGHT,
                };
                if level == 0 {
                    continue;
                }
                // Straight down at full strength until the first non-air cell.
                for y in (0..s).rev() {
                    if g.get(x, y, z) != AIR {
                        break;
                    }
                    g.set_light_channel(x, y, z, LightChannel::Sky, level);
                    sky_seeds.push_back(((bx + x as i32, by + y as i32, bz + z as i32), level));
                }
            }
        }

        let own_emitters: Vec<(u8, u8, u8)> = g.emitters().to_vec();
        for (ex, ey, ez) in own_emitters {
            let (ex, ey, ez) = (ex as usize, ey as usize, ez as usize);
            let emission = reg.get(g.get(ex, ey, ez)).emission;
            let wp = (bx + ex as i32, by + ey as i32, bz + ez as i32);
            for (i, ch) in LightChannel::BLOCK.iter().enumerate() {
                let v = [emission.r, emission.g, emission.b][i];
                if v > 0 {
                    g.set_light_channel(ex, ey, ez, *ch, v);
                    block_seeds[i].push_back((wp, v));
                }
            }
        }
    }

    // Emitters in the 26 neighbors seed the same queues so their light can
    // cross back into this chunk. Their cells are not written here; the BFS
    // only mutates cells it steps into.
    for dz in -1..=1i32 {
        for dy in -1..=1i32 {
            for dx in -1..=1i32 {
                if dx == 0 && dy == 0 && dz == 0 {
                    continue;
                }
                let ncoord = coord.offset(dx, dy, dz);
                let Some(h) = source.resident(ncoord) else {
                    continue;
                };
                let g = h.read().unwrap();
                if g.lighting_stage() < LightingStage::ReadyForLighting {
                    continue;
                }
                let (nx, ny, nz) = ncoord.base();
                for &(ex, ey, ez) in g.emitters() {
                    let emission = reg.get(g.get(ex as usize, ey as usize, ez as usize)).emission;
                    let wp = (nx + ex as i32, ny + ey as i32, nz + ez as i32);
                    for (i, _) in LightChannel::BLOCK.iter().enumerate() {
                        let v = [emission.r, emission.g, emission.b][i];
                        if v > 0 {
                            block_seeds[i].push_back((wp, v));
                        }
                    }
                }
            }
        }
    }

    let mut vol = LightVolume::new(source);
    vol.ready.insert(coord, Some(target.clone()));
    propagate(&mut vol, LightChannel::Sky, sky_seeds, &mut remesh);
    for (i, ch) in LightChannel::BLOCK.iter().enumerate() {
        propagate(&mut vol, *ch, std::mem::take(&mut block_seeds[i]), &mut remesh);
    }

    target
        .write()
        .unwrap()
        .advance_lighting_stage(LightingStage::LocalLightCalculated);
    remesh.remove(&coord);
    log::debug!(
        "full lighting for chunk ({}, {}, {}) dirtied {} neighbor(s)",
        coord.cx,
        coord.cy,
        coord.cz,
        remesh.len()
    );
    remesh
}

fn owning_remesh(p: (i32, i32, i32)) -> RemeshSet {
    let mut set = RemeshSet::new();
    set.insert(ChunkCoord::of_block(p.0, p.1, p.2));
    set
}

/// An emitter was placed at `p`: write its channels and flood outward. Light
/// that used to pass through the cell while it was air is darkened first,
/// since the emitter body blocks propagation like any other block.
pub fn add_emitter_light<S: ChunkSource + ?Sized>(
    source: &S,
    p: (i32, i32, i32),
    emission: Emission,
) -> RemeshSet {
    let mut remesh = owning_remesh(p);
    let mut vol = LightVolume::new(source);
    for (i, ch) in LightChannel::BLOCK.iter().enumerate() {
        let v = [emission.r, emission.g, emission.b][i];
        let old = vol.level(p, *ch);
        if old > v {
            vol.set_level(p, *ch, 0);
            let mut queue = VecDeque::new();
            queue.push_back((p, old));
            unpropagate(&mut vol, *ch, queue, &mut remesh);
        }
        if v == 0 {
            continue;
        }
        vol.set_level(p, *ch, v);
        let mut queue = VecDeque::new();
        queue.push_back((p, v));
        propagate(&mut vol, *ch, queue, &mut remesh);
    }
    remesh
}

/// Relights an opened cell from its brightest neighbor and floods onward.
/// No-op when every neighbor is dark.
fn refill_from_neighbors<S: ChunkSource + ?Sized>(
    vol: &mut LightVolume<'_, S>,
    ch: LightChannel,
    p: (i32, i32, i32),
    remesh: &mut RemeshSet,
) {
    let mut best = 0u8;
    for dir in DIRS {
        let np = (p.0 + dir.0, p.1 + dir.1, p.2 + dir.2);
        best = best.max(vol.level(np, ch).saturating_sub(1));
    }
    if best > 0 && vol.raise(p, ch, best) {
        let mut queue = VecDeque::new();
        queue.push_back((p, best));
        propagate(vol, ch, queue, remesh);
    }
}

/// The emitter at `p` was replaced by air: darken its region, refill from
/// whatever other sources still reach it, and reopen the cell to channels
/// the emitter body was merely blocking.
pub fn remove_emitter_light<S: ChunkSource + ?Sized>(
    source: &S,
    p: (i32, i32, i32),
) -> RemeshSet {
    let mut remesh = owning_remesh(p);
    let mut vol = LightVolume::new(source);
    for ch in LightChannel::BLOCK {
        let old = vol.level(p, ch);
        if old > 0 {
            vol.set_level(p, ch, 0);
            let mut queue = VecDeque::new();
            queue.push_back((p, old));
            unpropagate(&mut vol, ch, queue, &mut remesh);
        }
        refill_from_neighbors(&mut vol, ch, p, &mut remesh);
    }
    remesh
}

/// An opaque non-emitter now occupies the previously lit cell `p`: clamp the
/// cell dark and let the darken/refill pass recover its shadow.
pub fn add_blocker_light<S: ChunkSource + ?Sized>(source: &S, p: (i32, i32, i32)) -> RemeshSet {
    let mut remesh = owning_remesh(p);
    let mut vol = LightVolume::new(source);
    for ch in LightChannel::BLOCK {
        let old = vol.level(p, ch);
        if old == 0 {
            continue;
        }
        vol.set_level(p, ch, 0);
        let mut queue = VecDeque::new();
        queue.push_back((p, old));
        unpropagate(&mut vol, ch, queue, &mut remesh);
    }
    remesh
}

/// The blocker at `p` became air: relight the cell from its brightest
/// neighbor per channel and flood from there.
pub fn remove_blocker_light<S: ChunkSource + ?Sized>(source: &S, p: (i32, i32, i32)) -> RemeshSet {
    let mut remesh = owning_remesh(p);
    let mut vol = LightVolume::new(source);
    for ch in LightChannel::BLOCK {
        refill_from_neighbors(&mut vol, ch, p, &mut remesh);
    }
    remesh
}

/// A sky blocker was placed at `p`.
pub fn add_sky_blocker<S: ChunkSource + ?Sized>(source: &S, p: (i32, i32, i32)) -> RemeshSet {
    let mut remesh = owning_remesh(p);
    let mut vol = LightVolume::new(source);
    let old = vol.level(p, LightChannel::Sky);
    if old > 0 {
        vol.set_level(p, LightChannel::Sky, 0);
        let mut queue = VecDeque::new();
        queue.push_back((p, old));
        unpropagate(&mut vol, LightChannel::Sky, queue, &mut remesh);
    }
    remesh
}

/// A sky blocker at `p` was removed. The cell directly above contributes at
/// full strength (vertical sunlight does not attenuate); the other five
/// neighbors contribute one level less. When no chunk can be resident above,
/// the column top is open sky, matching the full-lighting seeding rule.
pub fn remove_sky_blocker<S: ChunkSource + ?Sized>(source: &S, p: (i32, i32, i32)) -> RemeshSet {
    let mut remesh = owning_remesh(p);
    let mut vol = LightVolume::new(source);
    let above = (p.0, p.1 + 1, p.2);
    // An absent chunk above, or a synthesized entry with no voxels yet,
    // counts as open sky, exactly like the full-lighting column seed.
    let mut best = match source.resident(ChunkCoord::of_block(above.0, above.1, above.2)) {
        Some(h) if h.read().unwrap().lighting_stage() >= LightingStage::ReadyForLighting => {
            vol.level(above, LightChannel::Sky)
        }
        _ => MAX_LIGHT,
    };
    for dir in DIRS {
        if dir == (0, 1, 0) {
            continue;
        }
        let np = (p.0 + dir.0, p.1 + dir.1, p.2 + dir.2);
        best = best.max(vol.level(np, LightChannel::Sky).saturating_sub(1));
    }
    if best > 0 && vol.raise(p, LightChannel::Sky, best) {
        let mut queue = VecDeque::new();
        queue.push_back((p, best));
        propagate(&mut vol, LightChannel::Sky, queue, &mut remesh);
    }
    remesh
}

/// Debug check used by tests: every lit transparent cell must be reachable
/// from a neighbor one level brighter or be an emitter cell itself.
pub fn channel_is_locally_supported(
    chunk: &ChunkData,
    reg: &BlockRegistry,
    ch: LightChannel,
    x: usize,
    y: usize,
    z: usize,
) -> bool {
    let s = CHUNK_SIZE as usize;
    let level = chunk.light_channel(x, y, z, ch);
    if level == 0 {
        return true;
    }
    let id = chunk.get(x, y, z);
    if id != AIR {
        let em = reg.get(id).emission;
        let own = match ch {
            LightChannel::Red => em.r,
            LightChannel::Green => em.g,
            LightChannel::Blue => em.b,
            LightChannel::Sky => 0,
        };
        return own >= level;
    }
    for dir in DIRS {
        let (nx, ny, nz) = (x as i32 + dir.0, y as i32 + dir.1, z as i32 + dir.2);
        if nx < 0 || ny < 0 || nz < 0 || nx >= s as i32 || ny >= s as i32 || nz >= s as i32 {
            // Support may come from a neighbor chunk; not decidable locally.
            return true;
        }
        let (nx, ny, nz) = (nx as usize, ny as usize, nz as usize);
        let needed = if ch == LightChannel::Sky && dir == (0, 1, 0) {
            level
        } else {
            level + 1
        };
        // A non-air cell with a nonzero channel value is an emitter cell, so
        // any neighbor at the needed level is valid support.
        let nv = chunk.light_channel(nx, ny, nz, ch);
        if nv >= needed {
            return true;
        }
    }
    false
}
