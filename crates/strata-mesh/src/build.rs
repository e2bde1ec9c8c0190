use strata_blocks::BlockRegistry;
use strata_chunk::{LightChannel, PackedLight};
use strata_world::CHUNK_SIZE;

use crate::face::Face;
use crate::neighbors::NeighborRefs;
use crate::vertex::{corner_offsets, ChunkMesh};

/// Per-face shading mode, selected globally through the engine config.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MeshLighting {
    /// All four vertices carry the light of the cell outside the face.
    Flat,
    /// Each vertex averages the four outward cells around its corner.
    Smooth,
}

/// Builds the face-culled mesh of the center chunk of `nbh`.
pub fn build_chunk_mesh(
    nbh: &NeighborRefs<'_>,
    reg: &BlockRegistry,
    lighting: MeshLighting,
) -> ChunkMesh {
    // Infallible without a cancel hook.
    build_chunk_mesh_with_cancel(nbh, reg, lighting, &|| false).unwrap_or_default()
}

/// Like [`build_chunk_mesh`], checking `cancelled` between z-slices and
/// returning `None` without publishing anything once it reports true.
pub fn build_chunk_mesh_with_cancel(
    nbh: &NeighborRefs<'_>,
    reg: &BlockRegistry,
    lighting: MeshLighting,
    cancelled: &dyn Fn() -> bool,
) -> Option<ChunkMesh> {
    let Some(center) = nbh.center() else {
        return Some(ChunkMesh::default());
    };
    let s = CHUNK_SIZE as usize;
    let mut mesh = ChunkMesh::default();
    mesh.reserve_quads(1024);

    // z outer, x middle, y inner: follows the voxel memory layout.
    for z in 0..s {
        if cancelled() {
            return None;
        }
        for x in 0..s {
            for y in 0..s {
                let id = center.get(x, y, z);
                if id == strata_blocks::AIR {
                    continue;
                }
                let def = reg.get(id);
                for face in Face::ALL {
                    let (dx, dy, dz) = face.delta();
                    let (ox, oy, oz) = (x as i32 + dx, y as i32 + dy, z as i32 + dz);
                    if !nbh.is_open(ox, oy, oz) {
                        continue;
                    }
                    let light = match lighting {
                        MeshLighting::Flat => [nbh.light_at(ox, oy, oz); 4],
                        MeshLighting::Smooth => smooth_corner_light(nbh, face, ox, oy, oz),
                    };
                    mesh.push_face(face, (x, y, z), def.uv(face.role()), light);
                }
            }
        }
    }
    if cancelled() {
        return None;
    }
    Some(mesh)
}

/// Averages the outward cell and its three corner-sharing cells per vertex,
/// each channel independently over the air cells only. Falls back to the
/// center cell when all four are opaque.
fn smooth_corner_light(
    nbh: &NeighborRefs<'_>,
    face: Face,
    ox: i32,
    oy: i32,
    oz: i32,
) -> [PackedLight; 4] {
    let center = nbh.light_at(ox, oy, oz);
    let mut out = [center; 4];
    for (corner, &(cx, cy, cz)) in corner_offsets(face).iter().enumerate() {
        // The corner offset has exactly two nonzero in-plane components;
        // the four cells touching the vertex are their combinations.
        let (d1, d2) = if cx == 0 {
            ((0, cy, 0), (0, 0, cz))
        } else if cy == 0 {
            ((cx, 0, 0), (0, 0, cz))
        } else {
            ((cx, 0, 0), (0, cy, 0))
        };
        let cells = [
            (ox, oy, oz),
            (ox + d1.0, oy + d1.1, oz + d1.2),
            (ox + d2.0, oy + d2.1, oz + d2.2),
            (ox + d1.0 + d2.0, oy + d1.1 + d2.1, oz + d1.2 + d2.2),
        ];
        let mut sums = [0u32; 4];
        let mut count = 0u32;
        for (px, py, pz) in cells {
            if let Some(light) = nbh.air_light_at(px, py, pz) {
                for (i, ch) in LightChannel::ALL.iter().enumerate() {
                    sums[i] += light.channel(*ch) as u32;
                }
                count += 1;
            }
        }
        if count > 0 {
            let avg = |v: u32| ((v / count) as u8).min(PackedLight::MAX_LEVEL);
            out[corner] =
                PackedLight::from_channels(avg(sums[0]), avg(sums[1]), avg(sums[2]), avg(sums[3]));
        }
    }
    out
}
