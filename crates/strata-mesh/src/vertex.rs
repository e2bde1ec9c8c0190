use strata_blocks::UvRect;
use strata_chunk::PackedLight;

use crate::face::Face;

/// One mesh vertex: position, normal, texture coordinate, packed light.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ChunkVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub light: u16,
}

/// Vertex/index stream of one chunk, positions in chunk-local space.
#[derive(Default, Clone)]
pub struct ChunkMesh {
    pub vertices: Vec<ChunkVertex>,
    pub indices: Vec<u32>,
}

// Per-face corner table: position offsets from the voxel origin, the
// (u, v) pick from the face rectangle (0 = min, 1 = max), and the lateral
// cell offsets used by smooth lighting. Corner order matches the quad
// triangulation (0,2,1)(1,2,3).
type Corner = ([f32; 3], (u8, u8), (i32, i32, i32));

const FACE_CORNERS: [[Corner; 4]; 6] = [
    // PosY
    [
        ([0.0, 1.0, 1.0], (0, 0), (-1, 0, 1)),
        ([1.0, 1.0, 1.0], (1, 0), (1, 0, 1)),
        ([0.0, 1.0, 0.0], (0, 1), (-1, 0, -1)),
        ([1.0, 1.0, 0.0], (1, 1), (1, 0, -1)),
    ],
    // NegY
    [
        ([1.0, 0.0, 1.0], (0, 0), (1, 0, 1)),
        ([0.0, 0.0, 1.0], (1, 0), (-1, 0, 1)),
        ([1.0, 0.0, 0.0], (0, 1), (1, 0, -1)),
        ([0.0, 0.0, 0.0], (1, 1), (-1, 0, -1)),
    ],
    // PosX
    [
        ([1.0, 0.0, 1.0], (0, 0), (0, -1, 1)),
        ([1.0, 0.0, 0.0], (1, 0), (0, -1, -1)),
        ([1.0, 1.0, 1.0], (0, 1), (0, 1, 1)),
        ([1.0, 1.0, 0.0], (1, 1), (0, 1, -1)),
    ],
    // NegX
    [
        ([0.0, 0.0, 0.0], (0, 0), (0, -1, -1)),
        ([0.0, 0.0, 1.0], (1, 0), (0, -1, 1)),
        ([0.0, 1.0, 0.0], (0, 1), (0, 1, -1)),
        ([0.0, 1.0, 1.0], (1, 1), (0, 1, 1)),
    ],
    // PosZ
    [
        ([0.0, 0.0, 1.0], (0, 0), (-1, -1, 0)),
        ([1.0, 0.0, 1.0], (1, 0), (1, -1, 0)),
        ([0.0, 1.0, 1.0], (0, 1), (-1, 1, 0)),
        ([1.0, 1.0, 1.0], (1, 1), (1, 1, 0)),
    ],
    // NegZ
    [
        ([1.0, 0.0, 0.0], (0, 0), (1, -1, 0)),
        ([0.0, 0.0, 0.0], (1, 0), (-1, -1, 0)),
        ([1.0, 1.0, 0.0], (0, 1), (1, 1, 0)),
        ([0.0, 1.0, 0.0], (1, 1), (-1, 1, 0)),
    ],
];

/// Lateral cell offsets per corner for smooth-lighting averages, in the same
/// corner order as the emitted vertices.
#[inline]
pub(crate) fn corner_offsets(face: Face) -> [(i32, i32, i32); 4] {
    let corners = &FACE_CORNERS[face.index()];
    [corners[0].2, corners[1].2, corners[2].2, corners[3].2]
}

impl ChunkMesh {
    /// Pre-reserve capacity for approximately `n_quads` quads worth of data.
    #[inline]
    pub fn reserve_quads(&mut self, n_quads: usize) {
        self.vertices.reserve(n_quads * 4);
        self.indices.reserve(n_quads * 6);
    }

    #[inline]
    pub fn quad_count(&self) -> usize {
        self.indices.len() / 6
    }

    /// Emits one voxel face as four vertices and two triangles `(0,2,1)(1,2,3)`.
    pub fn push_face(
        &mut self,
        face: Face,
        cell: (usize, usize, usize),
        uv: UvRect,
        light: [PackedLight; 4],
    ) {
        let base = self.vertices.len() as u32;
        let normal = face.normal();
        let (px, py, pz) = (cell.0 as f32, cell.1 as f32, cell.2 as f32);
        for (i, (offset, (u_pick, v_pick), _)) in FACE_CORNERS[face.index()].iter().enumerate() {
            let u = if *u_pick == 0 { uv.min_u } else { uv.max_u };
            let v = if *v_pick == 0 { uv.min_v } else { uv.max_v };
            self.vertices.push(ChunkVertex {
                position: [px + offset[0], py + offset[1], pz + offset[2]],
                normal,
                uv: [u, v],
                light: light[i].raw(),
            });
        }
        self.indices.extend_from_slice(&[
            base,
            base + 2,
            base + 1,
            base + 1,
            base + 2,
            base + 3,
        ]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_face_index_pattern() {
        let mut mesh = ChunkMesh::default();
        mesh.push_face(
            Face::PosX,
            (3, 4, 5),
            UvRect::FULL,
            [PackedLight::DARK; 4],
        );
        mesh.push_face(
            Face::NegY,
            (0, 0, 0),
            UvRect::FULL,
            [PackedLight::DARK; 4],
        );
        assert_eq!(mesh.vertices.len(), 8);
        assert_eq!(mesh.indices, vec![0, 2, 1, 1, 2, 3, 4, 6, 5, 5, 6, 7]);
    }

    #[test]
    fn pos_x_face_lies_on_outer_plane() {
        let mut mesh = ChunkMesh::default();
        mesh.push_face(
            Face::PosX,
            (3, 4, 5),
            UvRect::FULL,
            [PackedLight::DARK; 4],
        );
        for v in &mesh.vertices {
            assert_eq!(v.position[0], 4.0);
            assert_eq!(v.normal, [1.0, 0.0, 0.0]);
        }
    }

    #[test]
    fn corner_offsets_stay_in_plane() {
        for face in Face::ALL {
            let (dx, dy, dz) = face.delta();
            for (ox, oy, oz) in corner_offsets(face) {
                // Offsets never leave the face plane
                assert_eq!(ox * dx + oy * dy + oz * dz, 0);
                // Both in-plane axes are offset by exactly one
                assert_eq!(ox.abs() + oy.abs() + oz.abs(), 2);
            }
        }
    }
}
