use strata_blocks::{BlockId, BlockRegistry, Emission, FaceTextures, UvRect};
use strata_chunk::{ChunkData, LightChannel, PackedLight};
use strata_mesh::{build_chunk_mesh, build_chunk_mesh_with_cancel, ChunkMesh, MeshLighting, NeighborRefs};
use strata_world::ChunkCoord;

fn registry() -> (BlockRegistry, BlockId) {
    let mut reg = BlockRegistry::new();
    let stone = reg
        .register(
            "stone",
            FaceTextures::uniform(UvRect::new(0.0, 0.0, 0.5, 0.5)),
            Emission::NONE,
        )
        .unwrap();
    (reg, stone)
}

fn slots_of<'a>(
    center: &'a ChunkData,
    rest: &[(i32, i32, i32, &'a ChunkData)],
) -> NeighborRefs<'a> {
    let mut slots: [Option<&'a ChunkData>; 27] = [None; 27];
    slots[(0 + 1) + 3 * (0 + 1) + 9 * (0 + 1)] = Some(center);
    for &(dx, dy, dz, chunk) in rest {
        slots[((dx + 1) + 3 * (dy + 1) + 9 * (dz + 1)) as usize] = Some(chunk);
    }
    NeighborRefs::new(slots)
}

fn count_faces(mesh: &ChunkMesh, normal: [f32; 3], plane: f32) -> usize {
    let axis = normal.iter().position(|&c| c != 0.0).unwrap();
    mesh.vertices
        .chunks(4)
        .filter(|quad| quad[0].normal == normal && quad.iter().all(|v| v.position[axis] == plane))
        .count()
}

#[test]
fn lone_block_emits_six_faces() {
    let (reg, stone) = registry();
    let mut chunk = ChunkData::new(ChunkCoord::new(0, 0, 0));
    chunk.set(&reg, 5, 6, 7, stone);
    let nbh = NeighborRefs::solo(&chunk);

    let mesh = build_chunk_mesh(&nbh, &reg, MeshLighting::Flat);
    assert_eq!(mesh.quad_count(), 6);
    assert_eq!(mesh.vertices.len(), 24);
    assert_eq!(mesh.indices.len(), 36);
    assert_eq!(&mesh.indices[..6], &[0, 2, 1, 1, 2, 3]);
    // One face per direction, each on the right plane
    assert_eq!(count_faces(&mesh, [1.0, 0.0, 0.0], 6.0), 1);
    assert_eq!(count_faces(&mesh, [-1.0, 0.0, 0.0], 5.0), 1);
    assert_eq!(count_faces(&mesh, [0.0, 1.0, 0.0], 7.0), 1);
    assert_eq!(count_faces(&mesh, [0.0, -1.0, 0.0], 6.0), 1);
    assert_eq!(count_faces(&mesh, [0.0, 0.0, 1.0], 8.0), 1);
    assert_eq!(count_faces(&mesh, [0.0, 0.0, -1.0], 7.0), 1);
    // Side faces use the side rectangle
    let side = mesh
        .vertices
        .chunks(4)
        .find(|q| q[0].normal == [1.0, 0.0, 0.0])
        .unwrap();
    assert_eq!(side[0].uv, [0.0, 0.0]);
    assert_eq!(side[3].uv, [0.5, 0.5]);
}

#[test]
fn interior_faces_are_culled() {
    let (reg, stone) = registry();
    let mut chunk = ChunkData::new(ChunkCoord::new(0, 0, 0));
    chunk.set(&reg, 10, 10, 10, stone);
    chunk.set(&reg, 11, 10, 10, stone);
    let nbh = NeighborRefs::solo(&chunk);
    let mesh = build_chunk_mesh(&nbh, &reg, MeshLighting::Flat);
    // Two cubes sharing a face: 12 - 2 = 10 faces
    assert_eq!(mesh.quad_count(), 10);
}

#[test]
fn seam_face_follows_neighbor_occupancy() {
    let (reg, stone) = registry();
    // Chunk A has stone on its +x border; chunk B is empty
    let mut a = ChunkData::new(ChunkCoord::new(0, 0, 0));
    a.set(&reg, 31, 0, 0, stone);
    let mut b = ChunkData::new(ChunkCoord::new(1, 0, 0));

    {
        let nbh = slots_of(&a, &[(1, 0, 0, &b)]);
        let mesh = build_chunk_mesh(&nbh, &reg, MeshLighting::Flat);
        assert_eq!(count_faces(&mesh, [1.0, 0.0, 0.0], 32.0), 1);
    }

    // Filling B's matching border cell removes the seam face
    b.set(&reg, 0, 0, 0, stone);
    {
        let nbh = slots_of(&a, &[(1, 0, 0, &b)]);
        let mesh = build_chunk_mesh(&nbh, &reg, MeshLighting::Flat);
        assert_eq!(count_faces(&mesh, [1.0, 0.0, 0.0], 32.0), 0);
    }
}

#[test]
fn unloaded_neighbor_counts_as_open() {
    let (reg, stone) = registry();
    let mut chunk = ChunkData::new(ChunkCoord::new(0, 0, 0));
    chunk.set(&reg, 0, 15, 15, stone);
    let nbh = NeighborRefs::solo(&chunk);
    let mesh = build_chunk_mesh(&nbh, &reg, MeshLighting::Flat);
    // -X neighbor is unloaded: the face is emitted and carries darkness
    let quad = mesh
        .vertices
        .chunks(4)
        .find(|q| q[0].normal == [-1.0, 0.0, 0.0])
        .unwrap();
    assert!(quad.iter().all(|v| v.light == 0));
}

#[test]
fn flat_lighting_samples_outward_cell() {
    let (reg, stone) = registry();
    let mut chunk = ChunkData::new(ChunkCoord::new(0, 0, 0));
    chunk.set(&reg, 5, 5, 5, stone);
    let outward = PackedLight::from_channels(7, 12, 0, 3);
    chunk.set_light(5, 6, 5, outward);
    let nbh = NeighborRefs::solo(&chunk);
    let mesh = build_chunk_mesh(&nbh, &reg, MeshLighting::Flat);
    let top = mesh
        .vertices
        .chunks(4)
        .find(|q| q[0].normal == [0.0, 1.0, 0.0])
        .unwrap();
    assert!(top.iter().all(|v| v.light == outward.raw()));
}

#[test]
fn smooth_lighting_averages_air_cells_per_corner() {
    let (reg, stone) = registry();
    let mut chunk = ChunkData::new(ChunkCoord::new(0, 0, 0));
    chunk.set(&reg, 5, 5, 5, stone);
    // Light the outward plane unevenly: center 12, +x neighbor 8
    chunk.set_light_channel(5, 6, 5, LightChannel::Red, 12);
    chunk.set_light_channel(6, 6, 5, LightChannel::Red, 8);
    let nbh = NeighborRefs::solo(&chunk);
    let mesh = build_chunk_mesh(&nbh, &reg, MeshLighting::Smooth);
    let top = mesh
        .vertices
        .chunks(4)
        .find(|q| q[0].normal == [0.0, 1.0, 0.0])
        .unwrap();
    // Corner order for PosY: (-1,+1), (+1,+1), (-1,-1), (+1,-1) in (x,z)
    let red = |v: &strata_mesh::ChunkVertex| PackedLight(v.light).red();
    assert_eq!(red(&top[0]), (12 + 0 + 0 + 0) / 4);
    assert_eq!(red(&top[1]), (12 + 8 + 0 + 0) / 4);
    assert_eq!(red(&top[2]), (12 + 0 + 0 + 0) / 4);
    assert_eq!(red(&top[3]), (12 + 8 + 0 + 0) / 4);
}

#[test]
fn smooth_lighting_falls_back_to_center_when_corner_is_sealed() {
    let (reg, stone) = registry();
    let mut chunk = ChunkData::new(ChunkCoord::new(0, 0, 0));
    chunk.set(&reg, 5, 5, 5, stone);
    chunk.set_light_channel(5, 6, 5, LightChannel::Red, 12);
    // Seal every cell the (+1,+1) corner of the top face touches except the center
    chunk.set(&reg, 6, 6, 5, stone);
    chunk.set(&reg, 5, 6, 6, stone);
    chunk.set(&reg, 6, 6, 6, stone);
    let nbh = NeighborRefs::solo(&chunk);
    let mesh = build_chunk_mesh(&nbh, &reg, MeshLighting::Smooth);
    let top = mesh
        .vertices
        .chunks(4)
        .filter(|q| q[0].normal == [0.0, 1.0, 0.0])
        .find(|q| q.iter().all(|v| v.position[1] == 6.0 && v.position[0] >= 5.0))
        .unwrap();
    // The sealed corner still averages over the one open cell (the center)
    assert_eq!(PackedLight(top[1].light).red(), 12);
}

#[test]
fn cancelled_build_publishes_nothing() {
    let (reg, stone) = registry();
    let mut chunk = ChunkData::new(ChunkCoord::new(0, 0, 0));
    chunk.set(&reg, 1, 1, 1, stone);
    let nbh = NeighborRefs::solo(&chunk);
    let out = build_chunk_mesh_with_cancel(&nbh, &reg, MeshLighting::Flat, &|| true);
    assert!(out.is_none());
}
