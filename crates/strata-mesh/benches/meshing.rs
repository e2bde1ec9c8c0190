use criterion::{black_box, criterion_group, criterion_main, Criterion};

use strata_blocks::{BlockRegistry, Emission, FaceTextures};
use strata_chunk::{ChunkData, PackedLight};
use strata_mesh::{build_chunk_mesh, MeshLighting, NeighborRefs};
use strata_world::{ChunkCoord, CHUNK_SIZE};

fn terrain_chunk(reg: &BlockRegistry) -> ChunkData {
    let stone = reg.id_by_name("stone").unwrap();
    let s = CHUNK_SIZE as usize;
    let mut chunk = ChunkData::new(ChunkCoord::new(0, 0, 0));
    for z in 0..s {
        for x in 0..s {
            // Rolling height field with some overhangs carved out
            let h = 12 + ((x * 7 + z * 3) % 11);
            for y in 0..h {
                if (x + y + z) % 23 == 0 {
                    continue;
                }
                chunk.set(reg, x, y, z, stone);
            }
            for y in h..s {
                chunk.set_light(x, y, z, PackedLight::from_channels(15, 0, 0, 0));
            }
        }
    }
    chunk
}

fn bench_meshing(c: &mut Criterion) {
    let mut reg = BlockRegistry::new();
    reg.register("stone", FaceTextures::default(), Emission::NONE)
        .unwrap();
    let chunk = terrain_chunk(&reg);

    c.bench_function("mesh_terrain_flat", |b| {
        b.iter(|| {
            let nbh = NeighborRefs::solo(black_box(&chunk));
            black_box(build_chunk_mesh(&nbh, &reg, MeshLighting::Flat))
        })
    });
    c.bench_function("mesh_terrain_smooth", |b| {
        b.iter(|| {
            let nbh = NeighborRefs::solo(black_box(&chunk));
            black_box(build_chunk_mesh(&nbh, &reg, MeshLighting::Smooth))
        })
    });
}

criterion_group!(benches, bench_meshing);
criterion_main!(benches);
