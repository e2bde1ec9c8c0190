use proptest::prelude::*;
use strata_world::{block_to_local, block_to_local_of, ChunkCoord, CHUNK_SIZE};

fn block() -> impl Strategy<Value = i32> {
    -1_000_000i32..=1_000_000
}

proptest! {
    // Chunk assignment and local position reassemble the block position
    #[test]
    fn chunk_and_local_roundtrip(bx in block(), by in block(), bz in block()) {
        let c = ChunkCoord::of_block(bx, by, bz);
        let (lx, ly, lz) = block_to_local(bx, by, bz);
        prop_assert!(lx < CHUNK_SIZE as usize && ly < CHUNK_SIZE as usize && lz < CHUNK_SIZE as usize);
        let (ox, oy, oz) = c.base();
        prop_assert_eq!((ox + lx as i32, oy + ly as i32, oz + lz as i32), (bx, by, bz));
    }

    // Relative local position agrees with the owning-chunk local position
    #[test]
    fn local_of_owner_is_in_range(bx in block(), by in block(), bz in block()) {
        let c = ChunkCoord::of_block(bx, by, bz);
        let (lx, ly, lz) = block_to_local_of(bx, by, bz, c);
        prop_assert!((0..CHUNK_SIZE).contains(&lx));
        prop_assert!((0..CHUNK_SIZE).contains(&ly));
        prop_assert!((0..CHUNK_SIZE).contains(&lz));
        let (ux, uy, uz) = block_to_local(bx, by, bz);
        prop_assert_eq!((lx as usize, ly as usize, lz as usize), (ux, uy, uz));
    }

    // Crossing one chunk in +x moves the local x by exactly CHUNK_SIZE
    #[test]
    fn neighbor_chunk_local_shift(bx in block(), by in block(), bz in block()) {
        let c = ChunkCoord::of_block(bx, by, bz);
        let west = c.offset(-1, 0, 0);
        let (lx, _, _) = block_to_local_of(bx, by, bz, west);
        let (ux, _, _) = block_to_local(bx, by, bz);
        prop_assert_eq!(lx, ux as i32 + CHUNK_SIZE);
    }
}
