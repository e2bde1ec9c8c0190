//! Bit-exact binary layout of a persisted chunk.
//!
//! Little-endian throughout: `u16` format version, `u32` voxels and `u16`
//! packed light in `y + S*(x + S*z)` cell order, then the worldgen stage
//! byte and the lighting stage byte.

use thiserror::Error;

use strata_blocks::BlockRegistry;
use strata_world::{ChunkCoord, CHUNK_VOLUME};

use crate::{ChunkData, LightingStage};

pub const CHUNK_FORMAT_VERSION: u16 = 1;

/// Total byte length of an encoded chunk.
pub const ENCODED_LEN: usize = 2 + 4 * CHUNK_VOLUME + 2 * CHUNK_VOLUME + 2;

#[derive(Debug, Error)]
pub enum ChunkCodecError {
    #[error("chunk file has {0} bytes, expected {ENCODED_LEN}")]
    BadLength(usize),
    #[error("unsupported chunk format version {0}")]
    BadVersion(u16),
    #[error("invalid lighting stage byte {0}")]
    BadStage(u8),
}

pub fn encode_chunk(chunk: &ChunkData) -> Vec<u8> {
    let mut out = Vec::with_capacity(ENCODED_LEN);
    out.extend_from_slice(&CHUNK_FORMAT_VERSION.to_le_bytes());
    for &v in chunk.voxel_cells() {
        out.extend_from_slice(&v.to_le_bytes());
    }
    for &l in chunk.light_cells() {
        out.extend_from_slice(&l.to_le_bytes());
    }
    out.push(chunk.world_gen_stage());
    out.push(chunk.lighting_stage().as_u8());
    out
}

pub fn decode_chunk(
    coord: ChunkCoord,
    bytes: &[u8],
    reg: &BlockRegistry,
) -> Result<ChunkData, ChunkCodecError> {
    if bytes.len() != ENCODED_LEN {
        return Err(ChunkCodecError::BadLength(bytes.len()));
    }
    let version = u16::from_le_bytes([bytes[0], bytes[1]]);
    if version != CHUNK_FORMAT_VERSION {
        return Err(ChunkCodecError::BadVersion(version));
    }
    let mut chunk = ChunkData::new(coord);
    let mut off = 2;
    for i in 0..CHUNK_VOLUME {
        chunk.voxels[i] = u32::from_le_bytes([
            bytes[off],
            bytes[off + 1],
            bytes[off + 2],
            bytes[off + 3],
        ]);
        off += 4;
    }
    for i in 0..CHUNK_VOLUME {
        chunk.light[i] = u16::from_le_bytes([bytes[off], bytes[off + 1]]);
        off += 2;
    }
    chunk.world_gen_stage = bytes[off];
    chunk.lighting_stage = LightingStage::from_u8(bytes[off + 1])
        .ok_or(ChunkCodecError::BadStage(bytes[off + 1]))?;
    // The emitter index is derived state and is not persisted.
    chunk.rebuild_emitters(reg);
    Ok(chunk)
}
