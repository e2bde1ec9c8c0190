//! One file per chunk under the save root: `chunk_<cx>_<cy>_<cz>.dat`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use strata_blocks::BlockRegistry;
use strata_chunk::codec::{decode_chunk, encode_chunk, ChunkCodecError};
use strata_chunk::ChunkData;
use strata_world::ChunkCoord;

#[derive(Debug, Error)]
pub enum ChunkIoError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Codec(#[from] ChunkCodecError),
}

pub fn chunk_path(root: &Path, coord: ChunkCoord) -> PathBuf {
    root.join(format!("chunk_{}_{}_{}.dat", coord.cx, coord.cy, coord.cz))
}

pub fn save_chunk(root: &Path, chunk: &ChunkData) -> Result<(), ChunkIoError> {
    fs::create_dir_all(root)?;
    let path = chunk_path(root, chunk.coord());
    fs::write(path, encode_chunk(chunk))?;
    Ok(())
}

/// `Ok(None)` when no file exists. A corrupt or version-mismatched file is
/// an error; the caller discards it and regenerates.
pub fn load_chunk(
    root: &Path,
    coord: ChunkCoord,
    reg: &BlockRegistry,
) -> Result<Option<ChunkData>, ChunkIoError> {
    let path = chunk_path(root, coord);
    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(decode_chunk(coord, &bytes, reg)?))
}
