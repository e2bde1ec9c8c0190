//! Block definitions and the block registry.
#![forbid(unsafe_code)]

pub mod config;
pub mod registry;
pub mod types;

pub use registry::BlockRegistry;
pub use types::{BlockDef, BlockId, Emission, FaceRole, FaceTextures, UvRect, AIR};
