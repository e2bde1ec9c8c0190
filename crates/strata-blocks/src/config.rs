use serde::Deserialize;

use crate::types::{Emission, FaceTextures, UvRect};

/// Root of a blocks TOML file:
///
/// ```toml
/// [[blocks]]
/// name = "stone"
/// all = [0.0, 0.0, 0.25, 0.25]
///
/// [[blocks]]
/// name = "grass"
/// top = [0.25, 0.0, 0.5, 0.25]
/// bottom = [0.5, 0.0, 0.75, 0.25]
/// side = [0.75, 0.0, 1.0, 0.25]
///
/// [[blocks]]
/// name = "torch"
/// all = [0.0, 0.25, 0.25, 0.5]
/// emission = [15, 11, 6]
/// ```
#[derive(Debug, Deserialize)]
pub struct BlocksConfig {
    pub blocks: Vec<BlockEntry>,
}

#[derive(Debug, Deserialize)]
pub struct BlockEntry {
    pub name: String,
    /// Rectangle applied to every face unless overridden per role.
    pub all: Option<[f32; 4]>,
    pub top: Option<[f32; 4]>,
    pub bottom: Option<[f32; 4]>,
    pub side: Option<[f32; 4]>,
    /// Per-channel emission `[r, g, b]`, each 0..=15. Absent means dark.
    pub emission: Option<[u8; 3]>,
}

fn rect(v: [f32; 4]) -> UvRect {
    UvRect::new(v[0], v[1], v[2], v[3])
}

impl BlockEntry {
    pub fn textures(&self) -> FaceTextures {
        let base = self.all.map(rect).unwrap_or(UvRect::FULL);
        FaceTextures {
            top: self.top.map(rect).unwrap_or(base),
            bottom: self.bottom.map(rect).unwrap_or(base),
            side: self.side.map(rect).unwrap_or(base),
        }
    }

    pub fn emission(&self) -> Emission {
        match self.emission {
            Some([r, g, b]) => Emission::new(r, g, b),
            None => Emission::NONE,
        }
    }
}
