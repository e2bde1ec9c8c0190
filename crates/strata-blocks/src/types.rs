/// Numeric block identifier stored per voxel. `0` is always air.
pub type BlockId = u32;

/// The reserved air block id: transparent, never solid, never an emitter.
pub const AIR: BlockId = 0;

/// Which face of a cube a texture lookup is for.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum FaceRole {
    Top,
    Bottom,
    Side,
}

/// Normalized texture-atlas rectangle for one face.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct UvRect {
    pub min_u: f32,
    pub min_v: f32,
    pub max_u: f32,
    pub max_v: f32,
}

impl UvRect {
    #[inline]
    pub const fn new(min_u: f32, min_v: f32, max_u: f32, max_v: f32) -> Self {
        Self {
            min_u,
            min_v,
            max_u,
            max_v,
        }
    }

    /// Full-texture rectangle, the default for untextured test blocks.
    pub const FULL: UvRect = UvRect::new(0.0, 0.0, 1.0, 1.0);
}

/// Per-face texture rectangles of one block.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct FaceTextures {
    pub top: UvRect,
    pub bottom: UvRect,
    pub side: UvRect,
}

impl FaceTextures {
    #[inline]
    pub const fn uniform(rect: UvRect) -> Self {
        Self {
            top: rect,
            bottom: rect,
            side: rect,
        }
    }

    #[inline]
    pub fn for_role(&self, role: FaceRole) -> UvRect {
        match role {
            FaceRole::Top => self.top,
            FaceRole::Bottom => self.bottom,
            FaceRole::Side => self.side,
        }
    }
}

/// Per-channel block-light emission strength, each channel in `[0, 15]`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Emission {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Emission {
    pub const NONE: Emission = Emission { r: 0, g: 0, b: 0 };

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    #[inline]
    pub fn is_dark(&self) -> bool {
        self.r == 0 && self.g == 0 && self.b == 0
    }
}

/// One registered block type.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockDef {
    pub id: BlockId,
    pub name: String,
    pub textures: FaceTextures,
    pub light_emitter: bool,
    pub emission: Emission,
}

impl BlockDef {
    #[inline]
    pub fn uv(&self, role: FaceRole) -> UvRect {
        self.textures.for_role(role)
    }

    pub(crate) fn air() -> Self {
        Self {
            id: AIR,
            name: "air".to_string(),
            textures: FaceTextures::default(),
            light_emitter: false,
            emission: Emission::NONE,
        }
    }
}
