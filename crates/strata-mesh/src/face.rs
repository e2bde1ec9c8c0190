use strata_blocks::FaceRole;

/// One of the six axial directions a voxel face can point. The discriminant
/// doubles as the row index into the per-face corner tables, so the order
/// here is load-bearing.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Face {
    PosY = 0,
    NegY = 1,
    PosX = 2,
    NegX = 3,
    PosZ = 4,
    NegZ = 5,
}

impl Face {
    pub const ALL: [Face; 6] = [
        Face::PosY,
        Face::NegY,
        Face::PosX,
        Face::NegX,
        Face::PosZ,
        Face::NegZ,
    ];

    /// Row index of this face in the corner tables.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    // Axis the face points along (0 = x, 1 = y, 2 = z) and its direction.
    #[inline]
    const fn axis_sign(self) -> (usize, i32) {
        match self {
            Face::PosX => (0, 1),
            Face::NegX => (0, -1),
            Face::PosY => (1, 1),
            Face::NegY => (1, -1),
            Face::PosZ => (2, 1),
            Face::NegZ => (2, -1),
        }
    }

    /// Grid step from a voxel to the cell this face looks into.
    #[inline]
    pub fn delta(self) -> (i32, i32, i32) {
        let (axis, sign) = self.axis_sign();
        let mut d = [0i32; 3];
        d[axis] = sign;
        (d[0], d[1], d[2])
    }

    /// Outward unit normal.
    #[inline]
    pub fn normal(self) -> [f32; 3] {
        let (axis, sign) = self.axis_sign();
        let mut n = [0.0f32; 3];
        n[axis] = sign as f32;
        n
    }

    /// Texture slot this face samples: up takes the top rectangle, down the
    /// bottom one, the four lateral faces share the side rectangle.
    #[inline]
    pub fn role(self) -> FaceRole {
        match self.axis_sign() {
            (1, 1) => FaceRole::Top,
            (1, -1) => FaceRole::Bottom,
            _ => FaceRole::Side,
        }
    }
}
