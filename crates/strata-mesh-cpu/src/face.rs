use strata_geom::{Int3, Vec3};
use strata_tiles::{CUBE_FACES, FaceBasis};

/// Cube faces in mask order. `face ^ 1` is the opposite face.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Face {
    NegX = 0,
    PosX = 1,
    NegY = 2,
    PosY = 3,
    NegZ = 4,
    PosZ = 5,
}

impl Face {
    pub const ALL: [Face; 6] = [
        Face::NegX,
        Face::PosX,
        Face::NegY,
        Face::PosY,
        Face::NegZ,
        Face::PosZ,
    ];

    /// Returns the `[0..6)` index of this face.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Converts a face index `[0..6)` back into a `Face` value.
    /// Falls back to `PosY` for out-of-range indices.
    #[inline]
    pub fn from_index(i: usize) -> Face {
        Face::ALL.get(i).copied().unwrap_or(Face::PosY)
    }

    #[inline]
    pub fn opposite(self) -> Face {
        Face::from_index(self.index() ^ 1)
    }

    #[inline]
    pub fn basis(self) -> FaceBasis {
        CUBE_FACES[self.index()]
    }

    #[inline]
    pub fn normal(self) -> Vec3 {
        self.basis().normal
    }

    /// Returns the integer grid delta when stepping out of this face.
    #[inline]
    pub fn delta(self) -> Int3 {
        match self {
            Face::NegX => Int3::new(-1, 0, 0),
            Face::PosX => Int3::new(1, 0, 0),
            Face::NegY => Int3::new(0, -1, 0),
            Face::PosY => Int3::new(0, 1, 0),
            Face::NegZ => Int3::new(0, 0, -1),
            Face::PosZ => Int3::new(0, 0, 1),
        }
    }

    /// Top and bottom faces keep their canonical UVs and rotate corners instead.
    #[inline]
    pub fn is_horizontal(self) -> bool {
        matches!(self, Face::NegY | Face::PosY)
    }

    /// Faces whose triangles are emitted with reversed winding.
    #[inline]
    pub fn flips_winding(self) -> bool {
        self.index() % 2 != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deltas_match_normals() {
        for f in Face::ALL {
            let d = f.delta().as_vec3();
            assert_eq!(d, f.normal());
            assert_eq!(f.opposite().opposite(), f);
            assert_eq!(f.opposite().delta(), Int3::ZERO - f.delta());
        }
    }
}
