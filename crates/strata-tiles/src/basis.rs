use strata_geom::Vec3;

/// Probe frame for one face: outward normal plus the in-plane axes that
/// define quadrant order (+right, +up, -right, -up).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FaceBasis {
    pub normal: Vec3,
    pub right: Vec3,
    pub up: Vec3,
}

impl FaceBasis {
    #[inline]
    pub const fn new(normal: Vec3, right: Vec3, up: Vec3) -> Self {
        Self { normal, right, up }
    }

    #[inline]
    pub fn rotated(self, quarters: i32) -> FaceBasis {
        FaceBasis {
            normal: self.normal.rotate_y_quarters(quarters),
            right: self.right.rotate_y_quarters(quarters),
            up: self.up.rotate_y_quarters(quarters),
        }
    }
}

const X: Vec3 = Vec3::new(1.0, 0.0, 0.0);
const Y: Vec3 = Vec3::new(0.0, 1.0, 0.0);
const Z: Vec3 = Vec3::new(0.0, 0.0, 1.0);
const NX: Vec3 = Vec3::new(-1.0, 0.0, 0.0);
const NY: Vec3 = Vec3::new(0.0, -1.0, 0.0);
const NZ: Vec3 = Vec3::new(0.0, 0.0, -1.0);

/// Cube faces in order -x, +x, -y, +y, -z, +z. Face `f` and `f ^ 1` are
/// opposites.
pub const CUBE_FACES: [FaceBasis; 6] = [
    FaceBasis::new(NX, Z, NY),
    FaceBasis::new(X, Z, NY),
    FaceBasis::new(NY, X, NZ),
    FaceBasis::new(Y, X, NZ),
    FaceBasis::new(NZ, NX, NY),
    FaceBasis::new(Z, NX, NY),
];

/// Diagonal frames. 0..4 are vertical diagonal walls, 4..8 are ramps whose
/// horizontal normals run +x, -z, -x, +z. Axes are left unnormalized.
pub fn slope_bases() -> [FaceBasis; 8] {
    let mut out = [FaceBasis::new(Vec3::ZERO, Vec3::ZERO, Vec3::ZERO); 8];
    for (i, b) in out.iter_mut().enumerate() {
        let q = i as i32;
        *b = if i < 4 {
            FaceBasis::new(X + Z, X - Z, Y).rotated(q)
        } else {
            FaceBasis::new(X, NZ, NX + Y).rotated(q)
        };
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_faces_pair_up() {
        for f in 0..6 {
            assert_eq!(CUBE_FACES[f].normal, -CUBE_FACES[f ^ 1].normal);
        }
    }

    #[test]
    fn ramp_normals_cycle() {
        let s = slope_bases();
        assert_eq!(s[4].normal, X);
        assert_eq!(s[5].normal, NZ);
        assert_eq!(s[6].normal, NX);
        assert_eq!(s[7].normal, Z);
        assert_eq!(s[6].up, Vec3::new(1.0, 1.0, 0.0));
    }
}
