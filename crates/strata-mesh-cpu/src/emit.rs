use strata_geom::{Vec2, Vec3};

use crate::constants::{DROOP_FRACTION, TRIM_FLAG, TRIM_NORMAL_OFFSET};
use crate::mesh_build::MeshBuild;
use crate::shade::slice_byte;

/// A face plane split into four triangular quadrants around `center`.
/// Corner `j` sits between quadrants `j` and `j + 1`.
pub(crate) struct QuadrantFace {
    pub center: Vec3,
    pub corners: [Vec3; 4],
    pub corner_uv: [Vec2; 4],
    pub mid_uv: Vec2,
    pub normal: Vec3,
    pub flip: bool,
}

impl QuadrantFace {
    /// Corners of a face at `center` spanned by half-extents `right` and `up`:
    /// corner 0 is `+r-u`, then `+r+u`, `-r+u`, `-r-u`. UV corners are picked
    /// from the rectangle through `selector(j)`.
    pub fn new(
        center: Vec3,
        right: Vec3,
        up: Vec3,
        uv: (Vec2, Vec2),
        selector: impl Fn(usize) -> usize,
        normal: Vec3,
        flip: bool,
    ) -> Self {
        let (uv_min, uv_max) = uv;
        let mut corners = [Vec3::ZERO; 4];
        let mut corner_uv = [Vec2::ZERO; 4];
        for j in 0..4 {
            let sr = if j == 0 || j == 1 { 1.0 } else { -1.0 };
            let su = if j == 1 || j == 2 { 1.0 } else { -1.0 };
            corners[j] = center + right * sr + up * su;
            let s = selector(j);
            corner_uv[j] = Vec2::new(
                if s == 0 || s == 1 { uv_max.x } else { uv_min.x },
                if s == 1 || s == 2 { uv_max.y } else { uv_min.y },
            );
        }
        Self {
            center,
            corners,
            corner_uv,
            mid_uv: (uv_min + uv_max) * 0.5,
            normal,
            flip,
        }
    }

    /// Emits the quadrants set in `mask` (bit `j` = quadrant `j`). Two
    /// neighbouring quadrants fold into one corner triangle; a lone quadrant
    /// becomes a fan triangle from the centre.
    pub fn emit(&self, mask: u32, out: &mut MeshBuild) {
        let mut filled = [false; 4];
        for (j, f) in filled.iter_mut().enumerate() {
            *f = mask & (1 << j) != 0;
        }
        let c = &self.corners;
        let t = &self.corner_uv;
        for j in 0..4 {
            if !filled[j] {
                continue;
            }
            let j1 = (j + 1) % 4;
            let j2 = (j + 2) % 4;
            let j3 = (j + 3) % 4;
            if filled[j1] {
                out.add_tri(c[j], c[j1], c[j2], t[j], t[j1], t[j2], self.normal, self.flip);
                filled[j1] = false;
            } else if filled[j3] {
                out.add_tri(c[j], c[j1], c[j3], t[j], t[j1], t[j3], self.normal, self.flip);
                filled[j3] = false;
            } else {
                out.add_tri(
                    self.center,
                    c[j],
                    c[j1],
                    self.mid_uv,
                    t[j],
                    t[j1],
                    self.normal,
                    self.flip,
                );
            }
            filled[j] = false;
        }
    }
}

/// Which part of an edge a trim strip covers.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum TrimSpan {
    /// From `a` to the midpoint.
    FirstHalf,
    /// From the midpoint to `b`.
    SecondHalf,
    Full,
}

impl TrimSpan {
    #[inline]
    pub fn half(i: usize) -> TrimSpan {
        if i == 0 {
            TrimSpan::FirstHalf
        } else {
            TrimSpan::SecondHalf
        }
    }
}

/// Emits a trim strip hanging from edge `a..b`, drooping down (or rising)
/// by half a cell and lifted off the surface along `n`. Trim vertices are
/// flagged in green and carry `border_index` in blue; light is filled in by
/// the shading pass.
#[allow(clippy::too_many_arguments)]
pub(crate) fn add_overflow(
    out: &mut MeshBuild,
    a: Vec3,
    b: Vec3,
    n: Vec3,
    flip: bool,
    down: bool,
    cell_height: f32,
    border_index: u32,
    span: TrimSpan,
) {
    let normal_offset = n * TRIM_NORMAL_OFFSET;
    let droop = Vec3::UP * (cell_height * DROOP_FRACTION * if down { -1.0 } else { 1.0 });
    let (mut v0, mut v1) = (a, b);
    let (mut u0, mut u1) = (0.0, 1.0);
    match span {
        TrimSpan::FirstHalf => {
            v1 = (a + b) * 0.5;
            u1 = 0.5;
        }
        TrimSpan::SecondHalf => {
            v0 = (a + b) * 0.5;
            u0 = 0.5;
        }
        TrimSpan::Full => {}
    }
    let v2 = v1 + droop + normal_offset;
    let v3 = v0 + droop + normal_offset;

    let first = out.vertex_count();
    out.add_tri(
        v0,
        v1,
        v2,
        Vec2::new(u0, 1.0),
        Vec2::new(u1, 1.0),
        Vec2::new(u1, 0.0),
        Vec3::UP,
        flip,
    );
    out.add_tri(
        v2,
        v3,
        v0,
        Vec2::new(u1, 0.0),
        Vec2::new(u0, 0.0),
        Vec2::new(u0, 1.0),
        Vec3::UP,
        flip,
    );
    let slice = slice_byte(border_index);
    for v in first..out.vertex_count() {
        let c = out.color_mut(v);
        c[1] = TRIM_FLAG;
        c[2] = slice;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_face() -> QuadrantFace {
        QuadrantFace::new(
            Vec3::ZERO,
            Vec3::RIGHT * 0.5,
            Vec3::UP * 0.5,
            (Vec2::ZERO, Vec2::new(1.0, 1.0)),
            |j| j,
            Vec3::FORWARD,
            true,
        )
    }

    #[test]
    fn full_face_is_two_triangles() {
        let mut m = MeshBuild::default();
        unit_face().emit(0xF, &mut m);
        assert_eq!(m.tri_count(), 2);
    }

    #[test]
    fn lone_quadrant_fans_from_center() {
        let mut m = MeshBuild::default();
        unit_face().emit(0b0100, &mut m);
        assert_eq!(m.tri_count(), 1);
        assert_eq!(m.position(0), Vec3::ZERO);
        assert_eq!(m.uv[0], 0.5);
    }

    #[test]
    fn three_quadrants_make_two_triangles() {
        let mut m = MeshBuild::default();
        unit_face().emit(0b0111, &mut m);
        assert_eq!(m.tri_count(), 2);
        let mut m = MeshBuild::default();
        unit_face().emit(0b0101, &mut m);
        assert_eq!(m.tri_count(), 2);
    }

    #[test]
    fn overflow_droops_and_flags() {
        let mut m = MeshBuild::default();
        add_overflow(
            &mut m,
            Vec3::ZERO,
            Vec3::RIGHT,
            Vec3::FORWARD,
            true,
            true,
            2.0,
            7,
            TrimSpan::Full,
        );
        assert_eq!(m.tri_count(), 2);
        let low = m.position(2);
        assert!((low.y + 1.0).abs() < 1e-6);
        assert!((low.z - TRIM_NORMAL_OFFSET).abs() < 1e-6);
        for v in 0..m.vertex_count() {
            assert_eq!(m.color(v)[1], TRIM_FLAG);
            assert_eq!(m.color(v)[2], 7);
        }

        let mut half = MeshBuild::default();
        add_overflow(
            &mut half,
            Vec3::ZERO,
            Vec3::RIGHT,
            Vec3::FORWARD,
            true,
            false,
            1.0,
            0,
            TrimSpan::SecondHalf,
        );
        assert_eq!(half.position(0), Vec3::new(0.5, 0.0, 0.0));
        assert!(half.position(2).y > 0.0);
    }
}
