//! Geometric occlusion analysis of the shape catalog.
//!
//! Every solid shape is probed once per Y rotation. Each cube face and each
//! diagonal plane is split into four triangular quadrants around its centre
//! (an "X" layout); a quadrant counts as covered when the shape's surface
//! passes through its sample point facing outward along the probe normal.
//! The resulting masks drive interior-face culling, and the captured UV
//! rectangles keep textures continuous when quadrants are merged.

use strata_geom::{Vec2, Vec3};

use crate::basis::{CUBE_FACES, FaceBasis, slope_bases};
use crate::shape::TileShape;

/// Half-thickness of the probe straddling each sample point.
const PROBE_EPS: f32 = 0.04;
/// Distance from the face centre to each quadrant sample.
const QUADRANT_OFFSET: f32 = 0.25;
/// Step used to measure texture-space derivatives.
const UV_STEP: f32 = 0.01;

/// Occlusion and UV data for one shape across its four rotations.
#[derive(Clone, Debug, PartialEq)]
pub struct TileType {
    pub shape: TileShape,
    /// 24 bits per rotation: face `f` occupies bits `4f..4f+4`.
    pub borders: [u32; 4],
    /// 32 bits per rotation: slope `i` occupies bits `4i..4i+4`.
    pub slopes: [u32; 4],
    /// `[rotation * 12 + face * 2 + {0: min, 1: max}]`
    pub border_uvs: [Vec2; 48],
    /// `[rotation * 16 + slope * 2 + {0: min, 1: max}]`
    pub slope_uvs: [Vec2; 64],
}

impl TileType {
    #[inline]
    pub fn border_mask(&self, rotation: usize, face: usize) -> u32 {
        (self.borders[rotation & 3] >> (face * 4)) & 0xF
    }

    #[inline]
    pub fn slope_mask(&self, rotation: usize, slope: usize) -> u32 {
        (self.slopes[rotation & 3] >> (slope * 4)) & 0xF
    }

    #[inline]
    pub fn border_uv(&self, rotation: usize, face: usize) -> (Vec2, Vec2) {
        let i = (rotation & 3) * 12 + face * 2;
        (self.border_uvs[i], self.border_uvs[i + 1])
    }

    #[inline]
    pub fn slope_uv(&self, rotation: usize, slope: usize) -> (Vec2, Vec2) {
        let i = (rotation & 3) * 16 + slope * 2;
        (self.slope_uvs[i], self.slope_uvs[i + 1])
    }

    pub fn analyze(shape: TileShape) -> TileType {
        let slope_frames = slope_bases();
        let mut ty = TileType {
            shape,
            borders: [0; 4],
            slopes: [0; 4],
            border_uvs: [Vec2::ZERO; 48],
            slope_uvs: [Vec2::ZERO; 64],
        };
        for rotation in 0..4usize {
            // Probing the unrotated shape with inversely rotated frames is the
            // same as probing the rotated shape with fixed frames.
            let q = -(rotation as i32);
            for (face, basis) in CUBE_FACES.iter().enumerate() {
                let probe = analyze_face(shape, basis.rotated(q), 0.5);
                ty.borders[rotation] |= probe.mask << (face * 4);
                ty.border_uvs[rotation * 12 + face * 2] = probe.uv_min;
                ty.border_uvs[rotation * 12 + face * 2 + 1] = probe.uv_max;
            }
            for (slope, basis) in slope_frames.iter().enumerate() {
                let probe = analyze_face(shape, basis.rotated(q), 0.0);
                ty.slopes[rotation] |= probe.mask << (slope * 4);
                ty.slope_uvs[rotation * 16 + slope * 2] = probe.uv_min;
                ty.slope_uvs[rotation * 16 + slope * 2 + 1] = probe.uv_max;
            }
        }
        ty
    }
}

struct FaceProbe {
    mask: u32,
    uv_min: Vec2,
    uv_max: Vec2,
}

fn analyze_face(shape: TileShape, basis: FaceBasis, offset: f32) -> FaceProbe {
    let n_hat = basis.normal.normalized();
    let origin = basis.normal * offset;
    let proj = BoxProjection::for_normal(basis.normal);
    let mut out = FaceProbe {
        mask: 0,
        uv_min: Vec2::ZERO,
        uv_max: Vec2::ZERO,
    };
    for dir in 0..4u32 {
        let p = match dir {
            0 => origin + basis.right * QUADRANT_OFFSET,
            1 => origin + basis.up * QUADRANT_OFFSET,
            2 => origin - basis.right * QUADRANT_OFFSET,
            _ => origin - basis.up * QUADRANT_OFFSET,
        };
        let outside = !shape.contains(p + n_hat * PROBE_EPS);
        let inside = shape.contains(p - n_hat * PROBE_EPS);
        if !(outside && inside) {
            continue;
        }
        out.mask |= 1 << dir;
        let tex = proj.uv(p);
        let tex_u = (proj.uv(p + basis.right * UV_STEP) - tex) * (1.0 / UV_STEP);
        let tex_v = (proj.uv(p + basis.up * UV_STEP) - tex) * (1.0 / UV_STEP);
        let (lo_u, lo_v, hi_u, hi_v) = match dir {
            0 => (0.75, 0.5, 0.25, 0.5),
            1 => (0.5, 0.75, 0.5, 0.25),
            2 => (0.25, 0.5, 0.75, 0.5),
            _ => (0.5, 0.25, 0.5, 0.75),
        };
        out.uv_min = tex - tex_u * lo_u - tex_v * lo_v;
        out.uv_max = tex + tex_u * hi_u + tex_v * hi_v;
    }
    out
}

/// Planar box mapping of the unit cell, chosen by the dominant axis of the
/// probe normal.
#[derive(Copy, Clone)]
enum BoxProjection {
    Top,
    SideX,
    SideZ,
}

impl BoxProjection {
    fn for_normal(n: Vec3) -> BoxProjection {
        let (ax, ay, az) = (n.x.abs(), n.y.abs(), n.z.abs());
        if ay > ax && ay > az {
            BoxProjection::Top
        } else if ax >= az {
            BoxProjection::SideX
        } else {
            BoxProjection::SideZ
        }
    }

    fn uv(self, p: Vec3) -> Vec2 {
        match self {
            BoxProjection::Top => Vec2::new(p.x + 0.5, p.z + 0.5),
            BoxProjection::SideX => Vec2::new(p.z + 0.5, p.y + 0.5),
            BoxProjection::SideZ => Vec2::new(p.x + 0.5, p.y + 0.5),
        }
    }
}

/// Analysis results for every solid shape, indexed by `TileShape::catalog_index`.
#[derive(Clone, Debug)]
pub struct TileCatalog {
    types: Vec<TileType>,
}

impl Default for TileCatalog {
    fn default() -> Self {
        Self::analyze()
    }
}

impl TileCatalog {
    pub fn analyze() -> Self {
        let types = TileShape::SOLID.iter().map(|&s| TileType::analyze(s)).collect();
        TileCatalog { types }
    }

    #[inline]
    pub fn get(&self, shape: TileShape) -> Option<&TileType> {
        shape.catalog_index().and_then(|i| self.types.get(i))
    }

    /// Face masks for a placed tile; zero for empty cells.
    #[inline]
    pub fn borders(&self, shape: TileShape, dir: u8) -> u32 {
        self.get(shape).map_or(0, |t| t.borders[dir as usize & 3])
    }

    #[inline]
    pub fn slopes(&self, shape: TileShape, dir: u8) -> u32 {
        self.get(shape).map_or(0, |t| t.slopes[dir as usize & 3])
    }
}
