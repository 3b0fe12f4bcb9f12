use strata_geom::{Vec2, Vec3};

use crate::constants::OPAQUE_ALPHA;

/// Flat render buffers. Colors are RGBA8: red carries smoothed light, green
/// marks trim vertices and blue holds the texture-array slice.
#[derive(Default, Clone, Debug)]
pub struct MeshBuild {
    pub pos: Vec<f32>,
    pub norm: Vec<f32>,
    pub uv: Vec<f32>,
    pub idx: Vec<u32>,
    pub col: Vec<u8>,
}

impl MeshBuild {
    /// Clears all arrays but retains capacity for reuse across builds.
    #[inline]
    pub fn clear_keep_capacity(&mut self) {
        self.pos.clear();
        self.norm.clear();
        self.uv.clear();
        self.idx.clear();
        self.col.clear();
    }

    #[inline]
    pub fn reserve_tris(&mut self, n_tris: usize) {
        self.pos.reserve(n_tris * 3 * 3);
        self.norm.reserve(n_tris * 3 * 3);
        self.uv.reserve(n_tris * 3 * 2);
        self.col.reserve(n_tris * 3 * 4);
        self.idx.reserve(n_tris * 3);
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.pos.len() / 3
    }

    #[inline]
    pub fn tri_count(&self) -> usize {
        self.idx.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.idx.is_empty()
    }

    #[inline]
    pub fn position(&self, v: usize) -> Vec3 {
        Vec3::new(self.pos[v * 3], self.pos[v * 3 + 1], self.pos[v * 3 + 2])
    }

    #[inline]
    pub fn normal(&self, v: usize) -> Vec3 {
        Vec3::new(self.norm[v * 3], self.norm[v * 3 + 1], self.norm[v * 3 + 2])
    }

    #[inline]
    pub fn set_uv(&mut self, v: usize, uv: Vec2) {
        self.uv[v * 2] = uv.x;
        self.uv[v * 2 + 1] = uv.y;
    }

    #[inline]
    pub fn color(&self, v: usize) -> [u8; 4] {
        let c = &self.col[v * 4..v * 4 + 4];
        [c[0], c[1], c[2], c[3]]
    }

    #[inline]
    pub fn color_mut(&mut self, v: usize) -> &mut [u8] {
        &mut self.col[v * 4..v * 4 + 4]
    }

    #[inline]
    fn push_vertex(&mut self, p: Vec3, n: Vec3, uv: Vec2) {
        self.pos.extend_from_slice(&[p.x, p.y, p.z]);
        self.norm.extend_from_slice(&[n.x, n.y, n.z]);
        self.uv.extend_from_slice(&[uv.x, uv.y]);
        self.col.extend_from_slice(&[255, 0, 0, OPAQUE_ALPHA]);
    }

    /// Appends one triangle. With `flip` the vertices go in as `a, b, c`,
    /// otherwise as `a, c, b`; UVs follow their vertices either way.
    #[allow(clippy::too_many_arguments)]
    pub fn add_tri(
        &mut self,
        a: Vec3,
        b: Vec3,
        c: Vec3,
        uv_a: Vec2,
        uv_b: Vec2,
        uv_c: Vec2,
        n: Vec3,
        flip: bool,
    ) {
        let base = self.vertex_count() as u32;
        let (b, c, uv_b, uv_c) = if flip {
            (b, c, uv_b, uv_c)
        } else {
            (c, b, uv_c, uv_b)
        };
        self.push_vertex(a, n, uv_a);
        self.push_vertex(b, n, uv_b);
        self.push_vertex(c, n, uv_c);
        self.idx.extend_from_slice(&[base, base + 1, base + 2]);
    }
}

/// Position and index only; mirrors the solid surface without trim.
#[derive(Default, Clone, Debug)]
pub struct CollisionMesh {
    pub pos: Vec<f32>,
    pub idx: Vec<u32>,
}

impl CollisionMesh {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.pos.len() / 3
    }

    #[inline]
    pub fn tri_count(&self) -> usize {
        self.idx.len() / 3
    }

    /// Copies render vertices `verts` and the triangles in `tris` (index
    /// range into `src.idx`), rebasing indices onto this buffer.
    pub fn append_from(
        &mut self,
        src: &MeshBuild,
        verts: std::ops::Range<usize>,
        tris: std::ops::Range<usize>,
    ) {
        let base = self.vertex_count() as u32;
        let first = verts.start as u32;
        self.pos.extend_from_slice(&src.pos[verts.start * 3..verts.end * 3]);
        self.idx
            .extend(src.idx[tris].iter().map(|&i| i - first + base));
    }
}
