use std::sync::atomic::{AtomicBool, Ordering};

use strata_geom::{Int3, Vec2, Vec3};
use strata_lighting::smooth_light;
use strata_tiles::StyleIndices;

use crate::constants::{DIAGONAL_UV_STRETCH, LIGHT_SAMPLE_LIFT, WALL_UV_PERIOD};
use crate::mesh_build::MeshBuild;

static SLICE_OVERFLOW_WARNED: AtomicBool = AtomicBool::new(false);

/// Packs a texture slice into the blue channel. Slices past 255 clamp, with
/// one warning per process.
#[inline]
pub fn slice_byte(index: u32) -> u8 {
    match u8::try_from(index) {
        Ok(b) => b,
        Err(_) => {
            if !SLICE_OVERFLOW_WARNED.swap(true, Ordering::Relaxed) {
                log::warn!("texture slice {} does not fit a vertex byte, clamped to 255", index);
            }
            u8::MAX
        }
    }
}

#[inline]
pub fn light_byte(light: f32) -> u8 {
    (light.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Assigns texture slices to the solid vertices `verts` of one cell. Styles
/// with a wall texture switch to world-projected UVs so walls tile across
/// cells, and faces that aren't floors sample the wall slice.
pub(crate) fn shade_cell_style(
    mesh: &mut MeshBuild,
    verts: std::ops::Range<usize>,
    style: StyleIndices,
    cell_size: Vec3,
) {
    let floor = slice_byte(style.floor);
    for v in verts {
        let n = mesh.normal(v);
        let slice = match style.wall {
            Some(wall) => {
                let p = mesh.position(v);
                let s = Vec3::new(
                    p.x / cell_size.x,
                    p.y / cell_size.y,
                    p.z / cell_size.z,
                ) / WALL_UV_PERIOD;
                let mut uv = if n.y.abs() > 0.1 {
                    Vec2::new(s.x, s.z)
                } else if n.x.abs() < 0.3 {
                    Vec2::new(s.x, s.y)
                } else {
                    Vec2::new(s.z, s.y)
                };
                if (n.x.abs() - 0.7).abs() < 0.1 {
                    uv.x *= DIAGONAL_UV_STRETCH;
                }
                mesh.set_uv(v, uv);
                if n.y <= 0.1 { slice_byte(wall) } else { floor }
            }
            None => floor,
        };
        let c = mesh.color_mut(v);
        c[1] = 0;
        c[2] = slice;
    }
}

/// Refreshes the light channel of every vertex from the grid's light field.
pub fn recolor(mesh: &mut MeshBuild, light: &[f32], dims: Int3, cell_size: Vec3) {
    let lift = Vec3::UP * (cell_size.y * LIGHT_SAMPLE_LIFT);
    for v in 0..mesh.vertex_count() {
        let l = smooth_light(light, dims, cell_size, mesh.position(v) + lift);
        mesh.color_mut(v)[0] = light_byte(l);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_tri(n: Vec3) -> MeshBuild {
        let mut m = MeshBuild::default();
        let z = Vec2::ZERO;
        m.add_tri(
            Vec3::new(4.0, 0.0, 8.0),
            Vec3::new(4.0, 4.0, 8.0),
            Vec3::new(4.0, 0.0, 12.0),
            z,
            z,
            z,
            n,
            true,
        );
        m
    }

    #[test]
    fn plain_style_keeps_uvs() {
        let mut m = one_tri(Vec3::RIGHT);
        let before = m.uv.clone();
        let style = StyleIndices {
            floor: 3,
            wall: None,
            trim: None,
        };
        shade_cell_style(&mut m, 0..3, style, Vec3::ONE);
        assert_eq!(m.uv, before);
        assert_eq!(m.color(0)[2], 3);
    }

    #[test]
    fn walls_project_and_use_wall_slice() {
        let mut m = one_tri(Vec3::RIGHT);
        let style = StyleIndices {
            floor: 1,
            wall: Some(2),
            trim: None,
        };
        shade_cell_style(&mut m, 0..3, style, Vec3::ONE);
        // +x wall projects (z, y)
        assert_eq!(m.uv[0], 2.0);
        assert_eq!(m.uv[1], 0.0);
        assert_eq!(m.color(0)[2], 2);

        let mut top = one_tri(Vec3::UP);
        shade_cell_style(&mut top, 0..3, style, Vec3::ONE);
        assert_eq!(top.uv[0], 1.0);
        assert_eq!(top.uv[1], 2.0);
        assert_eq!(top.color(0)[2], 1);
    }

    #[test]
    fn oversized_slices_clamp_and_warn_once() {
        assert_eq!(slice_byte(255), 255);
        assert_eq!(slice_byte(300), 255);
        assert!(SLICE_OVERFLOW_WARNED.load(Ordering::Relaxed));
        assert_eq!(slice_byte(u32::MAX), 255);
    }

    #[test]
    fn recolor_samples_light_field() {
        let mut m = one_tri(Vec3::UP);
        recolor(&mut m, &[0.5], Int3::ONE, Vec3::ONE);
        for v in 0..3 {
            assert_eq!(m.color(v)[0], 128);
        }
    }
}
