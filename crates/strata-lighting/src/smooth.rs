use strata_geom::{Int3, Vec3, lerp};

/// Trilinear sample of a per-cell light field at terrain-local `pos`.
/// Cell centres sit on integer multiples of `cell_size`; lookups outside the
/// grid clamp to the nearest edge cell.
pub fn smooth_light(light: &[f32], dims: Int3, cell_size: Vec3, pos: Vec3) -> f32 {
    if dims.volume() == 0 || light.len() < dims.volume() {
        return 0.0;
    }
    let t = Vec3::new(pos.x / cell_size.x, pos.y / cell_size.y, pos.z / cell_size.z);
    let base = Int3::new(t.x.floor() as i32, t.y.floor() as i32, t.z.floor() as i32);
    let g = Vec3::new(t.x - base.x as f32, t.y - base.y as f32, t.z - base.z as f32);
    let at = |dx: i32, dy: i32, dz: i32| {
        let x = (base.x + dx).clamp(0, dims.x - 1);
        let y = (base.y + dy).clamp(0, dims.y - 1);
        let z = (base.z + dz).clamp(0, dims.z - 1);
        light[((y * dims.z + z) * dims.x + x) as usize]
    };
    let c00 = lerp(at(0, 0, 0), at(0, 0, 1), g.z);
    let c01 = lerp(at(0, 1, 0), at(0, 1, 1), g.z);
    let c10 = lerp(at(1, 0, 0), at(1, 0, 1), g.z);
    let c11 = lerp(at(1, 1, 0), at(1, 1, 1), g.z);
    let c0 = lerp(c00, c01, g.y);
    let c1 = lerp(c10, c11, g.y);
    lerp(c0, c1, g.x)
}
