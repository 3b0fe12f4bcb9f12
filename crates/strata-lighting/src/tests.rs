use super::*;
use std::sync::atomic::AtomicBool;
use strata_geom::{IAabb, Int3, Vec3};
use strata_tiles::TileShape;

fn full(dims: Int3) -> IAabb {
    IAabb::new(Int3::ZERO, dims)
}

fn field_with(dims: Int3, f: impl Fn(Int3) -> TileShape) -> (SkyField, Vec<TileShape>) {
    let mut shapes = vec![TileShape::Empty; dims.volume()];
    for y in 0..dims.y {
        for z in 0..dims.z {
            for x in 0..dims.x {
                shapes[((y * dims.z + z) * dims.x + x) as usize] = f(Int3::new(x, y, z));
            }
        }
    }
    let mut sky = SkyField::new(dims);
    sky.load_shapes(&shapes);
    (sky, shapes)
}

#[test]
fn lookup_fades_to_zero() {
    let l = light_lookup(4);
    assert_eq!(l.len(), 6);
    assert_eq!(l[0], 1.0);
    assert_eq!(l[5], 0.0);
    assert!(l.windows(2).all(|w| w[0] > w[1]));
    assert_eq!(light_lookup(0), vec![1.0, 0.0]);
}

#[test]
fn open_world_is_fully_lit() {
    let dims = Int3::new(6, 5, 4);
    let (mut sky, _) = field_with(dims, |_| TileShape::Empty);
    let stop = AtomicBool::new(false);
    let w = sky.propagate(full(dims), 4, &stop).unwrap();
    assert_eq!(w, full(dims));
    assert!(sky.colors().iter().all(|&c| c == 1.0));
}

#[test]
fn covered_cells_fade_with_distance() {
    // A roof at y=4 over x<4; light leaks in from the open side at x>=4.
    let dims = Int3::new(10, 6, 1);
    let (mut sky, _) = field_with(dims, |c| {
        if c.y == 4 && c.x < 4 { TileShape::Block } else { TileShape::Empty }
    });
    let stop = AtomicBool::new(false);
    sky.propagate(full(dims), 3, &stop).unwrap();
    assert_eq!(sky.distance(Int3::new(4, 0, 0)), 0);
    assert_eq!(sky.distance(Int3::new(3, 0, 0)), 1);
    assert_eq!(sky.distance(Int3::new(1, 0, 0)), 3);
    assert_eq!(sky.distance(Int3::new(0, 0, 0)), 4);
    assert_eq!(sky.brightness(Int3::new(0, 0, 0)), 0.0);
    assert!(sky.brightness(Int3::new(1, 0, 0)) > 0.0);
    // The roof itself is never entered.
    assert_eq!(sky.distance(Int3::new(2, 4, 0)), -1);
}

#[test]
fn ramp_cap_lights_shaft_from_above() {
    // 1x20x1 shaft in a 5x20x5 block, capped with a ramp on the open layer.
    let dims = Int3::new(5, 21, 5);
    let (mut sky, _) = field_with(dims, |c| {
        let shaft = c.x == 2 && c.z == 2;
        match (c.y, shaft) {
            (20, true) => TileShape::Ramp,
            (20, false) => TileShape::Empty,
            (_, true) => TileShape::Empty,
            _ => TileShape::Block,
        }
    });
    let stop = AtomicBool::new(false);
    sky.propagate(full(dims), 4, &stop).unwrap();
    for y in 0..20 {
        let b = sky.brightness(Int3::new(2, y, 2));
        if y >= 16 {
            assert!(b > 0.0, "y={y} should be lit, got {b}");
        } else {
            assert_eq!(b, 0.0, "y={y} should be dark");
        }
    }
}

#[test]
fn opening_a_roof_matches_full_recompute() {
    let dims = Int3::new(7, 8, 7);
    let roof = |c: Int3| if c.y == 5 { TileShape::Block } else { TileShape::Empty };
    let (mut sky, mut shapes) = field_with(dims, roof);
    let stop = AtomicBool::new(false);
    sky.propagate(full(dims), 3, &stop).unwrap();
    assert_eq!(sky.brightness(Int3::new(3, 2, 3)), 0.0);

    let hole = Int3::new(3, 5, 3);
    shapes[((hole.y * dims.z + hole.z) * dims.x + hole.x) as usize] = TileShape::Empty;
    let dirty = IAabb::new(hole, hole + Int3::ONE);
    sky.apply_shapes(&RegionPatch::capture(&shapes, dims, dirty));
    let w = sky.propagate(dirty, 3, &stop).unwrap();
    assert!(w.contains(Int3::new(3, 0, 3)));

    let (mut fresh, _) = field_with(dims, |c| if c == hole { TileShape::Empty } else { roof(c) });
    fresh.propagate(full(dims), 3, &stop).unwrap();
    assert_eq!(sky.colors(), fresh.colors());
    assert_eq!(sky.brightness(Int3::new(3, 0, 3)), 1.0);
    assert!(sky.brightness(Int3::new(4, 2, 3)) > 0.0);
}

#[test]
fn closing_a_roof_darkens_everything_below() {
    let dims = Int3::new(7, 8, 7);
    let (mut sky, mut shapes) = field_with(dims, |_| TileShape::Empty);
    let stop = AtomicBool::new(false);
    sky.propagate(full(dims), 3, &stop).unwrap();

    let roof = IAabb::new(Int3::new(0, 5, 0), Int3::new(7, 6, 7));
    for z in 0..7 {
        for x in 0..7 {
            shapes[((5 * dims.z + z) * dims.x + x) as usize] = TileShape::Block;
        }
    }
    sky.apply_shapes(&RegionPatch::capture(&shapes, dims, roof));
    let w = sky.propagate(roof, 3, &stop).unwrap();
    assert_eq!(w.min.y, 0);

    let (mut fresh, _) = field_with(dims, |c| if c.y == 5 { TileShape::Block } else { TileShape::Empty });
    fresh.propagate(full(dims), 3, &stop).unwrap();
    assert_eq!(sky.colors(), fresh.colors());
    assert_eq!(sky.brightness(Int3::new(3, 0, 3)), 0.0);
}

#[test]
fn cancel_leaves_field_untouched() {
    let dims = Int3::new(16, 16, 16);
    let (mut sky, _) = field_with(dims, |c| if c.y == 8 { TileShape::Block } else { TileShape::Empty });
    let stop = AtomicBool::new(true);
    assert!(sky.propagate(full(dims), 4, &stop).is_none());
    assert!(sky.colors().iter().all(|&c| c == 1.0));
    assert_eq!(sky.distance(Int3::new(0, 0, 0)), 0);
}

#[test]
fn smooth_light_interpolates_between_centres() {
    let dims = Int3::new(2, 1, 1);
    let light = vec![0.0, 1.0];
    let cell = Vec3::ONE;
    assert_eq!(smooth_light(&light, dims, cell, Vec3::new(0.0, 0.0, 0.0)), 0.0);
    assert_eq!(smooth_light(&light, dims, cell, Vec3::new(1.0, 0.0, 0.0)), 1.0);
    assert!((smooth_light(&light, dims, cell, Vec3::new(0.5, 0.3, 0.0)) - 0.5).abs() < 1e-6);
    // Clamped outside the grid.
    assert_eq!(smooth_light(&light, dims, cell, Vec3::new(-3.0, 5.0, 9.0)), 0.0);
    assert_eq!(smooth_light(&light, dims, cell, Vec3::new(7.0, 0.0, 0.0)), 1.0);
    // Cell size scales positions.
    let big = Vec3::new(2.0, 1.0, 1.0);
    assert!((smooth_light(&light, dims, big, Vec3::new(1.0, 0.0, 0.0)) - 0.5).abs() < 1e-6);
}

#[test]
fn patch_roundtrips_a_box() {
    let dims = Int3::new(4, 3, 5);
    let src: Vec<u32> = (0..dims.volume() as u32).collect();
    let region = IAabb::new(Int3::new(1, 1, 2), Int3::new(3, 3, 5));
    let p = RegionPatch::capture(&src, dims, region);
    assert_eq!(p.values.len(), 2 * 2 * 3);
    let mut dst = vec![0u32; dims.volume()];
    p.apply(&mut dst, dims);
    for (i, (&a, &b)) in src.iter().zip(&dst).enumerate() {
        let c = Int3::new(i as i32 % 4, i as i32 / 20, (i as i32 / 4) % 5);
        if region.contains(c) { assert_eq!(a, b) } else { assert_eq!(b, 0) }
    }
}
