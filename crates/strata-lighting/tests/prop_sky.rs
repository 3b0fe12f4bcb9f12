use proptest::prelude::*;
use std::sync::atomic::AtomicBool;
use strata_geom::{IAabb, Int3};
use strata_lighting::{SkyField, light_lookup};
use strata_tiles::TileShape;

fn arb_shape() -> impl Strategy<Value = TileShape> {
    prop_oneof![
        4 => Just(TileShape::Empty),
        3 => Just(TileShape::Block),
        1 => Just(TileShape::Half),
        1 => Just(TileShape::Ramp),
        1 => Just(TileShape::Corner),
    ]
}

fn arb_world() -> impl Strategy<Value = (Int3, Vec<TileShape>)> {
    (1i32..=6, 1i32..=7, 1i32..=6).prop_flat_map(|(x, y, z)| {
        let dims = Int3::new(x, y, z);
        prop::collection::vec(arb_shape(), dims.volume()).prop_map(move |v| (dims, v))
    })
}

proptest! {
    // Nothing farther than max_spread from a lit tile gets any brightness,
    // and everything within reach does.
    #[test]
    fn brightness_respects_spread((dims, shapes) in arb_world(), spread in 0i32..5) {
        let mut sky = SkyField::new(dims);
        sky.load_shapes(&shapes);
        let stop = AtomicBool::new(false);
        let w = sky.propagate(IAabb::new(Int3::ZERO, dims), spread, &stop).unwrap();
        prop_assert_eq!(w, IAabb::new(Int3::ZERO, dims));
        let lookup = light_lookup(spread);
        for y in 0..dims.y { for z in 0..dims.z { for x in 0..dims.x {
            let c = Int3::new(x, y, z);
            let d = sky.distance(c);
            let b = sky.brightness(c);
            prop_assert!(d >= -1 && d <= spread + 1);
            if d > spread || d < 0 {
                prop_assert_eq!(b, 0.0);
            } else {
                prop_assert!(b > 0.0);
                prop_assert_eq!(b, lookup[d as usize]);
            }
        }}}
    }

    // Full blocks never receive light.
    #[test]
    fn blocks_stay_dark((dims, shapes) in arb_world()) {
        let mut sky = SkyField::new(dims);
        sky.load_shapes(&shapes);
        let stop = AtomicBool::new(false);
        sky.propagate(IAabb::new(Int3::ZERO, dims), 4, &stop).unwrap();
        for (i, s) in shapes.iter().enumerate() {
            if *s == TileShape::Block {
                prop_assert_eq!(sky.colors()[i], 0.0);
            }
        }
    }
}
