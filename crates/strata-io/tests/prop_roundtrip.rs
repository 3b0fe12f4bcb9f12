use proptest::prelude::*;

use strata_geom::{IAabb, Int3};
use strata_io::{deserialize, paste_into, serialize, serialize_region};
use strata_tiles::TileShape;
use strata_world::{Cell, VoxelGrid};

fn cell_strategy() -> impl Strategy<Value = Cell> {
    (0i32..5, 0u32..4, 0u8..4).prop_map(|(s, style, dir)| {
        let shape = TileShape::from_i32(s - 1).unwrap_or_default();
        if shape.is_empty() {
            Cell::EMPTY
        } else {
            Cell::new(shape, style, dir)
        }
    })
}

fn grid_strategy() -> impl Strategy<Value = VoxelGrid> {
    (1i32..7, 1i32..5, 1i32..7).prop_flat_map(|(x, y, z)| {
        let dims = Int3::new(x, y, z);
        proptest::collection::vec(cell_strategy(), dims.volume()).prop_map(move |cells| {
            let mut g = VoxelGrid::new(dims);
            for (i, c) in cells.into_iter().enumerate() {
                g.put_at(i, c);
            }
            g
        })
    })
}

proptest! {
    #[test]
    fn whole_grid_round_trips(g in grid_strategy()) {
        let decoded = deserialize(&serialize(&g).unwrap()).unwrap();
        let mut back = VoxelGrid::new(g.dims());
        paste_into(&mut back, &decoded, Int3::ZERO).unwrap();
        for i in 0..g.len() {
            prop_assert_eq!(back.cell_at(i), g.cell_at(i));
        }
    }

    // Any sub-box decodes to exactly the cells it covered.
    #[test]
    fn sub_boxes_round_trip(
        g in grid_strategy(),
        a in (0i32..7, 0i32..5, 0i32..7),
        b in (0i32..7, 0i32..5, 0i32..7),
    ) {
        let d = g.dims();
        let p = Int3::new(a.0.min(d.x), a.1.min(d.y), a.2.min(d.z));
        let q = Int3::new(b.0.min(d.x), b.1.min(d.y), b.2.min(d.z));
        let region = IAabb::new(p.min(q), p.max(q));
        let decoded = deserialize(&serialize_region(&g, region).unwrap()).unwrap();
        prop_assert_eq!(decoded.size, region.size());
        for y in region.min.y..region.max.y {
            for z in region.min.z..region.max.z {
                for x in region.min.x..region.max.x {
                    let c = Int3::new(x, y, z);
                    prop_assert_eq!(decoded.cell(c - region.min), g.cell(c));
                }
            }
        }
    }
}
