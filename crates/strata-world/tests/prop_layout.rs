use proptest::prelude::*;
use strata_geom::{IAabb, Int3};
use strata_world::{ChunkCoord, ChunkLayout};

fn arb_dims() -> impl Strategy<Value = Int3> {
    (1i32..50, 1i32..50, 1i32..50).prop_map(|(x, y, z)| Int3::new(x, y, z))
}

proptest! {
    // Every cell belongs to exactly one chunk, and that chunk's box holds it.
    #[test]
    fn cell_boxes_partition_the_world(dims in arb_dims(), p in (0i32..50, 0i32..50, 0i32..50)) {
        let l = ChunkLayout::new(dims);
        let c = Int3::new(p.0 % dims.x, p.1 % dims.y, p.2 % dims.z);
        let owner = ChunkCoord::of_cell(c);
        prop_assert!(l.contains(owner));
        prop_assert!(l.cell_box(owner).contains(c));
        let holders = l.iter().filter(|&k| l.cell_box(k).contains(c)).count();
        prop_assert_eq!(holders, 1);
    }

    // chunks_touching returns exactly the chunks whose box overlaps the query.
    #[test]
    fn touching_matches_brute_force(
        dims in arb_dims(),
        a in (-5i32..55, -5i32..55, -5i32..55),
        s in (0i32..20, 0i32..20, 0i32..20),
    ) {
        let l = ChunkLayout::new(dims);
        let min = Int3::new(a.0, a.1, a.2);
        let q = IAabb::new(min, min + Int3::new(s.0, s.1, s.2));
        let got = l.chunks_touching(q);
        let clipped = q.clamp_to(dims);
        let want: Vec<ChunkCoord> = l
            .iter()
            .filter(|&k| {
                let b = l.cell_box(k);
                !clipped.is_empty()
                    && b.min.x < clipped.max.x && clipped.min.x < b.max.x
                    && b.min.y < clipped.max.y && clipped.min.y < b.max.y
                    && b.min.z < clipped.max.z && clipped.min.z < b.max.z
            })
            .collect();
        prop_assert_eq!(got, want);
    }

    #[test]
    fn indices_are_dense(dims in arb_dims()) {
        let l = ChunkLayout::new(dims);
        let mut seen = vec![false; l.num_chunks()];
        for k in l.iter() {
            let i = l.index(k).unwrap();
            prop_assert!(!seen[i]);
            seen[i] = true;
        }
        prop_assert!(seen.iter().all(|&b| b));
    }
}
