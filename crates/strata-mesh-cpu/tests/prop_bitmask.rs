use proptest::prelude::*;

use strata_geom::{Int3, Vec3};
use strata_mesh_cpu::{BitmaskArena, Face, MeshInputs, build_chunk_mesh};
use strata_tiles::{StyleTable, TileCatalog, TileShape};
use strata_world::{Cell, ChunkCoord, VoxelGrid};

const DIMS: Int3 = Int3::new(3, 3, 3);

fn cell_strategy() -> impl Strategy<Value = Cell> {
    (0usize..5, 0u8..4).prop_map(|(s, dir)| {
        let shape = TileShape::from_i32(s as i32 - 1).unwrap_or_default();
        Cell::new(shape, 0, dir)
    })
}

fn grid_from(cells: &[Cell]) -> VoxelGrid {
    let mut g = VoxelGrid::new(DIMS);
    for (i, &c) in cells.iter().enumerate() {
        g.put_at(i, c);
    }
    g
}

proptest! {
    // Visible quadrants are always a subset of what the shape itself covers.
    #[test]
    fn masks_never_exceed_shape(cells in proptest::collection::vec(cell_strategy(), 27)) {
        let g = grid_from(&cells);
        let cat = TileCatalog::analyze();
        let mut arena = BitmaskArena::new(DIMS);
        arena.refresh_all(&g, &cat);
        for (i, c) in cells.iter().enumerate() {
            let own = cat.borders(c.shape, c.dir);
            prop_assert_eq!(arena.combined(i) & !own, 0);
        }
    }

    // Two touching blocks never show the face between them.
    #[test]
    fn block_pairs_hide_shared_faces(cells in proptest::collection::vec(cell_strategy(), 27)) {
        let g = grid_from(&cells);
        let cat = TileCatalog::analyze();
        let mut arena = BitmaskArena::new(DIMS);
        arena.refresh_all(&g, &cat);
        for i in 0..cells.len() {
            let c = g.coord_of(i);
            if g.shape(c) != TileShape::Block {
                continue;
            }
            for face in Face::ALL {
                if g.shape(c + face.delta()) == TileShape::Block {
                    prop_assert_eq!(arena.face(c, face), 0);
                }
            }
        }
    }

    // Collision geometry mirrors the solid render triangles.
    #[test]
    fn collision_matches_render(cells in proptest::collection::vec(cell_strategy(), 27)) {
        let g = grid_from(&cells);
        let cat = TileCatalog::analyze();
        let mut arena = BitmaskArena::new(DIMS);
        arena.refresh_all(&g, &cat);
        let styles = StyleTable::default();
        let inp = MeshInputs { grid: &g, bitmasks: &arena, catalog: &cat, styles: &styles, cell_size: Vec3::ONE };
        match build_chunk_mesh(&inp, ChunkCoord::new(0, 0, 0)) {
            Some(m) => {
                prop_assert_eq!(m.render.tri_count(), m.collision.tri_count());
                prop_assert_eq!(&m.render.pos, &m.collision.pos);
            }
            None => prop_assert!(cells.iter().all(|c| c.is_empty())),
        }
    }
}
