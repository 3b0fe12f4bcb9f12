//! Per-cell face occlusion masks.
//!
//! Each cell stores six 4-bit masks, one per cube face. A set bit is a
//! visible quadrant: the shape covers it and the face-adjacent neighbour
//! does not cover the matching quadrant of its opposite face.

use strata_geom::{IAabb, Int3};
use strata_tiles::TileCatalog;
use strata_world::{ChunkCoord, VoxelGrid};

use crate::face::Face;

/// Flat mask storage indexed like the voxel grid, six bytes per cell.
#[derive(Clone, Debug, Default)]
pub struct BitmaskArena {
    dims: Int3,
    masks: Vec<u8>,
}

impl BitmaskArena {
    pub fn new(dims: Int3) -> Self {
        Self {
            dims,
            masks: vec![0; dims.volume() * 6],
        }
    }

    #[inline]
    pub fn dims(&self) -> Int3 {
        self.dims
    }

    #[inline]
    fn index(&self, c: Int3) -> Option<usize> {
        let d = self.dims;
        if c.x < 0 || c.y < 0 || c.z < 0 || c.x >= d.x || c.y >= d.y || c.z >= d.z {
            return None;
        }
        Some(((c.y * d.z + c.z) * d.x + c.x) as usize)
    }

    /// Mask of `face` at cell index `i`.
    #[inline]
    pub fn face_at(&self, i: usize, face: Face) -> u8 {
        self.masks[i * 6 + face.index()]
    }

    /// Mask of `face` at `c`; zero outside the grid.
    #[inline]
    pub fn face(&self, c: Int3, face: Face) -> u8 {
        self.index(c).map_or(0, |i| self.face_at(i, face))
    }

    #[inline]
    pub fn cell_masks(&self, i: usize) -> &[u8] {
        &self.masks[i * 6..i * 6 + 6]
    }

    /// All six masks packed as face `f` in bits `4f..4f+4`.
    #[inline]
    pub fn combined(&self, i: usize) -> u32 {
        self.cell_masks(i)
            .iter()
            .enumerate()
            .fold(0, |acc, (f, &m)| acc | (m as u32) << (4 * f))
    }

    /// Recomputes every cell in `cells` (clamped to the grid).
    pub fn refresh_box(&mut self, grid: &VoxelGrid, catalog: &TileCatalog, cells: IAabb) {
        debug_assert_eq!(grid.dims(), self.dims);
        let b = cells.clamp_to(self.dims);
        if b.is_empty() {
            return;
        }
        for y in b.min.y..b.max.y {
            for z in b.min.z..b.max.z {
                for x in b.min.x..b.max.x {
                    let c = Int3::new(x, y, z);
                    let i = grid.index(c);
                    let packed = solve_cell(grid, catalog, c);
                    for (f, m) in self.masks[i * 6..i * 6 + 6].iter_mut().enumerate() {
                        *m = ((packed >> (4 * f)) & 0xF) as u8;
                    }
                }
            }
        }
    }

    pub fn refresh_chunk(&mut self, grid: &VoxelGrid, catalog: &TileCatalog, chunk: ChunkCoord) {
        let cells = grid.layout().cell_box(chunk);
        self.refresh_box(grid, catalog, cells);
    }

    pub fn refresh_all(&mut self, grid: &VoxelGrid, catalog: &TileCatalog) {
        self.refresh_box(grid, catalog, IAabb::new(Int3::ZERO, self.dims));
    }
}

/// Visible quadrants of the cell at `c`, packed six faces into 24 bits.
/// Empty cells have none; missing neighbours leave a face fully exposed.
pub fn solve_cell(grid: &VoxelGrid, catalog: &TileCatalog, c: Int3) -> u32 {
    let Some(cell) = grid.cell(c) else {
        return 0;
    };
    let mut borders = catalog.borders(cell.shape, cell.dir);
    if borders == 0 {
        return 0;
    }
    for face in Face::ALL {
        let Some(other) = grid.cell(c + face.delta()) else {
            continue;
        };
        if other.is_empty() {
            continue;
        }
        let f = face.index();
        let theirs = catalog.borders(other.shape, other.dir);
        // Shift the neighbour's opposite face into this face's slot.
        let covered = if f % 2 == 0 { theirs >> 4 } else { theirs << 4 };
        let face_bits = 0xF << (4 * f);
        borders = (borders & !face_bits) | (borders & !covered & face_bits);
    }
    borders
}
