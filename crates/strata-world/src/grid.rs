use strata_geom::{IAabb, Int3};
use strata_tiles::TileShape;

use crate::chunk::{ChunkCoord, ChunkLayout};

/// One tile descriptor. Light is stored separately in the grid.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct Cell {
    pub shape: TileShape,
    pub style: u32,
    pub dir: u8,
}

impl Cell {
    pub const EMPTY: Cell = Cell {
        shape: TileShape::Empty,
        style: 0,
        dir: 0,
    };

    #[inline]
    pub const fn new(shape: TileShape, style: u32, dir: u8) -> Self {
        Self { shape, style, dir }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shape.is_empty()
    }

    /// Empty cells carry no style or direction.
    #[inline]
    pub fn normalized(self) -> Self {
        if self.is_empty() { Cell::EMPTY } else { self }
    }
}

/// Dense structure-of-arrays tile storage. Cells are laid out Y-slice
/// major: `index = y * (dx * dz) + z * dx + x`.
#[derive(Clone, Debug, Default)]
pub struct VoxelGrid {
    dims: Int3,
    layout: ChunkLayout,
    tiles_per_slice: usize,
    shapes: Vec<TileShape>,
    styles: Vec<u32>,
    dirs: Vec<u8>,
    light: Vec<f32>,
}

impl VoxelGrid {
    /// All cells start empty and fully lit.
    pub fn new(dims: Int3) -> Self {
        let n = dims.volume();
        Self {
            dims,
            layout: ChunkLayout::new(dims),
            tiles_per_slice: (dims.x.max(0) * dims.z.max(0)) as usize,
            shapes: vec![TileShape::Empty; n],
            styles: vec![0; n],
            dirs: vec![0; n],
            light: vec![1.0; n],
        }
    }

    #[inline]
    pub fn dims(&self) -> Int3 {
        self.dims
    }

    #[inline]
    pub fn layout(&self) -> &ChunkLayout {
        &self.layout
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    #[inline]
    pub fn tiles_per_slice(&self) -> usize {
        self.tiles_per_slice
    }

    #[inline]
    pub fn in_bounds(&self, c: Int3) -> bool {
        c.x >= 0 && c.y >= 0 && c.z >= 0 && c.x < self.dims.x && c.y < self.dims.y && c.z < self.dims.z
    }

    /// Flat index; caller guarantees `c` is in bounds.
    #[inline]
    pub fn index(&self, c: Int3) -> usize {
        c.y as usize * self.tiles_per_slice + c.z as usize * self.dims.x as usize + c.x as usize
    }

    #[inline]
    pub fn index_checked(&self, c: Int3) -> Option<usize> {
        self.in_bounds(c).then(|| self.index(c))
    }

    #[inline]
    pub fn coord_of(&self, index: usize) -> Int3 {
        let dx = self.dims.x as usize;
        let y = index / self.tiles_per_slice;
        let rem = index % self.tiles_per_slice;
        Int3::new((rem % dx) as i32, y as i32, (rem / dx) as i32)
    }

    #[inline]
    pub fn cell(&self, c: Int3) -> Option<Cell> {
        self.index_checked(c).map(|i| self.cell_at(i))
    }

    #[inline]
    pub fn cell_at(&self, i: usize) -> Cell {
        Cell::new(self.shapes[i], self.styles[i], self.dirs[i])
    }

    /// Out-of-bounds cells read as empty.
    #[inline]
    pub fn shape(&self, c: Int3) -> TileShape {
        self.index_checked(c).map_or(TileShape::Empty, |i| self.shapes[i])
    }

    #[inline]
    pub fn shapes(&self) -> &[TileShape] {
        &self.shapes
    }

    #[inline]
    pub fn styles(&self) -> &[u32] {
        &self.styles
    }

    #[inline]
    pub fn dirs(&self) -> &[u8] {
        &self.dirs
    }

    /// Writes a cell. Returns `false` when `c` is out of bounds or the cell
    /// already holds `cell`.
    pub fn set(&mut self, c: Int3, cell: Cell) -> bool {
        let Some(i) = self.index_checked(c) else {
            return false;
        };
        let cell = cell.normalized();
        if self.cell_at(i) == cell {
            return false;
        }
        self.put_at(i, cell);
        true
    }

    #[inline]
    pub fn put_at(&mut self, i: usize, cell: Cell) {
        let cell = cell.normalized();
        self.shapes[i] = cell.shape;
        self.styles[i] = cell.style;
        self.dirs[i] = cell.dir;
    }

    /// Fills whole Y slices `[first_y, first_y + count)`, clipped to the grid.
    pub fn fill_slices(&mut self, first_y: i32, count: i32, cell: Cell) {
        let lo = first_y.clamp(0, self.dims.y) as usize * self.tiles_per_slice;
        let hi = (first_y.saturating_add(count)).clamp(0, self.dims.y) as usize * self.tiles_per_slice;
        if lo >= hi {
            return;
        }
        let cell = cell.normalized();
        self.shapes[lo..hi].fill(cell.shape);
        self.styles[lo..hi].fill(cell.style);
        self.dirs[lo..hi].fill(cell.dir);
    }

    /// Rewrites style `find` to `replace` on every non-empty cell. Returns
    /// how many cells changed.
    pub fn replace_style(&mut self, find: u32, replace: u32) -> usize {
        let mut n = 0;
        for (s, shape) in self.styles.iter_mut().zip(&self.shapes) {
            if *s == find && !shape.is_empty() && find != replace {
                *s = replace;
                n += 1;
            }
        }
        n
    }

    #[inline]
    pub fn light(&self, c: Int3) -> Option<f32> {
        self.index_checked(c).map(|i| self.light[i])
    }

    #[inline]
    pub fn light_field(&self) -> &[f32] {
        &self.light
    }

    #[inline]
    pub fn light_field_mut(&mut self) -> &mut [f32] {
        &mut self.light
    }

    /// Copies light for the cells in `region` from a same-sized field.
    pub fn copy_light_from(&mut self, src: &[f32], region: IAabb) {
        let r = region.clamp_to(self.dims);
        if r.is_empty() || src.len() != self.light.len() {
            return;
        }
        for y in r.min.y..r.max.y {
            for z in r.min.z..r.max.z {
                let a = self.index(Int3::new(r.min.x, y, z));
                let b = a + (r.max.x - r.min.x) as usize;
                self.light[a..b].copy_from_slice(&src[a..b]);
            }
        }
    }

    /// True when every cell of chunk `c` is empty.
    pub fn chunk_is_empty(&self, c: ChunkCoord) -> bool {
        let b = self.layout.cell_box(c);
        for y in b.min.y..b.max.y {
            for z in b.min.z..b.max.z {
                let a = self.index(Int3::new(b.min.x, y, z));
                let e = a + (b.max.x - b.min.x) as usize;
                if self.shapes[a..e].iter().any(|s| !s.is_empty()) {
                    return false;
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_is_slice_major() {
        let g = VoxelGrid::new(Int3::new(4, 3, 5));
        assert_eq!(g.index(Int3::new(1, 0, 0)), 1);
        assert_eq!(g.index(Int3::new(0, 0, 1)), 4);
        assert_eq!(g.index(Int3::new(0, 1, 0)), 20);
        for i in [0usize, 7, 19, 33, 59] {
            assert_eq!(g.index(g.coord_of(i)), i);
        }
    }

    #[test]
    fn set_reports_changes_only() {
        let mut g = VoxelGrid::new(Int3::new(4, 4, 4));
        let c = Cell::new(TileShape::Ramp, 3, 2);
        assert!(g.set(Int3::new(1, 2, 3), c));
        assert!(!g.set(Int3::new(1, 2, 3), c));
        assert!(!g.set(Int3::new(4, 0, 0), c));
        assert_eq!(g.cell(Int3::new(1, 2, 3)), Some(c));
        assert_eq!(g.cell(Int3::new(-1, 0, 0)), None);
        assert_eq!(g.shape(Int3::new(9, 9, 9)), TileShape::Empty);
    }

    #[test]
    fn slices_fill_whole_planes() {
        let mut g = VoxelGrid::new(Int3::new(3, 5, 3));
        g.fill_slices(1, 2, Cell::new(TileShape::Block, 1, 0));
        assert!(g.cell(Int3::new(0, 0, 0)).unwrap().is_empty());
        assert_eq!(g.shape(Int3::new(2, 1, 2)), TileShape::Block);
        assert_eq!(g.shape(Int3::new(0, 2, 1)), TileShape::Block);
        assert!(g.cell(Int3::new(0, 3, 0)).unwrap().is_empty());
        g.fill_slices(4, 10, Cell::new(TileShape::Half, 2, 1));
        assert_eq!(g.shape(Int3::new(1, 4, 1)), TileShape::Half);
    }

    #[test]
    fn empty_writes_drop_style_and_dir() {
        let mut g = VoxelGrid::new(Int3::new(3, 3, 3));
        let at = Int3::new(1, 1, 1);
        // Already empty, so nothing changes.
        assert!(!g.set(at, Cell::new(TileShape::Empty, 4, 2)));
        assert_eq!(g.cell(at), Some(Cell::EMPTY));

        g.set(at, Cell::new(TileShape::Block, 4, 2));
        assert!(g.set(at, Cell::new(TileShape::Empty, 4, 2)));
        assert_eq!(g.cell(at), Some(Cell::EMPTY));

        g.put_at(0, Cell::new(TileShape::Empty, 7, 3));
        assert_eq!(g.cell_at(0), Cell::EMPTY);
        g.fill_slices(2, 1, Cell::new(TileShape::Empty, 9, 1));
        assert_eq!(g.cell(Int3::new(0, 2, 0)), Some(Cell::EMPTY));
    }

    #[test]
    fn replace_style_skips_empty_cells() {
        let mut g = VoxelGrid::new(Int3::new(2, 2, 2));
        g.set(Int3::ZERO, Cell::new(TileShape::Block, 0, 0));
        assert_eq!(g.replace_style(0, 3), 1);
        assert_eq!(g.cell(Int3::new(1, 1, 1)), Some(Cell::EMPTY));
    }

    #[test]
    fn chunk_emptiness() {
        let mut g = VoxelGrid::new(Int3::new(20, 15, 15));
        assert!(g.chunk_is_empty(ChunkCoord::new(1, 0, 0)));
        g.set(Int3::new(19, 14, 14), Cell::new(TileShape::Block, 0, 0));
        assert!(!g.chunk_is_empty(ChunkCoord::new(1, 0, 0)));
        assert!(g.chunk_is_empty(ChunkCoord::new(0, 0, 0)));
    }

    #[test]
    fn light_starts_full_and_copies_by_region() {
        let mut g = VoxelGrid::new(Int3::new(3, 3, 3));
        assert_eq!(g.light(Int3::new(2, 2, 2)), Some(1.0));
        let src = vec![0.25; g.len()];
        g.copy_light_from(&src, IAabb::new(Int3::new(1, 1, 1), Int3::new(3, 2, 3)));
        assert_eq!(g.light(Int3::new(0, 1, 1)), Some(1.0));
        assert_eq!(g.light(Int3::new(2, 1, 2)), Some(0.25));
        assert_eq!(g.light(Int3::new(2, 2, 2)), Some(1.0));
    }

    #[test]
    fn replace_style_counts() {
        let mut g = VoxelGrid::new(Int3::new(2, 2, 2));
        g.fill_slices(0, 1, Cell::new(TileShape::Block, 5, 0));
        assert_eq!(g.replace_style(5, 6), 4);
        assert_eq!(g.cell(Int3::new(1, 0, 1)).unwrap().style, 6);
    }
}
