use serde::{Deserialize, Serialize};
use strata_geom::{IAabb, Int3};

/// Cells per chunk along each axis.
pub const CHUNK_DIMS: Int3 = Int3::new(15, 15, 15);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub cx: i32,
    pub cy: i32,
    pub cz: i32,
}

impl ChunkCoord {
    #[inline]
    pub const fn new(cx: i32, cy: i32, cz: i32) -> Self {
        Self { cx, cy, cz }
    }

    /// Chunk holding `cell`. Negative cells land in negative chunks.
    #[inline]
    pub fn of_cell(cell: Int3) -> Self {
        Self {
            cx: cell.x.div_euclid(CHUNK_DIMS.x),
            cy: cell.y.div_euclid(CHUNK_DIMS.y),
            cz: cell.z.div_euclid(CHUNK_DIMS.z),
        }
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            cx: self.cx + dx,
            cy: self.cy + dy,
            cz: self.cz + dz,
        }
    }

    #[inline]
    pub fn with_y(self, cy: i32) -> Self {
        Self { cy, ..self }
    }

    #[inline]
    pub fn manhattan(self, other: ChunkCoord) -> i32 {
        (self.cx - other.cx).abs() + (self.cy - other.cy).abs() + (self.cz - other.cz).abs()
    }

    /// First cell of this chunk.
    #[inline]
    pub fn origin_cell(self) -> Int3 {
        Int3::new(
            self.cx * CHUNK_DIMS.x,
            self.cy * CHUNK_DIMS.y,
            self.cz * CHUNK_DIMS.z,
        )
    }
}

impl From<(i32, i32, i32)> for ChunkCoord {
    fn from(value: (i32, i32, i32)) -> Self {
        Self::new(value.0, value.1, value.2)
    }
}

impl From<ChunkCoord> for (i32, i32, i32) {
    fn from(value: ChunkCoord) -> Self {
        (value.cx, value.cy, value.cz)
    }
}

/// Chunk grid covering a world of `dims` cells. Edge chunks may be partial.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChunkLayout {
    pub dims: Int3,
    pub counts: Int3,
}

impl ChunkLayout {
    pub fn new(dims: Int3) -> Self {
        let ceil = |n: i32, d: i32| if n <= 0 { 0 } else { (n + d - 1) / d };
        Self {
            dims,
            counts: Int3::new(
                ceil(dims.x, CHUNK_DIMS.x),
                ceil(dims.y, CHUNK_DIMS.y),
                ceil(dims.z, CHUNK_DIMS.z),
            ),
        }
    }

    #[inline]
    pub fn num_chunks(&self) -> usize {
        self.counts.volume()
    }

    #[inline]
    pub fn contains(&self, c: ChunkCoord) -> bool {
        c.cx >= 0
            && c.cy >= 0
            && c.cz >= 0
            && c.cx < self.counts.x
            && c.cy < self.counts.y
            && c.cz < self.counts.z
    }

    /// Flat index for per-chunk tables, `None` outside the layout.
    #[inline]
    pub fn index(&self, c: ChunkCoord) -> Option<usize> {
        if !self.contains(c) {
            return None;
        }
        Some(((c.cy * self.counts.z + c.cz) * self.counts.x + c.cx) as usize)
    }

    /// Cells owned by `c`, clipped to the world.
    #[inline]
    pub fn cell_box(&self, c: ChunkCoord) -> IAabb {
        let min = c.origin_cell();
        IAabb::new(min, min + CHUNK_DIMS).clamp_to(self.dims)
    }

    pub fn iter(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        let n = self.counts;
        (0..n.y).flat_map(move |y| {
            (0..n.z).flat_map(move |z| (0..n.x).map(move |x| ChunkCoord::new(x, y, z)))
        })
    }

    /// Every in-layout chunk overlapping the half-open cell box.
    pub fn chunks_touching(&self, cells: IAabb) -> Vec<ChunkCoord> {
        let cells = cells.clamp_to(self.dims);
        if cells.is_empty() {
            return Vec::new();
        }
        let lo = ChunkCoord::of_cell(cells.min);
        let hi = ChunkCoord::of_cell(cells.max - Int3::ONE);
        let mut out = Vec::new();
        for y in lo.cy..=hi.cy {
            for z in lo.cz..=hi.cz {
                for x in lo.cx..=hi.cx {
                    out.push(ChunkCoord::new(x, y, z));
                }
            }
        }
        out
    }

    /// `c` and its 26 neighbours that exist in the layout.
    pub fn neighborhood(&self, c: ChunkCoord) -> impl Iterator<Item = ChunkCoord> + '_ {
        (-1..=1).flat_map(move |dy| {
            (-1..=1).flat_map(move |dz| {
                (-1..=1).filter_map(move |dx| {
                    let n = c.offset(dx, dy, dz);
                    self.contains(n).then_some(n)
                })
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_round_up() {
        let l = ChunkLayout::new(Int3::new(15, 16, 31));
        assert_eq!(l.counts, Int3::new(1, 2, 3));
        assert_eq!(l.num_chunks(), 6);
        assert_eq!(l.cell_box(ChunkCoord::new(0, 1, 2)).size(), Int3::new(15, 1, 1));
    }

    #[test]
    fn neighborhood_clips_at_edges() {
        let l = ChunkLayout::new(Int3::new(45, 45, 45));
        assert_eq!(l.neighborhood(ChunkCoord::new(0, 0, 0)).count(), 8);
        assert_eq!(l.neighborhood(ChunkCoord::new(1, 1, 1)).count(), 27);
        assert_eq!(l.neighborhood(ChunkCoord::new(2, 1, 0)).count(), 12);
    }

    #[test]
    fn touching_spans_chunk_boundaries() {
        let l = ChunkLayout::new(Int3::new(30, 30, 30));
        let b = IAabb::new(Int3::new(14, 0, 0), Int3::new(16, 1, 1));
        let got = l.chunks_touching(b);
        assert_eq!(got, vec![ChunkCoord::new(0, 0, 0), ChunkCoord::new(1, 0, 0)]);
        assert!(l.chunks_touching(IAabb::inverted(l.dims)).is_empty());
    }

    #[test]
    fn of_cell_floors_negatives() {
        assert_eq!(ChunkCoord::of_cell(Int3::new(-1, 14, 15)), ChunkCoord::new(-1, 0, 1));
    }
}
