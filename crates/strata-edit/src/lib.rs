//! Dirty-chunk bookkeeping for incremental terrain rebuilds.
#![forbid(unsafe_code)]

use hashbrown::{HashMap, HashSet};
use strata_geom::{IAabb, Int3};
use strata_world::{ChunkCoord, ChunkLayout};

#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct DirtyStats {
    pub geometry: usize,
    pub bitmask: usize,
    pub light: usize,
    pub importance: f32,
    pub sky_pending: bool,
}

/// Tracks which chunks need a new mesh, fresh occlusion masks or relit
/// vertex colours, plus the cell box whose sky light is stale.
pub struct DirtyTracker {
    layout: ChunkLayout,
    // chunk -> importance; higher builds first
    geometry: HashMap<ChunkCoord, f32>,
    bitmask: HashSet<ChunkCoord>,
    light: HashSet<ChunkCoord>,
    sky: IAabb,
}

impl DirtyTracker {
    pub fn new(layout: ChunkLayout) -> Self {
        Self {
            layout,
            geometry: HashMap::new(),
            bitmask: HashSet::new(),
            light: HashSet::new(),
            sky: IAabb::inverted(layout.dims),
        }
    }

    /// Forgets everything and adopts a new layout.
    pub fn reset(&mut self, layout: ChunkLayout) {
        *self = Self::new(layout);
    }

    #[inline]
    pub fn layout(&self) -> &ChunkLayout {
        &self.layout
    }

    pub fn stats(&self) -> DirtyStats {
        DirtyStats {
            geometry: self.geometry.len(),
            bitmask: self.bitmask.len(),
            light: self.light.len(),
            importance: self.total_importance(),
            sky_pending: !self.sky.is_empty(),
        }
    }

    /// Nothing left to mesh, mask, relight or flood.
    pub fn is_idle(&self) -> bool {
        self.geometry.is_empty()
            && self.bitmask.is_empty()
            && self.light.is_empty()
            && self.sky.is_empty()
    }

    /// Marks `c` dirty in all three sets. Chunks outside the layout are
    /// ignored.
    pub fn mark_chunk(&mut self, c: ChunkCoord) -> bool {
        if !self.layout.contains(c) {
            return false;
        }
        self.geometry.entry(c).or_insert(0.0);
        self.bitmask.insert(c);
        self.light.insert(c);
        true
    }

    /// Chunks whose meshes can see a change at `cell`: its own chunk plus
    /// any neighbour it borders.
    pub fn affected_chunks(&self, cell: Int3) -> Vec<ChunkCoord> {
        self.layout
            .chunks_touching(IAabb::new(cell - Int3::ONE, cell + Int3::splat(2)))
    }

    /// Records a single-cell edit: affected chunks go dirty everywhere and the
    /// cell joins the stale sky box.
    pub fn mark_cell(&mut self, cell: Int3) -> usize {
        let chunks = self.affected_chunks(cell);
        for &c in &chunks {
            self.mark_chunk(c);
        }
        self.sky.include_cell(cell);
        chunks.len()
    }

    /// Geometry and masks for every chunk overlapping `cells`.
    pub fn mark_box(&mut self, cells: IAabb) -> usize {
        let chunks = self.layout.chunks_touching(cells);
        for &c in &chunks {
            self.geometry.entry(c).or_insert(0.0);
            self.bitmask.insert(c);
        }
        chunks.len()
    }

    pub fn mark_geometry(&mut self, c: ChunkCoord) {
        if self.layout.contains(c) {
            self.geometry.entry(c).or_insert(0.0);
        }
    }

    pub fn mark_all_geometry(&mut self) {
        for c in self.layout.iter() {
            self.geometry.entry(c).or_insert(0.0);
        }
    }

    pub fn mark_all_bitmasks(&mut self) {
        self.bitmask.extend(self.layout.iter());
    }

    /// Every chunk touching `cells` needs its vertex colours refreshed.
    pub fn mark_light_box(&mut self, cells: IAabb) -> usize {
        let chunks = self.layout.chunks_touching(cells);
        self.light.extend(chunks.iter().copied());
        chunks.len()
    }

    // ---- sky ----

    pub fn mark_sky_box(&mut self, cells: IAabb) {
        self.sky = self.sky.union(cells.clamp_to(self.layout.dims));
    }

    pub fn mark_sky_all(&mut self) {
        self.sky = IAabb::new(Int3::ZERO, self.layout.dims);
    }

    #[inline]
    pub fn sky_box(&self) -> IAabb {
        self.sky
    }

    /// Hands out the pending sky box and clears it.
    pub fn take_sky(&mut self) -> Option<IAabb> {
        let b = std::mem::replace(&mut self.sky, IAabb::inverted(self.layout.dims));
        (!b.is_empty()).then_some(b)
    }

    // ---- geometry ----

    #[inline]
    pub fn num_geometry(&self) -> usize {
        self.geometry.len()
    }

    #[inline]
    pub fn is_geometry_dirty(&self, c: ChunkCoord) -> bool {
        self.geometry.contains_key(&c)
    }

    pub fn importance(&self, c: ChunkCoord) -> Option<f32> {
        self.geometry.get(&c).copied()
    }

    pub fn total_importance(&self) -> f32 {
        self.geometry.values().sum()
    }

    /// Raises or lowers the build priority of a dirty chunk. Clean chunks are
    /// already built, so the mark is dropped.
    pub fn set_importance(&mut self, c: ChunkCoord, importance: f32) -> bool {
        match self.geometry.get_mut(&c) {
            Some(v) => {
                *v = importance;
                true
            }
            None => {
                log::warn!(
                    "ignoring chunk importance mark for ({}, {}, {})",
                    c.cx,
                    c.cy,
                    c.cz
                );
                false
            }
        }
    }

    pub fn remove_geometry(&mut self, c: ChunkCoord) -> bool {
        self.geometry.remove(&c).is_some()
    }

    /// Takes the next chunk to mesh: greatest importance, then nearest to
    /// `view`, then lowest coordinate. Empty chunks that would have won are
    /// dropped on the way and reported through `dropped`.
    pub fn pick_geometry(
        &mut self,
        view: ChunkCoord,
        mut is_empty: impl FnMut(ChunkCoord) -> bool,
        dropped: &mut Vec<ChunkCoord>,
    ) -> Option<ChunkCoord> {
        let mut best: Option<(ChunkCoord, f32, i32)> = None;
        for (&c, &importance) in self.geometry.iter() {
            let dist = c.manhattan(view);
            let better = match best {
                None => true,
                Some((bc, bi, bd)) => {
                    importance > bi
                        || (importance == bi && (dist < bd || (dist == bd && c < bc)))
                }
            };
            if !better {
                continue;
            }
            if is_empty(c) {
                dropped.push(c);
            } else {
                best = Some((c, importance, dist));
            }
        }
        for c in dropped.iter() {
            self.geometry.remove(c);
        }
        let (c, _, _) = best?;
        self.geometry.remove(&c);
        Some(c)
    }

    // ---- bitmasks ----

    #[inline]
    pub fn num_bitmask(&self) -> usize {
        self.bitmask.len()
    }

    #[inline]
    pub fn is_bitmask_dirty(&self, c: ChunkCoord) -> bool {
        self.bitmask.contains(&c)
    }

    /// Clears the mask flag of `c`, returning whether it was set.
    pub fn take_bitmask(&mut self, c: ChunkCoord) -> bool {
        self.bitmask.remove(&c)
    }

    pub fn drain_bitmasks(&mut self) -> Vec<ChunkCoord> {
        let mut out: Vec<ChunkCoord> = self.bitmask.drain().collect();
        out.sort();
        out
    }

    // ---- light ----

    #[inline]
    pub fn num_light(&self) -> usize {
        self.light.len()
    }

    #[inline]
    pub fn is_light_dirty(&self, c: ChunkCoord) -> bool {
        self.light.contains(&c)
    }

    /// Takes the nearest light-dirty chunk that has a live mesh and is not
    /// waiting on a rebuild. Chunks without a live mesh are dropped; their
    /// next build shades them fresh.
    pub fn pick_light(
        &mut self,
        view: ChunkCoord,
        mut has_mesh: impl FnMut(ChunkCoord) -> bool,
    ) -> Option<ChunkCoord> {
        let mut best: Option<(i32, ChunkCoord)> = None;
        let mut stale = Vec::new();
        for &c in self.light.iter() {
            if self.geometry.contains_key(&c) {
                continue;
            }
            if !has_mesh(c) {
                stale.push(c);
                continue;
            }
            let key = (c.manhattan(view), c);
            if best.is_none_or(|b| key < b) {
                best = Some(key);
            }
        }
        for c in stale {
            self.light.remove(&c);
        }
        let (_, c) = best?;
        self.light.remove(&c);
        Some(c)
    }
}
