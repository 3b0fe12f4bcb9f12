use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use strata_geom::{IAabb, Int3};
use strata_tiles::TileShape;

use crate::patch::RegionPatch;

/// BFS pops between cancellation checks.
const CANCEL_POLL: usize = 1024;

/// `lookup[d]` is the brightness at sky distance `d`, for `d` in
/// `0..=max_spread + 1`. The last entry is always 0.
pub fn light_lookup(max_spread: i32) -> Vec<f32> {
    let denom = (max_spread + 1) as f32;
    (0..max_spread + 2)
        .map(|i| (1.0 - i as f32 / denom).max(0.0).powf(1.5))
        .collect()
}

/// Private state of the sky-light worker: a mirror of the tile shapes plus
/// the persistent distance and brightness fields. Distance 0 means directly
/// lit, -1 means out of reach.
#[derive(Clone, Debug)]
pub struct SkyField {
    dims: Int3,
    shapes: Vec<TileShape>,
    dist: Vec<i32>,
    color: Vec<f32>,
}

impl SkyField {
    pub fn new(dims: Int3) -> Self {
        let n = dims.volume();
        Self {
            dims,
            shapes: vec![TileShape::Empty; n],
            dist: vec![0; n],
            color: vec![1.0; n],
        }
    }

    #[inline]
    pub fn dims(&self) -> Int3 {
        self.dims
    }

    #[inline]
    fn idx(&self, c: Int3) -> usize {
        ((c.y * self.dims.z + c.z) * self.dims.x + c.x) as usize
    }

    #[inline]
    pub fn distance(&self, c: Int3) -> i32 {
        self.dist[self.idx(c)]
    }

    #[inline]
    pub fn brightness(&self, c: Int3) -> f32 {
        self.color[self.idx(c)]
    }

    #[inline]
    pub fn colors(&self) -> &[f32] {
        &self.color
    }

    /// Copies changed shapes into the mirror.
    pub fn apply_shapes(&mut self, patch: &RegionPatch<TileShape>) {
        patch.apply(&mut self.shapes, self.dims);
    }

    /// Overwrites the full shape mirror.
    pub fn load_shapes(&mut self, shapes: &[TileShape]) {
        if shapes.len() == self.shapes.len() {
            self.shapes.copy_from_slice(shapes);
        }
    }

    pub fn capture_colors(&self, region: IAabb) -> RegionPatch<f32> {
        RegionPatch::capture(&self.color, self.dims, region)
    }

    /// Recomputes sky light around the changed box `dirty` and returns the
    /// box whose brightness was rewritten. `None` if `cancel` was raised
    /// mid-run, in which case the distance field is left untouched.
    pub fn propagate(&mut self, dirty: IAabb, max_spread: i32, cancel: &AtomicBool) -> Option<IAabb> {
        let dims = self.dims;
        let dirty = dirty.clamp_to(dims);
        if dirty.is_empty() {
            return Some(IAabb::new(Int3::ZERO, Int3::ZERO));
        }
        let slice = (dims.x * dims.z) as usize;

        // Start one tile above the box so ramps and corners can shadow into it.
        let mut min = dirty.min;
        let mut max = dirty.max;
        max.y = (max.y + 1).min(dims.y);

        // Stretch downward to cover every tile whose direct exposure flips.
        for z in min.z..max.z {
            for x in min.x..max.x {
                let mut index = self.idx(Int3::new(x, max.y - 1, z));
                let mut sky_visible = self.dist[index] == 0 || max.y == dims.y;
                for y in (0..max.y).rev() {
                    let shape = self.shapes[index];
                    // A new roof darkens whatever was lit below it.
                    if shape.blocks_sky() {
                        sky_visible = false;
                    }
                    let lit = self.dist[index] == 0;
                    if !lit && !sky_visible {
                        break;
                    }
                    if lit != sky_visible {
                        min.y = min.y.min(y);
                    }
                    if shape.shadows_below() {
                        sky_visible = false;
                    }
                    index = index.wrapping_sub(slice);
                }
            }
        }

        let write = IAabb::new(min, max).grow(max_spread).clamp_to(dims);
        let read = IAabb::new(min, max).grow(max_spread * 2).clamp_to(dims);
        let rs = read.size();
        let read_slice = (rs.x * rs.z) as usize;
        let tidx = |c: Int3| -> usize {
            let l = c - read.min;
            ((l.y * rs.z + l.z) * rs.x + l.x) as usize
        };
        let mut temp = vec![-1i32; rs.volume()];
        let mut queue: VecDeque<Int3> = VecDeque::new();

        // Seed directly lit tiles column by column.
        for z in read.min.z..read.max.z {
            for x in read.min.x..read.max.x {
                let top = self.idx(Int3::new(x, read.max.y - 1, z));
                let mut sky_visible = self.dist[top] == 0 || read.max.y == dims.y;
                for y in (read.min.y..read.max.y).rev() {
                    let c = Int3::new(x, y, z);
                    let shape = self.shapes[self.idx(c)];
                    if shape.blocks_sky() {
                        sky_visible = false;
                    }
                    if sky_visible {
                        queue.push_back(c);
                        temp[tidx(c)] = 0;
                    }
                    if shape.shadows_below() {
                        sky_visible = false;
                    }
                }
            }
        }

        let mut pops = 0usize;
        while let Some(c) = queue.pop_front() {
            pops += 1;
            if pops % CANCEL_POLL == 0 && cancel.load(Ordering::Relaxed) {
                log::debug!(target: "perf", "sky propagation cancelled after {} pops", pops);
                return None;
            }
            let ti = tidx(c);
            let next = temp[ti] + 1;
            let gi = self.idx(c);
            let shapes = &self.shapes;
            let mut try_push = |inside: bool, gn: usize, tn: usize, nc: Int3| {
                if !inside || shapes[gn].blocks_sky() || temp[tn] != -1 {
                    return;
                }
                temp[tn] = next;
                if next <= max_spread {
                    queue.push_back(nc);
                }
            };
            let dx = dims.x as usize;
            let rx = rs.x as usize;
            try_push(c.x + 1 < read.max.x, gi + 1, ti + 1, Int3::new(c.x + 1, c.y, c.z));
            try_push(c.x > read.min.x, gi.wrapping_sub(1), ti.wrapping_sub(1), Int3::new(c.x - 1, c.y, c.z));
            try_push(c.y + 1 < read.max.y, gi + slice, ti + read_slice, Int3::new(c.x, c.y + 1, c.z));
            try_push(c.y > read.min.y, gi.wrapping_sub(slice), ti.wrapping_sub(read_slice), Int3::new(c.x, c.y - 1, c.z));
            try_push(c.z + 1 < read.max.z, gi + dx, ti + rx, Int3::new(c.x, c.y, c.z + 1));
            try_push(c.z > read.min.z, gi.wrapping_sub(dx), ti.wrapping_sub(rx), Int3::new(c.x, c.y, c.z - 1));
        }

        let lookup = light_lookup(max_spread);
        let top = (max_spread + 1) as usize;
        for y in write.min.y..write.max.y {
            for z in write.min.z..write.max.z {
                for x in write.min.x..write.max.x {
                    let c = Int3::new(x, y, z);
                    let gi = self.idx(c);
                    let d = temp[tidx(c)];
                    self.dist[gi] = d;
                    self.color[gi] = if d < 0 { 0.0 } else { lookup[(d as usize).min(top)] };
                }
            }
        }
        log::debug!(
            target: "perf",
            "sky write bounds {:?}..{:?} read {:?}..{:?} pops={}",
            write.min,
            write.max,
            read.min,
            read.max,
            pops
        );
        Some(write)
    }
}
