use strata_geom::{IAabb, Int3};

/// A copy of one box of a dense `(y * dz + z) * dx + x` field. Used to move
/// changed shapes to the sky thread and finished light values back.
#[derive(Clone, Debug, Default)]
pub struct RegionPatch<T> {
    pub region: IAabb,
    pub values: Vec<T>,
}

impl<T: Copy> RegionPatch<T> {
    /// Copies `region` (clipped to `dims`) out of `src`.
    pub fn capture(src: &[T], dims: Int3, region: IAabb) -> Self {
        let region = region.clamp_to(dims);
        if region.is_empty() {
            return Self { region, values: Vec::new() };
        }
        let mut values = Vec::with_capacity(region.size().volume());
        for y in region.min.y..region.max.y {
            for z in region.min.z..region.max.z {
                let a = ((y * dims.z + z) * dims.x + region.min.x) as usize;
                let b = a + (region.max.x - region.min.x) as usize;
                values.extend_from_slice(&src[a..b]);
            }
        }
        Self { region, values }
    }

    /// Writes the patch back into a field of the same `dims`.
    pub fn apply(&self, dst: &mut [T], dims: Int3) {
        if self.region.is_empty() {
            return;
        }
        let w = (self.region.max.x - self.region.min.x) as usize;
        let mut src = self.values.chunks_exact(w);
        for y in self.region.min.y..self.region.max.y {
            for z in self.region.min.z..self.region.max.z {
                let Some(row) = src.next() else { return };
                let a = ((y * dims.z + z) * dims.x + self.region.min.x) as usize;
                dst[a..a + w].copy_from_slice(row);
            }
        }
    }
}
