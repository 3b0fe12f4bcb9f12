use fastnoise_lite::{FastNoiseLite, NoiseType};
use strata_geom::Int3;
use strata_tiles::TileShape;

use crate::config::DemoGenConfig;
use crate::grid::{Cell, VoxelGrid};

/// Anything that accepts generated cells.
pub trait CellSink {
    fn dims(&self) -> Int3;
    fn put(&mut self, at: Int3, cell: Cell);
}

impl CellSink for VoxelGrid {
    fn dims(&self) -> Int3 {
        VoxelGrid::dims(self)
    }

    fn put(&mut self, at: Int3, cell: Cell) {
        self.set(at, cell);
    }
}

/// Ramp direction whose high side faces each horizontal neighbour:
/// +x, -z, -x, +z.
const RAMP_NEIGHBORS: [(i32, i32, u8); 4] = [(1, 0, 0), (0, -1, 1), (-1, 0, 2), (0, 1, 3)];

fn heightmap(cfg: &DemoGenConfig, dims: Int3) -> Vec<i32> {
    let mut noise = FastNoiseLite::with_seed(cfg.seed);
    noise.set_noise_type(Some(NoiseType::OpenSimplex2));
    noise.set_frequency(Some(cfg.frequency));
    let hf = dims.y as f32;
    let mut out = Vec::with_capacity((dims.x * dims.z).max(0) as usize);
    for z in 0..dims.z {
        for x in 0..dims.x {
            let n = noise.get_noise_2d(x as f32, z as f32);
            let h = (hf * (cfg.base_height + n * cfg.amplitude)) as i32;
            out.push(h.clamp(1, (dims.y - 1).max(1)));
        }
    }
    out
}

/// Fills `sink` with a rolling heightmap: solid ground, a styled top layer,
/// and optional ramps stepping up to taller neighbours.
pub fn generate_demo(sink: &mut impl CellSink, cfg: &DemoGenConfig) {
    let dims = sink.dims();
    if dims.volume() == 0 {
        return;
    }
    let heights = heightmap(cfg, dims);
    let h_at = |x: i32, z: i32| -> Option<i32> {
        (x >= 0 && z >= 0 && x < dims.x && z < dims.z).then(|| heights[(z * dims.x + x) as usize])
    };
    let mut ramps = 0usize;
    for z in 0..dims.z {
        for x in 0..dims.x {
            let h = heights[(z * dims.x + x) as usize];
            for y in 0..h {
                let style = if y == h - 1 { cfg.top_style } else { cfg.ground_style };
                sink.put(Int3::new(x, y, z), Cell::new(TileShape::Block, style, 0));
            }
            if !cfg.ramp_edges || h >= dims.y {
                continue;
            }
            let up = RAMP_NEIGHBORS
                .iter()
                .find(|(dx, dz, _)| h_at(x + dx, z + dz).is_some_and(|nh| nh > h));
            if let Some(&(_, _, dir)) = up {
                sink.put(Int3::new(x, h, z), Cell::new(TileShape::Ramp, cfg.ramp_style, dir));
                ramps += 1;
            }
        }
    }
    log::info!(
        "demo terrain {}x{}x{} seed={} ramps={}",
        dims.x,
        dims.y,
        dims.z,
        cfg.seed,
        ramps
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_is_deterministic_and_grounded() {
        let cfg = DemoGenConfig::default();
        let mut a = VoxelGrid::new(Int3::new(20, 16, 20));
        let mut b = VoxelGrid::new(Int3::new(20, 16, 20));
        generate_demo(&mut a, &cfg);
        generate_demo(&mut b, &cfg);
        assert_eq!(a.shapes(), b.shapes());
        assert_eq!(a.dirs(), b.dirs());
        for z in 0..20 {
            for x in 0..20 {
                assert_eq!(a.shape(Int3::new(x, 0, z)), TileShape::Block);
            }
        }
        assert!(a.shapes().iter().any(|s| s.is_empty()));
    }

    #[test]
    fn ramps_sit_on_solid_ground() {
        let cfg = DemoGenConfig {
            amplitude: 0.45,
            frequency: 0.2,
            ..DemoGenConfig::default()
        };
        let mut g = VoxelGrid::new(Int3::new(24, 20, 24));
        generate_demo(&mut g, &cfg);
        for i in 0..g.len() {
            if g.shapes()[i] == TileShape::Ramp {
                let c = g.coord_of(i);
                assert_eq!(g.shape(c - Int3::new(0, 1, 0)), TileShape::Block);
            }
        }
    }
}
