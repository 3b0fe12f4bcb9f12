use std::error::Error;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use strata_geom::{Int3, Vec3};

#[derive(Clone, Debug, Deserialize)]
pub struct TerrainConfig {
    #[serde(default = "default_dimensions")]
    pub dimensions: [i32; 3],
    #[serde(default = "default_cell_size")]
    pub cell_size: [f32; 3],
    #[serde(default = "default_max_light_spread")]
    pub max_light_spread: i32,
    #[serde(default = "default_min_ambient")]
    pub min_ambient: f32,
    #[serde(default = "default_mesh_workers")]
    pub mesh_workers: usize,
    #[serde(default)]
    pub demo: DemoGenConfig,
}

fn default_dimensions() -> [i32; 3] {
    [60, 30, 60]
}
fn default_cell_size() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}
fn default_max_light_spread() -> i32 {
    4
}
fn default_min_ambient() -> f32 {
    0.03
}
fn default_mesh_workers() -> usize {
    2
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            dimensions: default_dimensions(),
            cell_size: default_cell_size(),
            max_light_spread: default_max_light_spread(),
            min_ambient: default_min_ambient(),
            mesh_workers: default_mesh_workers(),
            demo: DemoGenConfig::default(),
        }
    }
}

impl TerrainConfig {
    pub fn from_toml_str(toml_str: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: TerrainConfig = toml::from_str(toml_str)?;
        Ok(cfg)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    #[inline]
    pub fn dims(&self) -> Int3 {
        Int3::new(self.dimensions[0], self.dimensions[1], self.dimensions[2])
    }

    #[inline]
    pub fn cell_size(&self) -> Vec3 {
        Vec3::new(self.cell_size[0], self.cell_size[1], self.cell_size[2])
    }

    #[inline]
    pub fn workers(&self) -> usize {
        self.mesh_workers.max(1)
    }
}

/// Heightmap parameters for the demo world.
#[derive(Clone, Debug, Deserialize)]
pub struct DemoGenConfig {
    #[serde(default = "default_seed")]
    pub seed: i32,
    #[serde(default = "default_frequency")]
    pub frequency: f32,
    /// Fraction of world height used as the mean surface level.
    #[serde(default = "default_base_height")]
    pub base_height: f32,
    /// Fraction of world height the surface swings around its mean.
    #[serde(default = "default_amplitude")]
    pub amplitude: f32,
    #[serde(default = "default_ramp_edges")]
    pub ramp_edges: bool,
    #[serde(default = "default_ground_style")]
    pub ground_style: u32,
    #[serde(default = "default_top_style")]
    pub top_style: u32,
    #[serde(default = "default_ramp_style")]
    pub ramp_style: u32,
}

fn default_seed() -> i32 {
    1337
}
fn default_frequency() -> f32 {
    0.03
}
fn default_base_height() -> f32 {
    0.4
}
fn default_amplitude() -> f32 {
    0.25
}
fn default_ramp_edges() -> bool {
    true
}
fn default_ground_style() -> u32 {
    0
}
fn default_top_style() -> u32 {
    1
}
fn default_ramp_style() -> u32 {
    1
}

impl Default for DemoGenConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            frequency: default_frequency(),
            base_height: default_base_height(),
            amplitude: default_amplitude(),
            ramp_edges: default_ramp_edges(),
            ground_style: default_ground_style(),
            top_style: default_top_style(),
            ramp_style: default_ramp_style(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg = TerrainConfig::from_toml_str(
            r#"
            dimensions = [30, 15, 45]
            [demo]
            seed = 7
        "#,
        )
        .unwrap();
        assert_eq!(cfg.dims(), Int3::new(30, 15, 45));
        assert_eq!(cfg.max_light_spread, 4);
        assert_eq!(cfg.demo.seed, 7);
        assert!(cfg.demo.ramp_edges);
    }

    #[test]
    fn zero_workers_clamps_to_one() {
        let cfg = TerrainConfig::from_toml_str("mesh_workers = 0").unwrap();
        assert_eq!(cfg.workers(), 1);
    }

    #[test]
    fn bad_types_error() {
        assert!(TerrainConfig::from_toml_str("dimensions = \"big\"").is_err());
    }
}
