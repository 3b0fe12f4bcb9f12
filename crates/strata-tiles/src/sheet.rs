use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::style::{BORDER_TEX_H, BORDER_TEX_W, Rgba8, StyleCatalog, TEX_SIZE};

/// Solid-colour style definitions, for tools that have no texture assets.
///
/// ```toml
/// [[style]]
/// id = 1
/// floor = [96, 140, 60]
/// wall = [120, 100, 80]
/// trim = [200, 200, 180]
/// ```
#[derive(Clone, Debug, Default, Deserialize)]
pub struct StyleSheet {
    #[serde(default, rename = "style")]
    pub styles: Vec<StyleDef>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct StyleDef {
    pub id: u32,
    pub floor: [u8; 3],
    pub wall: Option<[u8; 3]>,
    pub trim: Option<[u8; 3]>,
}

fn fill(rgb: [u8; 3], len: usize) -> Arc<[Rgba8]> {
    vec![Rgba8::opaque(rgb[0], rgb[1], rgb[2]); len].into()
}

impl StyleDef {
    pub fn floor_pixels(&self) -> Arc<[Rgba8]> {
        fill(self.floor, TEX_SIZE * TEX_SIZE)
    }

    pub fn wall_pixels(&self) -> Option<Arc<[Rgba8]>> {
        self.wall.map(|c| fill(c, TEX_SIZE * TEX_SIZE))
    }

    pub fn trim_pixels(&self) -> Option<Arc<[Rgba8]>> {
        self.trim.map(|c| fill(c, BORDER_TEX_W * BORDER_TEX_H))
    }
}

impl StyleSheet {
    pub fn from_toml_str(toml_str: &str) -> Result<Self, Box<dyn Error>> {
        let sheet: StyleSheet = toml::from_str(toml_str)?;
        Ok(sheet)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    /// Registers every style into `catalog`. Returns `true` if any style
    /// changed its wall/trim presence.
    pub fn apply(&self, catalog: &mut StyleCatalog) -> bool {
        let mut rebuild = false;
        for def in &self.styles {
            rebuild |= catalog.set_style_textures(
                def.id,
                def.floor_pixels(),
                def.wall_pixels(),
                def.trim_pixels(),
            );
        }
        rebuild
    }
}
