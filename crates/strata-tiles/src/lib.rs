//! Tile shapes, their occlusion analysis, and the style/texture catalog.
#![forbid(unsafe_code)]

pub mod analyze;
pub mod basis;
pub mod shape;
pub mod sheet;
pub mod style;

pub use analyze::{TileCatalog, TileType};
pub use basis::{CUBE_FACES, FaceBasis, slope_bases};
pub use shape::TileShape;
pub use sheet::{StyleDef, StyleSheet};
pub use style::{
    BORDER_TEX_H, BORDER_TEX_W, Rgba8, Style, StyleCatalog, StyleIndices, StyleTable, TEX_SIZE,
    TextureArray,
};
