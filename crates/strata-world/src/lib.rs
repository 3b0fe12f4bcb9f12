//! Dense tile storage, chunk layout, terrain configuration and demo worlds.
#![forbid(unsafe_code)]

pub mod chunk;
pub mod config;
pub mod demo;
pub mod grid;

pub use chunk::{CHUNK_DIMS, ChunkCoord, ChunkLayout};
pub use config::{DemoGenConfig, TerrainConfig};
pub use demo::{CellSink, generate_demo};
pub use grid::{Cell, VoxelGrid};
