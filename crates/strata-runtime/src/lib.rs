//! Terrain runtime: the rebuild scheduler, job pool, sky thread and the
//! `Terrain` facade that ties them together.
#![forbid(unsafe_code)]

mod error;
mod jobs;
mod sky_worker;
mod terrain;

pub use error::{CodecError, TerrainError};
pub use terrain::{SerializeCallback, Terrain, TerrainStats, TickStatus};
