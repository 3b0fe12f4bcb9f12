//! CPU meshing crate: occlusion masks, chunk triangulation, seam trim and
//! vertex shading (engine-only).
#![forbid(unsafe_code)]

mod bitmask;
mod chunk;
mod constants;
mod emit;
mod face;
mod mesh_build;
mod seams;
mod shade;

pub use bitmask::{BitmaskArena, solve_cell};
pub use chunk::{ChunkMeshCPU, MeshInputs, build_chunk_mesh};
pub use face::Face;
pub use mesh_build::{CollisionMesh, MeshBuild};
pub use shade::{light_byte, recolor, slice_byte};
