//! Sky exposure flood fill and light-field sampling.
#![forbid(unsafe_code)]

mod patch;
mod sky;
mod smooth;

pub use patch::RegionPatch;
pub use sky::{SkyField, light_lookup};
pub use smooth::smooth_light;

#[cfg(test)]
mod tests;
