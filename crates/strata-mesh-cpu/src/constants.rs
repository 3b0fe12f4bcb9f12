//! Shared constants for strata-mesh-cpu. Seam lookup tables are indexed by
//! wall side: 0 = -x, 1 = +x, 2 = -z, 3 = +z.

/// Cube face checked for each wall side.
pub(crate) const WALL_SIDES: [usize; 4] = [0, 1, 4, 5];

/// Offset from a cell to the cell across each wall side, one level up.
pub(crate) const CEIL_OFFSET: [[i32; 3]; 4] = [[-1, 1, 0], [1, 1, 0], [0, 1, -1], [0, 1, 1]];

/// Bottom-face quadrant of the tile across each wall side that faces back at it.
pub(crate) const CEIL_TRIS: [u32; 4] = [0, 2, 3, 1];

/// Ramp slope on the far side of each wall, and the ramp climbing toward it.
pub(crate) const RAMP_SIDE: [usize; 4] = [6, 4, 5, 7];
pub(crate) const RAMP2_SIDE: [usize; 4] = [4, 6, 7, 5];

/// Top-face quadrants that carry each half of a diagonal wall's upper edge.
pub(crate) const TOP_HALF: [[u32; 2]; 4] = [[1, 2], [2, 3], [3, 0], [0, 1]];
/// Same for the lower edge, read from the tile below.
pub(crate) const TOP_HALF_2: [[u32; 2]; 4] = [[0, 3], [1, 0], [2, 1], [3, 2]];

/// Trim hangs this fraction of a cell height past its edge.
pub(crate) const DROOP_FRACTION: f32 = 0.5;
/// Trim is pushed off its surface along the normal by this much.
pub(crate) const TRIM_NORMAL_OFFSET: f32 = 0.001;
/// Nudges covering T-junction seams on half diagonal edges.
pub(crate) const TRIM_TOP_FUDGE: f32 = 0.02;
pub(crate) const TRIM_BOTTOM_FUDGE: f32 = 0.01;

/// Light is sampled this fraction of a cell above each vertex so flat floors
/// don't pick up the darkness of the cell below.
pub(crate) const LIGHT_SAMPLE_LIFT: f32 = 0.35;

/// World-projected wall UVs repeat every this many cells.
pub(crate) const WALL_UV_PERIOD: f32 = 4.0;
/// Stretch applied along diagonal walls so texels stay square.
pub(crate) const DIAGONAL_UV_STRETCH: f32 = 1.4;

// Colors
pub(crate) const OPAQUE_ALPHA: u8 = 255;
pub(crate) const TRIM_FLAG: u8 = 255;
