//! Trim strips along style seams.
//!
//! Every rule below looks at one wall side of a cell and a handful of
//! neighbouring masks, and hangs a strip of the owning style's border
//! texture over an exposed edge: wall tops, wall bottoms meeting a floor or
//! ramp, partially covered walls, and the upper and lower edges of diagonal
//! walls. The rules are case lists over 4-bit quadrant masks.
//!
//! Wall-face quadrants: bit 0 `+right`, bit 1 bottom, bit 2 `-right`,
//! bit 3 top.

use strata_geom::{Int3, Vec3};
use strata_tiles::{FaceBasis, StyleTable, TileCatalog};
use strata_world::{Cell, VoxelGrid};

use crate::bitmask::BitmaskArena;
use crate::constants::{
    CEIL_OFFSET, CEIL_TRIS, RAMP_SIDE, RAMP2_SIDE, TOP_HALF, TOP_HALF_2, TRIM_BOTTOM_FUDGE,
    TRIM_TOP_FUDGE, WALL_SIDES,
};
use crate::emit::{TrimSpan, add_overflow};
use crate::face::Face;
use crate::mesh_build::MeshBuild;

const TOP: u8 = 1 << 3;
const BOTTOM: u8 = 1 << 1;

pub(crate) struct SeamInputs<'a> {
    pub grid: &'a VoxelGrid,
    pub bitmasks: &'a BitmaskArena,
    pub catalog: &'a TileCatalog,
    pub styles: &'a StyleTable,
    pub cell_size: Vec3,
    pub slopes: &'a [FaceBasis; 8],
}

impl SeamInputs<'_> {
    #[inline]
    fn trim(&self, style: u32) -> Option<u32> {
        self.styles.get(style).trim
    }

    #[inline]
    fn solid(&self, c: Int3) -> Option<Cell> {
        self.grid.cell(c).filter(|cell| !cell.is_empty())
    }

    #[inline]
    fn slope_bits(&self, cell: Cell) -> u32 {
        self.catalog.slopes(cell.shape, cell.dir)
    }

    #[inline]
    fn mask(&self, c: Int3, face: Face) -> u8 {
        self.bitmasks.face(c, face)
    }
}

#[inline]
fn slope_has(slopes: u32, slope: usize, bit: u32) -> bool {
    (slopes >> (4 * slope)) & bit != 0
}

/// Geometry of one wall side in cell-local terms.
struct Wall {
    face: Face,
    n: Vec3,
    r: Vec3,
    u: Vec3,
    /// Odd faces wind the other way.
    odd: bool,
}

impl Wall {
    fn new(side: usize) -> Self {
        let face = Face::from_index(WALL_SIDES[side]);
        let b = face.basis();
        Wall {
            face,
            n: b.normal,
            r: b.right,
            u: b.up,
            odd: face.index() % 2 != 0,
        }
    }

    /// Point on the wall at `n/2 + ku*u/2 + kr*r/2`, scaled to the cell.
    #[inline]
    fn at(&self, offset: Vec3, cell: Vec3, ku: f32, kr: f32) -> Vec3 {
        offset + (self.n * 0.5 + self.u * (0.5 * ku) + self.r * (0.5 * kr)).scale(cell)
    }

    #[inline]
    fn center(&self, offset: Vec3, cell: Vec3) -> Vec3 {
        self.at(offset, cell, 0.0, 0.0)
    }
}

pub(crate) fn emit_cell_seams(
    inp: &SeamInputs<'_>,
    c: Int3,
    cell: Cell,
    offset: Vec3,
    out: &mut MeshBuild,
) {
    let dims = inp.grid.dims();
    let cs = inp.cell_size;
    let h = cs.y;
    let own_trim = inp.trim(cell.style);
    let own_slopes = inp.slope_bits(cell);
    let above = if c.y + 1 < dims.y {
        inp.solid(c + Int3::new(0, 1, 0))
    } else {
        None
    };
    let below = if c.y > 0 {
        inp.solid(c - Int3::new(0, 1, 0))
    } else {
        None
    };

    for side in 0..4 {
        let w = Wall::new(side);
        let m = inp.mask(c, w.face);
        let [ox, oy, oz] = CEIL_OFFSET[side];
        let side_xz = Int3::new(c.x + ox, c.y, c.z + oz);
        let side_in_xz = side_xz.x >= 0 && side_xz.x < dims.x && side_xz.z >= 0 && side_xz.z < dims.z;
        let side_tile = if side_in_xz { inp.solid(side_xz) } else { None };

        // Top edge of the wall, unless the wall continues in the tile above.
        let above_continues = above.is_some() && inp.mask(c + Int3::new(0, 1, 0), w.face) & BOTTOM != 0;
        if m & TOP != 0 && !above_continues {
            let mut ceiling = false;
            let mut style = cell.style;
            // The z bound reuses the x offset; the read below stays in range either way.
            let probe = Int3::new(c.x + ox, c.y + 1, c.z + ox);
            if probe.x > 0
                && probe.x < dims.x - 1
                && probe.z > 0
                && probe.z < dims.z - 1
                && c.y != dims.y - 1
            {
                let across = Int3::new(c.x + ox, c.y + oy, c.z + oz);
                ceiling = inp.mask(across, Face::NegY) & (1 << CEIL_TRIS[side]) != 0;
                if ceiling {
                    if let Some(t) = inp.grid.cell(across) {
                        style = t.style;
                    }
                }
            }
            let mut ramp = false;
            if !ceiling && c.y != dims.y - 1 {
                if let Some(up) = above {
                    ramp = slope_has(inp.slope_bits(up), RAMP_SIDE[side], 1 << 3);
                    if ramp {
                        style = up.style;
                    }
                }
            }
            if !ceiling {
                if let Some(trim) = inp.trim(style) {
                    add_overflow(
                        out,
                        w.at(offset, cs, -1.0, -1.0),
                        w.at(offset, cs, -1.0, 1.0),
                        w.n,
                        w.odd,
                        true,
                        h,
                        trim,
                        TrimSpan::Full,
                    );
                }
            }
        }

        // The wall's own trim around partially covered faces.
        if let Some(trim) = own_trim {
            match m {
                0b0110 => add_overflow(
                    out,
                    w.at(offset, cs, 1.0, 1.0),
                    w.at(offset, cs, -1.0, -1.0),
                    w.n,
                    !w.odd,
                    true,
                    h,
                    trim,
                    TrimSpan::Full,
                ),
                0b0011 => add_overflow(
                    out,
                    w.at(offset, cs, -1.0, 1.0),
                    w.at(offset, cs, 1.0, -1.0),
                    w.n,
                    !w.odd,
                    true,
                    h,
                    trim,
                    TrimSpan::Full,
                ),
                _ => {
                    if m & TOP == 0 {
                        for tri in 0..2 {
                            if m & (1 << (tri * 2)) != 0 {
                                let kr = if tri == 0 { 1.0 } else { -1.0 };
                                add_overflow(
                                    out,
                                    w.at(offset, cs, -1.0, kr),
                                    w.center(offset, cs),
                                    w.n,
                                    !((tri == 1) ^ w.odd),
                                    true,
                                    h,
                                    trim,
                                    TrimSpan::Full,
                                );
                            }
                        }
                    }
                    if m & BOTTOM != 0 {
                        for tri in 0..2 {
                            if m & (1 << (tri * 2)) == 0 {
                                let kr = if tri == 0 { 1.0 } else { -1.0 };
                                add_overflow(
                                    out,
                                    w.at(offset, cs, 1.0, kr),
                                    w.center(offset, cs),
                                    w.n,
                                    !((tri == 1) ^ w.odd),
                                    true,
                                    h,
                                    trim,
                                    TrimSpan::Full,
                                );
                            }
                        }
                    }
                }
            }
        }

        // Upper edge of a diagonal wall with nothing stacked on it.
        let sv = inp.slopes[side];
        if let Some(trim) = own_trim {
            let open_above = above.is_none_or(|up| {
                let s = inp.slope_bits(up);
                !slope_has(s, side, 1 << 3) && !slope_has(s, (side + 2) % 4, 1 << 3)
            });
            if slope_has(own_slopes, side, 1 << 1) && open_above {
                let top_mask = inp.mask(c, Face::PosY);
                let a = offset + (sv.up * 0.5 + sv.right * 0.5).scale(cs);
                let b = offset + (sv.up * 0.5 - sv.right * 0.5).scale(cs);
                match top_mask.count_ones() {
                    2 => add_overflow(out, a, b, sv.normal, true, true, h, trim, TrimSpan::Full),
                    1 => {
                        let a = a + sv.up * TRIM_TOP_FUDGE;
                        let b = b + sv.up * TRIM_TOP_FUDGE;
                        for (i, &q) in TOP_HALF[side].iter().enumerate() {
                            if top_mask & (1 << q) != 0 {
                                add_overflow(out, a, b, sv.normal, true, true, h, trim, TrimSpan::half(i));
                            }
                        }
                    }
                    _ => {}
                }
            }
        }

        // Bottom edge of the wall meeting a ramp, floor or downward ramp.
        if m & BOTTOM != 0 {
            let mut style = None;
            if side_in_xz {
                if let Some(t) = side_tile {
                    if slope_has(inp.slope_bits(t), RAMP2_SIDE[side], 1 << 3) {
                        style = Some(t.style);
                    }
                }
                if style.is_none() && c.y != 0 {
                    let lower = Int3::new(side_xz.x, c.y - 1, side_xz.z);
                    if inp.mask(lower, Face::PosY) & (1 << CEIL_TRIS[side]) != 0 {
                        style = inp.grid.cell(lower).map(|t| t.style);
                    } else if let Some(t) = inp.solid(lower) {
                        if slope_has(inp.slope_bits(t), RAMP_SIDE[side], 1 << 1) {
                            style = Some(t.style);
                        }
                    }
                }
            }
            if let Some(trim) = style.and_then(|s| inp.trim(s)) {
                add_overflow(
                    out,
                    w.at(offset, cs, 1.0, -1.0),
                    w.at(offset, cs, 1.0, 1.0),
                    w.n,
                    !w.odd,
                    false,
                    h,
                    trim,
                    TrimSpan::Full,
                );
            }
        }

        // The side neighbour's trim rising over gaps in this wall.
        if let Some(trim) = side_tile.and_then(|t| inp.trim(t.style)) {
            match m {
                0b1001 => add_overflow(
                    out,
                    w.at(offset, cs, 1.0, 1.0),
                    w.at(offset, cs, -1.0, -1.0),
                    w.n,
                    w.odd,
                    false,
                    h,
                    trim,
                    TrimSpan::Full,
                ),
                0b1100 => add_overflow(
                    out,
                    w.at(offset, cs, -1.0, 1.0),
                    w.at(offset, cs, 1.0, -1.0),
                    w.n,
                    w.odd,
                    false,
                    h,
                    trim,
                    TrimSpan::Full,
                ),
                _ => {
                    if m & BOTTOM == 0 {
                        for tri in 0..2 {
                            if m & (1 << (tri * 2)) != 0 {
                                let kr = if tri == 0 { 1.0 } else { -1.0 };
                                add_overflow(
                                    out,
                                    w.at(offset, cs, 1.0, kr),
                                    w.center(offset, cs),
                                    w.n,
                                    (tri == 1) ^ w.odd,
                                    false,
                                    h,
                                    trim,
                                    TrimSpan::Full,
                                );
                            }
                        }
                    }
                    if m & TOP != 0 {
                        for tri in 0..2 {
                            if m & (1 << (tri * 2)) == 0 {
                                let kr = if tri == 0 { 1.0 } else { -1.0 };
                                add_overflow(
                                    out,
                                    w.at(offset, cs, -1.0, kr),
                                    w.center(offset, cs),
                                    w.n,
                                    (tri == 1) ^ w.odd,
                                    false,
                                    h,
                                    trim,
                                    TrimSpan::Full,
                                );
                            }
                        }
                    }
                }
            }
        }

        // Lower edge of a diagonal wall standing on a floor.
        if let Some(low) = below {
            if let Some(trim) = inp.trim(low.style) {
                let s = inp.slope_bits(low);
                if slope_has(own_slopes, side, 1 << 3)
                    && !slope_has(s, side, 1 << 1)
                    && !slope_has(s, (side + 2) % 4, 1 << 1)
                {
                    let floor_mask = inp.mask(c - Int3::new(0, 1, 0), Face::PosY);
                    match floor_mask.count_ones() {
                        2 => add_overflow(
                            out,
                            offset - (sv.up * 0.5 + sv.right * 0.5).scale(cs),
                            offset - (sv.up * 0.5 - sv.right * 0.5).scale(cs),
                            sv.normal,
                            true,
                            false,
                            h,
                            trim,
                            TrimSpan::Full,
                        ),
                        1 => {
                            let a = offset
                                + (sv.up * -0.5 + sv.right * 0.5).scale(cs)
                                + sv.normal * TRIM_BOTTOM_FUDGE;
                            let b = offset
                                + (sv.up * -0.5 - sv.right * 0.5).scale(cs)
                                + sv.normal * TRIM_BOTTOM_FUDGE;
                            for (i, &q) in TOP_HALF_2[side].iter().enumerate() {
                                if floor_mask & (1 << q) != 0 {
                                    add_overflow(
                                        out,
                                        a,
                                        b,
                                        sv.normal,
                                        false,
                                        false,
                                        h,
                                        trim,
                                        TrimSpan::half(i),
                                    );
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
    }
}
