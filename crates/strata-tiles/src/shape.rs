use strata_geom::Vec3;

/// The fixed shape catalog. `Empty` is stored as -1 on the wire.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum TileShape {
    #[default]
    Empty,
    Block,
    Half,
    Ramp,
    Corner,
}

impl TileShape {
    /// Shapes that carry geometry, in catalog order.
    pub const SOLID: [TileShape; 4] = [
        TileShape::Block,
        TileShape::Half,
        TileShape::Ramp,
        TileShape::Corner,
    ];

    #[inline]
    pub fn from_i32(v: i32) -> Option<TileShape> {
        match v {
            -1 => Some(TileShape::Empty),
            0 => Some(TileShape::Block),
            1 => Some(TileShape::Half),
            2 => Some(TileShape::Ramp),
            3 => Some(TileShape::Corner),
            _ => None,
        }
    }

    #[inline]
    pub fn to_i32(self) -> i32 {
        match self {
            TileShape::Empty => -1,
            TileShape::Block => 0,
            TileShape::Half => 1,
            TileShape::Ramp => 2,
            TileShape::Corner => 3,
        }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self == TileShape::Empty
    }

    /// Index into the analyzed catalog; `None` for `Empty`.
    #[inline]
    pub fn catalog_index(self) -> Option<usize> {
        match self {
            TileShape::Empty => None,
            s => Some(s.to_i32() as usize),
        }
    }

    /// Only full blocks stop the sky flood fill.
    #[inline]
    pub fn blocks_sky(self) -> bool {
        self == TileShape::Block
    }

    /// Ramps and corners let light in but shade the cell beneath them.
    #[inline]
    pub fn shadows_below(self) -> bool {
        matches!(self, TileShape::Ramp | TileShape::Corner)
    }

    /// Point-in-volume test for the unrotated shape inside the unit cell
    /// `[-0.5, 0.5]^3`. Boundaries count as inside.
    pub fn contains(self, p: Vec3) -> bool {
        const H: f32 = 0.5;
        if p.x.abs() > H || p.y.abs() > H || p.z.abs() > H {
            return false;
        }
        match self {
            TileShape::Empty => false,
            TileShape::Block => true,
            TileShape::Half => p.x + p.z >= 0.0,
            TileShape::Ramp => p.y <= p.x,
            TileShape::Corner => p.y <= p.x.min(p.z),
        }
    }
}
