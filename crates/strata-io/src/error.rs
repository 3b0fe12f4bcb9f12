use std::io;

use thiserror::Error;

use strata_geom::Int3;

#[derive(Error, Debug)]
pub enum CodecError {
    /// The compressed stream could not be read or written.
    #[error("stream i/o failed: {0}")]
    Io(#[from] io::Error),

    /// Header sizes are negative or too large to address.
    #[error("bad header: size ({x}, {y}, {z})")]
    BadHeader { x: i32, y: i32, z: i32 },

    /// A row's segments do not add up to the row width.
    #[error("row y={y} z={z} decodes to {got} cells, expected {expected}")]
    RowLength {
        y: i32,
        z: i32,
        got: usize,
        expected: usize,
    },

    /// A packed segment carries an unknown shape code or a zero length.
    #[error("bad segment {0:#010x}")]
    BadSegment(i32),

    /// The decoded box does not fit inside the target grid at this origin.
    #[error("region of size {size:?} at {origin:?} does not fit grid {dims:?}")]
    RegionOutOfBounds { origin: Int3, size: Int3, dims: Int3 },

    /// A cell field is wider than its bit-field in the packed segment.
    #[error("cannot pack {field}={value}, max is {max}")]
    FieldOverflow {
        field: &'static str,
        value: u32,
        max: u32,
    },
}

pub type Result<T> = std::result::Result<T, CodecError>;
