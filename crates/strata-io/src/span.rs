//! Row run-length packing.
//!
//! A segment is one `i32`: `len << 22 | style << 13 | (shape + 1) << 4 | dir`.
//! Empty runs ignore style and direction.

use strata_tiles::TileShape;
use strata_world::Cell;

use crate::error::{CodecError, Result};

pub const MAX_RUN: u32 = (1 << 9) - 1;
pub const MAX_STYLE: u32 = (1 << 9) - 1;
pub const MAX_DIR: u32 = 3;

const LEN_SHIFT: u32 = 22;
const STYLE_SHIFT: u32 = 13;
const SHAPE_SHIFT: u32 = 4;

/// One run of identical cells along a row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub len: u32,
    pub cell: Cell,
}

impl Span {
    pub fn pack(self) -> Result<i32> {
        if self.len == 0 || self.len > MAX_RUN {
            return Err(CodecError::FieldOverflow {
                field: "len",
                value: self.len,
                max: MAX_RUN,
            });
        }
        let (style, dir) = if self.cell.is_empty() {
            (0, 0)
        } else {
            (self.cell.style, self.cell.dir as u32)
        };
        if style > MAX_STYLE {
            return Err(CodecError::FieldOverflow {
                field: "style",
                value: style,
                max: MAX_STYLE,
            });
        }
        if dir > MAX_DIR {
            return Err(CodecError::FieldOverflow {
                field: "dir",
                value: dir,
                max: MAX_DIR,
            });
        }
        let shape = (self.cell.shape.to_i32() + 1) as u32;
        let v = self.len << LEN_SHIFT | style << STYLE_SHIFT | shape << SHAPE_SHIFT | dir;
        Ok(v as i32)
    }

    pub fn unpack(v: i32) -> Result<Span> {
        if v < 0 {
            return Err(CodecError::BadSegment(v));
        }
        let v = v as u32;
        let len = v >> LEN_SHIFT;
        let style = (v >> STYLE_SHIFT) & MAX_STYLE;
        let code = ((v >> SHAPE_SHIFT) & 0xF) as i32 - 1;
        let dir = (v & MAX_DIR) as u8;
        let shape = TileShape::from_i32(code).ok_or(CodecError::BadSegment(v as i32))?;
        if len == 0 {
            return Err(CodecError::BadSegment(v as i32));
        }
        Ok(Span {
            len,
            cell: Cell::new(shape, style, dir),
        })
    }
}

#[inline]
fn same_run(a: Cell, b: Cell) -> bool {
    a.shape == b.shape && (a.is_empty() || (a.style == b.style && a.dir == b.dir))
}

/// Appends the packed segments of one row to `out` and returns how many were
/// written.
pub fn encode_row(row: impl IntoIterator<Item = Cell>, out: &mut Vec<i32>) -> Result<usize> {
    let start = out.len();
    let mut run: Option<Span> = None;
    for cell in row {
        match run.as_mut() {
            Some(span) if span.len < MAX_RUN && same_run(span.cell, cell) => span.len += 1,
            _ => {
                if let Some(span) = run.take() {
                    out.push(span.pack()?);
                }
                run = Some(Span { len: 1, cell });
            }
        }
    }
    if let Some(span) = run {
        out.push(span.pack()?);
    }
    Ok(out.len() - start)
}

/// Expands packed segments into `out`. The segments must cover `out` exactly;
/// `y` and `z` only label the error.
pub fn decode_row(segments: &[i32], out: &mut [Cell], y: i32, z: i32) -> Result<()> {
    let mut at = 0usize;
    for &seg in segments {
        let span = Span::unpack(seg)?;
        let end = at + span.len as usize;
        if end > out.len() {
            return Err(CodecError::RowLength {
                y,
                z,
                got: end,
                expected: out.len(),
            });
        }
        out[at..end].fill(span.cell);
        at = end;
    }
    if at != out.len() {
        return Err(CodecError::RowLength {
            y,
            z,
            got: at,
            expected: out.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(style: u32, dir: u8) -> Cell {
        Cell::new(TileShape::Block, style, dir)
    }

    #[test]
    fn packs_fields_in_place() {
        let v = Span {
            len: 3,
            cell: Cell::new(TileShape::Ramp, 7, 2),
        }
        .pack()
        .unwrap();
        assert_eq!(v, 3 << 22 | 7 << 13 | 3 << 4 | 2);
        let back = Span::unpack(v).unwrap();
        assert_eq!(back.len, 3);
        assert_eq!(back.cell, Cell::new(TileShape::Ramp, 7, 2));
    }

    #[test]
    fn empty_runs_merge_across_style() {
        let row = [
            Cell::new(TileShape::Empty, 4, 1),
            Cell::new(TileShape::Empty, 9, 3),
            block(1, 0),
            block(1, 0),
            block(1, 1),
        ];
        let mut out = Vec::new();
        assert_eq!(encode_row(row, &mut out).unwrap(), 3);
        let mut cells = [Cell::EMPTY; 5];
        decode_row(&out, &mut cells, 0, 0).unwrap();
        assert_eq!(cells[0], Cell::EMPTY);
        assert_eq!(cells[1], Cell::EMPTY);
        assert_eq!(&cells[2..], &row[2..]);
    }

    #[test]
    fn long_runs_split() {
        let row = vec![block(2, 0); 1200];
        let mut out = Vec::new();
        assert_eq!(encode_row(row.iter().copied(), &mut out).unwrap(), 3);
        let lens: Vec<u32> = out.iter().map(|&v| Span::unpack(v).unwrap().len).collect();
        assert_eq!(lens, vec![511, 511, 178]);
        let mut cells = vec![Cell::EMPTY; 1200];
        decode_row(&out, &mut cells, 0, 0).unwrap();
        assert_eq!(cells, row);
    }

    #[test]
    fn oversized_fields_are_rejected() {
        let mut out = Vec::new();
        let err = encode_row([block(512, 0)], &mut out).unwrap_err();
        assert!(matches!(err, CodecError::FieldOverflow { field: "style", .. }));
        let err = encode_row([block(1, 4)], &mut out).unwrap_err();
        assert!(matches!(err, CodecError::FieldOverflow { field: "dir", .. }));
        // Empty cells drop their fields, so nothing overflows.
        assert!(encode_row([Cell::new(TileShape::Empty, 9000, 9)], &mut out).is_ok());
    }

    #[test]
    fn short_or_long_rows_fail() {
        let mut out = Vec::new();
        encode_row([block(1, 0); 4], &mut out).unwrap();
        let mut three = [Cell::EMPTY; 3];
        assert!(matches!(
            decode_row(&out, &mut three, 2, 5),
            Err(CodecError::RowLength { y: 2, z: 5, .. })
        ));
        let mut five = [Cell::EMPTY; 5];
        assert!(matches!(
            decode_row(&out, &mut five, 0, 0),
            Err(CodecError::RowLength { got: 4, expected: 5, .. })
        ));
    }

    #[test]
    fn unknown_shape_code_fails() {
        let v = 1 << 22 | 9 << 4;
        assert!(matches!(Span::unpack(v), Err(CodecError::BadSegment(_))));
        assert!(matches!(Span::unpack(-1), Err(CodecError::BadSegment(_))));
        assert!(matches!(Span::unpack(1 << 4), Err(CodecError::BadSegment(_))));
    }
}
