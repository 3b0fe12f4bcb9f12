//! Versioned DEFLATE stream of row spans.
//!
//! Layout, all `i32` little endian before compression:
//! `[version][size_x][size_y][size_z]`, then for every `y` and every `z`
//! `[segment_count][segments...]`. Light is never stored.

use std::io::{Read, Write};
use std::time::Instant;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use rayon::prelude::*;

use strata_geom::{IAabb, Int3};
use strata_world::{Cell, VoxelGrid};

use crate::error::{CodecError, Result};
use crate::span::{decode_row, encode_row};

pub const SERIALIZATION_VERSION: i32 = 0;

/// Packed rows of one Y slice, in Z order.
#[derive(Clone, Debug, Default)]
pub struct SliceSpans {
    pub counts: Vec<i32>,
    pub segments: Vec<i32>,
}

impl SliceSpans {
    pub fn rows(&self) -> impl Iterator<Item = &[i32]> {
        let mut at = 0usize;
        self.counts.iter().map(move |&n| {
            let row = &self.segments[at..at + n as usize];
            at += n as usize;
            row
        })
    }
}

fn check_region(grid: &VoxelGrid, region: IAabb) -> Result<()> {
    let dims = grid.dims();
    let inside = region.min.x >= 0
        && region.min.y >= 0
        && region.min.z >= 0
        && region.max.x <= dims.x
        && region.max.y <= dims.y
        && region.max.z <= dims.z
        && region.max.x >= region.min.x
        && region.max.y >= region.min.y
        && region.max.z >= region.min.z;
    if inside {
        Ok(())
    } else {
        Err(CodecError::RegionOutOfBounds {
            origin: region.min,
            size: region.size(),
            dims,
        })
    }
}

/// Encodes the rows of slice `y` that fall inside `region`.
pub fn encode_slice(grid: &VoxelGrid, region: IAabb, y: i32) -> Result<SliceSpans> {
    let mut out = SliceSpans::default();
    for z in region.min.z..region.max.z {
        let row_start = grid.index(Int3::new(region.min.x, y, z));
        let width = (region.max.x - region.min.x) as usize;
        let n = encode_row(
            (row_start..row_start + width).map(|i| grid.cell_at(i)),
            &mut out.segments,
        )?;
        out.counts.push(n as i32);
    }
    Ok(out)
}

/// Encodes every slice of `region`, one task per slice.
pub fn encode_region(grid: &VoxelGrid, region: IAabb) -> Result<Vec<SliceSpans>> {
    check_region(grid, region)?;
    (region.min.y..region.max.y)
        .into_par_iter()
        .map(|y| encode_slice(grid, region, y))
        .collect()
}

/// Compresses already-encoded slices into the final byte stream.
pub fn write_stream(size: Int3, slices: &[SliceSpans]) -> Result<Vec<u8>> {
    let mut enc = DeflateEncoder::new(Vec::new(), Compression::fast());
    enc.write_i32::<LittleEndian>(SERIALIZATION_VERSION)?;
    enc.write_i32::<LittleEndian>(size.x)?;
    enc.write_i32::<LittleEndian>(size.y)?;
    enc.write_i32::<LittleEndian>(size.z)?;
    for slice in slices {
        for row in slice.rows() {
            enc.write_i32::<LittleEndian>(row.len() as i32)?;
            for &seg in row {
                enc.write_i32::<LittleEndian>(seg)?;
            }
        }
    }
    let bytes = enc.finish()?;
    log::debug!("serialized to {} bytes", bytes.len());
    Ok(bytes)
}

/// Serializes the half-open box `region` of the grid.
pub fn serialize_region(grid: &VoxelGrid, region: IAabb) -> Result<Vec<u8>> {
    let t0 = Instant::now();
    let slices = encode_region(grid, region)?;
    let bytes = write_stream(region.size(), &slices)?;
    log::debug!(target: "perf", "ms={} serialize size={:?}", t0.elapsed().as_millis(), region.size());
    Ok(bytes)
}

pub fn serialize(grid: &VoxelGrid) -> Result<Vec<u8>> {
    serialize_region(grid, IAabb::new(Int3::ZERO, grid.dims()))
}

/// A decoded box of cells, X fastest, then Z, then Y.
#[derive(Clone, Debug)]
pub struct DecodedRegion {
    pub version: i32,
    pub size: Int3,
    pub cells: Vec<Cell>,
}

impl DecodedRegion {
    pub fn cell(&self, c: Int3) -> Option<Cell> {
        let s = self.size;
        if c.x < 0 || c.y < 0 || c.z < 0 || c.x >= s.x || c.y >= s.y || c.z >= s.z {
            return None;
        }
        let i = (c.y * s.z * s.x + c.z * s.x + c.x) as usize;
        self.cells.get(i).copied()
    }

    fn row_len(&self) -> usize {
        self.size.x as usize
    }

    fn slice_len(&self) -> usize {
        (self.size.x * self.size.z) as usize
    }
}

/// Decodes a stream produced by [`serialize_region`]. The version is read
/// and reported but not checked.
pub fn deserialize(bytes: &[u8]) -> Result<DecodedRegion> {
    let t0 = Instant::now();
    let mut raw = Vec::new();
    DeflateDecoder::new(bytes).read_to_end(&mut raw)?;
    log::debug!("decompressed {} -> {} bytes", bytes.len(), raw.len());

    let mut rd = raw.as_slice();
    let version = rd.read_i32::<LittleEndian>()?;
    let x = rd.read_i32::<LittleEndian>()?;
    let y = rd.read_i32::<LittleEndian>()?;
    let z = rd.read_i32::<LittleEndian>()?;
    if version != SERIALIZATION_VERSION {
        log::warn!("stream version {} (expected {})", version, SERIALIZATION_VERSION);
    }
    let volume = (x as i64) * (y as i64) * (z as i64);
    // Every row needs at least its count word, which bounds a sane header.
    let rows = (y as i64) * (z as i64);
    if x < 0 || y < 0 || z < 0 || volume > i32::MAX as i64 || rows * 4 > raw.len() as i64 {
        return Err(CodecError::BadHeader { x, y, z });
    }
    let size = Int3::new(x, y, z);

    let mut slices = Vec::with_capacity(y as usize);
    for sy in 0..y {
        let mut slice = SliceSpans::default();
        for sz in 0..z {
            let n = rd.read_i32::<LittleEndian>()?;
            if n < 0 || n > x {
                return Err(CodecError::RowLength {
                    y: sy,
                    z: sz,
                    got: n.max(0) as usize,
                    expected: x as usize,
                });
            }
            slice.counts.push(n);
            for _ in 0..n {
                slice.segments.push(rd.read_i32::<LittleEndian>()?);
            }
        }
        slices.push(slice);
    }
    let mut rest = Vec::new();
    rd.read_to_end(&mut rest)?;
    if !rest.is_empty() {
        log::warn!("{} trailing bytes after terrain stream", rest.len());
    }

    let mut region = DecodedRegion {
        version,
        size,
        cells: vec![Cell::EMPTY; volume as usize],
    };
    let row_len = region.row_len();
    let slice_len = region.slice_len();
    if slice_len > 0 {
        region
            .cells
            .par_chunks_mut(slice_len)
            .zip(slices.par_iter())
            .enumerate()
            .try_for_each(|(sy, (cells, spans))| -> Result<()> {
                for (sz, (row, segs)) in cells.chunks_mut(row_len).zip(spans.rows()).enumerate() {
                    decode_row(segs, row, sy as i32, sz as i32)?;
                }
                Ok(())
            })?;
    }
    log::debug!(target: "perf", "ms={} deserialize size={:?}", t0.elapsed().as_millis(), size);
    Ok(region)
}

/// Writes a decoded box into `grid` with its minimum corner at `origin`.
/// Only tile fields change; light is left for the caller to recompute.
/// Returns the box that was written.
pub fn paste_into(grid: &mut VoxelGrid, region: &DecodedRegion, origin: Int3) -> Result<IAabb> {
    let target = IAabb::new(origin, origin + region.size);
    check_region(grid, target).map_err(|_| CodecError::RegionOutOfBounds {
        origin,
        size: region.size,
        dims: grid.dims(),
    })?;
    let row_len = region.row_len();
    if row_len == 0 {
        return Ok(target);
    }
    for (i, row) in region.cells.chunks(row_len).enumerate() {
        let sz = i as i32 % region.size.z.max(1);
        let sy = i as i32 / region.size.z.max(1);
        let start = grid.index(Int3::new(origin.x, origin.y + sy, origin.z + sz));
        for (k, &cell) in row.iter().enumerate() {
            grid.put_at(start + k, cell);
        }
    }
    Ok(target)
}
