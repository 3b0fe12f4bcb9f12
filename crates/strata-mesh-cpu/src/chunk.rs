use std::time::Instant;

use strata_geom::{Aabb, Int3, Vec3};
use strata_tiles::{StyleTable, TileCatalog, slope_bases};
use strata_world::{ChunkCoord, VoxelGrid};

use crate::bitmask::BitmaskArena;
use crate::emit::QuadrantFace;
use crate::face::Face;
use crate::mesh_build::{CollisionMesh, MeshBuild};
use crate::seams::{SeamInputs, emit_cell_seams};
use crate::shade::{recolor, shade_cell_style};

/// Everything a mesh job reads. Bitmasks for the chunk and its neighbours
/// must be current before a build starts.
#[derive(Clone, Copy)]
pub struct MeshInputs<'a> {
    pub grid: &'a VoxelGrid,
    pub bitmasks: &'a BitmaskArena,
    pub catalog: &'a TileCatalog,
    pub styles: &'a StyleTable,
    pub cell_size: Vec3,
}

pub struct ChunkMeshCPU {
    pub coord: ChunkCoord,
    pub bbox: Aabb,
    pub render: MeshBuild,
    pub collision: CollisionMesh,
}

impl ChunkMeshCPU {
    /// Refreshes vertex light from the grid's current light field.
    pub fn recolor(&mut self, grid: &VoxelGrid, cell_size: Vec3) {
        recolor(&mut self.render, grid.light_field(), grid.dims(), cell_size);
    }
}

/// Builds the render and collision meshes of one chunk. Returns `None` when
/// the chunk holds no tiles.
pub fn build_chunk_mesh(inp: &MeshInputs<'_>, coord: ChunkCoord) -> Option<ChunkMeshCPU> {
    let t0 = Instant::now();
    let grid = inp.grid;
    if !grid.layout().contains(coord) || grid.chunk_is_empty(coord) {
        return None;
    }
    let cells = grid.layout().cell_box(coord);
    let cs = inp.cell_size;
    let half = cs * 0.5;
    let slopes = slope_bases();
    let seams = SeamInputs {
        grid,
        bitmasks: inp.bitmasks,
        catalog: inp.catalog,
        styles: inp.styles,
        cell_size: cs,
        slopes: &slopes,
    };

    let mut render = MeshBuild::default();
    let mut collision = CollisionMesh::default();
    for y in cells.min.y..cells.max.y {
        for z in cells.min.z..cells.max.z {
            for x in cells.min.x..cells.max.x {
                let c = Int3::new(x, y, z);
                let index = grid.index(c);
                let cell = grid.cell_at(index);
                let Some(ty) = inp.catalog.get(cell.shape) else {
                    continue;
                };
                let dir = cell.dir as usize & 3;
                let offset = c.as_vec3().scale(cs);
                let v_start = render.vertex_count();
                let i_start = render.idx.len();

                for face in Face::ALL {
                    let mask = inp.bitmasks.face_at(index, face) as u32;
                    if mask == 0 {
                        continue;
                    }
                    let b = face.basis();
                    let (uv, selector_shift) = if face.is_horizontal() {
                        (ty.border_uv(0, face.index()), 4 - dir)
                    } else {
                        (ty.border_uv(dir, face.index()), 0)
                    };
                    let quad = QuadrantFace::new(
                        b.normal.scale(half) + offset,
                        b.right.scale(half),
                        b.up.scale(half),
                        uv,
                        |j| (j + selector_shift) % 4,
                        b.normal,
                        face.flips_winding(),
                    );
                    quad.emit(mask, &mut render);
                }

                for (i, sb) in slopes.iter().enumerate() {
                    let mask = ty.slope_mask(dir, i);
                    if mask == 0 {
                        continue;
                    }
                    let right = sb.right.scale(half);
                    let up = sb.up.scale(half);
                    // Normal of the placed plane, from its first two corners.
                    let normal = (right - up).cross(right + up).normalized();
                    let quad = QuadrantFace::new(
                        offset,
                        right,
                        up,
                        ty.slope_uv(dir, i),
                        |j| j,
                        normal,
                        true,
                    );
                    quad.emit(mask, &mut render);
                }

                let v_end = render.vertex_count();
                collision.append_from(&render, v_start..v_end, i_start..render.idx.len());
                shade_cell_style(&mut render, v_start..v_end, inp.styles.get(cell.style), cs);
                emit_cell_seams(&seams, c, cell, offset, &mut render);
            }
        }
    }
    recolor(&mut render, grid.light_field(), grid.dims(), cs);

    let bbox = bounds_of(&render, cells.min.as_vec3().scale(cs));
    log::debug!(
        target: "perf",
        "ms={} mesh_build chunk=({}, {}, {}) tris={} collision_tris={}",
        t0.elapsed().as_millis(),
        coord.cx,
        coord.cy,
        coord.cz,
        render.tri_count(),
        collision.tri_count()
    );
    Some(ChunkMeshCPU {
        coord,
        bbox,
        render,
        collision,
    })
}

fn bounds_of(mesh: &MeshBuild, fallback: Vec3) -> Aabb {
    if mesh.vertex_count() == 0 {
        return Aabb::new(fallback, fallback);
    }
    let first = mesh.position(0);
    let mut bb = Aabb::new(first, first);
    for v in 1..mesh.vertex_count() {
        bb.include(mesh.position(v));
    }
    bb
}
