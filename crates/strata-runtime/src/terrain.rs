use std::panic;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use strata_edit::{DirtyStats, DirtyTracker};
use strata_geom::{IAabb, Int3, Vec3};
use strata_io::CodecError;
use strata_lighting::{RegionPatch, smooth_light};
use strata_mesh_cpu::{BitmaskArena, ChunkMeshCPU};
use strata_tiles::{Rgba8, StyleCatalog, StyleSheet, StyleTable, TileCatalog};
use strata_world::{Cell, CellSink, ChunkCoord, TerrainConfig, VoxelGrid};

use crate::error::TerrainError;
use crate::jobs::{JobKind, JobOut, JobPool, MeshSnapshot};
use crate::sky_worker::{SkyRequest, SkyWorker};

pub type SerializeCallback = Box<dyn FnOnce(Result<Vec<u8>, TerrainError>) + Send>;

struct EncodeTask {
    handle: JoinHandle<Result<Vec<u8>, CodecError>>,
    done: SerializeCallback,
}

#[derive(Default)]
struct ChunkSlot {
    active: bool,
    mesh: Option<ChunkMeshCPU>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickStatus {
    /// Nothing dirty, nothing running.
    Idle,
    /// Jobs are in flight or work is still queued.
    Working,
    /// Only the sky thread is busy.
    WaitingOnSky,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TerrainStats {
    pub dims: Int3,
    pub chunks: usize,
    pub active_chunks: usize,
    pub render_tris: usize,
    pub collision_tris: usize,
    pub dirty: DirtyStats,
    pub jobs_in_flight: usize,
    pub sky_running: bool,
    pub min_ambient: f32,
}

/// Voxel terrain: tile storage, incremental meshing, sky light and
/// persistence behind one owner. Every mutating call first joins the
/// outstanding jobs.
pub struct Terrain {
    grid: Arc<VoxelGrid>,
    bitmasks: Arc<BitmaskArena>,
    catalog: Arc<TileCatalog>,
    style_catalog: StyleCatalog,
    styles: Arc<StyleTable>,
    dirty: DirtyTracker,
    chunks: Vec<ChunkSlot>,
    pool: JobPool,
    sky: SkyWorker,
    mesh_job: Option<ChunkCoord>,
    light_job: Option<ChunkCoord>,
    encodes: Vec<EncodeTask>,
    cell_size: Vec3,
    root_offset: Vec3,
    max_light_spread: i32,
    min_ambient: f32,
}

fn check_config(cfg: &TerrainConfig) -> Result<(), TerrainError> {
    let d = cfg.dims();
    if d.x < 0 || d.y < 0 || d.z < 0 {
        return Err(TerrainError::Config(format!("negative dimensions {:?}", d)));
    }
    let cs = cfg.cell_size();
    if [cs.x, cs.y, cs.z].iter().any(|v| !v.is_finite() || *v <= 0.0) {
        return Err(TerrainError::Config(format!("cell size must be positive, got {:?}", cs)));
    }
    if cfg.max_light_spread < 0 {
        return Err(TerrainError::Config(format!(
            "max_light_spread must be >= 0, got {}",
            cfg.max_light_spread
        )));
    }
    Ok(())
}

impl Terrain {
    pub fn new(cfg: &TerrainConfig) -> Result<Self, TerrainError> {
        check_config(cfg)?;
        let dims = cfg.dims();
        let mut t = Self {
            grid: Arc::new(VoxelGrid::new(Int3::ZERO)),
            bitmasks: Arc::new(BitmaskArena::new(Int3::ZERO)),
            catalog: Arc::new(TileCatalog::analyze()),
            style_catalog: StyleCatalog::new(),
            styles: Arc::new(StyleTable::default()),
            dirty: DirtyTracker::new(Default::default()),
            chunks: Vec::new(),
            pool: JobPool::new(cfg.workers()),
            sky: SkyWorker::spawn(),
            mesh_job: None,
            light_job: None,
            encodes: Vec::new(),
            cell_size: cfg.cell_size(),
            root_offset: Vec3::ZERO,
            max_light_spread: cfg.max_light_spread,
            min_ambient: cfg.min_ambient.clamp(0.0, 1.0),
        };
        t.reset_world(dims);
        Ok(t)
    }

    fn reset_world(&mut self, dims: Int3) {
        let dims = dims.max(Int3::ZERO);
        let grid = VoxelGrid::new(dims);
        let layout = *grid.layout();
        log::info!(
            "terrain {}x{}x{} cells, chunk counts {}x{}x{}",
            dims.x,
            dims.y,
            dims.z,
            layout.counts.x,
            layout.counts.y,
            layout.counts.z
        );
        self.chunks = (0..layout.num_chunks()).map(|_| ChunkSlot::default()).collect();
        self.bitmasks = Arc::new(BitmaskArena::new(dims));
        self.grid = Arc::new(grid);
        self.dirty.reset(layout);
        self.mesh_job = None;
        self.light_job = None;
        // The old thread's mirror no longer matches; start clean.
        self.sky = SkyWorker::spawn();
    }

    /// Discards all tiles and chunk meshes and starts an empty world.
    pub fn set_world_dimensions(&mut self, dims: Int3) {
        self.complete_tile_jobs();
        self.reset_world(dims);
    }

    // ---- barrier ----

    #[inline]
    fn jobs_in_flight(&self) -> bool {
        self.mesh_job.is_some() || self.light_job.is_some()
    }

    /// Joins every outstanding mesh, light and encode job and folds their
    /// results in. Must run before any write to tile data.
    pub fn complete_tile_jobs(&mut self) {
        while self.jobs_in_flight() {
            match self.pool.wait_result() {
                Some(out) => self.integrate(out),
                None => {
                    self.mesh_job = None;
                    self.light_job = None;
                }
            }
        }
        self.finish_encodes(true);
    }

    fn finish_encodes(&mut self, block: bool) {
        let mut i = 0;
        while i < self.encodes.len() {
            if !block && !self.encodes[i].handle.is_finished() {
                i += 1;
                continue;
            }
            let task = self.encodes.remove(i);
            let res = match task.handle.join() {
                Ok(r) => r.map_err(TerrainError::from),
                Err(p) => panic::resume_unwind(p),
            };
            (task.done)(res);
        }
    }

    fn slot_mut(&mut self, c: ChunkCoord) -> Option<&mut ChunkSlot> {
        let i = self.grid.layout().index(c)?;
        self.chunks.get_mut(i)
    }

    fn slot(&self, c: ChunkCoord) -> Option<&ChunkSlot> {
        let i = self.grid.layout().index(c)?;
        self.chunks.get(i)
    }

    fn deactivate(&mut self, c: ChunkCoord) {
        log::trace!(target: "sched", "deactivate empty chunk ({}, {}, {})", c.cx, c.cy, c.cz);
        if let Some(slot) = self.slot_mut(c) {
            slot.active = false;
            slot.mesh = None;
        }
    }

    fn integrate(&mut self, out: JobOut) {
        let JobOut {
            kind,
            coord,
            mesh,
            relit,
            t_ms,
        } = out;
        match kind {
            JobKind::Mesh => {
                self.mesh_job = None;
                if relit {
                    self.light_job = None;
                }
                log::trace!(
                    target: "sched",
                    "mesh done ({}, {}, {}) ms={} tris={}",
                    coord.cx,
                    coord.cy,
                    coord.cz,
                    t_ms,
                    mesh.as_ref().map_or(0, |m| m.render.tri_count())
                );
                match mesh {
                    Some(m) => {
                        if let Some(slot) = self.slot_mut(coord) {
                            slot.active = true;
                            slot.mesh = Some(m);
                        }
                    }
                    None => self.deactivate(coord),
                }
            }
            JobKind::Light => {
                self.light_job = None;
                log::trace!(target: "sched", "relit ({}, {}, {}) ms={}", coord.cx, coord.cy, coord.cz, t_ms);
                if let Some(slot) = self.slot_mut(coord) {
                    slot.mesh = mesh;
                }
            }
        }
    }

    fn snapshot(&self) -> MeshSnapshot {
        MeshSnapshot {
            grid: Arc::clone(&self.grid),
            bitmasks: Arc::clone(&self.bitmasks),
            catalog: Arc::clone(&self.catalog),
            styles: Arc::clone(&self.styles),
            cell_size: self.cell_size,
        }
    }

    // ---- scheduling ----

    fn check_on_sky(&mut self) {
        if let Some(res) = self.sky.poll() {
            let dims = self.grid.dims();
            res.colors.apply(Arc::make_mut(&mut self.grid).light_field_mut(), dims);
            let n = self.dirty.mark_light_box(res.write);
            log::debug!(
                "sky write bounds {:?}..{:?}, {} chunks to relight",
                res.write.min,
                res.write.max,
                n
            );
        }
        if self.sky.is_running() {
            return;
        }
        if let Some(dirty) = self.dirty.take_sky() {
            let dims = self.grid.dims();
            let req = SkyRequest {
                dims,
                shapes: RegionPatch::capture(self.grid.shapes(), dims, dirty),
                dirty,
                max_spread: self.max_light_spread,
            };
            if !self.sky.submit(req) {
                log::warn!("sky thread unavailable, light left stale");
            }
        }
    }

    /// Brings the masks of `c` and its 26 neighbours up to date.
    fn refresh_bitmasks_around(&mut self, c: ChunkCoord) {
        let layout = *self.grid.layout();
        let stale: Vec<ChunkCoord> = layout
            .neighborhood(c)
            .filter(|&n| self.dirty.take_bitmask(n))
            .collect();
        if stale.is_empty() {
            return;
        }
        let masks = Arc::make_mut(&mut self.bitmasks);
        for n in stale {
            masks.refresh_chunk(&self.grid, &self.catalog, n);
        }
    }

    fn flush_bitmasks(&mut self) {
        let stale = self.dirty.drain_bitmasks();
        if stale.is_empty() {
            return;
        }
        let masks = Arc::make_mut(&mut self.bitmasks);
        for n in stale {
            masks.refresh_chunk(&self.grid, &self.catalog, n);
        }
    }

    /// One scheduler step. Folds in finished jobs, syncs the sky thread,
    /// then starts at most one mesh job and one light job, nearest to the
    /// world-space `view` first.
    pub fn tick(&mut self, view: Vec3) -> TickStatus {
        self.finish_encodes(false);
        if self.jobs_in_flight() {
            for out in self.pool.drain_results() {
                self.integrate(out);
            }
            if self.jobs_in_flight() {
                return TickStatus::Working;
            }
        }
        if self.style_catalog.arrays_dirty() {
            self.create_texture_arrays(false);
        }
        self.check_on_sky();

        let view_chunk = ChunkCoord::of_cell(self.tile_from_world(view));
        let mut dropped = Vec::new();
        let grid = &self.grid;
        let mesh_pick = self
            .dirty
            .pick_geometry(view_chunk, |c| grid.chunk_is_empty(c), &mut dropped);
        for c in dropped {
            self.deactivate(c);
        }
        match mesh_pick {
            Some(c) => self.refresh_bitmasks_around(c),
            None => self.flush_bitmasks(),
        }

        let layout = *self.grid.layout();
        let chunks = &self.chunks;
        let light_pick = self.dirty.pick_light(view_chunk, |c| {
            layout
                .index(c)
                .and_then(|i| chunks.get(i))
                .is_some_and(|s| s.active && s.mesh.is_some())
        });

        if let Some(c) = mesh_pick {
            let relit = light_pick == Some(c);
            log::trace!(target: "sched", "mesh job ({}, {}, {}) relit={}", c.cx, c.cy, c.cz, relit);
            self.pool.submit_mesh(self.snapshot(), c, relit);
            self.mesh_job = Some(c);
            if relit {
                self.light_job = Some(c);
            }
        }
        if let Some(c) = light_pick.filter(|&c| Some(c) != mesh_pick) {
            if let Some(mesh) = self.slot_mut(c).and_then(|s| s.mesh.take()) {
                log::trace!(target: "sched", "light job ({}, {}, {})", c.cx, c.cy, c.cz);
                self.pool.submit_light(Arc::clone(&self.grid), self.cell_size, mesh);
                self.light_job = Some(c);
            }
        }

        if self.jobs_in_flight() {
            TickStatus::Working
        } else if self.sky.is_running() {
            TickStatus::WaitingOnSky
        } else if self.dirty.is_idle() && self.encodes.is_empty() {
            TickStatus::Idle
        } else {
            TickStatus::Working
        }
    }

    /// Ticks until idle, blocking on jobs and the sky thread between ticks.
    /// Returns the tick count, or `None` if `max_ticks` ran out first.
    pub fn settle(&mut self, view: Vec3, max_ticks: usize) -> Option<usize> {
        for n in 0..max_ticks {
            match self.tick(view) {
                TickStatus::Idle => return Some(n),
                TickStatus::WaitingOnSky => self.sky.wait(),
                TickStatus::Working => self.complete_tile_jobs(),
            }
        }
        None
    }

    pub fn has_pending_work(&self) -> bool {
        self.jobs_in_flight()
            || self.sky.is_running()
            || !self.dirty.is_idle()
            || !self.encodes.is_empty()
    }

    // ---- cells ----

    pub fn get_cell(&self, c: Int3) -> Option<Cell> {
        self.grid.cell(c)
    }

    pub fn cell_light(&self, c: Int3) -> Option<f32> {
        self.grid.light(c)
    }

    /// Writes one cell. Out-of-bounds writes and writes that change nothing
    /// are ignored and return `false`. Panics on a direction above 3.
    pub fn set_cell(&mut self, coord: Int3, cell: Cell) -> bool {
        assert!(cell.dir <= 3, "tile direction must be 0..=3, got {}", cell.dir);
        let cell = cell.normalized();
        match self.grid.cell(coord) {
            None => return false,
            Some(old) if old == cell => return false,
            Some(_) => {}
        }
        self.complete_tile_jobs();
        Arc::make_mut(&mut self.grid).set(coord, cell);
        self.dirty.mark_cell(coord);
        true
    }

    /// Fills whole slices `[first_y, first_y + count)`. Every chunk is
    /// remeshed afterwards.
    pub fn set_slices(&mut self, first_y: i32, count: i32, cell: Cell) {
        assert!(cell.dir <= 3, "tile direction must be 0..=3, got {}", cell.dir);
        self.complete_tile_jobs();
        let dims = self.grid.dims();
        Arc::make_mut(&mut self.grid).fill_slices(first_y, count, cell);
        self.dirty.mark_all_geometry();
        self.dirty.mark_all_bitmasks();
        self.dirty.mark_sky_box(IAabb::new(
            Int3::new(0, first_y, 0),
            Int3::new(dims.x, first_y.saturating_add(count), dims.z),
        ));
    }

    /// Rewrites style `find` to `replace` everywhere. Returns the number of
    /// cells changed.
    pub fn find_replace_style(&mut self, find: u32, replace: u32) -> usize {
        self.complete_tile_jobs();
        let n = Arc::make_mut(&mut self.grid).replace_style(find, replace);
        if n > 0 {
            let layout = *self.grid.layout();
            for c in layout.iter() {
                if !self.grid.chunk_is_empty(c) {
                    self.dirty.mark_geometry(c);
                }
            }
        }
        n
    }

    // ---- styles ----

    pub fn set_style_textures(
        &mut self,
        style: u32,
        floor: Arc<[Rgba8]>,
        wall: Option<Arc<[Rgba8]>>,
        trim: Option<Arc<[Rgba8]>>,
    ) {
        if self.style_catalog.set_style_textures(style, floor, wall, trim) {
            self.dirty.mark_all_geometry();
        }
    }

    pub fn apply_style_sheet(&mut self, sheet: &StyleSheet) {
        if sheet.apply(&mut self.style_catalog) {
            self.dirty.mark_all_geometry();
        }
    }

    /// Assigns texture slices and publishes the new style table to future
    /// mesh jobs. Runs on its own at the next tick when styles changed.
    pub fn create_texture_arrays(&mut self, force: bool) {
        self.style_catalog.create_texture_arrays(force);
        self.styles = Arc::new(self.style_catalog.table());
    }

    pub fn style_catalog(&self) -> &StyleCatalog {
        &self.style_catalog
    }

    // ---- light ----

    pub fn set_min_ambient(&mut self, v: f32) {
        self.min_ambient = v.clamp(0.0, 1.0);
    }

    /// Floor the renderer applies to vertex light. Meshes carry raw light
    /// in the red channel; this value is reported alongside them in
    /// [`TerrainStats`].
    pub fn min_ambient(&self) -> f32 {
        self.min_ambient
    }

    pub fn set_max_light_spread(&mut self, n: i32) {
        assert!(n >= 0, "max light spread must be >= 0, got {n}");
        if n != self.max_light_spread {
            self.max_light_spread = n;
            self.dirty.mark_sky_all();
        }
    }

    pub fn max_light_spread(&self) -> i32 {
        self.max_light_spread
    }

    /// Trilinear light at a world-space point.
    pub fn smooth_light_amount(&self, world: Vec3) -> f32 {
        smooth_light(
            self.grid.light_field(),
            self.grid.dims(),
            self.cell_size,
            world - self.root_offset,
        )
    }

    // ---- coordinates ----

    pub fn set_root_offset(&mut self, v: Vec3) {
        self.root_offset = v;
    }

    pub fn root_offset(&self) -> Vec3 {
        self.root_offset
    }

    pub fn cell_size(&self) -> Vec3 {
        self.cell_size
    }

    pub fn world_dimensions(&self) -> Int3 {
        self.grid.dims()
    }

    pub fn tile_from_local(&self, p: Vec3) -> Int3 {
        let cs = self.cell_size;
        Int3::new(
            (p.x / cs.x + 0.5).floor() as i32,
            (p.y / cs.y + 0.5).floor() as i32,
            (p.z / cs.z + 0.5).floor() as i32,
        )
    }

    pub fn tile_from_world(&self, p: Vec3) -> Int3 {
        self.tile_from_local(p - self.root_offset)
    }

    // ---- importance ----

    pub fn num_dirty_chunks(&self) -> usize {
        self.dirty.num_geometry()
    }

    pub fn num_dirty_light_chunks(&self) -> usize {
        self.dirty.num_light()
    }

    pub fn total_dirty_chunk_importance(&self) -> f32 {
        self.dirty.total_importance()
    }

    pub fn mark_dirty_chunk_importance(&mut self, c: ChunkCoord, importance: f32) -> bool {
        self.complete_tile_jobs();
        self.dirty.set_importance(c, importance)
    }

    /// Pulls the whole chunk column above and below `cell` to the front of
    /// the rebuild queue.
    pub fn report_rigidbody_at(&mut self, cell: Int3) {
        let c = ChunkCoord::of_cell(cell);
        for y in 0..self.grid.layout().counts.y {
            self.mark_dirty_chunk_importance(c.with_y(y), 1.0);
        }
    }

    // ---- persistence ----

    pub fn serialize(&self) -> Result<Vec<u8>, TerrainError> {
        Ok(strata_io::serialize(&self.grid)?)
    }

    /// Serializes the half-open cell box `[start, end)`.
    pub fn serialize_region(&self, start: Int3, end: Int3) -> Result<Vec<u8>, TerrainError> {
        Ok(strata_io::serialize_region(&self.grid, IAabb::new(start, end))?)
    }

    /// Encodes the current grid on a worker thread. `done` runs on the
    /// calling thread from a later `tick` or barrier.
    pub fn serialize_async(
        &mut self,
        done: impl FnOnce(Result<Vec<u8>, TerrainError>) + Send + 'static,
    ) {
        let grid = Arc::clone(&self.grid);
        let spawned = thread::Builder::new()
            .name("strata-encode".into())
            .spawn(move || strata_io::serialize(&grid));
        match spawned {
            Ok(handle) => self.encodes.push(EncodeTask {
                handle,
                done: Box::new(done),
            }),
            Err(e) => done(Err(CodecError::Io(e).into())),
        }
    }

    pub fn deserialize(&mut self, bytes: &[u8]) -> Result<(), TerrainError> {
        self.deserialize_at(bytes, Int3::ZERO)
    }

    /// Pastes a serialized box with its minimum corner at `origin`. The
    /// stream is fully decoded before anything is written.
    pub fn deserialize_at(&mut self, bytes: &[u8], origin: Int3) -> Result<(), TerrainError> {
        let region = strata_io::deserialize(bytes)?;
        self.complete_tile_jobs();
        let written = strata_io::paste_into(Arc::make_mut(&mut self.grid), &region, origin)?;
        self.dirty.mark_box(written);
        self.dirty.mark_sky_all();
        Ok(())
    }

    // ---- inspection ----

    pub fn grid(&self) -> &VoxelGrid {
        &self.grid
    }

    pub fn bitmasks(&self) -> &BitmaskArena {
        &self.bitmasks
    }

    pub fn styles(&self) -> &StyleTable {
        &self.styles
    }

    pub fn chunk_mesh(&self, c: ChunkCoord) -> Option<&ChunkMeshCPU> {
        self.slot(c).and_then(|s| s.mesh.as_ref())
    }

    pub fn is_chunk_active(&self, c: ChunkCoord) -> bool {
        self.slot(c).is_some_and(|s| s.active)
    }

    pub fn meshes(&self) -> impl Iterator<Item = &ChunkMeshCPU> {
        self.chunks.iter().filter_map(|s| s.mesh.as_ref())
    }

    pub fn stats(&self) -> TerrainStats {
        TerrainStats {
            dims: self.grid.dims(),
            chunks: self.chunks.len(),
            active_chunks: self.chunks.iter().filter(|s| s.active).count(),
            render_tris: self.meshes().map(|m| m.render.tri_count()).sum(),
            collision_tris: self.meshes().map(|m| m.collision.tri_count()).sum(),
            dirty: self.dirty.stats(),
            jobs_in_flight: self.pool.inflight(),
            sky_running: self.sky.is_running(),
            min_ambient: self.min_ambient,
        }
    }

    pub fn mesh_workers(&self) -> usize {
        self.pool.workers
    }
}

impl CellSink for Terrain {
    fn dims(&self) -> Int3 {
        self.world_dimensions()
    }

    fn put(&mut self, at: Int3, cell: Cell) {
        self.set_cell(at, cell);
    }
}
