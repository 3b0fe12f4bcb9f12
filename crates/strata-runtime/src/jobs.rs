use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, unbounded};
use rayon::{ThreadPool, ThreadPoolBuilder};

use strata_geom::Vec3;
use strata_mesh_cpu::{BitmaskArena, ChunkMeshCPU, MeshInputs, build_chunk_mesh};
use strata_tiles::{StyleTable, TileCatalog};
use strata_world::{ChunkCoord, VoxelGrid};

/// Read-only view a mesh job works from. The main thread only mutates the
/// shared data after every job holding a snapshot has reported back.
#[derive(Clone)]
pub(crate) struct MeshSnapshot {
    pub grid: Arc<VoxelGrid>,
    pub bitmasks: Arc<BitmaskArena>,
    pub catalog: Arc<TileCatalog>,
    pub styles: Arc<StyleTable>,
    pub cell_size: Vec3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum JobKind {
    Mesh,
    Light,
}

pub(crate) struct JobOut {
    pub kind: JobKind,
    pub coord: ChunkCoord,
    /// `None` when a mesh job found the chunk empty.
    pub mesh: Option<ChunkMeshCPU>,
    /// A light pick for the same chunk rode along with this mesh job.
    pub relit: bool,
    pub t_ms: u32,
}

fn elapsed_ms(t0: Instant) -> u32 {
    t0.elapsed().as_millis().min(u128::from(u32::MAX)) as u32
}

fn process_mesh_job(snap: MeshSnapshot, coord: ChunkCoord, relit: bool, tx: &Sender<JobOut>) {
    let t0 = Instant::now();
    let inp = MeshInputs {
        grid: &snap.grid,
        bitmasks: &snap.bitmasks,
        catalog: &snap.catalog,
        styles: &snap.styles,
        cell_size: snap.cell_size,
    };
    // Built meshes are already shaded from the current light field, which
    // covers a chained light pick.
    let mesh = build_chunk_mesh(&inp, coord);
    drop(snap);
    let _ = tx.send(JobOut {
        kind: JobKind::Mesh,
        coord,
        mesh,
        relit,
        t_ms: elapsed_ms(t0),
    });
}

fn process_light_job(
    grid: Arc<VoxelGrid>,
    cell_size: Vec3,
    mut mesh: ChunkMeshCPU,
    tx: &Sender<JobOut>,
) {
    let t0 = Instant::now();
    mesh.recolor(&grid, cell_size);
    drop(grid);
    let _ = tx.send(JobOut {
        kind: JobKind::Light,
        coord: mesh.coord,
        mesh: Some(mesh),
        relit: true,
        t_ms: elapsed_ms(t0),
    });
}

/// Bounded pool for short one-shot mesh and recolor jobs.
pub(crate) struct JobPool {
    pool: ThreadPool,
    res_tx: Sender<JobOut>,
    res_rx: Receiver<JobOut>,
    inflight: Arc<AtomicUsize>,
    pub workers: usize,
}

impl JobPool {
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("strata-mesh-{i}"))
            .build()
            .expect("mesh pool");
        let (res_tx, res_rx) = unbounded::<JobOut>();
        Self {
            pool,
            res_tx,
            res_rx,
            inflight: Arc::new(AtomicUsize::new(0)),
            workers,
        }
    }

    pub fn submit_mesh(&self, snap: MeshSnapshot, coord: ChunkCoord, relit: bool) {
        let tx = self.res_tx.clone();
        let inflight = self.inflight.clone();
        inflight.fetch_add(1, Ordering::Relaxed);
        self.pool.spawn(move || {
            process_mesh_job(snap, coord, relit, &tx);
            inflight.fetch_sub(1, Ordering::Relaxed);
        });
    }

    pub fn submit_light(&self, grid: Arc<VoxelGrid>, cell_size: Vec3, mesh: ChunkMeshCPU) {
        let tx = self.res_tx.clone();
        let inflight = self.inflight.clone();
        inflight.fetch_add(1, Ordering::Relaxed);
        self.pool.spawn(move || {
            process_light_job(grid, cell_size, mesh, &tx);
            inflight.fetch_sub(1, Ordering::Relaxed);
        });
    }

    pub fn drain_results(&self) -> Vec<JobOut> {
        self.res_rx.try_iter().collect()
    }

    /// Blocks for the next result. Never fails while the pool holds a sender.
    pub fn wait_result(&self) -> Option<JobOut> {
        self.res_rx.recv().ok()
    }

    pub fn inflight(&self) -> usize {
        self.inflight.load(Ordering::Relaxed)
    }
}
