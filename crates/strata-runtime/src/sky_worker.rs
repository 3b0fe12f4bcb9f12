use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, unbounded};

use strata_geom::{IAabb, Int3};
use strata_lighting::{RegionPatch, SkyField};
use strata_tiles::TileShape;

pub(crate) struct SkyRequest {
    pub dims: Int3,
    /// Shapes inside `dirty` as of the request.
    pub shapes: RegionPatch<TileShape>,
    pub dirty: IAabb,
    pub max_spread: i32,
}

pub(crate) struct SkyResult {
    pub write: IAabb,
    pub colors: RegionPatch<f32>,
}

/// Dedicated sky-light thread. It keeps its own shape mirror and distance
/// field, so the tile grid can change while it runs. One request at a time.
pub(crate) struct SkyWorker {
    tx: Option<Sender<SkyRequest>>,
    rx: Receiver<SkyResult>,
    cancel: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    running: bool,
    ready: Option<SkyResult>,
}

fn sky_loop(rx: Receiver<SkyRequest>, tx: Sender<SkyResult>, cancel: Arc<AtomicBool>) {
    let mut field: Option<SkyField> = None;
    while let Ok(req) = rx.recv() {
        let t0 = Instant::now();
        if field.as_ref().is_none_or(|f| f.dims() != req.dims) {
            field = Some(SkyField::new(req.dims));
        }
        let Some(f) = field.as_mut() else {
            break;
        };
        f.apply_shapes(&req.shapes);
        let Some(write) = f.propagate(req.dirty, req.max_spread, &cancel) else {
            break;
        };
        let colors = f.capture_colors(write);
        log::debug!(
            target: "perf",
            "ms={} sky_job dirty={:?}..{:?} write={:?}..{:?}",
            t0.elapsed().as_millis(),
            req.dirty.min,
            req.dirty.max,
            write.min,
            write.max
        );
        if tx.send(SkyResult { write, colors }).is_err() {
            break;
        }
    }
}

impl SkyWorker {
    pub fn spawn() -> Self {
        let (req_tx, req_rx) = unbounded::<SkyRequest>();
        let (res_tx, res_rx) = unbounded::<SkyResult>();
        let cancel = Arc::new(AtomicBool::new(false));
        let c = cancel.clone();
        let handle = thread::Builder::new()
            .name("strata-sky".into())
            .spawn(move || sky_loop(req_rx, res_tx, c))
            .map_err(|e| log::error!("failed to spawn sky thread: {e}"))
            .ok();
        Self {
            tx: Some(req_tx),
            rx: res_rx,
            cancel,
            handle,
            running: false,
            ready: None,
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Returns `false` when the thread is gone and the request was dropped.
    pub fn submit(&mut self, req: SkyRequest) -> bool {
        debug_assert!(!self.running, "sky job already in flight");
        let Some(tx) = self.tx.as_ref() else {
            return false;
        };
        if self.handle.is_none() || tx.send(req).is_err() {
            return false;
        }
        self.running = true;
        true
    }

    /// Finished result, if any.
    pub fn poll(&mut self) -> Option<SkyResult> {
        if !self.running {
            return None;
        }
        let res = self.ready.take().or_else(|| self.rx.try_recv().ok());
        if res.is_some() {
            self.running = false;
        }
        res
    }

    /// Blocks until the in-flight request finishes. The result is picked up
    /// by the next [`SkyWorker::poll`].
    pub fn wait(&mut self) {
        if self.running && self.ready.is_none() {
            match self.rx.recv() {
                Ok(r) => self.ready = Some(r),
                Err(_) => self.running = false,
            }
        }
    }
}

impl Drop for SkyWorker {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
        self.tx.take();
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}
