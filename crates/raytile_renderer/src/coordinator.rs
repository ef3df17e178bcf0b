//! Worker pool coordination.
//!
//! The [`Coordinator`] owns the frame buffer and a pool of render
//! workers. A render request partitions the frame into tiles, sends one
//! job per worker, then composites tile results as they stream back.
//!
//! ```text
//! Idle ──request──▶ Dispatched ──first tile──▶ Collecting ──last tile──▶ Complete
//!   ▲                                                                      │
//!   └──────────────────────────────request─────────────────────────────────┘
//! ```
//!
//! Nothing here blocks except [`Coordinator::wait`]. A host with its own
//! event loop calls [`Coordinator::poll`] and redraws on the returned
//! events.

use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use raytile_core::{Scene, SceneError};
use thiserror::Error;

use crate::codec::Frame;
use crate::job::{RenderJob, ShadingParams, Size, TileResult, WorkerMessage};
use crate::settings::{RenderSettings, SettingsError, MAX_WORKERS, MIN_WORKERS};
use crate::tile::TileGrid;
use crate::worker::{spawn_worker, QueueError, WorkerHandle};

/// Longest `wait` blocks on the result channel before re-checking timers.
const WAIT_SLICE: Duration = Duration::from_millis(50);

#[derive(Error, Debug)]
pub enum CoordinatorError {
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Failed to spawn worker: {0}")]
    Spawn(#[from] io::Error),

    #[error("Worker {id} is no longer accepting jobs")]
    WorkerGone { id: usize },

    #[error("Every worker has exited with {missing} tiles outstanding")]
    Disconnected { missing: usize },
}

pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

/// Where the current frame is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    Idle,
    Dispatched,
    Collecting,
    Complete,
}

/// Progress reported to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderEvent {
    /// A tile was written into the frame; the host should redraw.
    TileComposited {
        tile_index: usize,
        calculated: usize,
        total: usize,
    },
    /// Every tile of `frame` has arrived.
    Completed { frame: u64, elapsed: Duration },
}

pub struct Coordinator {
    scene: Arc<Scene>,
    settings: RenderSettings,

    workers: Vec<WorkerHandle>,
    retired: Vec<JoinHandle<()>>,
    next_worker_id: usize,
    results_tx: Sender<WorkerMessage>,
    results_rx: Receiver<WorkerMessage>,

    // Current frame
    frame: Frame,
    frame_id: u64,
    grid: TileGrid,
    shading: ShadingParams,
    state: RenderState,
    received: Vec<bool>,
    calculated: usize,
    started: Option<Instant>,

    // Tiles re-sent since the last stall round that cleared them
    redispatched: Vec<bool>,
    redispatch_round: usize,

    last_progress: Instant,
    last_resize: Instant,
}

impl Coordinator {
    /// Validate `scene` and `settings` and start the worker pool.
    pub fn new(scene: Arc<Scene>, settings: RenderSettings) -> CoordinatorResult<Self> {
        scene.validate()?;
        settings.validate()?;

        let (results_tx, results_rx) = mpsc::channel();
        let now = Instant::now();
        let mut coordinator = Self {
            scene,
            grid: TileGrid::new(settings.width, settings.height, settings.tile_size()),
            frame: Frame::new(settings.width, settings.height),
            shading: settings.shading.clone(),
            settings,
            workers: Vec::new(),
            retired: Vec::new(),
            next_worker_id: 0,
            results_tx,
            results_rx,
            frame_id: 0,
            state: RenderState::Idle,
            received: Vec::new(),
            calculated: 0,
            started: None,
            redispatched: Vec::new(),
            redispatch_round: 0,
            last_progress: now,
            last_resize: now,
        };
        coordinator.resize_pool()?;
        Ok(coordinator)
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    pub fn is_rendering(&self) -> bool {
        matches!(self.state, RenderState::Dispatched | RenderState::Collecting)
    }

    /// The frame buffer. Partially filled while rendering.
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Id of the most recently requested frame (0 before the first).
    pub fn frame_id(&self) -> u64 {
        self.frame_id
    }

    /// Tiles composited and tiles expected for the current frame.
    pub fn progress(&self) -> (usize, usize) {
        (self.calculated, self.received.len())
    }

    /// Number of live workers in the pool.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Replace the settings used by the next render request.
    ///
    /// A render in flight keeps the settings it was started with. The
    /// worker count takes effect at the next pool resize.
    pub fn set_settings(&mut self, settings: RenderSettings) -> CoordinatorResult<()> {
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }

    /// Change the configured pool size. Clamped to the supported range.
    pub fn set_worker_count(&mut self, count: usize) {
        self.settings.worker_count = count.clamp(MIN_WORKERS, MAX_WORKERS);
    }

    /// Start rendering a new frame.
    ///
    /// Returns `Ok(false)` and does nothing if a frame is already being
    /// rendered.
    pub fn request_render(&mut self) -> CoordinatorResult<bool> {
        if self.is_rendering() {
            log::debug!("Frame {} still rendering, request ignored", self.frame_id);
            return Ok(false);
        }

        self.resize_pool()?;

        let settings = &self.settings;
        self.frame_id += 1;
        self.grid = TileGrid::new(settings.width, settings.height, settings.tile_size());
        self.shading = settings.shading.clone();
        self.frame = Frame::new(settings.width, settings.height);
        self.received = vec![false; self.grid.total()];
        self.redispatched = vec![false; self.grid.total()];
        self.redispatch_round = 0;
        self.calculated = 0;

        let worker_count = self.workers.len();
        for (worker_index, worker) in self.workers.iter().enumerate() {
            match worker.try_dispatch(self.job(worker_index, worker_count, None)) {
                Ok(()) => {}
                // Only stall re-dispatch fills a queue, so the stall timer
                // picks these tiles up.
                Err(QueueError::Full) => {
                    log::warn!("Worker {} queue full, its share waits for re-dispatch", worker.id());
                }
                Err(QueueError::Gone) => return Err(CoordinatorError::WorkerGone { id: worker.id() }),
            }
        }

        let now = Instant::now();
        self.started = Some(now);
        self.last_progress = now;
        self.state = RenderState::Dispatched;

        log::debug!(
            "Frame {}: dispatched {} tiles ({}x{}) to {} workers",
            self.frame_id,
            self.grid.total(),
            self.grid.tile_size,
            self.grid.tile_size,
            worker_count
        );
        Ok(true)
    }

    /// Run timers and composite every result that has already arrived.
    pub fn poll(&mut self) -> CoordinatorResult<Vec<RenderEvent>> {
        self.tick(Instant::now())?;

        let mut events = Vec::new();
        while let Ok(message) = self.results_rx.try_recv() {
            events.extend(self.handle_message(message));
        }
        Ok(events)
    }

    /// Block until the current frame is complete.
    pub fn wait(&mut self) -> CoordinatorResult<&Frame> {
        while self.is_rendering() {
            match self.results_rx.recv_timeout(WAIT_SLICE) {
                Ok(message) => {
                    self.handle_message(message);
                }
                Err(RecvTimeoutError::Timeout) => {
                    if self.workers.iter().all(WorkerHandle::is_finished) {
                        return Err(CoordinatorError::Disconnected {
                            missing: self.received.len() - self.calculated,
                        });
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(CoordinatorError::Disconnected {
                        missing: self.received.len() - self.calculated,
                    });
                }
            }
            self.tick(Instant::now())?;
        }
        Ok(&self.frame)
    }

    /// Apply one worker message to the frame.
    pub fn handle_message(&mut self, message: WorkerMessage) -> Vec<RenderEvent> {
        let WorkerMessage::RaytraceResult(result) = message;
        self.composite_result(result)
    }

    fn composite_result(&mut self, result: TileResult) -> Vec<RenderEvent> {
        if result.frame != self.frame_id {
            log::warn!(
                "Discarding tile {} of stale frame {} (current {})",
                result.tile_index,
                result.frame,
                self.frame_id
            );
            return Vec::new();
        }
        if !self.is_rendering() {
            log::debug!("Late tile {} after frame {} completed", result.tile_index, self.frame_id);
            return Vec::new();
        }
        if !result.data.is_well_formed() {
            log::warn!("Discarding malformed tile {}", result.tile_index);
            return Vec::new();
        }

        match self.received.get_mut(result.tile_index) {
            Some(seen) if !*seen => *seen = true,
            Some(_) => {
                log::debug!("Tile {} already composited", result.tile_index);
                return Vec::new();
            }
            None => {
                log::warn!("Tile index {} out of range", result.tile_index);
                return Vec::new();
            }
        }

        self.frame.composite(&result.data, result.start_x, result.start_y);
        self.calculated += 1;
        self.state = RenderState::Collecting;
        self.last_progress = Instant::now();

        let total = self.received.len();
        let mut events = vec![RenderEvent::TileComposited {
            tile_index: result.tile_index,
            calculated: self.calculated,
            total,
        }];

        if self.calculated == total {
            let elapsed = self.started.take().map(|t| t.elapsed()).unwrap_or_default();
            self.state = RenderState::Complete;
            log::info!("Frame {} rendered in {:.2?}", self.frame_id, elapsed);
            events.push(RenderEvent::Completed {
                frame: self.frame_id,
                elapsed,
            });
        }
        events
    }

    /// Timer work: periodic pool resize and the stall check. Never waits
    /// on a worker.
    pub fn tick(&mut self, now: Instant) -> CoordinatorResult<()> {
        if now.saturating_duration_since(self.last_resize) >= self.settings.pool_interval() {
            self.resize_pool()?;
            self.last_resize = now;
        }

        if let Some(timeout) = self.settings.stall_timeout() {
            if self.is_rendering() && now.saturating_duration_since(self.last_progress) >= timeout {
                self.redispatch_missing();
                self.last_progress = now;
            }
        }
        Ok(())
    }

    /// Spawn or retire workers until the pool matches the configured size.
    ///
    /// Workers whose thread has exited are dropped and replaced. Retired
    /// workers finish whatever is already queued to them, so a resize
    /// during a render never loses tiles.
    pub fn resize_pool(&mut self) -> CoordinatorResult<()> {
        let target = self.settings.worker_count.clamp(MIN_WORKERS, MAX_WORKERS);

        self.workers.retain(|worker| {
            if worker.is_finished() {
                log::warn!("Worker {} exited unexpectedly, replacing it", worker.id());
                return false;
            }
            true
        });

        while self.workers.len() < target {
            let id = self.next_worker_id;
            self.next_worker_id += 1;
            let worker = spawn_worker(id, Arc::clone(&self.scene), self.results_tx.clone())?;
            self.workers.push(worker);
        }

        if self.workers.len() > target {
            let excess = self.workers.len() - target;
            for worker in self.workers.drain(target..) {
                self.retired.push(worker.close());
            }
            log::debug!("Retired {} workers", excess);
        }

        self.retired.retain(|thread| !thread.is_finished());
        Ok(())
    }

    /// Send tiles still missing from the current frame to the live
    /// workers again, round-robin, as explicit tile lists.
    ///
    /// Never blocks: a worker whose queue is full is skipped and its share
    /// waits for the next round. A tile already re-sent is not queued
    /// again until a round finds nothing new to send; that round only
    /// clears the marks.
    fn redispatch_missing(&mut self) {
        let fresh: Vec<usize> = (0..self.received.len())
            .filter(|&index| !self.received[index] && !self.redispatched[index])
            .collect();
        if fresh.is_empty() {
            self.redispatched.iter_mut().for_each(|pending| *pending = false);
            let outstanding = self.received.len() - self.calculated;
            if outstanding > 0 {
                log::debug!(
                    "Frame {}: {} re-sent tiles still pending",
                    self.frame_id,
                    outstanding
                );
            }
            return;
        }
        if self.workers.is_empty() {
            return;
        }

        // Rotate so a tile stuck behind one worker lands on another next time
        let worker_count = self.workers.len();
        let offset = self.redispatch_round % worker_count;
        self.redispatch_round += 1;
        let mut lists = vec![Vec::new(); worker_count];
        for (n, index) in fresh.iter().enumerate() {
            lists[(n + offset) % worker_count].push(*index);
        }

        let mut sent = 0;
        for (worker_index, tiles) in lists.into_iter().enumerate() {
            if tiles.is_empty() {
                continue;
            }
            let worker = &self.workers[worker_index];
            let job = self.job(worker_index, worker_count, Some(tiles.clone()));
            match worker.try_dispatch(job) {
                Ok(()) => {
                    for &index in &tiles {
                        self.redispatched[index] = true;
                    }
                    sent += tiles.len();
                }
                Err(QueueError::Full) => {
                    log::warn!("Worker {} queue full, skipping {} tiles", worker.id(), tiles.len());
                }
                Err(QueueError::Gone) => {
                    log::warn!("Worker {} has exited, skipping {} tiles", worker.id(), tiles.len());
                }
            }
        }

        log::warn!(
            "Frame {}: no progress, re-dispatched {} of {} missing tiles",
            self.frame_id,
            sent,
            fresh.len()
        );
    }

    fn job(&self, worker_index: usize, worker_count: usize, tiles: Option<Vec<usize>>) -> RenderJob {
        RenderJob {
            frame: self.frame_id,
            size: Size {
                x: self.grid.width,
                y: self.grid.height,
            },
            section_size: self.grid.tile_size,
            worker_index,
            worker_count,
            tiles,
            shading: self.shading.clone(),
        }
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        for worker in self.workers.drain(..) {
            self.retired.push(worker.close());
        }
        for thread in self.retired.drain(..) {
            if thread.join().is_err() {
                log::error!("Worker thread panicked");
            }
        }
    }
}
