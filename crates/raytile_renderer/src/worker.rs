//! Render worker threads.
//!
//! Each worker owns a dedicated thread and a bounded command queue. It
//! renders the tiles of every job it receives and streams each finished
//! tile back on a results channel shared with the coordinator. The
//! thread exits once its queue is closed and drained, on an explicit
//! [`WorkerCommand::Close`], or when nobody is listening for results.

use std::io;
use std::sync::mpsc::{self, Receiver, Sender, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use raytile_core::Scene;

use crate::job::{RenderJob, TileResult, WorkerCommand, WorkerMessage};
use crate::shading::Shader;
use crate::tile::render_tile;

/// Jobs a worker can have queued before `dispatch` blocks.
pub const JOB_QUEUE_DEPTH: usize = 4;

/// Why [`WorkerHandle::try_dispatch`] could not queue a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// The worker already has [`JOB_QUEUE_DEPTH`] jobs waiting.
    Full,
    /// The worker thread has exited.
    Gone,
}

/// Handle to a running worker thread.
pub struct WorkerHandle {
    id: usize,
    commands: SyncSender<WorkerCommand>,
    thread: JoinHandle<()>,
}

impl WorkerHandle {
    pub fn id(&self) -> usize {
        self.id
    }

    /// True once the thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Queue a job, blocking while the queue is full. Fails only if the
    /// worker thread has exited.
    pub fn dispatch(&self, job: RenderJob) -> bool {
        self.commands.send(WorkerCommand::Raytrace(job)).is_ok()
    }

    /// Queue a job without blocking.
    pub fn try_dispatch(&self, job: RenderJob) -> Result<(), QueueError> {
        self.commands
            .try_send(WorkerCommand::Raytrace(job))
            .map_err(|e| match e {
                TrySendError::Full(_) => QueueError::Full,
                TrySendError::Disconnected(_) => QueueError::Gone,
            })
    }

    /// Ask the worker to stop after its queued jobs.
    ///
    /// The returned handle can be joined; the worker never stops in the
    /// middle of a tile.
    pub fn close(self) -> JoinHandle<()> {
        let Self { id, commands, thread } = self;
        drop(commands);
        log::debug!("Closed worker {}", id);
        thread
    }
}

/// Start worker `id` rendering against `scene`.
pub fn spawn_worker(id: usize, scene: Arc<Scene>, results: Sender<WorkerMessage>) -> io::Result<WorkerHandle> {
    let (commands, queue) = mpsc::sync_channel(JOB_QUEUE_DEPTH);
    let thread = thread::Builder::new()
        .name(format!("raytile-worker-{}", id))
        .spawn(move || worker_loop(id, &scene, queue, results))?;

    log::debug!("Spawned worker {}", id);
    Ok(WorkerHandle { id, commands, thread })
}

fn worker_loop(id: usize, scene: &Scene, queue: Receiver<WorkerCommand>, results: Sender<WorkerMessage>) {
    for command in queue {
        let job = match command {
            WorkerCommand::Raytrace(job) => job,
            WorkerCommand::Close => break,
        };

        if !run_job(scene, &job, &results) {
            log::debug!("Worker {}: results channel closed", id);
            return;
        }
    }
    log::debug!("Worker {} exiting", id);
}

/// Render every tile of `job`, sending each as soon as it is done.
///
/// `scene` is expected to have passed [`Scene::validate`]; the
/// coordinator checks it once before any worker starts. A scene that
/// fails anyway is logged and the job produces no tiles.
///
/// Returns false when the receiving side has gone away.
pub fn run_job(scene: &Scene, job: &RenderJob, results: &Sender<WorkerMessage>) -> bool {
    let shader = match Shader::for_scene(scene, job.size.x, job.size.y, job.shading.clone()) {
        Ok(shader) => shader,
        Err(e) => {
            log::error!("Frame {}: cannot render scene '{}': {}", job.frame, scene.name, e);
            return true;
        }
    };

    for tile in job.assigned_tiles() {
        let data = render_tile(&tile, &shader, job.size.x, job.size.y);
        let message = WorkerMessage::RaytraceResult(TileResult {
            frame: job.frame,
            tile_index: tile.index,
            data,
            start_x: tile.x,
            start_y: tile.y,
        });
        if results.send(message).is_err() {
            return false;
        }
    }
    true
}

/// A handle whose thread has already exited, as if it had panicked.
#[cfg(test)]
pub(crate) fn exited_worker(id: usize) -> WorkerHandle {
    let (commands, _queue) = mpsc::sync_channel(JOB_QUEUE_DEPTH);
    let thread = thread::spawn(|| {});
    while !thread.is_finished() {
        thread::yield_now();
    }
    WorkerHandle { id, commands, thread }
}
