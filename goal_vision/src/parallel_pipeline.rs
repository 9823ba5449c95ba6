// THEORY:
// Frames are independent of one another: no stage keeps state between frames,
// so a stream of frames can be spread across every core. The `ParallelPipeline`
// is the multi-frame front end of the goal finder.
//
// Architecture:
// 1.  **Shared Pipeline**: One immutable `GoalPipeline` sits behind an `Arc` and is
//     shared by all workers. There are no locks on the hot path.
// 2.  **Dispatcher**: A single task receives frames and hands them to the workers
//     round-robin over unbounded mpsc channels.
// 3.  **Workers**: Each worker runs the synchronous pipeline on the blocking pool so
//     CPU-bound detection never stalls the async executor. Results travel back to
//     the caller over a oneshot channel.
// 4.  **Ordering**: `process_batch` awaits every frame of a batch together and
//     returns results in the order the frames were given, whichever worker
//     finished first.

use crate::core_modules::Frame;
use crate::core_modules::angle::AngleResult;
use crate::error::{Result, VisionError};
use crate::pipeline::{GoalPipeline, frame_from_buffer};
use futures::future::join_all;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};

#[derive(Debug, Clone)]
pub struct FrameBuffer {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub frame_id: u64,
    pub timestamp: Instant,
}

/// Detection result for one frame submitted to the pool.
#[derive(Debug)]
pub struct FrameOutcome {
    pub frame_id: u64,
    pub result: Result<AngleResult>,
    /// Time from submission until the worker finished the frame.
    pub latency: Duration,
}

pub struct FrameTask {
    pub frame_buffer: FrameBuffer,
    pub result_sender: oneshot::Sender<FrameOutcome>,
}

pub struct WorkerPool {
    task_sender: mpsc::UnboundedSender<FrameTask>,
    workers: Vec<tokio::task::JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `worker_count` workers (at least one) plus the dispatcher. Must be
    /// called from within a tokio runtime.
    pub fn new(pipeline: Arc<GoalPipeline>, worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<FrameTask>();
        let mut workers = Vec::with_capacity(worker_count);

        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..worker_count)
            .map(|_| mpsc::unbounded_channel::<FrameTask>())
            .unzip();

        // Spawn dispatcher
        tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(task) = task_receiver.recv().await {
                if worker_senders[worker_idx].send(task).is_err() {
                    log::warn!("frame worker {worker_idx} has stopped");
                }
                worker_idx = (worker_idx + 1) % worker_count;
            }
        });

        // Spawn workers
        for mut worker_receiver in worker_receivers {
            let worker_pipeline = Arc::clone(&pipeline);

            let worker = tokio::spawn(async move {
                while let Some(task) = worker_receiver.recv().await {
                    let outcome =
                        Self::process_frame_worker(Arc::clone(&worker_pipeline), task.frame_buffer)
                            .await;
                    // The caller may have given up on this frame.
                    let _ = task.result_sender.send(outcome);
                }
            });

            workers.push(worker);
        }

        Self {
            task_sender,
            workers,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    async fn process_frame_worker(
        pipeline: Arc<GoalPipeline>,
        frame_buffer: FrameBuffer,
    ) -> FrameOutcome {
        let frame_id = frame_buffer.frame_id;
        let timestamp = frame_buffer.timestamp;

        let result = tokio::task::spawn_blocking(move || {
            let FrameBuffer {
                data, width, height, ..
            } = frame_buffer;
            let frame = frame_from_buffer(width, height, &data)?;
            pipeline.detect(&frame)
        })
        .await
        .unwrap_or_else(|error| {
            log::error!("frame {frame_id} worker task failed: {error}");
            Err(VisionError::WorkerUnavailable)
        });

        FrameOutcome {
            frame_id,
            result,
            latency: timestamp.elapsed(),
        }
    }

    pub async fn process_frame(&self, frame_buffer: FrameBuffer) -> Result<FrameOutcome> {
        let (result_sender, result_receiver) = oneshot::channel();

        let task = FrameTask {
            frame_buffer,
            result_sender,
        };

        self.task_sender
            .send(task)
            .map_err(|_| VisionError::WorkerUnavailable)?;

        result_receiver.await.map_err(|_| VisionError::WorkerUnavailable)
    }
}

pub struct ParallelPipeline {
    worker_pool: WorkerPool,
    frame_counter: AtomicU64,
}

impl ParallelPipeline {
    /// One worker per logical CPU.
    pub fn new(pipeline: GoalPipeline) -> Self {
        Self::with_workers(pipeline, num_cpus::get())
    }

    pub fn with_workers(pipeline: GoalPipeline, worker_count: usize) -> Self {
        let worker_pool = WorkerPool::new(Arc::new(pipeline), worker_count);
        log::info!("parallel pipeline started with {} workers", worker_pool.worker_count());
        Self {
            worker_pool,
            frame_counter: AtomicU64::new(0),
        }
    }

    pub fn worker_count(&self) -> usize {
        self.worker_pool.worker_count()
    }

    /// Submits a packed RGB8 buffer. The outer `Result` fails only when the pool
    /// itself is gone; detection failures are in `FrameOutcome::result`.
    pub async fn process_frame(
        &self,
        width: u32,
        height: u32,
        frame_data: &[u8],
    ) -> Result<FrameOutcome> {
        let frame_id = self.frame_counter.fetch_add(1, Ordering::Relaxed);
        let frame_buffer = FrameBuffer {
            data: frame_data.to_vec(),
            width,
            height,
            frame_id,
            timestamp: Instant::now(),
        };
        self.worker_pool.process_frame(frame_buffer).await
    }

    pub async fn process_image(&self, frame: &Frame) -> Result<FrameOutcome> {
        self.process_frame(frame.width(), frame.height(), frame.as_raw()).await
    }

    /// Runs all frames concurrently; results come back in input order.
    pub async fn process_batch(&self, frames: &[Frame]) -> Vec<Result<FrameOutcome>> {
        join_all(frames.iter().map(|frame| self.process_image(frame))).await
    }
}
