//! Job queue backed by a bounded tokio channel.

use std::time::Duration;

use tokio::sync::mpsc::{self, error::SendTimeoutError};
use tracing::{debug, warn};

use crate::error::{QueueError, QueueResult};
use crate::job::ProcessVideoJob;

/// Gauge holding the number of jobs waiting in the queue.
pub const QUEUE_DEPTH_GAUGE: &str = "reel_queue_depth";

/// Queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Maximum number of waiting jobs
    pub capacity: usize,
    /// How long an enqueue waits for a free slot
    pub enqueue_timeout: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: 64,
            enqueue_timeout: Duration::from_secs(5),
        }
    }
}

impl QueueConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            capacity: std::env::var("QUEUE_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|c: &usize| *c > 0)
                .unwrap_or(64),
            enqueue_timeout: Duration::from_secs(
                std::env::var("QUEUE_ENQUEUE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
        }
    }
}

/// Producer side of the queue. Cheap to clone.
#[derive(Clone)]
pub struct JobQueue {
    sender: mpsc::Sender<ProcessVideoJob>,
    config: QueueConfig,
}

/// Consumer side of the queue, owned by the executor.
pub struct JobReceiver {
    receiver: mpsc::Receiver<ProcessVideoJob>,
}

impl JobQueue {
    /// Create a queue and its single consumer.
    pub fn new(config: QueueConfig) -> (Self, JobReceiver) {
        let (sender, receiver) = mpsc::channel(config.capacity.max(1));
        (Self { sender, config }, JobReceiver { receiver })
    }

    /// Enqueue a job, waiting up to the configured timeout for capacity.
    pub async fn enqueue(&self, job: ProcessVideoJob) -> QueueResult<()> {
        let video_id = job.video_id;
        let job_id = job.job_id;

        match self.sender.send_timeout(job, self.config.enqueue_timeout).await {
            Ok(()) => {
                debug!(video_id = %video_id, job_id = %job_id, "Enqueued processing job");
                self.record_depth();
                Ok(())
            }
            Err(SendTimeoutError::Timeout(_)) => {
                warn!(
                    video_id = %video_id,
                    job_id = %job_id,
                    capacity = self.capacity(),
                    "Processing queue is full"
                );
                Err(QueueError::Full)
            }
            Err(SendTimeoutError::Closed(_)) => Err(QueueError::Closed),
        }
    }

    /// Number of jobs waiting.
    pub fn len(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of waiting jobs.
    pub fn capacity(&self) -> usize {
        self.sender.max_capacity()
    }

    /// Whether at least one slot is free.
    pub fn has_capacity(&self) -> bool {
        self.sender.capacity() > 0
    }

    /// Whether the consumer has gone away.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    fn record_depth(&self) {
        metrics::gauge!(QUEUE_DEPTH_GAUGE).set(self.len() as f64);
    }
}

impl JobReceiver {
    /// Wait for the next job; `None` once every producer is dropped and the
    /// queue is drained.
    pub async fn recv(&mut self) -> Option<ProcessVideoJob> {
        let job = self.receiver.recv().await;
        if job.is_some() {
            metrics::gauge!(QUEUE_DEPTH_GAUGE).set(self.receiver.len() as f64);
        }
        job
    }

    /// Stop accepting new jobs; already queued jobs can still be received.
    pub fn close(&mut self) {
        self.receiver.close();
    }
}
