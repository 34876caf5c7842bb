//! Bounded in-process job queue.
//!
//! This crate provides:
//! - Job enqueueing with backpressure (bounded channel, enqueue timeout)
//! - A single consumer handle for the worker executor
//! - Queue depth gauge

pub mod error;
pub mod job;
pub mod queue;

pub use error::{QueueError, QueueResult};
pub use job::ProcessVideoJob;
pub use queue::{JobQueue, JobReceiver, QueueConfig, QUEUE_DEPTH_GAUGE};
