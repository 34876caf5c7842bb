//! Video processing worker.
//!
//! This crate provides:
//! - Job executor consuming the in-process queue with bounded concurrency
//! - The per-video processing workflow (download, inspect, upload, record)
//! - Job-scoped structured logging
//! - Job and stage metrics
//! - Graceful shutdown

pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod metrics;
pub mod processor;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use executor::{JobExecutor, SHUTDOWN_MESSAGE};
pub use logging::JobLogger;
pub use processor::{process_video, ProcessingContext, ProcessingOutcome};
