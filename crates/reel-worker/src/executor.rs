//! Job executor.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{watch, Semaphore};
use tracing::{debug, error, info, warn, Instrument};

use reel_queue::{JobReceiver, ProcessVideoJob};

use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::metrics;
use crate::processor::{process_video, ProcessingContext};

/// Error recorded on jobs still queued when the executor stops.
pub const SHUTDOWN_MESSAGE: &str = "shutdown before processing";

/// Job executor that processes jobs from the queue.
pub struct JobExecutor {
    ctx: Arc<ProcessingContext>,
    max_concurrent_jobs: usize,
    job_semaphore: Arc<Semaphore>,
    shutdown: watch::Sender<bool>,
}

impl JobExecutor {
    /// Create a new job executor.
    pub fn new(ctx: ProcessingContext) -> Self {
        let max_concurrent_jobs = ctx.config.max_concurrent_jobs.max(1);
        let job_semaphore = Arc::new(Semaphore::new(max_concurrent_jobs));
        let (shutdown, _) = watch::channel(false);

        Self {
            ctx: Arc::new(ctx),
            max_concurrent_jobs,
            job_semaphore,
            shutdown,
        }
    }

    /// Consume jobs until shutdown is signalled or every producer is gone,
    /// then wait for in-flight jobs up to the shutdown timeout.
    pub async fn run(&self, mut receiver: JobReceiver) -> WorkerResult<()> {
        info!(
            "Starting job executor with {} max concurrent jobs",
            self.max_concurrent_jobs
        );

        let mut shutdown_rx = self.shutdown.subscribe();

        loop {
            if *shutdown_rx.borrow() {
                info!("Shutdown signal received, stopping executor");
                break;
            }

            let permit = tokio::select! {
                biased;
                _ = shutdown_rx.changed() => continue,
                permit = self.job_semaphore.clone().acquire_owned() => permit
                    .map_err(|_| WorkerError::job_failed("Semaphore closed"))?,
            };

            let job = tokio::select! {
                biased;
                _ = shutdown_rx.changed() => continue,
                job = receiver.recv() => match job {
                    Some(job) => job,
                    None => {
                        info!("Job queue closed, stopping executor");
                        break;
                    }
                },
            };

            debug!(
                job_id = %job.job_id,
                video_id = %job.video_id,
                queued_ms = job.queued_for().num_milliseconds(),
                "Dequeued job"
            );

            let ctx = Arc::clone(&self.ctx);
            tokio::spawn(async move {
                let _permit = permit;
                Self::execute_job(ctx, job).await;
            });
        }

        receiver.close();
        let mut abandoned = 0usize;
        while let Some(job) = receiver.recv().await {
            warn!(
                job_id = %job.job_id,
                video_id = %job.video_id,
                "Job not started before shutdown"
            );
            if let Err(e) = self
                .ctx
                .repo
                .fail_processing(job.video_id, job.job_id, SHUTDOWN_MESSAGE)
                .await
            {
                error!(job_id = %job.job_id, "Failed to record abandoned job: {}", e);
            }
            metrics::record_job_failed("shutdown", 0.0);
            abandoned += 1;
        }
        if abandoned > 0 {
            warn!("{} queued jobs were failed at shutdown", abandoned);
        }

        info!("Waiting for in-flight jobs to complete...");
        let all_permits = self.max_concurrent_jobs as u32;
        match tokio::time::timeout(
            self.ctx.config.shutdown_timeout,
            self.job_semaphore.acquire_many(all_permits),
        )
        .await
        {
            Ok(_) => info!("Job executor stopped"),
            Err(_) => warn!(
                "Shutdown timeout elapsed with {} jobs still running",
                self.in_flight()
            ),
        }

        Ok(())
    }

    /// Execute a single job, logging and counting its outcome.
    async fn execute_job(ctx: Arc<ProcessingContext>, job: ProcessVideoJob) {
        let logger = JobLogger::new(job.job_id, job.video_id, "video_processing");
        let span = logger.create_span();
        let started = Instant::now();

        let result = process_video(&ctx, &job).instrument(span).await;
        let elapsed = started.elapsed().as_secs_f64();

        match result {
            Ok(outcome) => {
                info!(
                    job_id = %job.job_id,
                    video_id = %job.video_id,
                    duration_secs = outcome.duration_secs,
                    elapsed_secs = elapsed,
                    "Job completed successfully"
                );
                metrics::record_job_completed(elapsed);
            }
            Err(e) => {
                error!(
                    job_id = %job.job_id,
                    video_id = %job.video_id,
                    stage = e.stage(),
                    "Job failed: {}", e
                );
                metrics::record_job_failed(e.stage(), elapsed);
            }
        }
    }

    /// Number of jobs currently being processed.
    pub fn in_flight(&self) -> usize {
        self.max_concurrent_jobs - self.job_semaphore.available_permits()
    }

    /// Signal shutdown.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::tests::{register, test_context, FakeInspector, FakeStore, BASE};
    use reel_models::{JobStatus, VideoStatus};
    use reel_queue::{JobQueue, QueueConfig};
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_executor_drains_queue_then_stops() {
        let good = format!("{}/videos/good.mp4", BASE);
        let temp = TempDir::new().unwrap();
        let (ctx, _store) = test_context(
            FakeStore::with_object(&good, b"video"),
            FakeInspector {
                duration: 7,
                fail_thumbnail: false,
                fail_duration: false,
            },
            &temp,
        )
        .await;

        let ok_job = register(&ctx, &good).await;
        let bad_job = register(&ctx, &format!("{}/videos/missing.mp4", BASE)).await;
        let repo = ctx.repo.clone();

        let (queue, receiver) = JobQueue::new(QueueConfig::default());
        queue.enqueue(ok_job.clone()).await.unwrap();
        queue.enqueue(bad_job.clone()).await.unwrap();
        drop(queue);

        let executor = JobExecutor::new(ctx);
        tokio::time::timeout(Duration::from_secs(10), executor.run(receiver))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(executor.in_flight(), 0);

        assert_eq!(repo.get(ok_job.video_id).await.unwrap().status, VideoStatus::Ready);
        assert_eq!(repo.get(bad_job.video_id).await.unwrap().status, VideoStatus::Error);
        assert_eq!(
            repo.get_job(bad_job.job_id).await.unwrap().job_status,
            JobStatus::Failed
        );
    }

    #[tokio::test]
    async fn test_executor_stops_on_shutdown_signal() {
        let temp = TempDir::new().unwrap();
        let (ctx, _store) = test_context(
            FakeStore::default(),
            FakeInspector {
                duration: 0,
                fail_thumbnail: false,
                fail_duration: false,
            },
            &temp,
        )
        .await;

        let (_queue, receiver) = JobQueue::new(QueueConfig::default());
        let executor = JobExecutor::new(ctx);
        executor.shutdown();

        tokio::time::timeout(Duration::from_secs(5), executor.run(receiver))
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_queued_jobs_fail_at_shutdown() {
        let url = format!("{}/videos/a.mp4", BASE);
        let temp = TempDir::new().unwrap();
        let (ctx, store) = test_context(
            FakeStore::with_object(&url, b"video"),
            FakeInspector {
                duration: 3,
                fail_thumbnail: false,
                fail_duration: false,
            },
            &temp,
        )
        .await;

        let first = register(&ctx, &url).await;
        let second = register(&ctx, &url).await;
        let repo = ctx.repo.clone();

        let (queue, receiver) = JobQueue::new(QueueConfig::default());
        queue.enqueue(first.clone()).await.unwrap();
        queue.enqueue(second.clone()).await.unwrap();

        let executor = JobExecutor::new(ctx);
        executor.shutdown();
        tokio::time::timeout(Duration::from_secs(5), executor.run(receiver))
            .await
            .unwrap()
            .unwrap();

        for job in [first, second] {
            let stored = repo.get_job(job.job_id).await.unwrap();
            assert_eq!(stored.job_status, JobStatus::Failed);
            assert_eq!(stored.error_message.as_deref(), Some(SHUTDOWN_MESSAGE));
            assert_eq!(repo.get(job.video_id).await.unwrap().status, VideoStatus::Error);
        }
        assert!(store.uploads.lock().unwrap().is_empty());
        assert!(queue.is_closed());
    }
}
