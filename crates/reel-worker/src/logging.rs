//! Structured job logging utilities.

use tracing::{error, info, warn, Span};

use reel_models::{JobId, VideoId};

/// Job logger for structured logging with consistent formatting.
///
/// Every event carries the job id, the video id and the operation name.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: JobId,
    video_id: VideoId,
    operation: String,
}

impl JobLogger {
    pub fn new(job_id: JobId, video_id: VideoId, operation: &str) -> Self {
        Self {
            job_id,
            video_id,
            operation: operation.to_string(),
        }
    }

    /// Log the start of a job operation.
    pub fn log_start(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            video_id = %self.video_id,
            operation = %self.operation,
            "Job started: {}", message
        );
    }

    /// Log a progress update during job execution.
    pub fn log_progress(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            video_id = %self.video_id,
            operation = %self.operation,
            "Job progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            job_id = %self.job_id,
            video_id = %self.video_id,
            operation = %self.operation,
            "Job warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            job_id = %self.job_id,
            video_id = %self.video_id,
            operation = %self.operation,
            "Job error: {}", message
        );
    }

    /// Log the completion of a job operation.
    pub fn log_completion(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            video_id = %self.video_id,
            operation = %self.operation,
            "Job completed: {}", message
        );
    }

    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    pub fn video_id(&self) -> VideoId {
        self.video_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Create a tracing span for this job.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "job",
            job_id = %self.job_id,
            video_id = %self.video_id,
            operation = %self.operation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_logger_creation() {
        let logger = JobLogger::new(JobId(4), VideoId(9), "video_processing");

        assert_eq!(logger.job_id(), JobId(4));
        assert_eq!(logger.video_id(), VideoId(9));
        assert_eq!(logger.operation(), "video_processing");
    }
}
