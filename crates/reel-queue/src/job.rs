//! Job payloads.

use chrono::{DateTime, Utc};

use reel_models::{JobId, VideoId};

/// Job to extract the thumbnail and duration of a registered video.
#[derive(Debug, Clone)]
pub struct ProcessVideoJob {
    /// Processing job row driven by this run
    pub job_id: JobId,
    /// Video ID
    pub video_id: VideoId,
    /// Storage URL of the source video
    pub file_path: String,
    /// When the API handed the job to the queue
    pub enqueued_at: DateTime<Utc>,
}

impl ProcessVideoJob {
    pub fn new(video_id: VideoId, job_id: JobId, file_path: impl Into<String>) -> Self {
        Self {
            job_id,
            video_id,
            file_path: file_path.into(),
            enqueued_at: Utc::now(),
        }
    }

    /// Time spent waiting in the queue so far.
    pub fn queued_for(&self) -> chrono::Duration {
        Utc::now() - self.enqueued_at
    }
}
