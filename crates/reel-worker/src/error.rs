//! Worker error types.

use std::fmt::Display;
use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Failed to download video: {0}")]
    DownloadFailed(String),

    #[error("Failed to create thumbnail: {0}")]
    ThumbnailFailed(String),

    #[error("Failed to get video duration: {0}")]
    DurationFailed(String),

    #[error("Failed to upload thumbnail: {0}")]
    UploadFailed(String),

    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Database error: {0}")]
    Database(#[from] reel_db::DbError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn download_failed(err: impl Display) -> Self {
        Self::DownloadFailed(err.to_string())
    }

    pub fn thumbnail_failed(err: impl Display) -> Self {
        Self::ThumbnailFailed(err.to_string())
    }

    pub fn duration_failed(err: impl Display) -> Self {
        Self::DurationFailed(err.to_string())
    }

    pub fn upload_failed(err: impl Display) -> Self {
        Self::UploadFailed(err.to_string())
    }

    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }

    /// Stage label used for metrics.
    pub fn stage(&self) -> &'static str {
        match self {
            WorkerError::DownloadFailed(_) => "download",
            WorkerError::ThumbnailFailed(_) => "thumbnail",
            WorkerError::DurationFailed(_) => "duration",
            WorkerError::UploadFailed(_) => "upload",
            WorkerError::Database(_) => "database",
            WorkerError::Io(_) => "io",
            _ => "other",
        }
    }
}
