//! Row types and their conversion into domain models.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::error::DbError;
use reel_models::{JobId, ProcessingJob, Video, VideoId};

/// Row of the `videos` table.
#[derive(Debug, Clone, FromRow)]
pub struct VideoRow {
    pub id: i64,
    pub title: String,
    pub file_path: String,
    pub thumbnail_path: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub duration: Option<i64>,
    pub status: String,
    pub upload_completed: bool,
    pub processing_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub video_uuid: Option<String>,
    pub parts_count: i64,
}

impl TryFrom<VideoRow> for Video {
    type Error = DbError;

    fn try_from(row: VideoRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse()
            .map_err(|e| DbError::InvalidData(format!("video {}: {}", row.id, e)))?;

        Ok(Video {
            id: VideoId(row.id),
            title: row.title,
            file_path: row.file_path,
            thumbnail_path: row.thumbnail_path,
            content_type: row.content_type,
            size_bytes: row.size_bytes,
            duration: row.duration,
            status,
            upload_completed: row.upload_completed,
            processing_completed: row.processing_completed,
            created_at: row.created_at,
            updated_at: row.updated_at,
            video_uuid: row.video_uuid,
            parts_count: row.parts_count,
        })
    }
}

/// Row of the `video_processing_jobs` table.
#[derive(Debug, Clone, FromRow)]
pub struct JobRow {
    pub id: i64,
    pub video_id: i64,
    pub job_status: String,
    pub error_message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<JobRow> for ProcessingJob {
    type Error = DbError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let job_status = row
            .job_status
            .parse()
            .map_err(|e| DbError::InvalidData(format!("job {}: {}", row.id, e)))?;

        Ok(ProcessingJob {
            id: JobId(row.id),
            video_id: VideoId(row.video_id),
            job_status,
            error_message: row.error_message,
            started_at: row.started_at,
            completed_at: row.completed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
