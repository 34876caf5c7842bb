//! Video API handlers.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use validator::Validate;

use reel_models::{
    content_type_for_path, default_title, FileInfo, JobStatus, NewVideo, ProcessingJob, Video,
    VideoId, VideoStatus, MAX_TITLE_LEN,
};
use reel_queue::ProcessVideoJob;
use reel_worker::metrics as job_metrics;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Registration of a video already uploaded to blob storage.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterVideoRequest {
    #[validate(url)]
    pub blob_url: String,
    #[validate(range(min = 0))]
    pub blob_size: Option<i64>,
    pub blob_pathname: Option<String>,
    /// Opaque upload-token payload echoed by the client; not interpreted
    pub token_payload: Option<String>,
    #[validate(length(max = 255))]
    pub title: Option<String>,
}

impl RegisterVideoRequest {
    /// Title to store; blank titles fall back to a dated placeholder.
    fn resolved_title(&self, now: DateTime<Utc>) -> String {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| t.chars().take(MAX_TITLE_LEN).collect())
            .unwrap_or_else(|| default_title(now))
    }

    fn file_info(&self) -> FileInfo {
        let pathname = self.blob_pathname.clone().unwrap_or_default();
        let content_type = if pathname.is_empty() {
            content_type_for_path(&self.blob_url)
        } else {
            content_type_for_path(&pathname)
        };

        FileInfo {
            url: self.blob_url.clone(),
            pathname,
            content_type: content_type.to_string(),
            size_bytes: self.blob_size.unwrap_or(0),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterVideoResponse {
    pub id: i64,
    pub title: String,
    pub message: String,
}

/// Public view of a video.
#[derive(Debug, Serialize, Deserialize)]
pub struct VideoResponse {
    pub id: i64,
    pub title: String,
    pub thumbnail_path: String,
    pub file_path: String,
    pub status: VideoStatus,
    pub duration: Option<i64>,
    pub upload_completed: bool,
    pub processing_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Video> for VideoResponse {
    fn from(video: Video) -> Self {
        Self {
            id: video.id.get(),
            title: video.title,
            thumbnail_path: video.thumbnail_path,
            file_path: video.file_path,
            status: video.status,
            duration: video.duration,
            upload_completed: video.upload_completed,
            processing_completed: video.processing_completed,
            created_at: video.created_at,
            updated_at: video.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VideoListResponse {
    pub videos: Vec<VideoResponse>,
    pub total: i64,
}

/// Latest processing job of a video.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProcessingStatusResponse {
    pub id: i64,
    pub video_id: i64,
    pub job_status: JobStatus,
    pub error_message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<ProcessingJob> for ProcessingStatusResponse {
    fn from(job: ProcessingJob) -> Self {
        Self {
            id: job.id.get(),
            video_id: job.video_id.get(),
            job_status: job.job_status,
            error_message: job.error_message,
            started_at: job.started_at,
            completed_at: job.completed_at,
        }
    }
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Deserialize, Validate)]
pub struct ListVideosQuery {
    #[serde(default)]
    #[validate(range(min = 0))]
    pub skip: i64,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: i64,
    pub status: Option<String>,
}

/// Extract a positive video id from the path.
fn video_id(path: Result<Path<i64>, PathRejection>) -> ApiResult<VideoId> {
    let Path(id) = path.map_err(|e| ApiError::validation(e.body_text()))?;
    if id < 1 {
        return Err(ApiError::validation("video_id must be greater than or equal to 1"));
    }
    Ok(VideoId(id))
}

/// Register a video that already lives in blob storage and queue it for processing.
pub async fn register_video(
    State(state): State<AppState>,
    body: Result<Json<RegisterVideoRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RegisterVideoResponse>)> {
    let Json(request) = body?;
    request.validate()?;
    info!(blob_url = %request.blob_url, "Received video registration");

    let new_video = NewVideo::new(request.resolved_title(Utc::now()));
    let file = request.file_info();

    let (video, job) = state.repo.create(&new_video, &file).await?;

    let queued = ProcessVideoJob::new(video.id, job.id, video.file_path.clone());
    if let Err(e) = state.queue.enqueue(queued).await {
        warn!(video_id = %video.id, job_id = %job.id, "Could not queue processing: {}", e);
        job_metrics::record_job_rejected("queue");
        if let Err(db_err) = state
            .repo
            .fail_processing(video.id, job.id, &e.to_string())
            .await
        {
            error!(video_id = %video.id, "Failed to record rejected job: {}", db_err);
        }
        return Err(e.into());
    }
    job_metrics::record_job_enqueued();

    info!(video_id = %video.id, job_id = %job.id, "Video registered");

    Ok((
        StatusCode::ACCEPTED,
        Json(RegisterVideoResponse {
            id: video.id.get(),
            title: video.title,
            message: "Video registration successful".to_string(),
        }),
    ))
}

/// List videos, newest first.
pub async fn list_videos(
    State(state): State<AppState>,
    query: Result<Query<ListVideosQuery>, QueryRejection>,
) -> ApiResult<Json<VideoListResponse>> {
    let Query(query) = query.map_err(|e| ApiError::validation(e.body_text()))?;
    query.validate()?;

    let status = match query.status.as_deref() {
        None | Some("") => None,
        Some(raw) => match raw.parse::<VideoStatus>() {
            Ok(status) => Some(status),
            // Stored rows only carry known statuses, so nothing can match
            Err(_) => {
                return Ok(Json(VideoListResponse {
                    videos: Vec::new(),
                    total: 0,
                }))
            }
        },
    };

    let page = state.repo.list(query.skip, query.limit, status).await?;

    Ok(Json(VideoListResponse {
        videos: page.videos.into_iter().map(VideoResponse::from).collect(),
        total: page.total,
    }))
}

/// Fetch a single video.
pub async fn get_video(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<VideoResponse>> {
    let id = video_id(path)?;
    let video = state.repo.get(id).await?;
    Ok(Json(video.into()))
}

/// Status of the most recent processing job of a video.
pub async fn get_video_status(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<ProcessingStatusResponse>> {
    let id = video_id(path)?;
    state.repo.get(id).await?;

    let job = state
        .repo
        .latest_job(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Processing job not found"))?;

    Ok(Json(job.into()))
}

/// Delete a video, its jobs, and its stored objects.
///
/// Blob deletion is best effort; rows are removed even when it fails.
pub async fn delete_video(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<StatusCode> {
    let id = video_id(path)?;
    let video = state.repo.get(id).await?;

    for url in [&video.file_path, &video.thumbnail_path] {
        if url.is_empty() {
            continue;
        }
        if !state.store.delete(url).await {
            warn!(video_id = %id, url = %url, "Blob deletion failed, continuing");
        }
    }

    state.repo.delete(id).await?;
    info!(video_id = %id, "Deleted video");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request(title: Option<&str>, pathname: Option<&str>) -> RegisterVideoRequest {
        RegisterVideoRequest {
            blob_url: "https://cdn.example.com/videos/clip.webm".to_string(),
            blob_size: Some(2048),
            blob_pathname: pathname.map(str::to_string),
            token_payload: None,
            title: title.map(str::to_string),
        }
    }

    #[test]
    fn test_resolved_title() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        assert_eq!(request(Some("  Trip "), None).resolved_title(now), "Trip");
        assert_eq!(request(Some("   "), None).resolved_title(now), "Video 2024-05-01 08:30");
        assert_eq!(request(None, None).resolved_title(now), "Video 2024-05-01 08:30");
    }

    #[test]
    fn test_file_info_content_type() {
        let info = request(None, None).file_info();
        assert_eq!(info.content_type, "video/webm");
        assert_eq!(info.pathname, "");
        assert_eq!(info.size_bytes, 2048);

        let info = request(None, Some("videos/clip.mov")).file_info();
        assert_eq!(info.content_type, "video/quicktime");
    }

    #[test]
    fn test_register_validation() {
        assert!(request(None, None).validate().is_ok());

        let mut bad = request(None, None);
        bad.blob_url = "not a url".to_string();
        assert!(bad.validate().is_err());

        let long = request(Some(&"x".repeat(256)), None);
        assert!(long.validate().is_err());
    }

    #[test]
    fn test_video_id_bounds() {
        assert_eq!(video_id(Ok(Path(1))).unwrap(), VideoId(1));
        assert!(matches!(video_id(Ok(Path(0))), Err(ApiError::Validation(_))));
    }
}
