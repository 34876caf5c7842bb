//! Video repository.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::models::{JobRow, VideoRow};
use crate::pool::DbPool;
use reel_models::{
    FileInfo, JobId, JobStatus, NewVideo, ProcessingJob, Video, VideoId, VideoStatus,
};

/// One page of videos plus the unpaged match count.
#[derive(Debug, Clone)]
pub struct VideoPage {
    pub videos: Vec<Video>,
    pub total: i64,
}

/// Persistence for videos and their processing jobs.
#[derive(Clone)]
pub struct VideoRepository {
    pool: DbPool,
}

impl VideoRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Round-trip to the database.
    pub async fn ping(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Insert a video and its first pending job in one transaction.
    pub async fn create(
        &self,
        new_video: &NewVideo,
        file: &FileInfo,
    ) -> DbResult<(Video, ProcessingJob)> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let video_id = sqlx::query(
            r#"
            INSERT INTO videos (
                title, file_path, thumbnail_path, content_type, size_bytes,
                status, upload_completed, processing_completed,
                created_at, updated_at, video_uuid, parts_count
            )
            VALUES (?, ?, '', ?, ?, ?, 1, 0, ?, ?, ?, ?)
            "#,
        )
        .bind(&new_video.title)
        .bind(&file.url)
        .bind(&file.content_type)
        .bind(file.size_bytes)
        .bind(VideoStatus::Processing.as_str())
        .bind(now)
        .bind(now)
        .bind(&new_video.video_uuid)
        .bind(new_video.parts_count)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        let job_id = sqlx::query(
            r#"
            INSERT INTO video_processing_jobs (video_id, job_status, started_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(video_id)
        .bind(JobStatus::Pending.as_str())
        .bind(now)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        tx.commit().await?;

        info!(video_id, job_id, "Created video and processing job");

        let video = Video {
            id: VideoId(video_id),
            title: new_video.title.clone(),
            file_path: file.url.clone(),
            thumbnail_path: String::new(),
            content_type: file.content_type.clone(),
            size_bytes: file.size_bytes,
            duration: None,
            status: VideoStatus::Processing,
            upload_completed: true,
            processing_completed: false,
            created_at: now,
            updated_at: now,
            video_uuid: new_video.video_uuid.clone(),
            parts_count: new_video.parts_count,
        };
        let job = ProcessingJob {
            id: JobId(job_id),
            video_id: VideoId(video_id),
            job_status: JobStatus::Pending,
            error_message: None,
            started_at: Some(now),
            completed_at: None,
            created_at: now,
            updated_at: now,
        };

        Ok((video, job))
    }

    /// Add another pending job for an existing video.
    pub async fn create_job(&self, video_id: VideoId) -> DbResult<ProcessingJob> {
        let now = Utc::now();
        let job_id = sqlx::query(
            r#"
            INSERT INTO video_processing_jobs (video_id, job_status, started_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(video_id.get())
        .bind(JobStatus::Pending.as_str())
        .bind(now)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                DbError::not_found("Video", video_id.get())
            }
            other => DbError::Sqlx(other),
        })?
        .last_insert_rowid();

        self.get_job(JobId(job_id)).await
    }

    pub async fn get(&self, id: VideoId) -> DbResult<Video> {
        sqlx::query_as::<_, VideoRow>("SELECT * FROM videos WHERE id = ?")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Video", id.get()))?
            .try_into()
    }

    pub async fn get_job(&self, id: JobId) -> DbResult<ProcessingJob> {
        sqlx::query_as::<_, JobRow>("SELECT * FROM video_processing_jobs WHERE id = ?")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Job", id.get()))?
            .try_into()
    }

    /// Newest-first page of videos, optionally filtered by status.
    pub async fn list(
        &self,
        skip: i64,
        limit: i64,
        status: Option<VideoStatus>,
    ) -> DbResult<VideoPage> {
        let status = status.map(|s| s.as_str());

        let rows = sqlx::query_as::<_, VideoRow>(
            r#"
            SELECT * FROM videos
            WHERE (?1 IS NULL OR status = ?1)
            ORDER BY created_at DESC, id DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(status)
        .bind(limit)
        .bind(skip)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM videos WHERE (?1 IS NULL OR status = ?1)")
                .bind(status)
                .fetch_one(&self.pool)
                .await?;

        let videos = rows
            .into_iter()
            .map(Video::try_from)
            .collect::<DbResult<Vec<_>>>()?;

        debug!(skip, limit, returned = videos.len(), total, "Listed videos");
        Ok(VideoPage { videos, total })
    }

    /// Remove a video and all of its jobs.
    pub async fn delete(&self, id: VideoId) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let jobs = sqlx::query("DELETE FROM video_processing_jobs WHERE video_id = ?")
            .bind(id.get())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let videos = sqlx::query("DELETE FROM videos WHERE id = ?")
            .bind(id.get())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if videos == 0 {
            tx.rollback().await?;
            return Err(DbError::not_found("Video", id.get()));
        }

        tx.commit().await?;
        info!(video_id = id.get(), jobs, "Deleted video");
        Ok(())
    }

    /// Most recently created job of a video.
    pub async fn latest_job(&self, video_id: VideoId) -> DbResult<Option<ProcessingJob>> {
        sqlx::query_as::<_, JobRow>(
            r#"
            SELECT * FROM video_processing_jobs
            WHERE video_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(video_id.get())
        .fetch_optional(&self.pool)
        .await?
        .map(ProcessingJob::try_from)
        .transpose()
    }

    /// All jobs of a video, newest first.
    pub async fn list_jobs(&self, video_id: VideoId) -> DbResult<Vec<ProcessingJob>> {
        sqlx::query_as::<_, JobRow>(
            r#"
            SELECT * FROM video_processing_jobs
            WHERE video_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(video_id.get())
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(ProcessingJob::try_from)
        .collect()
    }

    /// Move a job to `processing`.
    pub async fn mark_job_processing(&self, job_id: JobId) -> DbResult<()> {
        let affected = sqlx::query(
            "UPDATE video_processing_jobs SET job_status = ?, updated_at = ? WHERE id = ?",
        )
        .bind(JobStatus::Processing.as_str())
        .bind(Utc::now())
        .bind(job_id.get())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(DbError::not_found("Job", job_id.get()));
        }
        Ok(())
    }

    /// Record a successful run.
    ///
    /// The video and the job are committed separately; a crash in between
    /// leaves a ready video whose job still reads `processing`.
    pub async fn complete_processing(
        &self,
        video_id: VideoId,
        job_id: JobId,
        thumbnail_url: &str,
        duration: i64,
    ) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE videos SET
                thumbnail_path = ?,
                duration = ?,
                status = ?,
                processing_completed = 1,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(thumbnail_url)
        .bind(duration)
        .bind(VideoStatus::Ready.as_str())
        .bind(now)
        .bind(video_id.get())
        .execute(&self.pool)
        .await?;

        self.finish_job(job_id, JobStatus::Completed, None, now)
            .await
    }

    /// Record a failed run: job first, then the video.
    pub async fn fail_processing(
        &self,
        video_id: VideoId,
        job_id: JobId,
        message: &str,
    ) -> DbResult<()> {
        let now = Utc::now();

        self.finish_job(job_id, JobStatus::Failed, Some(message), now)
            .await?;

        sqlx::query("UPDATE videos SET status = ?, updated_at = ? WHERE id = ?")
            .bind(VideoStatus::Error.as_str())
            .bind(now)
            .bind(video_id.get())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn finish_job(
        &self,
        job_id: JobId,
        status: JobStatus,
        error_message: Option<&str>,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE video_processing_jobs SET
                job_status = ?,
                error_message = COALESCE(?, error_message),
                completed_at = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(status.as_str())
        .bind(error_message)
        .bind(now)
        .bind(now)
        .bind(job_id.get())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
