//! Video processing workflow.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tempfile::NamedTempFile;

use reel_db::VideoRepository;
use reel_media::{MediaError, MediaInspector};
use reel_models::THUMBNAIL_CONTENT_TYPE;
use reel_queue::ProcessVideoJob;
use reel_storage::{thumbnail_key, Access, BlobStore};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::metrics;

/// Shared collaborators for every workflow run.
pub struct ProcessingContext {
    pub config: WorkerConfig,
    pub store: Arc<dyn BlobStore>,
    pub inspector: Arc<dyn MediaInspector>,
    pub repo: VideoRepository,
}

impl ProcessingContext {
    pub fn new(
        config: WorkerConfig,
        store: Arc<dyn BlobStore>,
        inspector: Arc<dyn MediaInspector>,
        repo: VideoRepository,
    ) -> Self {
        Self {
            config,
            store,
            inspector,
            repo,
        }
    }
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingOutcome {
    pub thumbnail_url: String,
    pub duration_secs: u64,
}

/// Run the processing workflow for one registered video.
///
/// Any failure after the job enters `processing` is recorded on the job and
/// the video before the error is returned.
pub async fn process_video(
    ctx: &ProcessingContext,
    job: &ProcessVideoJob,
) -> WorkerResult<ProcessingOutcome> {
    let logger = JobLogger::new(job.job_id, job.video_id, "video_processing");

    ctx.repo.mark_job_processing(job.job_id).await?;
    logger.log_start(&job.file_path);

    match run_stages(ctx, job, &logger).await {
        Ok(outcome) => {
            // Video and job commit separately
            ctx.repo
                .complete_processing(
                    job.video_id,
                    job.job_id,
                    &outcome.thumbnail_url,
                    outcome.duration_secs as i64,
                )
                .await?;

            logger.log_completion(&format!(
                "thumbnail={} duration={}s",
                outcome.thumbnail_url, outcome.duration_secs
            ));
            Ok(outcome)
        }
        Err(e) => {
            let message = e.to_string();
            logger.log_error(&message);

            if let Err(db_err) = ctx
                .repo
                .fail_processing(job.video_id, job.job_id, &message)
                .await
            {
                logger.log_error(&format!("Failed to record job failure: {}", db_err));
            }

            Err(e)
        }
    }
}

/// Download, inspect, upload. Temp files are removed when this returns.
async fn run_stages(
    ctx: &ProcessingContext,
    job: &ProcessVideoJob,
    logger: &JobLogger,
) -> WorkerResult<ProcessingOutcome> {
    let start = Instant::now();
    let bytes = ctx
        .store
        .download(&job.file_path)
        .await
        .map_err(WorkerError::download_failed)?;
    metrics::record_download_duration(start.elapsed().as_secs_f64());
    logger.log_progress(&format!("Downloaded {} bytes", bytes.len()));

    tokio::fs::create_dir_all(&ctx.config.temp_dir).await?;

    let video_file = temp_file(&ctx.config.temp_dir, &video_suffix(&job.file_path))?;
    tokio::fs::write(video_file.path(), &bytes).await?;
    drop(bytes);

    let thumb_file = temp_file(&ctx.config.temp_dir, ".jpg")?;

    let start = Instant::now();
    ctx.inspector
        .extract_thumbnail(video_file.path(), thumb_file.path())
        .await
        .map_err(|e| {
            log_tool_stderr(logger, &e);
            WorkerError::thumbnail_failed(e)
        })?;
    metrics::record_ffmpeg_duration("thumbnail", start.elapsed().as_secs_f64());

    let start = Instant::now();
    let duration_secs = ctx
        .inspector
        .probe_duration(video_file.path())
        .await
        .map_err(|e| {
            log_tool_stderr(logger, &e);
            WorkerError::duration_failed(e)
        })?;
    metrics::record_ffmpeg_duration("duration", start.elapsed().as_secs_f64());
    logger.log_progress(&format!("Extracted thumbnail, duration {}s", duration_secs));

    let thumbnail = tokio::fs::read(thumb_file.path()).await?;
    let key = thumbnail_key(job.video_id);

    let start = Instant::now();
    let uploaded = ctx
        .store
        .upload(thumbnail, &key, THUMBNAIL_CONTENT_TYPE, Access::Public)
        .await
        .map_err(WorkerError::upload_failed)?;
    metrics::record_upload_duration(start.elapsed().as_secs_f64());

    Ok(ProcessingOutcome {
        thumbnail_url: uploaded.url,
        duration_secs,
    })
}

/// The stored error keeps only the last stderr line; log the rest.
fn log_tool_stderr(logger: &JobLogger, err: &MediaError) {
    if let Some(stderr) = err.stderr() {
        logger.log_warning(&format!("tool stderr:\n{}", stderr));
    }
}

fn temp_file(dir: &Path, suffix: &str) -> WorkerResult<NamedTempFile> {
    Ok(tempfile::Builder::new()
        .prefix("reel-")
        .suffix(suffix)
        .tempfile_in(dir)?)
}

/// Keep the source extension so ffmpeg can sniff the container.
fn video_suffix(file_path: &str) -> String {
    let path = file_path.split(['?', '#']).next().unwrap_or(file_path);
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 5 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{}", e))
        .unwrap_or_else(|| ".mp4".to_string())
}
