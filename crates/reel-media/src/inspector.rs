//! Media inspection seam used by the processing workflow.

use async_trait::async_trait;
use std::path::Path;

use crate::error::MediaResult;

/// Extracts a thumbnail and a duration from a local video file.
#[async_trait]
pub trait MediaInspector: Send + Sync {
    /// Write a single scaled JPEG frame to `output_path`.
    async fn extract_thumbnail(&self, video_path: &Path, output_path: &Path) -> MediaResult<()>;

    /// Duration in whole seconds.
    async fn probe_duration(&self, video_path: &Path) -> MediaResult<u64>;
}

/// Inspector backed by the `ffmpeg` / `ffprobe` binaries on `PATH`.
#[derive(Debug, Default, Clone)]
pub struct FfmpegInspector;

impl FfmpegInspector {
    pub fn new() -> Self {
        Self
    }

    /// Fail fast when either binary is missing.
    pub fn check_available(&self) -> MediaResult<()> {
        crate::command::check_ffmpeg()?;
        crate::command::check_ffprobe()?;
        Ok(())
    }
}

#[async_trait]
impl MediaInspector for FfmpegInspector {
    async fn extract_thumbnail(&self, video_path: &Path, output_path: &Path) -> MediaResult<()> {
        crate::thumbnail::generate_thumbnail(video_path, output_path).await
    }

    async fn probe_duration(&self, video_path: &Path) -> MediaResult<u64> {
        crate::probe::probe_duration(video_path).await
    }
}
