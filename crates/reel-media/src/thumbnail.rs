//! Thumbnail generation.

use std::path::Path;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use reel_models::{THUMBNAIL_SCALE_WIDTH, THUMBNAIL_TIMESTAMP};

/// Build the ffmpeg invocation for a single scaled JPEG frame.
pub fn thumbnail_command(video_path: &Path, output_path: &Path) -> FfmpegCommand {
    // -1 keeps the aspect ratio
    let filter = format!("scale={}:-1", THUMBNAIL_SCALE_WIDTH);

    FfmpegCommand::new(video_path, output_path)
        .seek_to(THUMBNAIL_TIMESTAMP)
        .single_frame()
        .video_filter(filter)
        .log_level("error")
}

/// Generate a thumbnail from a video file.
pub async fn generate_thumbnail(
    video_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
) -> MediaResult<()> {
    let video_path = video_path.as_ref();
    let output_path = output_path.as_ref();

    if !video_path.exists() {
        return Err(MediaError::FileNotFound(video_path.to_path_buf()));
    }

    let cmd = thumbnail_command(video_path, output_path);

    FfmpegRunner::new().run(&cmd).await?;

    let written = tokio::fs::metadata(output_path)
        .await
        .map(|m| m.len() > 0)
        .unwrap_or(false);
    if !written {
        // ffmpeg exits 0 without writing a frame when the seek lands past the end
        return Err(MediaError::ffmpeg_failed(
            "no frame written at the thumbnail offset",
            None,
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbnail_filter() {
        let args = thumbnail_command(Path::new("in.mp4"), Path::new("out.jpg")).build_args();
        assert!(args.contains(&"scale=320:-1".to_string()));
        assert!(args.contains(&"-vframes".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("out.jpg"));
    }
}
