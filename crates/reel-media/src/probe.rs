//! FFprobe duration lookup.

use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::command::{check_ffprobe, exit_message};
use crate::error::{MediaError, MediaResult};

/// Probe the container duration of a media file, in whole seconds.
///
/// A non-zero exit from ffprobe is an error. Output that does not parse as
/// a number yields 0.
pub async fn probe_duration(path: impl AsRef<Path>) -> MediaResult<u64> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    check_ffprobe()?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(MediaError::ffprobe_failed(
            exit_message(output.status, &stderr),
            (!stderr.is_empty()).then_some(stderr),
        ));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let duration = parse_duration(&stdout);
    debug!(path = %path.display(), duration, "Probed duration");

    Ok(duration)
}

/// Parse ffprobe's bare `format=duration` output, truncating to seconds.
pub fn parse_duration(raw: &str) -> u64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d >= 0.0)
        .map(|d| d.trunc() as u64)
        .unwrap_or(0)
}
