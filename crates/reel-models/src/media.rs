//! Media constants shared by the worker and the API.

use std::path::Path;

/// Thumbnail generation settings
pub const THUMBNAIL_SCALE_WIDTH: u32 = 320;
pub const THUMBNAIL_TIMESTAMP: &str = "00:00:01";
pub const THUMBNAIL_CONTENT_TYPE: &str = "image/jpeg";

/// Content type assumed when the upload carries no usable extension
pub const DEFAULT_VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Guess a video content type from a blob pathname or URL.
pub fn content_type_for_path(path: &str) -> &'static str {
    // Drop query string / fragment so signed URLs still resolve
    let path = path.split(['?', '#']).next().unwrap_or(path);

    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("mp4") | Some("m4v") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("avi") => "video/x-msvideo",
        _ => DEFAULT_VIDEO_CONTENT_TYPE,
    }
}
