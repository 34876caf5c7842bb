//! Shared data models for the reel backend.
//!
//! This crate provides Serde-serializable types for:
//! - Videos and their lifecycle status
//! - Processing jobs and job status
//! - Media constants shared by the worker and the API

pub mod job;
pub mod media;
pub mod utils;
pub mod video;

// Re-export common types
pub use job::{JobId, JobStatus, ProcessingJob};
pub use media::{
    content_type_for_path, DEFAULT_VIDEO_CONTENT_TYPE, THUMBNAIL_CONTENT_TYPE,
    THUMBNAIL_SCALE_WIDTH, THUMBNAIL_TIMESTAMP,
};
pub use utils::{default_title, ParseStatusError, MAX_TITLE_LEN};
pub use video::{FileInfo, NewVideo, Video, VideoId, VideoStatus};
