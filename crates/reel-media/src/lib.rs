//! FFmpeg CLI wrapper for media inspection.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - Thumbnail extraction (single scaled frame)
//! - Duration probing through FFprobe
//! - The `MediaInspector` seam used by the processing workflow

pub mod command;
pub mod error;
pub mod inspector;
pub mod probe;
pub mod thumbnail;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use inspector::{FfmpegInspector, MediaInspector};
pub use probe::{parse_duration, probe_duration};
pub use thumbnail::{generate_thumbnail, thumbnail_command};
