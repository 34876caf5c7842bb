//! Video metadata models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::ParseStatusError;

/// Database identifier of a registered video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct VideoId(pub i64);

impl VideoId {
    /// Get the raw row id.
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for VideoId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Video processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    /// Registered, thumbnail and duration not yet extracted
    #[default]
    Processing,
    /// Processing finished, thumbnail and duration available
    Ready,
    /// Processing failed
    Error,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Processing => "processing",
            VideoStatus::Ready => "ready",
            VideoStatus::Error => "error",
        }
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VideoStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(VideoStatus::Processing),
            "ready" => Ok(VideoStatus::Ready),
            "error" => Ok(VideoStatus::Error),
            other => Err(ParseStatusError::new("video status", other)),
        }
    }
}

/// A registered video.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Video {
    pub id: VideoId,

    pub title: String,

    /// Public URL of the source object in blob storage
    pub file_path: String,

    /// Public URL of the thumbnail; empty until processing succeeds
    pub thumbnail_path: String,

    pub content_type: String,

    pub size_bytes: i64,

    /// Duration in whole seconds
    pub duration: Option<i64>,

    pub status: VideoStatus,

    pub upload_completed: bool,

    pub processing_completed: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// External grouping identifier used by multi-part uploads
    pub video_uuid: Option<String>,

    pub parts_count: i64,
}

impl Video {
    /// Whether a thumbnail has been produced for this video.
    pub fn has_thumbnail(&self) -> bool {
        !self.thumbnail_path.is_empty()
    }
}

/// Caller-supplied fields for a new video.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct NewVideo {
    pub title: String,
    #[serde(default)]
    pub video_uuid: Option<String>,
    #[serde(default)]
    pub parts_count: i64,
}

impl NewVideo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            video_uuid: None,
            parts_count: 0,
        }
    }
}

/// Description of an object that already lives in blob storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FileInfo {
    /// Public URL of the object
    pub url: String,
    /// Path of the object inside the store (may be empty)
    pub pathname: String,
    pub content_type: String,
    pub size_bytes: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_status_round_trip() {
        for status in [VideoStatus::Processing, VideoStatus::Ready, VideoStatus::Error] {
            assert_eq!(status.as_str().parse::<VideoStatus>().unwrap(), status);
        }
        assert!("done".parse::<VideoStatus>().is_err());
    }

    #[test]
    fn test_video_status_serde() {
        let json = serde_json::to_string(&VideoStatus::Ready).unwrap();
        assert_eq!(json, "\"ready\"");
        assert_eq!(VideoStatus::default(), VideoStatus::Processing);
    }

    #[test]
    fn test_video_id_is_transparent() {
        let json = serde_json::to_string(&VideoId(42)).unwrap();
        assert_eq!(json, "42");
    }
}
