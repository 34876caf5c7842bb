//! Small shared helpers.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Maximum accepted video title length (characters).
pub const MAX_TITLE_LEN: usize = 255;

/// A status string that does not name a known state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseStatusError {
    kind: &'static str,
    value: String,
}

impl ParseStatusError {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// Placeholder title for registrations that did not provide one.
pub fn default_title(now: DateTime<Utc>) -> String {
    format!("Video {}", now.format("%Y-%m-%d %H:%M"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_title() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 59).unwrap();
        assert_eq!(default_title(now), "Video 2024-03-09 14:05");
    }
}
