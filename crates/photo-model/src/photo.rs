//! Captured or imported photo.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::settings::TimeMode;

/// Where a photo came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PhotoOrigin {
    Camera,
    Imported { file_name: String },
}

/// An encoded source image plus its display metadata.
///
/// Photos are values: editing the display time produces a new `Photo`
/// sharing the same encoded bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Photo {
    encoded: Arc<[u8]>,
    pub width: u32,
    pub height: u32,
    pub created_at: DateTime<FixedOffset>,
    pub time_mode: TimeMode,
    /// Timestamp burned into the overlay.
    pub time_value: DateTime<FixedOffset>,
    /// Front-facing capture; the source is drawn flipped.
    pub mirrored: bool,
    pub origin: PhotoOrigin,
}

impl Photo {
    /// A photo whose display time is its creation time.
    pub fn new(
        encoded: impl Into<Arc<[u8]>>,
        width: u32,
        height: u32,
        origin: PhotoOrigin,
        created_at: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            encoded: encoded.into(),
            width,
            height,
            created_at,
            time_mode: TimeMode::Now,
            time_value: created_at,
            mirrored: false,
            origin,
        }
    }

    pub fn mirrored(mut self, mirrored: bool) -> Self {
        self.mirrored = mirrored;
        self
    }

    pub fn with_time(mut self, mode: TimeMode, value: DateTime<FixedOffset>) -> Self {
        self.time_mode = mode;
        self.time_value = value;
        self
    }

    /// Copy of this photo showing a user-edited display time.
    pub fn with_time_value(&self, value: DateTime<FixedOffset>) -> Photo {
        Photo {
            time_mode: TimeMode::Custom,
            time_value: value,
            ..self.clone()
        }
    }

    /// Encoded image bytes (JPEG for captured and imported photos).
    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    pub fn source_name(&self) -> &str {
        match &self.origin {
            PhotoOrigin::Camera => "camera",
            PhotoOrigin::Imported { file_name } => file_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn test_new_photo_displays_creation_time() {
        let created = at("2024-03-09T14:05:59+07:00");
        let photo = Photo::new(vec![1u8, 2, 3], 640, 480, PhotoOrigin::Camera, created);
        assert_eq!(photo.time_value, created);
        assert_eq!(photo.time_mode, TimeMode::Now);
        assert!(!photo.mirrored);
        assert_eq!(photo.encoded(), &[1, 2, 3]);
        assert_eq!(photo.source_name(), "camera");
    }

    #[test]
    fn test_with_time_value_leaves_original_untouched() {
        let created = at("2024-03-09T14:05:59+07:00");
        let edited = at("2023-01-01T00:00:00+07:00");
        let photo = Photo::new(
            vec![0u8; 4],
            10,
            10,
            PhotoOrigin::Imported {
                file_name: "beach.png".into(),
            },
            created,
        )
        .mirrored(true);

        let copy = photo.with_time_value(edited);
        assert_eq!(photo.time_value, created);
        assert_eq!(copy.time_value, edited);
        assert_eq!(copy.time_mode, TimeMode::Custom);
        assert!(copy.mirrored);
        assert_eq!(copy.encoded(), photo.encoded());
        assert_eq!(copy.source_name(), "beach.png");
    }
}
