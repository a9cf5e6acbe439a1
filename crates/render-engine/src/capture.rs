//! Building [`Photo`] values from camera frames and imported files.

use chrono::{DateTime, FixedOffset};
use image::imageops;
use image::RgbaImage;
use photostamp_common::{PhotostampError, PhotostampResult};
use photostamp_photo_model::{DownloadFormat, Photo, PhotoOrigin, Settings, TimeMode};

use crate::encode::{encode_composite, SOURCE_JPEG_QUALITY};
use crate::geometry::compute_cover_crop;

/// Creation instant and display-time rule for a new photo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureTime {
    pub mode: TimeMode,
    pub custom: Option<DateTime<FixedOffset>>,
    pub now: DateTime<FixedOffset>,
}

impl CaptureTime {
    pub fn now(now: DateTime<FixedOffset>) -> Self {
        Self {
            mode: TimeMode::Now,
            custom: None,
            now,
        }
    }

    pub fn from_settings(settings: &Settings, now: DateTime<FixedOffset>) -> Self {
        Self {
            mode: settings.global_time_mode,
            custom: settings.global_custom_time,
            now,
        }
    }

    fn apply(&self, photo: Photo) -> Photo {
        let value = self.mode.resolve(self.custom, self.now);
        photo.with_time(self.mode, value)
    }
}

/// Capture a still from a live camera frame.
///
/// The frame is cover-cropped to the viewfinder's aspect ratio at the
/// frame's native resolution. A zero viewfinder size keeps the whole frame.
/// Front-camera captures are stored mirrored.
pub fn capture_frame(
    frame: &RgbaImage,
    viewfinder_w: u32,
    viewfinder_h: u32,
    front_camera: bool,
    time: CaptureTime,
) -> PhotostampResult<Photo> {
    let (frame_w, frame_h) = frame.dimensions();
    if frame_w == 0 || frame_h == 0 {
        return Err(PhotostampError::render("Camera frame is empty"));
    }
    let (target_w, target_h) = if viewfinder_w == 0 || viewfinder_h == 0 {
        (frame_w, frame_h)
    } else {
        (viewfinder_w, viewfinder_h)
    };

    let crop = compute_cover_crop(frame_w, frame_h, target_w, target_h).snap(frame_w, frame_h);
    let mut still = imageops::crop_imm(frame, crop.x, crop.y, crop.width, crop.height).to_image();
    if front_camera {
        imageops::flip_horizontal_in_place(&mut still);
    }

    let encoded = encode_composite(&still, DownloadFormat::Jpeg, SOURCE_JPEG_QUALITY)?;
    tracing::info!(
        width = crop.width,
        height = crop.height,
        front_camera,
        "Captured frame"
    );
    let photo = Photo::new(encoded, crop.width, crop.height, PhotoOrigin::Camera, time.now)
        .mirrored(front_camera);
    Ok(time.apply(photo))
}

/// Import an image file's bytes as a photo.
///
/// The image is re-encoded as JPEG, which drops any embedded metadata.
pub fn import_image(bytes: &[u8], file_name: &str, time: CaptureTime) -> PhotostampResult<Photo> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| PhotostampError::decode(format!("Failed to decode {file_name}: {e}")))?
        .to_rgba8();
    let (width, height) = decoded.dimensions();
    let encoded = encode_composite(&decoded, DownloadFormat::Jpeg, SOURCE_JPEG_QUALITY)?;
    tracing::info!(file = file_name, width, height, "Imported image");

    let photo = Photo::new(
        encoded,
        width,
        height,
        PhotoOrigin::Imported {
            file_name: file_name.to_string(),
        },
        time.now,
    );
    Ok(time.apply(photo))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn test_capture_crops_to_viewfinder_aspect() {
        let frame = RgbaImage::from_pixel(1280, 720, Rgba([10, 20, 30, 255]));
        let now = at("2024-03-09T14:05:59+07:00");
        let photo = capture_frame(&frame, 390, 844, false, CaptureTime::now(now)).unwrap();
        assert_eq!(photo.height, 720);
        assert_eq!(photo.width, (720.0_f64 * 390.0 / 844.0).round() as u32);
        assert!(!photo.mirrored);
        assert_eq!(photo.origin, PhotoOrigin::Camera);
        assert_eq!(photo.time_value, now);

        let decoded = image::load_from_memory(photo.encoded()).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (photo.width, photo.height));
    }

    #[test]
    fn test_capture_zero_viewfinder_keeps_frame() {
        let frame = RgbaImage::from_pixel(64, 48, Rgba([0, 0, 0, 255]));
        let now = at("2024-03-09T14:05:59+07:00");
        let photo = capture_frame(&frame, 0, 0, true, CaptureTime::now(now)).unwrap();
        assert_eq!((photo.width, photo.height), (64, 48));
        assert!(photo.mirrored);
    }

    #[test]
    fn test_front_camera_flips_pixels() {
        let frame = RgbaImage::from_fn(64, 32, |x, _| {
            if x < 32 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        });
        let now = at("2024-03-09T14:05:59+07:00");
        let photo = capture_frame(&frame, 64, 32, true, CaptureTime::now(now)).unwrap();
        let decoded = image::load_from_memory(photo.encoded()).unwrap().to_rgba8();
        let left = decoded.get_pixel(4, 16).0;
        assert!(left[2] > 200 && left[0] < 50, "{left:?}");
    }

    #[test]
    fn test_custom_time_mode_applies_to_new_photos() {
        let frame = RgbaImage::from_pixel(32, 32, Rgba([0, 0, 0, 255]));
        let now = at("2024-03-09T14:05:59+07:00");
        let custom = at("2020-01-01T08:00:00+07:00");
        let time = CaptureTime {
            mode: TimeMode::Custom,
            custom: Some(custom),
            now,
        };
        let photo = capture_frame(&frame, 32, 32, false, time).unwrap();
        assert_eq!(photo.created_at, now);
        assert_eq!(photo.time_value, custom);
        assert_eq!(photo.time_mode, TimeMode::Custom);
    }

    #[test]
    fn test_import_reencodes_as_jpeg() {
        let source = RgbaImage::from_pixel(40, 30, Rgba([120, 130, 140, 255]));
        let mut png = Vec::new();
        source
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let now = at("2024-03-09T14:05:59+07:00");
        let photo = import_image(&png, "shot.png", CaptureTime::now(now)).unwrap();
        assert_eq!((photo.width, photo.height), (40, 30));
        assert_eq!(&photo.encoded()[..2], &[0xFF, 0xD8]);
        assert_eq!(photo.source_name(), "shot.png");
        assert!(!photo.mirrored);
    }

    #[test]
    fn test_import_rejects_garbage() {
        let now = at("2024-03-09T14:05:59+07:00");
        let result = import_image(b"not an image", "junk.bin", CaptureTime::now(now));
        assert!(matches!(result, Err(PhotostampError::Decode { .. })));
    }
}
