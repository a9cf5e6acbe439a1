//! Encoding composited buffers to JPEG or PNG bytes.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use photostamp_common::{PhotostampError, PhotostampResult};
use photostamp_photo_model::DownloadFormat;

/// JPEG quality used for captured and imported sources.
pub const SOURCE_JPEG_QUALITY: f32 = 0.92;

/// Map a `[0, 1]` quality to the encoder's 1..=100 scale.
pub fn jpeg_quality_percent(quality: f32) -> u8 {
    if !quality.is_finite() {
        return 92;
    }
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Encode `buffer` as `format`. `quality` only affects JPEG.
pub fn encode_composite(
    buffer: &RgbaImage,
    format: DownloadFormat,
    quality: f32,
) -> PhotostampResult<Vec<u8>> {
    let (width, height) = buffer.dimensions();
    if width == 0 || height == 0 {
        return Err(PhotostampError::encode("Cannot encode an empty buffer"));
    }

    let mut bytes = Vec::new();
    match format {
        DownloadFormat::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = image::DynamicImage::ImageRgba8(buffer.clone()).to_rgb8();
            JpegEncoder::new_with_quality(Cursor::new(&mut bytes), jpeg_quality_percent(quality))
                .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
                .map_err(|e| PhotostampError::encode(format!("Failed to encode JPEG: {e}")))?;
        }
        DownloadFormat::Png => {
            PngEncoder::new(Cursor::new(&mut bytes))
                .write_image(buffer.as_raw(), width, height, ExtendedColorType::Rgba8)
                .map_err(|e| PhotostampError::encode(format!("Failed to encode PNG: {e}")))?;
        }
    }

    if bytes.is_empty() {
        return Err(PhotostampError::encode(format!(
            "{format} encoder produced no data"
        )));
    }
    tracing::debug!(%format, width, height, size = bytes.len(), "Encoded composite");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn sample() -> RgbaImage {
        RgbaImage::from_fn(64, 48, |x, y| Rgba([(x * 4) as u8, (y * 5) as u8, 90, 255]))
    }

    #[test]
    fn test_quality_mapping() {
        assert_eq!(jpeg_quality_percent(0.92), 92);
        assert_eq!(jpeg_quality_percent(0.0), 1);
        assert_eq!(jpeg_quality_percent(1.5), 100);
        assert_eq!(jpeg_quality_percent(f32::NAN), 92);
    }

    #[test]
    fn test_jpeg_output_decodes_at_same_size() {
        let bytes = encode_composite(&sample(), DownloadFormat::Jpeg, 0.92).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
    }

    #[test]
    fn test_png_is_lossless() {
        let image = sample();
        let bytes = encode_composite(&image, DownloadFormat::Png, 0.1).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded, image);
    }

    #[test]
    fn test_lower_quality_is_smaller() {
        let noisy = RgbaImage::from_fn(128, 128, |x, y| {
            Rgba([((x * 31 + y * 17) % 256) as u8, ((x * y) % 256) as u8, (y * 2) as u8, 255])
        });
        let high = encode_composite(&noisy, DownloadFormat::Jpeg, 0.95).unwrap();
        let low = encode_composite(&noisy, DownloadFormat::Jpeg, 0.2).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn test_empty_buffer_is_an_encode_error() {
        let empty = RgbaImage::new(0, 0);
        assert!(matches!(
            encode_composite(&empty, DownloadFormat::Png, 1.0),
            Err(PhotostampError::Encode { .. })
        ));
    }
}
