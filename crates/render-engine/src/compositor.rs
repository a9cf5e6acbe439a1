//! Frame compositor: source draw plus burned-in overlay text.
//!
//! Every call builds a fresh buffer. The compositor holds only its font
//! and style, so rendering the same inputs twice yields identical pixels.

use chrono::{DateTime, FixedOffset};
use image::imageops::{self, FilterType};
use image::{GrayImage, Rgba, RgbaImage};
use imageproc::distance_transform::Norm;
use photostamp_common::{AppConfig, PhotostampError, PhotostampResult};
use photostamp_photo_model::{OutputMode, Photo, RenderSettings};

use crate::geometry::{compute_fit_rect, Rect};
use crate::overlay::{build_overlay_lines, compute_font_size, layout_overlay, OverlayLayout, TextAlign};
use crate::text::OverlayFont;

/// Visual parameters of the overlay text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    pub fill: [u8; 3],
    pub stroke_alpha: f32,
    /// Outline width as a fraction of the font size.
    pub stroke_width_ratio: f64,
    pub shadow_alpha: f32,
    /// Canvas-style shadow blur; the Gaussian sigma is half of it.
    pub shadow_blur: f32,
    pub shadow_offset: (i64, i64),
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            fill: [255, 255, 255],
            stroke_alpha: 0.95,
            stroke_width_ratio: 1.0 / 6.0,
            shadow_alpha: 0.9,
            shadow_blur: 6.0,
            shadow_offset: (2, 2),
        }
    }
}

/// Decoded source pixels plus the metadata the overlay needs.
#[derive(Debug, Clone, Copy)]
pub struct SourceFrame<'a> {
    pub pixels: &'a RgbaImage,
    pub width: u32,
    pub height: u32,
    pub mirrored: bool,
    pub timestamp: DateTime<FixedOffset>,
}

impl<'a> SourceFrame<'a> {
    pub fn new(pixels: &'a RgbaImage, timestamp: DateTime<FixedOffset>) -> Self {
        Self {
            pixels,
            width: pixels.width(),
            height: pixels.height(),
            mirrored: false,
            timestamp,
        }
    }

    pub fn mirrored(mut self, mirrored: bool) -> Self {
        self.mirrored = mirrored;
        self
    }
}

/// Stateless renderer for composited photos.
#[derive(Debug, Default)]
pub struct Compositor {
    font: OverlayFont,
    style: OverlayStyle,
}

impl Compositor {
    pub fn new(font: OverlayFont) -> Self {
        Self {
            font,
            style: OverlayStyle::default(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(OverlayFont::from_config(&config.font))
    }

    pub fn with_style(mut self, style: OverlayStyle) -> Self {
        self.style = style;
        self
    }

    pub fn font(&self) -> &OverlayFont {
        &self.font
    }

    /// Overlay characters for `timestamp` that the font cannot draw.
    pub fn missing_glyphs(
        &self,
        timestamp: &DateTime<FixedOffset>,
        settings: &RenderSettings,
    ) -> Vec<char> {
        let lines = build_overlay_lines(timestamp, settings.timestamp_format, &settings.location);
        self.font.missing_glyphs(&lines.concat())
    }

    /// Log a warning when the overlay will show placeholder glyphs.
    pub fn warn_missing_glyphs(&self, timestamp: &DateTime<FixedOffset>, settings: &RenderSettings) {
        let missing = self.missing_glyphs(timestamp, settings);
        if !missing.is_empty() {
            let sample: String = missing.iter().take(8).collect();
            tracing::warn!(
                font = self.font.name(),
                format = %settings.timestamp_format,
                missing = missing.len(),
                sample = %sample,
                "Overlay font lacks glyphs; they render as '?'. Set font.path to a font that covers them"
            );
        }
    }

    /// Render `frame` at `scale` times the declared output size.
    pub fn render_composite(
        &self,
        frame: &SourceFrame<'_>,
        settings: &RenderSettings,
        scale: f64,
    ) -> RgbaImage {
        let (output_w, output_h) = settings.output_size(frame.width, frame.height);
        let canvas_w = scaled_dimension(output_w, scale);
        let canvas_h = scaled_dimension(output_h, scale);
        let mut canvas = RgbaImage::from_pixel(canvas_w, canvas_h, Rgba([0, 0, 0, 255]));

        self.draw_source(&mut canvas, frame, settings);

        let lines = build_overlay_lines(
            &frame.timestamp,
            settings.timestamp_format,
            &settings.location,
        );
        let font_size = compute_font_size(
            output_w,
            output_h,
            settings.font_mode,
            settings.font_auto_scale,
            settings.font_fixed_px,
        ) * scale;
        let padding = settings.overlay_padding as f64 * scale;
        let layout = layout_overlay(
            &lines,
            settings.overlay_position,
            padding,
            font_size,
            canvas_w,
            canvas_h,
        );
        self.draw_overlay(&mut canvas, &layout);

        canvas
    }

    /// Decode `photo` and render it.
    pub fn render_photo(
        &self,
        photo: &Photo,
        settings: &RenderSettings,
        scale: f64,
    ) -> PhotostampResult<RgbaImage> {
        let pixels = decode_photo(photo)?;
        let frame = SourceFrame::new(&pixels, photo.time_value).mirrored(photo.mirrored);
        Ok(self.render_composite(&frame, settings, scale))
    }

    /// Render `photo` reduced so its longer side is at most `max_px`.
    pub fn render_preview(
        &self,
        photo: &Photo,
        settings: &RenderSettings,
        max_px: u32,
    ) -> PhotostampResult<RgbaImage> {
        let (output_w, output_h) = settings.output_size(photo.width, photo.height);
        let scale = preview_scale(output_w, output_h, max_px);
        tracing::debug!(scale, output_w, output_h, "Rendering preview");
        self.render_photo(photo, settings, scale)
    }

    fn draw_source(&self, canvas: &mut RgbaImage, frame: &SourceFrame<'_>, settings: &RenderSettings) {
        let (source_w, source_h) = frame.pixels.dimensions();
        if source_w == 0 || source_h == 0 {
            tracing::warn!("Empty source frame; drawing overlay only");
            return;
        }
        let (canvas_w, canvas_h) = canvas.dimensions();

        let (src, dst) = match settings.output_mode {
            OutputMode::Original => (Rect::full(source_w, source_h), Rect::full(canvas_w, canvas_h)),
            OutputMode::Preset => {
                let placement =
                    compute_fit_rect(source_w, source_h, canvas_w, canvas_h, settings.fit_mode);
                (placement.src, placement.dst)
            }
        };
        let src = src.snap(source_w, source_h);
        let dst = dst.snap(canvas_w, canvas_h);

        let crop = imageops::crop_imm(frame.pixels, src.x, src.y, src.width, src.height).to_image();
        let mut scaled = if (crop.width(), crop.height()) == (dst.width, dst.height) {
            crop
        } else {
            imageops::resize(&crop, dst.width, dst.height, FilterType::Triangle)
        };

        let mut x = dst.x;
        if frame.mirrored {
            imageops::flip_horizontal_in_place(&mut scaled);
            x = canvas_w - dst.x - dst.width;
        }
        draw_over(canvas, &scaled, x, dst.y);
    }

    fn draw_overlay(&self, canvas: &mut RgbaImage, layout: &OverlayLayout) {
        if layout.lines.is_empty() || layout.font_size <= 0.0 {
            return;
        }

        let widths: Vec<f64> = layout
            .lines
            .iter()
            .map(|line| self.font.measure(&line.text, layout.font_size))
            .collect();
        let lefts: Vec<f64> = layout
            .lines
            .iter()
            .zip(&widths)
            .map(|(line, width)| match line.align {
                TextAlign::Left => line.anchor_x,
                TextAlign::Right => line.anchor_x - width,
            })
            .collect();

        let block_left = lefts.iter().copied().fold(f64::INFINITY, f64::min);
        let block_right = lefts
            .iter()
            .zip(&widths)
            .map(|(left, width)| left + width)
            .fold(f64::NEG_INFINITY, f64::max);
        let block_top = layout.lines[0].top_y;

        let stroke_radius = (layout.font_size * self.style.stroke_width_ratio / 2.0)
            .round()
            .clamp(1.0, 255.0) as u8;
        let sigma = (self.style.shadow_blur / 2.0).max(0.1);
        let margin = stroke_radius as f64 + (3.0 * sigma as f64).ceil() + 2.0;

        // Masks cover only the text block, with room for outline and blur.
        let origin_x = (block_left - margin).floor() as i64;
        let origin_y = (block_top - margin).floor() as i64;
        let mask_w = (block_right - block_left + 2.0 * margin).ceil().max(1.0) as u32;
        let mask_h = (layout.total_height + 2.0 * margin).ceil().max(1.0) as u32;

        let mut fill = GrayImage::new(mask_w, mask_h);
        for (line, left) in layout.lines.iter().zip(&lefts) {
            self.font.draw_line(
                &mut fill,
                &line.text,
                layout.font_size,
                left - origin_x as f64,
                line.top_y - origin_y as f64,
            );
        }
        let stroke = imageproc::morphology::dilate(&fill, Norm::L2, stroke_radius);
        let shadow = imageproc::filter::gaussian_blur_f32(&stroke, sigma);

        let (dx, dy) = self.style.shadow_offset;
        blend_mask(canvas, &shadow, origin_x + dx, origin_y + dy, [0, 0, 0], self.style.shadow_alpha);
        blend_mask(canvas, &stroke, origin_x, origin_y, [0, 0, 0], self.style.stroke_alpha);
        blend_mask(canvas, &fill, origin_x, origin_y, self.style.fill, 1.0);
    }
}

/// Source-over draw of `layer` at (`x0`, `y0`); the canvas stays opaque.
fn draw_over(canvas: &mut RgbaImage, layer: &RgbaImage, x0: u32, y0: u32) {
    for (lx, ly, src) in layer.enumerate_pixels() {
        let (x, y) = (x0 + lx, y0 + ly);
        if x >= canvas.width() || y >= canvas.height() {
            continue;
        }
        let dst = canvas.get_pixel_mut(x, y);
        match src.0[3] {
            255 => *dst = *src,
            0 => {}
            a => {
                let a = a as f32 / 255.0;
                for c in 0..3 {
                    let blended = src.0[c] as f32 * a + dst.0[c] as f32 * (1.0 - a);
                    dst.0[c] = blended.round() as u8;
                }
                dst.0[3] = 255;
            }
        }
    }
}

/// Alpha-blend `color` into `canvas` through `mask` placed at (`x0`, `y0`).
fn blend_mask(canvas: &mut RgbaImage, mask: &GrayImage, x0: i64, y0: i64, color: [u8; 3], alpha: f32) {
    let (canvas_w, canvas_h) = (canvas.width() as i64, canvas.height() as i64);
    for (mx, my, coverage) in mask.enumerate_pixels() {
        if coverage.0[0] == 0 {
            continue;
        }
        let x = x0 + mx as i64;
        let y = y0 + my as i64;
        if x < 0 || y < 0 || x >= canvas_w || y >= canvas_h {
            continue;
        }
        let a = alpha * coverage.0[0] as f32 / 255.0;
        let pixel = canvas.get_pixel_mut(x as u32, y as u32);
        for c in 0..3 {
            let blended = color[c] as f32 * a + pixel.0[c] as f32 * (1.0 - a);
            pixel.0[c] = blended.round().clamp(0.0, 255.0) as u8;
        }
        pixel.0[3] = 255;
    }
}

fn scaled_dimension(size: u32, scale: f64) -> u32 {
    (size as f64 * scale).round().max(1.0) as u32
}

/// Scale that fits an output of `output_w`×`output_h` within `max_px`.
pub fn preview_scale(output_w: u32, output_h: u32, max_px: u32) -> f64 {
    let longest = output_w.max(output_h);
    if longest == 0 || longest <= max_px {
        1.0
    } else {
        max_px as f64 / longest as f64
    }
}

/// Decode a photo's encoded bytes to RGBA pixels.
pub fn decode_photo(photo: &Photo) -> PhotostampResult<RgbaImage> {
    let image = image::load_from_memory(photo.encoded()).map_err(|e| {
        PhotostampError::decode(format!("Failed to decode {}: {e}", photo.source_name()))
    })?;
    Ok(image.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use photostamp_photo_model::{FitMode, OverlayCorner, PresetSize, TimestampFormat};

    fn timestamp() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-03-09T14:05:59+07:00").unwrap()
    }

    fn split_source(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, _| {
            if x < width / 2 {
                Rgba([200, 0, 0, 255])
            } else {
                Rgba([0, 0, 200, 255])
            }
        })
    }

    fn original_settings() -> RenderSettings {
        RenderSettings {
            output_mode: OutputMode::Original,
            ..RenderSettings::default()
        }
    }

    #[test]
    fn test_output_matches_declared_size() {
        let source = split_source(400, 300);
        let frame = SourceFrame::new(&source, timestamp());
        let compositor = Compositor::default();

        let preset = compositor.render_composite(&frame, &RenderSettings::default(), 1.0);
        assert_eq!(preset.dimensions(), (1080, 2340));

        let original = compositor.render_composite(&frame, &original_settings(), 1.0);
        assert_eq!(original.dimensions(), (400, 300));

        let scaled = compositor.render_composite(&frame, &original_settings(), 0.5);
        assert_eq!(scaled.dimensions(), (200, 150));
    }

    #[test]
    fn test_render_is_deterministic() {
        let source = split_source(320, 240);
        let frame = SourceFrame::new(&source, timestamp());
        let compositor = Compositor::default();
        let settings = RenderSettings {
            preset_size: PresetSize::new(360, 780),
            ..RenderSettings::default()
        };
        let a = compositor.render_composite(&frame, &settings, 1.0);
        let b = compositor.render_composite(&frame, &settings, 1.0);
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn test_contain_leaves_black_letterbox() {
        let source = split_source(400, 300);
        let frame = SourceFrame::new(&source, timestamp());
        let settings = RenderSettings {
            preset_size: PresetSize::new(300, 600),
            fit_mode: FitMode::Contain,
            overlay_position: OverlayCorner::BottomRight,
            ..RenderSettings::default()
        };
        let out = Compositor::default().render_composite(&frame, &settings, 1.0);
        // Source fills 300x225 centered vertically; top band stays black.
        assert_eq!(out.get_pixel(150, 10).0, [0, 0, 0, 255]);
        let inside = out.get_pixel(10, 300).0;
        assert!(inside[0] > 190 && inside[2] < 10, "{inside:?}");
    }

    #[test]
    fn test_mirroring_flips_source_not_overlay() {
        let source = split_source(200, 100);
        let plain = SourceFrame::new(&source, timestamp());
        let mirrored = plain.mirrored(true);
        let compositor = Compositor::default();
        let settings = original_settings();

        let a = compositor.render_composite(&plain, &settings, 1.0);
        let b = compositor.render_composite(&mirrored, &settings, 1.0);
        assert_eq!(a.get_pixel(190, 5).0, [0, 0, 200, 255]);
        assert_eq!(b.get_pixel(190, 5).0, [200, 0, 0, 255]);
        assert_eq!(b.get_pixel(5, 5).0, [0, 0, 200, 255]);
    }

    #[test]
    fn test_overlay_is_drawn_in_configured_corner() {
        let source = RgbaImage::from_pixel(400, 400, Rgba([40, 40, 40, 255]));
        let frame = SourceFrame::new(&source, timestamp());
        let settings = RenderSettings {
            output_mode: OutputMode::Original,
            overlay_position: OverlayCorner::TopLeft,
            ..RenderSettings::default()
        };
        let out = Compositor::default().render_composite(&frame, &settings, 1.0);

        let has_white = |x0: u32, y0: u32, x1: u32, y1: u32| {
            (y0..y1).any(|y| (x0..x1).any(|x| out.get_pixel(x, y).0 == [255, 255, 255, 255]))
        };
        assert!(has_white(0, 0, 400, 100));
        assert!(!has_white(0, 300, 400, 400));
    }

    fn white_bounds(image: &RgbaImage) -> Option<(u32, u32, u32, u32)> {
        image
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0 == [255, 255, 255, 255])
            .fold(None, |acc, (x, y, _)| match acc {
                None => Some((x, y, x, y)),
                Some((x0, y0, x1, y1)) => Some((x0.min(x), y0.min(y), x1.max(x), y1.max(y))),
            })
    }

    fn uniform_top_left_settings() -> RenderSettings {
        RenderSettings {
            output_mode: OutputMode::Original,
            overlay_position: OverlayCorner::TopLeft,
            overlay_padding: 24,
            timestamp_format: TimestampFormat::Iso,
            ..RenderSettings::default()
        }
    }

    #[test]
    fn test_reduced_render_scales_overlay_with_canvas() {
        let source = RgbaImage::from_pixel(800, 800, Rgba([40, 40, 40, 255]));
        let frame = SourceFrame::new(&source, timestamp());
        let settings = uniform_top_left_settings();
        let compositor = Compositor::default();

        let full = compositor.render_composite(&frame, &settings, 1.0);
        let half = compositor.render_composite(&frame, &settings, 0.5);
        let (fx0, fy0, fx1, fy1) = white_bounds(&full).unwrap();
        let (hx0, hy0, hx1, hy1) = white_bounds(&half).unwrap();

        // Padding 24 and font 22 px at full size become 12 and 11 px.
        assert!(fx0 >= 24 && fy0 >= 24, "full origin ({fx0}, {fy0})");
        let close = |full: u32, half: u32| (full as i64 - 2 * half as i64).abs() <= 4;
        assert!(close(fx0, hx0) && close(fy0, hy0), "origin {fx0},{fy0} vs {hx0},{hy0}");
        assert!(close(fx1 - fx0, hx1 - hx0), "width {} vs {}", fx1 - fx0, hx1 - hx0);
        assert!(close(fy1 - fy0, hy1 - hy0), "height {} vs {}", fy1 - fy0, hy1 - hy0);
    }

    #[test]
    fn test_mirrored_frame_keeps_overlay_readable() {
        let source = RgbaImage::from_pixel(400, 300, Rgba([40, 40, 40, 255]));
        let plain = SourceFrame::new(&source, timestamp());
        let settings = uniform_top_left_settings();
        let compositor = Compositor::default();

        let a = compositor.render_composite(&plain, &settings, 1.0);
        let b = compositor.render_composite(&plain.mirrored(true), &settings, 1.0);
        let (x0, _, x1, _) = white_bounds(&a).unwrap();
        assert!(x0 < 200 && x1 > x0);
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn test_missing_glyphs_follow_timestamp_format() {
        let compositor = Compositor::default();
        let iso = uniform_top_left_settings();
        assert!(compositor.missing_glyphs(&timestamp(), &iso).is_empty());

        let thai = RenderSettings::default();
        let missing = compositor.missing_glyphs(&timestamp(), &thai);
        assert!(missing.contains(&'ส'), "{missing:?}");
    }

    #[test]
    fn test_preview_scale() {
        assert_eq!(preview_scale(1080, 2340, 600), 600.0 / 2340.0);
        assert_eq!(preview_scale(400, 300, 600), 1.0);
        assert_eq!(preview_scale(0, 0, 600), 1.0);
    }
}
