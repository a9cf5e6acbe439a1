//! Overlay text content and layout.

use chrono::{DateTime, FixedOffset};
use photostamp_photo_model::{FontMode, LocationSettings, OverlayCorner, TimestampFormat};

/// Addresses longer than this (in characters) are wrapped once.
pub const ADDRESS_WRAP_AT: usize = 50;

/// A split point at or before this index leaves the address unsplit.
const ADDRESS_MIN_SPLIT: usize = 20;

/// Auto font size as a fraction of the smaller output dimension.
const AUTO_FONT_RATIO: f64 = 0.028;

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f64 = 1.3;

/// Horizontal anchoring of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Right,
}

/// One laid-out overlay line.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedLine {
    pub text: String,
    /// Left edge for [`TextAlign::Left`], right edge for [`TextAlign::Right`].
    pub anchor_x: f64,
    pub top_y: f64,
    pub align: TextAlign,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLayout {
    pub lines: Vec<PositionedLine>,
    pub font_size: f64,
    pub line_height: f64,
    pub total_height: f64,
}

/// Text lines burned into a photo, top to bottom.
///
/// The time is always shown twice, as network and local time. Coordinates
/// and address follow when location is enabled and the data is present.
pub fn build_overlay_lines(
    timestamp: &DateTime<FixedOffset>,
    format: TimestampFormat,
    location: &LocationSettings,
) -> Vec<String> {
    let formatted = format.format(timestamp);
    let mut lines = vec![format!("Network: {formatted}"), format!("Local: {formatted}")];

    if !location.enabled {
        return lines;
    }
    if location.show_coordinates {
        if let Some((lat, lng)) = location.coordinates() {
            lines.push(format!("{lat:.6}, {lng:.6}"));
        }
    }
    if location.show_address {
        if let Some(address) = location.address() {
            lines.extend(wrap_address(address));
        }
    }
    lines
}

/// Split a long address once at the last space within the first
/// [`ADDRESS_WRAP_AT`] characters.
pub fn wrap_address(address: &str) -> Vec<String> {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= ADDRESS_WRAP_AT {
        return vec![address.to_string()];
    }
    let split = chars[..=ADDRESS_WRAP_AT].iter().rposition(|c| *c == ' ');
    match split {
        Some(mid) if mid > ADDRESS_MIN_SPLIT => vec![
            chars[..mid].iter().collect(),
            chars[mid + 1..].iter().collect(),
        ],
        _ => vec![address.to_string()],
    }
}

/// Overlay font size in output pixels.
pub fn compute_font_size(
    output_w: u32,
    output_h: u32,
    mode: FontMode,
    auto_scale: f64,
    fixed_px: u32,
) -> f64 {
    match mode {
        FontMode::Fixed => fixed_px as f64,
        FontMode::Auto => (output_w.min(output_h) as f64 * AUTO_FONT_RATIO * auto_scale).round(),
    }
}

/// Position `lines` against `corner` of a `canvas_w`×`canvas_h` canvas.
pub fn layout_overlay(
    lines: &[String],
    corner: OverlayCorner,
    padding: f64,
    font_size: f64,
    canvas_w: u32,
    canvas_h: u32,
) -> OverlayLayout {
    let line_height = font_size * LINE_HEIGHT_FACTOR;
    let total_height = lines.len() as f64 * line_height;

    let (anchor_x, align) = if corner.is_right() {
        (canvas_w as f64 - padding, TextAlign::Right)
    } else {
        (padding, TextAlign::Left)
    };
    let start_y = if corner.is_bottom() {
        canvas_h as f64 - padding - total_height
    } else {
        padding
    };

    let lines = lines
        .iter()
        .enumerate()
        .map(|(i, text)| PositionedLine {
            text: text.clone(),
            anchor_x,
            top_y: start_y + i as f64 * line_height,
            align,
        })
        .collect();

    OverlayLayout {
        lines,
        font_size,
        line_height,
        total_height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timestamp() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339("2024-03-09T14:05:59+07:00").unwrap()
    }

    fn located(address: Option<&str>) -> LocationSettings {
        LocationSettings {
            enabled: true,
            latitude: Some(13.7563),
            longitude: Some(100.5018),
            cached_address: address.map(str::to_string),
            ..LocationSettings::default()
        }
    }

    #[test]
    fn test_location_disabled_gives_two_lines() {
        let lines = build_overlay_lines(
            &timestamp(),
            TimestampFormat::Iso,
            &LocationSettings::default(),
        );
        assert_eq!(
            lines,
            vec![
                "Network: 2024-03-09 14:05:59".to_string(),
                "Local: 2024-03-09 14:05:59".to_string(),
            ]
        );
    }

    #[test]
    fn test_coordinates_only_gives_three_lines() {
        let lines = build_overlay_lines(&timestamp(), TimestampFormat::Iso, &located(None));
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "13.756300, 100.501800");
    }

    #[test]
    fn test_short_address_gives_four_lines() {
        let lines = build_overlay_lines(
            &timestamp(),
            TimestampFormat::Iso,
            &located(Some("Siam Square, Bangkok")),
        );
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[3], "Siam Square, Bangkok");
    }

    #[test]
    fn test_long_address_gives_five_lines() {
        let address = "Rama I Road, Pathum Wan, Pathum Wan District, Bangkok 10330, Thailand";
        let lines =
            build_overlay_lines(&timestamp(), TimestampFormat::Iso, &located(Some(address)));
        assert_eq!(lines.len(), 5);
        assert_eq!(format!("{} {}", lines[3], lines[4]), address);
    }

    #[test]
    fn test_hidden_flags_suppress_location_lines() {
        let mut location = located(Some("Siam Square, Bangkok"));
        location.show_coordinates = false;
        location.show_address = false;
        let lines = build_overlay_lines(&timestamp(), TimestampFormat::Iso, &location);
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_wrap_splits_at_last_space_before_limit() {
        // Space at index 48, 60 characters total.
        let address = format!("{} {}", "a".repeat(48), "b".repeat(11));
        assert_eq!(address.chars().count(), 60);
        let wrapped = wrap_address(&address);
        assert_eq!(wrapped, vec!["a".repeat(48), "b".repeat(11)]);
    }

    #[test]
    fn test_wrap_keeps_address_without_early_space() {
        let address = format!("{} {}", "a".repeat(10), "b".repeat(49));
        assert_eq!(wrap_address(&address), vec![address.clone()]);

        let no_spaces = "c".repeat(70);
        assert_eq!(wrap_address(&no_spaces), vec![no_spaces.clone()]);
    }

    #[test]
    fn test_wrap_counts_characters_not_bytes() {
        let address = format!("{} {}", "ก".repeat(30), "ข".repeat(25));
        let wrapped = wrap_address(&address);
        assert_eq!(wrapped, vec!["ก".repeat(30), "ข".repeat(25)]);
    }

    #[test]
    fn test_font_size_modes() {
        assert_eq!(compute_font_size(1080, 2340, FontMode::Auto, 1.0, 32), 30.0);
        assert_eq!(compute_font_size(1080, 2340, FontMode::Fixed, 1.0, 32), 32.0);
        assert_eq!(compute_font_size(1080, 2340, FontMode::Auto, 2.0, 32), 60.0);
    }

    #[test]
    fn test_layout_bottom_left() {
        let lines = vec!["one".to_string(), "two".to_string()];
        let layout = layout_overlay(&lines, OverlayCorner::BottomLeft, 24.0, 30.0, 1080, 2340);
        assert_eq!(layout.line_height, 39.0);
        assert_eq!(layout.total_height, 78.0);
        assert_eq!(layout.lines[0].anchor_x, 24.0);
        assert_eq!(layout.lines[0].align, TextAlign::Left);
        assert_eq!(layout.lines[0].top_y, 2340.0 - 24.0 - 78.0);
        assert_eq!(layout.lines[1].top_y, 2340.0 - 24.0 - 39.0);
    }

    #[test]
    fn test_layout_top_right() {
        let lines = vec!["one".to_string()];
        let layout = layout_overlay(&lines, OverlayCorner::TopRight, 10.0, 20.0, 500, 400);
        assert_eq!(layout.lines[0].anchor_x, 490.0);
        assert_eq!(layout.lines[0].align, TextAlign::Right);
        assert_eq!(layout.lines[0].top_y, 10.0);
    }
}
