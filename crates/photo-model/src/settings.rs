//! Render and application settings.
//!
//! [`RenderSettings`] is the immutable value handed to every render call.
//! [`Settings`] is what gets persisted: the render settings plus capture-time
//! defaults and UI flags. Every field has a default so partially stored
//! documents load field-by-field.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::timestamp::{format_iso, TimestampFormat};

/// Error returned when parsing a setting value from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value:?}")]
pub struct ParseSettingError {
    kind: &'static str,
    value: String,
}

impl ParseSettingError {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// How the output size is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Output matches the source dimensions.
    Original,
    /// Output uses [`RenderSettings::preset_size`].
    #[default]
    Preset,
}

/// How a source is placed into a preset canvas of a different aspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitMode {
    /// Whole source visible, letterboxed.
    Contain,
    /// Canvas fully covered, source cropped symmetrically.
    #[default]
    Cover,
}

impl FromStr for FitMode {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "contain" => Ok(Self::Contain),
            "cover" => Ok(Self::Cover),
            _ => Err(ParseSettingError::new("fit mode", s)),
        }
    }
}

/// Corner the overlay block is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OverlayCorner {
    #[serde(rename = "TL")]
    TopLeft,
    #[serde(rename = "TR")]
    TopRight,
    #[default]
    #[serde(rename = "BL")]
    BottomLeft,
    #[serde(rename = "BR")]
    BottomRight,
}

impl OverlayCorner {
    pub fn is_right(self) -> bool {
        matches!(self, Self::TopRight | Self::BottomRight)
    }

    pub fn is_bottom(self) -> bool {
        matches!(self, Self::BottomLeft | Self::BottomRight)
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::TopLeft => "TL",
            Self::TopRight => "TR",
            Self::BottomLeft => "BL",
            Self::BottomRight => "BR",
        }
    }
}

impl FromStr for OverlayCorner {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tl" | "top-left" => Ok(Self::TopLeft),
            "tr" | "top-right" => Ok(Self::TopRight),
            "bl" | "bottom-left" => Ok(Self::BottomLeft),
            "br" | "bottom-right" => Ok(Self::BottomRight),
            _ => Err(ParseSettingError::new("overlay corner", s)),
        }
    }
}

/// Overlay font sizing rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontMode {
    /// Proportional to the smaller output dimension.
    #[default]
    Auto,
    /// A fixed pixel size.
    Fixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Which time new photos display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeMode {
    /// The capture/import instant.
    #[default]
    Now,
    /// A user-chosen time.
    Custom,
}

impl TimeMode {
    /// Pick the display time for a photo created at `now`.
    ///
    /// A custom mode without a stored custom time falls back to `now`.
    pub fn resolve(
        self,
        custom: Option<DateTime<FixedOffset>>,
        now: DateTime<FixedOffset>,
    ) -> DateTime<FixedOffset> {
        match self {
            Self::Now => now,
            Self::Custom => custom.unwrap_or(now),
        }
    }
}

/// Encoded export format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadFormat {
    /// Lossy; honours the quality parameter.
    #[default]
    Jpeg,
    /// Lossless; quality is ignored.
    Png,
}

impl DownloadFormat {
    /// File extension used for exported files.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    pub fn is_lossy(self) -> bool {
        matches!(self, Self::Jpeg)
    }
}

impl fmt::Display for DownloadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
        })
    }
}

impl FromStr for DownloadFormat {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            _ => Err(ParseSettingError::new("download format", s)),
        }
    }
}

/// Fixed output resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetSize {
    pub width: u32,
    pub height: u32,
}

impl PresetSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn orientation(self) -> Orientation {
        if self.width > self.height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }
}

impl Default for PresetSize {
    fn default() -> Self {
        Self::new(1080, 2340)
    }
}

impl fmt::Display for PresetSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for PresetSize {
    type Err = ParseSettingError;

    /// Parses `WIDTHxHEIGHT` (also accepts `×`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseSettingError::new("preset size", s);
        let normalized = s.trim().to_ascii_lowercase().replace('×', "x");
        let (w, h) = normalized.split_once('x').ok_or_else(err)?;
        let width = w.trim().parse::<u32>().map_err(|_| err())?;
        let height = h.trim().parse::<u32>().map_err(|_| err())?;
        if width == 0 || height == 0 {
            return Err(err());
        }
        Ok(Self { width, height })
    }
}

/// A named entry of the preset table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresetOption {
    pub label: &'static str,
    pub size: PresetSize,
    pub orientation: Orientation,
}

/// Available preset sizes, portrait first.
pub const PRESET_SIZES: &[PresetOption] = &[
    PresetOption {
        label: "Full HD+ (1080×2340)",
        size: PresetSize::new(1080, 2340),
        orientation: Orientation::Portrait,
    },
    PresetOption {
        label: "Full HD (1080×1920)",
        size: PresetSize::new(1080, 1920),
        orientation: Orientation::Portrait,
    },
    PresetOption {
        label: "HD (720×1280)",
        size: PresetSize::new(720, 1280),
        orientation: Orientation::Portrait,
    },
    PresetOption {
        label: "Square (1080×1080)",
        size: PresetSize::new(1080, 1080),
        orientation: Orientation::Portrait,
    },
    PresetOption {
        label: "Full HD+ (2340×1080)",
        size: PresetSize::new(2340, 1080),
        orientation: Orientation::Landscape,
    },
    PresetOption {
        label: "Full HD (1920×1080)",
        size: PresetSize::new(1920, 1080),
        orientation: Orientation::Landscape,
    },
    PresetOption {
        label: "HD (1280×720)",
        size: PresetSize::new(1280, 720),
        orientation: Orientation::Landscape,
    },
    PresetOption {
        label: "Square (1080×1080)",
        size: PresetSize::new(1080, 1080),
        orientation: Orientation::Landscape,
    },
];

/// Presets available for one orientation.
pub fn presets_for(orientation: Orientation) -> impl Iterator<Item = &'static PresetOption> {
    PRESET_SIZES
        .iter()
        .filter(move |preset| preset.orientation == orientation)
}

/// Location data and display flags for the overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationSettings {
    pub enabled: bool,
    pub show_coordinates: bool,
    pub show_address: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Reverse-geocoded address supplied by the geocoding collaborator.
    pub cached_address: Option<String>,
}

impl Default for LocationSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            show_coordinates: true,
            show_address: true,
            latitude: None,
            longitude: None,
            cached_address: None,
        }
    }
}

impl LocationSettings {
    /// Both coordinates, when present.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }

    /// The cached address, ignoring empty strings.
    pub fn address(&self) -> Option<&str> {
        self.cached_address.as_deref().filter(|a| !a.is_empty())
    }

    /// Short human-readable summary for settings screens.
    pub fn summary(&self) -> String {
        if !self.enabled {
            return "ปิด".to_string();
        }
        let Some((lat, lng)) = self.coordinates() else {
            return "ยังไม่ได้ระบุ".to_string();
        };
        match self.address() {
            Some(address) if address.chars().count() > 30 => {
                format!("{}...", address.chars().take(30).collect::<String>())
            }
            Some(address) => address.to_string(),
            None => format!("{lat:.6}, {lng:.6}"),
        }
    }
}

/// Everything a render call needs besides the photo itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub output_mode: OutputMode,
    pub preset_size: PresetSize,
    pub fit_mode: FitMode,
    pub overlay_position: OverlayCorner,
    /// Distance of the overlay block from the canvas edges, in output pixels.
    pub overlay_padding: u32,
    pub font_mode: FontMode,
    pub font_auto_scale: f64,
    pub font_fixed_px: u32,
    pub timestamp_format: TimestampFormat,
    pub location: LocationSettings,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            output_mode: OutputMode::Preset,
            preset_size: PresetSize::default(),
            fit_mode: FitMode::Cover,
            overlay_position: OverlayCorner::BottomLeft,
            overlay_padding: 24,
            font_mode: FontMode::Auto,
            font_auto_scale: 1.0,
            font_fixed_px: 32,
            timestamp_format: TimestampFormat::ThaiVerbose,
            location: LocationSettings::default(),
        }
    }
}

impl RenderSettings {
    /// Declared output size for a source of the given dimensions.
    pub fn output_size(&self, source_width: u32, source_height: u32) -> (u32, u32) {
        match self.output_mode {
            OutputMode::Original => (source_width, source_height),
            OutputMode::Preset => (self.preset_size.width, self.preset_size.height),
        }
    }
}

/// Persisted application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub global_time_mode: TimeMode,
    /// Used when `global_time_mode` is `custom`.
    pub global_custom_time: Option<DateTime<FixedOffset>>,
    pub preset_orientation: Orientation,
    #[serde(flatten)]
    pub render: RenderSettings,
    pub show_log: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            global_time_mode: TimeMode::Now,
            global_custom_time: None,
            preset_orientation: Orientation::Portrait,
            render: RenderSettings::default(),
            show_log: false,
        }
    }
}

impl Settings {
    /// Display time for a photo created at `now`.
    pub fn resolve_time(&self, now: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
        self.global_time_mode.resolve(self.global_custom_time, now)
    }

    /// Short human-readable summary of the time mode.
    pub fn time_summary(&self) -> String {
        match (self.global_time_mode, self.global_custom_time) {
            (TimeMode::Custom, Some(custom)) => format_iso(&custom),
            _ => "ใช้เวลาปัจจุบัน".to_string(),
        }
    }
}
