//! Stamp images and export them.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use photostamp_common::logging::LogBuffer;
use photostamp_common::{AppConfig, Clock, SystemClock};
use photostamp_photo_model::{
    DownloadFormat, FitMode, FontMode, JsonFileSettingsRepository, OutputMode, OverlayCorner,
    PresetSize, Settings, SettingsRepository, TimeMode, TimestampFormat,
};
use photostamp_render_engine::{
    CaptureTime, Compositor, DirectoryPicker, ExportRequest, Exporter, PresetDirectoryPicker,
};

use super::picker::PromptDirectoryPicker;

#[derive(Debug, clap::Args)]
pub struct StampArgs {
    /// Images to stamp
    #[arg(required = true)]
    pub images: Vec<PathBuf>,

    /// Keep each image's own size instead of a preset
    #[arg(long, conflicts_with = "preset")]
    pub original: bool,

    /// Preset output size
    #[arg(long, value_name = "WxH")]
    pub preset: Option<PresetSize>,

    /// Fit mode for preset sizes: contain|cover
    #[arg(long)]
    pub fit: Option<FitMode>,

    /// Overlay corner: TL|TR|BL|BR
    #[arg(long)]
    pub corner: Option<OverlayCorner>,

    /// Overlay padding in output pixels
    #[arg(long)]
    pub padding: Option<u32>,

    /// Fixed overlay font size in pixels
    #[arg(long, conflicts_with = "font_scale")]
    pub font_px: Option<u32>,

    /// Automatic font size multiplier
    #[arg(long)]
    pub font_scale: Option<f64>,

    /// Output format: jpeg|png
    #[arg(long)]
    pub format: Option<DownloadFormat>,

    /// JPEG quality [0.0, 1.0]
    #[arg(long)]
    pub quality: Option<f32>,

    /// Display this time instead of the import time (RFC 3339)
    #[arg(long)]
    pub time: Option<DateTime<FixedOffset>>,

    /// Use the ISO timestamp format
    #[arg(long)]
    pub iso: bool,

    /// Latitude to show
    #[arg(long, requires = "lng", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Longitude to show
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lng: Option<f64>,

    /// Address to show below the coordinates
    #[arg(long)]
    pub address: Option<String>,

    /// Persist the resulting settings
    #[arg(long)]
    pub save_settings: bool,

    /// Write into the app export folder, as the native shell does
    #[arg(long)]
    pub native: bool,

    /// Prompt for a destination folder
    #[arg(long)]
    pub pick: bool,

    /// Destination folder for the picker tier, without prompting
    #[arg(long, conflicts_with = "pick")]
    pub dir: Option<PathBuf>,

    /// Downloads folder for archive and sequential exports
    #[arg(long)]
    pub downloads: Option<PathBuf>,
}

/// Fold command-line overrides into the saved settings.
pub fn apply_overrides(settings: &mut Settings, args: &StampArgs) {
    let render = &mut settings.render;
    if args.original {
        render.output_mode = OutputMode::Original;
    }
    if let Some(preset) = args.preset {
        render.output_mode = OutputMode::Preset;
        render.preset_size = preset;
        settings.preset_orientation = preset.orientation();
    }
    if let Some(fit) = args.fit {
        render.fit_mode = fit;
    }
    if let Some(corner) = args.corner {
        render.overlay_position = corner;
    }
    if let Some(padding) = args.padding {
        render.overlay_padding = padding;
    }
    if let Some(px) = args.font_px {
        render.font_mode = FontMode::Fixed;
        render.font_fixed_px = px;
    }
    if let Some(scale) = args.font_scale {
        render.font_mode = FontMode::Auto;
        render.font_auto_scale = scale;
    }
    if args.iso {
        render.timestamp_format = TimestampFormat::Iso;
    }
    if let (Some(lat), Some(lng)) = (args.lat, args.lng) {
        render.location.enabled = true;
        render.location.latitude = Some(lat);
        render.location.longitude = Some(lng);
    }
    if let Some(address) = &args.address {
        render.location.enabled = true;
        render.location.cached_address = Some(address.clone());
    }
    if let Some(time) = args.time {
        settings.global_time_mode = TimeMode::Custom;
        settings.global_custom_time = Some(time);
    }
}

pub async fn run(
    args: StampArgs,
    config: &AppConfig,
    log_buffer: Option<LogBuffer>,
) -> anyhow::Result<()> {
    let repo = JsonFileSettingsRepository::default();
    let mut settings = repo.load();
    apply_overrides(&mut settings, &args);
    if args.save_settings {
        repo.save(&settings)?;
        println!("Settings saved to {}", repo.path().display());
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let time = CaptureTime::from_settings(&settings, clock.now());

    println!("Stamping {} image(s)", args.images.len());
    let mut photos = Vec::with_capacity(args.images.len());
    for path in &args.images {
        let photo = super::import_file(path, time)?;
        println!("  {} ({}x{})", photo.source_name(), photo.width, photo.height);
        photos.push(photo);
    }

    let format = args.format.unwrap_or_else(|| super::configured_format(config));
    let quality = args.quality.unwrap_or(config.export.jpeg_quality);
    let (output_w, output_h) = settings.render.output_size(photos[0].width, photos[0].height);
    println!("  Output: {output_w}x{output_h} {format}");
    println!("  Time: {}", settings.time_summary());
    println!("  Location: {}", settings.render.location.summary());

    let picker: Option<Box<dyn DirectoryPicker>> = if args.pick {
        Some(Box::new(PromptDirectoryPicker))
    } else {
        args.dir
            .clone()
            .map(|dir| Box::new(PresetDirectoryPicker::new(dir)) as Box<dyn DirectoryPicker>)
    };

    let mut config = config.clone();
    config.native_shell |= args.native;
    if let Some(downloads) = &args.downloads {
        config.downloads_dir = downloads.clone();
    }
    let mut exporter = Exporter::standard(
        Arc::new(Compositor::from_config(&config)),
        clock,
        super::export_environment(&config, picker),
    );

    let request = ExportRequest {
        photos: &photos,
        settings: &settings.render,
        format,
        quality,
    };
    let outcome = exporter
        .export_all(request, |done, total| {
            print!("\r  Exported {done}/{total}");
            std::io::stdout().flush().ok();
        })
        .await;
    println!();

    if settings.show_log {
        if let Some(buffer) = &log_buffer {
            println!("Recent log:");
            for line in buffer.lines() {
                println!("  {line}");
            }
        }
    }

    if !outcome.success {
        anyhow::bail!("Export did not complete (method: {})", outcome.method);
    }
    println!("Export complete via {}", outcome.method);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: StampArgs,
    }

    fn parse(argv: &[&str]) -> StampArgs {
        Harness::parse_from(std::iter::once("stamp").chain(argv.iter().copied())).args
    }

    #[test]
    fn test_overrides_update_render_settings() {
        let args = parse(&[
            "a.jpg",
            "--preset",
            "1920x1080",
            "--fit",
            "contain",
            "--corner",
            "TR",
            "--font-px",
            "40",
            "--iso",
            "--lat",
            "-33.8688",
            "--lng",
            "151.2093",
            "--time",
            "2024-01-02T03:04:05+07:00",
        ]);
        let mut settings = Settings::default();
        apply_overrides(&mut settings, &args);

        assert_eq!(settings.render.preset_size, PresetSize::new(1920, 1080));
        assert_eq!(settings.render.fit_mode, FitMode::Contain);
        assert_eq!(settings.render.overlay_position, OverlayCorner::TopRight);
        assert_eq!(settings.render.font_mode, FontMode::Fixed);
        assert_eq!(settings.render.font_fixed_px, 40);
        assert_eq!(settings.render.timestamp_format, TimestampFormat::Iso);
        assert!(settings.render.location.enabled);
        assert_eq!(settings.render.location.latitude, Some(-33.8688));
        assert_eq!(settings.global_time_mode, TimeMode::Custom);
        assert_eq!(
            settings.preset_orientation,
            photostamp_photo_model::Orientation::Landscape
        );
    }

    #[test]
    fn test_no_overrides_keep_saved_settings() {
        let args = parse(&["a.jpg", "b.png"]);
        assert_eq!(args.images.len(), 2);
        let mut settings = Settings::default();
        apply_overrides(&mut settings, &args);
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_original_conflicts_with_preset() {
        let result = Harness::try_parse_from(["stamp", "a.jpg", "--original", "--preset", "720x1280"]);
        assert!(result.is_err());
    }
}
