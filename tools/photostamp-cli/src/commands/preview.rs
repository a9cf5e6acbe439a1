//! Render a reduced preview of one image.

use std::path::PathBuf;

use photostamp_common::{AppConfig, Clock, SystemClock};
use photostamp_photo_model::{DownloadFormat, JsonFileSettingsRepository, SettingsRepository};
use photostamp_render_engine::{encode_composite, CaptureTime, Compositor};

pub fn run(
    image: PathBuf,
    output: PathBuf,
    max: Option<u32>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let settings = JsonFileSettingsRepository::default().load();
    let time = CaptureTime::from_settings(&settings, SystemClock.now());
    let photo = super::import_file(&image, time)?;

    let max_px = max.unwrap_or(config.export.preview_max_px).max(1);
    let compositor = Compositor::from_config(config);
    compositor.warn_missing_glyphs(&photo.time_value, &settings.render);
    let preview = compositor.render_preview(&photo, &settings.render, max_px)?;
    let bytes = encode_composite(&preview, DownloadFormat::Png, 1.0)?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&output, bytes)?;

    println!(
        "Preview {}x{} written to {}",
        preview.width(),
        preview.height(),
        output.display()
    );
    Ok(())
}
