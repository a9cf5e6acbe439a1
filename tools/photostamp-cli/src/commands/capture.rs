//! Capture a still from a camera frame and export it.

use std::path::PathBuf;
use std::sync::Arc;

use photostamp_common::{AppConfig, Clock, SystemClock};
use photostamp_photo_model::{JsonFileSettingsRepository, PresetSize, SettingsRepository};
use photostamp_render_engine::{capture_frame, CaptureTime, Compositor, Exporter};

pub async fn run(
    frame: PathBuf,
    viewfinder: PresetSize,
    front: bool,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let pixels = image::open(&frame)
        .map_err(|e| anyhow::anyhow!("Failed to open frame {}: {e}", frame.display()))?
        .to_rgba8();
    println!(
        "Capturing from {} ({}x{}) into a {} viewfinder",
        frame.display(),
        pixels.width(),
        pixels.height(),
        viewfinder
    );

    let settings = JsonFileSettingsRepository::default().load();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let time = CaptureTime::from_settings(&settings, clock.now());
    let photo = capture_frame(&pixels, viewfinder.width, viewfinder.height, front, time)?;
    println!(
        "  Captured {}x{}{}",
        photo.width,
        photo.height,
        if front { " (mirrored)" } else { "" }
    );

    let exporter = Exporter::standard(
        Arc::new(Compositor::from_config(config)),
        clock,
        super::export_environment(config, None),
    );
    let exported = exporter
        .export_one(
            &photo,
            &settings.render,
            super::configured_format(config),
            config.export.jpeg_quality,
            0,
        )
        .await?;

    println!("  Saved: {} ({})", exported.path.display(), exported.method);
    Ok(())
}
