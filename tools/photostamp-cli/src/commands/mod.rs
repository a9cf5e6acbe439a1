pub mod capture;
pub mod check;
pub mod picker;
pub mod presets;
pub mod preview;
pub mod settings;
pub mod stamp;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use photostamp_common::AppConfig;
use photostamp_photo_model::{DownloadFormat, Photo};
use photostamp_render_engine::{
    import_image, CaptureTime, DirectoryPicker, ExportEnvironment, FolderDownloader,
};

/// Read and import one image file.
pub(crate) fn import_file(path: &Path, time: CaptureTime) -> anyhow::Result<Photo> {
    let bytes = std::fs::read(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(import_image(&bytes, &name, time)?)
}

/// Default export format from the config, falling back to JPEG.
pub(crate) fn configured_format(config: &AppConfig) -> DownloadFormat {
    config.export.format.parse().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Invalid export format in config, using jpeg");
        DownloadFormat::Jpeg
    })
}

/// Export environment described by the config.
pub(crate) fn export_environment(
    config: &AppConfig,
    picker: Option<Box<dyn DirectoryPicker>>,
) -> ExportEnvironment {
    ExportEnvironment {
        native_dir: config
            .native_shell
            .then(|| config.app_export_dir.clone()),
        downloader: Arc::new(FolderDownloader::new(config.downloads_dir.clone())),
        picker,
        sequential_delay: Duration::from_millis(config.export.sequential_delay_ms),
    }
}
