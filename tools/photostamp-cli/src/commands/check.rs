//! Check fonts, folders, and export tiers.

use std::sync::Arc;

use photostamp_common::{config_file_path, AppConfig, SystemClock};
use photostamp_photo_model::JsonFileSettingsRepository;
use photostamp_render_engine::{Compositor, Exporter, PresetDirectoryPicker};

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("Photostamp System Check");
    println!("{}", "=".repeat(50));

    println!("[OK] Config: {}", config_file_path().display());
    println!(
        "[OK] Settings: {}",
        JsonFileSettingsRepository::default().path().display()
    );

    let compositor = Compositor::from_config(config);
    let font = compositor.font();
    if font.has_glyph('ก') {
        println!("[OK] Overlay font: {} (Thai supported)", font.name());
    } else {
        println!(
            "[WARN] Overlay font: {} (no Thai glyphs; set font.path for thai-verbose timestamps)",
            font.name()
        );
    }

    println!("[OK] Downloads folder: {}", config.downloads_dir.display());
    if config.native_shell {
        println!("[OK] Native shell: app folder {}", config.app_export_dir.display());
    }

    // Picker shown as available; the CLI only adds one with --pick or --dir.
    let exporter = Exporter::standard(
        Arc::new(compositor),
        Arc::new(SystemClock),
        super::export_environment(
            config,
            Some(Box::new(PresetDirectoryPicker::new(config.downloads_dir.clone()))),
        ),
    );
    println!();
    println!("Export tiers (in order):");
    for (method, available) in exporter.tiers() {
        let status = if available { "OK" } else { "--" };
        println!("  [{status}] {method}");
    }

    Ok(())
}
