//! List preset output sizes.

use photostamp_photo_model::{
    presets_for, JsonFileSettingsRepository, Orientation, OutputMode, SettingsRepository,
};

pub fn run() -> anyhow::Result<()> {
    let settings = JsonFileSettingsRepository::default().load();
    let current = (settings.render.output_mode == OutputMode::Preset)
        .then_some(settings.render.preset_size);

    for (title, orientation) in [
        ("Portrait", Orientation::Portrait),
        ("Landscape", Orientation::Landscape),
    ] {
        println!("{title}:");
        for preset in presets_for(orientation) {
            let marker = if current == Some(preset.size) && settings.preset_orientation == orientation
            {
                "*"
            } else {
                " "
            };
            println!("  {marker} {:<10} {}", preset.size.to_string(), preset.label);
        }
    }
    if current.is_none() {
        println!("Output mode: original size");
    }
    Ok(())
}
