//! Show, locate, or reset saved settings.

use clap::Subcommand;
use photostamp_photo_model::{JsonFileSettingsRepository, SettingsRepository};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print the effective settings
    Show,
    /// Print where settings are stored
    Path,
    /// Delete saved settings and return to defaults
    Reset,
}

pub fn run(action: SettingsAction) -> anyhow::Result<()> {
    let repo = JsonFileSettingsRepository::default();
    match action {
        SettingsAction::Show => {
            let settings = repo.load();
            println!("{}", serde_json::to_string_pretty(&settings)?);
            println!();
            println!("Time:     {}", settings.time_summary());
            println!("Location: {}", settings.render.location.summary());
        }
        SettingsAction::Path => println!("{}", repo.path().display()),
        SettingsAction::Reset => {
            repo.reset()?;
            println!("Settings reset to defaults");
        }
    }
    Ok(())
}
