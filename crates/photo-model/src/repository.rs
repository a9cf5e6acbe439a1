//! Settings persistence.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use photostamp_common::{settings_file_path, PhotostampError, PhotostampResult};

use crate::settings::Settings;

/// Loads and stores user [`Settings`].
pub trait SettingsRepository: Send + Sync {
    /// Stored settings merged over defaults. Never fails; unreadable
    /// storage yields defaults.
    fn load(&self) -> Settings;

    fn save(&self, settings: &Settings) -> PhotostampResult<()>;

    /// Drop stored settings so the next load returns defaults.
    fn reset(&self) -> PhotostampResult<()>;
}

/// Settings stored as a JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileSettingsRepository {
    path: PathBuf,
}

impl JsonFileSettingsRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for JsonFileSettingsRepository {
    fn default() -> Self {
        Self::new(settings_file_path())
    }
}

impl SettingsRepository for JsonFileSettingsRepository {
    fn load(&self) -> Settings {
        if !self.path.exists() {
            return Settings::default();
        }
        match std::fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(settings) => return settings,
                Err(e) => {
                    tracing::warn!(path = ?self.path, error = %e, "Failed to parse settings");
                }
            },
            Err(e) => {
                tracing::warn!(path = ?self.path, error = %e, "Failed to read settings");
            }
        }
        Settings::default()
    }

    fn save(&self, settings: &Settings) -> PhotostampResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(settings)?;
        std::fs::write(&self.path, json)?;
        tracing::debug!(path = ?self.path, "Settings saved");
        Ok(())
    }

    fn reset(&self) -> PhotostampResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Settings held in memory, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemorySettingsRepository {
    stored: Mutex<Option<Settings>>,
}

impl MemorySettingsRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            stored: Mutex::new(Some(settings)),
        }
    }
}

impl SettingsRepository for MemorySettingsRepository {
    fn load(&self) -> Settings {
        match self.stored.lock() {
            Ok(stored) => stored.clone().unwrap_or_default(),
            Err(_) => Settings::default(),
        }
    }

    fn save(&self, settings: &Settings) -> PhotostampResult<()> {
        let mut stored = self
            .stored
            .lock()
            .map_err(|_| PhotostampError::settings("settings store poisoned"))?;
        *stored = Some(settings.clone());
        Ok(())
    }

    fn reset(&self) -> PhotostampResult<()> {
        let mut stored = self
            .stored
            .lock()
            .map_err(|_| PhotostampError::settings("settings store poisoned"))?;
        *stored = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{FitMode, OverlayCorner};

    #[test]
    fn test_json_repository_roundtrip_and_reset() {
        let dir = std::env::temp_dir().join("photostamp-settings-repo-test");
        std::fs::remove_dir_all(&dir).ok();
        let repo = JsonFileSettingsRepository::new(dir.join("nested").join("settings.json"));

        assert_eq!(repo.load(), Settings::default());

        let mut settings = Settings::default();
        settings.render.fit_mode = FitMode::Contain;
        settings.render.overlay_position = OverlayCorner::TopRight;
        settings.render.location.enabled = true;
        settings.render.location.latitude = Some(13.75);
        settings.render.location.longitude = Some(100.5);
        repo.save(&settings).unwrap();
        assert_eq!(repo.load(), settings);

        repo.reset().unwrap();
        assert_eq!(repo.load(), Settings::default());
        repo.reset().unwrap();

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_json_repository_falls_back_on_garbage() {
        let dir = std::env::temp_dir().join("photostamp-settings-garbage-test");
        std::fs::remove_dir_all(&dir).ok();
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();

        let repo = JsonFileSettingsRepository::new(&path);
        assert_eq!(repo.load(), Settings::default());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_memory_repository() {
        let repo = MemorySettingsRepository::new();
        let mut settings = Settings::default();
        settings.show_log = true;
        repo.save(&settings).unwrap();
        assert!(repo.load().show_log);
        repo.reset().unwrap();
        assert!(!repo.load().show_log);
    }
}
