//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Whether the process runs inside the embedded native app shell.
    /// Enables direct writes into `app_export_dir` and disables the
    /// browser-style export tiers.
    pub native_shell: bool,

    /// App-managed folder used by the native filesystem export tier.
    pub app_export_dir: PathBuf,

    /// Folder that receives "downloads" (single exports, archives and
    /// sequential bulk downloads).
    pub downloads_dir: PathBuf,

    /// Overlay font settings.
    pub font: FontConfig,

    /// Default export parameters.
    pub export: ExportDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Overlay font selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// TrueType/OpenType font used for overlay text. The built-in bitmap
    /// face is used when unset or unreadable.
    pub path: Option<PathBuf>,
}

/// Default export parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportDefaults {
    /// Default encoded format ("jpeg" or "png").
    pub format: String,

    /// Lossy encoder quality in `[0.0, 1.0]`.
    pub jpeg_quality: f32,

    /// Pause between sequential downloads, in milliseconds.
    pub sequential_delay_ms: u64,

    /// Longest edge of on-screen previews, in pixels.
    pub preview_max_px: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "photostamp=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Number of recent log lines retained for the in-app log view
    /// (0 disables the buffer).
    pub buffer_lines: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            native_shell: false,
            app_export_dir: data_dir().join("exports"),
            downloads_dir: default_downloads_dir(),
            font: FontConfig::default(),
            export: ExportDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ExportDefaults {
    fn default() -> Self {
        Self {
            format: "jpeg".to_string(),
            jpeg_quality: 0.92,
            sequential_delay_ms: 400,
            preview_max_px: 600,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            buffer_lines: 200,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Base directory for Photostamp configuration files.
pub fn config_dir() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"));
    base.join("photostamp")
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Standard location of the persisted render settings.
pub fn settings_file_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn data_dir() -> PathBuf {
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local").join("share"));
    base.join("photostamp")
}

fn default_downloads_dir() -> PathBuf {
    std::env::var("XDG_DOWNLOAD_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join("Downloads"))
}

fn home_dir() -> PathBuf {
    PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"native_shell": true, "export": {"jpeg_quality": 0.8}}"#)
                .unwrap();
        assert!(config.native_shell);
        assert!((config.export.jpeg_quality - 0.8).abs() < 1e-6);
        assert_eq!(config.export.sequential_delay_ms, 400);
        assert_eq!(config.export.preview_max_px, 600);
        assert_eq!(config.logging.buffer_lines, 200);
        assert!(config.font.path.is_none());
    }

    #[test]
    fn test_settings_file_sits_next_to_config() {
        assert_eq!(
            settings_file_path().parent(),
            config_file_path().parent()
        );
    }
}
