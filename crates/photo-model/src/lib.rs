//! Photostamp Photo Model
//!
//! Data types shared by the render engine and the CLI:
//! - [`Photo`]: an encoded source image with its display timestamp
//! - [`RenderSettings`] and persisted [`Settings`]
//! - Preset output sizes
//! - Timestamp display formats
//! - [`SettingsRepository`] for loading and saving settings

pub mod photo;
pub mod repository;
pub mod settings;
pub mod timestamp;

pub use photo::*;
pub use repository::*;
pub use settings::*;
pub use timestamp::*;
