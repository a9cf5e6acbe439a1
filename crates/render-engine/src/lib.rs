//! Photostamp Render Engine
//!
//! Turns photos into stamped images and gets them onto disk.
//!
//! # Pipeline Architecture
//!
//! ```text
//! camera frame ──┐
//!                ├── capture/import ── Photo
//! image file ────┘                       │
//!                                        ├── Fit/Crop (geometry)
//! RenderSettings ────────────────────────┤
//!                                        ├── Overlay text (shadow, stroke, fill)
//!                                        │
//!                                        ▼
//!                                  Encode (JPEG/PNG)
//!                                        │
//!                                        ▼
//!              native folder / picked folder / zip / sequential downloads
//! ```

pub mod capture;
pub mod compositor;
pub mod encode;
pub mod export;
pub mod geometry;
pub mod overlay;
pub mod sinks;
pub mod text;

pub use capture::{capture_frame, import_image, CaptureTime};
pub use compositor::{decode_photo, preview_scale, Compositor, OverlayStyle, SourceFrame};
pub use encode::encode_composite;
pub use export::*;
pub use sinks::*;
