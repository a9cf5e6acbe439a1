//! Photostamp Common Utilities
//!
//! Shared infrastructure for all Photostamp crates:
//! - Error types and result aliases
//! - Wall-clock abstraction for export naming and capture times
//! - Tracing/logging initialization and the in-memory log buffer
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
