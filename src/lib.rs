//! Library exports for reuse in benchmarks and tests.
/// Application directory helpers.
pub mod app_dirs;
/// Persisted settings.
pub mod config;
/// Logging setup.
pub mod logging;
/// Media file collaborator seam.
pub mod media;
/// Frame-accurate time strings, slider mapping and loop ranges.
pub mod timeline;
/// Waveform decoding, reduction, caching and rendering.
pub mod waveform;
