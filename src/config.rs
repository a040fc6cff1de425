//! Persisted application settings.
//!
//! Settings live in `config.toml` inside the `.flowerwave` directory. Every
//! field has a default so partial or missing files load cleanly, and values are
//! normalized after parsing so downstream code never sees out-of-range input.
//!
//! Config keys (TOML): `[logging]`, `[waveform]`, `[waveform.timeout]`,
//! `[render]`, `[timeline]`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app_dirs;
use crate::waveform::WaveformScope;

/// File name of the settings file inside the app directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Errors that may occur while loading or saving settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The app directory could not be resolved or created.
    #[error("Config directory unavailable: {0}")]
    Dir(#[from] app_dirs::AppDirError),
    /// Failed to read the config file.
    #[error("Failed to read {path}: {source}")]
    Read {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Failed to write the config file.
    #[error("Failed to write {path}: {source}")]
    Write {
        /// Path that failed to write.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Failed to parse TOML.
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        /// TOML file path.
        path: PathBuf,
        /// TOML parse error.
        source: toml::de::Error,
    },
    /// Failed to serialize settings to TOML.
    #[error("Failed to serialize config to TOML at {path}: {source}")]
    SerializeToml {
        /// TOML file path.
        path: PathBuf,
        /// TOML serialization error.
        source: toml::ser::Error,
    },
}

/// Aggregate settings passed explicitly to the waveform and timeline components.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LogSettings,
    pub waveform: WaveformSettings,
    pub render: RenderSettings,
    pub timeline: TimelineSettings,
}

impl AppConfig {
    /// Clamp every field into its supported range.
    pub fn normalized(self) -> Self {
        Self {
            logging: self.logging.normalized(),
            waveform: self.waveform.normalized(),
            render: self.render.normalized(),
            timeline: self.timeline.normalized(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
    /// Number of log files retained in the logs directory.
    pub max_files: usize,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            max_files: 10,
        }
    }
}

impl LogSettings {
    fn normalized(self) -> Self {
        let level = if self.level.trim().is_empty() {
            LogSettings::default().level
        } else {
            self.level
        };
        Self {
            level,
            max_files: self.max_files.max(1),
        }
    }
}

/// Waveform generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveformSettings {
    /// Points in every generated envelope.
    pub sample_count: usize,
    /// PCM rate requested from the decoder, in Hz.
    pub sample_rate: u32,
    /// Length of the "prefix only" scope, in seconds.
    pub prefix_seconds: f64,
    /// Media longer than this should prompt for full vs. prefix generation.
    pub confirm_threshold_seconds: f64,
    /// Maximum characters of decoder stderr kept for error reports.
    pub stderr_limit: usize,
    /// Explicit decoder executable, tried before the bundled and `PATH` locations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decoder_path: Option<PathBuf>,
    pub timeout: DecodeTimeoutSettings,
}

impl Default for WaveformSettings {
    fn default() -> Self {
        Self {
            sample_count: 1000,
            sample_rate: 8000,
            prefix_seconds: 300.0,
            confirm_threshold_seconds: 60.0,
            stderr_limit: 500,
            decoder_path: None,
            timeout: DecodeTimeoutSettings::default(),
        }
    }
}

impl WaveformSettings {
    fn normalized(self) -> Self {
        let defaults = Self::default();
        Self {
            sample_count: self.sample_count.max(1),
            sample_rate: self.sample_rate.clamp(1_000, 48_000),
            prefix_seconds: positive_or(self.prefix_seconds, defaults.prefix_seconds),
            confirm_threshold_seconds: non_negative_or(
                self.confirm_threshold_seconds,
                defaults.confirm_threshold_seconds,
            ),
            stderr_limit: self.stderr_limit,
            decoder_path: self.decoder_path,
            timeout: self.timeout.normalized(),
        }
    }

    /// Scope covering only the configured prefix.
    pub fn prefix_scope(&self) -> WaveformScope {
        WaveformScope::Prefix(seconds_to_duration(self.prefix_seconds))
    }

    /// Duration above which callers should confirm full generation.
    pub fn confirm_threshold(&self) -> Duration {
        seconds_to_duration(self.confirm_threshold_seconds)
    }
}

/// Longest decoder wait any configuration can ask for.
const TIMEOUT_CEILING_SECONDS: f64 = 86_400.0;

/// Decoder timeout policy: `clamp(media_seconds * per_media_second + base, min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeTimeoutSettings {
    pub base_seconds: f64,
    pub per_media_second: f64,
    pub min_seconds: f64,
    pub max_seconds: f64,
}

impl Default for DecodeTimeoutSettings {
    fn default() -> Self {
        Self {
            base_seconds: 20.0,
            per_media_second: 3.0,
            min_seconds: 20.0,
            max_seconds: 180.0,
        }
    }
}

impl DecodeTimeoutSettings {
    fn normalized(self) -> Self {
        let defaults = Self::default();
        let min_seconds =
            positive_or(self.min_seconds, defaults.min_seconds).min(TIMEOUT_CEILING_SECONDS);
        let max_seconds = positive_or(self.max_seconds, defaults.max_seconds)
            .min(TIMEOUT_CEILING_SECONDS)
            .max(min_seconds);
        Self {
            base_seconds: non_negative_or(self.base_seconds, defaults.base_seconds),
            per_media_second: non_negative_or(self.per_media_second, defaults.per_media_second),
            min_seconds,
            max_seconds,
        }
    }

    /// Wait budget for a decode of media lasting `estimated`, bounded by `prefix`.
    ///
    /// Unknown durations get the upper bound.
    pub fn timeout_for(&self, estimated: Option<Duration>, prefix: Option<Duration>) -> Duration {
        let media = match (estimated, prefix) {
            (Some(duration), Some(limit)) => Some(duration.min(limit)),
            (Some(duration), None) => Some(duration),
            (None, Some(limit)) => Some(limit),
            (None, None) => None,
        };
        let seconds = match media {
            Some(media) => (media.as_secs_f64() * self.per_media_second + self.base_seconds)
                .max(self.min_seconds)
                .min(self.max_seconds),
            None => self.max_seconds,
        };
        seconds_to_duration(seconds)
    }
}

/// Waveform drawing settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Fraction of the surface height used by a full-scale peak.
    pub amplitude_fraction: f32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            amplitude_fraction: 0.4,
        }
    }
}

impl RenderSettings {
    fn normalized(self) -> Self {
        let fraction = if self.amplitude_fraction.is_finite() {
            self.amplitude_fraction.clamp(0.0, 0.5)
        } else {
            Self::default().amplitude_fraction
        };
        Self {
            amplitude_fraction: fraction,
        }
    }
}

/// Timeline display settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineSettings {
    /// Frame rate used until a file's own rate is estimated.
    pub default_frame_rate: f64,
    /// Horizontal inset of the slider track on each side, in pixels.
    pub slider_margin: f64,
}

impl Default for TimelineSettings {
    fn default() -> Self {
        Self {
            default_frame_rate: 30.0,
            slider_margin: 10.0,
        }
    }
}

impl TimelineSettings {
    fn normalized(self) -> Self {
        let defaults = Self::default();
        Self {
            default_frame_rate: positive_or(self.default_frame_rate, defaults.default_frame_rate),
            slider_margin: non_negative_or(self.slider_margin, defaults.slider_margin),
        }
    }
}

/// Resolve the config file path, ensuring the app directory exists.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(app_dirs::app_root_dir()?.join(CONFIG_FILE_NAME))
}

/// Load settings from the app directory, returning defaults if the file is missing.
pub fn load_or_default() -> Result<AppConfig, ConfigError> {
    load_from_path(&config_path()?)
}

/// Load settings from `path`, returning defaults if it does not exist.
pub fn load_from_path(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: AppConfig = toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(config.normalized())
}

/// Write settings to `path`, creating parent directories as needed.
pub fn save_to_path(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    let text = toml::to_string_pretty(config).map_err(|source| ConfigError::SerializeToml {
        path: path.to_path_buf(),
        source,
    })?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, text).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn positive_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}

fn non_negative_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        fallback
    }
}

fn seconds_to_duration(seconds: f64) -> Duration {
    Duration::try_from_secs_f64(seconds.max(0.0)).unwrap_or(Duration::MAX)
}
