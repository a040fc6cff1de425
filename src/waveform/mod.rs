mod cache;
mod decode;
mod error;
mod reduce;
mod render;
mod service;

use std::time::Duration;

pub use cache::{WaveformCache, cache_key};
pub use decode::{DecodeRequest, FfmpegDecoder, PcmDecoder, decoder_file_name};
pub use error::DecodeError;
pub use reduce::{PCM_FULL_SCALE, reduce};
pub use render::{
    DEFAULT_AMPLITUDE_FRACTION, RenderStyle, WaveformPoint, render_ascii, render_points,
    render_points_with_style,
};
pub use service::{WaveformReady, WaveformService};

/// Points in an envelope unless configured otherwise.
pub const DEFAULT_SAMPLE_COUNT: usize = 1000;

/// Rate of the mono PCM requested from the decoder.
pub const PCM_SAMPLE_RATE: u32 = 8000;

/// Normalized peak envelope of a file's audio, one value per time bucket.
///
/// Values lie in `[0.0, 1.0]` and the loudest bucket is exactly `1.0` unless the
/// whole envelope is silent. Failed generations produce a silent envelope of the
/// requested length rather than an empty one.
#[derive(Clone, Debug, PartialEq)]
pub struct WaveformEnvelope {
    values: Vec<f32>,
}

impl WaveformEnvelope {
    /// All-zero envelope, shown as a flat line.
    pub fn silent(len: usize) -> Self {
        Self {
            values: vec![0.0; len],
        }
    }

    pub(crate) fn from_values(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// Largest value, `0.0` for silent or empty envelopes.
    pub fn peak(&self) -> f32 {
        self.values.iter().copied().fold(0.0, f32::max)
    }

    pub fn is_silent(&self) -> bool {
        self.values.iter().all(|value| *value == 0.0)
    }
}

impl AsRef<[f32]> for WaveformEnvelope {
    fn as_ref(&self) -> &[f32] {
        &self.values
    }
}

/// How much of a file a waveform covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WaveformScope {
    /// The whole audio track.
    Full,
    /// Only the first `Duration` of audio.
    Prefix(Duration),
}

impl WaveformScope {
    /// Decoder input cap for this scope.
    pub fn prefix_limit(&self) -> Option<Duration> {
        match self {
            Self::Full => None,
            Self::Prefix(limit) => Some(*limit),
        }
    }

    /// Whether an envelope generated for `self` can answer a request for `requested`.
    pub fn covers(&self, requested: WaveformScope) -> bool {
        match (self, requested) {
            (Self::Full, _) => true,
            (Self::Prefix(have), Self::Prefix(want)) => *have == want,
            (Self::Prefix(_), Self::Full) => false,
        }
    }

    /// Long media should ask the user before a full decode.
    pub fn requires_confirmation(duration: Option<Duration>, threshold: Duration) -> bool {
        duration.is_some_and(|duration| duration > threshold)
    }
}
