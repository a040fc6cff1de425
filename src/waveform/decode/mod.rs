//! External-process audio decoding.
//!
//! ffmpeg transcodes any input into raw s16le mono PCM written to a scoped
//! temporary file, which is read back and deleted on every exit path.

mod command;
mod locate;
mod process;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tempfile::TempPath;
use tracing::debug;

use super::{DecodeError, PCM_SAMPLE_RATE};
use crate::config::{DecodeTimeoutSettings, WaveformSettings};

pub use locate::decoder_file_name;

/// Source of raw PCM for waveform generation.
pub trait PcmDecoder: Send + Sync {
    /// Decode `request` into s16le bytes at the requested rate and channel count.
    fn decode(&self, request: &DecodeRequest) -> Result<Vec<u8>, DecodeError>;
}

/// Parameters of one decode; built per generation and consumed once.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodeRequest {
    pub source: PathBuf,
    pub sample_rate: u32,
    pub channels: u16,
    pub prefix_limit: Option<Duration>,
    pub estimated_duration: Option<Duration>,
}

impl DecodeRequest {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            sample_rate: PCM_SAMPLE_RATE,
            channels: 1,
            prefix_limit: None,
            estimated_duration: None,
        }
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_prefix_limit(mut self, limit: Option<Duration>) -> Self {
        self.prefix_limit = limit;
        self
    }

    pub fn with_estimated_duration(mut self, duration: Option<Duration>) -> Self {
        self.estimated_duration = duration;
        self
    }
}

/// Decoder backed by an ffmpeg executable.
#[derive(Clone, Debug)]
pub struct FfmpegDecoder {
    program: Option<PathBuf>,
    timeout: DecodeTimeoutSettings,
    stderr_limit: usize,
    temp_dir: Option<PathBuf>,
}

impl Default for FfmpegDecoder {
    fn default() -> Self {
        Self::from_settings(&WaveformSettings::default())
    }
}

impl FfmpegDecoder {
    pub fn from_settings(settings: &WaveformSettings) -> Self {
        Self {
            program: settings.decoder_path.clone(),
            timeout: settings.timeout,
            stderr_limit: settings.stderr_limit,
            temp_dir: None,
        }
    }

    /// Try `program` before the bundled and `PATH` locations.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = Some(program.into());
        self
    }

    pub fn with_timeout(mut self, timeout: DecodeTimeoutSettings) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_stderr_limit(mut self, limit: usize) -> Self {
        self.stderr_limit = limit;
        self
    }

    /// Create temporary PCM files in `dir` instead of the system temp directory.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    fn create_output(&self) -> Result<TempPath, DecodeError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("flowerwave-").suffix(".pcm");
        let file = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|source| DecodeError::TempFile { source })?;
        Ok(file.into_temp_path())
    }
}

impl PcmDecoder for FfmpegDecoder {
    fn decode(&self, request: &DecodeRequest) -> Result<Vec<u8>, DecodeError> {
        let program = locate::resolve_decoder(self.program.as_deref())?;
        let output = self.create_output()?;
        let args = command::ffmpeg_args(request, &output);
        let timeout = self
            .timeout
            .timeout_for(request.estimated_duration, request.prefix_limit);
        debug!(
            "Decoding {} with {} (timeout {:.0}s)",
            request.source.display(),
            program.display(),
            timeout.as_secs_f64()
        );
        let started = Instant::now();
        process::run_with_timeout(&program, &args, timeout, self.stderr_limit)?;
        let pcm = read_output(&output)?;
        debug!(
            "Decoded {} PCM bytes from {} in {:?}",
            pcm.len(),
            request.source.display(),
            started.elapsed()
        );
        Ok(pcm)
    }
}

fn read_output(path: &Path) -> Result<Vec<u8>, DecodeError> {
    let pcm = std::fs::read(path).map_err(|source| DecodeError::ReadOutput {
        path: path.to_path_buf(),
        source,
    })?;
    if pcm.is_empty() {
        return Err(DecodeError::EmptyResult);
    }
    Ok(pcm)
}
