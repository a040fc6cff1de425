//! Background waveform generation for media files.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Instant;

use tracing::{info, warn};

use super::{
    DecodeError, DecodeRequest, FfmpegDecoder, PcmDecoder, WaveformCache, WaveformEnvelope,
    WaveformScope, reduce,
};
use crate::config::WaveformSettings;
use crate::media::MediaFile;

/// Envelope delivered to the requester once generation finishes.
#[derive(Clone, Debug)]
pub struct WaveformReady {
    pub path: PathBuf,
    pub scope: WaveformScope,
    pub envelope: Arc<WaveformEnvelope>,
}

/// Decodes, reduces and caches waveforms off the caller's thread.
///
/// Cloning shares the decoder and cache.
#[derive(Clone)]
pub struct WaveformService {
    decoder: Arc<dyn PcmDecoder>,
    cache: Arc<WaveformCache>,
    sample_count: usize,
    sample_rate: u32,
}

impl WaveformService {
    /// Service backed by ffmpeg as configured in `settings`.
    pub fn new(settings: &WaveformSettings) -> Self {
        Self::with_decoder(settings, Arc::new(FfmpegDecoder::from_settings(settings)))
    }

    pub fn with_decoder(settings: &WaveformSettings, decoder: Arc<dyn PcmDecoder>) -> Self {
        Self {
            decoder,
            cache: Arc::new(WaveformCache::new()),
            sample_count: settings.sample_count.max(1),
            sample_rate: settings.sample_rate,
        }
    }

    pub fn cache(&self) -> &WaveformCache {
        &self.cache
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Generate on a background thread; the receiver yields exactly one result.
    ///
    /// Cache hits are answered before returning. A panicking generation is
    /// answered with a silent envelope. Dropping the receiver discards the
    /// result but lets the decode finish.
    pub fn request(
        &self,
        file: Arc<dyn MediaFile>,
        scope: WaveformScope,
    ) -> mpsc::Receiver<WaveformReady> {
        let (tx, rx) = mpsc::channel();
        let path = file.path().to_path_buf();
        if let Some(envelope) = self.cache.get(&path, scope) {
            let _ = tx.send(WaveformReady {
                path,
                scope,
                envelope,
            });
            return rx;
        }

        let fallback = tx.clone();
        let service = self.clone();
        let spawned = thread::Builder::new()
            .name("waveform-decode".to_string())
            .spawn(move || {
                let generated =
                    catch_unwind(AssertUnwindSafe(|| service.generate_blocking(file.as_ref(), scope)));
                let envelope = generated.unwrap_or_else(|_| {
                    warn!(
                        "Waveform generation panicked for {}",
                        file.path().display()
                    );
                    Arc::new(WaveformEnvelope::silent(service.sample_count))
                });
                let _ = tx.send(WaveformReady {
                    path: file.path().to_path_buf(),
                    scope,
                    envelope,
                });
            });
        if let Err(err) = spawned {
            warn!(
                "Waveform thread failed to start for {}: {err}",
                path.display()
            );
            let _ = fallback.send(WaveformReady {
                path,
                scope,
                envelope: Arc::new(WaveformEnvelope::silent(self.sample_count)),
            });
        }
        rx
    }

    /// Generate on the calling thread, reusing and filling the cache.
    ///
    /// Never fails: decode errors are logged and yield a silent envelope.
    pub fn generate_blocking(
        &self,
        file: &dyn MediaFile,
        scope: WaveformScope,
    ) -> Arc<WaveformEnvelope> {
        self.cache
            .get_or_generate(file.path(), scope, || match self.try_generate(file, scope) {
                Ok(envelope) => envelope,
                Err(err) => {
                    warn!(
                        "Waveform generation failed for {}: {err}",
                        file.path().display()
                    );
                    WaveformEnvelope::silent(self.sample_count)
                }
            })
    }

    /// Decode and reduce without touching the cache, surfacing decode errors.
    pub fn try_generate(
        &self,
        file: &dyn MediaFile,
        scope: WaveformScope,
    ) -> Result<WaveformEnvelope, DecodeError> {
        let path = file.path();
        file.open_read()
            .map_err(|source| DecodeError::SourceUnreadable {
                path: path.to_path_buf(),
                source,
            })?;
        let request = DecodeRequest::new(path)
            .with_sample_rate(self.sample_rate)
            .with_prefix_limit(scope.prefix_limit())
            .with_estimated_duration(file.estimated_duration());
        let started = Instant::now();
        let pcm = self.decoder.decode(&request)?;
        let envelope = reduce(&pcm, self.sample_count);
        info!(
            "Waveform for {} ready: {} points from {} bytes in {:?}",
            path.display(),
            envelope.len(),
            pcm.len(),
            started.elapsed()
        );
        Ok(envelope)
    }
}
