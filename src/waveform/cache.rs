//! Process-wide envelope cache with per-file generation dedup.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use tracing::{debug, warn};

use super::{WaveformEnvelope, WaveformScope};

/// Normalized lookup key for a media path.
///
/// Paths are compared case-insensitively on platforms whose default
/// filesystems are.
pub fn cache_key(path: &Path) -> String {
    let key = path.to_string_lossy();
    if cfg!(any(target_os = "windows", target_os = "macos")) {
        key.to_lowercase()
    } else {
        key.into_owned()
    }
}

#[derive(Clone)]
struct CachedWaveform {
    scope: WaveformScope,
    envelope: Arc<WaveformEnvelope>,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CachedWaveform>,
    in_flight: HashSet<String>,
}

impl CacheState {
    fn lookup(&self, key: &str, scope: WaveformScope) -> Option<Arc<WaveformEnvelope>> {
        self.entries
            .get(key)
            .filter(|cached| cached.scope.covers(scope))
            .map(|cached| Arc::clone(&cached.envelope))
    }
}

/// Envelopes keyed by media path, shared by every waveform consumer.
///
/// At most one generation runs per key; concurrent requests for a key that is
/// being generated wait for it and reuse the result when it covers them.
#[derive(Default)]
pub struct WaveformCache {
    state: Mutex<CacheState>,
    generated: Condvar,
}

impl WaveformCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached envelope for `path` if one exists that covers `scope`.
    pub fn get(&self, path: &Path, scope: WaveformScope) -> Option<Arc<WaveformEnvelope>> {
        self.lock_state().lookup(&cache_key(path), scope)
    }

    /// Return the cached envelope or run `generate` exactly once for this key.
    ///
    /// While another thread generates the same key this blocks until it
    /// finishes, then either reuses its envelope or generates again if that
    /// envelope does not cover `scope`.
    pub fn get_or_generate<F>(
        &self,
        path: &Path,
        scope: WaveformScope,
        generate: F,
    ) -> Arc<WaveformEnvelope>
    where
        F: FnOnce() -> WaveformEnvelope,
    {
        let key = cache_key(path);
        let mut state = self.lock_state();
        loop {
            if let Some(hit) = state.lookup(&key, scope) {
                return hit;
            }
            if !state.in_flight.contains(&key) {
                break;
            }
            debug!("Waiting for in-flight waveform of {}", path.display());
            state = self.wait_generated(state);
        }
        state.in_flight.insert(key.clone());
        drop(state);

        let guard = InFlightGuard {
            cache: self,
            key: &key,
        };
        let envelope = Arc::new(generate());
        self.lock_state().entries.insert(
            key.clone(),
            CachedWaveform {
                scope,
                envelope: Arc::clone(&envelope),
            },
        );
        drop(guard);
        envelope
    }

    /// Forget the envelope for `path`; the next request regenerates it.
    pub fn invalidate(&self, path: &Path) -> bool {
        self.lock_state().entries.remove(&cache_key(path)).is_some()
    }

    pub fn clear(&self) {
        self.lock_state().entries.clear();
    }

    pub fn len(&self) -> usize {
        self.lock_state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("Waveform cache lock poisoned; recovering.");
            poisoned.into_inner()
        })
    }

    fn wait_generated<'a>(&self, guard: MutexGuard<'a, CacheState>) -> MutexGuard<'a, CacheState> {
        self.generated.wait(guard).unwrap_or_else(|poisoned| {
            warn!("Waveform cache condvar poisoned; recovering.");
            poisoned.into_inner()
        })
    }
}

/// Clears the in-flight marker and wakes waiters, even if generation panics.
struct InFlightGuard<'a> {
    cache: &'a WaveformCache,
    key: &'a str,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.cache.lock_state().in_flight.remove(self.key);
        self.cache.generated.notify_all();
    }
}
