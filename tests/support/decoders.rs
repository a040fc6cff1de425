use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock};
use std::thread;
use std::time::Duration;

use flowerwave::waveform::{DecodeError, DecodeRequest, PcmDecoder};

/// s16le bytes for `samples`.
pub fn pcm(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

/// In-process decoder that counts invocations and overlapping decodes.
pub struct CountingDecoder {
    pcm: Vec<u8>,
    delay: Duration,
    calls: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl CountingDecoder {
    pub fn new(pcm: Vec<u8>) -> Self {
        Self::with_delay(pcm, Duration::ZERO)
    }

    pub fn with_delay(pcm: Vec<u8>, delay: Duration) -> Self {
        Self {
            pcm,
            delay,
            calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

impl PcmDecoder for CountingDecoder {
    fn decode(&self, _request: &DecodeRequest) -> Result<Vec<u8>, DecodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);
        thread::sleep(self.delay);
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(self.pcm.clone())
    }
}

static SCRIPT_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Serializes writing and running fake decoder scripts.
///
/// Executing a script while another thread still holds a freshly written one
/// open for writing fails with ETXTBSY on Linux.
pub fn script_lock() -> MutexGuard<'static, ()> {
    SCRIPT_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|err| err.into_inner())
}

/// Write an executable `/bin/sh` script named `name` into `dir`.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write fake decoder");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("chmod fake decoder");
    path
}

/// Script that writes three samples (16384, -16384, 8192) to its last argument.
pub const WRITES_THREE_SAMPLES: &str =
    "for last; do :; done\nprintf '\\000\\100\\000\\300\\000\\040' > \"$last\"";

pub const FAILS_WITH_STDERR: &str = "echo boom >&2\nexit 3";

pub const WRITES_NOTHING: &str = "exit 0";

pub const NEVER_EXITS: &str = "exec sleep 30";

/// Exits with an error while a background child still holds stderr open.
pub const FAILS_WITH_LINGERING_CHILD: &str = "sleep 6 &\necho boom >&2\nexit 1";
