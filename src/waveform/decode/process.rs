use std::ffi::OsString;
use std::io::Read;
use std::path::Path;
use std::process::{Child, ChildStderr, Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use tracing::warn;

use crate::waveform::DecodeError;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Longest wait for stderr after a failed exit; descendants may keep the pipe open.
const STDERR_GRACE: Duration = Duration::from_millis(250);

/// Run `program` to completion, killing it once `timeout` elapses.
///
/// stderr is drained on a helper thread so a chatty decoder cannot block on a
/// full pipe; only the first `stderr_limit` characters are kept for errors.
/// A timeout too large to represent as an instant means no deadline.
pub(super) fn run_with_timeout(
    program: &Path,
    args: &[OsString],
    timeout: Duration,
    stderr_limit: usize,
) -> Result<(), DecodeError> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| DecodeError::Spawn {
            program: program.to_path_buf(),
            source,
        })?;
    let stderr = child
        .stderr
        .take()
        .and_then(|pipe| StderrCapture::spawn(pipe, stderr_limit));

    let deadline = Instant::now().checked_add(timeout);
    let status = match wait_until(&mut child, deadline) {
        Ok(Some(status)) => status,
        Ok(None) => {
            kill_and_reap(&mut child);
            return Err(DecodeError::Timeout { after: timeout });
        }
        Err(source) => {
            kill_and_reap(&mut child);
            return Err(DecodeError::Wait { source });
        }
    };
    if status.success() {
        return Ok(());
    }
    let grace = deadline
        .map(|deadline| deadline.saturating_duration_since(Instant::now()))
        .map_or(STDERR_GRACE, |left| left.min(STDERR_GRACE));
    let stderr = stderr
        .map(|capture| capture.excerpt(grace))
        .unwrap_or_default();
    Err(DecodeError::Failed {
        exit_code: status.code(),
        stderr,
    })
}

fn wait_until(
    child: &mut Child,
    deadline: Option<Instant>,
) -> std::io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let pause = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return Ok(None);
                }
                POLL_INTERVAL.min(deadline - now)
            }
            None => POLL_INTERVAL,
        };
        thread::sleep(pause);
    }
}

fn kill_and_reap(child: &mut Child) {
    if let Err(err) = child.kill() {
        warn!("Failed to kill decoder process {}: {err}", child.id());
    }
    let _ = child.wait();
}

/// Leading stderr bytes collected by a background reader.
struct StderrCapture {
    kept: Arc<Mutex<Vec<u8>>>,
    finished: mpsc::Receiver<()>,
    limit: usize,
}

impl StderrCapture {
    fn spawn(pipe: ChildStderr, limit: usize) -> Option<Self> {
        let kept = Arc::new(Mutex::new(Vec::new()));
        let (done_tx, finished) = mpsc::channel();
        let sink = Arc::clone(&kept);
        thread::Builder::new()
            .name("decoder-stderr".into())
            .spawn(move || {
                drain_capped(pipe, limit, &sink);
                let _ = done_tx.send(());
            })
            .inspect_err(|err| warn!("Failed to start decoder stderr reader: {err}"))
            .ok()?;
        Some(Self {
            kept,
            finished,
            limit,
        })
    }

    /// Wait up to `wait` for end of stream, then return whatever was read.
    fn excerpt(self, wait: Duration) -> String {
        let _ = self.finished.recv_timeout(wait);
        let kept = self.kept.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        excerpt(&kept, self.limit)
    }
}

/// Read `reader` to the end, appending at most `limit` characters' worth of bytes to `kept`.
fn drain_capped(mut reader: impl Read, limit: usize, kept: &Mutex<Vec<u8>>) {
    let byte_cap = limit.saturating_mul(4);
    let mut chunk = [0u8; 4096];
    loop {
        match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(read) => {
                let mut kept = kept.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                let room = byte_cap.saturating_sub(kept.len());
                kept.extend_from_slice(&chunk[..read.min(room)]);
            }
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(_) => break,
        }
    }
}

fn excerpt(bytes: &[u8], limit: usize) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .take(limit)
        .collect::<String>()
        .trim_end()
        .to_string()
}
