use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::waveform::DecodeError;

/// Name of the decoder executable on this platform.
pub fn decoder_file_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "ffmpeg.exe"
    } else {
        "ffmpeg"
    }
}

/// Find the decoder: explicit override, then next to the executable, then `PATH`.
pub(super) fn resolve_decoder(override_path: Option<&Path>) -> Result<PathBuf, DecodeError> {
    let path_var = std::env::var_os("PATH");
    resolve_from(override_path, &bundled_candidates(), path_var.as_deref())
}

fn resolve_from(
    override_path: Option<&Path>,
    bundled: &[PathBuf],
    path_var: Option<&OsStr>,
) -> Result<PathBuf, DecodeError> {
    let mut searched = Vec::new();
    if let Some(path) = override_path {
        if is_executable(path) {
            return Ok(path.to_path_buf());
        }
        warn!(
            "Configured decoder {} is missing; trying bundled and PATH locations",
            path.display()
        );
        searched.push(path.to_path_buf());
    }
    for candidate in bundled {
        if is_executable(candidate) {
            return Ok(candidate.clone());
        }
        searched.push(candidate.clone());
    }
    if let Some(found) = search_path(decoder_file_name(), path_var) {
        debug!("Using decoder from PATH at {}", found.display());
        return Ok(found);
    }
    if let Some(path_var) = path_var {
        searched.extend(std::env::split_paths(path_var).map(|dir| dir.join(decoder_file_name())));
    }
    Err(DecodeError::DecoderNotFound { searched })
}

/// Application-relative locations: beside the executable and in an `ffmpeg/` folder.
fn bundled_candidates() -> Vec<PathBuf> {
    let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    else {
        return Vec::new();
    };
    vec![
        dir.join(decoder_file_name()),
        dir.join("ffmpeg").join(decoder_file_name()),
    ]
}

fn search_path(name: &str, path_var: Option<&OsStr>) -> Option<PathBuf> {
    std::env::split_paths(path_var?)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
