//! Media file handles supplied by the playback layer.
//!
//! The waveform core only borrows a file: it needs the path for the external
//! decoder, a read probe to fail fast on inaccessible files, and a best-effort
//! duration for the decode timeout.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::timeline::estimate_frame_rate;

/// Video container extensions recognized by the player, without the dot.
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v", "3gp", "3g2", "asf", "dv", "m2ts",
    "mts", "ts", "vob", "mpg", "mpeg",
];

/// Audio file extensions recognized by the player, without the dot.
pub const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "wav", "wma", "aac", "m4a", "flac", "ogg", "opus", "ac3", "amr", "au", "ra", "rm",
    "mp2", "mpa", "ape",
];

/// A media file owned by the playback collaborator.
pub trait MediaFile: Send + Sync {
    /// Location on disk handed to the decoder.
    fn path(&self) -> &Path;

    /// Open the file for reading.
    fn open_read(&self) -> io::Result<Box<dyn Read + Send>>;

    /// Best-effort duration reported by the playback engine.
    fn estimated_duration(&self) -> Option<Duration>;

    /// Number of video frames, when the container reports one.
    fn frame_count(&self) -> Option<u64> {
        None
    }
}

/// Plain file on the local filesystem with metadata supplied by the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalMediaFile {
    path: PathBuf,
    duration: Option<Duration>,
    frame_count: Option<u64>,
}

impl LocalMediaFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            duration: None,
            frame_count: None,
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_frame_count(mut self, frames: u64) -> Self {
        self.frame_count = Some(frames);
        self
    }

    /// Classify the file by its extension.
    pub fn kind(&self) -> Option<MediaKind> {
        MediaKind::from_path(&self.path)
    }
}

impl MediaFile for LocalMediaFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn open_read(&self) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(File::open(&self.path)?))
    }

    fn estimated_duration(&self) -> Option<Duration> {
        self.duration
    }

    fn frame_count(&self) -> Option<u64> {
        self.frame_count
    }
}

/// Estimate a file's frame rate from its reported frame count and duration.
///
/// Audio-only files and files without metadata get `fallback`.
pub fn frame_rate_for(file: &dyn MediaFile, fallback: f64) -> f64 {
    match file.frame_count() {
        Some(frames) if frames > 0 => estimate_frame_rate(file.estimated_duration(), frames),
        _ => fallback,
    }
}

/// Broad media category derived from the file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Video,
    Audio,
}

impl MediaKind {
    /// Classify `path` by extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Video)
        } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Audio)
        } else {
            None
        }
    }
}

/// Whether `path` has a recognized media extension.
pub fn is_media_file(path: &Path) -> bool {
    MediaKind::from_path(path).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn classifies_extensions_case_insensitively() {
        assert_eq!(MediaKind::from_path(Path::new("clip.MKV")), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_path(Path::new("song.Flac")), Some(MediaKind::Audio));
        assert_eq!(MediaKind::from_path(Path::new("notes.txt")), None);
        assert_eq!(MediaKind::from_path(Path::new("no_extension")), None);
        assert!(is_media_file(Path::new("/videos/a.m2ts")));
    }

    #[test]
    fn open_read_reports_missing_files() {
        let dir = tempdir().unwrap();
        let file = LocalMediaFile::new(dir.path().join("missing.mp4"));
        assert!(file.open_read().is_err());

        let present = dir.path().join("present.mp3");
        std::fs::write(&present, b"ID3").unwrap();
        let mut reader = LocalMediaFile::new(&present).open_read().unwrap();
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).unwrap();
        assert_eq!(bytes, b"ID3");
    }

    #[test]
    fn frame_rate_comes_from_metadata_or_fallback() {
        let video = LocalMediaFile::new("movie.mp4")
            .with_duration(Duration::from_secs(10))
            .with_frame_count(250);
        assert_eq!(frame_rate_for(&video, 30.0), 25.0);

        let audio = LocalMediaFile::new("song.mp3").with_duration(Duration::from_secs(10));
        assert_eq!(frame_rate_for(&audio, 30.0), 30.0);
    }
}
