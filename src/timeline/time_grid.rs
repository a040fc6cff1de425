use std::time::Duration;

use crate::config::TimelineSettings;
use crate::media::{self, MediaFile};

/// Frame rate assumed when a file reports none.
pub const DEFAULT_FRAME_RATE: f64 = 30.0;

/// Frame-quantized time formatting for the currently open file.
///
/// Elapsed time is snapped to the frame grid before it is split into
/// seconds and frames, so labels advance monotonically without duplicates
/// near second boundaries (0.99 s vs 1.00 s).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimeGrid {
    frame_rate: f64,
}

impl Default for TimeGrid {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_RATE)
    }
}

impl TimeGrid {
    pub fn new(frame_rate: f64) -> Self {
        Self {
            frame_rate: usable_rate(frame_rate),
        }
    }

    pub fn from_settings(settings: &TimelineSettings) -> Self {
        Self::new(settings.default_frame_rate)
    }

    /// Grid for a newly opened file, estimated from its metadata.
    pub fn for_media(file: &dyn MediaFile, settings: &TimelineSettings) -> Self {
        Self::new(media::frame_rate_for(file, settings.default_frame_rate))
    }

    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// Replace the rate after a file's frame rate is re-estimated.
    pub fn set_frame_rate(&mut self, frame_rate: f64) {
        self.frame_rate = usable_rate(frame_rate);
    }

    /// Integer frames per second used for the `.FF` field.
    pub fn whole_fps(&self) -> u64 {
        self.frame_rate.round() as u64
    }

    /// Frames elapsed at `seconds`, rounded to the nearest frame.
    pub fn total_frames(&self, seconds: f64) -> u64 {
        if !seconds.is_finite() || seconds <= 0.0 {
            return 0;
        }
        (seconds * self.frame_rate).round() as u64
    }

    /// Position of the frame nearest to `seconds`.
    pub fn snap_to_frame(&self, seconds: f64) -> f64 {
        self.total_frames(seconds) as f64 / self.frame_rate
    }

    /// Position `frames` away from the frame nearest to `seconds`, never before zero.
    pub fn step_frames(&self, seconds: f64, frames: i64) -> f64 {
        let target = i64::try_from(self.total_frames(seconds))
            .unwrap_or(i64::MAX)
            .saturating_add(frames);
        target.max(0) as f64 / self.frame_rate
    }

    /// Format `elapsed` as `HH:MM:SS.FF` with a 1-based frame field.
    pub fn format(&self, elapsed: Duration) -> String {
        self.format_seconds(elapsed.as_secs_f64())
    }

    /// Same as [`TimeGrid::format`] for a raw second count.
    ///
    /// Hours keep counting past a day (`25:00:00.01`); they are never wrapped
    /// into a day field or back to `00`.
    pub fn format_seconds(&self, seconds: f64) -> String {
        let fps = self.whole_fps().max(1);
        let total = self.total_frames(seconds);
        let whole_seconds = total / fps;
        let frame = total % fps + 1;
        let hours = whole_seconds / 3600;
        let minutes = whole_seconds / 60 % 60;
        let secs = whole_seconds % 60;
        format!("{hours:02}:{minutes:02}:{secs:02}.{frame:02}")
    }
}

/// Format `elapsed_seconds` at `frame_rate`; non-positive rates fall back to 30.
pub fn format_time(elapsed_seconds: f64, frame_rate: f64) -> String {
    TimeGrid::new(frame_rate).format_seconds(elapsed_seconds)
}

/// Frames per second from a frame count and duration; 30 when the duration is zero or unknown.
pub fn estimate_frame_rate(duration: Option<Duration>, frame_count: u64) -> f64 {
    match duration {
        Some(duration) if !duration.is_zero() => frame_count as f64 / duration.as_secs_f64(),
        _ => DEFAULT_FRAME_RATE,
    }
}

fn usable_rate(frame_rate: f64) -> f64 {
    if frame_rate.is_finite() && frame_rate.round() > 0.0 {
        frame_rate
    } else {
        DEFAULT_FRAME_RATE
    }
}
