use super::LoopRange;
use crate::config::TimelineSettings;

/// Horizontal inset of the track inside the slider control, in pixels.
pub const DEFAULT_SLIDER_MARGIN: f64 = 10.0;

/// Linear mapping between a slider's pixel span and media seconds.
///
/// The usable track is `width - 2 * margin` pixels starting at `margin`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SliderTrack {
    pub minimum: f64,
    pub maximum: f64,
    pub width: f64,
    pub margin: f64,
}

impl SliderTrack {
    pub fn new(minimum: f64, maximum: f64, width: f64) -> Self {
        Self {
            minimum,
            maximum,
            width,
            margin: DEFAULT_SLIDER_MARGIN,
        }
    }

    /// Track spanning a whole file.
    pub fn for_duration(duration_seconds: f64, width: f64) -> Self {
        Self::new(0.0, duration_seconds.max(0.0), width)
    }

    /// Track using the configured margin.
    pub fn from_settings(
        minimum: f64,
        maximum: f64,
        width: f64,
        settings: &TimelineSettings,
    ) -> Self {
        Self::new(minimum, maximum, width).with_margin(settings.slider_margin)
    }

    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin.max(0.0);
        self
    }

    fn usable_width(&self) -> f64 {
        self.width - 2.0 * self.margin
    }

    fn span(&self) -> f64 {
        self.maximum - self.minimum
    }

    /// True when the control is not laid out yet or the value range is empty.
    pub fn is_degenerate(&self) -> bool {
        !(self.usable_width() > 0.0 && self.span() > 0.0)
    }

    /// Pixel offset of `value`, clamped onto the track.
    pub fn value_to_x(&self, value: f64) -> f64 {
        if self.is_degenerate() {
            return self.margin;
        }
        let ratio = ((value - self.minimum) / self.span()).clamp(0.0, 1.0);
        ratio * self.usable_width() + self.margin
    }

    /// Value under pixel offset `x`, clamped to `[minimum, maximum]`.
    pub fn x_to_value(&self, x: f64) -> f64 {
        if self.is_degenerate() || !x.is_finite() {
            return self.minimum;
        }
        let value = (x - self.margin) / self.usable_width() * self.span() + self.minimum;
        value.clamp(self.minimum, self.maximum)
    }

    /// Left edge and width of the highlighted loop band.
    pub fn highlight(&self, range: &LoopRange) -> (f64, f64) {
        let start = self.value_to_x(range.start());
        let end = self.value_to_x(range.end());
        (start, (end - start).max(0.0))
    }
}
