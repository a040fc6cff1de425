//! Envelope to drawable geometry.
//!
//! The envelope is drawn as a single polyline above the vertical centre;
//! louder buckets sit higher.

use serde::Serialize;

use super::WaveformEnvelope;
use crate::config::RenderSettings;

/// Fraction of the height a full-scale value rises above the centre line.
pub const DEFAULT_AMPLITUDE_FRACTION: f32 = 0.4;

/// One polyline vertex in drawing-surface coordinates (y grows downwards).
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct WaveformPoint {
    pub x: f32,
    pub y: f32,
}

/// Vertical scaling applied when rendering.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderStyle {
    pub amplitude_fraction: f32,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            amplitude_fraction: DEFAULT_AMPLITUDE_FRACTION,
        }
    }
}

impl RenderStyle {
    pub fn from_settings(settings: &RenderSettings) -> Self {
        Self {
            amplitude_fraction: settings.amplitude_fraction,
        }
    }
}

/// Polyline for `envelope` on a `width` x `height` surface with the default style.
pub fn render_points(envelope: &WaveformEnvelope, width: f32, height: f32) -> Vec<WaveformPoint> {
    render_points_with_style(envelope, width, height, RenderStyle::default())
}

/// Polyline for `envelope`, at most about one vertex per horizontal pixel.
///
/// Returns nothing for an empty envelope or an unusable surface size.
pub fn render_points_with_style(
    envelope: &WaveformEnvelope,
    width: f32,
    height: f32,
    style: RenderStyle,
) -> Vec<WaveformPoint> {
    let values = envelope.as_slice();
    if values.is_empty() || !usable_extent(width) || !usable_extent(height) {
        return Vec::new();
    }
    let len = values.len() as f64;
    let width = f64::from(width);
    let height = f64::from(height);
    let amplitude = f64::from(style.amplitude_fraction);
    let step = ((len / width).floor() as usize).max(1);

    values
        .iter()
        .enumerate()
        .step_by(step)
        .map(|(idx, value)| {
            let x = idx as f64 / len * width;
            let y = (height / 2.0 - f64::from(*value) * height * amplitude).clamp(0.0, height);
            WaveformPoint {
                x: x as f32,
                y: y as f32,
            }
        })
        .collect()
}

fn usable_extent(extent: f32) -> bool {
    extent.is_finite() && extent > 0.0
}

/// Text preview: one column per `columns` bucket, bars mirrored around the middle row.
pub fn render_ascii(envelope: &WaveformEnvelope, columns: usize, rows: usize) -> Vec<String> {
    let values = envelope.as_slice();
    if values.is_empty() || columns == 0 {
        return Vec::new();
    }
    let rows = rows.max(3);
    let mut grid = vec![vec![' '; columns]; rows];
    let to_row = |v: f32| -> usize {
        let y = (0.5 - 0.5 * v.clamp(-1.0, 1.0)) * (rows as f32 - 1.0);
        y.round() as usize
    };
    for column in 0..columns {
        let start = column * values.len() / columns;
        let end = ((column + 1) * values.len() / columns).max(start + 1);
        let peak = values[start..end.min(values.len())]
            .iter()
            .copied()
            .fold(0.0_f32, f32::max);
        for row in grid.iter_mut().take(to_row(-peak) + 1).skip(to_row(peak)) {
            row[column] = '█';
        }
    }
    grid.into_iter().map(|row| row.into_iter().collect()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(values: Vec<f32>) -> WaveformEnvelope {
        WaveformEnvelope::from_values(values)
    }

    #[test]
    fn empty_envelope_renders_nothing() {
        assert!(render_points(&envelope(Vec::new()), 500.0, 100.0).is_empty());
        assert!(render_ascii(&envelope(Vec::new()), 80, 9).is_empty());
    }

    #[test]
    fn unusable_surface_renders_nothing() {
        let env = envelope(vec![0.5; 10]);
        assert!(render_points(&env, 0.0, 100.0).is_empty());
        assert!(render_points(&env, 100.0, -1.0).is_empty());
        assert!(render_points(&env, f32::NAN, 100.0).is_empty());
    }

    #[test]
    fn thousand_values_on_five_hundred_pixels_step_by_two() {
        let values = (0..1000).map(|i| (i % 10) as f32 / 10.0).collect();
        let points = render_points(&envelope(values), 500.0, 100.0);
        assert_eq!(points.len(), 500);
        assert!((points[1].x - 1.0).abs() < 1e-6);
        assert!(points.iter().all(|p| (0.0..=100.0).contains(&p.y)));
        assert!(points.windows(2).all(|pair| pair[0].x < pair[1].x));
    }

    #[test]
    fn narrow_envelopes_keep_every_value() {
        let points = render_points(&envelope(vec![0.0, 1.0, 0.5, 0.25]), 800.0, 100.0);
        assert_eq!(
            points,
            vec![
                WaveformPoint { x: 0.0, y: 50.0 },
                WaveformPoint { x: 200.0, y: 10.0 },
                WaveformPoint { x: 400.0, y: 30.0 },
                WaveformPoint { x: 600.0, y: 40.0 },
            ]
        );
    }

    #[test]
    fn oversized_amplitude_is_clamped_to_surface() {
        let style = RenderStyle {
            amplitude_fraction: 2.0,
        };
        let points = render_points_with_style(&envelope(vec![1.0]), 10.0, 100.0, style);
        assert_eq!(points, vec![WaveformPoint { x: 0.0, y: 0.0 }]);
    }

    #[test]
    fn rendering_is_repeatable() {
        let env = envelope((0..333).map(|i| i as f32 / 333.0).collect());
        assert_eq!(render_points(&env, 123.0, 45.0), render_points(&env, 123.0, 45.0));
    }

    #[test]
    fn ascii_preview_mirrors_peaks_around_centre() {
        let lines = render_ascii(&envelope(vec![0.0, 1.0]), 2, 5);
        assert_eq!(lines, vec![" █", " █", "██", " █", " █"]);
    }

    #[test]
    fn points_serialize_as_plain_coordinates() {
        let json = serde_json::to_string(&WaveformPoint { x: 1.5, y: 2.0 }).unwrap();
        assert_eq!(json, r#"{"x":1.5,"y":2.0}"#);
    }
}
