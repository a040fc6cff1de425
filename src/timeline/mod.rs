//! Timeline math shared by the time display, the seek slider and loop ranges.

mod range;
mod slider;
mod time_grid;

pub use range::LoopRange;
pub use slider::{DEFAULT_SLIDER_MARGIN, SliderTrack};
pub use time_grid::{DEFAULT_FRAME_RATE, TimeGrid, estimate_frame_rate, format_time};
