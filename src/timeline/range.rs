/// A/B loop selection on the timeline, in seconds.
///
/// `start <= end` always holds. Dragging a handle stops at the other handle;
/// marking a handle from the playhead pushes the other one along.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LoopRange {
    start: f64,
    end: f64,
    looping: bool,
}

impl LoopRange {
    pub fn new(start: f64, end: f64) -> Self {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        Self {
            start: sanitize(start),
            end: sanitize(end),
            looping: false,
        }
    }

    /// Range covering a whole file, the state after a file opens.
    pub fn full(duration_seconds: f64) -> Self {
        Self::new(0.0, duration_seconds)
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// A range only constrains playback when it has positive length.
    pub fn is_active(&self) -> bool {
        self.end > self.start
    }

    /// Move the start handle, stopping at the end handle.
    pub fn drag_start(&mut self, seconds: f64) {
        self.start = sanitize(seconds).min(self.end);
    }

    /// Move the end handle, stopping at the start handle.
    pub fn drag_end(&mut self, seconds: f64) {
        self.end = sanitize(seconds).max(self.start);
    }

    /// Set the start from the playhead, pulling the end forward if needed.
    pub fn mark_start(&mut self, seconds: f64) {
        self.start = sanitize(seconds);
        if self.end < self.start {
            self.end = self.start;
        }
    }

    /// Set the end from the playhead, pulling the start back if needed.
    pub fn mark_end(&mut self, seconds: f64) {
        self.end = sanitize(seconds);
        if self.start > self.end {
            self.start = self.end;
        }
    }

    /// Where playback should jump when looping, if `position` left the range.
    pub fn wrap(&self, position: f64) -> Option<f64> {
        if !self.looping || !self.is_active() {
            return None;
        }
        (position >= self.end || position < self.start).then_some(self.start)
    }
}

fn sanitize(seconds: f64) -> f64 {
    if seconds.is_finite() { seconds.max(0.0) } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_orders_handles() {
        let range = LoopRange::new(8.0, 2.0);
        assert_eq!((range.start(), range.end()), (2.0, 8.0));
        assert!(range.is_active());
        assert!(!LoopRange::full(0.0).is_active());
    }

    #[test]
    fn dragging_stops_at_the_other_handle() {
        let mut range = LoopRange::new(2.0, 8.0);
        range.drag_start(9.0);
        assert_eq!(range.start(), 8.0);
        range.drag_end(1.0);
        assert_eq!(range.end(), 8.0);
        range.drag_start(-4.0);
        assert_eq!(range.start(), 0.0);
    }

    #[test]
    fn marking_pushes_the_other_handle() {
        let mut range = LoopRange::new(2.0, 8.0);
        range.mark_start(10.0);
        assert_eq!((range.start(), range.end()), (10.0, 10.0));
        range.mark_end(4.0);
        assert_eq!((range.start(), range.end()), (4.0, 4.0));
    }

    #[test]
    fn wrap_only_applies_while_looping_an_active_range() {
        let mut range = LoopRange::new(2.0, 8.0);
        assert_eq!(range.wrap(9.0), None);

        range.set_looping(true);
        assert_eq!(range.wrap(5.0), None);
        assert_eq!(range.wrap(8.0), Some(2.0));
        assert_eq!(range.wrap(1.0), Some(2.0));

        range.mark_end(2.0);
        assert_eq!(range.wrap(9.0), None);
    }
}
