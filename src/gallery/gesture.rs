//! Horizontal swipe interpretation.
//!
//! A gesture is two events: a begin carrying the starting x coordinate and an
//! end carrying the final one. Everything between them is ignored.

use crate::gallery::nav::Direction;

/// Minimum horizontal travel (in pixels) before a release counts as a swipe.
pub const SWIPE_THRESHOLD: f32 = 50.0;

/// Maps a pair of horizontal coordinates to a navigation direction.
///
/// A drag to the left (start right of end) moves forward, mirroring the
/// "pull the next photo in" convention. Travel at or under the threshold is
/// not a swipe.
pub fn interpret(start_x: f32, end_x: f32, threshold: f32) -> Option<Direction> {
    let diff = start_x - end_x;
    if diff > threshold {
        Some(Direction::Forward)
    } else if diff < -threshold {
        Some(Direction::Back)
    } else {
        None
    }
}

/// Buffers the start coordinate of the gesture in flight.
///
/// One gesture at a time: a new begin overwrites whatever was buffered, and a
/// finish without a begin is ignored.
#[derive(Default)]
pub struct SwipeTracker {
    start_x: Option<f32>,
}

impl SwipeTracker {
    pub fn begin(&mut self, x: f32) {
        self.start_x = Some(x);
    }

    pub fn finish(&mut self, x: f32) -> Option<Direction> {
        let start = self.start_x.take()?;
        interpret(start, x, SWIPE_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_drag_left_moves_forward() {
        assert_eq!(interpret(200.0, 100.0, 50.0), Some(Direction::Forward));
    }

    #[test]
    fn long_drag_right_moves_back() {
        assert_eq!(interpret(100.0, 200.0, 50.0), Some(Direction::Back));
    }

    #[test]
    fn short_drag_is_not_a_swipe() {
        assert_eq!(interpret(100.0, 120.0, 50.0), None);
        assert_eq!(interpret(120.0, 100.0, 50.0), None);
        // Exactly at the threshold still does not trip it.
        assert_eq!(interpret(150.0, 100.0, 50.0), None);
    }

    #[test]
    fn tracker_buffers_one_gesture() {
        let mut t = SwipeTracker::default();
        t.begin(300.0);
        assert_eq!(t.finish(100.0), Some(Direction::Forward));
        // The buffered start is consumed by finish.
        assert_eq!(t.finish(100.0), None);
    }

    #[test]
    fn new_begin_overwrites_previous() {
        let mut t = SwipeTracker::default();
        t.begin(900.0);
        t.begin(120.0);
        assert_eq!(t.finish(100.0), None);
    }
}
