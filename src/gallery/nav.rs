//! Index model and wraparound navigation arithmetic.
//!
//! The whole crate funnels every position change through these few functions,
//! so the inline view, the thumbnail strip, the counter and the lightbox can
//! never disagree about which photo is current.

/// Which way a navigation moves through the photo sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Back,
}

/// Next index after `current`, wrapping past the end.
pub fn advance(current: usize, count: usize) -> usize {
    (current + 1) % count
}

/// Previous index before `current`, wrapping past the start.
pub fn retreat(current: usize, count: usize) -> usize {
    (current + count - 1) % count
}

/// Validates an absolute jump target. Out-of-range targets come back as
/// `None` and are dropped by the caller without complaint — targets originate
/// from a finite set of controls, so rejection is policy, not an error.
pub fn jump_to(target: usize, count: usize) -> Option<usize> {
    if target < count { Some(target) } else { None }
}

/// Single source of truth for the current position.
///
/// Holds only the stored value; re-rendering is the caller's job, performed
/// immediately after every successful mutation.
pub struct IndexModel {
    current: usize,
    count: usize,
}

impl IndexModel {
    /// `count` must be at least 1; `Gallery::new` enforces that before
    /// constructing the model.
    pub fn new(count: usize) -> Self {
        debug_assert!(count >= 1);
        Self { current: 0, count }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Stores `i` if it is in range. Out-of-range requests are a silent
    /// no-op; the return value tells the caller whether anything changed
    /// hands.
    pub fn set(&mut self, i: usize) -> bool {
        if i < self.count {
            self.current = i;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_and_retreat_are_inverse() {
        for count in 1..=7 {
            for i in 0..count {
                assert_eq!(retreat(advance(i, count), count), i);
                assert_eq!(advance(retreat(i, count), count), i);
            }
        }
    }

    #[test]
    fn advance_count_times_closes_the_cycle() {
        for count in 1..=7 {
            for start in 0..count {
                let mut i = start;
                for _ in 0..count {
                    i = advance(i, count);
                }
                assert_eq!(i, start);
            }
        }
    }

    #[test]
    fn retreat_wraps_at_zero() {
        assert_eq!(retreat(0, 5), 4);
        assert_eq!(retreat(0, 1), 0);
    }

    #[test]
    fn jump_rejects_out_of_range() {
        assert_eq!(jump_to(0, 3), Some(0));
        assert_eq!(jump_to(2, 3), Some(2));
        assert_eq!(jump_to(3, 3), None);
        assert_eq!(jump_to(usize::MAX, 3), None);
    }

    #[test]
    fn model_ignores_out_of_range_set() {
        let mut m = IndexModel::new(3);
        assert!(m.set(2));
        assert!(!m.set(3));
        assert_eq!(m.current(), 2);
        assert_eq!(m.count(), 3);
    }
}
