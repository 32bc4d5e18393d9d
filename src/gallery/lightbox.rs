//! Open/closed state of the modal overlay.
//!
//! The lightbox carries no index of its own — it mirrors whatever the shared
//! index model says, which is what makes divergence between the overlay and
//! the inline carousel impossible. All it owns is visibility.

pub struct Lightbox {
    open: bool,
}

impl Lightbox {
    pub fn new() -> Self {
        Self { open: false }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Closed → Open. Returns whether the state actually changed, so the
    /// caller only touches the render surface on real transitions.
    pub fn open(&mut self) -> bool {
        let changed = !self.open;
        self.open = true;
        changed
    }

    /// Open → Closed. Returns whether the state actually changed.
    pub fn close(&mut self) -> bool {
        let changed = self.open;
        self.open = false;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_report_changes_once() {
        let mut lb = Lightbox::new();
        assert!(!lb.is_open());
        assert!(lb.open());
        assert!(!lb.open());
        assert!(lb.is_open());
        assert!(lb.close());
        assert!(!lb.close());
        assert!(!lb.is_open());
    }
}
