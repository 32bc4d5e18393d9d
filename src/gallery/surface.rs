//! Output contract between the engine and whatever draws it.
//!
//! The engine pushes presentation state through this trait and never reads it
//! back; an implementation only has to remember what it was last told. Tests
//! inject a recording implementation, the binary injects the framebuffer
//! view model in `ui::view`.

use std::time::Duration;

use crate::gallery::Photo;

/// The two playback surfaces sharing one current index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Inline,
    Lightbox,
}

pub trait Surface {
    /// Replace the displayed photo on `view`. `transition`, when present, is
    /// a cosmetic fade hint: the surface may animate the swap over that
    /// duration, but `index` is authoritative from the moment of the call.
    fn show_photo(&mut self, view: View, index: usize, photo: &Photo, transition: Option<Duration>);

    /// Mark the thumbnail at `index` active and all others inactive.
    fn set_active_thumbnail(&mut self, index: usize);

    /// Render the 1-indexed "position / total" label.
    fn set_counter(&mut self, text: &str);

    /// Set the progress indicator to `fraction` of full width (0.0..=1.0).
    fn set_progress(&mut self, fraction: f32);

    /// Show or hide the lightbox overlay region.
    fn set_lightbox_visible(&mut self, visible: bool);

    /// Suppress or restore scrolling behind the overlay.
    fn set_scroll_locked(&mut self, locked: bool);
}
