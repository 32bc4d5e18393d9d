//! The window's implementation of the engine's output contract.
//!
//! [`ViewModel`] only remembers what the engine last pushed; the renderer in
//! `ui::mod` reads it back every frame. The fade is cosmetic state owned
//! entirely by this side: the engine swaps the authoritative photo
//! synchronously and passes the configured duration as a hint, and the view
//! model splits that window into fade-out of the outgoing photo and fade-in
//! of the incoming one.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::gallery::surface::{Surface, View};
use crate::gallery::Photo;

#[derive(Debug, Clone)]
pub struct ShownPhoto {
    pub index: usize,
    pub source: PathBuf,
    pub caption: Option<String>,
}

impl ShownPhoto {
    fn from_photo(index: usize, photo: &Photo) -> Self {
        Self {
            index,
            source: photo.source.clone(),
            caption: photo.caption.clone(),
        }
    }
}

/// Where a transition currently stands. First half: the outgoing photo fades
/// out; second half: the incoming one fades in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadePhase {
    Out { alpha: u8 },
    In { alpha: u8 },
    Done,
}

fn phase(elapsed: Duration, duration: Duration) -> FadePhase {
    if duration.is_zero() || elapsed >= duration {
        return FadePhase::Done;
    }
    let half = duration.as_secs_f32() / 2.0;
    let t = elapsed.as_secs_f32();
    if t < half {
        let alpha = (255.0 * (1.0 - t / half)) as u8;
        FadePhase::Out { alpha }
    } else {
        let alpha = (255.0 * ((t - half) / half)) as u8;
        FadePhase::In { alpha }
    }
}

pub struct ViewModel {
    pub inline: Option<ShownPhoto>,
    /// Outgoing photo while a transition is in flight.
    pub previous: Option<ShownPhoto>,
    pub overlay: Option<ShownPhoto>,
    pub active_thumbnail: usize,
    pub counter: String,
    pub progress: f32,
    pub lightbox_visible: bool,
    pub scroll_locked: bool,
    fade_started: Option<Instant>,
    fade_duration: Duration,
}

impl ViewModel {
    pub fn new() -> Self {
        Self {
            inline: None,
            previous: None,
            overlay: None,
            active_thumbnail: 0,
            counter: String::new(),
            progress: 0.0,
            lightbox_visible: false,
            scroll_locked: false,
            fade_started: None,
            fade_duration: Duration::ZERO,
        }
    }

    pub fn fade_phase(&self, now: Instant) -> FadePhase {
        match self.fade_started {
            Some(started) => phase(now.duration_since(started), self.fade_duration),
            None => FadePhase::Done,
        }
    }

    pub fn fade_active(&self, now: Instant) -> bool {
        self.fade_phase(now) != FadePhase::Done
    }
}

impl Surface for ViewModel {
    fn show_photo(&mut self, view: View, index: usize, photo: &Photo, transition: Option<Duration>) {
        let shown = ShownPhoto::from_photo(index, photo);
        match view {
            View::Inline => {
                let changed = self.inline.as_ref().map(|p| p.index) != Some(index);
                if changed {
                    match transition {
                        Some(duration) if !duration.is_zero() => {
                            self.previous = self.inline.take();
                            self.fade_started = Some(Instant::now());
                            self.fade_duration = duration;
                        }
                        _ => {
                            self.previous = None;
                            self.fade_started = None;
                        }
                    }
                }
                self.inline = Some(shown);
            }
            View::Lightbox => self.overlay = Some(shown),
        }
    }

    fn set_active_thumbnail(&mut self, index: usize) {
        self.active_thumbnail = index;
    }

    fn set_counter(&mut self, text: &str) {
        self.counter = text.to_string();
    }

    fn set_progress(&mut self, fraction: f32) {
        self.progress = fraction;
    }

    fn set_lightbox_visible(&mut self, visible: bool) {
        self.lightbox_visible = visible;
    }

    fn set_scroll_locked(&mut self, locked: bool) {
        self.scroll_locked = locked;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const D: Duration = Duration::from_millis(400);

    #[test]
    fn fade_splits_out_then_in() {
        match phase(Duration::from_millis(100), D) {
            FadePhase::Out { alpha } => assert!(alpha < 160 && alpha > 96),
            other => panic!("expected Out, got {other:?}"),
        }
        match phase(Duration::from_millis(300), D) {
            FadePhase::In { alpha } => assert!(alpha < 160 && alpha > 96),
            other => panic!("expected In, got {other:?}"),
        }
        assert_eq!(phase(Duration::from_millis(400), D), FadePhase::Done);
        assert_eq!(phase(Duration::from_millis(0), Duration::ZERO), FadePhase::Done);
    }

    #[test]
    fn repush_of_same_index_does_not_restart_fade() {
        let mut vm = ViewModel::new();
        let photo = Photo {
            source: "a.jpg".into(),
            caption: None,
        };
        vm.show_photo(View::Inline, 0, &photo, None);
        assert!(vm.fade_started.is_none());
        vm.show_photo(View::Inline, 1, &photo, Some(D));
        assert!(vm.fade_started.is_some());
        let started = vm.fade_started;
        vm.show_photo(View::Inline, 1, &photo, Some(D));
        assert_eq!(vm.fade_started, started);
        assert_eq!(vm.previous.as_ref().map(|p| p.index), Some(0));
    }
}
