//! The carousel/lightbox engine.
//!
//! One authoritative index, four synchronized presentation surfaces, one
//! slideshow timer. The engine is headless: it talks to the outside world
//! only through the injected [`Surface`] and [`Timer`] collaborators, which
//! is what lets every behavior in here run under test without a window or a
//! wall clock.
//!
//! Control flow for every input (click, key, swipe, timer tick):
//! navigation arithmetic → index model mutation → presentation sync →
//! autoplay countdown reset (unless the timer itself was the trigger).

pub mod autoplay;
pub mod gesture;
pub mod lightbox;
pub mod nav;
pub mod surface;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::gallery::autoplay::{Autoplay, Timer, TimerToken};
use crate::gallery::gesture::SwipeTracker;
use crate::gallery::lightbox::Lightbox;
use crate::gallery::nav::{Direction, IndexModel};
use crate::gallery::surface::{Surface, View};

/// A displayable image: where to find it and what to call it. The engine
/// only ever reads these; decoding is the loader's business.
#[derive(Debug, Clone)]
pub struct Photo {
    pub source: PathBuf,
    pub caption: Option<String>,
}

/// Immutable per-instance settings, fixed at construction.
#[derive(Debug, Clone)]
pub struct GalleryConfig {
    pub autoplay: bool,
    pub autoplay_interval: Duration,
    pub transition_duration: Duration,
    pub keyboard: bool,
    pub touch: bool,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            autoplay: true,
            autoplay_interval: Duration::from_millis(5000),
            transition_duration: Duration::from_millis(400),
            keyboard: true,
            touch: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("no photos to show")]
    NoPhotos,
}

/// Key presses the engine understands. Mapping from whatever the host's
/// input vocabulary is (winit named keys here) happens outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Left,
    Right,
    Space,
    Escape,
}

/// What caused a navigation. Timer ticks must not reset their own countdown.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Manual,
    Tick,
}

pub struct Gallery<S: Surface, T: Timer> {
    config: GalleryConfig,
    photos: Arc<Vec<Photo>>,
    index: IndexModel,
    autoplay: Autoplay,
    swipe: SwipeTracker,
    lightbox: Lightbox,
    surface: S,
    timer: T,
    disposed: bool,
}

impl<S: Surface, T: Timer> Gallery<S, T> {
    /// Builds the engine, pushes the initial presentation state, and starts
    /// the slideshow if configured to. An empty photo sequence is the one
    /// fatal condition in this design.
    pub fn new(
        photos: Arc<Vec<Photo>>,
        config: GalleryConfig,
        surface: S,
        timer: T,
    ) -> Result<Self, GalleryError> {
        if photos.is_empty() {
            return Err(GalleryError::NoPhotos);
        }
        let count = photos.len();
        let mut gallery = Self {
            autoplay: Autoplay::new(config.autoplay_interval),
            config,
            photos,
            index: IndexModel::new(count),
            swipe: SwipeTracker::default(),
            lightbox: Lightbox::new(),
            surface,
            timer,
            disposed: false,
        };
        // First paint: no fade, nothing to fade from.
        gallery.sync(false);
        if gallery.config.autoplay {
            gallery.autoplay.start(&mut gallery.timer);
        }
        Ok(gallery)
    }

    pub fn current_index(&self) -> usize {
        self.index.current()
    }

    pub fn count(&self) -> usize {
        self.index.count()
    }

    pub fn is_playing(&self) -> bool {
        self.autoplay.is_running()
    }

    pub fn is_lightbox_open(&self) -> bool {
        self.lightbox.is_open()
    }

    pub fn photo(&self, index: usize) -> &Photo {
        &self.photos[index]
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    pub fn advance(&mut self) {
        let next = nav::advance(self.index.current(), self.index.count());
        self.navigate(next, Trigger::Manual);
    }

    pub fn retreat(&mut self) {
        let prev = nav::retreat(self.index.current(), self.index.count());
        self.navigate(prev, Trigger::Manual);
    }

    pub fn jump_to(&mut self, target: usize) {
        match nav::jump_to(target, self.index.count()) {
            Some(target) => self.navigate(target, Trigger::Manual),
            None => log::debug!(
                "nav: jump to {} ignored (count {})",
                target,
                self.index.count()
            ),
        }
    }

    /// The one atomic transition: mutate the index, re-sync every surface,
    /// restart the idle countdown if a user (not the timer) moved us.
    fn navigate(&mut self, target: usize, trigger: Trigger) {
        if self.disposed || !self.index.set(target) {
            return;
        }
        log::debug!("nav: move to {}/{}", target + 1, self.index.count());
        self.sync(true);
        if trigger == Trigger::Manual {
            self.autoplay.reset(&mut self.timer);
        }
    }

    // ------------------------------------------------------------------
    // Presentation sync
    // ------------------------------------------------------------------

    /// Pushes the current index to all surfaces. Order-insensitive: each
    /// update derives from the same `current`, so no pair can disagree.
    fn sync(&mut self, animate: bool) {
        let i = self.index.current();
        let count = self.index.count();
        let photo = &self.photos[i];
        let transition = if animate {
            Some(self.config.transition_duration)
        } else {
            None
        };
        self.surface.show_photo(View::Inline, i, photo, transition);
        if self.lightbox.is_open() {
            self.surface.show_photo(View::Lightbox, i, photo, None);
        }
        self.surface.set_active_thumbnail(i);
        self.surface.set_counter(&format!("{} / {}", i + 1, count));
        self.surface.set_progress((i + 1) as f32 / count as f32);
    }

    // ------------------------------------------------------------------
    // Slideshow
    // ------------------------------------------------------------------

    pub fn play(&mut self) {
        if self.disposed {
            return;
        }
        self.autoplay.start(&mut self.timer);
    }

    pub fn pause(&mut self) {
        self.autoplay.stop(&mut self.timer);
    }

    /// Host delivery of an armed tick. Stale tokens (anything scheduled
    /// before the last stop/reset) fall through silently.
    pub fn timer_fired(&mut self, token: TimerToken) {
        if self.disposed || !self.autoplay.accept(token) {
            return;
        }
        let next = nav::advance(self.index.current(), self.index.count());
        self.navigate(next, Trigger::Tick);
        self.autoplay.rearm(&mut self.timer);
    }

    // ------------------------------------------------------------------
    // Input routing
    // ------------------------------------------------------------------

    /// Routes a key press; returns whether the engine consumed it. While the
    /// lightbox is open its navigation and Escape-to-close take precedence;
    /// otherwise arrows navigate and Space toggles the slideshow. Inert when
    /// keyboard support is configured off.
    pub fn handle_key(&mut self, key: Key) -> bool {
        if !self.config.keyboard || self.disposed {
            return false;
        }
        if self.lightbox.is_open() {
            match key {
                Key::Left => self.retreat(),
                Key::Right => self.advance(),
                Key::Escape => self.close_lightbox(),
                Key::Space => return false,
            }
            return true;
        }
        match key {
            Key::Left => self.retreat(),
            Key::Right => self.advance(),
            Key::Space => {
                if self.is_playing() {
                    self.pause();
                } else {
                    self.play();
                }
            }
            Key::Escape => return false,
        }
        true
    }

    pub fn touch_start(&mut self, x: f32) {
        if !self.config.touch || self.disposed {
            return;
        }
        self.swipe.begin(x);
    }

    pub fn touch_end(&mut self, x: f32) {
        if !self.config.touch || self.disposed {
            return;
        }
        match self.swipe.finish(x) {
            Some(Direction::Forward) => self.advance(),
            Some(Direction::Back) => self.retreat(),
            None => {}
        }
    }

    // ------------------------------------------------------------------
    // Lightbox
    // ------------------------------------------------------------------

    /// Jumps to `index` (out-of-range jumps are dropped like any other) and
    /// opens the overlay on whatever the current photo then is.
    pub fn open_lightbox(&mut self, index: usize) {
        if self.disposed {
            return;
        }
        if let Some(target) = nav::jump_to(index, self.index.count()) {
            self.navigate(target, Trigger::Manual);
        }
        if self.lightbox.open() {
            self.surface.set_lightbox_visible(true);
            self.surface.set_scroll_locked(true);
            let i = self.index.current();
            self.surface
                .show_photo(View::Lightbox, i, &self.photos[i], None);
        }
    }

    /// Hides the overlay. The current index and the slideshow state are left
    /// exactly as they were.
    pub fn close_lightbox(&mut self) {
        if self.lightbox.close() {
            self.surface.set_lightbox_visible(false);
            self.surface.set_scroll_locked(false);
        }
    }

    // ------------------------------------------------------------------
    // Teardown
    // ------------------------------------------------------------------

    /// Cancels any live timer and deadens the instance; every entry point is
    /// a no-op afterwards. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.autoplay.stop(&mut self.timer);
        self.disposed = true;
    }
}

// ---------------------------------------------------------------------------
// Test doubles shared by the engine's test modules
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod testing {
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;

    use super::autoplay::{Timer, TimerToken};
    use super::surface::{Surface, View};
    use super::{Gallery, GalleryConfig, Photo};

    /// Remembers the last value pushed to each output, like a real surface
    /// would, plus call counts for assertions about update traffic.
    #[derive(Default)]
    pub struct RecordingSurface {
        pub inline: Option<usize>,
        pub overlay: Option<usize>,
        pub active_thumbnail: Option<usize>,
        pub counter: String,
        pub progress: f32,
        pub lightbox_visible: bool,
        pub scroll_locked: bool,
        pub inline_updates: usize,
    }

    impl Surface for RecordingSurface {
        fn show_photo(
            &mut self,
            view: View,
            index: usize,
            _photo: &Photo,
            _transition: Option<Duration>,
        ) {
            match view {
                View::Inline => {
                    self.inline = Some(index);
                    self.inline_updates += 1;
                }
                View::Lightbox => self.overlay = Some(index),
            }
        }

        fn set_active_thumbnail(&mut self, index: usize) {
            self.active_thumbnail = Some(index);
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

    /// Holds at most one armed deadline; tests fire it by reading `armed`
    /// and calling `Gallery::timer_fired` themselves.
    #[derive(Default)]
    pub struct ManualTimer {
        pub armed: Option<(Duration, TimerToken)>,
        pub schedules: usize,
        pub cancels: usize,
    }

    impl Timer for ManualTimer {
        fn schedule(&mut self, delay: Duration, token: TimerToken) {
            self.armed = Some((delay, token));
            self.schedules += 1;
        }

        fn cancel(&mut self, token: TimerToken) {
            if let Some((_, armed)) = self.armed {
                if armed == token {
                    self.armed = None;
                }
            }
            self.cancels += 1;
        }
    }

    pub fn photos(n: usize) -> Arc<Vec<Photo>> {
        Arc::new(
            (0..n)
                .map(|i| Photo {
                    source: PathBuf::from(format!("photo-{i:03}.jpg")),
                    caption: None,
                })
                .collect(),
        )
    }

    pub fn gallery(
        n: usize,
        config: GalleryConfig,
    ) -> Gallery<RecordingSurface, ManualTimer> {
        Gallery::new(
            photos(n),
            config,
            RecordingSurface::default(),
            ManualTimer::default(),
        )
        .expect("test gallery")
    }

    pub fn paused_config() -> GalleryConfig {
        GalleryConfig {
            autoplay: false,
            ..GalleryConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::testing::{gallery, paused_config, ManualTimer, RecordingSurface};
    use super::*;

    #[test]
    fn empty_sequence_is_refused() {
        let result = Gallery::new(
            Arc::new(Vec::new()),
            GalleryConfig::default(),
            RecordingSurface::default(),
            ManualTimer::default(),
        );
        assert!(matches!(result, Err(GalleryError::NoPhotos)));
    }

    #[test]
    fn three_photo_walkthrough() {
        let mut g = gallery(3, paused_config());
        g.jump_to(5);
        assert_eq!(g.current_index(), 0);
        g.advance();
        assert_eq!(g.current_index(), 1);
        g.advance();
        assert_eq!(g.current_index(), 2);
        g.advance();
        assert_eq!(g.current_index(), 0);
        g.retreat();
        assert_eq!(g.current_index(), 2);
    }

    #[test]
    fn all_surfaces_agree_after_navigation() {
        let mut g = gallery(4, paused_config());
        g.jump_to(2);
        let s = g.surface();
        assert_eq!(s.inline, Some(2));
        assert_eq!(s.active_thumbnail, Some(2));
        assert_eq!(s.counter, "3 / 4");
        assert!((s.progress - 0.75).abs() < f32::EPSILON);
    }

    #[test]
    fn rejected_jump_leaves_surfaces_untouched() {
        let mut g = gallery(3, paused_config());
        let updates = g.surface().inline_updates;
        g.jump_to(7);
        assert_eq!(g.surface().inline_updates, updates);
        assert_eq!(g.surface().counter, "1 / 3");
    }

    #[test]
    fn autoplay_starts_per_config() {
        let g = gallery(3, GalleryConfig::default());
        assert!(g.is_playing());
        assert_eq!(g.timer().schedules, 1);
        assert!(!gallery(3, paused_config()).is_playing());
    }

    #[test]
    fn tick_advances_and_rearms() {
        let mut g = gallery(3, GalleryConfig::default());
        let (delay, token) = g.timer().armed.unwrap();
        assert_eq!(delay, g.config.autoplay_interval);
        g.timer_fired(token);
        assert_eq!(g.current_index(), 1);
        let (_, next) = g.timer().armed.unwrap();
        assert_ne!(next, token);
        // Replaying the consumed tick does nothing.
        g.timer_fired(token);
        assert_eq!(g.current_index(), 1);
    }

    #[test]
    fn manual_navigation_restarts_the_countdown() {
        let mut g = gallery(3, GalleryConfig::default());
        let (_, before) = g.timer().armed.unwrap();
        g.advance();
        let (_, after) = g.timer().armed.unwrap();
        assert_ne!(before, after, "manual advance must arm a fresh interval");
        // The pre-advance tick is stale: it arrives and changes nothing.
        g.timer_fired(before);
        assert_eq!(g.current_index(), 1);
    }

    #[test]
    fn pause_blocks_the_pending_tick() {
        let mut g = gallery(3, GalleryConfig::default());
        let (_, token) = g.timer().armed.unwrap();
        g.pause();
        assert!(!g.is_playing());
        g.timer_fired(token);
        assert_eq!(g.current_index(), 0);
        assert!(g.timer().armed.is_none());
    }

    #[test]
    fn play_twice_arms_one_timer() {
        let mut g = gallery(3, paused_config());
        g.play();
        g.play();
        assert_eq!(g.timer().schedules, 1);
    }

    #[test]
    fn space_toggles_playback() {
        let mut g = gallery(3, paused_config());
        assert!(g.handle_key(Key::Space));
        assert!(g.is_playing());
        assert!(g.handle_key(Key::Space));
        assert!(!g.is_playing());
    }

    #[test]
    fn arrows_navigate_and_escape_passes_through() {
        let mut g = gallery(3, paused_config());
        assert!(g.handle_key(Key::Right));
        assert_eq!(g.current_index(), 1);
        assert!(g.handle_key(Key::Left));
        assert_eq!(g.current_index(), 0);
        assert!(!g.handle_key(Key::Escape));
    }

    #[test]
    fn disabled_keyboard_is_inert() {
        let mut g = gallery(
            3,
            GalleryConfig {
                keyboard: false,
                autoplay: false,
                ..GalleryConfig::default()
            },
        );
        assert!(!g.handle_key(Key::Right));
        assert_eq!(g.current_index(), 0);
    }

    #[test]
    fn swipes_navigate() {
        let mut g = gallery(3, paused_config());
        g.touch_start(200.0);
        g.touch_end(100.0);
        assert_eq!(g.current_index(), 1);
        g.touch_start(100.0);
        g.touch_end(200.0);
        assert_eq!(g.current_index(), 0);
        // Under the threshold: not a swipe.
        g.touch_start(100.0);
        g.touch_end(120.0);
        assert_eq!(g.current_index(), 0);
    }

    #[test]
    fn disabled_touch_is_inert() {
        let mut g = gallery(
            3,
            GalleryConfig {
                touch: false,
                autoplay: false,
                ..GalleryConfig::default()
            },
        );
        g.touch_start(300.0);
        g.touch_end(100.0);
        assert_eq!(g.current_index(), 0);
    }

    #[test]
    fn lightbox_shares_the_index() {
        let mut g = gallery(5, GalleryConfig::default());
        let playing = g.is_playing();
        g.open_lightbox(3);
        assert!(g.is_lightbox_open());
        assert_eq!(g.current_index(), 3);
        let s = g.surface();
        assert_eq!(s.overlay, Some(3));
        assert!(s.lightbox_visible);
        assert!(s.scroll_locked);

        // Navigation while open keeps both views on the same index.
        g.handle_key(Key::Right);
        assert_eq!(g.surface().overlay, Some(4));
        assert_eq!(g.surface().inline, Some(4));

        g.handle_key(Key::Escape);
        assert!(!g.is_lightbox_open());
        assert!(!g.surface().lightbox_visible);
        assert!(!g.surface().scroll_locked);
        assert_eq!(g.current_index(), 4);
        assert_eq!(g.is_playing(), playing);
    }

    #[test]
    fn lightbox_open_with_bad_index_stays_put() {
        let mut g = gallery(3, paused_config());
        g.advance();
        g.open_lightbox(99);
        assert!(g.is_lightbox_open());
        assert_eq!(g.current_index(), 1);
        assert_eq!(g.surface().overlay, Some(1));
    }

    #[test]
    fn dispose_cancels_and_deadens() {
        let mut g = gallery(3, GalleryConfig::default());
        let (_, token) = g.timer().armed.unwrap();
        g.dispose();
        assert!(g.timer().armed.is_none());
        g.timer_fired(token);
        g.advance();
        g.handle_key(Key::Right);
        assert_eq!(g.current_index(), 0);
        // Idempotent.
        g.dispose();
    }
}
