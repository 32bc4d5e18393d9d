use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};

use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, MouseButton, Touch, TouchPhase, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow};
use winit::keyboard::{Key as WinitKey, NamedKey};
use winit::window::{Window, WindowId};

use crate::files::display_label;
use crate::gallery::autoplay::{Timer, TimerToken};
use crate::gallery::{Gallery, Key};
use crate::loader::{SharedState, UserEvent};
use crate::ui::render::{
    blit_scaled, draw_rect_outline, draw_text, fill_rect, fit_scale, rgb, text_width, BG_COLOR,
};
use crate::ui::view::{FadePhase, ViewModel};

pub mod render;
pub mod view;

// ---------------------------------------------------------------------------
// Layout constants
// ---------------------------------------------------------------------------

const TEXT_SCALE: u32 = 2;
const PROGRESS_H: u32 = 4;
const TOP_H: u32 = 36;
const ARROW_W: u32 = 56;
const CAPTION_H: u32 = 28;
const STRIP_H: u32 = 96;
const THUMB_CELL: u32 = 96;
const THUMB_PAD: u32 = 6;
const LIGHTBOX_MARGIN: f32 = 48.0;
const FADE_FRAME: Duration = Duration::from_millis(16);
/// Pointer travel below this is a click, not a swipe.
const CLICK_SLOP: f64 = 8.0;

const WHITE: (u8, u8, u8, u8) = (255, 255, 255, 255);
const DIM: (u8, u8, u8, u8) = (170, 170, 170, 255);
const ACCENT: (u8, u8, u8, u8) = (120, 170, 255, 255);
const ERROR_RED: (u8, u8, u8, u8) = (255, 80, 80, 255);

// ---------------------------------------------------------------------------
// Deadline timer: the engine's Timer capability over winit's WaitUntil
// ---------------------------------------------------------------------------

/// At most one armed deadline. `about_to_wait` parks the event loop on it and
/// hands the token back to the engine when it comes due; the engine's own
/// token check discards anything stale, so cancel only has to clear the slot.
#[derive(Default)]
pub struct DeadlineTimer {
    pub deadline: Option<(Instant, TimerToken)>,
}

impl Timer for DeadlineTimer {
    fn schedule(&mut self, delay: Duration, token: TimerToken) {
        self.deadline = Some((Instant::now() + delay, token));
    }

    fn cancel(&mut self, token: TimerToken) {
        if let Some((_, armed)) = self.deadline {
            if armed == token {
                self.deadline = None;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Trigger regions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct Rect {
    x: i32,
    y: i32,
    w: u32,
    h: u32,
}

impl Rect {
    fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x as f64
            && py >= self.y as f64
            && px < (self.x + self.w as i32) as f64
            && py < (self.y + self.h as i32) as f64
    }
}

struct Layout {
    play_pause: Rect,
    prev: Rect,
    next: Rect,
    stage: Rect,
    caption: Rect,
    strip: Rect,
    lightbox_close: Rect,
}

fn layout(w: u32, h: u32) -> Layout {
    let strip_y = h.saturating_sub(STRIP_H);
    let caption_y = strip_y.saturating_sub(CAPTION_H);
    let stage_h = caption_y.saturating_sub(TOP_H);
    Layout {
        play_pause: Rect {
            x: w.saturating_sub(64) as i32,
            y: 8,
            w: 52,
            h: 24,
        },
        prev: Rect {
            x: 0,
            y: TOP_H as i32,
            w: ARROW_W,
            h: stage_h,
        },
        next: Rect {
            x: w.saturating_sub(ARROW_W) as i32,
            y: TOP_H as i32,
            w: ARROW_W,
            h: stage_h,
        },
        stage: Rect {
            x: ARROW_W as i32,
            y: TOP_H as i32,
            w: w.saturating_sub(2 * ARROW_W),
            h: stage_h,
        },
        caption: Rect {
            x: 0,
            y: caption_y as i32,
            w,
            h: CAPTION_H,
        },
        strip: Rect {
            x: 0,
            y: strip_y as i32,
            w,
            h: STRIP_H,
        },
        lightbox_close: Rect {
            x: w.saturating_sub(56) as i32,
            y: 8,
            w: 48,
            h: 48,
        },
    }
}

/// Horizontal scroll (in pixels) keeping the active thumbnail centered.
fn thumb_scroll(active: usize, count: usize, strip_w: u32) -> u32 {
    let total = count as u32 * THUMB_CELL;
    if total <= strip_w {
        return 0;
    }
    let desired = active as i64 * THUMB_CELL as i64 + THUMB_CELL as i64 / 2 - strip_w as i64 / 2;
    desired.clamp(0, (total - strip_w) as i64) as u32
}

// ---------------------------------------------------------------------------
// Application handler (winit 0.30 style)
// ---------------------------------------------------------------------------

pub struct App {
    pub gallery: Gallery<ViewModel, DeadlineTimer>,
    pub cache: SharedState,
    pub window: Option<Arc<Window>>,
    pub context: Option<softbuffer::Context<Arc<Window>>>,
    pub surface: Option<softbuffer::Surface<Arc<Window>, Arc<Window>>>,
    pub next_redraw: Option<Instant>,
    mouse_pos: (f64, f64),
    mouse_press: Option<(f64, f64)>,
    touch_press: Option<(f64, f64)>,
}

impl App {
    pub fn new(gallery: Gallery<ViewModel, DeadlineTimer>, cache: SharedState) -> Self {
        Self {
            gallery,
            cache,
            window: None,
            context: None,
            surface: None,
            next_redraw: None,
            mouse_pos: (0.0, 0.0),
            mouse_press: None,
            touch_press: None,
        }
    }

    fn request_redraw(&self) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }

    /// Run after every engine interaction: point the decode workers at the
    /// (possibly new) current photo and repaint.
    fn after_action(&mut self) {
        let (lock, cvar) = &*self.cache;
        {
            let mut state = lock.lock().unwrap();
            state.set_current_idx(self.gallery.current_index());
            let (cached, used, budget) = state.stats();
            log::debug!(
                "cache: {} full images, {:.1}/{:.1} MB",
                cached,
                used as f64 / (1024.0 * 1024.0),
                budget as f64 / (1024.0 * 1024.0)
            );
        }
        cvar.notify_all();
        self.request_redraw();
    }

    fn handle_click(&mut self, x: f64, y: f64) {
        let Some(ref window) = self.window else { return };
        let size = window.inner_size();
        let lay = layout(size.width.max(1), size.height.max(1));

        if self.gallery.is_lightbox_open() {
            if lay.lightbox_close.contains(x, y) {
                self.gallery.close_lightbox();
            } else if x < size.width as f64 / 3.0 {
                self.gallery.retreat();
            } else if x > size.width as f64 * 2.0 / 3.0 {
                self.gallery.advance();
            }
            self.after_action();
            return;
        }

        if lay.play_pause.contains(x, y) {
            if self.gallery.is_playing() {
                self.gallery.pause();
            } else {
                self.gallery.play();
            }
        } else if lay.prev.contains(x, y) {
            self.gallery.retreat();
        } else if lay.next.contains(x, y) {
            self.gallery.advance();
        } else if lay.strip.contains(x, y) {
            let scroll = thumb_scroll(
                self.gallery.surface().active_thumbnail,
                self.gallery.count(),
                lay.strip.w,
            );
            let idx = ((x as i64 - lay.strip.x as i64 + scroll as i64) / THUMB_CELL as i64) as usize;
            self.gallery.jump_to(idx);
        } else if lay.stage.contains(x, y) {
            self.gallery.open_lightbox(self.gallery.current_index());
        }
        self.after_action();
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, logical: &WinitKey) {
        let mapped = match logical {
            WinitKey::Named(NamedKey::ArrowLeft) => Some(Key::Left),
            WinitKey::Named(NamedKey::ArrowRight) => Some(Key::Right),
            WinitKey::Named(NamedKey::Space) => Some(Key::Space),
            WinitKey::Named(NamedKey::Escape) => Some(Key::Escape),
            WinitKey::Named(NamedKey::Enter) => {
                self.gallery.open_lightbox(self.gallery.current_index());
                self.after_action();
                return;
            }
            WinitKey::Character(s) if s.as_str() == "q" => {
                self.gallery.dispose();
                event_loop.exit();
                return;
            }
            _ => None,
        };
        if let Some(key) = mapped {
            let consumed = self.gallery.handle_key(key);
            if !consumed && key == Key::Escape {
                self.gallery.dispose();
                event_loop.exit();
                return;
            }
            self.after_action();
        }
    }

    // ------------------------------------------------------------------
    // Drawing
    // ------------------------------------------------------------------

    fn redraw(&mut self) {
        let Some(window) = self.window.clone() else { return };
        let Some(ref mut surface) = self.surface else { return };
        let size = window.inner_size();
        let (fb_w, fb_h) = (size.width.max(1), size.height.max(1));
        let (Some(nz_w), Some(nz_h)) = (NonZeroU32::new(fb_w), NonZeroU32::new(fb_h)) else {
            return;
        };
        if surface.resize(nz_w, nz_h).is_err() {
            return;
        }
        let Ok(mut buffer) = surface.buffer_mut() else { return };
        let frame: &mut [u32] = &mut buffer;

        frame.fill(rgb(BG_COLOR[0], BG_COLOR[1], BG_COLOR[2]));

        let now = Instant::now();
        let lay = layout(fb_w, fb_h);
        let vm = self.gallery.surface();
        let (lock, _) = &*self.cache;
        let cache = lock.lock().unwrap();

        // Main stage: current photo, or the outgoing one during fade-out.
        let fade = vm.fade_phase(now);
        let (shown, alpha) = match fade {
            FadePhase::Out { alpha } => (vm.previous.as_ref(), alpha),
            FadePhase::In { alpha } => (vm.inline.as_ref(), alpha),
            FadePhase::Done => (vm.inline.as_ref(), 255),
        };
        let mut loading = false;
        let mut error: Option<String> = None;
        if let Some(shown) = shown {
            if let Some(img) = cache.get(shown.index) {
                let scale = fit_scale(
                    img.width as f32,
                    img.height as f32,
                    lay.stage.w as f32,
                    lay.stage.h as f32,
                );
                let draw_w = img.width as f32 * scale;
                let draw_h = img.height as f32 * scale;
                let x0 = lay.stage.x as f32 + (lay.stage.w as f32 - draw_w) / 2.0;
                let y0 = lay.stage.y as f32 + (lay.stage.h as f32 - draw_h) / 2.0;
                blit_scaled(
                    frame,
                    fb_w,
                    fb_h,
                    &img.rgba_bytes,
                    img.width,
                    img.height,
                    x0,
                    y0,
                    scale,
                    alpha,
                );
            } else if let Some(e) = cache.errors.get(&shown.index) {
                error = Some(e.clone());
            } else {
                loading = true;
            }
        }
        if let Some(e) = error {
            let msg = format!("Could not load: {}", e);
            draw_text(frame, fb_w, fb_h, &msg, 20, fb_h as i32 / 2, TEXT_SCALE, ERROR_RED);
        } else if loading {
            let tx = fb_w as i32 / 2 - text_width("Loading...", TEXT_SCALE) as i32 / 2;
            draw_text(frame, fb_w, fb_h, "Loading...", tx, fb_h as i32 / 2, TEXT_SCALE, WHITE);
        }

        // Progress bar across the very top.
        let progress_w = (fb_w as f32 * vm.progress.clamp(0.0, 1.0)) as u32;
        fill_rect(frame, fb_w, fb_h, 0, 0, progress_w, PROGRESS_H, ACCENT);

        // Counter and play/pause state.
        draw_text(frame, fb_w, fb_h, &vm.counter, 12, 12, TEXT_SCALE, WHITE);
        let pp = if self.gallery.is_playing() { "||" } else { ">" };
        draw_text(
            frame,
            fb_w,
            fb_h,
            pp,
            lay.play_pause.x + 8,
            lay.play_pause.y + 4,
            TEXT_SCALE,
            DIM,
        );

        // Arrows.
        let arrow_y = lay.stage.y + lay.stage.h as i32 / 2 - 7;
        draw_text(frame, fb_w, fb_h, "<", lay.prev.x + 18, arrow_y, TEXT_SCALE, DIM);
        draw_text(frame, fb_w, fb_h, ">", lay.next.x + 18, arrow_y, TEXT_SCALE, DIM);

        // Caption under the stage.
        if let Some(ref shown) = vm.inline {
            let label = display_label(self.gallery.photo(shown.index));
            if !label.is_empty() {
                let tx = fb_w as i32 / 2 - text_width(&label, TEXT_SCALE) as i32 / 2;
                draw_text(frame, fb_w, fb_h, &label, tx, lay.caption.y + 6, TEXT_SCALE, DIM);
            }
        }

        // Thumbnail strip.
        let count = self.gallery.count();
        let scroll = thumb_scroll(vm.active_thumbnail, count, lay.strip.w);
        let first = (scroll / THUMB_CELL) as usize;
        let last = (((scroll + lay.strip.w) / THUMB_CELL) as usize + 1).min(count);
        for i in first..last {
            let cell_x = lay.strip.x + (i as u32 * THUMB_CELL) as i32 - scroll as i32;
            let inner = THUMB_CELL - 2 * THUMB_PAD;
            let ix = cell_x + THUMB_PAD as i32;
            let iy = lay.strip.y + THUMB_PAD as i32;
            if let Some(thumb) = cache.get_thumbnail(i) {
                let scale = fit_scale(
                    thumb.width as f32,
                    thumb.height as f32,
                    inner as f32,
                    inner as f32,
                );
                let dw = thumb.width as f32 * scale;
                let dh = thumb.height as f32 * scale;
                blit_scaled(
                    frame,
                    fb_w,
                    fb_h,
                    &thumb.rgba_bytes,
                    thumb.width,
                    thumb.height,
                    ix as f32 + (inner as f32 - dw) / 2.0,
                    iy as f32 + (inner as f32 - dh) / 2.0,
                    scale,
                    255,
                );
            } else {
                fill_rect(frame, fb_w, fb_h, ix, iy, inner, inner, (48, 48, 48, 255));
            }
            if i == vm.active_thumbnail {
                draw_rect_outline(frame, fb_w, fb_h, ix - 2, iy - 2, inner + 4, inner + 4, 2, ACCENT);
            }
        }

        // Lightbox overlay on top of everything.
        if vm.lightbox_visible {
            fill_rect(frame, fb_w, fb_h, 0, 0, fb_w, fb_h, (0, 0, 0, 235));
            if let Some(ref shown) = vm.overlay {
                let img = cache.get(shown.index);
                if let Some(ref img) = img {
                    let box_w = fb_w as f32 - 2.0 * LIGHTBOX_MARGIN;
                    let box_h = fb_h as f32 - 2.0 * LIGHTBOX_MARGIN;
                    let scale = fit_scale(img.width as f32, img.height as f32, box_w, box_h);
                    let dw = img.width as f32 * scale;
                    let dh = img.height as f32 * scale;
                    blit_scaled(
                        frame,
                        fb_w,
                        fb_h,
                        &img.rgba_bytes,
                        img.width,
                        img.height,
                        (fb_w as f32 - dw) / 2.0,
                        (fb_h as f32 - dh) / 2.0,
                        scale,
                        255,
                    );
                } else {
                    let tx = fb_w as i32 / 2 - text_width("Loading...", TEXT_SCALE) as i32 / 2;
                    draw_text(frame, fb_w, fb_h, "Loading...", tx, fb_h as i32 / 2, TEXT_SCALE, WHITE);
                }
                let label = display_label(self.gallery.photo(shown.index));
                let mut line = if label.is_empty() {
                    vm.counter.clone()
                } else {
                    format!("{}  ({})", label, vm.counter)
                };
                if let Some(ref img) = img {
                    line.push_str(&format!(
                        "  {}x{}  {} KB",
                        img.width,
                        img.height,
                        img.file_size / 1024
                    ));
                }
                let tx = fb_w as i32 / 2 - text_width(&line, TEXT_SCALE) as i32 / 2;
                draw_text(frame, fb_w, fb_h, &line, tx, fb_h as i32 - 28, TEXT_SCALE, WHITE);
            }
            draw_text(
                frame,
                fb_w,
                fb_h,
                "x",
                lay.lightbox_close.x + 16,
                lay.lightbox_close.y + 14,
                TEXT_SCALE + 1,
                DIM,
            );
        }

        drop(cache);
        let _ = buffer.present();

        // Keep animating while a fade is in flight.
        if self.gallery.surface().fade_active(Instant::now()) {
            self.next_redraw = Some(Instant::now() + FADE_FRAME);
        }
    }
}

impl ApplicationHandler<UserEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attrs = Window::default_attributes()
            .with_title("gv")
            .with_inner_size(LogicalSize::new(1280u32, 800u32));
        let window = Arc::new(event_loop.create_window(attrs).expect("create window"));
        let context = softbuffer::Context::new(Arc::clone(&window)).expect("create context");
        let surface = softbuffer::Surface::new(&context, Arc::clone(&window)).expect("create surface");

        window.request_redraw();
        self.window = Some(window);
        self.context = Some(context);
        self.surface = Some(surface);
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: UserEvent) {
        match event {
            UserEvent::ImageReady(_) | UserEvent::ThumbnailReady(_) => self.request_redraw(),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.gallery.dispose();
                event_loop.exit();
            }

            // The redraw path resizes the softbuffer surface itself.
            WindowEvent::Resized(PhysicalSize { .. }) => {
                self.request_redraw();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed && !event.repeat {
                    let logical = event.logical_key.clone();
                    self.handle_key(event_loop, &logical);
                }
            }

            WindowEvent::CursorMoved {
                position: PhysicalPosition { x, y },
                ..
            } => {
                self.mouse_pos = (x, y);
            }

            WindowEvent::MouseInput { state, button, .. } => {
                if button != MouseButton::Left {
                    return;
                }
                match state {
                    ElementState::Pressed => {
                        self.mouse_press = Some(self.mouse_pos);
                        self.gallery.touch_start(self.mouse_pos.0 as f32);
                    }
                    ElementState::Released => {
                        let (x, y) = self.mouse_pos;
                        if let Some((px, _)) = self.mouse_press.take() {
                            if (x - px).abs() > CLICK_SLOP {
                                self.gallery.touch_end(x as f32);
                                self.after_action();
                            } else {
                                self.handle_click(x, y);
                            }
                        }
                    }
                }
            }

            WindowEvent::Touch(Touch { phase, location, .. }) => match phase {
                TouchPhase::Started => {
                    self.touch_press = Some((location.x, location.y));
                    self.gallery.touch_start(location.x as f32);
                }
                TouchPhase::Ended => {
                    if let Some((px, _)) = self.touch_press.take() {
                        if (location.x - px).abs() > CLICK_SLOP {
                            self.gallery.touch_end(location.x as f32);
                            self.after_action();
                        } else {
                            self.handle_click(location.x, location.y);
                        }
                    }
                }
                TouchPhase::Moved | TouchPhase::Cancelled => {}
            },

            WindowEvent::RedrawRequested => {
                self.redraw();
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = Instant::now();

        // Slideshow tick.
        if let Some((when, token)) = self.gallery.timer().deadline {
            if now >= when {
                self.gallery.timer_mut().deadline = None;
                self.gallery.timer_fired(token);
                self.after_action();
            }
        }

        // Fade animation frame.
        if let Some(when) = self.next_redraw {
            if now >= when {
                self.next_redraw = None;
                self.request_redraw();
            }
        }

        let wake = [
            self.next_redraw,
            self.gallery.timer().deadline.map(|(when, _)| when),
        ]
        .into_iter()
        .flatten()
        .min();
        match wake {
            Some(when) => event_loop.set_control_flow(ControlFlow::WaitUntil(when)),
            None => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }
}
