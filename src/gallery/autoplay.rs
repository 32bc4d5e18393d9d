//! Slideshow timer management.
//!
//! The controller never touches a wall clock. It asks an injected [`Timer`]
//! to arm a one-shot delay and hands out a fresh [`TimerToken`] each time, so
//! a tick that was in flight when the schedule changed arrives with a stale
//! token and is dropped. That token check is what makes `stop` and `reset`
//! synchronous guarantees rather than races.

use std::time::Duration;

/// Identity of one armed tick. Tokens are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerToken(u64);

/// One-shot timer capability supplied by the host.
///
/// `schedule` arms a single delivery of `token` after `delay`; recurrence is
/// achieved by the controller re-arming on each accepted tick. `cancel` is
/// advisory — the controller's token check is what actually retires a tick,
/// so a host that cannot un-arm a deadline may simply deliver it late.
pub trait Timer {
    fn schedule(&mut self, delay: Duration, token: TimerToken);
    fn cancel(&mut self, token: TimerToken);
}

/// Stopped/Running state machine driving the automatic advance.
pub struct Autoplay {
    interval: Duration,
    running: bool,
    pending: Option<TimerToken>,
    next_token: u64,
}

impl Autoplay {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            running: false,
            pending: None,
            next_token: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Stopped → Running. A no-op while already running, so repeated calls
    /// can never leave two live timers behind.
    pub fn start(&mut self, timer: &mut impl Timer) {
        if self.running {
            return;
        }
        self.running = true;
        self.arm(timer);
    }

    /// Running → Stopped. Idempotent; after it returns no tick armed earlier
    /// can advance the gallery, because its token is no longer pending.
    pub fn stop(&mut self, timer: &mut impl Timer) {
        if !self.running {
            return;
        }
        self.running = false;
        if let Some(token) = self.pending.take() {
            timer.cancel(token);
        }
    }

    /// Restarts the countdown from a full interval. Called on every
    /// navigation the timer itself did not trigger, so the interval always
    /// measures idle time since the last interaction. A no-op while stopped.
    pub fn reset(&mut self, timer: &mut impl Timer) {
        if !self.running {
            return;
        }
        if let Some(token) = self.pending.take() {
            timer.cancel(token);
        }
        self.arm(timer);
    }

    /// True iff `token` is the live pending tick. The caller then performs
    /// the advance and calls [`Autoplay::rearm`] for the next interval.
    pub fn accept(&self, token: TimerToken) -> bool {
        self.running && self.pending == Some(token)
    }

    /// Arms the next tick after an accepted one.
    pub fn rearm(&mut self, timer: &mut impl Timer) {
        if self.running {
            self.arm(timer);
        }
    }

    fn arm(&mut self, timer: &mut impl Timer) {
        let token = TimerToken(self.next_token);
        self.next_token += 1;
        self.pending = Some(token);
        timer.schedule(self.interval, token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct TestTimer {
        armed: Option<TimerToken>,
        schedules: usize,
        cancels: usize,
    }

    impl Timer for TestTimer {
        fn schedule(&mut self, _delay: Duration, token: TimerToken) {
            self.armed = Some(token);
            self.schedules += 1;
        }

        fn cancel(&mut self, token: TimerToken) {
            if self.armed == Some(token) {
                self.armed = None;
            }
            self.cancels += 1;
        }
    }

    fn controller() -> Autoplay {
        Autoplay::new(Duration::from_millis(5000))
    }

    #[test]
    fn start_is_idempotent() {
        let mut a = controller();
        let mut t = TestTimer::default();
        a.start(&mut t);
        a.start(&mut t);
        assert!(a.is_running());
        assert_eq!(t.schedules, 1);
    }

    #[test]
    fn stop_retires_the_pending_tick() {
        let mut a = controller();
        let mut t = TestTimer::default();
        a.start(&mut t);
        let token = t.armed.unwrap();
        a.stop(&mut t);
        assert!(!a.is_running());
        assert!(!a.accept(token));
        // Idempotent.
        a.stop(&mut t);
        assert_eq!(t.cancels, 1);
    }

    #[test]
    fn reset_swaps_in_a_fresh_token() {
        let mut a = controller();
        let mut t = TestTimer::default();
        a.start(&mut t);
        let first = t.armed.unwrap();
        a.reset(&mut t);
        let second = t.armed.unwrap();
        assert_ne!(first, second);
        assert!(!a.accept(first));
        assert!(a.accept(second));
    }

    #[test]
    fn reset_while_stopped_does_not_start() {
        let mut a = controller();
        let mut t = TestTimer::default();
        a.reset(&mut t);
        assert!(!a.is_running());
        assert_eq!(t.schedules, 0);
    }

    #[test]
    fn rearm_continues_the_cycle() {
        let mut a = controller();
        let mut t = TestTimer::default();
        a.start(&mut t);
        let first = t.armed.unwrap();
        assert!(a.accept(first));
        a.rearm(&mut t);
        let second = t.armed.unwrap();
        assert_ne!(first, second);
        assert!(!a.accept(first));
    }
}
