use std::time::{Duration, Instant};

/// Per-question countdown. The event loop polls it with the current time;
/// tests drive it with fabricated instants. A session owns exactly one of
/// these, so there is never more than one live countdown per question.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
    Expired,
    Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerFire {
    /// One-shot, emitted when elapsed crosses the warning fraction.
    Warning,
    /// One-shot, emitted when elapsed reaches the full duration. The timer
    /// stops ticking afterwards.
    Expired,
}

#[derive(Debug)]
pub struct QuestionTimer {
    state: TimerState,
    started_at: Option<Instant>,
    duration: Duration,
    warning_at: Duration,
    warned: bool,
}

impl Default for QuestionTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl QuestionTimer {
    pub fn new() -> Self {
        Self {
            state: TimerState::Idle,
            started_at: None,
            duration: Duration::ZERO,
            warning_at: Duration::ZERO,
            warned: false,
        }
    }

    /// Begin a countdown. Starting while Running cancels the prior run
    /// first, so a restarted question can never leave two countdowns racing.
    pub fn start(&mut self, duration_ms: u64, warning_fraction: f64, now: Instant) {
        if self.state == TimerState::Running {
            self.cancel();
        }
        self.started_at = Some(now);
        self.duration = Duration::from_millis(duration_ms);
        self.warning_at =
            Duration::from_millis((duration_ms as f64 * warning_fraction.clamp(0.0, 1.0)) as u64);
        self.warned = false;
        self.state = TimerState::Running;
    }

    /// Stop ticking. Idempotent; a no-op after expiry.
    pub fn cancel(&mut self) {
        if self.state == TimerState::Running {
            self.state = TimerState::Cancelled;
        }
    }

    /// Advance to `now`. Returns at most one fire; Expired is returned at
    /// most once over the timer's lifetime.
    pub fn poll(&mut self, now: Instant) -> Option<TimerFire> {
        if self.state != TimerState::Running {
            return None;
        }
        let started = self.started_at?;
        let elapsed = now.duration_since(started);
        if elapsed >= self.duration {
            self.state = TimerState::Expired;
            return Some(TimerFire::Expired);
        }
        if !self.warned && elapsed >= self.warning_at {
            self.warned = true;
            return Some(TimerFire::Warning);
        }
        None
    }

    #[allow(dead_code)] // Used by tests
    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn elapsed_ms(&self, now: Instant) -> u64 {
        match self.started_at {
            Some(started) => now.duration_since(started).as_millis() as u64,
            None => 0,
        }
    }

    pub fn remaining_ms(&self, now: Instant) -> u64 {
        let total = self.duration.as_millis() as u64;
        total.saturating_sub(self.elapsed_ms(now))
    }

    /// 1.0 at start, 0.0 at expiry. For the countdown bar.
    pub fn fraction_remaining(&self, now: Instant) -> f64 {
        let total = self.duration.as_millis() as f64;
        if total <= 0.0 {
            return 0.0;
        }
        (self.remaining_ms(now) as f64 / total).clamp(0.0, 1.0)
    }

    /// Whether the warning threshold has been crossed (for the bar color).
    pub fn in_warning_zone(&self, now: Instant) -> bool {
        self.started_at
            .is_some_and(|started| now.duration_since(started) >= self.warning_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn expires_exactly_once() {
        let t0 = Instant::now();
        let mut timer = QuestionTimer::new();
        timer.start(5_000, 0.8, t0);

        assert_eq!(timer.poll(t0 + ms(4_999)), None);
        assert_eq!(timer.poll(t0 + ms(5_000)), Some(TimerFire::Expired));
        assert_eq!(timer.state(), TimerState::Expired);
        assert_eq!(timer.poll(t0 + ms(6_000)), None);
        assert_eq!(timer.poll(t0 + ms(60_000)), None);
    }

    #[test]
    fn warning_fires_once_at_threshold() {
        let t0 = Instant::now();
        let mut timer = QuestionTimer::new();
        timer.start(10_000, 0.75, t0);

        assert_eq!(timer.poll(t0 + ms(7_000)), None);
        assert_eq!(timer.poll(t0 + ms(7_500)), Some(TimerFire::Warning));
        assert_eq!(timer.poll(t0 + ms(8_000)), None);
        assert_eq!(timer.poll(t0 + ms(10_000)), Some(TimerFire::Expired));
    }

    #[test]
    fn skipped_warning_still_expires() {
        // A coarse tick can jump straight past the warning threshold to
        // expiry; expiry wins and the warning is dropped.
        let t0 = Instant::now();
        let mut timer = QuestionTimer::new();
        timer.start(10_000, 0.75, t0);
        assert_eq!(timer.poll(t0 + ms(12_000)), Some(TimerFire::Expired));
        assert_eq!(timer.poll(t0 + ms(13_000)), None);
    }

    #[test]
    fn cancel_is_idempotent_and_noop_after_expiry() {
        let t0 = Instant::now();
        let mut timer = QuestionTimer::new();
        timer.start(5_000, 0.8, t0);

        timer.cancel();
        assert_eq!(timer.state(), TimerState::Cancelled);
        timer.cancel();
        assert_eq!(timer.state(), TimerState::Cancelled);
        assert_eq!(timer.poll(t0 + ms(10_000)), None);

        let mut expired = QuestionTimer::new();
        expired.start(5_000, 0.8, t0);
        assert_eq!(expired.poll(t0 + ms(5_000)), Some(TimerFire::Expired));
        expired.cancel();
        assert_eq!(expired.state(), TimerState::Expired);
    }

    #[test]
    fn restart_replaces_the_previous_run() {
        let t0 = Instant::now();
        let mut timer = QuestionTimer::new();
        timer.start(5_000, 0.8, t0);
        // Restart half-way through; old deadline must not fire.
        timer.start(5_000, 0.8, t0 + ms(2_500));
        assert_eq!(timer.poll(t0 + ms(5_000)), None);
        assert_eq!(timer.poll(t0 + ms(7_500)), Some(TimerFire::Expired));
    }

    #[test]
    fn remaining_and_fraction() {
        let t0 = Instant::now();
        let mut timer = QuestionTimer::new();
        timer.start(10_000, 0.75, t0);
        assert_eq!(timer.remaining_ms(t0 + ms(4_000)), 6_000);
        assert!((timer.fraction_remaining(t0 + ms(4_000)) - 0.6).abs() < 1e-9);
        assert!(!timer.in_warning_zone(t0 + ms(4_000)));
        assert!(timer.in_warning_zone(t0 + ms(8_000)));
        assert_eq!(timer.remaining_ms(t0 + ms(11_000)), 0);
    }
}
